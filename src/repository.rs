use crate::models::{
    ApplicationStatus, ApplyJobRequest, Course, CourseEnrollment, CourseSummary, Job,
    JobApplication, JobAuthor, JobDetail, JobPage, JobSummary, NewCourse, NewJob, NewUser,
    PageRequest, User, UserCredentials, page_count,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use thiserror::Error;

/// RepoError
///
/// Failure modes of the persistence layer. Unique constraint violations are
/// surfaced as `Conflict` with a caller-facing message; everything else is an
/// opaque database error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only ever see
/// `Arc<dyn Repository>`, so tests can swap in an in-memory implementation.
///
/// Uniqueness rules (one account per email/username, one application per job
/// and applicant, one enrollment per user and course) are enforced by the
/// schema. Implementations report a violation as [`RepoError::Conflict`].
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    // Includes the password hash; only the login flow should call this.
    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;

    // --- Job Board ---
    // Newest first.
    async fn list_jobs(&self, page: PageRequest) -> RepoResult<JobPage>;
    async fn create_job(&self, job: NewJob, author_id: i64) -> RepoResult<Job>;
    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>>;
    async fn get_job_detail(&self, id: i64) -> RepoResult<Option<JobDetail>>;
    async fn create_application(
        &self,
        job_id: i64,
        applicant_id: i64,
        req: ApplyJobRequest,
    ) -> RepoResult<JobApplication>;
    async fn list_applications(&self, job_id: i64) -> RepoResult<Vec<JobApplication>>;

    // --- Course Catalog ---
    async fn list_courses(&self) -> RepoResult<Vec<CourseSummary>>;
    async fn get_course(&self, id: i64) -> RepoResult<Option<Course>>;
    async fn create_course(&self, course: NewCourse) -> RepoResult<Course>;
    async fn enroll(&self, user_id: i64, course_id: i64) -> RepoResult<CourseEnrollment>;
    async fn get_enrollment(&self, user_id: i64, course_id: i64) -> RepoResult<Option<CourseEnrollment>>;
    // Returns None when the user is not enrolled in the course.
    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        progress: i64,
    ) -> RepoResult<Option<CourseEnrollment>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite through `sqlx`.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Applies the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Maps a unique constraint violation to `RepoError::Conflict`, building the
/// message from the constraint text (e.g. `UNIQUE constraint failed: users.email`).
fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce(&str) -> String) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepoError::Conflict(message(db_err.message()));
        }
    }
    RepoError::Database(err)
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, bio, location, is_admin, created_at";

const APPLICATION_COLUMNS: &str =
    "id, job_id, applicant_id, cover_letter, resume, status, created_at";

/// Job row joined with the author's username.
#[derive(FromRow)]
struct JobDetailRow {
    id: i64,
    title: String,
    company: String,
    location: Option<String>,
    description: String,
    requirements: Option<String>,
    salary: Option<String>,
    created_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
}

impl From<JobDetailRow> for JobDetail {
    fn from(row: JobDetailRow) -> Self {
        JobDetail {
            id: row.id,
            title: row.title,
            company: row.company,
            location: row.location,
            description: row.description,
            requirements: row.requirements,
            salary: row.salary,
            created_at: row.created_at,
            author: JobAuthor {
                id: row.author_id,
                username: row.author_username,
            },
        }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    /// create_user
    ///
    /// Inserts a user. The UNIQUE indexes on `email` and `username` decide conflicts,
    /// so two concurrent registrations cannot both succeed.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, bio, location, is_admin, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.bio)
            .bind(&user.location)
            .bind(user.is_admin)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_on_unique(e, |constraint| {
                    if constraint.contains("users.email") {
                        "Email already registered".to_string()
                    } else {
                        "Username already taken".to_string()
                    }
                })
            })
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, email, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    /// list_jobs
    ///
    /// Counts all jobs, then fetches one page ordered by `created_at DESC`.
    /// Rows sharing a timestamp fall back to id order so pages never overlap.
    async fn list_jobs(&self, page: PageRequest) -> RepoResult<JobPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;

        let jobs = sqlx::query_as::<_, JobSummary>(
            r#"
            SELECT id, title, company, location, salary, requirements, created_at
            FROM jobs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(JobPage {
            jobs,
            total,
            pages: page_count(total, page.per_page()),
            current_page: page.page(),
            per_page: page.per_page(),
        })
    }

    async fn create_job(&self, job: NewJob, author_id: i64) -> RepoResult<Job> {
        let created = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (title, description, company, location, salary, requirements, created_at, author_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, description, company, location, salary, requirements, created_at, author_id
            "#,
        )
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.salary)
        .bind(&job.requirements)
        .bind(Utc::now())
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, title, description, company, location, salary, requirements, created_at, author_id FROM jobs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// get_job_detail
    ///
    /// Joins the job with its author so the detail view can show who posted it.
    async fn get_job_detail(&self, id: i64) -> RepoResult<Option<JobDetail>> {
        let row = sqlx::query_as::<_, JobDetailRow>(
            r#"
            SELECT j.id, j.title, j.company, j.location, j.description, j.requirements,
                   j.salary, j.created_at, j.author_id, u.username AS author_username
            FROM jobs j
            JOIN users u ON u.id = j.author_id
            WHERE j.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobDetail::from))
    }

    /// create_application
    ///
    /// Inserts a `pending` application. A second application by the same user for
    /// the same job hits the (job_id, applicant_id) UNIQUE constraint.
    async fn create_application(
        &self,
        job_id: i64,
        applicant_id: i64,
        req: ApplyJobRequest,
    ) -> RepoResult<JobApplication> {
        let sql = format!(
            "INSERT INTO job_applications (job_id, applicant_id, cover_letter, resume, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, JobApplication>(&sql)
            .bind(job_id)
            .bind(applicant_id)
            .bind(&req.cover_letter)
            .bind(&req.resume)
            .bind(ApplicationStatus::Pending.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_on_unique(e, |_| "You have already applied for this job".to_string())
            })
    }

    async fn list_applications(&self, job_id: i64) -> RepoResult<Vec<JobApplication>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE job_id = ? ORDER BY id ASC"
        );
        let applications = sqlx::query_as::<_, JobApplication>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_courses(&self) -> RepoResult<Vec<CourseSummary>> {
        let courses = sqlx::query_as::<_, CourseSummary>(
            "SELECT id, title, description FROM courses ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: i64) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, title, description, content FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn create_course(&self, course: NewCourse) -> RepoResult<Course> {
        let created = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (title, description, content) VALUES (?, ?, ?) RETURNING id, title, description, content",
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// enroll
    ///
    /// Creates an enrollment with progress 0. Enrolling twice violates the
    /// (user_id, course_id) UNIQUE constraint and leaves the existing row untouched.
    async fn enroll(&self, user_id: i64, course_id: i64) -> RepoResult<CourseEnrollment> {
        sqlx::query_as::<_, CourseEnrollment>(
            "INSERT INTO course_enrollments (user_id, course_id, progress) VALUES (?, ?, 0) \
             RETURNING id, user_id, course_id, progress",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, |_| "Already enrolled".to_string()))
    }

    async fn get_enrollment(&self, user_id: i64, course_id: i64) -> RepoResult<Option<CourseEnrollment>> {
        let enrollment = sqlx::query_as::<_, CourseEnrollment>(
            "SELECT id, user_id, course_id, progress FROM course_enrollments WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    /// update_progress
    ///
    /// Overwrites the stored progress. Range checking happens in the handler;
    /// the schema's CHECK constraint backs it up.
    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        progress: i64,
    ) -> RepoResult<Option<CourseEnrollment>> {
        let enrollment = sqlx::query_as::<_, CourseEnrollment>(
            "UPDATE course_enrollments SET progress = ? WHERE user_id = ? AND course_id = ? \
             RETURNING id, user_id, course_id, progress",
        )
        .bind(progress)
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }
}
