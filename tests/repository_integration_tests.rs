use seagro::{
    models::{ApplicationStatus, ApplyJobRequest, NewCourse, NewJob, NewUser, PageRequest, User},
    repository::{self, RepoError, Repository, SqliteRepository},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tokio::test;

// --- Test Context and Setup ---

/// Holds a migrated in-memory database for one test.
struct DbTestContext {
    pool: SqlitePool,
}

impl DbTestContext {
    async fn setup() -> Self {
        // A single long-lived connection keeps the in-memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory SQLite");

        repository::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> SqliteRepository {
        SqliteRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

async fn create_test_user(repo: &SqliteRepository, username: &str) -> User {
    repo.create_user(NewUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        ..NewUser::default()
    })
    .await
    .expect("Failed to create test user")
}

fn new_job(title: &str) -> NewJob {
    NewJob {
        title: title.to_string(),
        company: "Acme".to_string(),
        description: "Work".to_string(),
        ..NewJob::default()
    }
}

async fn create_test_course(repo: &SqliteRepository) -> i64 {
    repo.create_course(NewCourse {
        title: "Course".to_string(),
        description: "About".to_string(),
        content: "Body".to_string(),
    })
    .await
    .expect("Failed to create test course")
    .id
}

// --- Users ---

#[test]
async fn test_create_user_and_fetch() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let user = repo
        .create_user(NewUser {
            username: "ada".to_string(),
            email: "ada@test.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: Some("Ada".to_string()),
            is_admin: true,
            ..NewUser::default()
        })
        .await
        .unwrap();

    assert_eq!(user.id, 1);
    assert!(user.is_admin);

    let fetched = repo.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.username, "ada");
    assert_eq!(fetched.first_name.as_deref(), Some("Ada"));
    assert_eq!(fetched.created_at, user.created_at);

    let creds = repo
        .find_credentials_by_email("ada@test.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(creds.id, user.id);
    assert_eq!(creds.password_hash, "hash");

    assert!(repo.get_user(999).await.unwrap().is_none());
    assert!(
        repo.find_credentials_by_email("nobody@test.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[test]
async fn test_duplicate_user_is_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    create_test_user(&repo, "ada").await;

    let same_email = repo
        .create_user(NewUser {
            username: "other".to_string(),
            email: "ada@test.com".to_string(),
            password_hash: "h".to_string(),
            ..NewUser::default()
        })
        .await;
    match same_email {
        Err(RepoError::Conflict(msg)) => assert_eq!(msg, "Email already registered"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let same_username = repo
        .create_user(NewUser {
            username: "ada".to_string(),
            email: "fresh@test.com".to_string(),
            password_hash: "h".to_string(),
            ..NewUser::default()
        })
        .await;
    match same_username {
        Err(RepoError::Conflict(msg)) => assert_eq!(msg, "Username already taken"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

// --- Job Board ---

#[test]
async fn test_job_detail_includes_author() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, "author").await;

    let job = repo.create_job(new_job("Engineer"), author.id).await.unwrap();
    assert_eq!(job.author_id, author.id);

    let detail = repo.get_job_detail(job.id).await.unwrap().unwrap();
    assert_eq!(detail.title, "Engineer");
    assert_eq!(detail.author.id, author.id);
    assert_eq!(detail.author.username, "author");

    assert!(repo.get_job_detail(job.id + 1).await.unwrap().is_none());
    assert!(repo.get_job(job.id + 1).await.unwrap().is_none());
}

#[test]
async fn test_list_jobs_orders_newest_first_and_paginates() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, "author").await;

    for i in 0..12 {
        repo.create_job(new_job(&format!("Job {i}")), author.id)
            .await
            .unwrap();
    }

    let first = repo
        .list_jobs(PageRequest {
            page: Some(1),
            per_page: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(first.total, 12);
    assert_eq!(first.pages, 3);
    assert_eq!(first.jobs.len(), 5);
    assert_eq!(first.jobs[0].title, "Job 11");

    let last = repo
        .list_jobs(PageRequest {
            page: Some(3),
            per_page: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(last.jobs.len(), 2);
    assert_eq!(last.jobs[1].title, "Job 0");

    // Past the end is an empty page, not an error.
    let beyond = repo
        .list_jobs(PageRequest {
            page: Some(9),
            per_page: Some(5),
        })
        .await
        .unwrap();
    assert!(beyond.jobs.is_empty());
    assert_eq!(beyond.current_page, 9);
    assert_eq!(beyond.total, 12);
}

#[test]
async fn test_list_jobs_empty_board() {
    let ctx = DbTestContext::setup().await;
    let page = ctx
        .repository()
        .list_jobs(PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert_eq!(page.pages, 0);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.per_page, 10);
}

#[test]
async fn test_application_is_unique_per_job_and_applicant() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, "author").await;
    let applicant = create_test_user(&repo, "applicant").await;
    let job = repo.create_job(new_job("Engineer"), author.id).await.unwrap();

    let application = repo
        .create_application(
            job.id,
            applicant.id,
            ApplyJobRequest {
                cover_letter: Some("Hello".to_string()),
                resume: Some("cv.pdf".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.resume.as_deref(), Some("cv.pdf"));

    let again = repo
        .create_application(job.id, applicant.id, ApplyJobRequest::default())
        .await;
    assert!(matches!(again, Err(RepoError::Conflict(_))));

    // The author may apply to their own job; uniqueness is per applicant.
    repo.create_application(job.id, author.id, ApplyJobRequest::default())
        .await
        .unwrap();

    let applications = repo.list_applications(job.id).await.unwrap();
    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].applicant_id, applicant.id);
    assert_eq!(applications[0].cover_letter.as_deref(), Some("Hello"));
}

// --- Course Catalog ---

#[test]
async fn test_courses_list_and_detail() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = create_test_course(&repo).await;

    let courses = repo.list_courses().await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].id, id);

    let course = repo.get_course(id).await.unwrap().unwrap();
    assert_eq!(course.content, "Body");
    assert!(repo.get_course(id + 1).await.unwrap().is_none());
}

#[test]
async fn test_enroll_twice_is_conflict_and_keeps_progress() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, "learner").await;
    let course_id = create_test_course(&repo).await;

    let enrollment = repo.enroll(user.id, course_id).await.unwrap();
    assert_eq!(enrollment.progress, 0);

    repo.update_progress(user.id, course_id, 40).await.unwrap();

    let again = repo.enroll(user.id, course_id).await;
    match again {
        Err(RepoError::Conflict(msg)) => assert_eq!(msg, "Already enrolled"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = repo.get_enrollment(user.id, course_id).await.unwrap().unwrap();
    assert_eq!(stored.progress, 40);
}

#[test]
async fn test_update_progress_requires_enrollment() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, "learner").await;
    let course_id = create_test_course(&repo).await;

    let missing = repo.update_progress(user.id, course_id, 50).await.unwrap();
    assert!(missing.is_none());

    repo.enroll(user.id, course_id).await.unwrap();
    let updated = repo
        .update_progress(user.id, course_id, 100)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.progress, 100);
}

#[test]
async fn test_progress_check_constraint_backs_up_validation() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, "learner").await;
    let course_id = create_test_course(&repo).await;
    repo.enroll(user.id, course_id).await.unwrap();

    let result = repo.update_progress(user.id, course_id, 150).await;
    assert!(matches!(result, Err(RepoError::Database(_))));

    let stored = repo.get_enrollment(user.id, course_id).await.unwrap().unwrap();
    assert_eq!(stored.progress, 0);
}
