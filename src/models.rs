use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Public view of a row in the `users` table. The password hash is
/// absent; it only travels inside [`UserCredentials`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub is_admin: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used by the login flow to verify a password.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// NewUser
///
/// Insert payload for the `users` table. The password must already be hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub is_admin: bool,
}

/// Job
///
/// A job posting from the `jobs` table. `author_id` is the user who created it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
}

/// JobSummary
///
/// Row shape of the paginated job listing. The description is omitted to keep
/// list pages small.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// JobAuthor
///
/// Public identity of a job's author, embedded in [`JobDetail`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JobAuthor {
    pub id: i64,
    pub username: String,
}

/// JobDetail
///
/// Full job posting joined with its author (GET /api/jobs/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JobDetail {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub salary: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub author: JobAuthor,
}

/// ApplicationStatus
///
/// Review state of a [`JobApplication`]. Every application starts as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Error)]
#[error("unknown application status: {0}")]
pub struct UnknownStatus(pub String);

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(UnknownStatus(value)),
        }
    }
}

/// JobApplication
///
/// A row in `job_applications`. The (job_id, applicant_id) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct JobApplication {
    pub id: i64,
    pub job_id: i64,
    pub applicant_id: i64,
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Course
///
/// A course from the `courses` table (GET /api/courses/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
}

/// CourseSummary
///
/// Catalog listing entry; the course body is only served on the detail route.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// NewCourse
///
/// Insert payload for the `courses` table. Courses are only created by the seed tool.
#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub content: String,
}

/// CourseEnrollment
///
/// Links a user to a course with their progress (0-100).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CourseEnrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub progress: i64,
}

// --- Pagination ---

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// PageRequest
///
/// Query parameters accepted by paginated listings (`?page=2&per_page=10`).
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<i64>,
}

impl PageRequest {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn per_page(&self) -> i64 {
        match self.per_page {
            Some(n) if n >= 1 => n.min(MAX_PER_PAGE),
            _ => DEFAULT_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

/// Number of pages needed to show `total` items, `per_page` at a time.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// JobPage
///
/// One page of the job board listing (GET /api/jobs).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JobPage {
    pub jobs: Vec<JobSummary>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
}

// --- Request Payloads (Input Schemas) ---
//
// Required fields are modelled as `Option` so a missing field is reported as a
// validation error by the handler instead of a deserialization failure.

/// RegisterRequest
///
/// Input payload for POST /auth/register. The password is hashed before it
/// reaches the repository and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// CreateJobRequest
///
/// Input payload for POST /api/jobs. `title`, `company` and `description` are required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
}

/// NewJob
///
/// Validated job fields handed to the repository.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub requirements: Option<String>,
    pub salary: Option<String>,
}

/// ApplyJobRequest
///
/// Optional body of POST /api/jobs/{id}/apply.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApplyJobRequest {
    pub cover_letter: Option<String>,
    /// Reference to an uploaded resume (file name or URL).
    pub resume: Option<String>,
}

/// ProgressRequest
///
/// Body of POST /api/courses/{id}/progress. The value is kept raw so the
/// handler can reject non-integers (`"50"`, `50.5`, `true`) explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProgressRequest {
    #[ts(type = "number")]
    #[schema(value_type = i64, example = 50)]
    pub progress: Option<serde_json::Value>,
}

// --- Response Payloads (Output Schemas) ---

/// MessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// RegisterResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

/// SessionUser
///
/// Public identity returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}

/// CreatedResponse
///
/// Returned with 201 by routes that insert a row (jobs, applications).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

/// ApplicationList
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApplicationList {
    pub applications: Vec<JobApplication>,
}

/// ProgressResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProgressResponse {
    pub message: String,
    pub progress: i64,
}
