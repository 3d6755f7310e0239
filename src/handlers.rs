use crate::{
    AppState,
    auth::{self, AuthUser, SESSION_USER_KEY},
    error::{ApiError, ApiResult, ErrorResponse},
    models::{
        ApplicationList, ApplyJobRequest, Course, CourseSummary, CreateJobRequest,
        CreatedResponse, JobDetail, JobPage, LoginRequest, LoginResponse, MessageResponse, NewJob,
        NewUser, PageRequest, ProgressRequest, ProgressResponse, RegisterRequest,
        RegisterResponse, SessionUser, User,
    },
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::Value;
use tower_sessions::Session;

/// Returns the field if present and non-empty.
fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

/// Accepts only a JSON integer in `0..=100`. Strings, floats, booleans and null are rejected.
pub fn parse_progress(value: Option<&Value>) -> ApiResult<i64> {
    value
        .and_then(Value::as_i64)
        .filter(|p| (0..=100).contains(p))
        .ok_or_else(|| ApiError::validation("Invalid progress value"))
}

// --- Authentication ---

/// register_user
///
/// [Public Route] Creates an account. The password is hashed with Argon2 before
/// it reaches the repository; duplicate email/username is reported as 400.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Missing fields or already taken", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(payload) = payload?;

    let (Some(username), Some(email), Some(password)) = (
        required(payload.username),
        required(payload.email),
        required(payload.password),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let password_hash = auth::hash_password_blocking(password).await?;

    let user = state
        .repo
        .create_user(NewUser {
            username,
            email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            ..NewUser::default()
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// login
///
/// [Public Route] Verifies email + password and binds the user id to a fresh session.
///
/// Unexpected failures on this path are reported with their cause (`detail`).
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Login failed", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(payload) = payload?;

    let (Some(email), Some(password)) = (required(payload.email), required(payload.password))
    else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let invalid = || ApiError::unauthorized("Invalid email or password");

    let creds = state
        .repo
        .find_credentials_by_email(&email)
        .await
        .map_err(ApiError::login_failed)?
        .ok_or_else(invalid)?;

    let valid = auth::verify_password_blocking(password, creds.password_hash.clone())
        .await
        .map_err(ApiError::login_failed)?;
    if !valid {
        tracing::info!(user_id = creds.id, "login rejected: bad password");
        return Err(invalid());
    }

    session.cycle_id().await.map_err(ApiError::login_failed)?;
    session
        .insert(SESSION_USER_KEY, creds.id)
        .await
        .map_err(ApiError::login_failed)?;

    tracing::info!(user_id = creds.id, "user logged in");

    Ok(Json(LoginResponse {
        message: "Logged in successfully".to_string(),
        user: SessionUser {
            id: creds.id,
            username: creds.username,
            email: creds.email,
        },
    }))
}

/// logout
///
/// [Authenticated Route] Destroys the server-side session and expires the cookie.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn logout(
    AuthUser { id, .. }: AuthUser,
    session: Session,
) -> ApiResult<Json<MessageResponse>> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("failed to flush session: {e}")))?;
    tracing::info!(user_id = id, "user logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

// --- Users ---

/// get_profile
///
/// [Authenticated Route] The current user's profile.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<User>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    Ok(Json(user))
}

// --- Job Board ---

/// list_jobs
///
/// [Public Route] Paginated job listing, newest first. Unparseable query
/// parameters fall back to the defaults (page 1, 10 per page).
#[utoipa::path(
    get,
    path = "/api/jobs",
    params(PageRequest),
    responses((status = 200, description = "One page of jobs", body = JobPage))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> ApiResult<Json<JobPage>> {
    let page = query.map(|Query(q)| q).unwrap_or_default();
    Ok(Json(state.repo.list_jobs(page).await?))
}

/// create_job
///
/// [Authenticated Route] Posts a job. The author is always the session's user.
#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn create_job(
    AuthUser { id, username }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(payload) = payload?;

    let (Some(title), Some(company), Some(description)) = (
        required(payload.title),
        required(payload.company),
        required(payload.description),
    ) else {
        return Err(ApiError::validation(
            "title, company and description are required",
        ));
    };

    let job = state
        .repo
        .create_job(
            NewJob {
                title,
                company,
                description,
                location: payload.location,
                requirements: payload.requirements,
                salary: payload.salary,
            },
            id,
        )
        .await?;

    tracing::info!(job_id = job.id, author = %username, "job created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Job created successfully".to_string(),
            id: job.id,
        }),
    ))
}

/// get_job
///
/// [Public Route] Full job posting including the author's public identity.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Found", body = JobDetail),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<JobDetail>> {
    state
        .repo
        .get_job_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

/// apply_job
///
/// [Authenticated Route] Submits an application (status `pending`).
///
/// The body is optional. A second application to the same job by the same user
/// is rejected by the repository's uniqueness constraint (400).
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    params(("id" = i64, Path, description = "Job ID")),
    request_body(content = ApplyJobRequest, description = "Optional cover letter and resume"),
    responses(
        (status = 201, description = "Applied", body = CreatedResponse),
        (status = 400, description = "Already applied", body = ErrorResponse),
        (status = 404, description = "Job Not Found", body = ErrorResponse)
    )
)]
pub async fn apply_job(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    payload: Result<Json<ApplyJobRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let job = state
        .repo
        .get_job(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => ApplyJobRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let application = state.repo.create_application(job.id, user_id, req).await?;

    tracing::info!(job_id = job.id, application_id = application.id, user_id, "application submitted");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Application submitted successfully".to_string(),
            id: application.id,
        }),
    ))
}

/// list_job_applications
///
/// [Authenticated Route] All applications for a job.
///
/// *Ownership*: only the job's author may see them; anyone else gets 403.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/applications",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applications", body = ApplicationList),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Job Not Found", body = ErrorResponse)
    )
)]
pub async fn list_job_applications(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<ApplicationList>> {
    let job = state
        .repo
        .get_job(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.author_id != user_id {
        tracing::warn!(job_id, user_id, "non-author requested job applications");
        return Err(ApiError::forbidden("Only the job author can view applications"));
    }

    let applications = state.repo.list_applications(job.id).await?;
    Ok(Json(ApplicationList { applications }))
}

// --- Course Catalog ---

/// list_courses
///
/// [Public Route] Every course in the catalog (id, title, description).
#[utoipa::path(
    get,
    path = "/api/courses",
    responses((status = 200, description = "Courses", body = [CourseSummary]))
)]
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<CourseSummary>>> {
    Ok(Json(state.repo.list_courses().await?))
}

/// get_course
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Course>> {
    state
        .repo
        .get_course(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

/// enroll_course
///
/// [Authenticated Route] Enrolls the current user with progress 0.
/// Enrolling twice is a 400 and leaves the existing enrollment unchanged.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled", body = MessageResponse),
        (status = 400, description = "Already enrolled", body = ErrorResponse),
        (status = 404, description = "Course Not Found", body = ErrorResponse)
    )
)]
pub async fn enroll_course(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let course = state
        .repo
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    state.repo.enroll(user_id, course.id).await?;
    tracing::info!(course_id, user_id, "user enrolled");

    Ok(Json(MessageResponse::new("Enrolled successfully")))
}

/// update_progress
///
/// [Authenticated Route] Overwrites the current user's progress in a course.
///
/// The value must be a JSON integer between 0 and 100; it is validated before
/// anything is read or written.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/progress",
    params(("id" = i64, Path, description = "Course ID")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = ProgressResponse),
        (status = 400, description = "Invalid progress value", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse)
    )
)]
pub async fn update_progress(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> ApiResult<Json<ProgressResponse>> {
    let Json(payload) = payload?;
    let progress = parse_progress(payload.progress.as_ref())?;

    let enrollment = state
        .repo
        .update_progress(user_id, course_id, progress)
        .await?
        .ok_or_else(|| ApiError::not_found("Not enrolled in this course"))?;

    Ok(Json(ProgressResponse {
        message: "Progress updated".to_string(),
        progress: enrollment.progress,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_accepts_integers_in_range() {
        assert_eq!(parse_progress(Some(&json!(0))).unwrap(), 0);
        assert_eq!(parse_progress(Some(&json!(50))).unwrap(), 50);
        assert_eq!(parse_progress(Some(&json!(100))).unwrap(), 100);
    }

    #[test]
    fn progress_rejects_out_of_range_and_non_integers() {
        for bad in [json!(150), json!(-1), json!("50"), json!(50.5), json!(true), json!(null)] {
            assert!(parse_progress(Some(&bad)).is_err(), "{bad} should be rejected");
        }
        assert!(parse_progress(None).is_err());
    }

    #[test]
    fn required_treats_empty_as_missing() {
        assert_eq!(required(Some("a".into())), Some("a".into()));
        assert_eq!(required(Some(String::new())), None);
        assert_eq!(required(None), None);
    }
}
