use axum::{http::StatusCode, response::IntoResponse};
use chrono::Utc;
use seagro::{
    error::{ApiError, ErrorResponse},
    models::{
        ApplicationStatus, CreateJobRequest, JobApplication, JobAuthor, JobDetail, PageRequest,
        User, page_count,
    },
    repository::RepoError,
};
use serde_json::Value;

// --- Serialization ---

#[test]
fn test_application_status_is_lowercase_json() {
    let application = JobApplication {
        id: 1,
        job_id: 2,
        applicant_id: 3,
        status: ApplicationStatus::Pending,
        created_at: Utc::now(),
        ..JobApplication::default()
    };

    let json: Value = serde_json::to_value(&application).unwrap();
    assert_eq!(json["status"], "pending");

    assert_eq!(
        serde_json::to_string(&ApplicationStatus::Rejected).unwrap(),
        r#""rejected""#
    );
}

#[test]
fn test_application_status_from_database_text() {
    assert_eq!(
        ApplicationStatus::try_from("accepted".to_string()).unwrap(),
        ApplicationStatus::Accepted
    );
    assert!(ApplicationStatus::try_from("archived".to_string()).is_err());
    assert_eq!(ApplicationStatus::default().as_str(), "pending");
}

#[test]
fn test_job_detail_nests_author() {
    let detail = JobDetail {
        id: 1,
        title: "T".to_string(),
        author: JobAuthor {
            id: 9,
            username: "a".to_string(),
        },
        ..JobDetail::default()
    };

    let json: Value = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["author"]["username"], "a");
    assert_eq!(json["author"]["id"], 9);
    assert!(json.get("author_id").is_none());
}

#[test]
fn test_user_never_serializes_password() {
    let json = serde_json::to_string(&User::default()).unwrap();
    assert!(!json.contains("password"));
}

#[test]
fn test_create_job_request_omits_absent_optionals() {
    let req = CreateJobRequest {
        title: Some("T".to_string()),
        ..CreateJobRequest::default()
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains(r#""title":"T""#));
    assert!(!json.contains("salary"));
}

#[test]
fn test_error_response_skips_empty_detail() {
    let body = ErrorResponse {
        error: "Job not found".to_string(),
        detail: None,
    };
    assert_eq!(
        serde_json::to_string(&body).unwrap(),
        r#"{"error":"Job not found"}"#
    );
}

// --- Pagination ---

#[test]
fn test_page_request_defaults_and_clamping() {
    let default = PageRequest::default();
    assert_eq!(default.page(), 1);
    assert_eq!(default.per_page(), 10);
    assert_eq!(default.offset(), 0);

    let clamped = PageRequest {
        page: Some(0),
        per_page: Some(1000),
    };
    assert_eq!(clamped.page(), 1);
    assert_eq!(clamped.per_page(), 100);

    let negative = PageRequest {
        page: Some(-3),
        per_page: Some(0),
    };
    assert_eq!(negative.page(), 1);
    assert_eq!(negative.per_page(), 10);

    let third = PageRequest {
        page: Some(3),
        per_page: Some(20),
    };
    assert_eq!(third.offset(), 40);
}

#[test]
fn test_page_count() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(1, 10), 1);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(15, 10), 2);
    assert_eq!(page_count(101, 100), 2);
}

// --- Error Mapping ---

#[test]
fn test_api_error_status_codes() {
    let cases = [
        (ApiError::validation("x"), StatusCode::BAD_REQUEST),
        (ApiError::Conflict("x".to_string()), StatusCode::BAD_REQUEST),
        (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
        (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
        (ApiError::not_found("x"), StatusCode::NOT_FOUND),
        (ApiError::login_failed("x"), StatusCode::INTERNAL_SERVER_ERROR),
        (ApiError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (err, expected) in cases {
        assert_eq!(err.status_code(), expected, "{err}");
        assert_eq!(err.into_response().status(), expected);
    }
}

#[test]
fn test_repo_error_conversion() {
    let conflict: ApiError = RepoError::Conflict("Already enrolled".to_string()).into();
    assert!(matches!(conflict, ApiError::Conflict(ref msg) if msg == "Already enrolled"));

    let db: ApiError = RepoError::Database(sqlx::Error::RowNotFound).into();
    assert!(matches!(db, ApiError::Internal(_)));
}
