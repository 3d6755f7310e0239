use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session: the auth gateway and read-only views of
/// the job board and course catalog.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates an account; duplicate email or username is a 400.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Verifies credentials and issues the session cookie.
        .route("/auth/login", post(handlers::login))
        // GET /api/jobs?page=..&per_page=..
        // Paginated job board, newest first.
        .route("/api/jobs", get(handlers::list_jobs))
        // GET /api/jobs/{id}
        .route("/api/jobs/{id}", get(handlers::get_job))
        // GET /api/courses
        .route("/api/courses", get(handlers::list_courses))
        // GET /api/courses/{id}
        .route("/api/courses/{id}", get(handlers::get_course))
}
