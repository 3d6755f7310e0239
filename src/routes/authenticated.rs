use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every handler here receives the `AuthUser` resolved from the session cookie.
/// The router layer in lib.rs rejects requests without a valid session before
/// they reach a handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/logout
        // Destroys the current session.
        .route("/auth/logout", get(handlers::logout))
        // GET /api/users/profile
        .route("/api/users/profile", get(handlers::get_profile))
        // --- Job Board ---
        // POST /api/jobs
        // Posts a job authored by the current user. GET on the same path is public,
        // so the method router is merged with the public one.
        .route("/api/jobs", post(handlers::create_job))
        // POST /api/jobs/{id}/apply
        // One application per user per job.
        .route("/api/jobs/{id}/apply", post(handlers::apply_job))
        // GET /api/jobs/{id}/applications
        // Author-only view of the applications to a job.
        .route(
            "/api/jobs/{id}/applications",
            get(handlers::list_job_applications),
        )
        // --- Course Catalog ---
        // POST /api/courses/{id}/enroll
        .route("/api/courses/{id}/enroll", post(handlers::enroll_course))
        // POST /api/courses/{id}/progress
        // Progress must be an integer between 0 and 100.
        .route("/api/courses/{id}/progress", post(handlers::update_progress))
}
