use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, cookie::SameSite};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregated by access level (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{RepositoryState, SqliteRepository};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and
/// `ToSchema` models. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::logout, handlers::get_profile,
        handlers::list_jobs, handlers::create_job, handlers::get_job, handlers::apply_job,
        handlers::list_job_applications, handlers::list_courses, handlers::get_course,
        handlers::enroll_course, handlers::update_progress
    ),
    components(
        schemas(
            models::User, models::JobSummary, models::JobDetail, models::JobAuthor,
            models::JobPage, models::JobApplication, models::ApplicationStatus,
            models::ApplicationList, models::Course, models::CourseSummary,
            models::RegisterRequest, models::RegisterResponse, models::LoginRequest,
            models::LoginResponse, models::SessionUser, models::CreateJobRequest,
            models::CreatedResponse, models::ApplyJobRequest, models::ProgressRequest,
            models::ProgressResponse, models::MessageResponse, error::ErrorResponse,
        )
    ),
    tags(
        (name = "seagro", description = "Job board and course catalog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of application services shared by all requests.
/// Handles are injected here at start-up instead of living in globals.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: all reads and writes go through this handle.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` resolves the session;
/// if that fails the extractor's 401 is returned and the handler never runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// session_layer
///
/// Builds the cookie-based session manager over any `tower-sessions` store.
/// The binary uses the SQLite store; tests use the in-memory one.
pub fn session_layer<Store>(store: Store, config: &AppConfig) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(auth::SESSION_COOKIE_NAME)
        .with_secure(config.session_secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_ttl_minutes,
        )))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = if config.allows_any_origin() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };
    cors.allow_methods(Any).allow_headers(Any)
}

/// create_router
///
/// Assembles the routing table, applies global and scoped middleware, and
/// registers the application state and session store.
pub fn create_router<Store>(state: AppState, session_store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    let x_request_id = HeaderName::from_static("x-request-id");
    let sessions = session_layer(session_store, &state.config);
    let cors = cors_layer(&state.config);

    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .layer(sessions)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Every request gets an x-request-id, echoed back in the response.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: correlates every log line of a request by its
/// `x-request-id`, alongside method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
