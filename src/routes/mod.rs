/// Router Module Index
///
/// Splits the routing table by access level. Access control is applied once per
/// module (via Axum layers) rather than route by route.

/// Routes accessible to anonymous clients: registration, login, read-only catalog views.
pub mod public;

/// Routes protected by the session-backed `AuthUser` middleware.
pub mod authenticated;
