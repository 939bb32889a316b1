// ============================================================================
// NEARBY POSTS API
// ============================================================================

// - User signup/login with password hashing
// - JWT authentication & authorization
// - Geotagged posts and comments with soft delete
// - Location search that widens its radius when results are sparse
// - CORS, rate limiting, request timeouts and optional HTTPS redirects
// - Structured logging

pub mod auth;
pub mod config;
pub mod credentials;
pub mod dto;
pub mod errors;
pub mod geo;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod states;
pub mod store;

pub use config::Config;
pub use routes::build_router;
pub use states::AppState;
