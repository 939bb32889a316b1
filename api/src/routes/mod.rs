pub mod comment;
pub mod health;
pub mod post;
pub mod user;

use crate::{
    AppState,
    errors::ApiError,
    middleware::{handle_middleware_error, rate_limit, redirect_https},
};
use axum::{
    Router,
    error_handling::HandleErrorLayer,
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = state.config.request_timeout;

    let api = Router::new()
        // Public routes (no auth required)
        .route("/signup", post(user::signup))
        .route("/login", post(user::login))
        // Protected routes (auth required)
        .route("/users/{id}", get(user::get_user))
        .route("/posts_by_location", get(post::posts_by_location))
        .route("/posts", post(post::create_post))
        .route("/post/{id}", get(post::get_post).delete(post::delete_post))
        .route(
            "/posts/{id}/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route(
            "/posts/{id}/comments/{comment_id}",
            delete(comment::delete_comment),
        );

    Router::new()
        .route("/", get(health::root))
        .route("/heartbeat", get(health::heartbeat))
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), redirect_https))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found")
}

/// Parses a path id, reporting malformed ones as a 400 with `message`.
pub(crate) fn parse_id(raw: &str, message: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::ValidationError(message.into()))
}
