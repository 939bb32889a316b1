use crate::{
    AppState,
    auth::{authenticate, issue_token},
    dto::{AuthResponse, LoginRequest, SignupRequest, UserResponse},
    errors::ApiError,
    routes::parse_id,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use tracing::info;
use validator::Validate;

/// POST /api/v1/signup
/// Body: { "username": "...", "password": "..." }
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state
        .credentials
        .create_user(&payload.username, &payload.password)
        .await?;

    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;

    info!("New user registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/login
/// Body: { "username": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user = state
        .credentials
        .verify_password(&payload.username, &payload.password)
        .await?;

    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;

    info!("User logged in: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/v1/users/{id}
/// Headers: Authorization: Bearer <token>
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;
    let id = parse_id(&id, "Invalid userID")?;

    let user = state
        .credentials
        .find_user(id)
        .ok_or(ApiError::NotFound("That user doesn't exist"))?;

    Ok(Json(user.into()))
}
