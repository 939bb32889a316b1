use crate::{geo::LocationError, store::StoreError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    UserAlreadyExists,
    Unauthorized,
    InsecureTransport,
    NotFound(&'static str),
    ValidationError(String),
    RateLimited,
    Timeout,
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UserAlreadyExists => StatusCode::CONFLICT,
            ApiError::InsecureTransport => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every error leaves as `{"error": {"code": <status>, "message": "..."}}`.
/// Internal details are logged, never sent.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::UserAlreadyExists => "Username already taken".to_string(),
            ApiError::Unauthorized => "Not authorized".to_string(),
            ApiError::InsecureTransport => "Please use HTTPS when submitting data".to_string(),
            ApiError::NotFound(msg) => msg.to_string(),
            ApiError::ValidationError(msg) => msg,
            ApiError::RateLimited => "Too many requests".to_string(),
            ApiError::Timeout => "Request timed out".to_string(),
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": {
                "code": status.as_u16(),
                "message": message
              }
            })),
        )
            .into_response()
    }
}

impl From<LocationError> for ApiError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::InvalidParameters(msg) => ApiError::ValidationError(msg),
            LocationError::QueryFailure(cause) => {
                ApiError::InternalError(format!("Location query failed: {}", cause))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Not Found"),
            StoreError::NotOwner => ApiError::Unauthorized,
            StoreError::Unavailable(_) | StoreError::MalformedQuery(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}
