use crate::{AppState, errors::ApiError};
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower::BoxError;
use tracing::warn;

/// Global request budget, shared by every client.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.rate_limiter.check().is_err() {
        warn!("Rate limit hit: {} {}", request.method(), request.uri().path());
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Sends plain-HTTP clients to HTTPS when `REDIRECT_HTTPS` is on.
///
/// TLS ends at the proxy, so the scheme comes from `X-Forwarded-Proto`.
/// Reads get a 301 to the same URL over HTTPS; writes are refused, since
/// their body was already sent in the clear.
pub async fn redirect_https(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.redirect_https || forwarded_https(&request) {
        return Ok(next.run(request).await);
    }

    if request.method() != Method::GET {
        warn!("Refusing insecure {} {}", request.method(), request.uri().path());
        return Err(ApiError::InsecureTransport);
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .ok_or_else(|| ApiError::ValidationError("Missing Host header".into()))?;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    // Redirect::permanent answers 308; clients expect a 301 here
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, format!("https://{host}{path}"))],
    )
        .into_response())
}

fn forwarded_https(request: &Request) -> bool {
    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|proto| proto.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Turns errors from the tower timeout layer into responses.
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::InternalError(format!("Unhandled middleware error: {}", err))
    }
}
