use crate::{errors::ApiError, models::User};
use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub username: String,
    pub exp: usize,
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| ApiError::InternalError("Failed to calculate expiration".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::InternalError(format!("Token Creation failed: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

/// Resolves the bearer token in `headers` to a user id.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Uuid, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = verify_token(token.trim(), secret)?;
    Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".into(),
            hashed_password: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn issued_token_authenticates_its_user() {
        let user = user();
        let token = issue_token(&user, "secret", 24).unwrap();

        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.username, "testuser");
        assert_eq!(authenticate(&bearer(&token), "secret").unwrap(), user.id);
    }

    #[test]
    fn rejects_wrong_secret_and_missing_header() {
        let token = issue_token(&user(), "secret", 24).unwrap();

        assert!(matches!(
            authenticate(&bearer(&token), "other"),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&HeaderMap::new(), "secret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let token = issue_token(&user(), "secret", 24).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {token}")).unwrap(),
        );

        assert!(matches!(
            authenticate(&headers, "secret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = issue_token(&user(), "secret", -2).unwrap();

        assert!(matches!(
            verify_token(&token, "secret"),
            Err(ApiError::Unauthorized)
        ));
    }
}
