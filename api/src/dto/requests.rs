use crate::geo::{LocationError, SearchParams};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Validate, Deserialize)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 400, message = "Content must be 1-400 characters"))]
    pub content: String,
    #[serde(alias = "lat")]
    #[validate(
        required(message = "latitude is required"),
        range(min = -90.0, max = 90.0, message = "latitude must be within [-90, 90]")
    )]
    pub latitude: Option<f64>,
    #[serde(alias = "long")]
    #[validate(
        required(message = "longitude is required"),
        range(min = -180.0, max = 180.0, message = "longitude must be within [-180, 180]")
    )]
    pub longitude: Option<f64>,
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 300, message = "Content must be 1-300 characters"))]
    pub content: String,
}

/// GET /posts_by_location?lat=..&long=..&within=..
///
/// Values stay strings here so a non-numeric value is reported in the
/// regular error format instead of as an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    #[serde(alias = "latitude")]
    pub lat: Option<String>,
    #[serde(alias = "longitude")]
    pub long: Option<String>,
    pub within: Option<String>,
}

impl LocationQuery {
    pub fn into_search_params(self, user: Uuid) -> Result<SearchParams, LocationError> {
        Ok(SearchParams {
            user: Some(user),
            latitude: parse_number("lat", self.lat)?,
            longitude: parse_number("long", self.long)?,
            radius_miles: parse_number("within", self.within)?,
        })
    }
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<f64>, LocationError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| LocationError::InvalidParameters(format!("{name} must be a number"))),
    }
}
