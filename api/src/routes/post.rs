use crate::{
    AppState,
    auth::authenticate,
    dto::{CreatePostRequest, LocationQuery, SuccessResponse},
    errors::ApiError,
    geo::{Coordinates, NearbyPosts},
    models::Post,
    routes::parse_id,
    store::StoreError,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info};
use validator::Validate;

/// POST /api/v1/posts
/// Headers: Authorization: Bearer <token>
/// Body: { "content": "...", "latitude": 39.16, "longitude": -120.14 }
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let user_id = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(payload) = payload?;

    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    // validate() guarantees both are present
    let (Some(latitude), Some(longitude)) = (payload.latitude, payload.longitude) else {
        return Err(ApiError::ValidationError(
            "latitude and longitude are required".into(),
        ));
    };

    debug!("User {} creating post at {}, {}", user_id, latitude, longitude);

    let post = Post::new(
        user_id,
        payload.content,
        Coordinates::new(latitude, longitude),
    );
    let post = state.store.insert_post(post).await?;

    info!("Post created: {} by user {}", post.id, user_id);

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/posts_by_location?lat=37.1&long=-122.5&within=5
/// Headers: Authorization: Bearer <token>
pub async fn posts_by_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<NearbyPosts>, ApiError> {
    let user_id = authenticate(&headers, &state.config.jwt_secret)?;
    let Query(query) = query?;

    let params = query.into_search_params(user_id)?;
    let nearby = state.search.search(params).await?;

    Ok(Json(nearby))
}

/// GET /api/v1/post/{id}
/// Headers: Authorization: Bearer <token>
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;
    let id = parse_id(&id, "Invalid postID")?;

    let post = state
        .store
        .find_post(id)
        .await?
        .ok_or(ApiError::NotFound("That post doesn't exist"))?;

    Ok(Json(post))
}

/// DELETE /api/v1/post/{id}
/// Headers: Authorization: Bearer <token>
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let user_id = authenticate(&headers, &state.config.jwt_secret)?;
    let id = parse_id(&id, "Invalid postID")?;

    state
        .store
        .soft_delete_post(id, user_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("That post doesn't exist"),
            other => other.into(),
        })?;

    info!("Post deleted: {} by user {}", id, user_id);

    Ok(Json(SuccessResponse::ok()))
}
