use crate::{
    AppState,
    auth::authenticate,
    dto::{CommentsResponse, CreateCommentRequest, SuccessResponse},
    errors::ApiError,
    models::Comment,
    routes::parse_id,
    store::StoreError,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use tracing::info;
use validator::Validate;

/// Most comments returned for one post.
pub const MAX_COMMENTS: usize = 300;

/// GET /api/v1/posts/{id}/comments
/// Headers: Authorization: Bearer <token>
pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<Json<CommentsResponse>, ApiError> {
    authenticate(&headers, &state.config.jwt_secret)?;
    let post_id = parse_id(&post_id, "Invalid postID")?;

    let comments = state.store.comments_for_post(post_id, MAX_COMMENTS).await?;

    Ok(Json(CommentsResponse { comments }))
}

/// POST /api/v1/posts/{id}/comments
/// Headers: Authorization: Bearer <token>
/// Body: { "content": "..." }
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let user_id = authenticate(&headers, &state.config.jwt_secret)?;
    let post_id = parse_id(&post_id, "Invalid postID")?;
    let Json(payload) = payload?;

    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let comment = state
        .store
        .insert_comment(Comment::new(user_id, post_id, payload.content))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("The parent post doesn't exist"),
            other => other.into(),
        })?;

    info!("Comment {} created on post {} by user {}", comment.id, post_id, user_id);

    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/v1/posts/{id}/comments/{comment_id}
/// Headers: Authorization: Bearer <token>
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let user_id = authenticate(&headers, &state.config.jwt_secret)?;
    let post_id = parse_id(&post_id, "Invalid postID")?;
    let comment_id = parse_id(&comment_id, "Invalid commentID")?;

    state
        .store
        .soft_delete_comment(post_id, comment_id, user_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("That comment doesn't exist"),
            other => other.into(),
        })?;

    info!("Comment {} deleted by user {}", comment_id, user_id);

    Ok(Json(SuccessResponse::ok()))
}
