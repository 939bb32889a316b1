//! Document storage for posts and comments.
//!
//! `SpatialStore` is the only contract the location search depends on;
//! `PostStore` adds the CRUD used by the HTTP handlers.

mod memory;

pub use memory::MemoryStore;

use crate::{
    geo::GeoPoint,
    models::{Comment, Post},
};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    #[error("record not found")]
    NotFound,
    #[error("record belongs to another user")]
    NotOwner,
}

/// "Near" query issued to the store: non-deleted posts whose location lies
/// within `max_distance_meters` of `center`, newest first, at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearQuery {
    pub center: GeoPoint,
    pub max_distance_meters: f64,
    pub limit: usize,
}

#[async_trait]
pub trait SpatialStore: Send + Sync {
    async fn find_near(&self, query: &NearQuery) -> Result<Vec<Post>, StoreError>;
}

#[async_trait]
pub trait PostStore: SpatialStore {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError>;

    /// Returns `None` for unknown and soft-deleted posts alike.
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    async fn soft_delete_post(&self, id: Uuid, owner: Uuid) -> Result<(), StoreError>;

    /// Saves the comment and bumps the parent's `comment_count` as one step.
    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError>;

    /// Oldest first.
    async fn comments_for_post(&self, post_id: Uuid, limit: usize)
    -> Result<Vec<Comment>, StoreError>;

    async fn soft_delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        owner: Uuid,
    ) -> Result<(), StoreError>;
}
