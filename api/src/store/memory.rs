use super::{NearQuery, PostStore, SpatialStore, StoreError};
use crate::{
    geo::Coordinates,
    models::{Comment, Post},
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// In-process document store.
///
/// `DashMap` shards its locks internally, so handlers share one instance
/// behind an `Arc` without a Mutex. When a post and a comment are both
/// locked, the post is always locked first.
#[derive(Default)]
pub struct MemoryStore {
    posts: DashMap<Uuid, Post>,
    comments: DashMap<Uuid, Comment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpatialStore for MemoryStore {
    async fn find_near(&self, query: &NearQuery) -> Result<Vec<Post>, StoreError> {
        if !query.max_distance_meters.is_finite() || query.max_distance_meters < 0.0 {
            return Err(StoreError::MalformedQuery(format!(
                "invalid max distance {}",
                query.max_distance_meters
            )));
        }

        let center = Coordinates::from(query.center);
        if !center.is_valid() {
            return Err(StoreError::MalformedQuery(format!(
                "invalid center {:?}",
                query.center.coordinates
            )));
        }

        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| !entry.is_deleted)
            .filter(|entry| {
                center.distance_meters(&Coordinates::from(*entry.location()))
                    <= query.max_distance_meters
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(query.limit);

        Ok(posts)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self
            .posts
            .get(&id)
            .filter(|post| !post.is_deleted)
            .map(|post| post.clone()))
    }

    async fn soft_delete_post(&self, id: Uuid, owner: Uuid) -> Result<(), StoreError> {
        let mut post = self
            .posts
            .get_mut(&id)
            .filter(|post| !post.is_deleted)
            .ok_or(StoreError::NotFound)?;

        if post.owner != owner {
            return Err(StoreError::NotOwner);
        }

        post.is_deleted = true;
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, StoreError> {
        let mut post = self
            .posts
            .get_mut(&comment.parent_post)
            .filter(|post| !post.is_deleted)
            .ok_or(StoreError::NotFound)?;

        self.comments.insert(comment.id, comment.clone());
        post.comment_count += 1;
        post.updated_at = Utc::now();

        Ok(comment)
    }

    async fn comments_for_post(
        &self,
        post_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| entry.parent_post == post_id && !entry.is_deleted)
            .map(|entry| entry.value().clone())
            .collect();

        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments.truncate(limit);

        Ok(comments)
    }

    async fn soft_delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        owner: Uuid,
    ) -> Result<(), StoreError> {
        let mut post = self.posts.get_mut(&post_id).ok_or(StoreError::NotFound)?;

        let mut comment = self
            .comments
            .get_mut(&comment_id)
            .filter(|comment| comment.parent_post == post_id && !comment.is_deleted)
            .ok_or(StoreError::NotFound)?;

        if comment.owner != owner {
            return Err(StoreError::NotOwner);
        }

        let now = Utc::now();
        comment.is_deleted = true;
        comment.updated_at = now;
        post.comment_count = post.comment_count.saturating_sub(1);
        post.updated_at = now;

        Ok(())
    }
}
