use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub owner: Uuid,
    pub parent_post: Uuid,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(owner: Uuid, parent_post: Uuid, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            parent_post,
            content,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
