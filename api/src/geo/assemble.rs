use crate::models::Post;
use serde::Serialize;

/// Response body of a location search.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPosts {
    pub posts: Vec<Post>,
    /// Final radius used, after any expansion.
    pub radius_miles: f64,
}

pub fn assemble(posts: Vec<Post>, radius_miles: f64) -> NearbyPosts {
    NearbyPosts {
        posts,
        radius_miles,
    }
}
