use super::{Coordinates, GeoPoint, LocationError, miles_to_meters};
use crate::{
    models::Post,
    store::{NearQuery, SpatialStore},
};
use std::sync::Arc;
use tracing::debug;

/// Hard cap on posts returned by a single spatial query.
pub const MAX_RESULTS: usize = 200;

/// Issues one "within radius, not deleted, newest first" query.
///
/// Callers reason in miles; conversion to the store's meters happens here.
#[derive(Clone)]
pub struct SpatialQueryExecutor {
    store: Arc<dyn SpatialStore>,
}

impl SpatialQueryExecutor {
    pub fn new(store: Arc<dyn SpatialStore>) -> Self {
        Self { store }
    }

    pub async fn find_within(
        &self,
        center: Coordinates,
        radius_miles: f64,
    ) -> Result<Vec<Post>, LocationError> {
        let query = NearQuery {
            center: GeoPoint::from(center),
            max_distance_meters: miles_to_meters(radius_miles),
            limit: MAX_RESULTS,
        };

        let mut posts = self
            .store
            .find_near(&query)
            .await
            .map_err(LocationError::QueryFailure)?;

        // Don't trust the store with the result contract
        posts.retain(|post| !post.is_deleted);
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(MAX_RESULTS);

        debug!(
            "{} posts found within {} miles ({} meters) of {:?}",
            posts.len(),
            radius_miles,
            query.max_distance_meters,
            query.center.coordinates
        );

        Ok(posts)
    }
}
