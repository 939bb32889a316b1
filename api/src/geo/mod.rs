//! Location-based post retrieval with adaptive radius expansion.
//!
//! `SpatialQueryExecutor` runs one bounded "near" query, `LocationSearch`
//! retries it with a growing radius while results are sparse, and
//! `assemble` packages the final posts with the radius actually used.

mod assemble;
mod expansion;
mod point;
mod query;

pub use assemble::{NearbyPosts, assemble};
pub use expansion::{
    DEFAULT_RADIUS_MILES, EXPANSION_SCHEDULE_MILES, ExpansionPolicy, LocationSearch,
    MIN_POSTS_THRESHOLD, PolicyError, SearchParams,
};
pub use point::{
    Coordinates, EARTH_RADIUS_METERS, GeoJsonType, GeoPoint, MAX_RADIUS_MILES, METERS_PER_MILE,
    miles_to_meters,
};
pub use query::{MAX_RESULTS, SpatialQueryExecutor};

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("{0}")]
    InvalidParameters(String),
    #[error("spatial query failed: {0}")]
    QueryFailure(#[source] StoreError),
}
