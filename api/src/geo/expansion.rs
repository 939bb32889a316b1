use super::{
    Coordinates, LocationError, MAX_RADIUS_MILES, NearbyPosts, SpatialQueryExecutor, assemble,
};
use crate::store::SpatialStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Stop expanding once a query returns at least this many posts.
pub const MIN_POSTS_THRESHOLD: usize = 10;

/// Miles added to the radius on each successive retry.
pub const EXPANSION_SCHEDULE_MILES: [f64; 2] = [25.0, 100.0];

pub const DEFAULT_RADIUS_MILES: f64 = 5.0;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("default radius must be a positive number of miles, got {0}")]
    DefaultRadius(f64),
    #[error("expansion step {index} must be a non-negative number of miles, got {miles}")]
    Step { index: usize, miles: f64 },
}

/// When and how far a sparse location search widens.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionPolicy {
    default_radius_miles: f64,
    min_posts: usize,
    schedule: Vec<f64>,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            default_radius_miles: DEFAULT_RADIUS_MILES,
            min_posts: MIN_POSTS_THRESHOLD,
            schedule: EXPANSION_SCHEDULE_MILES.to_vec(),
        }
    }
}

impl ExpansionPolicy {
    pub fn new(
        default_radius_miles: f64,
        min_posts: usize,
        schedule: Vec<f64>,
    ) -> Result<Self, PolicyError> {
        if !default_radius_miles.is_finite() || default_radius_miles <= 0.0 {
            return Err(PolicyError::DefaultRadius(default_radius_miles));
        }

        // Negative steps would shrink the radius
        if let Some((index, &miles)) = schedule
            .iter()
            .enumerate()
            .find(|(_, miles)| !miles.is_finite() || **miles < 0.0)
        {
            return Err(PolicyError::Step { index, miles });
        }

        Ok(Self {
            default_radius_miles,
            min_posts,
            schedule,
        })
    }

    pub fn with_default_radius(self, default_radius_miles: f64) -> Result<Self, PolicyError> {
        Self::new(default_radius_miles, self.min_posts, self.schedule)
    }

    pub fn default_radius_miles(&self) -> f64 {
        self.default_radius_miles
    }

    pub fn min_posts(&self) -> usize {
        self.min_posts
    }

    pub fn schedule(&self) -> &[f64] {
        &self.schedule
    }

    /// Upper bound on store round-trips for one search.
    pub fn max_queries(&self) -> usize {
        self.schedule.len() + 1
    }
}

/// Raw inputs of a location search, as handed over by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParams {
    pub user: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Falls back to the policy's default radius when absent.
    pub radius_miles: Option<f64>,
}

/// Finds nearby posts, widening the radius while results are sparse.
///
/// Every call is independent: the loop state lives on the stack and the
/// store is the only shared resource.
#[derive(Clone)]
pub struct LocationSearch {
    executor: SpatialQueryExecutor,
    policy: ExpansionPolicy,
}

impl LocationSearch {
    pub fn new(store: Arc<dyn SpatialStore>, policy: ExpansionPolicy) -> Self {
        Self {
            executor: SpatialQueryExecutor::new(store),
            policy,
        }
    }

    pub fn policy(&self) -> &ExpansionPolicy {
        &self.policy
    }

    pub async fn search(&self, params: SearchParams) -> Result<NearbyPosts, LocationError> {
        let (user, center, mut radius_miles) = self.validate(params)?;

        debug!(
            "{} looking for posts {} miles from {:?}",
            user, radius_miles, center
        );

        let mut attempt = 0;
        loop {
            let posts = self.executor.find_within(center, radius_miles).await?;

            if posts.len() >= self.policy.min_posts {
                return Ok(assemble(posts, radius_miles));
            }

            let Some(step) = self.policy.schedule.get(attempt) else {
                debug!(
                    "Expansion schedule exhausted at {} miles with {} posts",
                    radius_miles,
                    posts.len()
                );
                return Ok(assemble(posts, radius_miles));
            };

            radius_miles = (radius_miles + step).min(MAX_RADIUS_MILES);
            attempt += 1;

            debug!(
                "Only {} posts found, expanding to {} miles (attempt {})",
                posts.len(),
                radius_miles,
                attempt
            );
        }
    }

    fn validate(&self, params: SearchParams) -> Result<(Uuid, Coordinates, f64), LocationError> {
        let user = params
            .user
            .filter(|user| !user.is_nil())
            .ok_or_else(|| LocationError::InvalidParameters("Missing user".into()))?;

        let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) else {
            return Err(LocationError::InvalidParameters(
                "Both lat and long are required".into(),
            ));
        };

        let center = Coordinates::new(latitude, longitude);
        if !center.is_valid() {
            return Err(LocationError::InvalidParameters(format!(
                "Coordinates out of range: lat {latitude}, long {longitude}"
            )));
        }

        let radius_miles = params
            .radius_miles
            .unwrap_or(self.policy.default_radius_miles);
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(LocationError::InvalidParameters(format!(
                "Radius must be a positive number of miles, got {radius_miles}"
            )));
        }

        Ok((user, center, radius_miles.min(MAX_RADIUS_MILES)))
    }
}
