use crate::geo::{Coordinates, GeoPoint};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A geotagged text post.
///
/// `latitude`/`longitude` are the source of truth; `location` is derived from
/// them whenever they are set, so it can never drift.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub owner: Uuid,
    pub content: String,
    latitude: f64,
    longitude: f64,
    location: GeoPoint,
    pub comment_count: u32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(owner: Uuid, content: String, coordinates: Coordinates) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            content,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            location: GeoPoint::from(coordinates),
            comment_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = coordinates.latitude;
        self.longitude = coordinates.longitude;
        self.location = GeoPoint::from(coordinates);
        self.updated_at = Utc::now();
    }
}
