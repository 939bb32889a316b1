use serde::{Deserialize, Serialize};

pub const METERS_PER_MILE: f64 = 1609.34;

/// Spherical earth radius used by 2dsphere indexes.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Half the earth's circumference. Every point on the sphere lies within
/// this distance of any center, so larger radii are capped to it.
pub const MAX_RADIUS_MILES: f64 = std::f64::consts::PI * EARTH_RADIUS_METERS / METERS_PER_MILE;

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoJsonType {
    Point,
}

/// GeoJSON point. Coordinates are stored `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeoJsonType,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

impl From<Coordinates> for GeoPoint {
    fn from(c: Coordinates) -> Self {
        Self {
            kind: GeoJsonType::Point,
            coordinates: [c.longitude, c.latitude],
        }
    }
}

impl From<GeoPoint> for Coordinates {
    fn from(p: GeoPoint) -> Self {
        Coordinates::new(p.latitude(), p.longitude())
    }
}
