use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::genre::{GenreFamily, DEFAULT_GLOW_COLOR};
use crate::vec3::Vec3;

/// Distance of every node from the globe center.
pub const DEFAULT_NODE_RADIUS: f64 = 5.2;

/// One played track, as supplied by the history fetch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_id: String,
    pub album_name: String,
    #[serde(default)]
    pub cover_art_url: Option<String>,
    #[serde(default)]
    pub genre_tags: Vec<String>,
    #[ts(type = "string")]
    pub played_at: DateTime<Utc>,
    pub duration_ms: u32,
    /// 0-100
    #[serde(default)]
    pub popularity: u8,
    pub uri: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

/// A play record with a position on the globe.
///
/// Coordinates are private so `position` can never disagree with
/// (`latitude`, `longitude`, `radius`).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    id: String,
    record: PlayRecord,
    latitude: f64,
    longitude: f64,
    radius: f64,
    position: Vec3,
}

impl PlacedNode {
    /// Latitude is clamped to [-90, 90] and longitude wrapped into [-180, 180].
    pub fn new(id: String, record: PlayRecord, latitude: f64, longitude: f64, radius: f64) -> Self {
        let latitude = latitude.clamp(-90.0, 90.0);
        let longitude = wrap_longitude(longitude);
        Self {
            id,
            record,
            latitude,
            longitude,
            radius,
            position: spherical_to_cartesian(latitude, longitude, radius),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> &PlayRecord {
        &self.record
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the node and recompute its Cartesian position.
    pub fn set_coordinates(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude.clamp(-90.0, 90.0);
        self.longitude = wrap_longitude(longitude);
        self.position = spherical_to_cartesian(self.latitude, self.longitude, self.radius);
    }

    /// Card size, scaled by popularity from 0.5x to 1.0x of the base size.
    pub fn node_size(&self) -> f64 {
        const BASE_SIZE: f64 = 0.7;
        let popularity = f64::from(self.record.popularity.min(100));
        BASE_SIZE * (0.5 + popularity / 200.0)
    }

    /// Glow color (0xRRGGBB) picked from the primary genre tag.
    pub fn glow_color(&self) -> u32 {
        GenreFamily::primary_glow(&self.record.genre_tags)
            .map(GenreFamily::glow_color)
            .unwrap_or(DEFAULT_GLOW_COLOR)
    }

    /// Track length as `m:ss`.
    pub fn duration_label(&self) -> String {
        let minutes = self.record.duration_ms / 60_000;
        let seconds = (self.record.duration_ms % 60_000) / 1000;
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Convert geographic degrees to a point in globe space (+Y is north).
pub fn spherical_to_cartesian(latitude: f64, longitude: f64, radius: f64) -> Vec3 {
    let lat_rad = latitude.to_radians();
    let lon_rad = longitude.to_radians();

    Vec3::new(
        radius * lat_rad.cos() * lon_rad.cos(),
        radius * lat_rad.sin(),
        radius * lat_rad.cos() * lon_rad.sin(),
    )
}

/// Inverse of [`spherical_to_cartesian`] for a unit-sphere point.
/// Returns (latitude, longitude) in degrees.
pub fn unit_to_spherical(p: Vec3) -> (f64, f64) {
    let latitude = p.y.clamp(-1.0, 1.0).asin().to_degrees();
    let longitude = p.z.atan2(p.x).to_degrees();
    (latitude, longitude)
}

/// Bring any finite longitude into [-180, 180]. In-range values are untouched.
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}
