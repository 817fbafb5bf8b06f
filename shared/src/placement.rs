//! Node placement: maps play records onto the globe.
//!
//! The active layout is a Fibonacci sphere, which spaces any number of nodes
//! evenly and keeps the input order. The two older layouts (timeline and
//! genre bands) cluster nodes by metadata instead; they are kept behind
//! [`PlacementStrategy`] for comparison and are never the default.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use ts_rs::TS;

use crate::config::GlobeConfig;
use crate::genre::GenreFamily;
use crate::record::{unit_to_spherical, wrap_longitude, PlacedNode, PlayRecord};
use crate::vec3::Vec3;

/// Golden ratio (1 + sqrt(5)) / 2. Pre-computed since sqrt is not const fn.
pub const GOLDEN_RATIO: f64 = 1.618033988749895;

/// Latitude range used by the timeline layouts, keeping nodes off the poles.
const TIMELINE_MAX_LATITUDE: f64 = 70.0;

/// Longitude jitter (degrees, +/-) so same-artist tracks don't stack.
const ARTIST_JITTER: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Even golden-angle spiral, input order preserved.
    #[default]
    Fibonacci,
    /// Newest-first latitude, artist-hash longitude.
    Timeline,
    /// Newest-first latitude, genre-family longitude bands.
    GenreBands,
}

/// Place `records` using the strategy selected in `config`.
pub fn place(records: &[PlayRecord], config: &GlobeConfig) -> Vec<PlacedNode> {
    match config.strategy {
        PlacementStrategy::Fibonacci => place_nodes(records, config),
        PlacementStrategy::Timeline => place_timeline(records, config),
        PlacementStrategy::GenreBands => place_genre_bands(records, config),
    }
}

/// Point `i` of an `n`-point Fibonacci spiral on the unit sphere, running from
/// the north pole (i = 0) to the south pole (i = n - 1). Requires `n > 1`.
pub fn fibonacci_point(i: usize, n: usize) -> Vec3 {
    debug_assert!(n > 1 && i < n);
    let y = 1.0 - (i as f64 / (n - 1) as f64) * 2.0;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let theta = TAU * i as f64 / GOLDEN_RATIO;

    Vec3::new(theta.cos() * r, y, theta.sin() * r)
}

/// Fibonacci-sphere placement. One node per record, same order, no dedup.
///
/// An empty input yields no nodes; a single record sits at the configured
/// default position since the spiral needs at least two points.
pub fn place_nodes(records: &[PlayRecord], config: &GlobeConfig) -> Vec<PlacedNode> {
    let n = records.len();
    if n == 1 {
        return vec![PlacedNode::new(
            node_id(0, &records[0]),
            records[0].clone(),
            config.single_latitude,
            config.single_longitude,
            config.node_radius,
        )];
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (latitude, longitude) = unit_to_spherical(fibonacci_point(i, n));
            PlacedNode::new(
                node_id(i, record),
                record.clone(),
                latitude,
                longitude,
                config.node_radius,
            )
        })
        .collect()
}

/// Timeline placement: newest play at the top, oldest at the bottom, each
/// artist anchored to a stable longitude with seeded jitter.
pub fn place_timeline(records: &[PlayRecord], config: &GlobeConfig) -> Vec<PlacedNode> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.jitter_seed);
    let ordered = newest_first(records);
    let n = ordered.len();

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let jitter = rng.gen_range(-ARTIST_JITTER..=ARTIST_JITTER);
            let longitude = wrap_longitude(artist_longitude(&record.artist_name) + jitter);
            PlacedNode::new(
                node_id(i, record),
                record.clone(),
                timeline_latitude(i, n),
                longitude,
                config.node_radius,
            )
        })
        .collect()
}

/// Genre-band placement: timeline latitude, longitude inside the 60-degree
/// band of the record's genre family (anywhere when untagged).
pub fn place_genre_bands(records: &[PlayRecord], config: &GlobeConfig) -> Vec<PlacedNode> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.jitter_seed);
    let ordered = newest_first(records);
    let n = ordered.len();

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let (start, end) = GenreFamily::primary(&record.genre_tags)
                .map(GenreFamily::longitude_band)
                .unwrap_or((-180.0, 180.0));
            let longitude = rng.gen_range(start..end);
            PlacedNode::new(
                node_id(i, record),
                record.clone(),
                timeline_latitude(i, n),
                longitude,
                config.node_radius,
            )
        })
        .collect()
}

/// Node ids are positional so that duplicate tracks stay distinguishable
/// and placement stays deterministic.
fn node_id(index: usize, record: &PlayRecord) -> String {
    format!("{}-{}", index, record.track_id)
}

/// Stable sort, most recent play first.
fn newest_first(records: &[PlayRecord]) -> Vec<&PlayRecord> {
    let mut ordered: Vec<&PlayRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.played_at.cmp(&a.played_at));
    ordered
}

/// Linear from +70 (index 0) to -70 (last index).
fn timeline_latitude(index: usize, count: usize) -> f64 {
    let progress = index as f64 / count.saturating_sub(1).max(1) as f64;
    TIMELINE_MAX_LATITUDE - progress * 2.0 * TIMELINE_MAX_LATITUDE
}

/// Anchor longitude in [-180, 180) derived from a 64-bit FNV-1a hash of the
/// artist name, so it is identical across runs and platforms.
pub fn artist_longitude(artist: &str) -> f64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let hash = artist
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    (hash % 360) as f64 - 180.0
}
