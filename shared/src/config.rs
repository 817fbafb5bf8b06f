use crate::placement::PlacementStrategy;
use crate::record::DEFAULT_NODE_RADIUS;

/// Globe layout configuration, shared with rendering clients.
///
/// Serialized camelCase for the wire. Config files may also use the
/// snake_case field names.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase", default)]
pub struct GlobeConfig {
    /// Distance of every node from the globe center
    #[serde(alias = "node_radius")]
    pub node_radius: f64,
    /// Position of the node when only one record is placed (degrees)
    #[serde(alias = "single_latitude")]
    pub single_latitude: f64,
    #[serde(alias = "single_longitude")]
    pub single_longitude: f64,
    pub strategy: PlacementStrategy,
    /// Seed for the jitter of the timeline and genre-band layouts
    #[ts(type = "number")]
    #[serde(alias = "jitter_seed")]
    pub jitter_seed: u64,
    /// Upper bound on nodes kept from one history refresh
    #[ts(type = "number")]
    #[serde(alias = "max_nodes")]
    pub max_nodes: usize,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            node_radius: DEFAULT_NODE_RADIUS,
            single_latitude: 0.0,
            single_longitude: 0.0,
            strategy: PlacementStrategy::Fibonacci,
            jitter_seed: 42,
            max_nodes: 100,
        }
    }
}

impl GlobeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.node_radius.is_finite() || self.node_radius <= 0.0 {
            return Err("node_radius must be finite and > 0".to_string());
        }
        if !(-90.0..=90.0).contains(&self.single_latitude) {
            return Err("single_latitude must be within [-90, 90]".to_string());
        }
        if !(-180.0..=180.0).contains(&self.single_longitude) {
            return Err("single_longitude must be within [-180, 180]".to_string());
        }
        if self.max_nodes == 0 {
            return Err("max_nodes must be >= 1".to_string());
        }
        Ok(())
    }
}
