use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GlobeConfig;
use crate::record::PlacedNode;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "snapshot")]
    Snapshot(GlobeSnapshotMsg),
    #[serde(rename = "selection")]
    Selection(SelectionMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub snapshot: GlobeSnapshotMsg,
    pub selected_node_id: Option<String>,
}

/// Every node currently on the globe. `revision` increases on each history
/// change so clients can drop stale snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GlobeSnapshotMsg {
    #[ts(type = "number")]
    pub revision: u64,
    pub config: GlobeConfig,
    pub nodes: Vec<NodeWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SelectionMsg {
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct NodeWire {
    pub id: String,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_id: String,
    pub album_name: String,
    pub cover_art_url: Option<String>,
    pub genre_tags: Vec<String>,
    /// RFC 3339
    pub played_at: String,
    pub duration_ms: u32,
    pub duration_label: String,
    pub popularity: u8,
    pub uri: String,
    pub preview_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub position: [f64; 3],
    pub size: f64,
    pub color: u32,
}

impl NodeWire {
    pub fn from_node(node: &PlacedNode) -> Self {
        let record = node.record();
        let p = node.position();
        Self {
            id: node.id().to_string(),
            track_id: record.track_id.clone(),
            track_name: record.track_name.clone(),
            artist_name: record.artist_name.clone(),
            album_id: record.album_id.clone(),
            album_name: record.album_name.clone(),
            cover_art_url: record.cover_art_url.clone(),
            genre_tags: record.genre_tags.clone(),
            played_at: record.played_at.to_rfc3339(),
            duration_ms: record.duration_ms,
            duration_label: node.duration_label(),
            popularity: record.popularity,
            uri: record.uri.clone(),
            preview_url: record.preview_url.clone(),
            latitude: round4(node.latitude()),
            longitude: round4(node.longitude()),
            radius: node.radius(),
            position: [round4(p.x), round4(p.y), round4(p.z)],
            size: round4(node.node_size()),
            color: node.glow_color(),
        }
    }
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Tap converted by the client into a ray in globe space.
    #[serde(rename = "pick")]
    Pick { origin: [f64; 3], direction: [f64; 3] },
    /// Tap given as a direction from the globe centre. Picks the nearest
    /// node within `maxAngle` radians.
    #[serde(rename = "pick_direction")]
    PickDirection {
        direction: [f64; 3],
        #[serde(rename = "maxAngle", default = "default_pick_angle")]
        max_angle: f64,
    },
    #[serde(rename = "select")]
    Select {
        #[serde(rename = "nodeId")]
        node_id: String,
    },
    #[serde(rename = "clear_selection")]
    ClearSelection,
}

/// Angular tolerance for direction picks when the client sends none.
pub const DEFAULT_PICK_ANGLE: f64 = 0.15;

fn default_pick_angle() -> f64 {
    DEFAULT_PICK_ANGLE
}

/// Body of `POST /api/pick`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PickRequest {
    pub origin: [f64; 3],
    pub direction: [f64; 3],
}

// === Conversion helpers ===

/// Round to 4 decimal places (plenty for positions on a ~5 unit globe,
/// roughly halves JSON size)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}
