//! Globe core shared by the server and rendering clients.
//!
//! Pure and synchronous: play-record types, the node placement engine,
//! hit-testing, and the wire protocol.

pub mod config;
pub mod genre;
pub mod picking;
pub mod placement;
pub mod protocol;
pub mod record;
pub mod spotify;
pub mod vec3;

pub use config::GlobeConfig;
pub use placement::{place, place_nodes, PlacementStrategy};
pub use record::{PlacedNode, PlayRecord};
