use globe_shared::protocol::{
    GlobeSnapshotMsg, NodeWire, SelectionMsg, WelcomeMsg, PROTOCOL_VERSION,
};
use globe_shared::vec3::Vec3;
use globe_shared::PlayRecord;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::state::GlobeState;

/// Commands from HTTP handlers and WebSocket connections to the globe loop
pub enum GlobeCommand {
    Welcome {
        response: oneshot::Sender<WelcomeMsg>,
    },
    Snapshot {
        response: oneshot::Sender<GlobeSnapshotMsg>,
    },
    ReplaceHistory {
        records: Vec<PlayRecord>,
        response: oneshot::Sender<GlobeSnapshotMsg>,
    },
    AppendHistory {
        records: Vec<PlayRecord>,
        response: oneshot::Sender<GlobeSnapshotMsg>,
    },
    GetNode {
        id: String,
        response: oneshot::Sender<Option<NodeWire>>,
    },
    Pick {
        origin: Vec3,
        direction: Vec3,
        response: Option<oneshot::Sender<Option<String>>>,
    },
    PickDirection {
        direction: Vec3,
        max_angle: f64,
        response: Option<oneshot::Sender<Option<String>>>,
    },
    Select {
        id: String,
        response: Option<oneshot::Sender<bool>>,
    },
    ClearSelection,
}

/// Broadcasts from the globe loop to all connected clients
#[derive(Debug, Clone)]
pub enum GlobeBroadcast {
    Snapshot(GlobeSnapshotMsg),
    Selection(SelectionMsg),
}

/// Send a command and wait for its reply. `None` if the loop has stopped.
pub async fn request<T>(
    globe_tx: &mpsc::Sender<GlobeCommand>,
    make: impl FnOnce(oneshot::Sender<T>) -> GlobeCommand,
) -> Option<T> {
    let (resp_tx, resp_rx) = oneshot::channel();
    globe_tx.send(make(resp_tx)).await.ok()?;
    resp_rx.await.ok()
}

/// Run the globe loop. Owns all globe state.
pub async fn run_globe_loop(
    mut cmd_rx: mpsc::Receiver<GlobeCommand>,
    broadcast_tx: broadcast::Sender<GlobeBroadcast>,
    mut state: GlobeState,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let selected_before = state.selected().map(str::to_owned);

        match cmd {
            GlobeCommand::Welcome { response } => {
                let _ = response.send(WelcomeMsg {
                    protocol_version: PROTOCOL_VERSION,
                    server_version: env!("CARGO_PKG_VERSION").to_string(),
                    snapshot: state.snapshot(),
                    selected_node_id: state.selected().map(str::to_owned),
                });
            }
            GlobeCommand::Snapshot { response } => {
                let _ = response.send(state.snapshot());
            }
            GlobeCommand::ReplaceHistory { records, response } => {
                let incoming = records.len();
                state.replace_history(records);
                tracing::info!(
                    "History replaced: {} records in, {} nodes placed (revision {})",
                    incoming,
                    state.nodes().len(),
                    state.revision()
                );
                let snapshot = state.snapshot();
                let _ = broadcast_tx.send(GlobeBroadcast::Snapshot(snapshot.clone()));
                let _ = response.send(snapshot);
            }
            GlobeCommand::AppendHistory { records, response } => {
                let incoming = records.len();
                let snapshot = if state.append_history(records) {
                    tracing::info!(
                        "History appended: {} records in, {} nodes placed (revision {})",
                        incoming,
                        state.nodes().len(),
                        state.revision()
                    );
                    let snapshot = state.snapshot();
                    let _ = broadcast_tx.send(GlobeBroadcast::Snapshot(snapshot.clone()));
                    snapshot
                } else {
                    state.snapshot()
                };
                let _ = response.send(snapshot);
            }
            GlobeCommand::GetNode { id, response } => {
                let _ = response.send(state.node(&id).map(NodeWire::from_node));
            }
            GlobeCommand::Pick {
                origin,
                direction,
                response,
            } => {
                let picked = state.pick_ray(origin, direction);
                if let Some(response) = response {
                    let _ = response.send(picked);
                }
            }
            GlobeCommand::PickDirection {
                direction,
                max_angle,
                response,
            } => {
                let picked = state.pick_direction(direction, max_angle);
                if let Some(response) = response {
                    let _ = response.send(picked);
                }
            }
            GlobeCommand::Select { id, response } => {
                let found = state.select(&id);
                if !found {
                    tracing::debug!("Select ignored, unknown node {}", id);
                }
                if let Some(response) = response {
                    let _ = response.send(found);
                }
            }
            GlobeCommand::ClearSelection => state.clear_selection(),
        }

        if state.selected() != selected_before.as_deref() {
            let _ = broadcast_tx.send(GlobeBroadcast::Selection(SelectionMsg {
                node_id: state.selected().map(str::to_owned),
            }));
        }
    }

    tracing::info!("Globe loop ended");
}
