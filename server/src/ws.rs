use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{Sink, SinkExt, StreamExt};
use globe_shared::protocol::{ClientMsg, ServerMsg};
use globe_shared::vec3::{try_normalize, Vec3};
use globe_shared::GlobeConfig;
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore};

use crate::globe_loop::{request, GlobeBroadcast, GlobeCommand};

/// Shared app state passed to every HTTP and WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub globe_tx: mpsc::Sender<GlobeCommand>,
    pub broadcast_tx: broadcast::Sender<GlobeBroadcast>,
    /// Layout used by the stateless `/api/place` endpoint
    pub globe_config: GlobeConfig,
    pub connection_semaphore: Arc<Semaphore>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!("Rejecting WebSocket connection, limit reached");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, permit))
}

async fn handle_socket(socket: WebSocket, app_state: AppState, _permit: OwnedSemaphorePermit) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe first so nothing between the welcome snapshot and the first
    // broadcast is missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let Some(welcome) = request(&app_state.globe_tx, |response| GlobeCommand::Welcome {
        response,
    })
    .await
    else {
        tracing::error!("Failed to receive welcome from globe loop");
        return;
    };

    let revision = welcome.snapshot.revision;
    if !send_msg(&mut sink, &ServerMsg::Welcome(welcome)).await {
        return;
    }
    tracing::info!("Client connected (revision {})", revision);

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => {
                                let Some(cmd) = command_for(client_msg) else {
                                    tracing::debug!("Ignoring pick with an invalid ray");
                                    continue;
                                };
                                if app_state.globe_tx.send(cmd).await.is_err() {
                                    tracing::error!("Globe loop is gone, closing connection");
                                    break;
                                }
                            }
                            Err(e) => tracing::debug!("Ignoring malformed client message: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket receive error: {}", e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let msg = match broadcast {
                            GlobeBroadcast::Snapshot(s) => ServerMsg::Snapshot(s),
                            GlobeBroadcast::Selection(s) => ServerMsg::Selection(s),
                        };
                        if !send_msg(&mut sink, &msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Client lagged by {} messages", n);
                        // Snapshots are complete, the next one catches the client up
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!("Client disconnected");
}

/// Map a client message to a globe command. Picks with a non-finite origin,
/// a zero direction or a bad angle yield `None` and leave the selection alone.
fn command_for(msg: ClientMsg) -> Option<GlobeCommand> {
    let cmd = match msg {
        ClientMsg::Pick { origin, direction } => {
            let origin = Vec3::from_array(origin);
            let direction = Vec3::from_array(direction);
            if !is_valid_ray(origin, direction) {
                return None;
            }
            GlobeCommand::Pick {
                origin,
                direction,
                response: None,
            }
        }
        ClientMsg::PickDirection {
            direction,
            max_angle,
        } => {
            let direction = Vec3::from_array(direction);
            if !is_valid_ray(Vec3::ZERO, direction) || !max_angle.is_finite() || max_angle < 0.0 {
                return None;
            }
            GlobeCommand::PickDirection {
                direction,
                max_angle,
                response: None,
            }
        }
        ClientMsg::Select { node_id } => GlobeCommand::Select {
            id: node_id,
            response: None,
        },
        ClientMsg::ClearSelection => GlobeCommand::ClearSelection,
    };
    Some(cmd)
}

/// Finite origin and a direction that can be normalized.
pub fn is_valid_ray(origin: Vec3, direction: Vec3) -> bool {
    origin.is_finite() && try_normalize(direction).is_some()
}

/// Serialize and send. Returns false once the socket is unusable.
async fn send_msg<S>(sink: &mut S, msg: &ServerMsg) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            return true;
        }
    };
    sink.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_picks_are_dropped() {
        let zero_dir = ClientMsg::Pick {
            origin: [0.0, 15.0, 0.0],
            direction: [0.0, 0.0, 0.0],
        };
        assert!(command_for(zero_dir).is_none());

        let nan_origin = ClientMsg::Pick {
            origin: [f64::NAN, 0.0, 0.0],
            direction: [0.0, -1.0, 0.0],
        };
        assert!(command_for(nan_origin).is_none());

        let bad_angle = ClientMsg::PickDirection {
            direction: [0.0, 1.0, 0.0],
            max_angle: f64::INFINITY,
        };
        assert!(command_for(bad_angle).is_none());
    }

    #[test]
    fn valid_messages_map_to_commands() {
        let pick = ClientMsg::Pick {
            origin: [0.0, 15.0, 0.0],
            direction: [0.0, -1.0, 0.0],
        };
        assert!(matches!(command_for(pick), Some(GlobeCommand::Pick { .. })));

        let pick_dir = ClientMsg::PickDirection {
            direction: [0.0, 1.0, 0.0],
            max_angle: 0.2,
        };
        assert!(matches!(
            command_for(pick_dir),
            Some(GlobeCommand::PickDirection { .. })
        ));

        assert!(matches!(
            command_for(ClientMsg::ClearSelection),
            Some(GlobeCommand::ClearSelection)
        ));
    }
}
