use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use globe_shared::protocol::{GlobeSnapshotMsg, NodeWire, PickRequest, SelectionMsg};
use globe_shared::vec3::Vec3;
use globe_shared::place;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::globe_loop::{request, GlobeCommand};
use crate::history::{parse_history, parse_records, HistoryError};
use crate::ws::{is_valid_ray, ws_handler, AppState};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("node {0} not found")]
    NodeNotFound(String),
    #[error("pick ray must have a finite origin and a non-zero direction")]
    InvalidRay,
    #[error("globe loop is not running")]
    Unavailable,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::History(HistoryError::Empty) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::History(_) | ApiError::InvalidRay => StatusCode::BAD_REQUEST,
            ApiError::NodeNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// All HTTP and WebSocket routes.
pub fn build_router(app_state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/nodes", get(get_nodes))
        .route("/api/nodes/{id}", get(get_node))
        .route("/api/history", put(replace_history).post(append_history))
        .route("/api/place", post(place_records))
        .route("/api/pick", post(pick))
        .route("/ws", get(ws_handler))
        .layer(cors_layer(allowed_origins))
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_nodes(State(app_state): State<AppState>) -> Result<Json<GlobeSnapshotMsg>, ApiError> {
    request(&app_state.globe_tx, |response| GlobeCommand::Snapshot {
        response,
    })
    .await
    .map(Json)
    .ok_or(ApiError::Unavailable)
}

async fn get_node(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NodeWire>, ApiError> {
    let node = request(&app_state.globe_tx, |response| GlobeCommand::GetNode {
        id: id.clone(),
        response,
    })
    .await
    .ok_or(ApiError::Unavailable)?;
    node.map(Json).ok_or(ApiError::NodeNotFound(id))
}

async fn replace_history(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<GlobeSnapshotMsg>, ApiError> {
    let records = parse_history(&body)?;
    request(&app_state.globe_tx, |response| GlobeCommand::ReplaceHistory {
        records,
        response,
    })
    .await
    .map(Json)
    .ok_or(ApiError::Unavailable)
}

async fn append_history(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<GlobeSnapshotMsg>, ApiError> {
    let records = parse_history(&body)?;
    request(&app_state.globe_tx, |response| GlobeCommand::AppendHistory {
        records,
        response,
    })
    .await
    .map(Json)
    .ok_or(ApiError::Unavailable)
}

/// Stateless placement with the server's layout. Empty input places nothing.
async fn place_records(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<NodeWire>>, ApiError> {
    let records = parse_records(&body)?;
    let nodes = place(&records, &app_state.globe_config);
    Ok(Json(nodes.iter().map(NodeWire::from_node).collect()))
}

async fn pick(
    State(app_state): State<AppState>,
    Json(req): Json<PickRequest>,
) -> Result<Json<SelectionMsg>, ApiError> {
    let origin = Vec3::from_array(req.origin);
    let direction = Vec3::from_array(req.direction);
    if !is_valid_ray(origin, direction) {
        return Err(ApiError::InvalidRay);
    }

    let node_id = request(&app_state.globe_tx, |response| GlobeCommand::Pick {
        origin,
        direction,
        response: Some(response),
    })
    .await
    .ok_or(ApiError::Unavailable)?;
    Ok(Json(SelectionMsg { node_id }))
}
