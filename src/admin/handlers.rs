use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;

#[derive(Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct IdInfo {
    pub peer_id: String,
    pub addresses: Vec<String>,
}

#[derive(Serialize)]
pub struct DaemonStatus {
    pub status: &'static str,
    pub offline: bool,
}

pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_id(State(state): State<AdminState>) -> Json<IdInfo> {
    Json(IdInfo {
        peer_id: state.node.peer_id.clone(),
        addresses: state.node.swarm_addresses.clone(),
    })
}

pub async fn get_status(State(state): State<AdminState>) -> (StatusCode, Json<DaemonStatus>) {
    let running = state.node.is_running();
    let code = if running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(DaemonStatus {
            status: if running { "running" } else { "stopped" },
            offline: state.node.offline,
        }),
    )
}
