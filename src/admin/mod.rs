//! Default administrative request handler.
//!
//! Routes are relative; the control API server mounts them under the
//! configured path prefix (e.g. `/api/version`).

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::node::NodeInfo;

#[derive(Clone)]
pub struct AdminState {
    pub node: Arc<NodeInfo>,
}

pub fn setup_admin_router(node: NodeInfo) -> Router {
    let state = AdminState {
        node: Arc::new(node),
    };
    Router::new()
        .route("/version", get(get_version))
        .route("/id", get(get_id))
        .route("/daemon/status", get(get_status))
        .with_state(state)
}
