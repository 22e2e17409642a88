//! Shared utilities for lifecycle integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::sync::Notify;

use node_daemon::lifecycle::{LifecycleState, RunError, RunSummary};
use node_daemon::node::{NodeError, NodeHandle};
use node_daemon::{Controller, ServerConfig};

/// Ordered record of the calls a [`MockNode`] received.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }
}

/// Node double that records start/stop and, on stop, whether the
/// discovery file was still present.
pub struct MockNode {
    pub log: CallLog,
    pub fail_start: bool,
    pub api_file: Option<PathBuf>,
}

impl MockNode {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_start: false,
            api_file: None,
        }
    }
}

impl NodeHandle for MockNode {
    fn start(&mut self) -> Result<(), NodeError> {
        self.log.push("start");
        if self.fail_start {
            return Err(NodeError::Other("storage unavailable".into()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        match &self.api_file {
            Some(path) if path.exists() => self.log.push("stop:api-file-present"),
            _ => self.log.push("stop"),
        }
    }
}

pub fn ephemeral_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1:0".into(),
        ..ServerConfig::default()
    }
}

/// Router with `/ping` and a `/slow` route that signals `entered` and then
/// sleeps for `delay`.
pub fn test_router(entered: Arc<Notify>, delay: Duration) -> Router {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route(
            "/slow",
            get(move || {
                let entered = entered.clone();
                async move {
                    entered.notify_one();
                    tokio::time::sleep(delay).await;
                    "done"
                }
            }),
        )
}

pub type RunHandle = tokio::task::JoinHandle<Result<RunSummary, RunError>>;

/// Spawn `controller.run()` and wait until it reaches `Running`.
pub async fn spawn_running(controller: Controller<MockNode>) -> RunHandle {
    let mut state = controller.state_watch();
    let handle = tokio::spawn(controller.run());
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s >= LifecycleState::Running),
    )
    .await
    .expect("controller reached running")
    .expect("state channel open");
    handle
}
