//! Lifecycle controller: ordered startup, signal-driven teardown.
//!
//! ```text
//! node.start() → bind API server → serve (background) → write <repo>/api
//!     → wait for {interrupt, server failure}
//!     → remove <repo>/api → server.shutdown(timeout) → node.stop()
//! ```
//!
//! Startup failures propagate to the caller. Everything that goes wrong
//! after the wait point is absorbed and logged so the teardown always runs
//! to completion.
//!
//! A failed discovery-file write does not unwind the started node and
//! server by default: the API stays reachable even though discovery by file
//! is degraded. [`Controller::strict_persist`] turns it into a fatal error.

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;

use crate::http::{
    BindError, ControlApiServer, RunningServer, ServerConfig, ServerConfigError, ServerError,
    ShutdownOutcome,
};
use crate::lifecycle::endpoint::{EndpointRecorder, PersistError};
use crate::lifecycle::signals::SignalWatcher;
use crate::lifecycle::state::{LifecycleState, StateTracker};
use crate::node::{NodeError, NodeHandle};

/// Drain budget for in-flight API requests during shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A run that could not start, or a strict-mode persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid API server configuration: {0}")]
    Config(#[from] ServerConfigError),
    #[error(transparent)]
    Start(#[from] NodeError),
    #[error("could not register interrupt handler: {0}")]
    Signal(#[source] io::Error),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// What ended the running phase.
#[derive(Debug)]
pub enum WakeReason {
    Interrupt,
    ServerFailed(ServerError),
    /// Strict persistence only.
    PersistFailed,
}

/// Report of a run that reached the shutdown sequence.
#[derive(Debug)]
pub struct RunSummary {
    /// Address the API server was bound to.
    pub local_addr: SocketAddr,
    pub wake: WakeReason,
    pub shutdown: ShutdownOutcome,
    /// Discovery file write failure tolerated in non-strict mode.
    pub persist_error: Option<PersistError>,
}

/// Drives one daemon run. Consumed by [`Controller::run`].
pub struct Controller<N: NodeHandle> {
    node: N,
    server_config: ServerConfig,
    handler: Option<Router>,
    recorder: EndpointRecorder,
    signals: SignalWatcher,
    shutdown_timeout: Duration,
    strict_persist: bool,
    state: StateTracker,
}

impl<N: NodeHandle> Controller<N> {
    pub fn new(
        node: N,
        server_config: ServerConfig,
        handler: Router,
        repo_dir: &Path,
        signals: SignalWatcher,
    ) -> Self {
        Self {
            node,
            server_config,
            handler: Some(handler),
            recorder: EndpointRecorder::for_repo(repo_dir),
            signals,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            strict_persist: false,
            state: StateTracker::new(),
        }
    }

    /// Override the graceful-stop budget.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Treat a failed discovery-file write as fatal.
    pub fn strict_persist(mut self, strict: bool) -> Self {
        self.strict_persist = strict;
        self
    }

    pub fn state_watch(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run until interrupted, then tear everything down.
    pub async fn run(mut self) -> Result<RunSummary, RunError> {
        let result = self.execute().await;
        self.signals.deregister();
        self.state.advance(LifecycleState::Stopped);

        match &result {
            Ok(_) => tracing::info!("Shutdown complete"),
            Err(e) => tracing::error!(error = %e, "Daemon run failed"),
        }
        result
    }

    async fn execute(&mut self) -> Result<RunSummary, RunError> {
        let handler = self.handler.take().unwrap_or_default();
        let server = ControlApiServer::new(&self.server_config, handler)?;

        self.state.advance(LifecycleState::NodeStarting);
        self.node.start()?;

        self.state.advance(LifecycleState::ServerStarting);
        if let Err(e) = self.signals.register() {
            self.node.stop();
            return Err(RunError::Signal(e));
        }
        let bound = match server.bind().await {
            Ok(bound) => bound,
            Err(e) => {
                self.node.stop();
                return Err(e.into());
            }
        };
        self.supervise(bound.serve()).await
    }

    /// Publish the endpoint, wait for a wake-up, then tear down in order.
    async fn supervise(&mut self, mut running: RunningServer) -> Result<RunSummary, RunError> {
        let local_addr = running.local_addr();

        let persist_error = match self.recorder.write(local_addr) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not save API address to repo");
                Some(e)
            }
        };

        self.state.advance(LifecycleState::Running);

        let wake = if persist_error.is_some() && self.strict_persist {
            WakeReason::PersistFailed
        } else {
            tokio::select! {
                _ = self.signals.recv() => {
                    tracing::info!("Got interrupt, shutting down...");
                    WakeReason::Interrupt
                }
                err = running.terminated() => {
                    tracing::error!(error = %err, "API server failed, shutting down");
                    WakeReason::ServerFailed(err)
                }
            }
        };

        self.state.advance(LifecycleState::ShuttingDown);

        if let Err(e) = self.recorder.remove() {
            tracing::warn!(error = %e, "Failed to remove API address file");
        }

        let shutdown = running.shutdown(self.shutdown_timeout).await;
        match &shutdown {
            ShutdownOutcome::DeadlineExpired => tracing::warn!(
                timeout = ?self.shutdown_timeout,
                "Failed to shut down API server before the deadline"
            ),
            ShutdownOutcome::Failed(e) => {
                tracing::warn!(error = %e, "Failed to shut down API server")
            }
            ShutdownOutcome::Clean | ShutdownOutcome::AlreadyStopped => {}
        }

        self.node.stop();

        match persist_error {
            Some(e) if self.strict_persist => Err(e.into()),
            persist_error => Ok(RunSummary {
                local_addr,
                wake,
                shutdown,
                persist_error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use crate::lifecycle::endpoint::API_FILE;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<&'static str>>>);

    impl Recorded {
        fn entries(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FakeNode {
        calls: Recorded,
        fail: bool,
        api_file: Option<PathBuf>,
    }

    impl FakeNode {
        fn new(calls: &Recorded) -> Self {
            Self {
                calls: calls.clone(),
                fail: false,
                api_file: None,
            }
        }
    }

    impl NodeHandle for FakeNode {
        fn start(&mut self) -> Result<(), NodeError> {
            self.calls.0.lock().unwrap().push("start");
            if self.fail {
                Err(NodeError::Other("boom".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            let entry = match &self.api_file {
                Some(path) if path.exists() => "stop:api-file-present",
                _ => "stop",
            };
            self.calls.0.lock().unwrap().push(entry);
        }
    }

    fn server_config() -> ServerConfig {
        ServerConfig {
            address: "127.0.0.1:0".into(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn invalid_cors_fails_before_node_start() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Recorded::default();
        let config = ServerConfig {
            allowed_origins: vec!["*".into()],
            allow_credentials: true,
            ..server_config()
        };

        let controller = Controller::new(
            FakeNode::new(&calls),
            config,
            Router::new(),
            dir.path(),
            SignalWatcher::manual(),
        );
        let state = controller.state_watch();

        assert!(matches!(controller.run().await, Err(RunError::Config(_))));
        assert!(calls.entries().is_empty());
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn relative_path_prefix_fails_before_node_start() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Recorded::default();
        let config = ServerConfig {
            path_prefix: "api".into(),
            ..server_config()
        };
        let handler = Router::new().route("/x", axum::routing::get(|| async { "x" }));

        let controller = Controller::new(
            FakeNode::new(&calls),
            config,
            handler,
            dir.path(),
            SignalWatcher::manual(),
        );

        match controller.run().await {
            Err(RunError::Config(ServerConfigError::PathPrefix(prefix))) => {
                assert_eq!(prefix, "api")
            }
            other => panic!("expected path prefix error, got {:?}", other),
        }
        assert!(calls.entries().is_empty());
        assert!(!dir.path().join(API_FILE).exists());
    }

    #[tokio::test]
    async fn strict_persist_tears_down_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let calls = Recorded::default();

        let result = Controller::new(
            FakeNode::new(&calls),
            server_config(),
            Router::new(),
            &missing,
            SignalWatcher::manual(),
        )
        .strict_persist(true)
        .run()
        .await;

        assert!(matches!(result, Err(RunError::Persist(_))));
        assert_eq!(calls.entries(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn lenient_persist_keeps_running_until_interrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let calls = Recorded::default();
        let signals = SignalWatcher::manual();
        let interrupter = signals.interrupter();

        let controller = Controller::new(
            FakeNode::new(&calls),
            server_config(),
            Router::new(),
            &missing,
            signals,
        );
        let mut state = controller.state_watch();
        let run = tokio::spawn(controller.run());

        state
            .wait_for(|s| *s == LifecycleState::Running)
            .await
            .unwrap();
        interrupter.interrupt();

        let summary = run.await.unwrap().unwrap();
        assert!(summary.persist_error.is_some());
        assert!(matches!(summary.wake, WakeReason::Interrupt));
        assert_eq!(calls.entries(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn server_failure_tears_down_like_an_interrupt() {
        let dir = tempfile::tempdir().unwrap();
        let api_file = dir.path().join(API_FILE);
        let calls = Recorded::default();
        let mut node = FakeNode::new(&calls);
        node.api_file = Some(api_file.clone());

        let mut controller = Controller::new(
            node,
            server_config(),
            Router::new(),
            dir.path(),
            SignalWatcher::manual(),
        );
        let state = controller.state_watch();

        // The accept loop dies once the endpoint has been published.
        let published = api_file.clone();
        let task = tokio::spawn(async move {
            while !published.exists() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Err(ServerError::Io(io::Error::new(
                io::ErrorKind::Other,
                "listener closed",
            )))
        });
        let running = RunningServer::from_task("127.0.0.1:3453".parse().unwrap(), task);

        let summary = tokio::time::timeout(Duration::from_secs(5), controller.supervise(running))
            .await
            .expect("server failure must wake the controller")
            .unwrap();

        assert!(matches!(summary.wake, WakeReason::ServerFailed(ServerError::Io(_))));
        assert!(matches!(summary.shutdown, ShutdownOutcome::AlreadyStopped));
        assert!(!api_file.exists());
        assert_eq!(calls.entries(), vec!["stop"]);
        assert_eq!(*state.borrow(), LifecycleState::ShuttingDown);
    }
}
