//! Control API server setup and lifecycle.
//!
//! # Responsibilities
//! - Mount the administrative handler under the configured path prefix
//! - Wire up middleware (cross-origin policy, tracing, request ID)
//! - Bind the listener synchronously so bind failures reach the caller
//! - Serve in a background task until asked to stop
//! - Stop gracefully within a caller-supplied deadline

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::http::cors::{cors_layer, CorsError};

/// Immutable configuration of the administrative API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind, `host:port`. A bare `:port` binds every interface.
    pub address: String,
    /// URL prefix the handler is mounted under.
    pub path_prefix: String,
    /// Origins allowed to issue cross-origin requests.
    pub allowed_origins: Vec<String>,
    /// Methods allowed for cross-origin requests.
    pub allowed_methods: Vec<String>,
    /// Whether cross-origin requests may carry credentials.
    pub allow_credentials: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ApiConfig::default().server_config()
    }
}

/// The listener could not be bound.
#[derive(Debug, thiserror::Error)]
#[error("failed to bind API server to {address}: {source}")]
pub struct BindError {
    pub address: String,
    #[source]
    pub source: io::Error,
}

/// The configuration cannot be turned into a router.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerConfigError {
    #[error("invalid path prefix {0:?}: must start with '/' and contain no '{{' or '}}'")]
    PathPrefix(String),
    #[error(transparent)]
    Cors(#[from] CorsError),
}

/// The server stopped without being asked to.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("API server failed: {0}")]
    Io(#[from] io::Error),
    #[error("API server exited unexpectedly")]
    Exited,
    #[error("API server task aborted: {0}")]
    Task(String),
}

/// How a graceful stop ended.
#[derive(Debug)]
pub enum ShutdownOutcome {
    /// All in-flight requests drained before the deadline.
    Clean,
    /// The deadline elapsed first; the accept loop was aborted.
    DeadlineExpired,
    /// The server had already terminated on its own.
    AlreadyStopped,
    /// The server reported an error while draining.
    Failed(ServerError),
}

impl ShutdownOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, ShutdownOutcome::Clean | ShutdownOutcome::AlreadyStopped)
    }
}

/// Administrative API server, not yet bound.
pub struct ControlApiServer {
    address: String,
    app: Router,
}

impl ControlApiServer {
    /// Create a server hosting `handler` with the policy from `config`.
    pub fn new(config: &ServerConfig, handler: Router) -> Result<Self, ServerConfigError> {
        if !is_valid_path_prefix(&config.path_prefix) {
            return Err(ServerConfigError::PathPrefix(config.path_prefix.clone()));
        }
        let cors = cors_layer(config)?;
        let app = mount(handler, &config.path_prefix)
            .layer(cors)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Ok(Self {
            address: normalize_address(&config.address),
            app,
        })
    }

    /// Bind the listener. Nothing runs in the background until [`BoundServer::serve`].
    pub async fn bind(self) -> Result<BoundServer, BindError> {
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|source| BindError {
                address: self.address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| BindError {
            address: self.address.clone(),
            source,
        })?;

        tracing::info!(address = %local_addr, "API server bound");

        Ok(BoundServer {
            listener,
            app: self.app,
            local_addr,
        })
    }
}

/// A server whose listener is bound but not yet accepting.
pub struct BoundServer {
    listener: TcpListener,
    app: Router,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// Start accepting connections in a background task.
    pub fn serve(self) -> RunningServer {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let local_addr = self.local_addr;

        let task = tokio::spawn(async move {
            axum::serve(self.listener, self.app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                    tracing::debug!("API server draining");
                })
                .await?;
            tracing::info!("API server stopped");
            Ok::<(), ServerError>(())
        });

        RunningServer {
            local_addr,
            stop_tx: Some(stop_tx),
            task,
            exited: false,
        }
    }
}

/// Handle to the background accept loop.
pub struct RunningServer {
    local_addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
    exited: bool,
}

impl RunningServer {
    /// Wrap an arbitrary accept-loop task, e.g. one that fails on its own.
    #[cfg(test)]
    pub(crate) fn from_task(
        local_addr: SocketAddr,
        task: JoinHandle<Result<(), ServerError>>,
    ) -> Self {
        Self {
            local_addr,
            stop_tx: None,
            task,
            exited: false,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolve once the server stops on its own accord.
    ///
    /// Cancel safe, so it can sit in a `select!` next to other wake-ups.
    /// Never resolves a second time.
    pub async fn terminated(&mut self) -> ServerError {
        if self.exited {
            return std::future::pending().await;
        }
        let result = (&mut self.task).await;
        self.exited = true;
        match result {
            Ok(Ok(())) => ServerError::Exited,
            Ok(Err(e)) => e,
            Err(join) => ServerError::Task(join.to_string()),
        }
    }

    /// Stop accepting, then wait up to `deadline` for in-flight requests.
    pub async fn shutdown(mut self, deadline: Duration) -> ShutdownOutcome {
        if self.exited {
            return ShutdownOutcome::AlreadyStopped;
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match tokio::time::timeout(deadline, &mut self.task).await {
            Ok(Ok(Ok(()))) => ShutdownOutcome::Clean,
            Ok(Ok(Err(e))) => ShutdownOutcome::Failed(e),
            Ok(Err(join)) => ShutdownOutcome::Failed(ServerError::Task(join.to_string())),
            Err(_) => {
                self.task.abort();
                ShutdownOutcome::DeadlineExpired
            }
        }
    }
}

/// A prefix is mountable when it is absolute and holds no route captures.
pub fn is_valid_path_prefix(prefix: &str) -> bool {
    prefix.starts_with('/') && !prefix.contains(['{', '}'])
}

fn mount(handler: Router, prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        handler
    } else {
        Router::new().nest(prefix, handler)
    }
}

fn normalize_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}
