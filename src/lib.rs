//! Process-lifecycle controller for a peer-to-peer node daemon.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod node;
pub mod observability;

pub use config::DaemonConfig;
pub use http::{ControlApiServer, ServerConfig};
pub use lifecycle::{Controller, RunError, SignalWatcher};
pub use node::NodeHandle;
