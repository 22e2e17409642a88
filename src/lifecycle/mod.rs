//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     node.start() → bind API server → serve → write discovery file
//!
//! Shutdown (controller.rs):
//!     Interrupt or server failure → remove discovery file
//!         → drain API server (bounded) → node.stop()
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → single-slot interrupt notification
//!
//! Discovery (endpoint.rs):
//!     <repo>/api holds the bound API address while the server is up
//! ```
//!
//! # Design Decisions
//! - Ordered startup: node first, then API server, then discovery file
//! - Ordered shutdown: discovery file, API server, node
//! - Shutdown has timeout: the drain is abandoned after the deadline

pub mod controller;
pub mod endpoint;
pub mod signals;
pub mod state;

pub use controller::{Controller, RunError, RunSummary, WakeReason, DEFAULT_SHUTDOWN_TIMEOUT};
pub use endpoint::{read_endpoint, EndpointRecorder, PersistError, API_FILE};
pub use signals::{Interrupter, SignalWatcher};
pub use state::LifecycleState;
