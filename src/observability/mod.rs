//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (node start/stop, bound address, shutdown)
//!     → TraceLayer spans for API requests, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//! ```

pub mod logging;

pub use logging::init_logging;
