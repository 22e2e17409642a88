//! Administrative HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → cors.rs (allow-lists → CorsLayer)
//!     → server.rs (mount handler under prefix, bind, serve in background)
//!     → RunningServer (terminated() / shutdown(deadline))
//! ```

pub mod cors;
pub mod server;

pub use cors::CorsError;
pub use server::{
    is_valid_path_prefix, BindError, BoundServer, ControlApiServer, RunningServer, ServerConfig,
    ServerConfigError, ServerError, ShutdownOutcome,
};
