//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! <repo>/config.toml
//!     → loader.rs (parse & deserialize, defaults when absent)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (validated)
//!     → command-line overrides (--api, --swarmlisten)
//!     → ServerConfig (immutable, handed to the lifecycle controller)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No hot reload: a running daemon keeps the config it started with

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{expand_repo_dir, load_config, load_repo_config, ConfigError};
pub use schema::{ApiConfig, DaemonConfig, ObservabilityConfig, SwarmConfig};
pub use validation::ValidationError;
