//! Configuration loading from the node repository.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::DaemonConfig;
use crate::config::validation::{validate_config, ValidationError};

/// File name of the configuration inside a repository directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DaemonConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load `config.toml` from a repository, falling back to defaults when the
/// repository has none yet.
pub fn load_repo_config(repo_dir: &Path) -> Result<DaemonConfig, ConfigError> {
    let path = repo_dir.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(DaemonConfig::default());
    }
    load_config(&path)
}

/// Expand a leading `~` in a repository path against `$HOME`.
pub fn expand_repo_dir(dir: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (dir, home) {
        ("~", Some(home)) => home,
        (dir, Some(home)) if dir.starts_with("~/") => home.join(&dir[2..]),
        (dir, _) => PathBuf::from(dir),
    }
}
