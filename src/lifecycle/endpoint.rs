//! Discovery file recording the live API address.
//!
//! Co-located clients read `<repo>/api` to find a running daemon. The file
//! holds the bound address as plain UTF-8 with nothing else in it.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// File name of the discovery file inside a repository directory.
pub const API_FILE: &str = "api";

/// Writing or removing the discovery file failed.
#[derive(Debug, thiserror::Error)]
#[error("could not {action} API address file {path}: {source}")]
pub struct PersistError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Owner of the discovery file for one repository.
#[derive(Debug, Clone)]
pub struct EndpointRecorder {
    path: PathBuf,
}

impl EndpointRecorder {
    /// Recorder for the discovery file of `repo_dir`.
    pub fn for_repo(repo_dir: &Path) -> Self {
        Self {
            path: repo_dir.join(API_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `addr` as the live API address, replacing any stale record.
    pub fn write(&self, addr: SocketAddr) -> Result<(), PersistError> {
        fs::write(&self.path, addr.to_string()).map_err(|source| PersistError {
            action: "write",
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), address = %addr, "API address recorded");
        Ok(())
    }

    /// Remove the record. An already absent file counts as removed.
    pub fn remove(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "API address file removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError {
                action: "remove",
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Read the address a running daemon recorded in `repo_dir`.
///
/// `Ok(None)` means no daemon is running for that repository.
pub fn read_endpoint(repo_dir: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(repo_dir.join(API_FILE)) {
        Ok(addr) => Ok(Some(addr)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
