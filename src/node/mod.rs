//! Node collaborator.
//!
//! The lifecycle controller only sees a node through [`NodeHandle`]. The
//! networking and consensus internals live behind `start`/`stop`.
//! [`LocalNode`] is the in-process node the `node-daemon` binary runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

/// The node failed to start.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("node is already running")]
    AlreadyStarted,
    #[error("invalid swarm address {0:?}")]
    SwarmAddress(String),
    #[error("node failed to start: {0}")]
    Other(String),
}

/// Start/stop contract of the node's background services.
pub trait NodeHandle: Send {
    /// Bring up the node's services.
    fn start(&mut self) -> Result<(), NodeError>;

    /// Tear the services down. Safe to call more than once.
    fn stop(&mut self);
}

/// Options the node is constructed from.
#[derive(Debug, Clone, Default)]
pub struct NodeOptions {
    /// Multiaddr the swarm listens on.
    pub swarm_address: String,
    /// Disable peer-to-peer networking.
    pub offline: bool,
}

/// Read-only facts about a node, shared with the administrative API.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub peer_id: String,
    pub offline: bool,
    pub swarm_addresses: Vec<String>,
    #[serde(skip)]
    running: Arc<AtomicBool>,
}

impl NodeInfo {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// In-process node.
pub struct LocalNode {
    info: NodeInfo,
}

impl LocalNode {
    pub fn new(options: NodeOptions) -> Self {
        let swarm_addresses = if options.offline {
            Vec::new()
        } else {
            vec![options.swarm_address]
        };

        Self {
            info: NodeInfo {
                peer_id: Uuid::new_v4().simple().to_string(),
                offline: options.offline,
                swarm_addresses,
                running: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn info(&self) -> NodeInfo {
        self.info.clone()
    }
}

impl NodeHandle for LocalNode {
    fn start(&mut self) -> Result<(), NodeError> {
        for addr in &self.info.swarm_addresses {
            if !addr.starts_with('/') {
                return Err(NodeError::SwarmAddress(addr.clone()));
            }
        }
        if self.info.running.swap(true, Ordering::SeqCst) {
            return Err(NodeError::AlreadyStarted);
        }

        if self.info.offline {
            tracing::info!("Node running in offline mode (networking is disabled)");
        } else {
            tracing::info!(peer_id = %self.info.peer_id, "My peer ID is {}", self.info.peer_id);
            for addr in &self.info.swarm_addresses {
                tracing::info!(address = %addr, "Swarm listening on {}", addr);
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.info.running.swap(false, Ordering::SeqCst) {
            tracing::info!(peer_id = %self.info.peer_id, "Node stopped");
        }
    }
}
