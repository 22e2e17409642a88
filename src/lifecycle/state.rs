//! Lifecycle state machine of one daemon run.

use std::fmt;

use tokio::sync::watch;

/// Phase of a daemon run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Created,
    NodeStarting,
    ServerStarting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::NodeStarting => "node-starting",
            LifecycleState::ServerStarting => "server-starting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting-down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Publishes state transitions to any number of observers.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<LifecycleState>,
}

impl StateTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Created);
        Self { tx }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next`. Backward moves are ignored.
    pub fn advance(&self, next: LifecycleState) {
        self.tx.send_if_modified(|state| {
            if next <= *state {
                return false;
            }
            tracing::debug!(from = %state, to = %next, "Lifecycle transition");
            *state = next;
            true
        });
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
