//! OS signal handling.
//!
//! # Responsibilities
//! - Register interest in process interrupts for the duration of one run
//! - Fold any number of interrupts into a single-slot notification
//! - Deregister on drop so repeated runs in one process do not interfere
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGINT and, on Unix, SIGTERM both count as an interrupt
//! - Capacity 1: a pending notification absorbs later ones, and a signal
//!   that arrives before anyone waits is still observed

use std::io;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cloneable handle that delivers an interrupt to a [`SignalWatcher`].
#[derive(Debug, Clone)]
pub struct Interrupter {
    tx: mpsc::Sender<()>,
}

impl Interrupter {
    /// Deliver an interrupt. Returns `false` if one was already pending or
    /// the watcher is gone.
    pub fn interrupt(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Single-slot bridge from process interrupts to the lifecycle controller.
pub struct SignalWatcher {
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
    os: bool,
    listener: Option<JoinHandle<()>>,
}

impl SignalWatcher {
    /// Watcher fed by process signals once registered.
    pub fn os() -> Self {
        Self::with_source(true)
    }

    /// Watcher fed only through [`Interrupter`] handles.
    pub fn manual() -> Self {
        Self::with_source(false)
    }

    fn with_source(os: bool) -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx,
            os,
            listener: None,
        }
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            tx: self.tx.clone(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.listener.is_some()
    }

    /// Start listening for process interrupts. Must be called inside a Tokio
    /// runtime. A manual watcher has nothing to register.
    pub fn register(&mut self) -> io::Result<()> {
        if !self.os || self.listener.is_some() {
            return Ok(());
        }
        let interrupter = self.interrupter();
        self.listener = Some(spawn_listener(interrupter)?);
        tracing::debug!("Interrupt handler registered");
        Ok(())
    }

    /// Stop listening and discard any pending notification.
    pub fn deregister(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            tracing::debug!("Interrupt handler deregistered");
        }
        while self.rx.try_recv().is_ok() {}
    }

    /// Wait for the next interrupt.
    ///
    /// Cancel safe. Never resolves if no interrupt can arrive any more.
    pub async fn recv(&mut self) {
        // self.tx keeps the channel open, so recv only yields Some.
        let _ = self.rx.recv().await;
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(unix)]
fn spawn_listener(interrupter: Interrupter) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                else => break,
            };
            if !interrupter.interrupt() {
                tracing::debug!(signal = name, "Interrupt already pending, ignoring");
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_listener(interrupter: Interrupter) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !interrupter.interrupt() {
                tracing::debug!("Interrupt already pending, ignoring");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn holds_at_most_one_interrupt() {
        let mut watcher = SignalWatcher::manual();
        let interrupter = watcher.interrupter();

        assert!(interrupter.interrupt());
        assert!(!interrupter.interrupt());

        watcher.recv().await;
        let second = tokio::time::timeout(Duration::from_millis(50), watcher.recv()).await;
        assert!(second.is_err(), "duplicate interrupt must be dropped");
    }

    #[tokio::test]
    async fn early_interrupt_is_buffered() {
        let mut watcher = SignalWatcher::manual();
        watcher.interrupter().interrupt();

        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::timeout(Duration::from_secs(1), watcher.recv())
            .await
            .expect("buffered interrupt");
    }

    #[tokio::test]
    async fn deregister_discards_pending() {
        let mut watcher = SignalWatcher::manual();
        watcher.register().unwrap();
        assert!(!watcher.is_registered());

        watcher.interrupter().interrupt();
        watcher.deregister();

        let pending = tokio::time::timeout(Duration::from_millis(50), watcher.recv()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn os_watcher_registers_once() {
        let mut watcher = SignalWatcher::os();
        watcher.register().unwrap();
        watcher.register().unwrap();
        assert!(watcher.is_registered());

        watcher.deregister();
        assert!(!watcher.is_registered());
    }
}
