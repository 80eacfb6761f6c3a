//! Shutdown signalling
//!
//! A [`ShutdownSignal`] is a cloneable flag backed by a watch channel. Long
//! sequences poll it at safe points and stop early once it has fired.

use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable shutdown flag
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been requested
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        // Only fails when the sender is gone, which cannot happen while self lives
        let _ = receiver.wait_for(|fired| *fired).await;
    }

    /// Trigger this signal on Ctrl-C. Must be called inside a tokio runtime.
    pub fn listen_for_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping at the next safe point (Ctrl-C again to exit)");
                    signal.trigger();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        })
    }
}
