//! Host readiness signalling
//!
//! The capture host exposes a single entry point that tells it the page may
//! be snapshotted. [`ReadinessLatch`] guarantees it is called at most once
//! per page load no matter how many code paths try to fire it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// The host's readiness entry point
pub trait ReadySignal: Send + Sync {
    fn signal_ready(&self);
}

impl<F> ReadySignal for F
where
    F: Fn() + Send + Sync,
{
    fn signal_ready(&self) {
        self()
    }
}

/// At-most-once wrapper around a [`ReadySignal`]
pub struct ReadinessLatch {
    host: Arc<dyn ReadySignal>,
    fired: AtomicBool,
    attempts: AtomicUsize,
}

impl ReadinessLatch {
    pub fn new(host: Arc<dyn ReadySignal>) -> Self {
        Self {
            host,
            fired: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Signal the host unless that already happened.
    ///
    /// Returns `true` if this call delivered the signal.
    pub fn fire(&self) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fired.swap(true, Ordering::SeqCst) {
            log::debug!("readiness already signalled; ignoring duplicate");
            return false;
        }
        log::info!("signalling host: page ready for capture");
        self.host.signal_ready();
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// How many times `fire` was called, including suppressed duplicates
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Sending half of [`channel`]; implements [`ReadySignal`]
pub struct ChannelSignal {
    tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl ReadySignal for ChannelSignal {
    fn signal_ready(&self) {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = sender {
            // receiver gone means the host stopped waiting
            let _ = tx.send(());
        }
    }
}

/// Receiving half of [`channel`]
pub struct ReadyReceiver {
    rx: oneshot::Receiver<()>,
}

impl ReadyReceiver {
    /// Wait for the page to report readiness.
    ///
    /// Resolves to an error if the signal was dropped without firing.
    pub async fn wait(self) -> crate::Result<()> {
        self.rx
            .await
            .map_err(|e| crate::Error::Other(format!("Readiness signal dropped: {}", e)))
    }
}

/// Create a readiness signal the host can await.
pub fn channel() -> (ChannelSignal, ReadyReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        ChannelSignal {
            tx: Mutex::new(Some(tx)),
        },
        ReadyReceiver { rx },
    )
}
