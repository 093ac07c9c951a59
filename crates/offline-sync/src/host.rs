//! Signals from the worker back to the hosting runtime.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Lifecycle controls the host exposes to the worker.
pub trait HostControl: Send + Sync {
    /// Activate this version now instead of waiting for old sessions to close.
    fn skip_waiting(&self);

    /// Take control of already-open clients.
    fn claim_clients(&self);
}

/// Host that logs and counts the signals it receives.
#[derive(Debug, Default)]
pub struct HostSignals {
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
}

impl HostSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_waiting_count(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_count(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

impl HostControl for HostSignals {
    fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        info!("skip waiting requested");
    }

    fn claim_clients(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
        info!("claiming clients");
    }
}
