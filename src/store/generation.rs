use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Epoch counter shared between the staging store and anyone who can cancel.
/// Advancing it invalidates every ticket handed out before.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Bumps the epoch and returns the new value.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn ticket(&self) -> EpochTicket {
        EpochTicket {
            generation: self.clone(),
            epoch: self.current(),
        }
    }
}

/// Proof of the epoch a batch started in.
#[derive(Debug, Clone)]
pub struct EpochTicket {
    generation: Generation,
    epoch: u64,
}

impl EpochTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.generation.current() == self.epoch
    }
}
