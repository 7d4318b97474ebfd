//! Cooperative cancellation of superseded runs.
//!
//! A UI recomputes the whole trajectory whenever a slider moves. When a new run is requested
//! before the previous one has been consumed, the previous one is stale. A
//! [`RunCoordinator`] hands out one [`RunTicket`] per request and cancels the token of the
//! ticket it replaces; the integrator polls the token and gives up early. Callers that
//! finish a run can still ask [`RunCoordinator::is_current`] before publishing the result.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::log::trace;

/// A shared flag that asks a run to stop. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Identifies one run request.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

/// Latest-wins bookkeeping for run requests.
#[derive(Debug, Default)]
pub struct RunCoordinator {
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl RunCoordinator {
    #[must_use]
    pub fn new() -> Self {
        RunCoordinator::default()
    }

    /// Starts a new request, cancelling the one before it.
    pub fn begin(&self) -> RunTicket {
        let token = CancellationToken::new();
        let mut current = self.current.lock().expect("Mutex poisoned");
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(current);
        trace!("run request {generation} started");
        RunTicket { generation, token }
    }

    /// True if no request was started after `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: &RunTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }
}
