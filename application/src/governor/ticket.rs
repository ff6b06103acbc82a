//! Admission ticket guard

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::OwnedSemaphorePermit;

/// Lifetime ticket counters shared between the governor and its tickets
#[derive(Debug, Default)]
pub(crate) struct TicketCounters {
    pub active: AtomicUsize,
    pub acquired: AtomicU64,
    pub released: AtomicU64,
}

/// One slot of the global concurrency budget
///
/// The slot is returned to the governor when the ticket is dropped, on
/// every exit path including unwinding.
#[derive(Debug)]
pub struct AdmissionTicket {
    _permit: OwnedSemaphorePermit,
    counters: Arc<TicketCounters>,
}

impl AdmissionTicket {
    pub(crate) fn new(permit: OwnedSemaphorePermit, counters: Arc<TicketCounters>) -> Self {
        counters.active.fetch_add(1, Ordering::SeqCst);
        counters.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            _permit: permit,
            counters,
        }
    }
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
