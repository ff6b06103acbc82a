//! Concurrency governor
//!
//! Composes two admission mechanisms: a global bound on graphs executing at
//! once, and per-caller rolling request windows per endpoint kind. One
//! governor is constructed at startup and shared by handle.

mod rate_window;
mod ticket;

pub use ticket::AdmissionTicket;

use crate::config::{AdmissionMode, GovernorConfig};
use rate_window::RateWindows;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use thiserror::Error;
use ticket::TicketCounters;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Which answer view a request asks for; each has its own rate budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Simple,
    Detailed,
}

impl EndpointKind {
    pub fn as_str(&self) -> &str {
        match self {
            EndpointKind::Simple => "simple",
            EndpointKind::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reasons a request is refused admission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Capacity exceeded: {active} of {max} executions active")]
    CapacityExceeded { active: usize, max: usize },

    #[error("Rate limit exceeded for {caller}: {limit} {kind} requests per window")]
    RateLimitExceeded {
        caller: String,
        kind: EndpointKind,
        limit: u32,
        retry_after: Option<Duration>,
    },
}

impl AdmissionError {
    /// Suggested wait before retrying, when one is known
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdmissionError::RateLimitExceeded { retry_after, .. } => *retry_after,
            AdmissionError::CapacityExceeded { .. } => None,
        }
    }
}

/// Snapshot of the governor's state for one caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernorStatus {
    pub active: usize,
    pub max_concurrent: usize,
    pub tickets_acquired: u64,
    pub tickets_released: u64,
    pub remaining_simple: u32,
    pub remaining_detailed: u32,
}

/// Global concurrency bound plus per-caller rate windows
#[derive(Debug)]
pub struct ConcurrencyGovernor {
    config: GovernorConfig,
    semaphore: Arc<Semaphore>,
    counters: Arc<TicketCounters>,
    windows: RateWindows,
}

impl ConcurrencyGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            counters: Arc::new(TicketCounters::default()),
            windows: RateWindows::new(config.rate_limits.window),
            config,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    fn limit_for(&self, kind: EndpointKind) -> u32 {
        match kind {
            EndpointKind::Simple => self.config.rate_limits.simple,
            EndpointKind::Detailed => self.config.rate_limits.detailed,
        }
    }

    /// Consume one unit of `caller`'s budget for `kind`, or refuse.
    ///
    /// A consumed unit stays consumed even if the request is later refused
    /// for capacity.
    pub fn check_rate(&self, caller: &str, kind: EndpointKind) -> Result<(), AdmissionError> {
        let limit = self.limit_for(kind);
        match self.windows.try_consume(caller, kind, limit) {
            Ok(()) => {
                debug!(caller, kind = kind.as_str(), "Rate window admitted request");
                Ok(())
            }
            Err(full) => {
                warn!(
                    caller,
                    kind = kind.as_str(),
                    limit,
                    retry_after_secs = full.retry_after.map(|d| d.as_secs()),
                    "Rate limit exceeded"
                );
                Err(AdmissionError::RateLimitExceeded {
                    caller: caller.to_string(),
                    kind,
                    limit,
                    retry_after: full.retry_after,
                })
            }
        }
    }

    /// Obtain a ticket from the global budget according to the admission mode
    pub async fn admit(&self) -> Result<AdmissionTicket, AdmissionError> {
        let permit = match self.config.mode {
            AdmissionMode::Reject => Arc::clone(&self.semaphore).try_acquire_owned().ok(),
            AdmissionMode::Block => tokio::time::timeout(
                self.config.admission_wait,
                Arc::clone(&self.semaphore).acquire_owned(),
            )
            .await
            .ok()
            .and_then(Result::ok),
        };

        match permit {
            Some(permit) => {
                let ticket = AdmissionTicket::new(permit, Arc::clone(&self.counters));
                info!(
                    active = self.active(),
                    max = self.config.max_concurrent,
                    "Admission ticket acquired"
                );
                Ok(ticket)
            }
            None => {
                let active = self.active();
                warn!(
                    active,
                    max = self.config.max_concurrent,
                    mode = self.config.mode.as_str(),
                    "Capacity exceeded"
                );
                Err(AdmissionError::CapacityExceeded {
                    active,
                    max: self.config.max_concurrent,
                })
            }
        }
    }

    /// Executions currently holding a ticket
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.config.max_concurrent
    }

    pub fn tickets_acquired(&self) -> u64 {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn tickets_released(&self) -> u64 {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn remaining(&self, caller: &str, kind: EndpointKind) -> u32 {
        self.windows.remaining(caller, kind, self.limit_for(kind))
    }

    pub fn status(&self, caller: &str) -> GovernorStatus {
        GovernorStatus {
            active: self.active(),
            max_concurrent: self.config.max_concurrent,
            tickets_acquired: self.tickets_acquired(),
            tickets_released: self.tickets_released(),
            remaining_simple: self.remaining(caller, EndpointKind::Simple),
            remaining_detailed: self.remaining(caller, EndpointKind::Detailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimits;

    fn governor(max: usize, mode: AdmissionMode) -> ConcurrencyGovernor {
        ConcurrencyGovernor::new(
            GovernorConfig::default()
                .with_max_concurrent(max)
                .with_mode(mode)
                .with_admission_wait(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_reject_mode_refuses_beyond_bound() {
        let governor = governor(2, AdmissionMode::Reject);

        let first = governor.admit().await.unwrap();
        let _second = governor.admit().await.unwrap();
        assert_eq!(governor.active(), 2);

        let err = governor.admit().await.unwrap_err();
        assert_eq!(err, AdmissionError::CapacityExceeded { active: 2, max: 2 });

        drop(first);
        assert_eq!(governor.active(), 1);
        assert!(governor.admit().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_mode_waits_for_release() {
        let governor = Arc::new(governor(1, AdmissionMode::Block));
        let held = governor.admit().await.unwrap();

        let waiter = {
            let governor = Arc::clone(&governor);
            tokio::spawn(async move { governor.admit().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_mode_gives_up_after_wait() {
        let governor = governor(1, AdmissionMode::Block);
        let _held = governor.admit().await.unwrap();

        let err = governor.admit().await.unwrap_err();
        assert!(matches!(err, AdmissionError::CapacityExceeded { max: 1, .. }));
    }

    #[tokio::test]
    async fn test_counters_balance() {
        let governor = governor(3, AdmissionMode::Reject);
        for _ in 0..5 {
            let _ticket = governor.admit().await.unwrap();
        }
        assert_eq!(governor.tickets_acquired(), 5);
        assert_eq!(governor.tickets_released(), 5);
        assert_eq!(governor.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_retry_after() {
        let governor = ConcurrencyGovernor::new(GovernorConfig::default().with_rate_limits(
            RateLimits {
                simple: 3,
                detailed: 1,
                window: Duration::from_secs(3600),
            },
        ));

        for _ in 0..3 {
            governor.check_rate("10.0.0.7", EndpointKind::Simple).unwrap();
        }
        let err = governor
            .check_rate("10.0.0.7", EndpointKind::Simple)
            .unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3600)));

        governor.check_rate("10.0.0.7", EndpointKind::Detailed).unwrap();
        let status = governor.status("10.0.0.7");
        assert_eq!(status.remaining_simple, 0);
        assert_eq!(status.remaining_detailed, 0);
        assert_eq!(governor.status("10.0.0.8").remaining_simple, 3);
    }
}
