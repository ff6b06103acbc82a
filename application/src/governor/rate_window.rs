//! Rolling per-caller request windows

use super::EndpointKind;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a rate check that did not fit the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowFull {
    pub retry_after: Option<Duration>,
}

/// Admission instants per `(caller, kind)`, pruned lazily on access
#[derive(Debug)]
pub(crate) struct RateWindows {
    window: Duration,
    entries: Mutex<HashMap<(String, EndpointKind), VecDeque<Instant>>>,
}

impl RateWindows {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, EndpointKind), VecDeque<Instant>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(log: &mut VecDeque<Instant>, window: Duration, now: Instant) {
        while let Some(&front) = log.front() {
            if now.saturating_duration_since(front) >= window {
                log.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record one request for `caller` if fewer than `limit` are inside the window
    pub fn try_consume(
        &self,
        caller: &str,
        kind: EndpointKind,
        limit: u32,
    ) -> Result<(), WindowFull> {
        let now = Instant::now();
        let window = self.window;
        let mut entries = self.lock();
        // Drop callers whose whole log has aged out so the map stays bounded
        entries.retain(|_, log| {
            Self::prune(log, window, now);
            !log.is_empty()
        });
        let log = entries.entry((caller.to_string(), kind)).or_default();

        if log.len() >= limit as usize {
            let retry_after = log
                .front()
                .map(|&oldest| (oldest + self.window).saturating_duration_since(now));
            return Err(WindowFull { retry_after });
        }

        log.push_back(now);
        Ok(())
    }

    /// Requests `caller` may still make for `kind` in the current window
    pub fn remaining(&self, caller: &str, kind: EndpointKind, limit: u32) -> u32 {
        let now = Instant::now();
        let mut entries = self.lock();
        let key = (caller.to_string(), kind);
        let used = match entries.get_mut(&key) {
            Some(log) => {
                Self::prune(log, self.window, now);
                log.len()
            }
            None => 0,
        };
        if used == 0 {
            entries.remove(&key);
        }
        (limit as usize).saturating_sub(used) as u32
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_fills_and_reports_retry_after() {
        let windows = RateWindows::new(Duration::from_secs(60));

        windows.try_consume("10.0.0.1", EndpointKind::Simple, 2).unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        windows.try_consume("10.0.0.1", EndpointKind::Simple, 2).unwrap();

        let full = windows
            .try_consume("10.0.0.1", EndpointKind::Simple, 2)
            .unwrap_err();
        assert_eq!(full.retry_after, Some(Duration::from_secs(50)));
        assert_eq!(windows.remaining("10.0.0.1", EndpointKind::Simple, 2), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let windows = RateWindows::new(Duration::from_secs(60));

        windows.try_consume("a", EndpointKind::Detailed, 1).unwrap();
        assert!(windows.try_consume("a", EndpointKind::Detailed, 1).is_err());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(windows.remaining("a", EndpointKind::Detailed, 1), 1);
        windows.try_consume("a", EndpointKind::Detailed, 1).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_budgets_are_per_caller_and_kind() {
        let windows = RateWindows::new(Duration::from_secs(60));

        windows.try_consume("a", EndpointKind::Simple, 1).unwrap();
        windows.try_consume("b", EndpointKind::Simple, 1).unwrap();
        windows.try_consume("a", EndpointKind::Detailed, 1).unwrap();

        assert!(windows.try_consume("a", EndpointKind::Simple, 1).is_err());
        assert_eq!(windows.remaining("c", EndpointKind::Simple, 1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_callers_are_forgotten() {
        let windows = RateWindows::new(Duration::from_secs(60));
        for i in 0..1000 {
            let caller = format!("10.0.{}.{}", i / 256, i % 256);
            windows.try_consume(&caller, EndpointKind::Simple, 1).unwrap();
        }
        assert_eq!(windows.tracked(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        windows.try_consume("fresh", EndpointKind::Simple, 1).unwrap();
        assert_eq!(windows.tracked(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(windows.remaining("fresh", EndpointKind::Simple, 1), 1);
        assert_eq!(windows.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_rejects_without_retry_hint() {
        let windows = RateWindows::new(Duration::from_secs(60));
        let full = windows.try_consume("a", EndpointKind::Simple, 0).unwrap_err();
        assert_eq!(full.retry_after, None);
    }
}
