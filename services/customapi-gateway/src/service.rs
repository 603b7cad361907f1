//! Runtime counters and shutdown timing

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long in-flight requests may run after a shutdown signal.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime metrics reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceMetrics {
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    /// Requests currently being processed; logged if the drain times out.
    pub in_flight: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    /// Count a request as served and in flight until the guard drops.
    pub fn begin_request(&self) -> InFlightGuard {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decrements the in-flight counter on drop, including on client disconnect.
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_in_flight_requests() {
        let metrics = ServiceMetrics::new();
        let first = metrics.begin_request();
        let second = metrics.begin_request();
        assert_eq!(metrics.in_flight.load(Ordering::Relaxed), 2);

        drop(first);
        assert_eq!(metrics.in_flight.load(Ordering::Relaxed), 1);
        drop(second);
        assert_eq!(metrics.in_flight.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn clones_share_counters() {
        let metrics = ServiceMetrics::new();
        let clone = metrics.clone();
        clone.record_error();
        assert_eq!(metrics.errors_total.load(Ordering::Relaxed), 1);
    }
}
