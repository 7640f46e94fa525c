//! Awaitable delay standing in for a network round trip.
//!
//! `login` and `update_profile` must not resolve before their configured
//! delay has elapsed. Production uses Tokio's timer; tests swap in an
//! immediate or recording implementation.

use std::time::Duration;

use async_trait::async_trait;

/// Port for the simulated round-trip delay.
#[async_trait]
pub trait LatencySimulator: Send + Sync {
    /// Suspend the caller for `duration`.
    async fn pause(&self, duration: Duration);
}

/// Tokio-based latency implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLatency;

#[async_trait]
impl LatencySimulator for TokioLatency {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Latency implementation that resumes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

#[async_trait]
impl LatencySimulator for NoLatency {
    async fn pause(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn tokio_latency_waits_at_least_the_duration() {
        let started = Instant::now();
        TokioLatency.pause(Duration::from_millis(20)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
