//! Sleeping behind a trait so wait loops are testable without real time.

use std::time::Duration;

use async_trait::async_trait;

/// Pauses between probe attempts.
#[async_trait]
pub trait Sleeper
where
    Self: Send + Sync,
{
    /// Sleeps for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
