use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Background work driven by [`crate::scheduler::Scheduler`].
///
/// A failed run is logged and the job is retried on its next tick.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Label used in log lines.
    fn name(&self) -> &str;
    /// Delay between runs; the first run fires immediately on start.
    fn interval(&self) -> Duration;
    async fn run(&self) -> Result<()>;
}
