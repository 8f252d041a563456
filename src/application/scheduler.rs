use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Runner for periodic tasks with error handling and logging
pub struct PeriodicTaskRunner {
    interval: Duration,
    task_name: String,
}

impl PeriodicTaskRunner {
    pub fn new(interval: Duration, task_name: impl Into<String>) -> Self {
        Self {
            interval,
            task_name: task_name.into(),
        }
    }

    /// Run the task every interval, starting one interval from now.
    /// A failed run is logged and does not stop the loop.
    pub async fn run<F, Fut>(&self, mut task_fn: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = JobResult>,
    {
        info!(
            "Starting periodic task: {} with interval: {:?}",
            self.task_name, self.interval
        );

        let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval_timer.tick().await;

            if let Err(e) = task_fn().await {
                error!("Periodic task {} failed: {}", self.task_name, e);
            }
        }
    }
}

/// Handle to a scheduled job. The job is aborted when the handle is
/// cancelled or dropped.
pub struct PeriodicJob {
    name: String,
    handle: JoinHandle<()>,
}

impl PeriodicJob {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(self) {
        debug!("Cancelling periodic job {}", self.name);
    }
}

impl Drop for PeriodicJob {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Schedules fixed-interval jobs on the current tokio runtime
#[derive(Debug, Clone, Default)]
pub struct PeriodicJobService;

impl PeriodicJobService {
    pub fn new() -> Self {
        Self
    }

    pub fn schedule<F, Fut>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        task_fn: F,
    ) -> PeriodicJob
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = JobResult> + Send + 'static,
    {
        let name = name.into();
        let runner = PeriodicTaskRunner::new(interval, name.clone());
        let handle = tokio::spawn(async move { runner.run(task_fn).await });
        PeriodicJob { name, handle }
    }
}
