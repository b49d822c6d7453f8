use std::{future::Future, time::Duration};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::{config::Config, pipeline::Pipeline};

/// Runs a pipeline once straight away and then every `interval`.
///
/// The interval is measured from the end of the previous cycle, and idle time
/// is spent in `poll` sized sleeps. A cycle is always awaited before the next
/// check, so cycles never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    interval: Duration,
    poll: Duration,
}

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub published: usize,
}

impl Scheduler {
    pub fn new(interval: Duration, poll: Duration) -> Self {
        Self { interval, poll }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.interval, config.poll)
    }

    /// Runs until the process is killed.
    pub async fn run(&self, pipeline: &Pipeline) -> RunSummary {
        self.run_until(pipeline, std::future::pending()).await
    }

    /// Runs until `shutdown` resolves. A cycle in flight at that point is
    /// dropped.
    pub async fn run_until<F>(&self, pipeline: &Pipeline, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();

        let ticking = async {
            let mut next_run = Instant::now();
            loop {
                if Instant::now() >= next_run {
                    let outcome = pipeline.run_cycle().await;
                    summary.cycles += 1;
                    if outcome.is_published() {
                        summary.published += 1;
                    }
                    next_run = Instant::now() + self.interval;
                    debug!(
                        cycles = summary.cycles,
                        published = summary.published,
                        "next cycle in {:?}",
                        self.interval
                    );
                }
                sleep(self.poll).await;
            }
        };

        tokio::select! {
            _ = ticking => {}
            _ = shutdown => info!("shutdown requested, stopping scheduler"),
        }

        summary
    }
}
