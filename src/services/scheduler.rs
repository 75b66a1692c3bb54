use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::job_runner::JobRunner;

/// Drives [`JobRunner::run_once`] either as a fixed-delay loop or from a cron
/// expression.
pub struct Scheduler {
    runner: Arc<JobRunner>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(runner: Arc<JobRunner>, config: SchedulerConfig) -> Self {
        Self {
            runner,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_delay().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let runner = Arc::clone(&self.runner);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let runner = Arc::clone(&runner);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_pass(&runner).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    /// The delay starts after each pass, however long the pass took.
    async fn run_with_delay(&self) -> Result<()> {
        let delay = Duration::from_secs(u64::from(self.config.poll_interval_seconds.max(1)));

        info!("Scheduler running: pass every {}s after completion", delay.as_secs());

        loop {
            if !*self.running.read().await {
                break;
            }

            run_pass(&self.runner).await;

            tokio::time::sleep(delay).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// One pass, returning its error instead of logging it.
    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual check...");
        let stats = self.runner.run_once().await?;
        info!(
            due = stats.due,
            succeeded = stats.succeeded,
            failed = stats.failed,
            notified = stats.notified,
            "Manual check finished"
        );
        Ok(())
    }
}

/// Outer-level failures (store unreachable) are logged; the driver keeps going.
async fn run_pass(runner: &JobRunner) {
    if let Err(e) = runner.run_once().await {
        error!(event = "job_failed", job_name = "scheduled_checks", error = %e, "Scheduler pass failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::db::Store;
    use crate::services::ad_check::{AdCheckService, AdCheckSettings};
    use crate::clients::serpapi::SerpApiClient;
    use crate::services::job_runner::RunnerSettings;

    async fn runner() -> Arc<JobRunner> {
        let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
        let backend = Arc::new(
            SerpApiClient::new("http://127.0.0.1:9/search", Duration::from_secs(1)).unwrap(),
        );
        let checker = Arc::new(AdCheckService::new(
            backend,
            AdCheckSettings::from(&SearchConfig::default()),
        ));
        Arc::new(JobRunner::new(store, checker, None, RunnerSettings::default()))
    }

    #[tokio::test]
    async fn disabled_scheduler_returns_immediately() {
        let config = SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(runner().await, config);
        scheduler.start().await.unwrap();
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn stop_ends_the_loop() {
        let config = SchedulerConfig {
            poll_interval_seconds: 1,
            ..SchedulerConfig::default()
        };
        let scheduler = Arc::new(Scheduler::new(runner().await, config));

        let handle = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.start().await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.is_running().await);
        scheduler.stop().await;

        let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn manual_run_on_empty_store_succeeds() {
        let scheduler = Scheduler::new(runner().await, SchedulerConfig::default());
        scheduler.run_once().await.unwrap();
    }
}
