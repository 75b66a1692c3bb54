//! Run body shared by the polling loop, the cron driver and the trigger
//! endpoint.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::clients::telegram::NotifyError;
use crate::config::Config;
use crate::db::JobStore;
use crate::models::check::{CheckRequest, CheckResult};
use crate::models::job::ScheduledJob;
use crate::models::search_log::NewSearchLog;
use crate::services::ad_check::{AdCheckService, CheckError};
use crate::services::notifier::{Notifier, format_alert};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Counters of one pass over the due jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub due: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub notified: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunnerSettings {
    pub gl: String,
    pub hl: String,
    pub default_location: Option<String>,
    pub default_chat_id: Option<String>,
}

impl From<&Config> for RunnerSettings {
    fn from(config: &Config) -> Self {
        Self {
            gl: config.search.default_gl.clone(),
            hl: config.search.default_hl.clone(),
            default_location: config.search.default_location.clone(),
            default_chat_id: config
                .telegram
                .notification_chat_id
                .clone()
                .filter(|c| !c.trim().is_empty()),
        }
    }
}

pub struct JobRunner {
    store: Arc<dyn JobStore>,
    checker: Arc<AdCheckService>,
    notifier: Option<Arc<dyn Notifier>>,
    settings: RunnerSettings,
    run_lock: Mutex<()>,
}

impl JobRunner {
    #[must_use]
    pub fn new(
        store: Arc<dyn JobStore>,
        checker: Arc<AdCheckService>,
        notifier: Option<Arc<dyn Notifier>>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            store,
            checker,
            notifier,
            settings,
            run_lock: Mutex::new(()),
        }
    }

    /// Processes every due job once, one after another.
    ///
    /// Passes in this process never overlap: a second caller waits and then
    /// sees the `next_run_at` values the first one wrote. The lock does not
    /// reach other processes, so a `run-once` fired by external cron while
    /// `serve` is polling the same database can pick the same due job and
    /// send its alert twice. Jobs are not claimed before the check, because
    /// an alert must go out before `next_run_at` moves.
    ///
    /// # Errors
    /// Only when the due jobs cannot be read. Per-job failures are logged and
    /// counted in [`RunStats::failed`].
    pub async fn run_once(&self) -> anyhow::Result<RunStats> {
        let _guard = self.run_lock.lock().await;
        let start = Instant::now();

        let jobs = self.store.get_due_jobs(Utc::now()).await?;
        let mut stats = RunStats {
            due: jobs.len(),
            ..RunStats::default()
        };

        if jobs.is_empty() {
            info!(event = "scheduler_pass", due = 0, "No due jobs");
            return Ok(stats);
        }

        info!(event = "job_started", job_name = "scheduled_checks", due = jobs.len(), "Processing due jobs");

        for job in &jobs {
            match self.process(job).await {
                Ok(notified) => {
                    stats.succeeded += 1;
                    if notified {
                        stats.notified += 1;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    metrics::counter!("scheduled_job_failures_total").increment(1);
                    error!(
                        event = "job_failed",
                        job_id = %job.id,
                        query = %job.query,
                        error = %e,
                        "Scheduled job failed; it stays due"
                    );
                }
            }
        }

        info!(
            event = "job_finished",
            job_name = "scheduled_checks",
            due = stats.due,
            succeeded = stats.succeeded,
            failed = stats.failed,
            notified = stats.notified,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scheduled pass finished"
        );

        Ok(stats)
    }

    /// Starts [`run_once`](Self::run_once) without waiting for it. The task
    /// logs its own outcome.
    pub fn trigger_run(self: &Arc<Self>) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            match runner.run_once().await {
                Ok(stats) => info!(
                    event = "triggered_run_finished",
                    due = stats.due,
                    failed = stats.failed,
                    "Triggered scheduler run finished"
                ),
                Err(e) => error!(
                    event = "triggered_run_failed",
                    error = %e,
                    "Triggered scheduler run failed"
                ),
            }
        })
    }

    /// Returns whether an alert was delivered.
    async fn process(&self, job: &ScheduledJob) -> Result<bool, JobError> {
        let location = job.effective_location(self.settings.default_location.as_deref());
        let request = CheckRequest::new(&job.query, &self.settings.gl, &self.settings.hl)
            .with_device(job.device)
            .with_location(location);

        let result = self.checker.check_ads(&request).await?;

        if let Err(e) = self.store.add_log(&NewSearchLog::from(&result)).await {
            warn!(job_id = %job.id, error = %e, "Failed to record search log");
        }

        let notified = if result.has_ads {
            self.notify(job, &result, location).await?
        } else {
            false
        };

        // Only after the alert went out.
        self.store
            .update_next_run(job.id, job.interval_minutes, Utc::now())
            .await?;

        Ok(notified)
    }

    async fn notify(
        &self,
        job: &ScheduledJob,
        result: &CheckResult,
        location: Option<&str>,
    ) -> Result<bool, JobError> {
        let Some(notifier) = &self.notifier else {
            warn!(job_id = %job.id, "Ads found but no notifier is configured");
            return Ok(false);
        };

        let target = job
            .notify_chat_id
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.settings.default_chat_id.as_deref());
        let Some(chat_id) = target else {
            warn!(job_id = %job.id, "Ads found but no notification chat is configured");
            return Ok(false);
        };

        let shown_location = result.location_used.as_deref().or(location);
        notifier
            .send(chat_id, &format_alert(result, shown_location))
            .await?;

        info!(job_id = %job.id, chat_id = %chat_id, ads = result.ads_count, "Alert sent");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::serpapi::{RawAd, SearchParams, SerpResponse, UpstreamError};
    use crate::config::SearchConfig;
    use crate::db::Store;
    use crate::domain::Device;
    use crate::models::job::NewJob;
    use crate::services::ad_check::{AdCheckSettings, SearchBackend};
    use chrono::Duration;
    use std::sync::Mutex as StdMutex;

    /// Two ads for every query except `"boom"`, which fails; `"quiet"` has none.
    #[derive(Default)]
    struct QueryBackend {
        calls: StdMutex<Vec<SearchParams>>,
        fail_everything: bool,
    }

    #[async_trait::async_trait]
    impl SearchBackend for QueryBackend {
        async fn search(&self, params: &SearchParams) -> Result<SerpResponse, UpstreamError> {
            self.calls.lock().unwrap().push(params.clone());
            if self.fail_everything || params.query == "boom" {
                return Err(UpstreamError::Status {
                    status: 500,
                    body: "upstream down".to_string(),
                });
            }
            if params.query == "quiet" {
                return Ok(SerpResponse::default());
            }
            let ad = |n: u8| RawAd {
                title: Some(format!("Offer {n}")),
                link: Some(format!("https://www.offer{n}.com/")),
                ..RawAd::default()
            };
            Ok(SerpResponse {
                ads: vec![ad(1), ad(2)],
                ..SerpResponse::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Status {
                    status: 400,
                    body: "chat not found".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Harness {
        store: Arc<Store>,
        backend: Arc<QueryBackend>,
        notifier: Arc<RecordingNotifier>,
        runner: Arc<JobRunner>,
    }

    async fn harness(backend: QueryBackend, notifier: RecordingNotifier) -> Harness {
        let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
        let backend = Arc::new(backend);
        let notifier = Arc::new(notifier);

        let mut search = SearchConfig::default();
        search.api_key = Some("key".to_string());
        let checker = Arc::new(AdCheckService::new(
            backend.clone(),
            AdCheckSettings::from(&search),
        ));

        let runner = Arc::new(JobRunner::new(
            store.clone(),
            checker,
            Some(notifier.clone() as Arc<dyn Notifier>),
            RunnerSettings {
                gl: "tr".to_string(),
                hl: "tr".to_string(),
                default_location: None,
                default_chat_id: Some("-100group".to_string()),
            },
        ));

        Harness {
            store,
            backend,
            notifier,
            runner,
        }
    }

    async fn due_job(store: &Store, query: &str, location: Option<&str>) -> ScheduledJob {
        let job = NewJob {
            query: query.to_string(),
            interval_minutes: 15,
            location: location.map(str::to_string),
            device: Device::Mobile,
            notify_chat_id: None,
        };
        store
            .insert_job(&job, Utc::now() - Duration::minutes(1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn failing_job_does_not_stop_the_others() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        let first = due_job(&h.store, "kredi kartı", None).await;
        let second = due_job(&h.store, "boom", None).await;
        let third = due_job(&h.store, "konut kredisi", None).await;

        let before = Utc::now();
        let stats = h.runner.run_once().await.unwrap();

        assert_eq!(
            stats,
            RunStats {
                due: 3,
                succeeded: 2,
                failed: 1,
                notified: 2
            }
        );

        let first = h.store.get_job(first.id).await.unwrap().unwrap();
        let third = h.store.get_job(third.id).await.unwrap().unwrap();
        assert!(first.next_run_at >= before + Duration::minutes(15));
        assert!(third.next_run_at >= before + Duration::minutes(15));

        let untouched = h.store.get_job(second.id).await.unwrap().unwrap();
        assert_eq!(untouched.next_run_at, second.next_run_at);

        let due_now: Vec<_> = h
            .store
            .get_due_jobs(Utc::now())
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(due_now, vec![second.id]);
    }

    #[tokio::test]
    async fn failing_search_leaves_job_due_and_silent() {
        let backend = QueryBackend {
            fail_everything: true,
            ..QueryBackend::default()
        };
        let h = harness(backend, RecordingNotifier::default()).await;
        let job = due_job(&h.store, "kredi kartı", Some("Izmir")).await;

        let stats = h.runner.run_once().await.unwrap();

        assert_eq!(stats.failed, 1);
        assert!(h.notifier.sent.lock().unwrap().is_empty());
        let stored = h.store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.next_run_at, job.next_run_at);
        assert!(h.store.list_logs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn alert_goes_to_default_chat_with_location() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        due_job(&h.store, "kredi kartı", Some("Izmir")).await;

        h.runner.run_once().await.unwrap();

        let sent = h.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "-100group");
        // Every attempt ties, so the unscoped one wins and the job location is shown.
        assert!(sent[0].1.contains("Query: kredi kartı (Izmir)\n"));
        assert!(sent[0].1.contains("1) Offer 1\n   └ https://www.offer1.com/"));

        let calls = h.backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.device == Device::Mobile));

        assert_eq!(h.store.list_logs(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn job_override_chat_wins() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        let job = NewJob {
            query: "araç sigortası".to_string(),
            interval_minutes: 60,
            location: None,
            device: Device::Desktop,
            notify_chat_id: Some("777".to_string()),
        };
        h.store
            .insert_job(&job, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        h.runner.run_once().await.unwrap();
        assert_eq!(h.notifier.sent.lock().unwrap()[0].0, "777");
    }

    #[tokio::test]
    async fn no_ads_means_no_alert_but_job_advances() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        let job = due_job(&h.store, "quiet", None).await;

        let stats = h.runner.run_once().await.unwrap();

        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.notified, 0);
        assert!(h.notifier.sent.lock().unwrap().is_empty());
        let stored = h.store.get_job(job.id).await.unwrap().unwrap();
        assert!(stored.next_run_at > Utc::now());
    }

    #[tokio::test]
    async fn notifier_failure_keeps_job_due() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let h = harness(QueryBackend::default(), notifier).await;
        let job = due_job(&h.store, "kredi kartı", None).await;

        let stats = h.runner.run_once().await.unwrap();

        assert_eq!(stats.failed, 1);
        let stored = h.store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.next_run_at, job.next_run_at);
    }

    #[tokio::test]
    async fn second_pass_finds_nothing_due() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        due_job(&h.store, "kredi kartı", None).await;

        let (a, b) = tokio::join!(h.runner.run_once(), h.runner.run_once());
        let total = a.unwrap().due + b.unwrap().due;

        assert_eq!(total, 1);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn triggered_run_completes_in_background() {
        let h = harness(QueryBackend::default(), RecordingNotifier::default()).await;
        due_job(&h.store, "kredi kartı", None).await;

        h.runner.trigger_run().await.unwrap();
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }
}
