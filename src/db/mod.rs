use crate::domain::JobId;
use crate::models::job::{NewJob, ScheduledJob};
use crate::models::search_log::{NewSearchLog, SearchLog};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// What the scheduler runtime and the API layer need from persistence.
///
/// Every call is a short, independent operation; the database serializes
/// concurrent writers coming from the loop, the trigger endpoint and the
/// on-demand path.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Active jobs with `next_run_at <= now`, oldest due first.
    async fn get_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>>;

    /// Sets `next_run_at = now + interval_minutes`.
    async fn update_next_run(
        &self,
        id: JobId,
        interval_minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn add_job(&self, job: &NewJob) -> Result<ScheduledJob>;

    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>>;

    /// `false` when no such job exists.
    async fn delete_job(&self, id: JobId) -> Result<bool>;

    async fn add_log(&self, entry: &NewSearchLog) -> Result<()>;
}

/// Database file behind a `sqlite:` URL, `None` for in-memory databases.
///
/// Only SQLite is compiled in, so any other scheme is rejected before the
/// filesystem is touched.
pub fn sqlite_file(db_url: &str) -> Result<Option<&Path>> {
    let Some(rest) = db_url.strip_prefix("sqlite:") else {
        let scheme = db_url.split_once(':').map_or("(none)", |(scheme, _)| scheme);
        anyhow::bail!("Unsupported database URL scheme '{scheme}': only sqlite: URLs are supported");
    };

    let path = rest.trim_start_matches("//");
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    if path.is_empty() || path == ":memory:" || db_url.contains("mode=memory") {
        return Ok(None);
    }
    Ok(Some(Path::new(path)))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let file = sqlite_file(db_url)?;
        // Every pooled connection to an in-memory SQLite URL opens its own
        // empty database.
        let (max_connections, min_connections) = if file.is_none() {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if let Some(path) = file {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !path.exists() {
                std::fs::File::create(path)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn job_repo(&self) -> repositories::jobs::JobRepository {
        repositories::jobs::JobRepository::new(self.conn.clone())
    }

    fn log_repo(&self) -> repositories::search_logs::SearchLogRepository {
        repositories::search_logs::SearchLogRepository::new(self.conn.clone())
    }

    /// Inserts a job with an explicit first run time.
    pub async fn insert_job(
        &self,
        job: &NewJob,
        next_run_at: DateTime<Utc>,
    ) -> Result<ScheduledJob> {
        self.job_repo().insert(job, next_run_at).await
    }

    pub async fn get_job(&self, id: JobId) -> Result<Option<ScheduledJob>> {
        self.job_repo().get(id).await
    }

    pub async fn set_job_active(&self, id: JobId, active: bool) -> Result<bool> {
        self.job_repo().set_active(id, active).await
    }

    pub async fn list_logs(&self, limit: u64) -> Result<Vec<SearchLog>> {
        self.log_repo().recent(limit).await
    }
}

#[async_trait::async_trait]
impl JobStore for Store {
    async fn get_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>> {
        self.job_repo().due(now).await
    }

    async fn update_next_run(
        &self,
        id: JobId,
        interval_minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.job_repo()
            .update_next_run(id, interval_minutes, now)
            .await?;
        Ok(())
    }

    async fn add_job(&self, job: &NewJob) -> Result<ScheduledJob> {
        self.insert_job(job, job.first_run_at(Utc::now())).await
    }

    async fn list_jobs(&self) -> Result<Vec<ScheduledJob>> {
        self.job_repo().list_all().await
    }

    async fn delete_job(&self, id: JobId) -> Result<bool> {
        self.job_repo().remove(id).await
    }

    async fn add_log(&self, entry: &NewSearchLog) -> Result<()> {
        self.log_repo().add(entry).await?;
        Ok(())
    }
}
