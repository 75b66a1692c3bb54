use crate::domain::{Device, JobId};
use crate::entities::{prelude::*, scheduled_jobs};
use crate::models::job::{NewJob, ScheduledJob, next_run_after};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, warn};

/// Repository for scheduled job operations
pub struct JobRepository {
    conn: DatabaseConnection,
}

impl JobRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: scheduled_jobs::Model) -> ScheduledJob {
        let device = m.device.parse::<Device>().unwrap_or_else(|e| {
            warn!("Job {} has unreadable device: {}", m.id, e);
            Device::Desktop
        });

        ScheduledJob {
            id: JobId::new(m.id),
            query: m.query,
            interval_minutes: m.interval_minutes,
            location: m.location,
            device,
            notify_chat_id: m.notify_chat_id,
            is_active: m.is_active,
            next_run_at: m.next_run_at,
            created_at: m.created_at,
        }
    }

    pub async fn insert(&self, job: &NewJob, next_run_at: DateTime<Utc>) -> Result<ScheduledJob> {
        let active_model = scheduled_jobs::ActiveModel {
            query: Set(job.query.clone()),
            interval_minutes: Set(job.interval_minutes),
            location: Set(job.location.clone()),
            device: Set(job.device.as_str().to_string()),
            notify_chat_id: Set(job.notify_chat_id.clone()),
            is_active: Set(true),
            next_run_at: Set(next_run_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = ScheduledJobs::insert(active_model)
            .exec_with_returning(&self.conn)
            .await?;

        info!(
            "Added scheduled job {} for '{}' every {}m",
            model.id, model.query, model.interval_minutes
        );
        Ok(Self::map_model(model))
    }

    pub async fn get(&self, id: JobId) -> Result<Option<ScheduledJob>> {
        let row = ScheduledJobs::find_by_id(id.value()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    /// Newest first.
    pub async fn list_all(&self) -> Result<Vec<ScheduledJob>> {
        let rows = ScheduledJobs::find()
            .order_by_desc(scheduled_jobs::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>> {
        let rows = ScheduledJobs::find()
            .filter(scheduled_jobs::Column::IsActive.eq(true))
            .filter(scheduled_jobs::Column::NextRunAt.lte(now))
            .order_by_asc(scheduled_jobs::Column::NextRunAt)
            .order_by_asc(scheduled_jobs::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn update_next_run(
        &self,
        id: JobId,
        interval_minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.set_next_run(id, next_run_after(now, interval_minutes))
            .await
    }

    pub async fn set_next_run(&self, id: JobId, next_run_at: DateTime<Utc>) -> Result<bool> {
        let result = ScheduledJobs::update_many()
            .col_expr(
                scheduled_jobs::Column::NextRunAt,
                sea_orm::sea_query::Expr::value(next_run_at),
            )
            .filter(scheduled_jobs::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_active(&self, id: JobId, active: bool) -> Result<bool> {
        let result = ScheduledJobs::update_many()
            .col_expr(
                scheduled_jobs::Column::IsActive,
                sea_orm::sea_query::Expr::value(active),
            )
            .filter(scheduled_jobs::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn remove(&self, id: JobId) -> Result<bool> {
        let result = ScheduledJobs::delete_by_id(id.value())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
