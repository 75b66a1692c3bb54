use crate::domain::{AdType, Device};
use crate::entities::{prelude::*, search_logs};
use crate::models::search_log::{NewSearchLog, SearchLog};
use anyhow::Result;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

pub struct SearchLogRepository {
    conn: DatabaseConnection,
}

impl SearchLogRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: search_logs::Model) -> SearchLog {
        SearchLog {
            id: m.id,
            query: m.query,
            has_ads: m.has_ads,
            ads_count: m.ads_count,
            types: AdType::split(&m.types),
            device: m.device.parse().unwrap_or(Device::Desktop),
            gl: m.gl,
            hl: m.hl,
            latency_ms: m.latency_ms,
            created_at: m.created_at,
        }
    }

    pub async fn add(&self, entry: &NewSearchLog) -> Result<i64> {
        let active_model = search_logs::ActiveModel {
            query: Set(entry.query.clone()),
            has_ads: Set(entry.has_ads),
            ads_count: Set(entry.ads_count),
            types: Set(AdType::join(&entry.types)),
            device: Set(entry.device.as_str().to_string()),
            gl: Set(entry.gl.clone()),
            hl: Set(entry.hl.clone()),
            latency_ms: Set(entry.latency_ms),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let res = SearchLogs::insert(active_model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }

    /// Most recent first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<SearchLog>> {
        let rows = SearchLogs::find()
            .order_by_desc(search_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }
}
