use crate::config::Config;
use crate::db::{JobStore, Store};
use crate::domain::{Device, JobId};
use crate::constants::jobs;
use crate::models::job::{NewJob, interval_in_bounds};

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

pub async fn cmd_jobs_add(
    config: &Config,
    query: &str,
    interval_minutes: i32,
    device: Device,
    location: Option<String>,
    notify_chat_id: Option<String>,
) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query cannot be empty");
    }
    if !interval_in_bounds(interval_minutes) {
        anyhow::bail!(
            "Interval must be between {} and {} minutes",
            jobs::MIN_INTERVAL_MINUTES,
            jobs::MAX_INTERVAL_MINUTES
        );
    }

    let store = open_store(config).await?;
    let job = store
        .add_job(&NewJob {
            query: query.to_string(),
            interval_minutes,
            location: location.filter(|l| !l.trim().is_empty()),
            device,
            notify_chat_id: notify_chat_id.filter(|c| !c.trim().is_empty()),
        })
        .await?;

    println!("✓ Added job {}: \"{}\" every {} min", job.id, job.query, job.interval_minutes);
    println!("  First run: {}", job.next_run_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

pub async fn cmd_jobs_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let jobs = store.list_jobs().await?;

    if jobs.is_empty() {
        println!("No scheduled jobs.");
        println!();
        println!("Add one with: adcheck jobs add \"credit card\" --interval 30");
        return Ok(());
    }

    println!("Scheduled Jobs ({} total)", jobs.len());
    println!("{:-<70}", "");

    for job in jobs {
        let status = if job.is_active { "🟢" } else { "⏸" };
        println!("{} [{}] {}", status, job.id, job.query);
        println!(
            "  Every {} min | {} | Location: {} | Next: {}",
            job.interval_minutes,
            job.device,
            job.location.as_deref().unwrap_or("-"),
            job.next_run_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

pub async fn cmd_jobs_remove(config: &Config, id: i32) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    if store.delete_job(JobId::new(id)).await? {
        println!("✓ Removed job {id}");
    } else {
        println!("Job {id} not found");
    }
    Ok(())
}

pub async fn cmd_jobs_set_active(config: &Config, id: i32, active: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let action = if active { "Resumed" } else { "Paused" };
    if store.set_job_active(JobId::new(id), active).await? {
        println!("✓ {action} job {id}");
    } else {
        println!("Job {id} not found");
    }
    Ok(())
}
