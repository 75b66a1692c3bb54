use crate::config::Config;
use crate::db::Store;
use crate::domain::AdType;

pub async fn cmd_logs(config: &Config, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let logs = store.list_logs(limit.max(1)).await?;

    if logs.is_empty() {
        println!("No checks recorded yet.");
        return Ok(());
    }

    println!("Recent Checks (last {}):", logs.len());
    println!("{:-<70}", "");

    for log in logs {
        let marker = if log.has_ads { "✓" } else { "✗" };
        println!("{} {} ({}, {}/{})", marker, log.query, log.device, log.gl, log.hl);
        println!(
            "  Ads: {} [{}] | {} ms | {}",
            log.ads_count,
            AdType::join(&log.types),
            log.latency_ms,
            log.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
