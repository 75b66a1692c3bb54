use crate::config::Config;
use crate::db::JobStore;
use crate::domain::Device;
use crate::models::check::CheckRequest;
use crate::models::search_log::NewSearchLog;
use crate::state::SharedState;

pub async fn cmd_check(
    config: Config,
    query: &str,
    device: Device,
    location: Option<String>,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let config = state.config().await;

    let request = CheckRequest::new(query, config.search.default_gl, config.search.default_hl)
        .with_device(device)
        .with_location(location.filter(|l| !l.trim().is_empty()));

    let result = state.checker.check_ads(&request).await?;
    state.store.add_log(&NewSearchLog::from(&result)).await?;

    let marker = if result.has_ads { "✓" } else { "✗" };
    println!("{} \"{}\" ({})", marker, result.query, result.device);
    println!("{:-<70}", "");
    println!(
        "Ads: {} | Types: {} | Latency: {} ms",
        result.ads_count,
        if result.types.is_empty() {
            "-".to_string()
        } else {
            crate::domain::AdType::join(&result.types)
        },
        result.latency_ms
    );
    println!(
        "Location used: {} | Attempts: {} ({})",
        result.location_used.as_deref().unwrap_or("none"),
        result.attempts_made,
        result.policy
    );

    for ad in &result.ads {
        println!();
        println!("{}) {}", ad.pos, ad.title);
        println!("   └ {} [{}]", ad.url, ad.domain);
    }

    Ok(())
}
