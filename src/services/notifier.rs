use crate::clients::telegram::{NotifyError, TelegramClient};
use crate::models::check::CheckResult;

/// Delivers plain-text alerts to a chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// A non-2xx answer is a delivery failure; nothing is retried here.
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

#[async_trait::async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.send_message(chat_id, text).await
    }
}

/// Alert body for a scheduled check that found ads.
#[must_use]
pub fn format_alert(result: &CheckResult, location: Option<&str>) -> String {
    let mut header = format!("🔔 Scheduled alert: ads found!\n\nQuery: {}", result.query);
    if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
        header.push_str(&format!(" ({location})"));
    }
    header.push_str(&format!("\nAd count: {}\n\n--- Ads ---", result.ads_count));

    let lines: Vec<String> = result
        .ads
        .iter()
        .map(|ad| format!("{}) {}\n   └ {}", ad.pos, ad.title, ad.url))
        .collect();

    if lines.is_empty() {
        header
    } else {
        format!("{header}\n{}", lines.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdType, Device, SelectionPolicy};
    use crate::models::check::AdDetail;

    fn result() -> CheckResult {
        CheckResult {
            query: "kredi kartı".to_string(),
            has_ads: true,
            ads_count: 2,
            types: vec![AdType::Search],
            latency_ms: 900,
            gl: "tr".to_string(),
            hl: "tr".to_string(),
            device: Device::Mobile,
            location_used: Some("Izmir, Turkey".to_string()),
            policy: SelectionPolicy::BestOfAll,
            attempts_made: 3,
            ads: vec![
                AdDetail {
                    pos: 1,
                    title: "Bank A".to_string(),
                    url: "https://a.com".to_string(),
                    domain: "a.com".to_string(),
                },
                AdDetail {
                    pos: 2,
                    title: "Bank B".to_string(),
                    url: "https://b.com".to_string(),
                    domain: "b.com".to_string(),
                },
            ],
        }
    }

    #[test]
    fn alert_lists_numbered_ads() {
        let text = format_alert(&result(), Some("Izmir, Turkey"));
        assert_eq!(
            text,
            "🔔 Scheduled alert: ads found!\n\n\
             Query: kredi kartı (Izmir, Turkey)\n\
             Ad count: 2\n\n\
             --- Ads ---\n\
             1) Bank A\n   └ https://a.com\n\n\
             2) Bank B\n   └ https://b.com"
        );
    }

    #[test]
    fn alert_without_location_has_no_parentheses() {
        let text = format_alert(&result(), None);
        assert!(text.contains("Query: kredi kartı\n"));
        assert!(!text.contains('('));
    }
}
