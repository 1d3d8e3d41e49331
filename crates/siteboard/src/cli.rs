//! Output formatting for CLI commands
//!
//! Every formatter returns a `String` (table or JSON) so handlers stay thin
//! and output can be tested without a terminal.

use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde_json::json;
use siteboard_core::types::{ContentItem, ContentKind, WebsiteSnapshot};
use siteboard_core::{
    chat_history_url, manage_action_label, redirect_rate, AlertLevel, ChatChannel, ContentTotals,
    ErrorSeverity, SetupPrompt, UpgradeOffer, UsageSummary, UserFacingError,
};

/// Everything `siteboard status` shows
pub struct StatusReport<'a> {
    pub snapshot: &'a WebsiteSnapshot,
    pub needs_setup: bool,
    pub summary: &'a UsageSummary,
    pub totals: &'a ContentTotals,
    /// App origin for chat history links
    pub origin: &'a str,
}

// ============================================================================
// Formatters
// ============================================================================

/// Format website status (human or JSON)
pub fn format_status(report: &StatusReport<'_>, json: bool, no_color: bool) -> String {
    let snapshot = report.snapshot;
    let summary = report.summary;
    let voice_url = chat_history_url(report.origin, &snapshot.id, ChatChannel::Voice);
    let text_url = chat_history_url(report.origin, &snapshot.id, ChatChannel::Text);
    let rate = redirect_rate(&snapshot.stats);

    if json {
        let content: serde_json::Map<String, serde_json::Value> = ContentKind::ALL
            .iter()
            .map(|&kind| {
                let t = report.totals.kind(kind);
                (
                    kind.collection_label().to_string(),
                    json!({ "items": t.items, "aiRedirects": t.ai_redirects }),
                )
            })
            .collect();

        let value = json!({
            "website": snapshot,
            "needsSetup": report.needs_setup,
            "usage": {
                "monthlyQueries": summary.monthly_queries,
                "queryLimit": summary.query_limit,
                "utilization": summary.utilization,
                "remainingQueries": summary.remaining_queries,
                "alertLevel": summary.alert_level.map(alert_label),
            },
            "redirectRate": rate,
            "content": content,
            "chats": { "voice": voice_url, "text": text_url },
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![];
    let title = format!("{} ({})", snapshot.name, snapshot.domain);
    lines.push(title.clone());
    lines.push("=".repeat(title.chars().count()));
    lines.push(format!(
        "Plan:             {}  [{}]",
        snapshot.plan,
        manage_action_label(&snapshot.plan)
    ));
    lines.push(format!("Integration:      {}", snapshot.kind));
    lines.push(format!("Status:           {}", snapshot.status));
    lines.push(format!(
        "Last sync:        {}",
        format_timestamp(snapshot.last_sync.as_ref())
    ));
    if report.needs_setup {
        lines.push(format!(
            "                  Setup required: run `siteboard setup {}`",
            snapshot.id
        ));
    }
    lines.push(String::new());
    lines.push(usage_table(summary, no_color).to_string());
    lines.push(String::new());
    lines.push(format!(
        "AI redirects:     {} of {} this period ({:.1}%)",
        format_count(snapshot.stats.ai_redirects),
        format_count(snapshot.stats.total_redirects),
        rate * 100.0
    ));
    lines.push(format!(
        "Lifetime:         {} AI redirects",
        format_count(snapshot.global_stats.total_ai_redirects)
    ));
    lines.push(format!(
        "Voice chats:      {}  {}",
        format_count(snapshot.global_stats.total_voice_chats),
        voice_url
    ));
    lines.push(format!(
        "Text chats:       {}  {}",
        format_count(snapshot.global_stats.total_text_chats),
        text_url
    ));
    lines.push(String::new());
    lines.push(content_totals_table(report.totals, no_color).to_string());

    lines.join("\n")
}

fn usage_table(summary: &UsageSummary, no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(
        &mut table,
        &["Monthly queries", "Limit", "Usage", "Remaining", "Alert"],
        no_color,
    );

    let usage = summary
        .usage_pct
        .map(|pct| format!("{:.1}%", pct))
        .unwrap_or_else(|| "unknown".to_string());
    let remaining = summary
        .remaining_queries
        .map(format_count)
        .unwrap_or_else(|| "-".to_string());
    let alert = summary.alert_level.map(alert_label).unwrap_or("unknown");

    let mut alert_cell = Cell::new(alert);
    if !no_color {
        if let Some(level) = summary.alert_level {
            alert_cell = alert_cell.fg(alert_color(level));
        }
    }

    table.add_row(Row::from(vec![
        Cell::new(format_count(summary.monthly_queries)),
        Cell::new(summary.query_limit.to_string()),
        Cell::new(usage),
        Cell::new(remaining),
        alert_cell,
    ]));
    table
}

fn content_totals_table(totals: &ContentTotals, no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(&mut table, &["Content", "Items", "AI Redirects"], no_color);

    for kind in ContentKind::ALL {
        let t = totals.kind(kind);
        table.add_row(Row::from(vec![
            kind.collection_label().to_string(),
            t.items.to_string(),
            format_count(t.ai_redirects),
        ]));
    }
    table.add_row(Row::from(vec![
        "Total".to_string(),
        totals.items.to_string(),
        format_count(totals.ai_redirects),
    ]));
    table
}

/// Format content items as table (human) or JSON
pub fn format_content_table(
    items: &[&ContentItem],
    domain: &str,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    }

    if items.is_empty() {
        return "No content synced yet.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(
        &mut table,
        &["Kind", "Title", "AI Redirects", "Updated", "Detail", "URL"],
        no_color,
    );

    for item in items {
        let detail = match item.kind() {
            ContentKind::Product => item.price().map(|p| format!("${}", p)),
            ContentKind::Post => item.author().map(|a| format!("by {}", truncate(a, 20))),
            ContentKind::Page => None,
        }
        .unwrap_or_else(|| "-".to_string());

        table.add_row(Row::from(vec![
            item.kind().to_string(),
            truncate(&item.title, 40),
            format_count(item.ai_redirects),
            item.last_updated.format("%Y-%m-%d").to_string(),
            detail,
            item.public_url(domain),
        ]));
    }

    table.to_string()
}

/// Format onboarding steps for a website that never synced
pub fn format_setup_prompt(prompt: &SetupPrompt, json: bool) -> String {
    let guide = &prompt.guide;

    if json {
        let value = json!({
            "websiteId": prompt.website_id,
            "kind": guide.kind,
            "steps": guide.steps,
            "targetUrl": guide.target_url,
            "callToAction": guide.call_to_action,
            "accessKey": prompt.access_key,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![format!("Connect {} ({})", prompt.website_id, guide.kind)];
    lines.push(String::new());
    for (i, step) in guide.steps.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, step));
    }
    lines.push(String::new());
    lines.push(format!(
        "Access key:  {}",
        prompt.access_key.as_deref().unwrap_or("not issued yet")
    ));
    lines.push(format!("{}: {}", guide.call_to_action, guide.target_url));

    lines.join("\n")
}

/// Format the notice shown when setup is already complete
pub fn format_already_synced(snapshot: &WebsiteSnapshot, json: bool) -> String {
    if json {
        let value = json!({
            "websiteId": snapshot.id,
            "needsSetup": false,
            "lastSync": snapshot.last_sync,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    format!(
        "{} is connected. Last sync: {}",
        snapshot.name,
        format_timestamp(snapshot.last_sync.as_ref())
    )
}

/// Format the Pro upgrade offer
pub fn format_upgrade_offer(offer: &UpgradeOffer, website_id: &str, json: bool) -> String {
    if json {
        let value = json!({
            "outcome": "upgrade_offer",
            "plan": offer.target_plan,
            "headline": offer.headline,
            "perks": offer.perks,
            "callToAction": offer.call_to_action,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![offer.headline.to_string()];
    for perk in &offer.perks {
        lines.push(format!("  - {}", perk));
    }
    lines.push(String::new());
    lines.push(format!(
        "{}: run `siteboard upgrade {}`",
        offer.call_to_action, website_id
    ));
    lines.join("\n")
}

/// JSON line describing the outcome of an action
pub fn format_action_json(outcome: &str, url: Option<&str>) -> String {
    let value = json!({ "outcome": outcome, "url": url });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

/// Error message with its suggestion, if any
pub fn format_user_error(error: &UserFacingError) -> String {
    let prefix = match error.severity {
        ErrorSeverity::Fatal => "Fatal: ",
        ErrorSeverity::Error | ErrorSeverity::Notice => "",
    };
    match &error.suggestion {
        Some(suggestion) => format!("{}{}\n  Suggestion: {}", prefix, error.message, suggestion),
        None => format!("{}{}", prefix, error.message),
    }
}

// ============================================================================
// Utilities
// ============================================================================

fn set_header(table: &mut Table, names: &[&str], no_color: bool) {
    if no_color {
        table.set_header(names.to_vec());
    } else {
        table.set_header(
            names
                .iter()
                .map(|name| Cell::new(name).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

fn alert_label(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Safe => "OK",
        AlertLevel::Warning => "Warning",
        AlertLevel::Critical => "Critical",
        AlertLevel::Exceeded => "Exceeded",
    }
}

fn alert_color(level: AlertLevel) -> Color {
    match level {
        AlertLevel::Safe => Color::Green,
        AlertLevel::Warning => Color::Yellow,
        AlertLevel::Critical => Color::Red,
        AlertLevel::Exceeded => Color::Magenta,
    }
}

fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Thousands-separated count: 50000 -> "50,000"
fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte titles never split mid-character
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use siteboard_core::config::AlertThresholds;
    use siteboard_core::types::{ContentDetails, IntegrationKind, PeriodStats, Plan};
    use siteboard_core::{
        content_totals, setup_prompt, usage_summary, CoreError, ManageOutcome, SetupInstructions,
    };

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn snapshot() -> WebsiteSnapshot {
        let mut s =
            WebsiteSnapshot::new("site_1", "shop.example.com", IntegrationKind::Shopify, Plan::Free);
        s.name = "Shop".to_string();
        s.monthly_queries = 4_600;
        s.query_limit = 5_000;
        s.stats = PeriodStats::new(5, 20);
        s.content.products = vec![ContentItem::new(
            "p1",
            "Blue Mug",
            "/products/blue-mug",
            ts(),
            ContentDetails::Product {
                price: Some("19.99".to_string()),
            },
        )
        .with_ai_redirects(12)];
        s
    }

    fn render_status(s: &WebsiteSnapshot, json: bool) -> String {
        let summary = usage_summary(s, &AlertThresholds::default());
        let totals = content_totals(s);
        let report = StatusReport {
            snapshot: s,
            needs_setup: s.last_sync.is_none(),
            summary: &summary,
            totals: &totals,
            origin: "https://app.example.com",
        };
        format_status(&report, json, true)
    }

    #[test]
    fn test_format_status_text() {
        let output = render_status(&snapshot(), false);
        assert!(output.contains("Shop (shop.example.com)"));
        assert!(output.contains("[Upgrade Plan]"));
        assert!(output.contains("Setup required: run `siteboard setup site_1`"));
        assert!(output.contains("Critical"));
        assert!(output.contains("(25.0%)"));
        assert!(output.contains("https://app.example.com/app/chats?website=site_1&type=voice"));
        assert!(output.contains("Products"));
    }

    #[test]
    fn test_format_status_json() {
        let output = render_status(&snapshot(), true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["needsSetup"], true);
        assert_eq!(value["usage"]["remainingQueries"], 400);
        assert_eq!(value["usage"]["alertLevel"], "Critical");
        assert_eq!(value["redirectRate"], 0.25);
        assert_eq!(value["website"]["monthlyQueries"], 4600);
    }

    #[test]
    fn test_format_status_invalid_quota_is_unknown() {
        let mut s = snapshot();
        s.query_limit = 0;
        let output = render_status(&s, false);
        assert!(output.contains("unknown"));

        let value: serde_json::Value = serde_json::from_str(&render_status(&s, true)).unwrap();
        assert!(value["usage"]["utilization"].is_null());
    }

    #[test]
    fn test_format_content_table() {
        let s = snapshot();
        let items: Vec<_> = s.content.iter().collect();
        let output = format_content_table(&items, &s.domain, false, true);
        assert!(output.contains("Blue Mug"));
        assert!(output.contains("$19.99"));
        assert!(output.contains("https://shop.example.com/products/blue-mug"));
    }

    #[test]
    fn test_format_content_table_empty_and_json() {
        assert!(format_content_table(&[], "x.com", false, false).contains("No content"));

        let s = snapshot();
        let items: Vec<_> = s.content.iter().collect();
        let output = format_content_table(&items, &s.domain, true, false);
        assert!(output.starts_with('['));
        assert!(output.contains("\"type\": \"product\""));
    }

    #[test]
    fn test_format_setup_prompt() {
        let mut s = snapshot();
        s.access_key = Some("abc".to_string());
        let prompt = setup_prompt(&s, &SetupInstructions::default()).unwrap();

        let output = format_setup_prompt(&prompt, false);
        assert!(output.contains("1. Install our Shopify app from the Shopify App Store"));
        assert!(output.contains("Access key:  abc"));
        assert!(output.contains("Install App: https://apps.shopify.com/your-app"));

        let value: serde_json::Value =
            serde_json::from_str(&format_setup_prompt(&prompt, true)).unwrap();
        assert_eq!(value["steps"].as_array().unwrap().len(), 4);
        assert_eq!(value["accessKey"], "abc");
    }

    #[test]
    fn test_format_upgrade_offer() {
        let output = format_upgrade_offer(&UpgradeOffer::pro(), "site_1", false);
        assert!(output.starts_with("Upgrade to Pro"));
        assert!(output.contains("  - 50,000 monthly queries"));
        assert!(output.contains("Upgrade Now - $10/month: run `siteboard upgrade site_1`"));
    }

    #[test]
    fn test_format_already_synced() {
        let mut s = snapshot();
        s.last_sync = Some(ts());
        assert_eq!(
            format_already_synced(&s, false),
            "Shop is connected. Last sync: 2025-03-01 12:00 UTC"
        );
    }

    #[test]
    fn test_format_user_error() {
        let error = UserFacingError {
            message: "Could not reach the server: timeout".to_string(),
            severity: ErrorSeverity::Error,
            suggestion: Some("Retry".to_string()),
        };
        assert_eq!(
            format_user_error(&error),
            "Could not reach the server: timeout\n  Suggestion: Retry"
        );
    }

    #[test]
    fn test_format_busy_and_billing_outcomes() {
        let busy = ManageOutcome::Busy.error("w1").unwrap();
        let user = UserFacingError::from_core_error(&busy);
        assert_eq!(user.severity, ErrorSeverity::Notice);
        assert_eq!(
            format_user_error(&user),
            "An action for w1 is already in progress"
        );

        let failed = ManageOutcome::Failed("No such customer".to_string())
            .error("w1")
            .unwrap();
        assert!(matches!(failed, CoreError::Billing { .. }));
        assert_eq!(
            format_user_error(&UserFacingError::from_core_error(&failed)),
            "No such customer\n  Suggestion: Try again later"
        );
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(50_000), "50,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello world", 20), "hello world");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("café", 10), "café");
        assert_eq!(truncate("café", 3), "ca…");
        assert_eq!(truncate("日本語テスト", 4), "日本語…");
    }
}
