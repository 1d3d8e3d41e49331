//! Usage aggregation: quota utilization, redirect rate, content totals,
//! chat history links
//!
//! Everything here is a pure function of a snapshot. The quota ceiling is
//! advisory, so utilization above 1.0 is a normal value, not an error.

use crate::config::AlertThresholds;
use crate::error::CoreError;
use siteboard_types::{ContentItem, ContentKind, PeriodStats, WebsiteSnapshot};
use std::collections::HashMap;
use tracing::warn;

/// Alert level based on quota usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    /// Usage < warning threshold (green)
    Safe,
    /// Usage >= warning threshold (yellow)
    Warning,
    /// Usage >= critical threshold (red)
    Critical,
    /// Usage >= 100% (magenta)
    Exceeded,
}

/// `monthly_queries / query_limit`
///
/// Fails with `InvalidQuota` when the ceiling is zero or negative instead of
/// producing infinity or NaN.
pub fn utilization(snapshot: &WebsiteSnapshot) -> Result<f64, CoreError> {
    if snapshot.query_limit <= 0 {
        return Err(CoreError::InvalidQuota {
            website_id: snapshot.id.clone(),
            query_limit: snapshot.query_limit,
        });
    }
    Ok(snapshot.monthly_queries as f64 / snapshot.query_limit as f64)
}

/// `ai_redirects / total_redirects`, 0 when there were no redirects
///
/// Clamped to 1.0 if upstream counts are inconsistent.
pub fn redirect_rate(stats: &PeriodStats) -> f64 {
    if stats.total_redirects == 0 {
        return 0.0;
    }
    (stats.ai_redirects as f64 / stats.total_redirects as f64).min(1.0)
}

/// Display-ready quota status
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSummary {
    pub monthly_queries: u64,
    pub query_limit: i64,
    /// `None` when the quota ceiling is invalid (shown as unknown)
    pub utilization: Option<f64>,
    /// Usage percentage (0.0-999.9, clamped for display)
    pub usage_pct: Option<f64>,
    /// Queries left before the ceiling, 0 once exceeded
    pub remaining_queries: Option<u64>,
    pub alert_level: Option<AlertLevel>,
}

/// Calculate quota status for a snapshot
///
/// An invalid ceiling is logged as a data-integrity fault and reported as
/// unknown rather than failing the whole summary.
pub fn usage_summary(snapshot: &WebsiteSnapshot, thresholds: &AlertThresholds) -> UsageSummary {
    let utilization = match utilization(snapshot) {
        Ok(ratio) => Some(ratio),
        Err(e) => {
            warn!(website_id = %snapshot.id, error = %e, "Utilization unavailable");
            None
        }
    };

    let usage_pct = utilization.map(|ratio| (ratio * 100.0).min(999.9));
    let remaining_queries = utilization.map(|_| {
        (snapshot.query_limit as u64).saturating_sub(snapshot.monthly_queries)
    });
    let alert_level = usage_pct.map(|pct| determine_alert_level(pct, thresholds));

    UsageSummary {
        monthly_queries: snapshot.monthly_queries,
        query_limit: snapshot.query_limit,
        utilization,
        usage_pct,
        remaining_queries,
        alert_level,
    }
}

/// Determine alert level from usage percentage and thresholds
fn determine_alert_level(usage_pct: f64, thresholds: &AlertThresholds) -> AlertLevel {
    if usage_pct >= 100.0 {
        AlertLevel::Exceeded
    } else if usage_pct >= thresholds.critical_threshold {
        AlertLevel::Critical
    } else if usage_pct >= thresholds.warning_threshold {
        AlertLevel::Warning
    } else {
        AlertLevel::Safe
    }
}

/// Item count and AI redirects for one content kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTotals {
    pub items: usize,
    pub ai_redirects: u64,
}

/// Per-kind and overall content totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTotals {
    pub by_kind: HashMap<ContentKind, KindTotals>,
    pub items: usize,
    pub ai_redirects: u64,
}

impl ContentTotals {
    pub fn kind(&self, kind: ContentKind) -> KindTotals {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }
}

/// Sum per-item AI redirects by collection
pub fn content_totals(snapshot: &WebsiteSnapshot) -> ContentTotals {
    let mut totals = ContentTotals::default();

    for kind in ContentKind::ALL {
        let items = snapshot.content.items(kind);
        let kind_totals = KindTotals {
            items: items.len(),
            ai_redirects: items.iter().map(|i| i.ai_redirects).sum(),
        };
        totals.items += kind_totals.items;
        totals.ai_redirects += kind_totals.ai_redirects;
        totals.by_kind.insert(kind, kind_totals);
    }

    totals
}

/// Top N items across all collections by AI redirects (ties by title)
pub fn top_content(snapshot: &WebsiteSnapshot, n: usize) -> Vec<&ContentItem> {
    let mut items: Vec<_> = snapshot.content.iter().collect();
    items.sort_by(|a, b| {
        b.ai_redirects
            .cmp(&a.ai_redirects)
            .then_with(|| a.title.cmp(&b.title))
    });
    items.truncate(n);
    items
}

/// Chat session channel of the global counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatChannel {
    Voice,
    Text,
}

impl ChatChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Text => "text",
        }
    }
}

/// Chat history page for one channel of a website, under the app `origin`
pub fn chat_history_url(origin: &str, website_id: &str, channel: ChatChannel) -> String {
    format!(
        "{}/app/chats?website={}&type={}",
        origin.trim_end_matches('/'),
        website_id,
        channel.as_str()
    )
}
