//! Website snapshot model from `GET /api/websites/get?id=<id>`
//!
//! A snapshot is a point-in-time read of one connected website. It is
//! replaced wholesale on every fetch and never patched field by field.

use super::content::ContentCollections;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CMS the website is connected through
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntegrationKind {
    WordPress,
    Shopify,
    /// Anything else, kept verbatim
    Other(String),
}

impl IntegrationKind {
    /// Case-insensitive parse; unknown names become `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "wordpress" => Self::WordPress,
            "shopify" => Self::Shopify,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for IntegrationKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<IntegrationKind> for String {
    fn from(kind: IntegrationKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordPress => f.write_str("WordPress"),
            Self::Shopify => f.write_str("Shopify"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Subscription plan of a website
///
/// Kept open: only `Pro` gates features today, and tiers the server may add
/// later survive a round trip as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Other(String),
}

impl Plan {
    /// Case-insensitive parse; unknown tiers become `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "free" => Self::Free,
            "pro" => Self::Pro,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, Self::Pro)
    }

    /// Wire name used when requesting a checkout for this plan
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Plan {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Plan> for String {
    fn from(plan: Plan) -> Self {
        plan.as_str().to_string()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Website status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(default)]
    pub total_ai_redirects: u64,
    #[serde(default)]
    pub total_voice_chats: u64,
    #[serde(default)]
    pub total_text_chats: u64,
}

/// Redirect statistics for the current period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    #[serde(default)]
    pub ai_redirects: u64,
    #[serde(default)]
    pub total_redirects: u64,
    /// Rate as reported by the server; recompute rather than trust it
    #[serde(default)]
    pub redirect_rate: f64,
}

impl PeriodStats {
    pub fn new(ai_redirects: u64, total_redirects: u64) -> Self {
        Self {
            ai_redirects,
            total_redirects,
            redirect_rate: 0.0,
        }
    }
}

/// Point-in-time state of a connected website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSnapshot {
    pub id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: IntegrationKind,
    #[serde(default)]
    pub plan: Plan,
    pub name: String,
    #[serde(default)]
    pub status: SiteStatus,
    #[serde(default)]
    pub monthly_queries: u64,
    /// Signed so a broken ceiling from the server is representable and rejected later
    pub query_limit: i64,
    /// `None` until the CMS plugin/app completes a first sync
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    /// `None` until onboarding issued a key
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub global_stats: GlobalStats,
    #[serde(default)]
    pub stats: PeriodStats,
    #[serde(default)]
    pub content: ContentCollections,
    /// Payment-provider customer reference
    #[serde(default, rename = "stripeId", skip_serializing_if = "Option::is_none")]
    pub billing_account: Option<String>,
}

impl WebsiteSnapshot {
    /// Minimal never-synced snapshot, mostly useful for tests and fixtures
    pub fn new(
        id: impl Into<String>,
        domain: impl Into<String>,
        kind: IntegrationKind,
        plan: Plan,
    ) -> Self {
        let domain = domain.into();
        Self {
            id: id.into(),
            name: domain.clone(),
            domain,
            kind,
            plan,
            status: SiteStatus::Active,
            monthly_queries: 0,
            query_limit: 1,
            last_sync: None,
            access_key: None,
            global_stats: GlobalStats::default(),
            stats: PeriodStats::default(),
            content: ContentCollections::default(),
            billing_account: None,
        }
    }

    pub fn has_access_key(&self) -> bool {
        self.access_key.is_some()
    }

    pub fn has_synced(&self) -> bool {
        self.last_sync.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;

    const SNAPSHOT_JSON: &str = r#"{
        "id": "site_123",
        "domain": "shop.example.com",
        "type": "shopify",
        "plan": "Free",
        "name": "Example Shop",
        "status": "active",
        "monthlyQueries": 2500,
        "queryLimit": 5000,
        "lastSync": null,
        "accessKey": "abc",
        "globalStats": { "totalAiRedirects": 120, "totalVoiceChats": 4, "totalTextChats": 31 },
        "stats": { "aiRedirects": 5, "totalRedirects": 20, "redirectRate": 0.25 },
        "content": {
            "products": [
                { "id": "p1", "title": "Mug", "url": "/products/mug", "type": "product",
                  "lastUpdated": "2025-01-10T08:00:00Z", "aiRedirects": 7, "price": "9.00" }
            ],
            "blogPosts": [],
            "pages": []
        }
    }"#;

    #[test]
    fn test_deserialize_snapshot() {
        let snapshot: WebsiteSnapshot = serde_json::from_str(SNAPSHOT_JSON).unwrap();

        assert_eq!(snapshot.id, "site_123");
        assert_eq!(snapshot.kind, IntegrationKind::Shopify);
        assert_eq!(snapshot.plan, Plan::Free);
        assert_eq!(snapshot.status, SiteStatus::Active);
        assert_eq!(snapshot.monthly_queries, 2500);
        assert_eq!(snapshot.query_limit, 5000);
        assert!(snapshot.last_sync.is_none());
        assert_eq!(snapshot.access_key.as_deref(), Some("abc"));
        assert_eq!(snapshot.global_stats.total_text_chats, 31);
        assert_eq!(snapshot.stats.total_redirects, 20);
        assert_eq!(snapshot.content.items(ContentKind::Product).len(), 1);
        assert!(snapshot.billing_account.is_none());
    }

    #[test]
    fn test_snapshot_with_sync_and_billing() {
        let json = SNAPSHOT_JSON
            .replace(r#""lastSync": null"#, r#""lastSync": "2025-01-12T09:30:00.000Z""#)
            .replace(r#""plan": "Free""#, r#""plan": "Pro", "stripeId": "cus_42""#);
        let snapshot: WebsiteSnapshot = serde_json::from_str(&json).unwrap();

        assert!(snapshot.has_synced());
        assert!(snapshot.plan.is_pro());
        assert_eq!(snapshot.billing_account.as_deref(), Some("cus_42"));
    }

    #[test]
    fn test_integration_kind_parse() {
        assert_eq!(IntegrationKind::parse("WordPress"), IntegrationKind::WordPress);
        assert_eq!(IntegrationKind::parse("wordpress"), IntegrationKind::WordPress);
        assert_eq!(IntegrationKind::parse("SHOPIFY"), IntegrationKind::Shopify);
        assert_eq!(
            IntegrationKind::parse("wix"),
            IntegrationKind::Other("wix".to_string())
        );
        assert!(!IntegrationKind::parse("wix").is_known());
    }

    #[test]
    fn test_plan_is_open() {
        assert_eq!(Plan::parse("Pro"), Plan::Pro);
        assert_eq!(Plan::parse("free"), Plan::Free);
        let business = Plan::parse("Business");
        assert_eq!(business, Plan::Other("Business".to_string()));
        assert!(!business.is_pro());

        let json = serde_json::to_string(&business).unwrap();
        assert_eq!(json, r#""Business""#);
    }
}
