//! Data models for connected websites

pub mod content;
pub mod website;

pub use content::{ContentCollections, ContentDetails, ContentItem, ContentKind};
pub use website::{GlobalStats, IntegrationKind, PeriodStats, Plan, SiteStatus, WebsiteSnapshot};
