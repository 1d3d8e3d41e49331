//! siteboard-types - Shared data types for siteboard
//!
//! This crate contains pure data structures without heavy dependencies.
//! No tokio, no async runtime - just serde-serializable types.
//!
//! Used by:
//! - siteboard-core (decision logic, collaborators)
//! - siteboard (command-line front-end)

pub mod models;

pub use models::{
    ContentCollections, ContentDetails, ContentItem, ContentKind, GlobalStats, IntegrationKind,
    PeriodStats, Plan, SiteStatus, WebsiteSnapshot,
};
