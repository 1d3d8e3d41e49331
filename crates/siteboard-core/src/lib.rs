//! siteboard-core - Core library for siteboard
//!
//! Decision logic for connected websites: onboarding state, sync and
//! subscription gatekeeping, usage aggregation. Navigation is never performed
//! here; outcomes carry an [`Effect`] for the caller.

pub mod api;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod inflight;
pub mod setup;
pub mod store;
pub mod subscription;
pub mod sync;
pub mod usage;

pub use api::{ApiClient, BillingProvider, CheckoutRequest, SessionRedirect, SnapshotSource};
pub use config::SiteboardConfig;
pub use effect::Effect;
pub use error::{CoreError, ErrorSeverity, UserFacingError};
pub use event::{ActionKind, EventBus, SiteEvent};
pub use setup::{needs_setup, setup_prompt, SetupGuide, SetupInstructions, SetupPrompt};
pub use store::{LoadedSnapshot, SnapshotStore};
pub use subscription::{
    manage_action_label, upgrade_offer_for, ManageOutcome, SubscriptionGatekeeper, UpgradeOffer,
    UpgradeOutcome,
};
pub use sync::{PendingSync, SyncGatekeeper, SyncOutcome};
pub use usage::{
    chat_history_url, content_totals, redirect_rate, top_content, usage_summary, utilization,
    AlertLevel, ChatChannel, ContentTotals, UsageSummary,
};

pub use siteboard_types as types;
