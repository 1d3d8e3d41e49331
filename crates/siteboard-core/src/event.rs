//! Site events over a tokio broadcast channel
//!
//! Snapshot loads and gatekeeper decisions are published here. The CLI
//! subscribes and logs them; tests use them to observe background billing.

use tokio::sync::broadcast;

/// Gatekept action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Sync,
    Manage,
    Upgrade,
}

/// Events emitted by the store and gatekeepers
#[derive(Debug, Clone, PartialEq)]
pub enum SiteEvent {
    /// A fresh snapshot replaced the previous one
    SnapshotLoaded { website_id: String, needs_setup: bool },
    /// Snapshot fetch failed
    SnapshotFailed { website_id: String, message: String },
    /// Sync handed an install target to the caller
    SyncDispatched { website_id: String, url: String },
    /// A billing collaborator returned a redirect
    BillingRedirect {
        website_id: String,
        action: ActionKind,
        url: String,
    },
    /// A billing collaborator failed
    BillingFailed {
        website_id: String,
        action: ActionKind,
        message: String,
    },
    /// Duplicate in-flight action was rejected
    ActionRejected { website_id: String, action: ActionKind },
}

impl SiteEvent {
    /// Website the event concerns
    pub fn website_id(&self) -> &str {
        match self {
            SiteEvent::SnapshotLoaded { website_id, .. }
            | SiteEvent::SnapshotFailed { website_id, .. }
            | SiteEvent::SyncDispatched { website_id, .. }
            | SiteEvent::BillingRedirect { website_id, .. }
            | SiteEvent::BillingFailed { website_id, .. }
            | SiteEvent::ActionRejected { website_id, .. } => website_id,
        }
    }

    /// Gatekept action behind the event, if any
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            SiteEvent::SyncDispatched { .. } => Some(ActionKind::Sync),
            SiteEvent::BillingRedirect { action, .. }
            | SiteEvent::BillingFailed { action, .. }
            | SiteEvent::ActionRejected { action, .. } => Some(*action),
            SiteEvent::SnapshotLoaded { .. } | SiteEvent::SnapshotFailed { .. } => None,
        }
    }
}

/// Broadcast channel shared by the store and gatekeepers; clones publish to
/// the same subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SiteEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SiteEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}
