//! At-most-one-in-flight registry keyed by website identifier
//!
//! Uses a DashSet so unrelated identifiers never contend on a shared lock.
//! A permit releases its identifier on drop.

use dashmap::DashSet;
use std::sync::Arc;
use tracing::debug;

/// Identifiers with an action currently in flight
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<DashSet<String>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `website_id`, or `None` if an action is already running for it
    pub fn try_acquire(&self, website_id: &str) -> Option<InFlightPermit> {
        if self.active.insert(website_id.to_string()) {
            debug!(website_id, "Action marked in flight");
            Some(InFlightPermit {
                active: Arc::clone(&self.active),
                website_id: website_id.to_string(),
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, website_id: &str) -> bool {
        self.active.contains(website_id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Proof that an action holds its website identifier
#[derive(Debug)]
pub struct InFlightPermit {
    active: Arc<DashSet<String>>,
    website_id: String,
}

impl InFlightPermit {
    pub fn website_id(&self) -> &str {
        &self.website_id
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.active.remove(&self.website_id);
        debug!(website_id = %self.website_id, "Action released");
    }
}
