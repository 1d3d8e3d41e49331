//! Sync gatekeeping
//!
//! A sync request never pulls content itself. With an access key present it
//! hands the caller the install target of the website's integration kind;
//! the CMS plugin/app pushes content, and completion only shows up later as
//! a newer `last_sync` on a fresh snapshot.

use crate::effect::Effect;
use crate::error::CoreError;
use crate::event::{ActionKind, EventBus, SiteEvent};
use crate::inflight::{InFlightPermit, InFlightRegistry};
use crate::setup::SetupInstructions;
use siteboard_types::WebsiteSnapshot;
use tracing::{debug, info, warn};

/// Failure reason for kinds without an integration
pub const UNSUPPORTED_KIND: &str = "unsupported integration kind";

/// Result of a sync request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No access key: show setup instructions, nothing else happens
    NeedsSetup,
    /// Open the install target in a new context
    Dispatched(Effect),
    Failed(String),
    /// A sync for this website is already being handled
    Busy,
}

impl SyncOutcome {
    pub fn effect(&self) -> Option<&Effect> {
        match self {
            SyncOutcome::Dispatched(effect) => Some(effect),
            _ => None,
        }
    }

    /// Error behind a `Busy` or `Failed` outcome for `snapshot`
    pub fn error(&self, snapshot: &WebsiteSnapshot) -> Option<CoreError> {
        match self {
            SyncOutcome::Busy => Some(CoreError::Busy {
                website_id: snapshot.id.clone(),
            }),
            SyncOutcome::Failed(_) => Some(CoreError::Unsupported {
                kind: snapshot.kind.to_string(),
            }),
            SyncOutcome::NeedsSetup | SyncOutcome::Dispatched(_) => None,
        }
    }
}

/// A resolved sync that keeps its website marked in flight until dropped
/// or completed, so the caller can act on the effect before another
/// request for the same website is accepted
#[derive(Debug)]
#[must_use = "the website stays busy until the pending sync is completed or dropped"]
pub struct PendingSync {
    outcome: SyncOutcome,
    permit: Option<InFlightPermit>,
}

impl PendingSync {
    pub fn outcome(&self) -> &SyncOutcome {
        &self.outcome
    }

    pub fn holds_permit(&self) -> bool {
        self.permit.is_some()
    }

    /// Release the website and return the outcome
    pub fn complete(self) -> SyncOutcome {
        self.outcome
    }
}

/// Decides whether a sync/connect action may proceed
pub struct SyncGatekeeper {
    instructions: SetupInstructions,
    in_flight: InFlightRegistry,
    event_bus: EventBus,
}

impl SyncGatekeeper {
    pub fn new(instructions: SetupInstructions, event_bus: EventBus) -> Self {
        Self {
            instructions,
            in_flight: InFlightRegistry::new(),
            event_bus,
        }
    }

    /// Resolve a sync request, keeping the website in flight while the
    /// returned `PendingSync` is alive
    pub fn begin_sync(&self, snapshot: &WebsiteSnapshot) -> PendingSync {
        let Some(permit) = self.in_flight.try_acquire(&snapshot.id) else {
            debug!(website_id = %snapshot.id, "Sync already in flight");
            self.event_bus.publish(SiteEvent::ActionRejected {
                website_id: snapshot.id.clone(),
                action: ActionKind::Sync,
            });
            return PendingSync {
                outcome: SyncOutcome::Busy,
                permit: None,
            };
        };

        let outcome = self.resolve(snapshot);
        PendingSync {
            outcome,
            permit: Some(permit),
        }
    }

    /// One-shot form of [`begin_sync`](Self::begin_sync)
    pub fn request_sync(&self, snapshot: &WebsiteSnapshot) -> SyncOutcome {
        self.begin_sync(snapshot).complete()
    }

    pub fn is_busy(&self, website_id: &str) -> bool {
        self.in_flight.is_busy(website_id)
    }

    fn resolve(&self, snapshot: &WebsiteSnapshot) -> SyncOutcome {
        if !snapshot.has_access_key() {
            info!(website_id = %snapshot.id, "Sync requested without access key, setup required");
            return SyncOutcome::NeedsSetup;
        }

        match self.install_target(snapshot) {
            Ok(url) => {
                info!(website_id = %snapshot.id, kind = %snapshot.kind, %url, "Sync dispatched");
                self.event_bus.publish(SiteEvent::SyncDispatched {
                    website_id: snapshot.id.clone(),
                    url: url.clone(),
                });
                SyncOutcome::Dispatched(Effect::OpenExternal(url))
            }
            Err(e) => {
                warn!(website_id = %snapshot.id, error = %e, "Sync refused");
                SyncOutcome::Failed(UNSUPPORTED_KIND.to_string())
            }
        }
    }

    fn install_target(&self, snapshot: &WebsiteSnapshot) -> Result<String, CoreError> {
        self.instructions
            .for_kind(&snapshot.kind)
            .map(|guide| guide.target_url.clone())
            .ok_or_else(|| CoreError::Unsupported {
                kind: snapshot.kind.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteboard_types::{IntegrationKind, Plan};

    fn gatekeeper() -> SyncGatekeeper {
        SyncGatekeeper::new(SetupInstructions::default(), EventBus::default())
    }

    fn snapshot(kind: &str, access_key: Option<&str>) -> WebsiteSnapshot {
        let mut s = WebsiteSnapshot::new("w1", "example.com", IntegrationKind::parse(kind), Plan::Free);
        s.access_key = access_key.map(String::from);
        s
    }

    #[test]
    fn test_no_access_key_needs_setup() {
        let gk = gatekeeper();
        for kind in ["wordpress", "shopify", "wix"] {
            let outcome = gk.request_sync(&snapshot(kind, None));
            assert_eq!(outcome, SyncOutcome::NeedsSetup);
            assert!(outcome.effect().is_none());
        }
    }

    #[test]
    fn test_wordpress_dispatches_plugin_url() {
        let outcome = gatekeeper().request_sync(&snapshot("WordPress", Some("key")));
        assert_eq!(
            outcome,
            SyncOutcome::Dispatched(Effect::OpenExternal(
                "https://wordpress.org/plugins/your-plugin".to_string()
            ))
        );
    }

    #[test]
    fn test_shopify_dispatches_app_url_case_insensitive() {
        let outcome = gatekeeper().request_sync(&snapshot("SHOPIFY", Some("key")));
        assert_eq!(
            outcome.effect(),
            Some(&Effect::OpenExternal("https://apps.shopify.com/your-app".to_string()))
        );
    }

    #[test]
    fn test_unknown_kind_fails() {
        let outcome = gatekeeper().request_sync(&snapshot("squarespace", Some("key")));
        assert_eq!(outcome, SyncOutcome::Failed(UNSUPPORTED_KIND.to_string()));
    }

    #[test]
    fn test_outcome_errors() {
        let gk = gatekeeper();
        let wix = snapshot("wix", Some("key"));

        let failed = gk.request_sync(&wix);
        assert!(matches!(
            failed.error(&wix),
            Some(CoreError::Unsupported { ref kind }) if kind == "wix"
        ));

        let shopify = snapshot("shopify", Some("key"));
        let _pending = gk.begin_sync(&shopify);
        let busy = gk.request_sync(&shopify);
        let err = busy.error(&shopify).unwrap();
        assert!(matches!(err, CoreError::Busy { ref website_id } if website_id == "w1"));
        assert_eq!(err.severity(), crate::error::ErrorSeverity::Notice);

        assert!(SyncOutcome::NeedsSetup.error(&shopify).is_none());
    }

    #[test]
    fn test_pending_sync_rejects_duplicate() {
        let gk = gatekeeper();
        let s = snapshot("shopify", Some("key"));

        let first = gk.begin_sync(&s);
        assert!(first.holds_permit());
        assert!(gk.is_busy("w1"));

        let second = gk.request_sync(&s);
        assert_eq!(second, SyncOutcome::Busy);

        assert!(matches!(first.complete(), SyncOutcome::Dispatched(_)));
        assert!(!gk.is_busy("w1"));
        assert!(matches!(gk.request_sync(&s), SyncOutcome::Dispatched(_)));
    }

    #[test]
    fn test_other_website_not_blocked() {
        let gk = gatekeeper();
        let a = snapshot("shopify", Some("key"));
        let mut b = snapshot("wordpress", Some("key"));
        b.id = "w2".to_string();

        let _pending = gk.begin_sync(&a);
        assert!(matches!(gk.request_sync(&b), SyncOutcome::Dispatched(_)));
    }

    #[tokio::test]
    async fn test_dispatch_and_rejection_published() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let gk = SyncGatekeeper::new(SetupInstructions::default(), bus);
        let s = snapshot("shopify", Some("key"));

        let pending = gk.begin_sync(&s);
        let _ = gk.request_sync(&s);
        drop(pending);

        assert!(matches!(rx.recv().await.unwrap(), SiteEvent::SyncDispatched { .. }));
        assert!(matches!(
            rx.recv().await.unwrap(),
            SiteEvent::ActionRejected { action: ActionKind::Sync, .. }
        ));
    }
}
