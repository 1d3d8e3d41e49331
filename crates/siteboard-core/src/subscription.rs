//! Subscription gatekeeping: billing portal for Pro, upgrade flow otherwise
//!
//! Billing calls run on a spawned task that owns the in-flight permit. If the
//! caller gives up on the future, the call still runs to completion and the
//! website stays busy until it does, so a second billing session can't be
//! opened behind it.

use crate::api::{BillingProvider, CheckoutRequest, SessionRedirect};
use crate::effect::Effect;
use crate::error::CoreError;
use crate::event::{ActionKind, EventBus, SiteEvent};
use crate::inflight::{InFlightPermit, InFlightRegistry};
use siteboard_types::{Plan, WebsiteSnapshot};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What upgrading to Pro offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOffer {
    pub target_plan: Plan,
    pub headline: &'static str,
    pub perks: Vec<&'static str>,
    pub call_to_action: &'static str,
}

impl UpgradeOffer {
    pub fn pro() -> Self {
        Self {
            target_plan: Plan::Pro,
            headline: "Upgrade to Pro",
            perks: vec![
                "50,000 monthly queries",
                "Priority support",
                "Advanced analytics",
            ],
            call_to_action: "Upgrade Now - $10/month",
        }
    }
}

/// Upgrade offer to present for `snapshot`, never for a Pro website
pub fn upgrade_offer_for(snapshot: &WebsiteSnapshot) -> Option<UpgradeOffer> {
    (!snapshot.plan.is_pro()).then(UpgradeOffer::pro)
}

/// Label of the subscription button for `plan`
pub fn manage_action_label(plan: &Plan) -> &'static str {
    if plan.is_pro() {
        "Manage Subscription"
    } else {
        "Upgrade Plan"
    }
}

/// Result of a "manage subscription" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageOutcome {
    /// Redirect to the billing portal
    OpenPortal(String),
    /// Non-Pro website: present the offer; purchase is a separate request
    ShowUpgradeOffer(UpgradeOffer),
    /// Billing collaborator failed; do not navigate
    Failed(String),
    Busy,
}

impl ManageOutcome {
    pub fn effect(&self) -> Option<Effect> {
        match self {
            ManageOutcome::OpenPortal(url) => Some(Effect::NavigateTo(url.clone())),
            _ => None,
        }
    }

    /// Error behind a `Busy` or `Failed` outcome
    pub fn error(&self, website_id: &str) -> Option<CoreError> {
        match self {
            ManageOutcome::Busy => Some(busy(website_id)),
            ManageOutcome::Failed(message) => Some(billing_failure(message)),
            ManageOutcome::OpenPortal(_) | ManageOutcome::ShowUpgradeOffer(_) => None,
        }
    }
}

/// Result of an upgrade purchase request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Redirect to the checkout page
    OpenCheckout(String),
    /// The website is already Pro; no checkout was created
    AlreadyPro,
    /// Billing collaborator failed; do not navigate
    Failed(String),
    Busy,
}

impl UpgradeOutcome {
    pub fn effect(&self) -> Option<Effect> {
        match self {
            UpgradeOutcome::OpenCheckout(url) => Some(Effect::NavigateTo(url.clone())),
            _ => None,
        }
    }

    /// Error behind a `Busy` or `Failed` outcome
    pub fn error(&self, website_id: &str) -> Option<CoreError> {
        match self {
            UpgradeOutcome::Busy => Some(busy(website_id)),
            UpgradeOutcome::Failed(message) => Some(billing_failure(message)),
            UpgradeOutcome::OpenCheckout(_) | UpgradeOutcome::AlreadyPro => None,
        }
    }
}

fn busy(website_id: &str) -> CoreError {
    CoreError::Busy {
        website_id: website_id.to_string(),
    }
}

fn billing_failure(message: &str) -> CoreError {
    CoreError::Billing {
        message: message.to_string(),
    }
}

/// Decides between billing portal and upgrade flow based on plan tier
pub struct SubscriptionGatekeeper {
    billing: Arc<dyn BillingProvider>,
    app_origin: String,
    in_flight: InFlightRegistry,
    event_bus: EventBus,
}

impl SubscriptionGatekeeper {
    pub fn new(
        billing: Arc<dyn BillingProvider>,
        app_origin: impl Into<String>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            billing,
            app_origin: app_origin.into(),
            in_flight: InFlightRegistry::new(),
            event_bus,
        }
    }

    pub fn is_busy(&self, website_id: &str) -> bool {
        self.in_flight.is_busy(website_id)
    }

    /// Pro: create a portal session. Otherwise: show the upgrade offer
    /// without calling any external service.
    pub async fn request_manage(&self, snapshot: &WebsiteSnapshot) -> ManageOutcome {
        let Some(permit) = self.acquire(&snapshot.id, ActionKind::Manage) else {
            return ManageOutcome::Busy;
        };

        if !snapshot.plan.is_pro() {
            debug!(website_id = %snapshot.id, plan = %snapshot.plan, "Showing upgrade offer");
            return ManageOutcome::ShowUpgradeOffer(UpgradeOffer::pro());
        }

        let billing = Arc::clone(&self.billing);
        let website_id = snapshot.id.clone();
        let result = self
            .run_billing(permit, ActionKind::Manage, async move {
                billing.create_portal_session(&website_id).await
            })
            .await;

        match result {
            Ok(redirect) => ManageOutcome::OpenPortal(redirect.url),
            Err(message) => ManageOutcome::Failed(message),
        }
    }

    /// Start a Pro checkout. Refused for websites already on Pro.
    pub async fn request_upgrade(&self, snapshot: &WebsiteSnapshot) -> UpgradeOutcome {
        if snapshot.plan.is_pro() {
            info!(website_id = %snapshot.id, "Upgrade refused, website already on Pro");
            return UpgradeOutcome::AlreadyPro;
        }

        let Some(permit) = self.acquire(&snapshot.id, ActionKind::Upgrade) else {
            return UpgradeOutcome::Busy;
        };

        let billing = Arc::clone(&self.billing);
        let request = CheckoutRequest::new(&snapshot.id, Plan::Pro.as_str(), &self.app_origin);
        let result = self
            .run_billing(permit, ActionKind::Upgrade, async move {
                billing.create_checkout_session(&request).await
            })
            .await;

        match result {
            Ok(redirect) => UpgradeOutcome::OpenCheckout(redirect.url),
            Err(message) => UpgradeOutcome::Failed(message),
        }
    }

    fn acquire(&self, website_id: &str, action: ActionKind) -> Option<InFlightPermit> {
        let permit = self.in_flight.try_acquire(website_id);
        if permit.is_none() {
            debug!(website_id, ?action, "Billing action already in flight");
            self.event_bus.publish(SiteEvent::ActionRejected {
                website_id: website_id.to_string(),
                action,
            });
        }
        permit
    }

    /// Run a collaborator call on its own task, holding `permit` until it ends
    async fn run_billing<F>(
        &self,
        permit: InFlightPermit,
        action: ActionKind,
        call: F,
    ) -> Result<SessionRedirect, String>
    where
        F: Future<Output = Result<SessionRedirect, CoreError>> + Send + 'static,
    {
        let event_bus = self.event_bus.clone();
        let task = tokio::spawn(async move {
            let website_id = permit.website_id().to_string();
            let result = call.await;
            drop(permit);

            match &result {
                Ok(redirect) => {
                    info!(%website_id, ?action, "Billing redirect issued");
                    event_bus.publish(SiteEvent::BillingRedirect {
                        website_id,
                        action,
                        url: redirect.url.clone(),
                    });
                }
                Err(e) => {
                    warn!(%website_id, ?action, error = %e, "Billing request failed");
                    event_bus.publish(SiteEvent::BillingFailed {
                        website_id,
                        action,
                        message: e.to_string(),
                    });
                }
            }
            result
        });

        match task.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => {
                warn!(error = %e, "Billing task did not complete");
                Err("Billing request was interrupted".to_string())
            }
        }
    }
}
