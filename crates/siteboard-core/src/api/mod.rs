//! External collaborators: snapshot retrieval and billing sessions
//!
//! The core depends only on these traits. [`ApiClient`] implements both over
//! the product's HTTP API; tests substitute in-memory fakes.

mod http;

pub use http::ApiClient;

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use siteboard_types::WebsiteSnapshot;

/// Fetches the current snapshot of a website
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// `NotFound` for unknown identifiers, `Transport` for network/5xx failures
    async fn fetch_snapshot(&self, website_id: &str) -> Result<WebsiteSnapshot, CoreError>;
}

/// Creates payment-provider sessions
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_portal_session(&self, website_id: &str) -> Result<SessionRedirect, CoreError>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<SessionRedirect, CoreError>;
}

/// Redirect returned by a billing collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRedirect {
    pub url: String,
}

/// Body of a checkout-session request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub website_id: String,
    pub plan: String,
    /// Contains the provider's `{CHECKOUT_SESSION_ID}` placeholder
    pub success_url: String,
    pub cancel_url: String,
}

/// Placeholder substituted by the payment provider after checkout
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

impl CheckoutRequest {
    /// Checkout for `plan`, with callbacks under the app `origin`
    pub fn new(website_id: &str, plan: &str, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            website_id: website_id.to_string(),
            plan: plan.to_string(),
            success_url: format!(
                "{}/app/websites/new/complete?session_id={}&id={}",
                origin, CHECKOUT_SESSION_PLACEHOLDER, website_id
            ),
            cancel_url: format!(
                "{}/app/websites/website?id={}&canceled=true",
                origin, website_id
            ),
        }
    }
}
