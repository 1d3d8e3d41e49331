//! HTTP client for the product API
//!
//! Routes (relative to the configured base URL):
//! - `GET  /api/websites/get?id=<id>`  website snapshot
//! - `POST /api/stripe/portal`         billing portal session
//! - `POST /api/stripe/session`        checkout session
//!
//! No retries here: every failure is reported once and left to the user.

use super::{BillingProvider, CheckoutRequest, SessionRedirect, SnapshotSource};
use crate::config::SiteboardConfig;
use crate::error::CoreError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use siteboard_types::WebsiteSnapshot;
use std::time::Duration;
use tracing::{debug, info, warn};

const SNAPSHOT_PATH: &str = "/api/websites/get";
const PORTAL_PATH: &str = "/api/stripe/portal";
const CHECKOUT_PATH: &str = "/api/stripe/session";

const PORTAL_FALLBACK_ERROR: &str = "Failed to create portal session";
const CHECKOUT_FALLBACK_ERROR: &str = "Failed to create checkout session";

/// reqwest-backed implementation of the collaborator traits
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PortalRequest<'a> {
    website_id: &'a str,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::transport("Failed to build HTTP client", e))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SiteboardConfig) -> Result<Self, CoreError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_session<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<SessionRedirect, CoreError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::transport(format!("POST {} failed", path), e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::transport(format!("Failed to read {} response", path), e))?;

        parse_session_response(status, &text, fallback)
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn fetch_snapshot(&self, website_id: &str) -> Result<WebsiteSnapshot, CoreError> {
        debug!(website_id, "Fetching website snapshot");

        let response = self
            .http
            .get(self.endpoint(SNAPSHOT_PATH))
            .query(&[("id", website_id)])
            .send()
            .await
            .map_err(|e| CoreError::transport("Failed to fetch website data", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::transport("Failed to read website data", e))?;

        parse_snapshot_response(website_id, status, &text)
    }
}

#[async_trait]
impl BillingProvider for ApiClient {
    async fn create_portal_session(&self, website_id: &str) -> Result<SessionRedirect, CoreError> {
        info!(website_id, "Creating billing portal session");
        self.post_session(PORTAL_PATH, &PortalRequest { website_id }, PORTAL_FALLBACK_ERROR)
            .await
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<SessionRedirect, CoreError> {
        info!(website_id = %request.website_id, plan = %request.plan, "Creating checkout session");
        self.post_session(CHECKOUT_PATH, request, CHECKOUT_FALLBACK_ERROR)
            .await
    }
}

fn parse_snapshot_response(
    website_id: &str,
    status: StatusCode,
    body: &str,
) -> Result<WebsiteSnapshot, CoreError> {
    if status == StatusCode::NOT_FOUND {
        return Err(CoreError::NotFound {
            website_id: website_id.to_string(),
        });
    }
    if status.is_client_error() {
        warn!(website_id, %status, "Website data request rejected");
        return Err(CoreError::Rejected {
            website_id: website_id.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        warn!(website_id, %status, "Failed to fetch website data");
        return Err(CoreError::Transport {
            message: format!("HTTP {}", status),
            source: None,
        });
    }

    serde_json::from_str(body).map_err(|source| CoreError::Decode {
        website_id: website_id.to_string(),
        message: source.to_string(),
        source,
    })
}

/// Non-2xx or a missing URL is a billing failure carrying the server's message
fn parse_session_response(
    status: StatusCode,
    body: &str,
    fallback: &str,
) -> Result<SessionRedirect, CoreError> {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    let server_error = json
        .get("error")
        .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
        .map(String::from);

    if !status.is_success() {
        warn!(%status, error = ?server_error, "Billing session request failed");
        return Err(CoreError::Billing {
            message: server_error.unwrap_or_else(|| fallback.to_string()),
        });
    }

    match json.get("url").and_then(|u| u.as_str()).filter(|u| !u.is_empty()) {
        Some(url) => Ok(SessionRedirect {
            url: url.to_string(),
        }),
        None => {
            warn!("Billing session response had no redirect URL");
            Err(CoreError::Billing {
                message: server_error.unwrap_or_else(|| fallback.to_string()),
            })
        }
    }
}
