//! Onboarding: whether a website still needs setup, and what to show
//!
//! `needs_setup` is the only trigger for onboarding instructions. It looks at
//! `last_sync` alone; an issued access key does not mean a sync happened.

use crate::config::InstallTargets;
use siteboard_types::{IntegrationKind, WebsiteSnapshot};

/// True iff the website has never completed a sync
pub fn needs_setup(snapshot: &WebsiteSnapshot) -> bool {
    snapshot.last_sync.is_none()
}

/// Onboarding guide for one integration kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupGuide {
    pub kind: IntegrationKind,
    /// Ordered onboarding steps
    pub steps: Vec<String>,
    /// Plugin repository (WordPress) or app marketplace (Shopify) URL
    pub target_url: String,
    /// Label for the button that opens `target_url`
    pub call_to_action: &'static str,
}

/// Read-only onboarding reference data, one guide per supported kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInstructions {
    wordpress: SetupGuide,
    shopify: SetupGuide,
}

impl SetupInstructions {
    pub fn new(targets: &InstallTargets) -> Self {
        Self {
            wordpress: SetupGuide {
                kind: IntegrationKind::WordPress,
                steps: steps(&[
                    "Download and install our WordPress plugin",
                    "Go to plugin settings",
                    "Enter your access key",
                    "Click 'Connect and Sync'",
                ]),
                target_url: targets.wordpress.clone(),
                call_to_action: "Download Plugin",
            },
            shopify: SetupGuide {
                kind: IntegrationKind::Shopify,
                steps: steps(&[
                    "Install our Shopify app from the Shopify App Store",
                    "Go to app settings",
                    "Enter your access key",
                    "Click 'Connect and Sync'",
                ]),
                target_url: targets.shopify.clone(),
                call_to_action: "Install App",
            },
        }
    }

    /// Guide for `kind`, `None` for kinds without an integration
    pub fn for_kind(&self, kind: &IntegrationKind) -> Option<&SetupGuide> {
        match kind {
            IntegrationKind::WordPress => Some(&self.wordpress),
            IntegrationKind::Shopify => Some(&self.shopify),
            IntegrationKind::Other(_) => None,
        }
    }
}

impl Default for SetupInstructions {
    fn default() -> Self {
        Self::new(&InstallTargets::default())
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// What the presentation layer shows during onboarding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPrompt {
    pub website_id: String,
    pub guide: SetupGuide,
    /// Key the user enters in the plugin/app; absent until issued
    pub access_key: Option<String>,
}

/// Build the onboarding prompt for a snapshot
///
/// Returns `None` when the integration kind has no guide.
pub fn setup_prompt(
    snapshot: &WebsiteSnapshot,
    instructions: &SetupInstructions,
) -> Option<SetupPrompt> {
    let guide = instructions.for_kind(&snapshot.kind)?;
    Some(SetupPrompt {
        website_id: snapshot.id.clone(),
        guide: guide.clone(),
        access_key: snapshot.access_key.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use siteboard_types::Plan;

    fn snapshot(kind: IntegrationKind) -> WebsiteSnapshot {
        WebsiteSnapshot::new("w1", "example.com", kind, Plan::Free)
    }

    #[test]
    fn test_needs_setup_tracks_last_sync_only() {
        let mut s = snapshot(IntegrationKind::WordPress);
        assert!(needs_setup(&s));

        s.access_key = Some("abc".to_string());
        assert!(needs_setup(&s), "access key alone does not complete setup");

        s.last_sync = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(!needs_setup(&s));

        s.access_key = None;
        s.plan = Plan::Pro;
        assert!(!needs_setup(&s), "plan and key do not matter once synced");
    }

    #[test]
    fn test_guides_have_single_target_and_ordered_steps() {
        let instructions = SetupInstructions::default();

        let wp = instructions.for_kind(&IntegrationKind::WordPress).unwrap();
        assert_eq!(wp.target_url, "https://wordpress.org/plugins/your-plugin");
        assert_eq!(wp.steps.len(), 4);
        assert_eq!(wp.steps[0], "Download and install our WordPress plugin");
        assert_eq!(wp.call_to_action, "Download Plugin");

        let shop = instructions.for_kind(&IntegrationKind::Shopify).unwrap();
        assert_eq!(shop.target_url, "https://apps.shopify.com/your-app");
        assert_eq!(shop.steps[3], "Click 'Connect and Sync'");
    }

    #[test]
    fn test_setup_prompt_carries_access_key() {
        let mut s = snapshot(IntegrationKind::Shopify);
        s.access_key = Some("abc".to_string());

        let prompt = setup_prompt(&s, &SetupInstructions::default()).unwrap();
        assert_eq!(prompt.website_id, "w1");
        assert_eq!(prompt.access_key.as_deref(), Some("abc"));
        assert_eq!(prompt.guide.kind, IntegrationKind::Shopify);
    }

    #[test]
    fn test_setup_prompt_unknown_kind() {
        let s = snapshot(IntegrationKind::parse("wix"));
        assert!(setup_prompt(&s, &SetupInstructions::default()).is_none());
    }

    #[test]
    fn test_configured_targets_used() {
        let targets = InstallTargets {
            wordpress: "https://wordpress.org/plugins/acme".to_string(),
            shopify: "https://apps.shopify.com/acme".to_string(),
        };
        let instructions = SetupInstructions::new(&targets);
        assert_eq!(
            instructions
                .for_kind(&IntegrationKind::WordPress)
                .unwrap()
                .target_url,
            "https://wordpress.org/plugins/acme"
        );
    }
}
