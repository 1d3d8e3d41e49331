//! Navigation effects returned to the caller
//!
//! The core never navigates. Outcomes carry an `Effect` and the presentation
//! layer decides how to perform it.

use std::fmt;

/// A navigation command for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open in a new context (tab/browser), fire-and-forget
    OpenExternal(String),
    /// Replace the current location
    NavigateTo(String),
}

impl Effect {
    pub fn url(&self) -> &str {
        match self {
            Effect::OpenExternal(url) | Effect::NavigateTo(url) => url,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::OpenExternal(url) => write!(f, "open {}", url),
            Effect::NavigateTo(url) => write!(f, "navigate to {}", url),
        }
    }
}
