//! Cookie/consent overlay dismissal
//!
//! Best effort: matchers are tried in priority order and the first one that
//! clicks something wins. Errors are logged at debug level and otherwise
//! ignored.

use crate::browser::{ClickTarget, Page};
use async_trait::async_trait;
use std::sync::Arc;

/// Common consent-manager accept buttons, most specific first
const DEFAULT_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
    "#CybotCookiebotDialogBodyButtonAccept",
    "#didomi-notice-agree-button",
    ".cc-allow",
    ".cc-accept",
    "#truste-consent-button",
    ".qc-cmp2-summary-buttons button[mode='primary']",
    "[data-testid='uc-accept-all-button']",
    "button[id*='accept'][id*='cookie']",
    "button[class*='accept'][class*='cookie']",
];

/// Visible button texts tried after the selectors
const DEFAULT_TEXTS: &[&str] = &[
    "Accept all",
    "Accept All Cookies",
    "Accept cookies",
    "Allow all",
    "I agree",
    "Agree",
    "Accept",
    "OK",
    "Got it",
    "Alle akzeptieren",
    "Tout accepter",
];

/// A single strategy for dismissing a consent overlay
#[async_trait]
pub trait ConsentMatcher: Send + Sync {
    /// Attempts a dismissal; `Ok(true)` means something was clicked
    async fn try_dismiss(&self, page: &dyn Page) -> crate::browser::BrowserResult<bool>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

#[async_trait]
impl ConsentMatcher for ClickTarget {
    async fn try_dismiss(&self, page: &dyn Page) -> crate::browser::BrowserResult<bool> {
        page.click(self).await
    }

    fn describe(&self) -> String {
        match self {
            ClickTarget::Selector(selector) => format!("selector {}", selector),
            ClickTarget::Text(text) => format!("text \"{}\"", text),
        }
    }
}

/// Ordered list of consent matchers
#[derive(Clone)]
pub struct ConsentDismisser {
    matchers: Vec<Arc<dyn ConsentMatcher>>,
}

impl ConsentDismisser {
    pub fn new(matchers: Vec<Arc<dyn ConsentMatcher>>) -> Self {
        Self { matchers }
    }

    /// A dismisser that never clicks anything
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// Adds a matcher with lower priority than all existing ones
    pub fn with_matcher(mut self, matcher: Arc<dyn ConsentMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Tries each matcher in order, stopping at the first successful click
    ///
    /// Returns whether an overlay was dismissed.
    pub async fn dismiss(&self, page: &dyn Page) -> bool {
        for matcher in &self.matchers {
            match matcher.try_dismiss(page).await {
                Ok(true) => {
                    tracing::debug!("Dismissed consent overlay via {}", matcher.describe());
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!("Consent matcher {} failed: {}", matcher.describe(), e);
                }
            }
        }
        false
    }
}

impl Default for ConsentDismisser {
    fn default() -> Self {
        let selectors = DEFAULT_SELECTORS
            .iter()
            .map(|s| Arc::new(ClickTarget::Selector(s.to_string())) as Arc<dyn ConsentMatcher>);
        let texts = DEFAULT_TEXTS
            .iter()
            .map(|t| Arc::new(ClickTarget::Text(t.to_string())) as Arc<dyn ConsentMatcher>);

        Self::new(selectors.chain(texts).collect())
    }
}
