//! Per-page browsing contexts

use crate::browser::{
    BrowserContext, BrowserEngine, BrowserResult, ContextOptions, ResourceType, Viewport,
};
use crate::config::BrowserConfig;
use std::sync::Arc;

/// Opens one isolated browsing context per dispatched URL
#[derive(Clone)]
pub struct ContextFactory {
    engine: Arc<dyn BrowserEngine>,
    options: ContextOptions,
    skip_resources: bool,
}

impl ContextFactory {
    pub fn new(engine: Arc<dyn BrowserEngine>, browser: &BrowserConfig, skip_resources: bool) -> Self {
        Self {
            engine,
            options: ContextOptions {
                user_agent: browser.user_agent.clone(),
                locale: browser.locale.clone(),
                viewport: Viewport {
                    width: browser.viewport_width,
                    height: browser.viewport_height,
                },
            },
            skip_resources,
        }
    }

    /// Creates a fresh context
    ///
    /// With `skip-resources`, image, font, stylesheet and media requests are
    /// aborted before they transfer. Screenshots then render without styles.
    /// If installing the rule fails the context is closed before returning.
    pub async fn create(&self) -> BrowserResult<Box<dyn BrowserContext>> {
        let context = self.engine.new_context(&self.options).await?;

        if self.skip_resources {
            if let Err(e) = context.block_resources(&ResourceType::HEAVY).await {
                let _ = context.close().await;
                return Err(e);
            }
        }

        Ok(context)
    }
}
