//! Static HTTP browser engine
//!
//! Renders pages by fetching the main document over HTTP. Sub-resources are
//! never requested, so resource blocking always holds; scripts never run, so
//! settling is immediate and evaluation/screenshots are unsupported.

use crate::browser::{
    BrowserContext, BrowserEngine, BrowserError, BrowserLauncher, BrowserResult, ClickTarget,
    ContextOptions, NavigationResponse, Page, ResourceType, ScreenshotOptions,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Launcher for [`HttpBrowser`]
#[derive(Debug, Clone, Default)]
pub struct HttpLauncher;

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    async fn launch(&self) -> BrowserResult<Arc<dyn BrowserEngine>> {
        // Building a client up front surfaces TLS backend failures at launch
        Client::builder()
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        tracing::debug!("Launched static HTTP browser engine");
        Ok(Arc::new(HttpBrowser))
    }
}

/// Browser engine that renders static HTML over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpBrowser;

#[async_trait]
impl BrowserEngine for HttpBrowser {
    async fn new_context(&self, options: &ContextOptions) -> BrowserResult<Box<dyn BrowserContext>> {
        let client = build_context_client(options)?;
        Ok(Box::new(HttpContext { client }))
    }

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}

/// Builds the per-context HTTP client
///
/// Each context gets its own client, and therefore its own connection pool;
/// no cookie store is enabled, so no state is shared between contexts.
fn build_context_client(options: &ContextOptions) -> BrowserResult<Client> {
    let mut headers = HeaderMap::new();
    let language = HeaderValue::from_str(&options.locale)
        .map_err(|e| BrowserError::Context(format!("Invalid locale: {}", e)))?;
    headers.insert(ACCEPT_LANGUAGE, language);

    Client::builder()
        .user_agent(options.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| BrowserError::Context(e.to_string()))
}

struct HttpContext {
    client: Client,
}

#[async_trait]
impl BrowserContext for HttpContext {
    async fn block_resources(&self, types: &[ResourceType]) -> BrowserResult<()> {
        // Only the main document is ever fetched, so every type is already blocked
        tracing::trace!("Blocking resource types {:?}", types);
        Ok(())
    }

    async fn new_page(&self) -> BrowserResult<Box<dyn Page>> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            document: Mutex::new(None),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}

/// The document currently loaded in an [`HttpPage`]
struct LoadedDocument {
    body: String,
}

struct HttpPage {
    client: Client,
    document: Mutex<Option<LoadedDocument>>,
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<Option<NavigationResponse>> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrowserError::Timeout {
                        url: url.to_string(),
                        timeout,
                    }
                } else {
                    BrowserError::Navigation {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let navigation = NavigationResponse {
            url: response.url().to_string(),
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };

        // Binary bodies are never downloaded
        let body = if navigation.is_html() {
            response.text().await.map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?
        } else {
            String::new()
        };

        *self.document.lock().await = Some(LoadedDocument { body });

        Ok(Some(navigation))
    }

    async fn wait_for_settle(&self, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.document
            .lock()
            .await
            .as_ref()
            .map(|doc| doc.body.clone())
            .ok_or(BrowserError::NoDocument)
    }

    async fn evaluate(&self, _script: &str) -> BrowserResult<serde_json::Value> {
        Err(BrowserError::Unsupported("script evaluation"))
    }

    async fn click(&self, _target: &ClickTarget) -> BrowserResult<bool> {
        // Static documents have no live overlays to dismiss
        Ok(false)
    }

    async fn screenshot(&self, _options: &ScreenshotOptions) -> BrowserResult<Vec<u8>> {
        Err(BrowserError::Unsupported("screenshots"))
    }
}
