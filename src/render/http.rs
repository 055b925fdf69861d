//! HTTP rendering backend
//!
//! This module renders pages with a plain HTTP client, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for the page document
//! - Readiness polling by re-fetching the page
//! - Error classification
//!
//! The backend does not execute page scripts. A click only checks that its
//! target exists and keeps the current document, so pages whose content
//! depends on client-side tabs are captured in their server-rendered state.

use crate::config::RendererConfig;
use crate::render::{has_element, select_inner_html, RenderError, RenderSession, Renderer};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The rendering backend configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use odds_crawler::config::RendererConfig;
/// use odds_crawler::render::build_http_client;
///
/// let client = build_http_client(&RendererConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RendererConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that fetches pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    poll_interval: Duration,
}

impl HttpRenderer {
    /// Creates a renderer from the backend configuration
    pub fn new(config: &RendererConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            poll_interval: self.poll_interval,
            url: None,
            document: String::new(),
        }))
    }
}

struct HttpSession {
    client: Client,
    poll_interval: Duration,
    url: Option<String>,
    document: String,
}

impl HttpSession {
    fn current_url(&self) -> Result<&str, RenderError> {
        self.url.as_deref().ok_or_else(|| RenderError::Navigation {
            url: String::new(),
            message: "no page loaded".to_string(),
        })
    }

    fn current_url_or_empty(&self) -> String {
        self.url.clone().unwrap_or_default()
    }
}

/// Fetches a page body, classifying failures
async fn fetch_document(client: &Client, url: &str) -> Result<String, RenderError> {
    let navigation = |message: String| RenderError::Navigation {
        url: url.to_string(),
        message,
    };

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            navigation("Request timeout".to_string())
        } else if e.is_connect() {
            navigation("Connection refused".to_string())
        } else {
            navigation(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(navigation(format!("HTTP {}", status.as_u16())));
    }

    response.text().await.map_err(|e| navigation(e.to_string()))
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        tracing::debug!(url, "Fetching page");
        self.document = fetch_document(&self.client, url).await?;
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn wait_ready(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError> {
        let url = self.current_url()?.to_string();
        // None when the timeout is too large to be a deadline; wait unbounded
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if has_element(&self.document, selector)? {
                return Ok(());
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(RenderError::Timeout {
                            url,
                            waiting_for: selector.to_string(),
                            timeout,
                        });
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };

            tokio::time::sleep(pause).await;
            tracing::trace!(url = %url, selector, "Polling page for readiness");
            self.document = fetch_document(&self.client, &url).await?;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), RenderError> {
        if !has_element(&self.document, selector)? {
            return Err(RenderError::MissingElement {
                url: self.current_url_or_empty(),
                selector: selector.to_string(),
            });
        }

        tracing::debug!(
            url = %self.current_url_or_empty(),
            selector,
            "Static renderer keeps the current document on click"
        );
        Ok(())
    }

    async fn inner_html(&mut self, selector: &str) -> Result<String, RenderError> {
        select_inner_html(&self.document, selector)?.ok_or_else(|| RenderError::MissingElement {
            url: self.current_url_or_empty(),
            selector: selector.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> RendererConfig {
        RendererConfig {
            poll_interval_ms: 50,
            ..RendererConfig::default()
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&RendererConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_navigate_and_capture() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body><div id="x"><b>hi</b></div></body></html>"#),
            )
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();
        let url = format!("{}/list", server.uri());

        session.navigate(&url).await.unwrap();
        session
            .wait_ready("div#x", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(session.inner_html("div#x").await.unwrap(), "<b>hi</b>");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();

        let result = session.navigate(&format!("{}/down", server.uri())).await;
        match result {
            Err(RenderError::Navigation { message, .. }) => assert_eq!(message, "HTTP 503"),
            other => panic!("expected navigation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_ready_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();
        session
            .navigate(&format!("{}/empty", server.uri()))
            .await
            .unwrap();

        let result = session
            .wait_ready("div.never", Duration::from_millis(150))
            .await;
        assert!(matches!(result, Err(RenderError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_wait_ready_with_unrepresentable_deadline_keeps_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body><div class="ready">ok</div></body></html>"#),
            )
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();
        session
            .navigate(&format!("{}/slow", server.uri()))
            .await
            .unwrap();

        session.wait_ready("div.ready", Duration::MAX).await.unwrap();
        assert_eq!(session.inner_html("div.ready").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_click_requires_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body><div data-tab="All">All</div></body></html>"#),
            )
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();
        session.navigate(&server.uri()).await.unwrap();

        assert!(session.click(r#"div[data-tab="All"]"#).await.is_ok());
        assert!(matches!(
            session.click("div.missing").await,
            Err(RenderError::MissingElement { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_before_navigate() {
        let renderer = HttpRenderer::new(&fast_config()).unwrap();
        let mut session = renderer.open().await.unwrap();

        let result = session.wait_ready("body", Duration::from_millis(10)).await;
        assert!(matches!(result, Err(RenderError::Navigation { .. })));
    }
}
