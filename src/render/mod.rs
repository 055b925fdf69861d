//! Page rendering
//!
//! Bookmaker pages are read through a [`Renderer`]. Adapters describe what to
//! do with a page as a [`RenderScript`] (navigate, wait for an element, click,
//! capture some HTML) and [`run_script`] plays it against a fresh session,
//! bounding every step with the same timeout.
//!
//! # Components
//!
//! - `Renderer` / `RenderSession`: the backend contract
//! - `RenderScript` / `RenderAction`: fixed per-page action lists
//! - `HttpRenderer`: the default backend, built on a plain HTTP client

mod http;

pub use http::{build_http_client, HttpRenderer};

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a rendering backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out after {timeout:?} at {url} waiting for {waiting_for}")]
    Timeout {
        url: String,
        waiting_for: String,
        timeout: Duration,
    },

    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("No element matches `{selector}` at {url}")]
    MissingElement { url: String, selector: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Render script captured no HTML")]
    EmptyScript,
}

/// A rendering backend
///
/// Every extraction opens its own session, so backends never share page state
/// between concurrent tasks.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh browsing session
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One browsing session holding the current page
#[async_trait]
pub trait RenderSession: Send {
    /// Loads `url` as the current page
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Waits until an element matching `selector` is present
    ///
    /// Returns `RenderError::Timeout` when `timeout` elapses first.
    async fn wait_ready(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Clicks the first element matching `selector`
    async fn click(&mut self, selector: &str) -> Result<(), RenderError>;

    /// Returns the inner HTML of the first element matching `selector`
    async fn inner_html(&mut self, selector: &str) -> Result<String, RenderError>;
}

/// A single step of a render script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderAction {
    Navigate(String),
    WaitReady(&'static str),
    Click(&'static str),
    Sleep(Duration),
    InnerHtml(&'static str),
}

impl RenderAction {
    /// Human readable description, used in timeout reports
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate(url) => format!("navigation to {}", url),
            Self::WaitReady(selector) | Self::InnerHtml(selector) => selector.to_string(),
            Self::Click(selector) => format!("click on {}", selector),
            Self::Sleep(delay) => format!("{:?} pause", delay),
        }
    }
}

/// An ordered list of render actions for one page
///
/// # Example
///
/// ```
/// use odds_crawler::render::{RenderAction, RenderScript};
///
/// let script = RenderScript::navigate("https://leon.ru/")
///     .wait_ready("div .sport-event-region")
///     .capture("div .sport-event-region");
///
/// assert_eq!(script.actions().len(), 3);
/// assert_eq!(script.actions()[2], RenderAction::InnerHtml("div .sport-event-region"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderScript {
    actions: Vec<RenderAction>,
}

impl RenderScript {
    /// Starts a script by loading `url`
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            actions: vec![RenderAction::Navigate(url.into())],
        }
    }

    pub fn wait_ready(mut self, selector: &'static str) -> Self {
        self.actions.push(RenderAction::WaitReady(selector));
        self
    }

    pub fn click(mut self, selector: &'static str) -> Self {
        self.actions.push(RenderAction::Click(selector));
        self
    }

    pub fn sleep(mut self, delay: Duration) -> Self {
        self.actions.push(RenderAction::Sleep(delay));
        self
    }

    /// Captures the inner HTML of `selector`; the last capture is the script's result
    pub fn capture(mut self, selector: &'static str) -> Self {
        self.actions.push(RenderAction::InnerHtml(selector));
        self
    }

    pub fn actions(&self) -> &[RenderAction] {
        &self.actions
    }
}

/// Plays a script against a fresh session of `renderer`
///
/// Every action except `Sleep` is bounded by `timeout`, so a backend that
/// hangs cannot stall the task running the script.
///
/// # Arguments
///
/// * `renderer` - Backend to open the session on
/// * `script` - Actions to play, in order
/// * `timeout` - Upper bound for each action
///
/// # Returns
///
/// * `Ok(String)` - HTML captured by the last `InnerHtml` action
/// * `Err(RenderError)` - The first failing action's error
pub async fn run_script(
    renderer: &dyn Renderer,
    script: &RenderScript,
    timeout: Duration,
) -> Result<String, RenderError> {
    let mut session = renderer.open().await?;
    let mut current_url = String::new();
    let mut captured = None;

    for action in script.actions() {
        if let RenderAction::Sleep(delay) = action {
            tokio::time::sleep(*delay).await;
            continue;
        }
        if let RenderAction::Navigate(url) = action {
            current_url = url.clone();
        }

        let step = perform(session.as_mut(), action, timeout);
        let output = match tokio::time::timeout(timeout, step).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: current_url,
                    waiting_for: action.describe(),
                    timeout,
                })
            }
        };

        if output.is_some() {
            captured = output;
        }
    }

    captured.ok_or(RenderError::EmptyScript)
}

async fn perform(
    session: &mut dyn RenderSession,
    action: &RenderAction,
    timeout: Duration,
) -> Result<Option<String>, RenderError> {
    match action {
        RenderAction::Navigate(url) => session.navigate(url).await.map(|_| None),
        RenderAction::WaitReady(selector) => {
            session.wait_ready(selector, timeout).await.map(|_| None)
        }
        RenderAction::Click(selector) => session.click(selector).await.map(|_| None),
        RenderAction::InnerHtml(selector) => session.inner_html(selector).await.map(Some),
        RenderAction::Sleep(_) => Ok(None),
    }
}

/// Returns the inner HTML of the first element of `html` matching `selector`
///
/// Parsing happens synchronously; the parsed document never outlives the call.
pub(crate) fn select_inner_html(html: &str, selector: &str) -> Result<Option<String>, RenderError> {
    let selector =
        Selector::parse(selector).map_err(|_| RenderError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);
    let inner = document.select(&selector).next().map(|element| element.inner_html());
    Ok(inner)
}

/// Returns true if any element of `html` matches `selector`
pub(crate) fn has_element(html: &str, selector: &str) -> Result<bool, RenderError> {
    Ok(select_inner_html(html, selector)?.is_some())
}
