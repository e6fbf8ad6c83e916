pub mod error;

pub use error::{BrowserlessError, Result};

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Chromium flag that hides `navigator.webdriver` and related automation hints.
pub const ANTI_AUTOMATION_ARG: &str = "--disable-blink-features=AutomationControlled";

/// Extra time the HTTP call may take beyond the page timeout itself.
const REQUEST_MARGIN: Duration = Duration::from_secs(15);

/// How a page should be loaded and when it counts as ready.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Overall navigation timeout.
    pub page_timeout: Duration,
    /// CSS selector that must be present before capture.
    pub wait_for_selector: String,
    /// Delay after the selector appears, before the DOM is captured.
    pub settle_delay: Duration,
    pub user_agent: Option<String>,
    pub extra_headers: HashMap<String, String>,
    /// Ask the service to mask automation fingerprints.
    pub stealth: bool,
    /// Extra Chromium launch flags.
    pub launch_args: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(60),
            wait_for_selector: "body".to_string(),
            settle_delay: Duration::from_secs(2),
            user_agent: None,
            extra_headers: HashMap::new(),
            stealth: true,
            launch_args: vec![ANTI_AUTOMATION_ARG.to_string()],
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
    wait_for_selector: WaitForSelector<'a>,
    wait_for_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    #[serde(rename = "setExtraHTTPHeaders", skip_serializing_if = "HashMap::is_empty")]
    extra_headers: &'a HashMap<String, String>,
    best_attempt: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    timeout: u64,
    wait_until: &'static str,
}

#[derive(Debug, Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

#[derive(Debug, Serialize)]
struct LaunchOptions<'a> {
    args: &'a [String],
}

// =============================================================================
// Client
// =============================================================================

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BrowserlessError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    /// Fetch fully-rendered HTML for a URL via the `/content` endpoint.
    pub async fn content(&self, url: &str, options: &RenderOptions) -> Result<String> {
        let endpoint = format!("{}/content", self.base_url);
        let page_timeout_ms = options.page_timeout.as_millis() as u64;

        let body = ContentRequest {
            url,
            goto_options: GotoOptions {
                timeout: page_timeout_ms,
                wait_until: "domcontentloaded",
            },
            wait_for_selector: WaitForSelector {
                selector: &options.wait_for_selector,
                timeout: page_timeout_ms,
            },
            wait_for_timeout: options.settle_delay.as_millis() as u64,
            user_agent: options.user_agent.as_deref(),
            extra_headers: &options.extra_headers,
            best_attempt: true,
        };

        let mut query: Vec<(&str, String)> = vec![("timeout", page_timeout_ms.to_string())];
        if let Some(ref token) = self.token {
            query.push(("token", token.clone()));
        }
        if options.stealth {
            query.push(("stealth", "true".to_string()));
        }
        if !options.launch_args.is_empty() {
            let launch = serde_json::to_string(&LaunchOptions {
                args: &options.launch_args,
            })
            .map_err(|e| BrowserlessError::Config(e.to_string()))?;
            query.push(("launch", launch));
        }

        debug!(url, endpoint = %endpoint, "Browserless content request");

        let resp = self
            .client
            .post(&endpoint)
            .query(&query)
            .timeout(options.page_timeout + REQUEST_MARGIN)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            if status.as_u16() == 408 {
                return Err(BrowserlessError::Timeout(message));
            }
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
