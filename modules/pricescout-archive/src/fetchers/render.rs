// Render fetch: a full browser page load through a pluggable engine.
// Chrome (local --dump-dom) or Browserless (remote /content).
//
// Concurrency is NOT limited here. Callers gate render fetches behind the
// orchestrator's render slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use browserless_client::{BrowserlessClient, RenderOptions, ANTI_AUTOMATION_ARG};
use pricescout_common::{AcquisitionConfig, Extraction};
use rand::Rng;
use tracing::{info, warn};

use super::{BROWSER_ACCEPT_LANGUAGE, BROWSER_USER_AGENT};
use crate::extractor::ContentExtractor;

/// Hard guard on top of the engine's own page timeout.
const RENDER_GRACE: Duration = Duration::from_secs(15);
/// Random pause before navigating, in milliseconds.
const HUMAN_PAUSE_MS: std::ops::Range<u64> = 250..1250;
/// Random extra settle time, in milliseconds.
const SETTLE_JITTER_MS: std::ops::Range<u64> = 0..500;

/// Max retry attempts for transient Chrome failures.
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Base backoff duration for Chrome retries. Actual delay is base * 3^attempt + jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

/// What a render engine captured for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Fully rendered document markup. Preferred.
    pub html: String,
    /// Rendered-markdown capture, used only when `html` is blank. Neither
    /// built-in engine produces one; it is for engines whose service returns
    /// markdown instead of markup.
    pub markdown: Option<String>,
}

impl RenderedPage {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            markdown: None,
        }
    }

    /// Preferred non-blank capture, if any.
    pub fn best_capture(self) -> Option<String> {
        if !self.html.trim().is_empty() {
            return Some(self.html);
        }
        self.markdown.filter(|md| !md.trim().is_empty())
    }
}

/// Outcome of one render fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Content(Extraction),
    /// The page loaded but nothing was captured.
    Empty,
    /// Timeout, navigation error, or crash. Carries the reason.
    Failed(String),
}

// --- RenderEngine trait ---

#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage>;
    fn name(&self) -> &str;
}

// --- RenderFetcher ---

pub struct RenderFetcher {
    engine: Arc<dyn RenderEngine>,
    extractor: ContentExtractor,
    render_timeout: Duration,
    human_pause: bool,
}

impl RenderFetcher {
    pub fn new(engine: Arc<dyn RenderEngine>, config: &AcquisitionConfig) -> Self {
        info!(engine = engine.name(), "RenderFetcher initialized");
        Self {
            engine,
            extractor: ContentExtractor::new(config.max_text_chars),
            render_timeout: config.render_timeout,
            human_pause: true,
        }
    }

    /// Skip the randomized pre-navigation pause.
    pub fn without_human_pause(mut self) -> Self {
        self.human_pause = false;
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Render `url` and extract it. Never errors; failures are logged and
    /// returned as `FetchOutcome::Failed`.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let engine = self.engine.name();

        if self.human_pause {
            let pause = rand::rng().random_range(HUMAN_PAUSE_MS);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }

        info!(url, engine, "Rendering page");
        let started = Instant::now();
        let limit = self.render_timeout + RENDER_GRACE;

        let page = match tokio::time::timeout(limit, self.engine.render(url)).await {
            Err(_) => {
                warn!(url, engine, timeout_secs = limit.as_secs(), "Render timed out");
                return FetchOutcome::Failed(format!("timed out after {}s", limit.as_secs()));
            }
            Ok(Err(e)) => {
                warn!(url, engine, error = %e, "Render failed");
                return FetchOutcome::Failed(format!("{e:#}"));
            }
            Ok(Ok(page)) => page,
        };

        let Some(captured) = page.best_capture() else {
            warn!(url, engine, "Render returned an empty document");
            return FetchOutcome::Empty;
        };

        info!(
            url,
            engine,
            bytes = captured.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered successfully"
        );

        FetchOutcome::Content(self.extractor.extract(&captured, url))
    }
}

// --- Browserless engine ---

pub struct BrowserlessEngine {
    client: BrowserlessClient,
    options: RenderOptions,
}

impl BrowserlessEngine {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        config: &AcquisitionConfig,
    ) -> crate::Result<Self> {
        let client = BrowserlessClient::new(base_url, token)?;
        info!(base_url, "BrowserlessEngine initialized");

        // Default options already wait for <body> and mask automation.
        let options = RenderOptions {
            page_timeout: config.render_timeout,
            settle_delay: config.settle_delay,
            user_agent: Some(BROWSER_USER_AGENT.to_string()),
            extra_headers: HashMap::from([(
                "Accept-Language".to_string(),
                BROWSER_ACCEPT_LANGUAGE.to_string(),
            )]),
            ..RenderOptions::default()
        };

        Ok(Self { client, options })
    }
}

#[async_trait]
impl RenderEngine for BrowserlessEngine {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let mut options = self.options.clone();
        options.settle_delay += Duration::from_millis(rand::rng().random_range(SETTLE_JITTER_MS));

        let html = self
            .client
            .content(url, &options)
            .await
            .context("Browserless content request failed")?;

        Ok(RenderedPage::html(html))
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- Chrome engine ---

pub struct ChromeEngine {
    chrome_bin: String,
    page_timeout: Duration,
    settle_delay: Duration,
}

impl ChromeEngine {
    pub fn new(chrome_bin: &str, config: &AcquisitionConfig) -> Self {
        info!(chrome_bin, "ChromeEngine initialized");
        Self {
            chrome_bin: chrome_bin.to_string(),
            page_timeout: config.render_timeout,
            settle_delay: config.settle_delay,
        }
    }

    fn args(&self, url: &str, profile_dir: &str) -> Vec<String> {
        let settle_ms = self.settle_delay.as_millis() as u64
            + rand::rng().random_range(SETTLE_JITTER_MS);
        vec![
            "--headless=new".to_string(),
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--hide-scrollbars".to_string(),
            "--mute-audio".to_string(),
            ANTI_AUTOMATION_ARG.to_string(),
            format!("--user-agent={BROWSER_USER_AGENT}"),
            format!("--lang={}", BROWSER_ACCEPT_LANGUAGE.split(',').next().unwrap_or("en")),
            format!("--virtual-time-budget={settle_ms}"),
            format!("--timeout={}", self.page_timeout.as_millis()),
            format!("--user-data-dir={profile_dir}"),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }

    /// Launch Chrome --dump-dom and return raw stdout bytes.
    /// Retries transient launch failures with exponential backoff plus jitter.
    async fn run_chrome(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs allowed, got: {}", parsed.scheme());
        }

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            let tmp_dir = tempfile::tempdir().context("Failed to create temp profile dir")?;
            let profile = tmp_dir.path().display().to_string();

            let result = tokio::time::timeout(
                self.page_timeout,
                tokio::process::Command::new(&self.chrome_bin)
                    .args(self.args(url, &profile))
                    .kill_on_drop(true)
                    .output(),
            )
            .await;

            let last_attempt = attempt + 1 >= CHROME_MAX_ATTEMPTS;

            match result {
                Ok(Ok(output)) if output.status.success() => return Ok(output.stdout),
                Ok(Ok(output)) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if is_transient_error(&stderr) && !last_attempt {
                        warn!(url, attempt = attempt + 1, "Chrome cannot fork, retrying");
                        retry_with_backoff(attempt).await;
                        continue;
                    }
                    anyhow::bail!("Chrome exited with {}: {}", output.status, stderr.trim());
                }
                Ok(Err(e)) => {
                    if is_transient_error(&e.to_string()) && !last_attempt {
                        warn!(url, attempt = attempt + 1, error = %e, "Chrome launch failed, retrying");
                        retry_with_backoff(attempt).await;
                        continue;
                    }
                    anyhow::bail!("Failed to run Chrome for {url}: {e}");
                }
                Err(_) => {
                    anyhow::bail!(
                        "Chrome timed out after {}s for {url}",
                        self.page_timeout.as_secs()
                    );
                }
            }
        }

        anyhow::bail!("Chrome failed after {CHROME_MAX_ATTEMPTS} attempts for {url}")
    }
}

#[async_trait]
impl RenderEngine for ChromeEngine {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let stdout = self.run_chrome(url).await?;
        Ok(RenderedPage::html(String::from_utf8_lossy(&stdout).into_owned()))
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

fn is_transient_error(msg: &str) -> bool {
    msg.contains("Cannot fork") || msg.contains("Resource temporarily unavailable")
}

async fn retry_with_backoff(attempt: u32) {
    let backoff = CHROME_RETRY_BASE * 3u32.pow(attempt);
    let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
    tokio::time::sleep(backoff + jitter).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricescout_common::ExtractionStrategy;

    struct StubEngine {
        result: std::result::Result<RenderedPage, String>,
        delay: Duration,
    }

    #[async_trait]
    impl RenderEngine for StubEngine {
        async fn render(&self, _url: &str) -> Result<RenderedPage> {
            tokio::time::sleep(self.delay).await;
            self.result.clone().map_err(|e| anyhow::anyhow!(e))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn fetcher(result: std::result::Result<RenderedPage, String>) -> RenderFetcher {
        let engine = Arc::new(StubEngine {
            result,
            delay: Duration::ZERO,
        });
        RenderFetcher::new(engine, &AcquisitionConfig::default()).without_human_pause()
    }

    #[tokio::test]
    async fn rendered_markup_is_extracted() {
        let page = RenderedPage::html("<html><body><p>Kettle R 299</p></body></html>");
        let outcome = fetcher(Ok(page)).fetch("https://example.org/search?q=kettle").await;

        match outcome {
            FetchOutcome::Content(extraction) => {
                assert_eq!(extraction.strategy, ExtractionStrategy::PageText);
                assert_eq!(extraction.content, "Kettle R 299");
            }
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn markdown_is_used_when_markup_is_blank() {
        let page = RenderedPage {
            html: "   ".to_string(),
            markdown: Some("Kettle R 299".to_string()),
        };
        let outcome = fetcher(Ok(page)).fetch("https://example.org").await;

        assert!(matches!(outcome, FetchOutcome::Content(e) if e.content.contains("Kettle R 299")));
    }

    #[tokio::test]
    async fn blank_capture_is_empty() {
        let outcome = fetcher(Ok(RenderedPage::default())).fetch("https://example.org").await;
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn engine_error_is_a_failed_outcome() {
        let outcome = fetcher(Err("net::ERR_NAME_NOT_RESOLVED".to_string()))
            .fetch("https://nope.invalid")
            .await;

        match outcome {
            FetchOutcome::Failed(reason) => assert!(reason.contains("ERR_NAME_NOT_RESOLVED")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_engine_times_out() {
        let engine = Arc::new(StubEngine {
            result: Ok(RenderedPage::html("<p>late</p>")),
            delay: Duration::from_secs(600),
        });
        let config = AcquisitionConfig {
            render_timeout: Duration::from_secs(1),
            ..AcquisitionConfig::default()
        };
        let outcome = RenderFetcher::new(engine, &config)
            .without_human_pause()
            .fetch("https://example.org")
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed(reason) if reason.contains("timed out")));
    }

    #[test]
    fn browserless_options_keep_masking_defaults() {
        let config = AcquisitionConfig {
            settle_delay: Duration::from_millis(1500),
            ..AcquisitionConfig::default()
        };
        let engine = BrowserlessEngine::new("http://localhost:3000", None, &config).unwrap();

        assert_eq!(engine.options.wait_for_selector, "body");
        assert!(engine.options.stealth);
        assert_eq!(engine.options.launch_args, vec![ANTI_AUTOMATION_ARG.to_string()]);
        assert_eq!(engine.options.settle_delay, Duration::from_millis(1500));
        assert_eq!(engine.options.user_agent.as_deref(), Some(BROWSER_USER_AGENT));
        assert_eq!(
            engine.options.extra_headers.get("Accept-Language").map(String::as_str),
            Some(BROWSER_ACCEPT_LANGUAGE)
        );
    }

    #[test]
    fn chrome_args_carry_anti_detection_flags() {
        let engine = ChromeEngine::new("chromium", &AcquisitionConfig::default());
        let args = engine.args("https://example.org", "/tmp/profile");

        assert!(args.contains(&ANTI_AUTOMATION_ARG.to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
        assert!(args.iter().any(|a| a.starts_with("--virtual-time-budget=")));
        assert_eq!(args.last().map(String::as_str), Some("https://example.org"));
    }

    #[test]
    fn transient_errors_are_recognised() {
        assert!(is_transient_error("fork: Resource temporarily unavailable"));
        assert!(!is_transient_error("net::ERR_CONNECTION_REFUSED"));
    }
}
