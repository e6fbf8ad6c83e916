// Test mocks for the price-scout pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockFetcher (ContentFetcher): HashMap-based URL→outcome, with render
//   concurrency instrumentation
// - MockReasoner (Reasoner): scripted responses, records every call
//
// Plus helpers for building extractions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use pricescout_archive::FetchOutcome;
use pricescout_common::{Extraction, ExtractionStrategy};

use crate::traits::{ContentFetcher, Reasoner, ReasoningMode};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Plain page-text extraction for `url`.
pub fn page_text(url: &str, text: &str) -> Extraction {
    Extraction::new(url, ExtractionStrategy::PageText, text)
}

/// Block-page marker extraction for `url`.
pub fn blocked(url: &str) -> Extraction {
    Extraction::new(
        url,
        ExtractionStrategy::Blocked,
        format!("BLOCKED: {url} returned a defensive page. No product data was retrieved from this source."),
    )
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Unregistered URLs yield `None` from the lightweight path and
/// `FetchOutcome::Failed` from the render path.
/// Builder pattern: `.on_lightweight()`, `.on_render()`, `.lightweight_delay()`,
/// `.render_delay()`.
pub struct MockFetcher {
    lightweight: HashMap<String, Extraction>,
    renders: HashMap<String, FetchOutcome>,
    lightweight_delays: HashMap<String, Duration>,
    render_delay: Duration,
    lightweight_calls: Mutex<Vec<String>>,
    lightweight_completions: Mutex<Vec<String>>,
    render_calls: Mutex<Vec<String>>,
    lightweight_in_flight: AtomicUsize,
    lightweight_peak: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            lightweight: HashMap::new(),
            renders: HashMap::new(),
            lightweight_delays: HashMap::new(),
            render_delay: Duration::ZERO,
            lightweight_calls: Mutex::new(Vec::new()),
            lightweight_completions: Mutex::new(Vec::new()),
            render_calls: Mutex::new(Vec::new()),
            lightweight_in_flight: AtomicUsize::new(0),
            lightweight_peak: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn on_lightweight(mut self, url: &str, extraction: Extraction) -> Self {
        self.lightweight.insert(url.to_string(), extraction);
        self
    }

    pub fn on_render(mut self, url: &str, outcome: FetchOutcome) -> Self {
        self.renders.insert(url.to_string(), outcome);
        self
    }

    /// How long the lightweight fetch of `url` takes.
    pub fn lightweight_delay(mut self, url: &str, delay: Duration) -> Self {
        self.lightweight_delays.insert(url.to_string(), delay);
        self
    }

    /// How long each render holds the browser.
    pub fn render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub fn lightweight_calls(&self) -> Vec<String> {
        self.lightweight_calls.lock().unwrap().clone()
    }

    /// URLs in the order their lightweight fetches finished.
    pub fn lightweight_completions(&self) -> Vec<String> {
        self.lightweight_completions.lock().unwrap().clone()
    }

    /// Highest number of lightweight fetches ever in progress at once.
    pub fn peak_concurrent_lightweight(&self) -> usize {
        self.lightweight_peak.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> Vec<String> {
        self.render_calls.lock().unwrap().clone()
    }

    /// Highest number of renders ever in progress at once.
    pub fn peak_concurrent_renders(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn lightweight(&self, url: &str) -> Option<Extraction> {
        let now = self.lightweight_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.lightweight_peak.fetch_max(now, Ordering::SeqCst);
        self.lightweight_calls.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.lightweight_delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        self.lightweight_completions.lock().unwrap().push(url.to_string());
        self.lightweight_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.lightweight.get(url).cloned()
    }

    async fn render(&self, url: &str) -> FetchOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.render_calls.lock().unwrap().push(url.to_string());

        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }

        let outcome = self
            .renders
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Failed(format!("MockFetcher: no render for {url}")));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

// ---------------------------------------------------------------------------
// MockReasoner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonerCall {
    pub mode: ReasoningMode,
    pub system: String,
    pub user: String,
}

/// Replays scripted responses in order. Errors once the script runs out.
pub struct MockReasoner {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<ReasonerCall>>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<ReasonerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn modes(&self) -> Vec<ReasoningMode> {
        self.calls().into_iter().map(|c| c.mode).collect()
    }
}

impl Default for MockReasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn generate(&self, mode: ReasoningMode, system: &str, user: &str) -> Result<String> {
        self.calls.lock().unwrap().push(ReasonerCall {
            mode,
            system: system.to_string(),
            user: user.to_string(),
        });

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("MockReasoner: script exhausted")),
        }
    }
}
