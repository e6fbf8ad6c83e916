use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Tunables for the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Timeout for a single lightweight GET.
    pub lightweight_timeout: Duration,
    /// Overall page timeout for a single render.
    pub render_timeout: Duration,
    /// Delay after the body is present before the DOM is captured.
    pub settle_delay: Duration,
    /// Bodies at or below this size are treated as unrendered app shells.
    pub min_useful_bytes: usize,
    /// Upper bound on extracted text, in characters.
    pub max_text_chars: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            lightweight_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_millis(2000),
            min_useful_bytes: 5000,
            max_text_chars: 50_000,
        }
    }
}

/// Which engine executes render fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBackend {
    /// Local headless Chromium (`--dump-dom`).
    Chrome { bin: String },
    /// Remote Browserless-compatible service.
    Browserless {
        base_url: String,
        token: Option<String>,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Reasoning service
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,

    // Acquisition
    pub render_backend: RenderBackend,
    pub acquisition: AcquisitionConfig,

    // Persistence
    pub database_url: Option<String>,
}

impl Config {
    /// Load configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = AcquisitionConfig::default();

        let render_backend = match optional_env("BROWSERLESS_URL") {
            Some(base_url) => RenderBackend::Browserless {
                base_url,
                token: optional_env("BROWSERLESS_TOKEN"),
            },
            None => RenderBackend::Chrome {
                bin: env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string()),
            },
        };

        Ok(Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: parse_env("API_PORT", 8000)?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL"),
            render_backend,
            acquisition: AcquisitionConfig {
                lightweight_timeout: Duration::from_secs(parse_env(
                    "LIGHTWEIGHT_TIMEOUT_SECS",
                    defaults.lightweight_timeout.as_secs(),
                )?),
                render_timeout: Duration::from_secs(parse_env(
                    "RENDER_TIMEOUT_SECS",
                    defaults.render_timeout.as_secs(),
                )?),
                settle_delay: Duration::from_millis(parse_env(
                    "RENDER_SETTLE_MS",
                    defaults.settle_delay.as_millis() as u64,
                )?),
                min_useful_bytes: parse_env("MIN_USEFUL_BYTES", defaults.min_useful_bytes)?,
                max_text_chars: parse_env("MAX_TEXT_CHARS", defaults.max_text_chars)?,
            },
            database_url: optional_env("DATABASE_URL"),
        })
    }
}

/// Read a variable, treating empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}
