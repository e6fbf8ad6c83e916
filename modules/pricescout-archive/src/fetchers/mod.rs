// Fetch paths. `http` is the cheap lightweight GET; `render` drives a real
// browser through a pluggable engine.

pub(crate) mod http;
pub(crate) mod render;

pub use http::LightweightFetcher;
pub use render::{
    BrowserlessEngine, ChromeEngine, FetchOutcome, RenderEngine, RenderFetcher, RenderedPage,
};

/// Desktop Chrome user agent sent on every fetch path.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

pub const BROWSER_ACCEPT_LANGUAGE: &str = "en-ZA,en-US;q=0.9,en;q=0.8";
