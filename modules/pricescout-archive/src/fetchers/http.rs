// Lightweight fetch: one plain GET with browser-like headers. Any failure is
// reported as `None` so the caller can escalate to rendering.

use anyhow::{Context, Result};
use pricescout_common::{AcquisitionConfig, Extraction};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tracing::info;

use super::{BROWSER_ACCEPT, BROWSER_ACCEPT_LANGUAGE, BROWSER_USER_AGENT};
use crate::extractor::{embeds_hydration, has_hydration_marker, ContentExtractor};
use crate::resolver::bare_domain;

const MAX_REDIRECTS: usize = 10;

/// Is a 200 body worth extracting, or is it an unrendered application shell?
///
/// Hydration-embedding domains count as useful whenever the marker is present;
/// everything else must exceed `min_bytes`.
pub(crate) fn is_useful(domain: &str, body: &str, min_bytes: usize) -> bool {
    if embeds_hydration(domain) && has_hydration_marker(body) {
        return true;
    }
    body.len() > min_bytes
}

pub struct LightweightFetcher {
    client: reqwest::Client,
    extractor: ContentExtractor,
    min_useful_bytes: usize,
}

impl LightweightFetcher {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.lightweight_timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to build lightweight HTTP client")?;

        Ok(Self {
            client,
            extractor: ContentExtractor::new(config.max_text_chars),
            min_useful_bytes: config.min_useful_bytes,
        })
    }

    /// GET `url` and extract it. `None` means "no usable content".
    pub async fn fetch(&self, url: &str) -> Option<Extraction> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                info!(url, fetcher = "lightweight", error = %e, "Request failed");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            info!(url, fetcher = "lightweight", status = status.as_u16(), "Non-200 response");
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                info!(url, fetcher = "lightweight", error = %e, "Failed to read body");
                return None;
            }
        };

        let domain = bare_domain(url);
        if !is_useful(&domain, &body, self.min_useful_bytes) {
            info!(
                url,
                fetcher = "lightweight",
                bytes = body.len(),
                min_bytes = self.min_useful_bytes,
                "Body looks like an unrendered shell"
            );
            return None;
        }

        info!(url, fetcher = "lightweight", bytes = body.len(), "Fetched successfully");
        Some(self.extractor.extract(&body, url))
    }
}
