use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Request
// =============================================================================

/// One inbound comparison request. Immutable for the lifetime of the request.
///
/// `brands` is ordered by display priority; `websites` holds site identifiers
/// (bare domains or full URLs) in the order results should appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub websites: Vec<String>,
}

/// A site identifier paired with its resolved search URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    pub site: String,
    pub search_url: String,
}

// =============================================================================
// Extraction
// =============================================================================

/// Which content-extraction heuristic produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Embedded hydration JSON found by structural parsing.
    Hydration,
    /// Embedded hydration JSON found by the regex fallback.
    HydrationRegex,
    /// The page is a defensive/block response.
    Blocked,
    /// Visible body text with noise elements removed.
    PageText,
    /// Leading slice of the raw input, used when parsing yields nothing.
    Raw,
}

impl ExtractionStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionStrategy::Hydration => "hydration data",
            ExtractionStrategy::HydrationRegex => "hydration data (regex)",
            ExtractionStrategy::Blocked => "blocked",
            ExtractionStrategy::PageText => "page text",
            ExtractionStrategy::Raw => "raw markup",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the content extractor for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub source_url: String,
    pub strategy: ExtractionStrategy,
    pub content: String,
}

impl Extraction {
    pub fn new(
        source_url: impl Into<String>,
        strategy: ExtractionStrategy,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            strategy,
            content: content.into(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.strategy == ExtractionStrategy::Blocked
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// The content prefixed with its provenance header.
    pub fn tagged(&self) -> String {
        format!(
            "--- SOURCE: {} [{}] ---\n{}\n",
            self.source_url, self.strategy, self.content
        )
    }

    /// Like [`tagged`](Self::tagged) but also names the fetch path.
    pub fn tagged_via(&self, method: ExtractionMethod) -> String {
        format!(
            "--- SOURCE: {} [{}, {}] ---\n{}\n",
            self.source_url, self.strategy, method, self.content
        )
    }
}

// =============================================================================
// Per-site outcome
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Blocked,
    Failed,
    Empty,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Ok => write!(f, "ok"),
            SourceStatus::Blocked => write!(f, "blocked"),
            SourceStatus::Failed => write!(f, "failed"),
            SourceStatus::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Lightweight,
    Rendered,
    None,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Lightweight => write!(f, "lightweight"),
            ExtractionMethod::Rendered => write!(f, "rendered"),
            ExtractionMethod::None => write!(f, "none"),
        }
    }
}

/// Outcome of acquiring one site. Exactly one per `SiteTarget`; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult {
    pub site: String,
    pub url: String,
    pub status: SourceStatus,
    pub method: ExtractionMethod,
    pub extraction: Option<Extraction>,
}

impl SourceResult {
    /// Build a result from a successful extraction. Blocked extractions get
    /// `SourceStatus::Blocked`, empty ones `SourceStatus::Empty`.
    pub fn extracted(target: &SiteTarget, method: ExtractionMethod, extraction: Extraction) -> Self {
        let status = if extraction.is_blocked() {
            SourceStatus::Blocked
        } else if extraction.is_empty() {
            SourceStatus::Empty
        } else {
            SourceStatus::Ok
        };
        Self {
            site: target.site.clone(),
            url: target.search_url.clone(),
            status,
            method,
            extraction: Some(extraction),
        }
    }

    pub fn empty(target: &SiteTarget, method: ExtractionMethod) -> Self {
        Self {
            site: target.site.clone(),
            url: target.search_url.clone(),
            status: SourceStatus::Empty,
            method,
            extraction: None,
        }
    }

    pub fn failed(target: &SiteTarget) -> Self {
        Self {
            site: target.site.clone(),
            url: target.search_url.clone(),
            status: SourceStatus::Failed,
            method: ExtractionMethod::None,
            extraction: None,
        }
    }

    /// The provenance-tagged block, or an empty string when nothing was extracted.
    pub fn text(&self) -> String {
        match &self.extraction {
            Some(e) if !e.is_empty() => e.tagged_via(self.method),
            _ => String::new(),
        }
    }

    pub fn has_text(&self) -> bool {
        self.extraction.as_ref().is_some_and(|e| !e.is_empty())
    }
}

// =============================================================================
// Corpus
// =============================================================================

/// Ordered concatenation of every non-empty source block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    blocks: Vec<String>,
}

impl Corpus {
    /// Assemble a corpus from results in site-list order, skipping empty ones.
    pub fn from_results(results: &[SourceResult]) -> Self {
        let blocks = results
            .iter()
            .filter(|r| r.has_text())
            .map(SourceResult::text)
            .collect();
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.trim().is_empty())
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn as_text(&self) -> String {
        self.blocks.join("\n")
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(String::len).sum()
    }
}

// =============================================================================
// Analysis output
// =============================================================================

/// One row of the comparison table. All fields are display strings; the
/// reasoning service owns numeric comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonItem {
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub extra_discounts: String,
    #[serde(default)]
    pub product_url: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub comparison_table: Vec<ComparisonItem>,
    pub top_recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(site: &str) -> SiteTarget {
        SiteTarget {
            site: site.to_string(),
            search_url: format!("https://{site}/search?q=x"),
        }
    }

    #[test]
    fn search_request_uses_camel_case_product_name() {
        let req: SearchRequest = serde_json::from_str(
            r#"{"productName":"kettle","brands":["Russell Hobbs"],"websites":["takealot.com"]}"#,
        )
        .unwrap();
        assert_eq!(req.product_name, "kettle");
        assert_eq!(req.brands, vec!["Russell Hobbs"]);
        assert_eq!(req.websites, vec!["takealot.com"]);
    }

    #[test]
    fn blocked_extraction_yields_blocked_status() {
        let extraction = Extraction::new("https://a.com", ExtractionStrategy::Blocked, "BLOCKED");
        let result = SourceResult::extracted(&target("a.com"), ExtractionMethod::Rendered, extraction);
        assert_eq!(result.status, SourceStatus::Blocked);
        assert!(result.has_text());
    }

    #[test]
    fn empty_extraction_yields_empty_status() {
        let extraction = Extraction::new("https://a.com", ExtractionStrategy::PageText, "  ");
        let result =
            SourceResult::extracted(&target("a.com"), ExtractionMethod::Lightweight, extraction);
        assert_eq!(result.status, SourceStatus::Empty);
        assert!(result.text().is_empty());
    }

    #[test]
    fn tagged_block_names_url_and_strategy() {
        let e = Extraction::new("https://a.com/s", ExtractionStrategy::Hydration, "{\"a\":1}");
        assert_eq!(
            e.tagged(),
            "--- SOURCE: https://a.com/s [hydration data] ---\n{\"a\":1}\n"
        );
        assert!(e
            .tagged_via(ExtractionMethod::Rendered)
            .starts_with("--- SOURCE: https://a.com/s [hydration data, rendered] ---"));
    }

    #[test]
    fn corpus_keeps_order_and_skips_empty_results() {
        let results = vec![
            SourceResult::extracted(
                &target("first.com"),
                ExtractionMethod::Lightweight,
                Extraction::new("https://first.com", ExtractionStrategy::PageText, "one"),
            ),
            SourceResult::failed(&target("middle.com")),
            SourceResult::extracted(
                &target("last.com"),
                ExtractionMethod::Rendered,
                Extraction::new("https://last.com", ExtractionStrategy::PageText, "two"),
            ),
        ];

        let corpus = Corpus::from_results(&results);
        assert_eq!(corpus.block_count(), 2);
        let text = corpus.as_text();
        let first = text.find("first.com").unwrap();
        let last = text.find("last.com").unwrap();
        assert!(first < last);
        assert!(!text.contains("middle.com"));
    }

    #[test]
    fn corpus_of_failures_is_empty() {
        let results = vec![
            SourceResult::failed(&target("a.com")),
            SourceResult::empty(&target("b.com"), ExtractionMethod::Rendered),
        ];
        assert!(Corpus::from_results(&results).is_empty());
    }

    #[test]
    fn comparison_item_tolerates_missing_fields() {
        let item: ComparisonItem =
            serde_json::from_str(r#"{"website":"takealot","sale_price":"R 199"}"#).unwrap();
        assert_eq!(item.website, "takealot");
        assert_eq!(item.sale_price, "R 199");
        assert!(item.product_url.is_empty());
    }

    #[test]
    fn analysis_result_requires_both_keys() {
        assert!(serde_json::from_str::<AnalysisResult>(r#"{"comparison_table":[]}"#).is_err());
        assert!(serde_json::from_str::<AnalysisResult>(
            r#"{"comparison_table":[],"top_recommendation":"x"}"#
        )
        .is_ok());
    }
}
