// Trait seams for the pipeline's two external collaborators.
//
// ContentFetcher wraps the Archive's lightweight and render paths.
// Reasoner wraps the generative model.
//
// Both have in-memory mocks in `testing`, so the whole pipeline runs
// without network, browser, or API key.

use anyhow::Result;
use async_trait::async_trait;

use ai_client::{Gemini, StructuredOutput};
use pricescout_archive::{Archive, FetchOutcome};
use pricescout_common::{AnalysisResult, Extraction};

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Cheap GET. `None` means "escalate to rendering".
    async fn lightweight(&self, url: &str) -> Option<Extraction>;

    /// Full browser render. Callers must hold the render slot.
    async fn render(&self, url: &str) -> FetchOutcome;
}

#[async_trait]
impl ContentFetcher for Archive {
    async fn lightweight(&self, url: &str) -> Option<Extraction> {
        Archive::lightweight(self, url).await
    }

    async fn render(&self, url: &str) -> FetchOutcome {
        Archive::render(self, url).await
    }
}

// ---------------------------------------------------------------------------
// Reasoner
// ---------------------------------------------------------------------------

/// How the reasoning service is asked to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningMode {
    /// Free-form text with web search available to the model.
    SearchAugmented,
    /// No tools; output constrained to the `AnalysisResult` schema.
    StrictJson,
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn generate(&self, mode: ReasoningMode, system: &str, user: &str) -> Result<String>;
}

#[async_trait]
impl Reasoner for Gemini {
    async fn generate(&self, mode: ReasoningMode, system: &str, user: &str) -> Result<String> {
        match mode {
            ReasoningMode::SearchAugmented => self.generate_with_search(system, user).await,
            ReasoningMode::StrictJson => {
                self.generate_json(system, user, AnalysisResult::response_schema())
                    .await
            }
        }
    }
}
