pub mod acquisition;
pub mod analysis;
pub mod prompt;
pub mod recovery;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use acquisition::{Acquisition, Orchestrator, RenderSlot};
pub use analysis::AnalysisInvoker;
pub use recovery::recover_analysis;
pub use traits::{ContentFetcher, Reasoner, ReasoningMode};

use std::sync::Arc;

use pricescout_common::{AnalysisResult, Result, SearchRequest};
use tracing::info;

/// One price-comparison run: acquire every site, then reason over the corpus.
pub struct PriceScout {
    orchestrator: Orchestrator,
}

impl PriceScout {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, slot: RenderSlot) -> Self {
        Self {
            orchestrator: Orchestrator::new(fetcher, slot),
        }
    }

    /// The reasoner is supplied per call because it carries the caller's credential.
    pub async fn analyze(
        &self,
        request: &SearchRequest,
        reasoner: &dyn Reasoner,
    ) -> Result<AnalysisResult> {
        // Exhausted acquisition returns here, before any reasoning call.
        let acquisition = self.orchestrator.acquire(request).await?;

        info!(
            product = %request.product_name,
            blocks = acquisition.corpus.block_count(),
            corpus_bytes = acquisition.corpus.len(),
            "Corpus assembled"
        );

        AnalysisInvoker::new(reasoner)
            .analyze(request, &acquisition.corpus)
            .await
    }
}
