// Archive: the public facade over both fetch paths.
//
// Callers never touch the fetchers or engines directly. The render slot that
// serializes browser work lives one layer up, in the orchestrator.

use std::sync::Arc;

use pricescout_common::{AcquisitionConfig, Extraction, RenderBackend};
use tracing::info;

use crate::error::Result;
use crate::fetchers::{
    BrowserlessEngine, ChromeEngine, FetchOutcome, LightweightFetcher, RenderEngine, RenderFetcher,
};

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub render_backend: RenderBackend,
    pub acquisition: AcquisitionConfig,
}

pub struct Archive {
    lightweight: LightweightFetcher,
    render: RenderFetcher,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let engine: Arc<dyn RenderEngine> = match &config.render_backend {
            RenderBackend::Chrome { bin } => Arc::new(ChromeEngine::new(bin, &config.acquisition)),
            RenderBackend::Browserless { base_url, token } => Arc::new(BrowserlessEngine::new(
                base_url,
                token.as_deref(),
                &config.acquisition,
            )?),
        };

        Self::with_engine(engine, &config.acquisition)
    }

    /// Build an archive around an explicit render engine.
    pub fn with_engine(engine: Arc<dyn RenderEngine>, acquisition: &AcquisitionConfig) -> Result<Self> {
        let lightweight = LightweightFetcher::new(acquisition)?;
        let render = RenderFetcher::new(engine, acquisition);
        info!(engine = render.engine_name(), "Archive initialized");
        Ok(Self { lightweight, render })
    }

    /// Skip the randomized pause before each render.
    pub fn without_human_pause(mut self) -> Self {
        self.render = self.render.without_human_pause();
        self
    }

    pub async fn lightweight(&self, url: &str) -> Option<Extraction> {
        self.lightweight.fetch(url).await
    }

    pub async fn render(&self, url: &str) -> FetchOutcome {
        self.render.fetch(url).await
    }
}
