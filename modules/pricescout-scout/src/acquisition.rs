// Acquisition orchestrator.
//
// Per site: pending → lightweight_tried → {done | needs_render} → render_tried → done.
//
// Phase 1 runs every lightweight fetch concurrently. Phase 2 takes the single
// render slot once and renders the leftovers one at a time. The slot is a
// semaphore permit, so it is released on every exit path, panics included.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{info, warn};

use pricescout_archive::{resolve_target, FetchOutcome};
use pricescout_common::{
    Corpus, ExtractionMethod, PriceScoutError, Result, SearchRequest, SiteTarget, SourceResult,
};

use crate::traits::ContentFetcher;

// ---------------------------------------------------------------------------
// RenderSlot
// ---------------------------------------------------------------------------

/// "One browser may be active." Clones share the same permit, so every
/// orchestrator built from one slot is serialized against the others.
#[derive(Debug, Clone)]
pub struct RenderSlot {
    permit: Arc<Semaphore>,
}

impl RenderSlot {
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait until the slot is free. Callers queue in FIFO order.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permit
            .acquire()
            .await
            .map_err(|e| PriceScoutError::Other(anyhow::anyhow!("render slot closed: {e}")))
    }

    pub fn is_free(&self) -> bool {
        self.permit.available_permits() == 1
    }
}

impl Default for RenderSlot {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Everything acquired for one request.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// One entry per requested site, in request order.
    pub results: Vec<SourceResult>,
    pub corpus: Corpus,
}

pub struct Orchestrator {
    fetcher: Arc<dyn ContentFetcher>,
    slot: RenderSlot,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, slot: RenderSlot) -> Self {
        Self { fetcher, slot }
    }

    /// Acquire every requested site. Fails only when no site produced text.
    pub async fn acquire(&self, request: &SearchRequest) -> Result<Acquisition> {
        let targets: Vec<SiteTarget> = request
            .websites
            .iter()
            .map(|site| resolve_target(site, &request.product_name))
            .collect();

        let mut slots = self.lightweight_phase(&targets).await;

        let pending: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect();

        if !pending.is_empty() {
            let rendered = self.render_phase(&targets, &pending).await?;
            for (i, result) in pending.into_iter().zip(rendered) {
                slots[i] = Some(result);
            }
        }

        let results: Vec<SourceResult> = slots
            .into_iter()
            .zip(&targets)
            .map(|(slot, target)| slot.unwrap_or_else(|| SourceResult::failed(target)))
            .collect();

        let corpus = Corpus::from_results(&results);

        let ok = results.iter().filter(|r| r.has_text()).count();
        info!(
            sites = targets.len(),
            with_content = ok,
            corpus_bytes = corpus.len(),
            "Acquisition complete"
        );

        if corpus.is_empty() {
            warn!(sites = targets.len(), "No site produced usable content");
            return Err(PriceScoutError::AcquisitionExhausted {
                sites: targets.len(),
            });
        }

        Ok(Acquisition { results, corpus })
    }

    /// Concurrent lightweight fetches. `None` marks a site that needs rendering.
    async fn lightweight_phase(&self, targets: &[SiteTarget]) -> Vec<Option<SourceResult>> {
        let fetches = targets.iter().map(|target| async move {
            info!(site = %target.site, url = %target.search_url, "Trying lightweight fetch");
            match self.fetcher.lightweight(&target.search_url).await {
                Some(extraction) if extraction.is_blocked() => {
                    info!(site = %target.site, "Lightweight fetch hit a block page, escalating");
                    None
                }
                Some(extraction) if extraction.is_empty() => None,
                Some(extraction) => Some(SourceResult::extracted(
                    target,
                    ExtractionMethod::Lightweight,
                    extraction,
                )),
                None => None,
            }
        });

        join_all(fetches).await
    }

    /// Sequential renders under one hold of the render slot.
    async fn render_phase(
        &self,
        targets: &[SiteTarget],
        pending: &[usize],
    ) -> Result<Vec<SourceResult>> {
        info!(count = pending.len(), "Waiting for render slot");
        let _permit = self.slot.acquire().await?;
        info!(count = pending.len(), "Render slot acquired");

        let mut results = Vec::with_capacity(pending.len());
        for &i in pending {
            let target = &targets[i];
            let result = match self.fetcher.render(&target.search_url).await {
                FetchOutcome::Content(extraction) => {
                    SourceResult::extracted(target, ExtractionMethod::Rendered, extraction)
                }
                FetchOutcome::Empty => SourceResult::empty(target, ExtractionMethod::Rendered),
                FetchOutcome::Failed(reason) => {
                    warn!(site = %target.site, url = %target.search_url, error = %reason, "Render failed");
                    SourceResult::failed(target)
                }
            };
            info!(site = %target.site, status = %result.status, method = %result.method, "Site done");
            results.push(result);
        }

        Ok(results)
    }
}
