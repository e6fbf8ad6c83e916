// Analysis invoker: search-augmented first, strict JSON once on failure.

use tracing::{info, warn};

use pricescout_common::{AnalysisResult, Corpus, PriceScoutError, Result, SearchRequest};

use crate::prompt::{system_prompt, user_message};
use crate::recovery::recover_analysis;
use crate::traits::{Reasoner, ReasoningMode};

/// Fixed attempt order. There is no third attempt.
const ATTEMPTS: [ReasoningMode; 2] = [ReasoningMode::SearchAugmented, ReasoningMode::StrictJson];

pub struct AnalysisInvoker<'a> {
    reasoner: &'a dyn Reasoner,
}

impl<'a> AnalysisInvoker<'a> {
    pub fn new(reasoner: &'a dyn Reasoner) -> Self {
        Self { reasoner }
    }

    pub async fn analyze(&self, request: &SearchRequest, corpus: &Corpus) -> Result<AnalysisResult> {
        let system = system_prompt(&request.brands, &request.product_name);
        let user = user_message(&corpus.as_text());

        let mut last_failure = String::new();
        for mode in ATTEMPTS {
            match self.attempt(mode, &system, &user).await {
                Ok(result) => {
                    info!(?mode, rows = result.comparison_table.len(), "Analysis succeeded");
                    return Ok(result);
                }
                Err(reason) => {
                    warn!(?mode, error = %reason, "Analysis attempt failed");
                    last_failure = reason;
                }
            }
        }

        Err(PriceScoutError::AnalysisFailed(last_failure))
    }

    async fn attempt(
        &self,
        mode: ReasoningMode,
        system: &str,
        user: &str,
    ) -> std::result::Result<AnalysisResult, String> {
        let text = self
            .reasoner
            .generate(mode, system, user)
            .await
            .map_err(|e| format!("{e:#}"))?;

        if text.trim().is_empty() {
            return Err("the reasoning service returned an empty response".to_string());
        }

        recover_analysis(&text)
            .ok_or_else(|| "no structured result could be recovered from the response".to_string())
    }
}
