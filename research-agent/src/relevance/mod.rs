//! Hybrid relevance engine.
//!
//! Phase A ([`lexical`]) scores every extracted document deterministically and
//! keeps the ones above the inclusion threshold. Phase B ([`rerank`]) asks the
//! model to reorder the top window, but only when Phase A kept more than
//! `rerank_min_candidates` documents.

pub mod lexical;
pub mod rerank;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::LanguageModel;
use crate::models::{ExtractedDocument, QueryIntent, ScoredDocument};

/// Named knobs for both phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceConfig {
    /// Raw scores at or below this are dropped
    pub inclusion_threshold: u32,
    /// No document is ever scored above this
    pub score_cap: u32,
    pub max_results: usize,
    /// Unscored documents passed through when nothing survives Phase A
    pub fallback_count: usize,
    /// Phase B runs only above this many survivors
    pub rerank_min_candidates: usize,
    pub rerank_window: usize,
    pub rerank_sample_chars: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            inclusion_threshold: 5,
            score_cap: 98,
            max_results: 20,
            fallback_count: 3,
            rerank_min_candidates: 3,
            rerank_window: 10,
            rerank_sample_chars: 500,
        }
    }
}

pub struct RelevanceEngine {
    model: Arc<dyn LanguageModel>,
    config: RelevanceConfig,
}

impl RelevanceEngine {
    pub fn new(model: Arc<dyn LanguageModel>, config: RelevanceConfig) -> Self {
        Self { model, config }
    }

    pub async fn rank(
        &self,
        intent: &QueryIntent,
        documents: Vec<ExtractedDocument>,
    ) -> Vec<ScoredDocument> {
        self.rank_at(intent, documents, Utc::now().date_naive()).await
    }

    /// Same as [`rank`](Self::rank) with recency measured from `today`.
    pub async fn rank_at(
        &self,
        intent: &QueryIntent,
        documents: Vec<ExtractedDocument>,
        today: NaiveDate,
    ) -> Vec<ScoredDocument> {
        let survivors = lexical::score_documents(intent, &documents, today, &self.config);

        if survivors.is_empty() {
            warn!(
                documents = documents.len(),
                "no document passed lexical scoring, passing the first ones through"
            );
            return documents
                .into_iter()
                .take(self.config.fallback_count)
                .map(ScoredDocument::unscored)
                .collect();
        }

        if survivors.len() <= self.config.rerank_min_candidates {
            info!(survivors = survivors.len(), "lexical ranking only");
            return survivors;
        }

        info!(survivors = survivors.len(), "re-ranking with model");
        rerank::rerank(self.model.as_ref(), intent, survivors, &self.config).await
    }
}
