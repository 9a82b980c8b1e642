use async_trait::async_trait;
use research_flow::{Context, ConversationTurn, GraphError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::keys;
use crate::error::ResearchError;
use crate::models::{QueryIntent, ResearchResult, ScoredDocument};
use crate::synthesize::Synthesizer;

pub struct SynthesizeAnswerTask {
    synthesizer: Arc<Synthesizer>,
}

impl SynthesizeAnswerTask {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Task for SynthesizeAnswerTask {
    fn id(&self) -> &str {
        "synthesize"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let query: String = context.require(keys::QUERY).await?;
        let intent: QueryIntent = context.require(keys::INTENT).await?;
        let ranked: Vec<ScoredDocument> = context.require(keys::RANKED).await?;
        let history: Vec<ConversationTurn> = context.get(keys::HISTORY).await.unwrap_or_default();

        if ranked.is_empty() {
            return Err(GraphError::task_failed(
                self.id(),
                ResearchError::Synthesis("no ranked sources to synthesize from".into()),
            ));
        }

        info!(sources = ranked.len(), "generating research response");
        let synthesis = self
            .synthesizer
            .synthesize(&query, &intent, &ranked, &history)
            .await;

        let result = ResearchResult {
            query,
            intent,
            sources: ranked.iter().map(|d| d.document.source.source_ref()).collect(),
            summary: synthesis.summary,
            detailed_response: synthesis.detailed_response,
            highlights: synthesis.highlights,
            source_evaluation: synthesis.source_evaluation,
            success: true,
            error_kind: None,
            message: None,
        };
        context.set(keys::RESULT, result).await?;

        Ok(TaskResult::new_with_status(NextAction::End, "response ready"))
    }
}
