use async_trait::async_trait;
use research_flow::{Context, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::keys;
use crate::models::QueryIntent;
use crate::search::RetrievalBroker;

pub struct SearchSourcesTask {
    broker: Arc<RetrievalBroker>,
}

impl SearchSourcesTask {
    pub fn new(broker: Arc<RetrievalBroker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl Task for SearchSourcesTask {
    fn id(&self) -> &str {
        "search"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let intent: QueryIntent = context.require(keys::INTENT).await?;

        info!(terms = ?intent.search_terms, "searching for information");
        let candidates = self
            .broker
            .retrieve(&intent.search_terms, intent.query_type, intent.result_limit)
            .await;

        let count = candidates.len();
        context.set(keys::CANDIDATE_COUNT, count).await?;
        context.set(keys::CANDIDATES, candidates).await?;

        Ok(TaskResult::new_with_status(
            NextAction::Continue,
            format!("found {} candidate source(s)", count),
        ))
    }
}
