use async_trait::async_trait;
use research_flow::{Context, ConversationTurn, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::keys;
use crate::classify::QueryClassifier;

pub struct ClassifyQueryTask {
    classifier: Arc<QueryClassifier>,
}

impl ClassifyQueryTask {
    pub fn new(classifier: Arc<QueryClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Task for ClassifyQueryTask {
    fn id(&self) -> &str {
        "classify"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let query: String = context.require(keys::QUERY).await?;
        let history: Vec<ConversationTurn> = context.get(keys::HISTORY).await.unwrap_or_default();

        info!(query = %query, "analyzing query");
        let intent = self.classifier.classify(&query, &history).await;

        let status = format!(
            "classified as {} with {} search term(s)",
            intent.query_type.as_str(),
            intent.search_terms.len()
        );
        context.set(keys::INTENT, intent).await?;

        Ok(TaskResult::new_with_status(NextAction::Continue, status))
    }
}
