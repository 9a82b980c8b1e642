use research_flow::{Context, ConversationHistory, ConversationTurn, Graph};
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::ResearchError;
use crate::models::{QueryIntent, ResearchResult};
use crate::tasks::keys;
use crate::workflow::{ResearchComponents, build_research_graph};

/// One research session: the pipeline graph plus its conversation history.
///
/// `research` never fails; every outcome, including internal errors, comes
/// back as a [`ResearchResult`] and is recorded in the history as exactly one
/// user turn followed by one assistant turn.
///
/// Calls on one agent run one at a time. A call that is cancelled before it
/// finishes leaves the history untouched.
pub struct ResearchAgent {
    graph: Graph,
    history: ConversationHistory,
    session: Mutex<()>,
    default_limit: usize,
}

impl ResearchAgent {
    pub fn new(components: ResearchComponents, default_limit: usize) -> Self {
        Self {
            graph: build_research_graph(&components),
            history: ConversationHistory::new(),
            session: Mutex::new(()),
            default_limit: default_limit.max(1),
        }
    }

    pub fn from_config(config: AgentConfig) -> Result<Self, ResearchError> {
        let components = ResearchComponents::from_config(&config)?;
        info!(
            provider = config.llm.provider.as_str(),
            model = %config.llm.model,
            backend = components.broker.backend_name(),
            "research agent ready"
        );
        Ok(Self::new(components, config.search.result_limit))
    }

    #[instrument(skip(self), fields(call_id = %Uuid::new_v4()))]
    pub async fn research(&self, query: &str) -> ResearchResult {
        let _session = self.session.lock().await;

        let context = Context::new();
        let result = match self.run_graph(query, &context).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, kind = %err.kind(), "research call failed");
                let intent = context
                    .get::<QueryIntent>(keys::INTENT)
                    .await
                    .unwrap_or_else(|| QueryIntent::fallback(query, self.default_limit));
                ResearchResult::failure(query, intent, &err, Vec::new())
            }
        };

        self.history
            .append_exchange(
                ConversationTurn::user(query),
                ConversationTurn::assistant(result.summary.clone()),
            )
            .await;
        result
    }

    async fn run_graph(&self, query: &str, context: &Context) -> Result<ResearchResult, ResearchError> {
        context.set(keys::QUERY, query).await?;
        // Stages see the pending question as the newest turn; it is committed
        // together with the answer.
        let mut turns = self.history.snapshot().await;
        turns.push(ConversationTurn::user(query));
        context.set(keys::HISTORY, turns).await?;

        let run = self.graph.execute(context.clone()).await?;
        info!(stages = ?run.visited, status = ?run.status_message, "workflow finished");

        context.get(keys::RESULT).await.ok_or_else(|| {
            ResearchError::Internal(format!(
                "workflow ended at '{}' without a result",
                run.final_task_id().unwrap_or("<none>")
            ))
        })
    }

    pub async fn reset(&self) {
        self.history.reset().await;
        info!("conversation history cleared");
    }

    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.history.snapshot().await
    }
}
