use research_flow::{Context, Graph, GraphBuilder, Task};
use std::sync::Arc;

use crate::classify::QueryClassifier;
use crate::config::AgentConfig;
use crate::error::ResearchError;
use crate::extract::ContentExtractor;
use crate::llm::{LanguageModel, RigModel};
use crate::relevance::RelevanceEngine;
use crate::search::RetrievalBroker;
use crate::synthesize::Synthesizer;
use crate::tasks::{
    ClassifyQueryTask, ExtractContentTask, NoContentTask, NoResultsTask, RankSourcesTask,
    SearchSourcesTask, SynthesizeAnswerTask, keys,
};

/// The collaborators every research run shares
pub struct ResearchComponents {
    pub classifier: Arc<QueryClassifier>,
    pub broker: Arc<RetrievalBroker>,
    pub extractor: Arc<ContentExtractor>,
    pub relevance: Arc<RelevanceEngine>,
    pub synthesizer: Arc<Synthesizer>,
    pub extraction_concurrency: usize,
}

impl ResearchComponents {
    /// Wire every stage to one model, one search broker and one extractor.
    pub fn assemble(
        model: Arc<dyn LanguageModel>,
        broker: RetrievalBroker,
        extractor: ContentExtractor,
        config: &AgentConfig,
    ) -> Self {
        Self {
            classifier: Arc::new(QueryClassifier::new(
                Arc::clone(&model),
                config.search.result_limit,
            )),
            broker: Arc::new(broker),
            extractor: Arc::new(extractor),
            relevance: Arc::new(RelevanceEngine::new(
                Arc::clone(&model),
                config.relevance.clone(),
            )),
            synthesizer: Arc::new(Synthesizer::new(model)),
            extraction_concurrency: config.extraction.concurrency,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ResearchError> {
        let model: Arc<dyn LanguageModel> = Arc::new(RigModel::from_config(&config.llm)?);
        let broker = RetrievalBroker::from_config(&config.search);
        let extractor = ContentExtractor::from_config(&config.extraction)?;
        Ok(Self::assemble(model, broker, extractor, config))
    }
}

fn count_is_zero(key: &'static str) -> impl Fn(&Context) -> bool + Send + Sync + 'static {
    move |ctx: &Context| ctx.get_sync::<usize>(key) == Some(0)
}

/// classify → search → extract → filter → synthesize, with early exits
/// to `no_results` and `no_content`.
pub fn build_research_graph(components: &ResearchComponents) -> Graph {
    let classify = Arc::new(ClassifyQueryTask::new(Arc::clone(&components.classifier)));
    let search = Arc::new(SearchSourcesTask::new(Arc::clone(&components.broker)));
    let extract = Arc::new(ExtractContentTask::new(
        Arc::clone(&components.extractor),
        components.extraction_concurrency,
    ));
    let filter = Arc::new(RankSourcesTask::new(Arc::clone(&components.relevance)));
    let synthesize = Arc::new(SynthesizeAnswerTask::new(Arc::clone(&components.synthesizer)));
    let no_results = Arc::new(NoResultsTask);
    let no_content = Arc::new(NoContentTask);

    let classify_id = classify.id().to_string();
    let search_id = search.id().to_string();
    let extract_id = extract.id().to_string();
    let filter_id = filter.id().to_string();
    let synthesize_id = synthesize.id().to_string();
    let no_results_id = no_results.id().to_string();
    let no_content_id = no_content.id().to_string();

    GraphBuilder::new("research_workflow")
        .add_task(classify)
        .add_task(search)
        .add_task(extract)
        .add_task(filter)
        .add_task(synthesize)
        .add_task(no_results)
        .add_task(no_content)
        .add_edge(&classify_id, &search_id)
        .add_conditional_edge(&search_id, &no_results_id, count_is_zero(keys::CANDIDATE_COUNT))
        .add_edge(&search_id, &extract_id)
        .add_conditional_edge(&extract_id, &no_content_id, count_is_zero(keys::DOCUMENT_COUNT))
        .add_edge(&extract_id, &filter_id)
        .add_edge(&filter_id, &synthesize_id)
        .set_start_task(&classify_id)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::testing::{ScriptedModel, StaticFetcher, StaticSearch};

    fn components(search: StaticSearch, fetcher: StaticFetcher) -> ResearchComponents {
        let config = AgentConfig::from_lookup(|_| None);
        ResearchComponents::assemble(
            ScriptedModel::replying("not json"),
            RetrievalBroker::new(Box::new(search)),
            ContentExtractor::new(Arc::new(fetcher), &ExtractionConfig::default()),
            &config,
        )
    }

    #[tokio::test]
    async fn empty_search_routes_to_no_results() {
        let graph = build_research_graph(&components(StaticSearch::new(), StaticFetcher::new()));
        assert_eq!(graph.start_task_id(), Some("classify"));
        let context = Context::new();
        context.set(keys::QUERY, "unfindable thing").await.unwrap();

        let run = graph.execute(context).await.unwrap();
        assert_eq!(run.visited, vec!["classify", "search", "no_results"]);
    }

    #[tokio::test]
    async fn unreachable_pages_route_to_no_content() {
        let search = StaticSearch::new().with_term("unreachable pages", &["https://gone.test/a"]);
        let graph = build_research_graph(&components(search, StaticFetcher::new()));
        let context = Context::new();
        context.set(keys::QUERY, "unreachable pages").await.unwrap();

        let run = graph.execute(context).await.unwrap();
        assert_eq!(run.visited, vec!["classify", "search", "extract", "no_content"]);
    }
}
