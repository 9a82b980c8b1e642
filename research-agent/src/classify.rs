use research_flow::ConversationTurn;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::decode::decode_json;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{Depth, QueryIntent, QueryType, TimeSensitivity};
use crate::util::excerpt;

pub const CLASSIFIER_PREAMBLE: &str =
    "You are a query analysis expert. Analyze research queries and output JSON.";

const HISTORY_TURNS: usize = 6;
const HISTORY_TURN_CHARS: usize = 200;
const MAX_RESULT_LIMIT: usize = 10;

/// Turns a raw query into a [`QueryIntent`]; never fails.
pub struct QueryClassifier {
    model: Arc<dyn LanguageModel>,
    default_limit: usize,
}

impl QueryClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, default_limit: usize) -> Self {
        Self {
            model,
            default_limit: default_limit.clamp(1, MAX_RESULT_LIMIT),
        }
    }

    pub async fn classify(&self, query: &str, history: &[ConversationTurn]) -> QueryIntent {
        let request = CompletionRequest::new(CLASSIFIER_PREAMBLE, classifier_prompt(query, history));

        let raw = match self.model.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "classification call failed, using default intent");
                return QueryIntent::fallback(query, self.default_limit);
            }
        };

        match decode_json(&raw) {
            Some(Value::Object(payload)) => {
                let intent = self.intent_from(query, payload);
                debug!(
                    query_type = intent.query_type.as_str(),
                    terms = ?intent.search_terms,
                    "query classified"
                );
                intent
            }
            _ => {
                warn!("classification output unusable, using default intent");
                QueryIntent::fallback(query, self.default_limit)
            }
        }
    }

    fn intent_from(&self, query: &str, mut payload: Map<String, Value>) -> QueryIntent {
        let text = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_string);

        let mut search_terms = string_list(payload.get("search_terms"));
        if search_terms.is_empty() {
            search_terms.push(query.to_string());
        }

        let depth = text(payload.get("required_depth").or_else(|| payload.get("depth")))
            .and_then(|raw| Depth::parse(&raw))
            .unwrap_or_default();

        let result_limit = payload
            .get("result_limit")
            .and_then(Value::as_i64)
            .filter(|limit| *limit > 0)
            .map(|limit| (limit as usize).min(MAX_RESULT_LIMIT))
            .unwrap_or(self.default_limit);

        let extra_context = match payload.remove("additional_context") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        QueryIntent {
            query_type: text(payload.get("query_type"))
                .and_then(|raw| QueryType::parse(&raw))
                .unwrap_or_default(),
            topics: string_list(payload.get("topics")),
            search_terms,
            time_sensitivity: text(payload.get("time_sensitivity"))
                .and_then(|raw| TimeSensitivity::parse(&raw))
                .unwrap_or_default(),
            depth,
            result_limit,
            extra_context,
        }
    }
}

/// Distinct non-blank strings of a JSON array, first spelling kept; a lone
/// string counts as one item.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(single)) => vec![single.as_str()],
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

pub fn classifier_prompt(query: &str, history: &[ConversationTurn]) -> String {
    let mut prompt = format!(
        r#"Analyze the following research query and provide a structured analysis:

QUERY: "{query}"

Return your analysis as a JSON object with the following structure:
{{
    "query_type": "factual | exploratory | comparative | news | opinion",
    "topics": ["list", "of", "main", "topics"],
    "search_terms": ["optimized", "search", "terms"],
    "time_sensitivity": "recent | past_year | any",
    "required_depth": "basic | standard | deep",
    "result_limit": 5,
    "additional_context": {{
        "specific_sources": ["any", "specific", "sources", "to", "prioritize"],
        "specific_exclusions": ["any", "sources", "to", "avoid"],
        "geographic_focus": "any geographic focus",
        "temporal_focus": "any time period focus"
    }}
}}

For search_terms, provide 1-3 distinct search queries that would yield the most relevant information.
"#
    );

    if history.len() > 1 {
        prompt.push_str("\nPrevious conversation context:\n");
        let start = history.len().saturating_sub(HISTORY_TURNS);
        for turn in &history[start..] {
            prompt.push_str(&format!(
                "{}: {}\n",
                turn.role.label(),
                excerpt(&turn.content, HISTORY_TURN_CHARS)
            ));
        }
        prompt.push_str("\nConsider this context when analyzing the query.");
    }
    prompt
}
