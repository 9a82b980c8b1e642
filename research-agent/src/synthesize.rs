use research_flow::ConversationTurn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::decode::decode_json;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{Depth, QueryIntent, ScoredDocument};
use crate::util::{excerpt, truncate_to_char_boundary};

pub const SYNTHESIS_PREAMBLE: &str = "You are a research specialist that synthesizes information into clear, comprehensive responses.";

pub const DOCUMENT_BYTE_BUDGET: usize = 8000;
pub const TRUNCATION_MARKER: &str = "... [content truncated]";
const EXCERPT_CHARS: usize = 1500;
const HISTORY_TURNS: usize = 6;
const HISTORY_TURN_CHARS: usize = 100;

/// The model's answer, or a deterministic stand-in when it gave nothing usable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub summary: String,
    pub detailed_response: String,
    pub highlights: Vec<String>,
    pub source_evaluation: BTreeMap<String, String>,
}

impl Synthesis {
    /// The model answered, but not in the expected shape.
    pub fn unparsed(query: &str, raw: &str) -> Self {
        Self {
            summary: format!(
                "Based on my research about '{}', I found relevant information but encountered an error formatting it. The information appears to support answering your question, but I need to present it differently.",
                query
            ),
            detailed_response: raw.to_string(),
            ..Self::default()
        }
    }

    /// The model could not be reached at all.
    pub fn unavailable(query: &str) -> Self {
        Self {
            summary: format!(
                "I encountered an error while researching '{}'. Please try rephrasing your question or try again later.",
                query
            ),
            ..Self::default()
        }
    }
}

pub struct Synthesizer {
    model: Arc<dyn LanguageModel>,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn synthesize(
        &self,
        query: &str,
        intent: &QueryIntent,
        documents: &[ScoredDocument],
        history: &[ConversationTurn],
    ) -> Synthesis {
        let request = CompletionRequest::new(
            SYNTHESIS_PREAMBLE,
            synthesis_prompt(query, intent, documents, history),
        );

        match self.model.complete(request).await {
            Ok(raw) => parse_synthesis(&raw).unwrap_or_else(|| {
                warn!("synthesis output unusable, returning raw text");
                Synthesis::unparsed(query, &raw)
            }),
            Err(e) => {
                warn!(error = %e, "synthesis call failed");
                Synthesis::unavailable(query)
            }
        }
    }
}

/// Cap `text` at the byte budget, marking the cut.
pub fn cap_document_text(text: &str) -> String {
    if text.len() <= DOCUMENT_BYTE_BUDGET {
        return text.to_string();
    }
    format!(
        "{}{}",
        truncate_to_char_boundary(text, DOCUMENT_BYTE_BUDGET),
        TRUNCATION_MARKER
    )
}

fn depth_guidance(depth: Depth) -> &'static str {
    match depth {
        Depth::Basic => "basic facts and a clear answer",
        Depth::Standard => "balanced information with key details and context",
        Depth::Deep => "comprehensive information with nuanced analysis",
    }
}

pub fn synthesis_prompt(
    query: &str,
    intent: &QueryIntent,
    documents: &[ScoredDocument],
    history: &[ConversationTurn],
) -> String {
    let mut context_summary = String::new();
    if history.len() > 1 {
        context_summary.push_str("Previous conversation context:\n");
        let start = history.len().saturating_sub(HISTORY_TURNS);
        for turn in &history[start..] {
            context_summary.push_str(&format!(
                "{}: {}\n",
                turn.role.label(),
                excerpt(&turn.content, HISTORY_TURN_CHARS)
            ));
        }
    }

    let mut prompt = format!(
        "Research Query: \"{}\"\n\n\
         Query Analysis:\n\
         - Type: {}\n\
         - Required Depth: {}\n\
         - Topics: {}\n\n\
         {}\n\
         Below are relevant content excerpts from {} sources:\n",
        query,
        intent.query_type.as_str(),
        intent.depth.as_str(),
        intent.topics.join(", "),
        context_summary,
        documents.len(),
    );

    for (i, document) in documents.iter().enumerate() {
        let title = match document.title().trim() {
            "" => "Untitled",
            title => title,
        };
        let capped = cap_document_text(document.text());
        prompt.push_str(&format!(
            "\nSOURCE {}: {}\nURL: {}\nEXCERPT: {}\n--------------------------------------------\n\n",
            i + 1,
            title,
            document.url(),
            excerpt(&capped, EXCERPT_CHARS),
        ));
    }

    prompt.push_str(&format!(
        r#"
Based on these sources, synthesize a comprehensive response to the query.

Return your response as a JSON object with the following structure:
{{
    "summary": "A concise summary answering the query (400-600 words)",
    "detailed_response": "A detailed response with in-depth information (800-1200 words)",
    "highlights": ["key", "points", "or", "findings"],
    "source_evaluation": {{
        "reliability": "assessment of source reliability",
        "contradictions": "note any contradictions between sources",
        "information_gaps": "identify any information gaps"
    }}
}}

For the {depth} depth requested, focus on providing {guidance}.

Important:
1. Synthesize information from all sources - don't just summarize each individually
2. Resolve contradictions between sources when possible
3. Cite specific sources where appropriate using [Source X] notation
4. Maintain factual accuracy - don't add information not found in the sources
5. Format the detailed_response using markdown for readability
"#,
        depth = intent.depth.as_str(),
        guidance = depth_guidance(intent.depth),
    ));
    prompt
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

/// `None` unless the payload is an object with a non-empty `summary`.
pub fn parse_synthesis(raw: &str) -> Option<Synthesis> {
    let Value::Object(payload) = decode_json(raw)? else {
        return None;
    };

    let summary = payload.get("summary").and_then(value_text)?;
    let detailed_response = payload
        .get("detailed_response")
        .and_then(value_text)
        .unwrap_or_default();
    let highlights = match payload.get("highlights") {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    let source_evaluation = match payload.get("source_evaluation") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| value_text(v).map(|text| (k.clone(), text)))
            .collect(),
        _ => BTreeMap::new(),
    };

    debug!(highlights = highlights.len(), "synthesis parsed");
    Some(Synthesis {
        summary,
        detailed_response,
        highlights,
        source_evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResearchError;
    use crate::models::{CandidateSource, ExtractedDocument, ExtractionMethod};
    use crate::testing::ScriptedModel;

    fn document(title: &str, text: &str) -> ScoredDocument {
        ScoredDocument::new(
            ExtractedDocument {
                source: CandidateSource::new("https://s.test/1", title, "", "test"),
                text: text.to_string(),
                extraction_method: ExtractionMethod::Article,
                publish_date: None,
            },
            40,
        )
    }

    #[test]
    fn caps_long_documents() {
        assert_eq!(cap_document_text("short"), "short");
        let long = "é".repeat(5000);
        let capped = cap_document_text(&long);
        assert!(capped.ends_with(TRUNCATION_MARKER));
        assert_eq!(capped.len(), DOCUMENT_BYTE_BUDGET + TRUNCATION_MARKER.len());
    }

    #[test]
    fn prompt_carries_sources_depth_and_history() {
        let mut intent = QueryIntent::fallback("q", 5);
        intent.depth = Depth::Deep;
        let history = vec![
            ConversationTurn::user("earlier question"),
            ConversationTurn::assistant("y".repeat(150)),
            ConversationTurn::user("q"),
        ];
        let prompt = synthesis_prompt("q", &intent, &[document("", &"w".repeat(2000))], &history);

        assert!(prompt.contains("SOURCE 1: Untitled\nURL: https://s.test/1\n"));
        assert!(prompt.contains(&format!("EXCERPT: {}...\n", "w".repeat(1500))));
        assert!(prompt.contains("Previous conversation context:\nUser: earlier question\n"));
        assert!(prompt.contains(&format!("Assistant: {}...\n", "y".repeat(100))));
        assert!(prompt.contains("comprehensive information with nuanced analysis"));
    }

    #[test]
    fn parses_payload_and_requires_a_summary() {
        let parsed = parse_synthesis(
            r###"{"summary": "Paris.", "detailed_response": "## Paris\nIt is the capital.", "highlights": ["capital", 1],
                "source_evaluation": {"reliability": "high", "contradictions": null}}"###,
        )
        .unwrap();
        assert_eq!(parsed.summary, "Paris.");
        assert_eq!(parsed.highlights, vec!["capital", "1"]);
        assert_eq!(parsed.source_evaluation.len(), 1);

        assert!(parse_synthesis(r#"{"summary": "  ", "detailed_response": "x"}"#).is_none());
        assert!(parse_synthesis(r#"{"detailed_response": "x"}"#).is_none());
        assert!(parse_synthesis("plain prose").is_none());
    }

    #[tokio::test]
    async fn malformed_output_keeps_raw_text() {
        let synthesizer = Synthesizer::new(ScriptedModel::replying("Paris is the capital."));
        let intent = QueryIntent::fallback("capital of France", 5);
        let result = synthesizer
            .synthesize("capital of France", &intent, &[document("Paris", "text")], &[])
            .await;
        assert!(result.summary.contains("'capital of France'"));
        assert_eq!(result.detailed_response, "Paris is the capital.");
        assert!(result.highlights.is_empty());
    }

    #[tokio::test]
    async fn call_failure_yields_apology() {
        let synthesizer = Synthesizer::new(ScriptedModel::failing(ResearchError::external(
            "openrouter",
            "connection refused",
        )));
        let intent = QueryIntent::fallback("capital of France", 5);
        let result = synthesizer
            .synthesize("capital of France", &intent, &[], &[])
            .await;
        assert_eq!(result, Synthesis::unavailable("capital of France"));
        assert!(result.detailed_response.is_empty());
    }
}
