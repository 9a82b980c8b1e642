use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ErrorKind, ResearchError};

/// Broad shape of the question being asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    #[default]
    Factual,
    Exploratory,
    Comparative,
    News,
    Opinion,
}

impl QueryType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "factual" => Some(QueryType::Factual),
            "exploratory" => Some(QueryType::Exploratory),
            "comparative" => Some(QueryType::Comparative),
            "news" => Some(QueryType::News),
            "opinion" => Some(QueryType::Opinion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Factual => "factual",
            QueryType::Exploratory => "exploratory",
            QueryType::Comparative => "comparative",
            QueryType::News => "news",
            QueryType::Opinion => "opinion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSensitivity {
    Recent,
    PastYear,
    #[default]
    Any,
}

impl TimeSensitivity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "recent" => Some(TimeSensitivity::Recent),
            "past_year" => Some(TimeSensitivity::PastYear),
            "any" => Some(TimeSensitivity::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSensitivity::Recent => "recent",
            TimeSensitivity::PastYear => "past_year",
            TimeSensitivity::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Basic,
    #[default]
    Standard,
    Deep,
}

impl Depth {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "basic" => Some(Depth::Basic),
            "standard" => Some(Depth::Standard),
            "deep" => Some(Depth::Deep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Basic => "basic",
            Depth::Standard => "standard",
            Depth::Deep => "deep",
        }
    }
}

/// Structured interpretation of a query that drives search and synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub query_type: QueryType,
    pub topics: Vec<String>,
    /// Never empty; falls back to the raw query
    pub search_terms: Vec<String>,
    pub time_sensitivity: TimeSensitivity,
    pub depth: Depth,
    pub result_limit: usize,
    #[serde(default)]
    pub extra_context: Map<String, Value>,
}

impl QueryIntent {
    /// Intent used whenever the model gives nothing usable.
    pub fn fallback(query: &str, result_limit: usize) -> Self {
        Self {
            query_type: QueryType::Factual,
            topics: Vec::new(),
            search_terms: vec![query.to_string()],
            time_sensitivity: TimeSensitivity::Any,
            depth: Depth::Standard,
            result_limit: result_limit.max(1),
            extra_context: Map::new(),
        }
    }
}

/// A search backend hit before its page has been fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSource {
    pub url: String,
    pub title: String,
    pub snippet: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Name of the backend that produced this hit
    pub backend: String,
}

impl CandidateSource {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
            metadata: BTreeMap::new(),
            backend: backend.into(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Article metadata and body paragraphs
    Article,
    /// Best content container, headings and paragraphs
    Generic,
    /// Every visible text node on the page
    FullPage,
    /// Host policy forbids fetching; text is a fixed notice
    RobotsRestricted,
}

/// Candidate plus the normalized text fetched from its URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(flatten)]
    pub source: CandidateSource,
    pub text: String,
    pub extraction_method: ExtractionMethod,
    pub publish_date: Option<String>,
}

/// Extracted document with the relevance engine's verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: ExtractedDocument,
    pub relevance_score: u32,
    pub rationale: Option<String>,
}

impl ScoredDocument {
    pub fn new(document: ExtractedDocument, relevance_score: u32) -> Self {
        Self {
            document,
            relevance_score,
            rationale: None,
        }
    }

    /// Pass-through wrapper for documents the lexical phase could not score.
    pub fn unscored(document: ExtractedDocument) -> Self {
        Self::new(document, 0)
    }

    pub fn url(&self) -> &str {
        &self.document.source.url
    }

    pub fn title(&self) -> &str {
        &self.document.source.title
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
    pub title: String,
}

/// What one research call hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    pub intent: QueryIntent,
    pub sources: Vec<SourceRef>,
    pub summary: String,
    pub detailed_response: String,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_evaluation: BTreeMap<String, String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResearchResult {
    pub fn failure(
        query: &str,
        intent: QueryIntent,
        error: &ResearchError,
        sources: Vec<SourceRef>,
    ) -> Self {
        let message = error.user_message(query);
        Self {
            query: query.to_string(),
            intent,
            sources,
            summary: message.clone(),
            detailed_response: String::new(),
            highlights: Vec::new(),
            source_evaluation: BTreeMap::new(),
            success: false,
            error_kind: Some(error.kind()),
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_loosely() {
        assert_eq!(QueryType::parse(" News "), Some(QueryType::News));
        assert_eq!(QueryType::parse("trivia"), None);
        assert_eq!(
            TimeSensitivity::parse("past year"),
            Some(TimeSensitivity::PastYear)
        );
        assert_eq!(Depth::parse("DEEP"), Some(Depth::Deep));
    }

    #[test]
    fn failure_result_carries_kind_and_message() {
        let intent = QueryIntent::fallback("solar flares", 5);
        let result = ResearchResult::failure("solar flares", intent, &ResearchError::NoResults, vec![]);

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NoResults));
        assert_eq!(result.summary, result.message.clone().unwrap());
        assert!(result.summary.contains("solar flares"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error_kind"], "no_results");
        assert_eq!(json["intent"]["search_terms"][0], "solar flares");
    }

    #[test]
    fn scored_documents_flatten_on_the_wire() {
        let source = CandidateSource::new("https://a.test/x", "X", "", "offline")
            .with_metadata("position", 1);
        let doc = ExtractedDocument {
            source,
            text: "body".into(),
            extraction_method: ExtractionMethod::Generic,
            publish_date: None,
        };
        let json = serde_json::to_value(ScoredDocument::new(doc, 42)).unwrap();
        assert_eq!(json["url"], "https://a.test/x");
        assert_eq!(json["extraction_method"], "generic");
        assert_eq!(json["relevance_score"], 42);

        let back: ScoredDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.url(), "https://a.test/x");
    }
}
