use research_flow::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable tag carried by failed research results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ClassificationFailed,
    NoResults,
    NoContent,
    SynthesisFailed,
    ExternalCallFailed,
    MalformedModelOutput,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClassificationFailed => "classification_failed",
            ErrorKind::NoResults => "no_results",
            ErrorKind::NoContent => "no_content",
            ErrorKind::SynthesisFailed => "synthesis_failed",
            ErrorKind::ExternalCallFailed => "external_call_failed",
            ErrorKind::MalformedModelOutput => "malformed_model_output",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ResearchError {
    #[error("query classification failed: {0}")]
    Classification(String),

    #[error("no search results for any search term")]
    NoResults,

    #[error("no content could be extracted from {candidates} candidate sources")]
    NoContent { candidates: usize },

    #[error("answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("{service} call failed: {reason}")]
    ExternalCall { service: String, reason: String },

    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl ResearchError {
    pub fn external(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalCall {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResearchError::Classification(_) => ErrorKind::ClassificationFailed,
            ResearchError::NoResults => ErrorKind::NoResults,
            ResearchError::NoContent { .. } => ErrorKind::NoContent,
            ResearchError::Synthesis(_) => ErrorKind::SynthesisFailed,
            ResearchError::ExternalCall { .. } => ErrorKind::ExternalCallFailed,
            ResearchError::MalformedModelOutput(_) => ErrorKind::MalformedModelOutput,
            ResearchError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Message shown to the person who asked; always names their query.
    pub fn user_message(&self, query: &str) -> String {
        match self {
            ResearchError::NoResults => format!(
                "I couldn't find any information about '{}'. Could you try rephrasing your question or providing more details?",
                query
            ),
            ResearchError::NoContent { .. } => format!(
                "I found some relevant sources for '{}', but couldn't extract their content. This might be due to access restrictions or complex page structures.",
                query
            ),
            ResearchError::ExternalCall { reason, .. } => {
                let reason = reason.to_lowercase();
                let message = if reason.contains("timed out") || reason.contains("timeout") {
                    "Some services took too long to respond. Please try again later."
                } else if reason.contains("api key")
                    || reason.contains("api_key")
                    || reason.contains("401")
                    || reason.contains("unauthorized")
                {
                    "There was an authentication issue with one of the services I use. Please check API key configurations."
                } else if reason.contains("403") || reason.contains("forbidden") {
                    "I don't have permission to access some content needed for your request."
                } else {
                    "I couldn't connect to some services. This might be due to network issues or service restrictions."
                };
                format!("{} Your query was: '{}'", message, query)
            }
            ResearchError::MalformedModelOutput(_) => format!(
                "I had trouble processing some of the data I retrieved. Your query was: '{}'",
                query
            ),
            ResearchError::Classification(_) | ResearchError::Synthesis(_) => format!(
                "There was an issue with the AI service that powers my research capabilities. Your query was: '{}'",
                query
            ),
            ResearchError::Internal(_) => format!(
                "I encountered an unexpected error while processing your request. Please try again or rephrase your query. Your query was: '{}'",
                query
            ),
        }
    }
}

impl From<GraphError> for ResearchError {
    fn from(err: GraphError) -> Self {
        if let Some(inner) = err.task_source::<ResearchError>() {
            return inner.clone();
        }
        ResearchError::Internal(err.to_string())
    }
}
