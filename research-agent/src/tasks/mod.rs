//! Pipeline stages as workflow tasks.
//!
//! Tasks communicate only through the shared [`research_flow::Context`], under
//! the keys in [`keys`]. The terminal tasks (`synthesize`, `no_results`,
//! `no_content`) always leave a [`crate::models::ResearchResult`] under
//! [`keys::RESULT`].

pub mod classify_query;
pub mod extract_content;
pub mod rank_sources;
pub mod search_sources;
pub mod short_circuit;
pub mod synthesize_answer;

pub use classify_query::ClassifyQueryTask;
pub use extract_content::ExtractContentTask;
pub use rank_sources::RankSourcesTask;
pub use search_sources::SearchSourcesTask;
pub use short_circuit::{NoContentTask, NoResultsTask};
pub use synthesize_answer::SynthesizeAnswerTask;

pub mod keys {
    pub const QUERY: &str = "query";
    /// History snapshot taken after the user turn was appended
    pub const HISTORY: &str = "history";
    pub const INTENT: &str = "intent";
    pub const CANDIDATES: &str = "candidates";
    pub const CANDIDATE_COUNT: &str = "candidate_count";
    pub const DOCUMENTS: &str = "documents";
    pub const DOCUMENT_COUNT: &str = "document_count";
    pub const RANKED: &str = "ranked";
    pub const RESULT: &str = "result";
}
