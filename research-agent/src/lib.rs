//! Web research agent.
//!
//! A query is classified into a structured intent, searched across one or
//! more terms, fetched and reduced to readable text, ranked for relevance and
//! finally synthesized into a sourced answer. The stages run as a
//! `research-flow` graph; see [`workflow::build_research_graph`].

pub mod agent;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod relevance;
pub mod search;
pub mod server;
pub mod synthesize;
pub mod tasks;
pub mod util;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use agent::ResearchAgent;
pub use config::{AgentConfig, LlmProvider};
pub use error::{ErrorKind, ResearchError};
pub use models::{QueryIntent, ResearchResult, SourceRef};
