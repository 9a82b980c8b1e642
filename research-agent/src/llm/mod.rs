//! Generative model seam.
//!
//! Every stage that needs a model judgment talks to a [`LanguageModel`] and
//! decodes the free-text answer with [`decode`]. Production code uses
//! [`RigModel`]; tests substitute scripted models.

pub mod decode;
mod rig_model;

use async_trait::async_trait;

use crate::error::ResearchError;

pub use rig_model::RigModel;

/// A role-tagged prompt: system preamble plus the user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub preamble: String,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(preamble: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Free-text completion; expected to contain a JSON payload somewhere.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ResearchError>;
}
