use async_trait::async_trait;
use rig::{
    client::CompletionClient,
    completion::Prompt,
    providers::{openai, openrouter},
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::{CompletionRequest, LanguageModel};
use crate::config::{LlmConfig, LlmProvider};
use crate::error::ResearchError;

enum ProviderClient {
    OpenAi(openai::Client),
    OpenRouter(openrouter::Client),
}

/// [`LanguageModel`] backed by a rig agent; the provider is fixed at construction.
pub struct RigModel {
    client: ProviderClient,
    provider: LlmProvider,
    model: String,
    timeout: Duration,
}

impl RigModel {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ResearchError> {
        let client = match config.provider {
            LlmProvider::OpenAi => {
                let api_key = config
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| ResearchError::external("openai", "OPENAI_API_KEY not set"))?;
                ProviderClient::OpenAi(openai::Client::new(api_key))
            }
            LlmProvider::OpenRouter => {
                let api_key = config.openrouter_api_key.as_deref().ok_or_else(|| {
                    ResearchError::external("openrouter", "OPENROUTER_API_KEY not set")
                })?;
                ProviderClient::OpenRouter(openrouter::Client::new(api_key))
            }
        };

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl LanguageModel for RigModel {
    fn name(&self) -> &str {
        self.provider.as_str()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ResearchError> {
        debug!(
            provider = self.name(),
            model = %self.model,
            prompt_bytes = request.prompt.len(),
            "sending completion request"
        );

        let call = async {
            match &self.client {
                ProviderClient::OpenAi(client) => {
                    let agent = client
                        .agent(&self.model)
                        .preamble(&request.preamble)
                        .build();
                    agent.prompt(request.prompt.as_str()).await
                }
                ProviderClient::OpenRouter(client) => {
                    let agent = client
                        .agent(&self.model)
                        .preamble(&request.preamble)
                        .build();
                    agent.prompt(request.prompt.as_str()).await
                }
            }
        };

        match timeout(self.timeout, call).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ResearchError::external(self.name(), e.to_string())),
            Err(_) => Err(ResearchError::external(
                self.name(),
                format!("request timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }
}
