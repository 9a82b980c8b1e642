use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::relevance::RelevanceConfig;

/// Generative model providers the agent can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LlmProvider {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "openrouter")]
    OpenRouter,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::OpenRouter => "openrouter",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::OpenRouter => "openai/gpt-4o-mini",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(format!("unsupported LLM provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub serpapi_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub result_limit: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub respect_robots: bool,
    pub concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            user_agent: "WebResearchAgent/1.0".to_string(),
            timeout: Duration::from_secs(10),
            respect_robots: true,
            concurrency: 4,
        }
    }
}

/// Everything the agent needs, read once at startup
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub extraction: ExtractionConfig,
    pub relevance: RelevanceConfig,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = get("LLM_PROVIDER")
            .and_then(|raw| {
                raw.parse::<LlmProvider>()
                    .map_err(|e| warn!(error = %e, "ignoring LLM_PROVIDER"))
                    .ok()
            })
            .unwrap_or_default();
        let request_timeout = Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT", 10u64));
        let defaults = ExtractionConfig::default();

        Self {
            llm: LlmConfig {
                provider,
                model: get("DEFAULT_LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
                openai_api_key: get("OPENAI_API_KEY"),
                openrouter_api_key: get("OPENROUTER_API_KEY"),
                timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT", 60u64)),
            },
            search: SearchConfig {
                serpapi_api_key: get("SERPAPI_API_KEY"),
                tavily_api_key: get("TAVILY_API_KEY"),
                google_api_key: get("GOOGLE_API_KEY"),
                google_search_engine_id: get("GOOGLE_SEARCH_ENGINE_ID"),
                result_limit: parse_or(&get, "SEARCH_RESULT_LIMIT", 5usize).max(1),
                timeout: request_timeout,
            },
            extraction: ExtractionConfig {
                user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent),
                timeout: request_timeout,
                respect_robots: get("RESPECT_ROBOTS_TXT")
                    .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                    .unwrap_or(defaults.respect_robots),
                concurrency: parse_or(&get, "EXTRACTION_CONCURRENCY", defaults.concurrency).max(1),
            },
            relevance: RelevanceConfig::default(),
        }
    }

    /// Switch provider, resetting the model name unless one was set explicitly.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        if self.llm.model == self.llm.provider.default_model() {
            self.llm.model = provider.default_model().to_string();
        }
        self.llm.provider = provider;
        self
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "malformed setting, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AgentConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.search.result_limit, 5);
        assert_eq!(config.search.timeout, Duration::from_secs(10));
        assert!(config.extraction.respect_robots);
        assert_eq!(config.extraction.user_agent, "WebResearchAgent/1.0");
        assert!(config.search.serpapi_api_key.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("LLM_PROVIDER", "OpenRouter"),
            ("SEARCH_RESULT_LIMIT", "eight"),
            ("REQUEST_TIMEOUT", "3"),
            ("RESPECT_ROBOTS_TXT", "False"),
            ("SERPAPI_API_KEY", "  "),
            ("TAVILY_API_KEY", "tv-123"),
        ]);
        assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.search.result_limit, 5);
        assert_eq!(config.extraction.timeout, Duration::from_secs(3));
        assert!(!config.extraction.respect_robots);
        assert!(config.search.serpapi_api_key.is_none());
        assert_eq!(config.search.tavily_api_key.as_deref(), Some("tv-123"));
    }

    #[test]
    fn provider_switch_keeps_explicit_model() {
        let switched = config_from(&[]).with_provider(LlmProvider::OpenRouter);
        assert_eq!(switched.llm.model, "openai/gpt-4o-mini");

        let pinned = config_from(&[("DEFAULT_LLM_MODEL", "gpt-4.1")])
            .with_provider(LlmProvider::OpenRouter);
        assert_eq!(pinned.llm.model, "gpt-4.1");
    }
}
