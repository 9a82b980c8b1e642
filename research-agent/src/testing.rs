//! Deterministic stand-ins for the model, search and fetch seams.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ResearchError;
use crate::extract::PageFetcher;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::CandidateSource;
use crate::search::SearchBackend;

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, ResearchError> + Send + Sync>;

/// Answers every request through a closure and records what it was asked.
pub struct ScriptedModel {
    respond: Responder,
    calls: Mutex<Vec<CompletionRequest>>,
    latency: Duration,
}

impl ScriptedModel {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest) -> Result<String, ResearchError> + Send + Sync + 'static,
    {
        Self::slow(Duration::ZERO, respond)
    }

    /// Like `new`, but every completion sleeps for `latency` first.
    pub fn slow<F>(latency: Duration, respond: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest) -> Result<String, ResearchError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
            latency,
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn failing(error: ResearchError) -> Arc<Self> {
        Self::new(move |_| Err(error.clone()))
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_with_preamble(&self, preamble: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.preamble == preamble)
            .count()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ResearchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = (self.respond)(&request);
        self.calls.lock().unwrap().push(request);
        reply
    }
}

/// Fixed hits per term; unknown terms return nothing.
#[derive(Default)]
pub struct StaticSearch {
    results: HashMap<String, Vec<CandidateSource>>,
    failing: HashSet<String>,
    recency: Arc<Mutex<Vec<bool>>>,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(self, term: &str, urls: &[&str]) -> Self {
        let hits = urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                CandidateSource::new(*url, format!("{} result {}", term, i + 1), "", "static")
            })
            .collect();
        self.with_candidates(term, hits)
    }

    pub fn with_candidates(mut self, term: &str, hits: Vec<CandidateSource>) -> Self {
        self.results.insert(term.to_string(), hits);
        self
    }

    pub fn failing_on(mut self, term: &str) -> Self {
        self.failing.insert(term.to_string());
        self
    }

    /// The `prioritize_recency` flag of every call, in order.
    pub fn recency_log(&self) -> Arc<Mutex<Vec<bool>>> {
        Arc::clone(&self.recency)
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(
        &self,
        term: &str,
        prioritize_recency: bool,
    ) -> anyhow::Result<Vec<CandidateSource>> {
        self.recency.lock().unwrap().push(prioritize_recency);
        if self.failing.contains(term) {
            return Err(ResearchError::external("static", "HTTP 500 Internal Server Error").into());
        }
        Ok(self.results.get(term).cloned().unwrap_or_default())
    }
}

/// Serves registered pages; anything else is a 404. Clones share state.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    pages: Arc<DashMap<String, String>>,
    fetches: Arc<DashMap<String, usize>>,
    latency: Duration,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map(|count| *count).unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        *self.fetches.entry(url.to_string()).or_insert(0) += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.pages
            .get(url)
            .map(|body| body.clone())
            .ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found for {}", url))
    }
}
