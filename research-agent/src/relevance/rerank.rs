//! Phase B: model-assisted re-ranking of the lexical top window.

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::RelevanceConfig;
use crate::llm::decode::{decode_json, ranking_entries};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{QueryIntent, ScoredDocument};
use crate::util::excerpt;

pub const RANKING_PREAMBLE: &str =
    "You are a content relevance expert. Analyze content and rank by relevance.";

/// One entry of the model's ordered judgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub id: usize,
    pub score: u32,
    pub reason: Option<String>,
}

pub fn ranking_prompt(intent: &QueryIntent, window: &[ScoredDocument], sample_chars: usize) -> String {
    let mut prompt = format!(
        "Analyze these content items and rank them by relevance to the research query.\n\n\
         Research Query Analysis:\n\
         - Type: {}\n\
         - Topics: {}\n\
         - Search Terms: {}\n\
         - Time Sensitivity: {}\n\n\
         Content Items to Rank:\n",
        intent.query_type.as_str(),
        intent.topics.join(", "),
        intent.search_terms.join(", "),
        intent.time_sensitivity.as_str(),
    );

    for (id, document) in window.iter().enumerate() {
        prompt.push_str(&format!(
            "\nITEM {}:\nTitle: {}\nURL: {}\nContent Sample: {}\n",
            id,
            document.title(),
            document.url(),
            excerpt(document.text(), sample_chars),
        ));
    }

    prompt.push_str(
        r#"
Rank these items by relevance to the research query. For each item, provide:
1. Relevance score (0-100)
2. Brief reason for the ranking

Return your analysis as a JSON object with this structure:
{
    "rankings": [
        {
            "id": 0,
            "relevance_score": 95,
            "reason": "Directly addresses the main topics with recent information"
        }
    ]
}

Sort the rankings from most relevant to least relevant.
"#,
    );
    prompt
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|id| id as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_score(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u32)
        .unwrap_or(0)
}

/// Decode a ranking payload; `None` when nothing ranking-shaped came back.
pub fn parse_rankings(raw: &str) -> Option<Vec<Ranking>> {
    let entries = ranking_entries(decode_json(raw)?)?;
    Some(
        entries
            .iter()
            .filter_map(|entry| {
                let id = as_index(entry.get("id")?)?;
                Some(Ranking {
                    id,
                    score: as_score(entry.get("relevance_score").or_else(|| entry.get("score"))),
                    reason: entry
                        .get("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .filter(|r| !r.is_empty()),
                })
            })
            .collect(),
    )
}

/// `10 - index` over the window, in lexical order.
pub fn default_rankings(len: usize) -> Vec<Ranking> {
    (0..len)
        .map(|id| Ranking {
            id,
            score: 10u32.saturating_sub(id as u32),
            reason: None,
        })
        .collect()
}

/// Reorder `window` by `rankings`; unranked documents follow in their original order.
pub fn apply_rankings(
    window: Vec<ScoredDocument>,
    rankings: &[Ranking],
    score_cap: u32,
) -> Vec<ScoredDocument> {
    let mut slots: Vec<Option<ScoredDocument>> = window.into_iter().map(Some).collect();
    let mut ranked = Vec::with_capacity(slots.len());
    let mut used = HashSet::new();

    for ranking in rankings {
        if !used.insert(ranking.id) {
            continue;
        }
        if let Some(mut document) = slots.get_mut(ranking.id).and_then(Option::take) {
            document.relevance_score = ranking.score.min(score_cap);
            document.rationale = ranking.reason.clone();
            ranked.push(document);
        }
    }

    ranked.extend(slots.into_iter().flatten());
    ranked
}

/// Re-rank the top window; never fails, only loses fidelity.
pub async fn rerank(
    model: &dyn LanguageModel,
    intent: &QueryIntent,
    mut survivors: Vec<ScoredDocument>,
    config: &RelevanceConfig,
) -> Vec<ScoredDocument> {
    survivors.truncate(config.rerank_window);
    let request = CompletionRequest::new(
        RANKING_PREAMBLE,
        ranking_prompt(intent, &survivors, config.rerank_sample_chars),
    );

    let rankings = match model.complete(request).await {
        Ok(raw) => parse_rankings(&raw).unwrap_or_else(|| {
            warn!("ranking response was not usable, using default ranking");
            default_rankings(survivors.len())
        }),
        Err(e) => {
            warn!(error = %e, "ranking call failed, using default ranking");
            default_rankings(survivors.len())
        }
    };
    debug!(rankings = rankings.len(), window = survivors.len(), "applying rankings");

    apply_rankings(survivors, &rankings, config.score_cap)
}
