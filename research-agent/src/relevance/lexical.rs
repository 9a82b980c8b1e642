//! Phase A: deterministic lexical scoring.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::RelevanceConfig;
use crate::models::{ExtractedDocument, QueryIntent, ScoredDocument};

pub const STOP_WORDS: [&str; 15] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by", "about",
    "of",
];

const TITLE_TERM_POINTS: u32 = 10;
const TITLE_CAP: u32 = 50;
const URL_TERM_POINTS: u32 = 3;
const URL_CAP: u32 = 15;
const CONTENT_OCCURRENCE_CAP: usize = 5;
const CONTENT_OCCURRENCE_POINTS: u32 = 2;
const PHRASE_IN_CONTENT: u32 = 15;
const PHRASE_IN_TITLE: u32 = 25;

/// Lowercased key terms and multi-word phrases drawn from an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
}

impl TermSet {
    pub fn from_intent(intent: &QueryIntent) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for source in intent.search_terms.iter().chain(intent.topics.iter()) {
            for token in source.to_lowercase().split_whitespace() {
                if token.chars().count() <= 2 || STOP_WORDS.contains(&token) {
                    continue;
                }
                if !terms.iter().any(|t| t == token) {
                    terms.push(token.to_string());
                }
            }
        }

        let phrases = intent
            .search_terms
            .iter()
            .filter(|term| term.split_whitespace().count() > 1)
            .map(|term| term.trim().to_lowercase())
            .collect();

        Self { terms, phrases }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    /// Raw additive score of one document as of `today`.
    pub fn score(&self, document: &ExtractedDocument, today: NaiveDate) -> u32 {
        let title = document.source.title.to_lowercase();
        let url = document.source.url.to_lowercase();
        let content = document.text.to_lowercase();

        let title_hits = self.terms.iter().filter(|t| title.contains(t.as_str())).count() as u32;
        let url_hits = self.terms.iter().filter(|t| url.contains(t.as_str())).count() as u32;

        let mut score = (title_hits * TITLE_TERM_POINTS).min(TITLE_CAP)
            + (url_hits * URL_TERM_POINTS).min(URL_CAP);

        score += self
            .terms
            .iter()
            .map(|t| content.matches(t.as_str()).count().min(CONTENT_OCCURRENCE_CAP) as u32)
            .sum::<u32>()
            * CONTENT_OCCURRENCE_POINTS;

        for phrase in &self.phrases {
            if content.contains(phrase.as_str()) {
                score += PHRASE_IN_CONTENT;
            }
            if title.contains(phrase.as_str()) {
                score += PHRASE_IN_TITLE;
            }
        }

        score += document
            .publish_date
            .as_deref()
            .and_then(parse_publish_date)
            .map(|published| recency_bonus((today - published).num_days()))
            .unwrap_or(0);

        score + length_bonus(content.split_whitespace().count())
    }
}

fn recency_bonus(days_old: i64) -> u32 {
    match days_old {
        d if d < 30 => 10,
        d if d < 90 => 5,
        d if d < 365 => 2,
        _ => 0,
    }
}

fn length_bonus(words: usize) -> u32 {
    match words {
        w if w > 1000 => 5,
        w if w > 500 => 3,
        w if w > 200 => 1,
        _ => 0,
    }
}

/// ISO-8601 dates and timestamps, with or without offset. Anything else is `None`.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Score, threshold, cap, sort (stable) and truncate.
pub fn score_documents(
    intent: &QueryIntent,
    documents: &[ExtractedDocument],
    today: NaiveDate,
    config: &RelevanceConfig,
) -> Vec<ScoredDocument> {
    let terms = TermSet::from_intent(intent);

    let mut survivors: Vec<ScoredDocument> = documents
        .iter()
        .filter_map(|document| {
            let raw = terms.score(document, today);
            (raw > config.inclusion_threshold)
                .then(|| ScoredDocument::new(document.clone(), raw.min(config.score_cap)))
        })
        .collect();

    survivors.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    survivors.truncate(config.max_results);
    survivors
}
