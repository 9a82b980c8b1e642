//! Structured article strategy: metadata plus the body paragraphs of an article container.

use chrono::{DateTime, NaiveDate};
use scraper::{ElementRef, Html, Selector};

use super::html::element_text;

const TITLE_SELECTORS: [&str; 3] = [r#"meta[property="og:title"]"#, "title", "h1"];

const DATE_SELECTORS: [&str; 6] = [
    r#"meta[property="article:published_time"]"#,
    r#"meta[property="og:published_time"]"#,
    r#"meta[name="date"]"#,
    r#"meta[name="pubdate"]"#,
    r#"meta[itemprop="datePublished"]"#,
    "time[datetime]",
];

const BODY_SELECTORS: [&str; 2] = [r#"[itemprop="articleBody"]"#, "article"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: Option<String>,
    /// `YYYY-MM-DD`
    pub published: Option<String>,
    pub authors: Vec<String>,
    pub body: String,
}

impl Article {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            title: first_match(&document, &TITLE_SELECTORS),
            published: DATE_SELECTORS
                .iter()
                .filter_map(|sel| Selector::parse(sel).ok())
                .flat_map(|sel| {
                    document
                        .select(&sel)
                        .filter_map(attribute_or_text)
                        .collect::<Vec<_>>()
                })
                .find_map(|raw| normalize_date(&raw)),
            authors: authors(&document),
            body: body(&document),
        }
    }

    /// Markdown-ish rendering; `None` when there is no body to speak of.
    pub fn render(&self) -> Option<String> {
        if self.body.trim().is_empty() {
            return None;
        }

        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("# {}\n", title));
        }
        if let Some(date) = &self.published {
            parts.push(format!("Published: {}\n", date));
        }
        if !self.authors.is_empty() {
            parts.push(format!("Authors: {}\n", self.authors.join(", ")));
        }
        parts.push(self.body.clone());
        Some(parts.join("\n"))
    }
}

fn first_match(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|sel| document.select(&sel).find_map(attribute_or_text))
}

/// `content` for meta tags, `datetime` for time tags, text for everything else.
fn attribute_or_text(element: ElementRef) -> Option<String> {
    let value = element.value();
    let raw = match value.name() {
        "meta" => value.attr("content").map(str::to_string),
        "time" => value.attr("datetime").map(str::to_string),
        _ => Some(element_text(element)),
    }?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn authors(document: &Html) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for sel in [r#"meta[name="author"]"#, r#"[rel="author"]"#] {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        for name in document.select(&selector).filter_map(attribute_or_text) {
            if !found.contains(&name) {
                found.push(name);
            }
        }
    }
    found
}

fn body(document: &Html) -> String {
    let Ok(paragraphs) = Selector::parse("p") else {
        return String::new();
    };

    BODY_SELECTORS
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|sel| document.select(&sel).next())
        .map(|container| {
            container
                .select(&paragraphs)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default()
}

/// RFC 3339 timestamps or anything starting with `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive().format("%Y-%m-%d").to_string());
    }
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}
