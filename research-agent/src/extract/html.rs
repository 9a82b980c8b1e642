//! Generic extraction: pick a content container and keep its headings, paragraphs and list items.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::models::ExtractionMethod;
use crate::util::compact_ws;

/// Elements whose text never counts as content.
const STRIPPED_TAGS: [&str; 6] = ["script", "style", "nav", "footer", "header", "noscript"];

const MIN_CONTAINER_CHARS: usize = 100;
const MIN_STRUCTURED_CHARS: usize = 100;

static CONTENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(content|main|article)").expect("Invalid regex"));
static CONTENT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(content|main|article|post)").expect("Invalid regex"));

fn is_stripped(element: &ElementRef) -> bool {
    std::iter::once(**element)
        .chain(element.ancestors())
        .filter_map(|node| node.value().as_element().map(|e| e.name()))
        .any(|name| STRIPPED_TAGS.contains(&name))
}

/// Visible text of `element` with whitespace compacted.
pub fn element_text(element: ElementRef) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element().map(|e| e.name()))
            .any(|name| STRIPPED_TAGS.contains(&name));
        if !hidden {
            text.push_str(fragment);
        }
    }
    compact_ws(&text)
}

/// One line per visible text node.
fn text_lines(element: ElementRef) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| {
            let Node::Text(fragment) = node.value() else {
                return None;
            };
            let hidden = node
                .ancestors()
                .filter_map(|a| a.value().as_element().map(|e| e.name()))
                .any(|name| STRIPPED_TAGS.contains(&name));
            let line = compact_ws(fragment);
            (!hidden && !line.is_empty()).then_some(line)
        })
        .collect()
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).find(|e| !is_stripped(e))
}

fn find_by_attr<'a>(document: &'a Html, attr: &str, pattern: &Regex) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!("[{}]", attr)).ok()?;
    document.select(&selector).find(|e| {
        let matched = if attr == "class" {
            e.value().classes().any(|class| pattern.is_match(class))
        } else {
            e.value().attr(attr).is_some_and(|v| pattern.is_match(v))
        };
        matched && !is_stripped(e)
    })
}

/// First container, in priority order, holding enough visible text.
fn content_container(document: &Html) -> Option<ElementRef<'_>> {
    let candidates = [
        select_first(document, "main"),
        select_first(document, "article"),
        find_by_attr(document, "id", &CONTENT_ID),
        find_by_attr(document, "class", &CONTENT_CLASS),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|container| element_text(*container).chars().count() > MIN_CONTAINER_CHARS)
        .or_else(|| select_first(document, "body"))
}

fn heading_level(name: &str) -> Option<usize> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some((level - b'0') as usize),
        _ => None,
    }
}

/// Generic pass over raw markup; `None` when the page shows no text besides its title.
pub fn extract_generic(html: &str) -> Option<(String, ExtractionMethod)> {
    let document = Html::parse_document(html);
    let title = select_first(&document, "title")
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No Title".to_string());

    let root = content_container(&document)?;
    let blocks = Selector::parse("h1, h2, h3, h4, h5, h6, p, li").ok()?;

    let mut parts = vec![format!("# {}\n", title)];
    for element in root.select(&blocks) {
        if is_stripped(&element) {
            continue;
        }
        let text = element_text(element);
        if text.is_empty() {
            continue;
        }
        match heading_level(element.value().name()) {
            Some(level) => parts.push(format!("{} {}\n", "#".repeat(level), text)),
            None => parts.push(format!("{}\n", text)),
        }
    }

    let structured = parts.join("\n");
    if structured.trim().chars().count() > MIN_STRUCTURED_CHARS {
        return Some((structured, ExtractionMethod::Generic));
    }

    let all_text = text_lines(document.root_element())
        .into_iter()
        .filter(|line| *line != title)
        .collect::<Vec<_>>()
        .join("\n");
    if all_text.is_empty() {
        return None;
    }
    Some((format!("# {}\n\n{}", title, all_text), ExtractionMethod::FullPage))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "Rust is a multi-paradigm, general-purpose programming language that emphasizes performance, type safety, and concurrency.";

    #[test]
    fn prefers_main_and_renders_heading_levels() {
        let html = format!(
            r#"<html><head><title>Rust</title><script>var x = 1;</script></head><body>
                <header><h1>Site banner</h1></header>
                <nav><ul><li>Home</li><li>About</li></ul></nav>
                <main>
                    <h1>Rust language</h1>
                    <p>{LONG}</p>
                    <h3>History</h3>
                    <ul><li>Started in 2006</li></ul>
                </main>
                <footer><p>Copyright</p></footer>
            </body></html>"#
        );
        let (text, method) = extract_generic(&html).unwrap();
        assert_eq!(method, ExtractionMethod::Generic);
        assert!(text.starts_with("# Rust\n"));
        assert!(text.contains("# Rust language\n"));
        assert!(text.contains("### History\n"));
        assert!(text.contains("Started in 2006"));
        assert!(!text.contains("Site banner"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn class_prefixed_container_when_no_semantic_tags() {
        let html = format!(
            r#"<html><body>
                <div class="sidebar"><p>Related links and other noise</p></div>
                <div class="wide post-body"><p>{LONG}</p></div>
            </body></html>"#
        );
        let document = Html::parse_document(&html);
        let container = content_container(&document).unwrap();
        assert!(container.value().classes().any(|c| c == "post-body"));

        let (text, _) = extract_generic(&html).unwrap();
        assert!(text.starts_with("# No Title\n"));
        assert!(!text.contains("Related links"));
    }

    #[test]
    fn short_containers_are_skipped_for_body() {
        let html = format!(
            r#"<html><body><main><p>tiny</p></main><div><p>{LONG}</p></div></body></html>"#
        );
        let (text, method) = extract_generic(&html).unwrap();
        assert_eq!(method, ExtractionMethod::Generic);
        assert!(text.contains("tiny"));
        assert!(text.contains("general-purpose"));
    }

    #[test]
    fn falls_back_to_full_page_text() {
        let html = r#"<html><head><title>Sparse</title></head><body>
            <div>Just a div</div><span>and a span</span><script>ignored()</script>
        </body></html>"#;
        let (text, method) = extract_generic(html).unwrap();
        assert_eq!(method, ExtractionMethod::FullPage);
        assert_eq!(text, "# Sparse\n\nJust a div\nand a span");
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let html = "<html><body><p>It sits on the <b>Seine</b>.</p></body></html>";
        let document = Html::parse_document(html);
        let p = select_first(&document, "p").unwrap();
        assert_eq!(element_text(p), "It sits on the Seine.");
    }

    #[test]
    fn heading_levels() {
        assert_eq!(heading_level("h2"), Some(2));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("hr"), None);
        assert_eq!(heading_level("p"), None);
    }
}
