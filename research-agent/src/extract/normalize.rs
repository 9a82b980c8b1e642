use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// Collapse blank runs, drop near-empty lines and repeated paragraphs.
pub fn clean_text(content: &str) -> String {
    let collapsed = BLANK_RUNS.replace_all(content, "\n\n");

    let kept = collapsed
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.chars().count() > 2
        })
        .collect::<Vec<_>>()
        .join("\n");
    let kept = BLANK_RUNS.replace_all(&kept, "\n\n");

    let mut seen = HashSet::new();
    kept.split("\n\n")
        .map(|paragraph| paragraph.trim_matches('\n'))
        .filter(|paragraph| seen.insert(*paragraph))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(clean_text("one\n\n\n\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn drops_short_lines_but_keeps_blank_ones() {
        assert_eq!(
            clean_text("Heading line\n|\n>>\nBody text here\n\nNext paragraph"),
            "Heading line\nBody text here\n\nNext paragraph"
        );
    }

    #[test]
    fn removes_duplicate_paragraphs() {
        let text = "Subscribe now\n\nReal content\n\nSubscribe now\n\nMore content";
        assert_eq!(clean_text(text), "Subscribe now\n\nReal content\n\nMore content");
    }

    #[test]
    fn trailing_newlines_do_not_hide_duplicates() {
        assert_eq!(clean_text("para\n\npara\n"), "para");
    }

    #[test]
    fn dropping_lines_can_not_reopen_blank_runs() {
        assert_eq!(clean_text("first\n\nx\n\nsecond"), "first\n\nsecond");
    }
}
