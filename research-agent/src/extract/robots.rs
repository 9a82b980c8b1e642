//! robots.txt parsing and the per-origin permission cache.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use super::PageFetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Rules from one robots.txt that apply to our user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
}

impl RobotsPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse `body`, keeping the group that names `user_agent`, or the `*` group.
    pub fn parse(body: &str, user_agent: &str) -> Self {
        let product = user_agent
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        let mut groups: Vec<Group> = Vec::new();
        let mut in_agent_lines = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        groups.push(Group::default());
                        in_agent_lines = true;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    in_agent_lines = false;
                    // An empty Disallow restricts nothing.
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.rules.push(Rule {
                            allow: field == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        let named = groups.iter().find(|g| {
            g.agents
                .iter()
                .any(|agent| agent != "*" && !product.is_empty() && product.contains(agent.as_str()))
        });
        let chosen = named.or_else(|| groups.iter().find(|g| g.agents.iter().any(|a| a == "*")));

        Self {
            rules: chosen.map(|g| g.rules.clone()).unwrap_or_default(),
        }
    }

    /// Longest matching pattern decides; an Allow wins a tie.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && (best_allow || !rule.allow)) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }
        best.map(|(_, allow)| allow).unwrap_or(true)
    }
}

/// `*` matches any run of characters; a trailing `$` anchors at the end.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return !anchored || pos == path.len();
    }

    for (i, part) in rest.iter().enumerate() {
        if anchored && i == rest.len() - 1 {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(offset) => pos += offset + part.len(),
            None => return false,
        }
    }
    true
}

/// Parsed policies keyed by origin, kept for the extractor's lifetime.
///
/// Each origin's robots.txt is fetched at most once, even when several
/// workers ask about the same origin at the same time. A robots.txt that
/// cannot be fetched caches as allow-all.
pub struct PermissionCache {
    user_agent: String,
    policies: DashMap<String, Arc<OnceCell<Arc<RobotsPolicy>>>>,
}

impl PermissionCache {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            policies: DashMap::new(),
        }
    }

    pub async fn is_allowed(&self, url: &Url, fetcher: &dyn PageFetcher) -> bool {
        let origin = url.origin().ascii_serialization();
        // Clone the cell out so no map shard stays locked across the fetch.
        let cell = Arc::clone(self.policies.entry(origin.clone()).or_default().value());
        let policy = cell
            .get_or_init(|| async { Arc::new(self.load(&origin, fetcher).await) })
            .await;

        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        policy.is_allowed(&path)
    }

    async fn load(&self, origin: &str, fetcher: &dyn PageFetcher) -> RobotsPolicy {
        let robots_url = format!("{}/robots.txt", origin);
        match fetcher.fetch(&robots_url).await {
            Ok(body) => {
                debug!(origin, "loaded robots.txt");
                RobotsPolicy::parse(&body, &self.user_agent)
            }
            Err(e) => {
                warn!(origin, error = %e, "could not read robots.txt, assuming allowed");
                RobotsPolicy::allow_all()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;
    use futures::future::join_all;
    use std::time::Duration;

    const ROBOTS: &str = "\
# example
User-agent: *
Disallow: /private/
Allow: /private/press
Disallow: /*.pdf$

User-agent: BadBot
User-agent: WebResearchAgent
Disallow: /drafts
";

    #[test]
    fn wildcard_group_rules() {
        let policy = RobotsPolicy::parse(ROBOTS, "SomeCrawler/2.0");
        assert!(policy.is_allowed("/public/page"));
        assert!(!policy.is_allowed("/private/notes"));
        assert!(policy.is_allowed("/private/press/release"));
        assert!(!policy.is_allowed("/files/report.pdf"));
        assert!(policy.is_allowed("/files/report.pdf?download=1"));
    }

    #[test]
    fn named_group_beats_wildcard() {
        let policy = RobotsPolicy::parse(ROBOTS, "WebResearchAgent/1.0");
        assert!(!policy.is_allowed("/drafts/one"));
        assert!(policy.is_allowed("/private/notes"));
    }

    #[test]
    fn ties_go_to_allow_and_empty_disallow_is_noop() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /a\nAllow: /a\n", "x");
        assert!(policy.is_allowed("/a/b"));

        let open = RobotsPolicy::parse("User-agent: *\nDisallow:\n", "x");
        assert!(open.is_allowed("/anything"));
    }

    #[test]
    fn pattern_matching() {
        assert!(pattern_matches("/a*/c", "/a/b/c"));
        assert!(pattern_matches("/", "/x"));
        assert!(!pattern_matches("/x$", "/xy"));
        assert!(pattern_matches("/x$", "/x"));
        assert!(!pattern_matches("/*.php$", "/index.php5"));
    }

    #[tokio::test]
    async fn caches_per_origin_and_allows_on_failure() {
        let fetcher = StaticFetcher::new().with_page(
            "https://site.test/robots.txt",
            "User-agent: *\nDisallow: /secret\n",
        );
        let cache = PermissionCache::new("WebResearchAgent/1.0");

        let secret = Url::parse("https://site.test/secret/page").unwrap();
        let open = Url::parse("https://site.test/open").unwrap();
        assert!(!cache.is_allowed(&secret, &fetcher).await);
        assert!(cache.is_allowed(&open, &fetcher).await);
        assert_eq!(fetcher.fetch_count("https://site.test/robots.txt"), 1);

        let elsewhere = Url::parse("https://other.test/secret").unwrap();
        assert!(cache.is_allowed(&elsewhere, &fetcher).await);
        assert!(cache.is_allowed(&elsewhere, &fetcher).await);
        assert_eq!(fetcher.fetch_count("https://other.test/robots.txt"), 1);
    }

    #[tokio::test]
    async fn concurrent_checks_on_one_origin_fetch_robots_once() {
        let fetcher = StaticFetcher::new()
            .with_latency(Duration::from_millis(20))
            .with_page("https://same.test/robots.txt", "User-agent: *\nDisallow: /3\n");
        let cache = PermissionCache::new("WebResearchAgent/1.0");

        let urls: Vec<Url> = (0..4)
            .map(|i| Url::parse(&format!("https://same.test/{}", i)).unwrap())
            .collect();
        let verdicts = join_all(urls.iter().map(|url| cache.is_allowed(url, &fetcher))).await;

        assert_eq!(verdicts, vec![true, true, true, false]);
        assert_eq!(fetcher.fetch_count("https://same.test/robots.txt"), 1);
    }
}
