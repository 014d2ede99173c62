//! HTML content extraction for crawled pages.
//!
//! Produces one explicit [`PageContent`] per fetched document: cleaned
//! visible text plus the set of normalized outbound links that survive the
//! unwanted-keyword and social-media filters.

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::CrawlConfig;

/// Boilerplate subtrees that never contribute page text.
const EXCLUDED_TAGS: [&str; 6] = ["script", "style", "header", "footer", "nav", "aside"];

/// Lines shorter than this are navigation noise, not content.
const MIN_LINE_CHARS: usize = 20;

/// Pages whose cleaned text ends up below this yield no text at all.
const MIN_PAGE_CHARS: usize = 50;

/// Uniform result of parsing one fetched page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub text: String,
    pub links: Vec<Url>,
    pub status: u16,
}

/// Anchor filters sourced from the crawl configuration.
#[derive(Debug, Clone)]
pub struct LinkFilters {
    unwanted: Vec<String>,
    social: Vec<String>,
}

impl LinkFilters {
    pub fn from_config(config: &CrawlConfig) -> Self {
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect();
        Self {
            unwanted: lower(&config.unwanted_keywords),
            social: lower(&config.social_media_domains),
        }
    }

    /// An anchor is rejected when its href or visible text carries any
    /// unwanted keyword or social-media token.
    pub fn rejects(&self, href: &str, label: &str) -> bool {
        let href = href.to_lowercase();
        let label = label.to_lowercase();
        self.unwanted
            .iter()
            .chain(self.social.iter())
            .any(|token| href.contains(token) || label.contains(token))
    }
}

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").expect("anchor selector is valid"))
}

fn content_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("main, article").expect("content selector is valid"))
}

/// Parse one fetched document into text and filtered outbound links.
pub fn extract_page(base: &Url, status: u16, html: &str, filters: &LinkFilters) -> PageContent {
    let document = Html::parse_document(html);

    let content_root = document
        .select(content_selector())
        .next()
        .unwrap_or_else(|| document.root_element());
    let text = clean_text(&collect_text(content_root));

    let mut links = Vec::new();
    for anchor in document.select(anchor_selector()) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let label: String = anchor.text().collect();
        if filters.rejects(href, &label) {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        if matches!(resolved.scheme(), "http" | "https") {
            links.push(resolved);
        }
    }

    PageContent {
        text,
        links,
        status,
    }
}

/// Gather text nodes under `root`, skipping boilerplate subtrees.
fn collect_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| EXCLUDED_TAGS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if !excluded {
                raw.push_str(text);
                raw.push('\n');
            }
        }
    }
    raw
}

/// Collapse whitespace per line and drop navigation-length noise.
fn clean_text(raw: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect();

    let text = lines.join("\n");
    if text.chars().count() <= MIN_PAGE_CHARS {
        String::new()
    } else {
        text
    }
}
