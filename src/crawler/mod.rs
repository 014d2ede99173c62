//! Depth-bounded, concurrency-bounded web crawler.
//!
//! Traversal is breadth-first by depth layer: every frontier URL at depth
//! *d* is fetched concurrently (bounded by a counting semaphore) before
//! depth *d+1* begins. The frontier is an explicit worklist, never
//! recursion, so wide graphs cannot grow the call stack.
//!
//! Per-URL failures are logged and skipped; a crawl session never fails as
//! a whole.

mod extract;

pub use extract::{LinkFilters, PageContent};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use url::Url;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum link depth from the seed (seed itself is depth 0).
    pub max_depth: usize,
    /// Maximum in-flight fetches per crawl session.
    pub max_concurrency: usize,
    /// Ceiling on fetch attempts per session.
    pub max_pages: usize,
    /// Restrict traversal to the seed's host.
    pub same_domain_only: bool,
    pub fetch_timeout_secs: u64,
    pub unwanted_keywords: Vec<String>,
    pub social_media_domains: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrency: 8,
            max_pages: 200,
            same_domain_only: true,
            fetch_timeout_secs: 10,
            unwanted_keywords: [
                "signup", "signin", "register", "login", "billing", "pricing", "contact",
            ]
            .map(String::from)
            .to_vec(),
            social_media_domains: ["youtube", "twitter", "facebook", "linkedin"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// One page produced by a crawl session.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: Url,
    pub depth: usize,
    pub text: String,
}

pub struct FrontierCrawler {
    client: reqwest::Client,
    config: CrawlConfig,
}

struct FetchedPage {
    status: u16,
    /// `None` when the response was non-success or not HTML.
    body: Option<String>,
}

impl FrontierCrawler {
    pub fn new(config: CrawlConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl outward from `seed`, returning pages in completion order
    /// within each depth layer.
    pub async fn crawl(&self, seed: &Url) -> Vec<CrawledPage> {
        let filters = LinkFilters::from_config(&self.config);
        let seed_host = host_of(seed);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));

        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut attempted = 0usize;

        let mut frontier = vec![normalize(seed)];
        visited.insert(frontier[0].as_str().to_string());

        let mut depth = 0usize;
        while !frontier.is_empty()
            && depth <= self.config.max_depth
            && attempted < self.config.max_pages
        {
            let budget = self.config.max_pages - attempted;
            let layer: Vec<Url> = frontier.drain(..).take(budget).collect();
            attempted += layer.len();

            let mut in_flight = FuturesUnordered::new();
            for url in layer {
                let client = self.client.clone();
                let semaphore = semaphore.clone();
                in_flight.push(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = fetch(&client, &url).await;
                    (url, outcome)
                });
            }

            let mut next_layer: Vec<Url> = Vec::new();
            while let Some((url, outcome)) = in_flight.next().await {
                match outcome {
                    Ok(FetchedPage {
                        status,
                        body: Some(html),
                    }) => {
                        let content = extract::extract_page(&url, status, &html, &filters);
                        if !content.text.is_empty() {
                            pages.push(CrawledPage {
                                url: url.clone(),
                                depth,
                                text: content.text,
                            });
                        }
                        for link in content.links {
                            if self.config.same_domain_only && host_of(&link) != seed_host {
                                continue;
                            }
                            if visited.insert(link.as_str().to_string()) {
                                next_layer.push(link);
                            }
                        }
                    }
                    Ok(FetchedPage { status, body: None }) => {
                        tracing::debug!(%url, status, "skipping non-success or non-html page");
                    }
                    Err(err) => {
                        tracing::warn!(%url, error = %err, "page fetch failed");
                    }
                }
            }

            frontier = next_layer;
            depth += 1;
        }

        pages
    }
}

async fn fetch(client: &reqwest::Client, url: &Url) -> Result<FetchedPage, ApiError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ApiError::Fetch(e.to_string()))?;

    let status = response.status();
    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);

    if !status.is_success() || !is_html {
        return Ok(FetchedPage {
            status: status.as_u16(),
            body: None,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Fetch(e.to_string()))?;
    Ok(FetchedPage {
        status: status.as_u16(),
        body: Some(body),
    })
}

fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

fn host_of(url: &Url) -> Option<String> {
    url.host_str()
        .map(|host| host.trim_start_matches("www.").to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn page(body: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">Follow this link onward</a>"#))
            .collect();
        format!(
            "<html><body><main><p>{body} This sentence pads the page above the noise \
             threshold for extraction.</p>{anchors}</main></body></html>"
        )
    }

    fn crawler(max_depth: usize, max_pages: usize) -> FrontierCrawler {
        FrontierCrawler::new(CrawlConfig {
            max_depth,
            max_concurrency: 2,
            max_pages,
            ..CrawlConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn unwanted_links_are_never_fetched() {
        let server = MockServer::start_async().await;
        let _root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Seed page content.", &["/about", "/login"]));
            })
            .await;
        let about = server
            .mock_async(|when, then| {
                when.method(GET).path("/about");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("About page content.", &[]));
            })
            .await;
        let login = server
            .mock_async(|when, then| {
                when.method(GET).path("/login");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Login page content.", &[]));
            })
            .await;

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(1, 200).crawl(&seed).await;

        assert_eq!(pages.len(), 2);
        about.assert_hits_async(1).await;
        login.assert_hits_async(0).await;
        assert!(pages.iter().all(|p| !p.url.path().contains("login")));
    }

    #[tokio::test]
    async fn cyclic_links_are_fetched_once() {
        let server = MockServer::start_async().await;
        let root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Page a content.", &["/b", "/"]));
            })
            .await;
        let b = server
            .mock_async(|when, then| {
                when.method(GET).path("/b");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Page b content.", &["/", "/b"]));
            })
            .await;

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(3, 200).crawl(&seed).await;

        root.assert_hits_async(1).await;
        b.assert_hits_async(1).await;
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn depth_layers_stop_at_max_depth() {
        let server = MockServer::start_async().await;
        let _root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Root page content.", &["/b"]));
            })
            .await;
        let _b = server
            .mock_async(|when, then| {
                when.method(GET).path("/b");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Level one content.", &["/c"]));
            })
            .await;
        let c = server
            .mock_async(|when, then| {
                when.method(GET).path("/c");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Level two content.", &[]));
            })
            .await;

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(1, 200).crawl(&seed).await;

        c.assert_hits_async(0).await;
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.depth <= 1));
    }

    #[tokio::test]
    async fn page_ceiling_caps_fetch_attempts() {
        let server = MockServer::start_async().await;
        let _root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page(
                        "Hub page content.",
                        &["/p1", "/p2", "/p3", "/p4", "/p5"],
                    ));
            })
            .await;
        for i in 1..=5 {
            server
                .mock_async(move |when, then| {
                    when.method(GET).path(format!("/p{i}"));
                    then.status(200)
                        .header("content-type", "text/html")
                        .body(page("Leaf page content.", &[]));
                })
                .await;
        }

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(2, 3).crawl(&seed).await;

        // seed plus two leaves: the ceiling bounds attempts, not successes
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test]
    async fn non_html_and_error_responses_are_silent_skips() {
        let server = MockServer::start_async().await;
        let _root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page("Seed page content.", &["/data", "/missing"]));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(GET).path("/data");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{\"not\": \"html\"}");
            })
            .await;
        let missing = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404)
                    .header("content-type", "text/html")
                    .body("gone");
            })
            .await;

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(1, 200).crawl(&seed).await;

        data.assert_hits_async(1).await;
        missing.assert_hits_async(1).await;
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn off_domain_links_are_filtered_when_restricted() {
        let server = MockServer::start_async().await;
        let _root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(page(
                        "Seed page content.",
                        &["http://elsewhere.invalid/page"],
                    ));
            })
            .await;

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler(2, 200).crawl(&seed).await;

        // only the seed: the external host is dropped before any fetch
        assert_eq!(pages.len(), 1);
    }
}
