//! Web search backends for the search tool.

use crate::config::SearchSettings;
use crate::error::{AgentHostError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

/// A single web search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Something that can answer web search queries.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo HTML endpoint search. No API key required.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let endpoint = url::Url::parse(&settings.endpoint)
            .map_err(|e| AgentHostError::Config(format!("Invalid search endpoint: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);

        debug!("Searching: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentHostError::Search(format!(
                "search endpoint returned HTTP {}",
                status
            )));
        }

        let body = response.text().await?;
        let mut hits = parse_results(&body)?;
        hits.truncate(max_results);
        Ok(hits)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| AgentHostError::Search(format!("Invalid selector {:?}: {:?}", css, e)))
}

/// Extract results from a DuckDuckGo HTML results page.
///
/// Each `div.result` container yields one hit. A container without a
/// snippet gets an empty one.
pub fn parse_results(html: &str) -> Result<Vec<SearchHit>> {
    let result_sel = selector("div.result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let hits = document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let url = resolve_link(link.value().attr("href").unwrap_or_default());
            if url.is_empty() {
                return None;
            }
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            Some(SearchHit {
                title: element_text(link),
                url,
                snippet,
            })
        })
        .collect();
    Ok(hits)
}

/// Unwrap DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=<target>`).
fn resolve_link(href: &str) -> String {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match url::Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render hits as the text handed back to the model.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                hit.title,
                hit.url,
                hit.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run a search and always produce text: failures are reported inline
/// instead of being returned as errors.
pub async fn search_text(backend: &dyn SearchBackend, query: &str, max_results: usize) -> String {
    match backend.search(query, max_results).await {
        Ok(hits) => format_hits(&hits),
        Err(e) => {
            warn!("Search for {:?} failed: {}", query, e);
            format!("Error performing search: {}", e)
        }
    }
}
