//! arXiv title search.
//!
//! Queries the public Atom API (`export.arxiv.org/api/query`) ranked by
//! relevance and returns `(title, pdf link)` candidates.

use crate::error::{PubmetaError, Result};
use crate::retry::RetryPolicy;
use crate::source::{Candidate, PreprintSearch};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// arXiv API query endpoint
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ArxivClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        Self::with_base_url(ARXIV_API_URL, timeout, retry)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("pubmeta/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| PubmetaError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            retry,
        })
    }

    fn search_url(&self, title: &str, limit: usize) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PubmetaError::Config(format!("Invalid arXiv URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("search_query", &build_search_query(title))
            .append_pair("start", "0")
            .append_pair("max_results", &limit.to_string())
            .append_pair("sortBy", "relevance");
        Ok(url)
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PubmetaError::RateLimited(3));
        }
        if !status.is_success() {
            return Err(PubmetaError::Api {
                code: status.as_u16() as i32,
                message: format!("arXiv API error: {}", status),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PreprintSearch for ArxivClient {
    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Candidate>> {
        if title.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let url = self.search_url(title, limit)?;
        debug!(url = %url, "Searching arXiv");

        let xml = self.retry.run("arxiv search", || self.fetch(&url)).await?;
        let mut candidates = parse_atom_candidates(&xml)?;
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// Conjunction of the title's words over all fields.
fn build_search_query(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| format!("all:{}", w))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an Atom feed into candidates, preserving rank order.
pub fn parse_atom_candidates(xml: &str) -> Result<Vec<Candidate>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| PubmetaError::Parse(format!("invalid atom xml: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| {
                    l.title.as_deref() == Some("pdf")
                        || l.link_type.as_deref() == Some("application/pdf")
                })
                .and_then(|l| l.href.clone())
                .unwrap_or_else(|| entry.id.trim().replace("/abs/", "/pdf/"));
            Candidate {
                title: clean_text(&entry.title),
                link,
            }
        })
        .collect())
}
