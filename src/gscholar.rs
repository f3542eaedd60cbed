//! Google Scholar author-profile client.
//!
//! Scrapes the public profile pages: author search, the paginated
//! publication table, and the per-publication citation view.

use crate::config::PipelineConfig;
use crate::cookies::{Cookie, CookieManager};
use crate::error::{OptionExt, PubmetaError, Result};
use crate::retry::RetryPolicy;
use crate::source::{ProfileSource, PublicationDetail, PublicationRef, SubjectHandle};
use crate::throttle::Throttle;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Rows requested per publication-table page (Scholar's maximum)
const PAGE_SIZE: usize = 100;

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Google Scholar client implementing [`ProfileSource`].
pub struct ScholarClient {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
    retry: RetryPolicy,
    /// Paces profile-table page requests
    page_throttle: Mutex<Throttle>,
}

impl ScholarClient {
    /// Build a client from pipeline settings, loading stored cookies.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let cookies = CookieManager::default().load();
        if cookies.is_empty() {
            warn!("No cookies loaded. Run 'pubmeta cookies import <file>' if Scholar blocks requests.");
        } else {
            info!("Loaded {} cookies for Google Scholar", cookies.len());
        }

        let base_url = config
            .mirror
            .as_ref()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string());

        Ok(Self {
            client: build_http_client(config.proxy.as_deref(), config.request_timeout)?,
            base_url,
            cookie_header: build_cookie_header(&cookies),
            retry: config.retry,
            page_throttle: Mutex::new(
                Throttle::fixed(config.detail_delay).with_jitter(Duration::from_millis(500)),
            ),
        })
    }

    /// Client against an arbitrary base URL with no cookies or pacing.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(None, Duration::from_secs(30))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_header: String::new(),
            retry: RetryPolicy::none(),
            page_throttle: Mutex::new(Throttle::disabled()),
        })
    }

    fn citations_url(&self, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/citations", self.base_url))
            .map_err(|e| PubmetaError::Config(format!("Invalid base URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            // Force English locale for consistent parsing
            pairs.append_pair("hl", "en");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: &Url) -> Result<String> {
        self.retry
            .run("scholar page", || {
                fetch_page_with_cookies(&self.client, url, &self.cookie_header)
            })
            .await
    }
}

#[async_trait]
impl ProfileSource for ScholarClient {
    async fn find_subject(&self, name: &str) -> Result<SubjectHandle> {
        let url = self.citations_url(&[("view_op", "search_authors"), ("mauthors", name)])?;
        debug!(url = %url, "Searching author");
        let html = self.get(&url).await?;
        parse_author_search(&html)?
            .into_iter()
            .next()
            .ok_or_else(|| PubmetaError::SubjectNotFound(name.to_string()))
    }

    async fn list_publications(&self, subject: &SubjectHandle) -> Result<Vec<PublicationRef>> {
        let mut publications = Vec::new();
        let mut seen = HashSet::new();
        let page_size = PAGE_SIZE.to_string();

        loop {
            let cstart = publications.len().to_string();
            let url = self.citations_url(&[
                ("user", subject.id.as_str()),
                ("cstart", cstart.as_str()),
                ("pagesize", page_size.as_str()),
            ])?;

            self.page_throttle.lock().await.wait().await;
            let html = self.get(&url).await?;
            let rows = parse_publication_rows(&html)?;
            let count = rows.len();
            let before = publications.len();
            publications.extend(rows.into_iter().filter(|row| seen.insert(row.id.clone())));
            let added = publications.len() - before;
            debug!(cstart = %cstart, count, added, "Parsed publication rows");

            if count < PAGE_SIZE {
                break;
            }
            if added == 0 {
                warn!(cstart = %cstart, "Page repeated earlier rows, stopping pagination");
                break;
            }
        }

        info!(user = %subject.id, total = publications.len(), "Publication list complete");
        Ok(publications)
    }

    async fn fetch_detail(&self, publication: &PublicationRef) -> Result<PublicationDetail> {
        let url = self.citations_url(&[
            ("view_op", "view_citation"),
            ("citation_for_view", publication.id.as_str()),
        ])?;
        let html = self.get(&url).await?;
        let mut detail = parse_citation_view(&html)?;

        // The table row already carries these; keep them when the view omits them.
        if detail.year.is_empty() {
            detail.year = publication.year.clone();
        }
        if detail.citation_count.is_none() {
            detail.citation_count = publication.citation_count;
        }
        Ok(detail)
    }
}

/// Build cookie header string from cookie list
fn build_cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .filter(|c| c.domain.contains("google"))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build HTTP client with optional proxy
fn build_http_client(proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            PubmetaError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| PubmetaError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Fetch page content using HTTP client with cookies
async fn fetch_page_with_cookies(
    client: &reqwest::Client,
    url: &Url,
    cookie_header: &str,
) -> Result<String> {
    let mut request = client
        .get(url.as_str())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Cache-Control", "no-cache");

    if !cookie_header.is_empty() {
        request = request.header("Cookie", cookie_header);
    }

    let response = request.send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(PubmetaError::RateLimited(60));
    }

    if !status.is_success() {
        return Err(PubmetaError::Api {
            code: status.as_u16() as i32,
            message: format!("HTTP error: {}", status),
        });
    }

    let html = response.text().await?;
    if html.contains("Solving the above CAPTCHA") || html.contains("unusual traffic") {
        warn!(url = %url, "CAPTCHA detected");
        return Err(PubmetaError::Captcha);
    }
    Ok(html)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PubmetaError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract a query parameter from a (possibly relative) Scholar href.
fn query_param(href: &str, key: &str) -> Option<String> {
    let url = Url::parse(DEFAULT_SCHOLAR_URL).ok()?.join(href).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Parse the author search page into candidate profiles, best match first.
pub fn parse_author_search(html: &str) -> Result<Vec<SubjectHandle>> {
    let document = Html::parse_document(html);
    let card_selector = selector("div.gsc_1usr")?;
    let name_selector = selector("h3.gs_ai_name a")?;
    let aff_selector = selector("div.gs_ai_aff")?;

    let mut subjects = Vec::new();
    for card in document.select(&card_selector) {
        let Some(link) = card.select(&name_selector).next() else {
            continue;
        };
        let Some(id) = link
            .value()
            .attr("href")
            .and_then(|href| query_param(href, "user"))
        else {
            continue;
        };
        subjects.push(SubjectHandle {
            id,
            name: text_of(link),
            affiliation: card.select(&aff_selector).next().map(text_of).unwrap_or_default(),
        });
    }
    Ok(subjects)
}

/// Parse one page of a profile's publication table.
pub fn parse_publication_rows(html: &str) -> Result<Vec<PublicationRef>> {
    let document = Html::parse_document(html);
    let row_selector = selector("tr.gsc_a_tr")?;
    let title_selector = selector("a.gsc_a_at")?;
    let cites_selector = selector("a.gsc_a_ac")?;
    let year_selector = selector("span.gsc_a_h")?;

    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        let Some(link) = row.select(&title_selector).next() else {
            continue;
        };
        let href = link
            .value()
            .attr("href")
            .or_else(|| link.value().attr("data-href"))
            .unwrap_or("");
        let Some(id) = query_param(href, "citation_for_view") else {
            debug!(href, "Row without citation id");
            continue;
        };
        rows.push(PublicationRef {
            id,
            title: text_of(link),
            year: row.select(&year_selector).next().map(text_of).unwrap_or_default(),
            citation_count: row
                .select(&cites_selector)
                .next()
                .and_then(|e| parse_count(&text_of(e))),
        });
    }
    Ok(rows)
}

/// Parse a `view_citation` page into a detail record.
pub fn parse_citation_view(html: &str) -> Result<PublicationDetail> {
    let document = Html::parse_document(html);
    let title_selector = selector("#gsc_oci_title")?;
    let title_link_selector = selector("a.gsc_oci_title_link")?;
    let field_row_selector = selector("#gsc_oci_table div.gs_scl")?;
    let field_name_selector = selector("div.gsc_oci_field")?;
    let field_value_selector = selector("div.gsc_oci_value")?;

    let year_regex = Regex::new(r"\b(19|20)\d{2}\b").map_err(|e| PubmetaError::Parse(e.to_string()))?;
    let cite_regex = Regex::new(r"Cited by\s*(\d+)").map_err(|e| PubmetaError::Parse(e.to_string()))?;

    let title_elem = document
        .select(&title_selector)
        .next()
        .ok_or_parse("citation view has no title")?;

    let mut detail = PublicationDetail {
        title: text_of(title_elem),
        ..Default::default()
    };
    if let Some(link) = title_elem.select(&title_link_selector).next() {
        detail.title = text_of(link);
        detail.external_url = link.value().attr("href").unwrap_or("").to_string();
    }
    if detail.title.is_empty() {
        return Err(PubmetaError::Parse("citation view has an empty title".to_string()));
    }

    for row in document.select(&field_row_selector) {
        let (Some(name), Some(value)) = (
            row.select(&field_name_selector).next(),
            row.select(&field_value_selector).next(),
        ) else {
            continue;
        };
        let value_text = text_of(value);

        match text_of(name).as_str() {
            "Authors" | "Inventors" => {
                detail.author = value_text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" and ");
            }
            "Publication date" => {
                if let Some(m) = year_regex.find(&value_text) {
                    detail.year = m.as_str().to_string();
                }
            }
            "Description" => detail.abstract_text = value_text,
            "Total citations" => {
                detail.citation_count = cite_regex
                    .captures(&value_text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok());
            }
            _ => {}
        }
    }

    Ok(detail)
}
