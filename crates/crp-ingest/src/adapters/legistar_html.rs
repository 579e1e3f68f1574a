//! Legistar HTML-scrape fallback adapter
//!
//! Used when a jurisdiction has no web API. Discovery scrapes the meeting
//! calendar page for detail links; each detail page is fetched individually
//! and reduced to a meeting record with a heuristically extracted title.
//! Detail pages carry no natural identifier, so stable ids are minted from
//! the content hash.

use async_trait::async_trait;
use chrono::Utc;
use crp_common::hash::{content_hash, short_hash};
use crp_common::types::{RecordType, RobotsPolicy};
use scraper::{Html, Selector};
use serde_json::json;
use std::collections::HashMap;
use url::Url;

use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::model::{DiscoveredItem, NormalizedRecord, RawFetch};

const DETAIL_LINK_SELECTOR: &str = "a[href*='MeetingDetail.aspx?ID=']";
const DEFAULT_TITLE: &str = "Council Meeting";

/// Listing pages can be large archives; only the newest few links matter
/// per run.
const LISTING_LIMIT: usize = 10;

pub struct LegistarHtmlAdapter {
    source_id: String,
    listing_url: String,
    /// Origin of the listing page, used as the canonical address for
    /// records minted from detail pages
    portal_url: String,
    client: reqwest::Client,
}

impl LegistarHtmlAdapter {
    pub fn new(source_id: impl Into<String>, listing_url: impl Into<String>) -> Self {
        let listing_url = listing_url.into();
        let portal_url = Url::parse(&listing_url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| listing_url.trim_end_matches('/').to_string());
        Self {
            source_id: source_id.into(),
            listing_url,
            portal_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceAdapter for LegistarHtmlAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn discover(&self) -> Result<Vec<DiscoveredItem>, IngestError> {
        let response = self
            .client
            .get(&self.listing_url)
            .send()
            .await
            .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::source_unavailable(
                &self.source_id,
                format!("listing returned {}", response.status()),
            ));
        }
        let html = response
            .text()
            .await
            .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;

        extract_listing_links(&html, &self.listing_url, LISTING_LIMIT)
    }

    async fn fetch(&self, item: &DiscoveredItem) -> Result<RawFetch, IngestError> {
        let response = self
            .client
            .get(&item.canonical_url)
            .send()
            .await
            .map_err(|err| IngestError::fetch_failed(&item.stable_id, err.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::fetch_failed(
                &item.stable_id,
                format!("detail page returned {}", response.status()),
            ));
        }

        let mut headers = HashMap::new();
        for name in ["ETag", "Last-Modified"] {
            if let Some(value) = response.headers().get(name).and_then(|v| v.to_str().ok()) {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| IngestError::fetch_failed(&item.stable_id, err.to_string()))?
            .to_vec();
        headers
            .entry("ETag".to_string())
            .or_insert_with(|| content_hash(&body));

        Ok(RawFetch {
            body,
            headers,
            robots_policy: RobotsPolicy::Allow,
        })
    }

    fn parse(&self, raw: &RawFetch) -> Result<Vec<NormalizedRecord>, IngestError> {
        let html = String::from_utf8_lossy(&raw.body);
        let title = extract_title(&html).unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let stable_id = format!("meeting:html:{}", short_hash(&raw.body, 12));
        let retrieved_at = Utc::now();
        let record = NormalizedRecord {
            record_type: RecordType::Meeting,
            stable_id: stable_id.clone(),
            canonical_url: self.portal_url.clone(),
            payload: json!({
                "id": stable_id,
                "title": title,
                "meeting_datetime": retrieved_at.to_rfc3339(),
            }),
            source_id: self.source_id.clone(),
            content_hash: content_hash(&raw.body),
            retrieved_at,
            robots_policy: raw.robots_policy,
        };
        Ok(vec![record])
    }
}

/// Scrape meeting-detail links out of the calendar page.
fn extract_listing_links(
    html: &str,
    listing_url: &str,
    limit: usize,
) -> Result<Vec<DiscoveredItem>, IngestError> {
    let selector = Selector::parse(DETAIL_LINK_SELECTOR)
        .map_err(|err| IngestError::Parse(format!("invalid selector: {:?}", err)))?;
    let base = Url::parse(listing_url)
        .map_err(|err| IngestError::Parse(format!("invalid listing url: {}", err)))?;

    let document = Html::parse_document(html);
    let mut items = Vec::new();
    for link in document.select(&selector).take(limit) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(meeting_id) = href.rsplit("ID=").next().filter(|id| !id.is_empty()) else {
            continue;
        };
        let Ok(canonical) = base.join(href) else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        items.push(DiscoveredItem {
            stable_id: format!("meeting:{}", meeting_id),
            canonical_url: canonical.to_string(),
            metadata: json!({ "title": title }),
        });
    }
    Ok(items)
}

/// Heuristic page title: the `<title>` element's trimmed text.
fn extract_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}
