//! RSS feed-syndication adapter
//!
//! Feed entries are complete at discovery: the feed XML is fetched and
//! parsed once, each entry becomes a discovered item, and `fetch` is a
//! local re-encoding of the entry. Snippet-only usage rights apply to all
//! syndicated content.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crp_common::hash::{content_hash, short_hash};
use crp_common::types::{RecordType, RobotsPolicy};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::adapter::{truncate_chars, SourceAdapter};
use crate::error::IngestError;
use crate::model::{DiscoveredItem, NormalizedRecord, RawFetch};

const TITLE_LIMIT: usize = 80;
const SNIPPET_LIMIT: usize = 280;

/// RSS 2.0 document, the subset of elements this adapter reads.
#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// `<guid>` may carry an `isPermaLink` attribute alongside its text.
#[derive(Debug, Clone, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

pub struct RssAdapter {
    source_id: String,
    feed_url: String,
    publisher: String,
    client: reqwest::Client,
}

impl RssAdapter {
    pub fn new(
        source_id: impl Into<String>,
        feed_url: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            feed_url: feed_url.into(),
            publisher: publisher.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn discover(&self) -> Result<Vec<DiscoveredItem>, IngestError> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::source_unavailable(
                &self.source_id,
                format!("feed returned {}", response.status()),
            ));
        }
        let xml = response
            .text()
            .await
            .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;

        let feed: Rss = quick_xml::de::from_str(&xml)
            .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;

        Ok(feed
            .channel
            .items
            .into_iter()
            .map(|entry| self.discovered_item(entry))
            .collect())
    }

    async fn fetch(&self, item: &DiscoveredItem) -> Result<RawFetch, IngestError> {
        // entries are complete at discovery; re-encode the entry locally
        let body = serde_json::to_vec(&item.metadata)
            .map_err(|err| IngestError::fetch_failed(&item.stable_id, err.to_string()))?;
        let mut headers = HashMap::new();
        headers.insert("ETag".to_string(), content_hash(&body));
        Ok(RawFetch {
            body,
            headers,
            robots_policy: RobotsPolicy::AllowSnippet,
        })
    }

    fn parse(&self, raw: &RawFetch) -> Result<Vec<NormalizedRecord>, IngestError> {
        let entry: Value = serde_json::from_slice(&raw.body)
            .map_err(|err| IngestError::Parse(err.to_string()))?;

        let stable_id = match entry.get("guid").and_then(Value::as_str) {
            Some(guid) => format!("news:{}", guid),
            // no natural identifier: namespace by content hash
            None => format!("news:{}", short_hash(&raw.body, 12)),
        };
        let canonical_url = entry
            .get("link")
            .and_then(Value::as_str)
            .unwrap_or(self.feed_url.as_str())
            .to_string();
        let summary = entry.get("summary").and_then(Value::as_str).unwrap_or("");
        let title = match entry.get("title").and_then(Value::as_str) {
            Some(title) => truncate_chars(title, TITLE_LIMIT),
            None => truncate_chars(summary, TITLE_LIMIT),
        };

        let mut payload = json!({
            "id": stable_id,
            "title": title,
            "snippet": truncate_chars(summary, SNIPPET_LIMIT),
            "publisher": self.publisher,
        });
        let published_at = entry
            .get("published")
            .and_then(Value::as_str)
            .and_then(parse_feed_datetime);
        if let Some(published_at) = published_at {
            payload["published_at"] = Value::String(published_at.to_rfc3339());
        }

        Ok(vec![NormalizedRecord {
            record_type: RecordType::NewsItem,
            stable_id,
            canonical_url,
            payload,
            source_id: self.source_id.clone(),
            content_hash: content_hash(&raw.body),
            retrieved_at: Utc::now(),
            robots_policy: raw.robots_policy,
        }])
    }
}

impl RssAdapter {
    fn discovered_item(&self, entry: FeedEntry) -> DiscoveredItem {
        let link = entry.link.clone().unwrap_or_else(|| self.feed_url.clone());
        let guid = entry
            .guid
            .as_ref()
            .and_then(|g| g.value.clone())
            .unwrap_or_else(|| link.clone());
        DiscoveredItem {
            stable_id: format!("news:{}", guid),
            canonical_url: link,
            metadata: json!({
                "guid": guid,
                "title": entry.title,
                "link": entry.link,
                "published": entry.pub_date,
                "summary": entry.description,
            }),
        }
    }
}

/// Feeds publish RFC 2822 dates (`Tue, 06 May 2025 18:00:00 GMT`); accept
/// RFC 3339 as a fallback.
fn parse_feed_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>County Gazette</title>
    <link>https://gazette.test</link>
    <item>
      <title>Council passes housing ordinance</title>
      <link>https://gazette.test/articles/housing</link>
      <guid isPermaLink="false">gazette-1001</guid>
      <pubDate>Tue, 06 May 2025 18:00:00 GMT</pubDate>
      <description>The council voted 5-2 to adopt the ordinance.</description>
    </item>
    <item>
      <title>Budget hearing scheduled</title>
      <link>https://gazette.test/articles/budget</link>
    </item>
  </channel>
</rss>"#;

    fn adapter() -> RssAdapter {
        RssAdapter::new("local_rss", "https://gazette.test/feed.xml", "County Gazette")
    }

    #[test]
    fn test_feed_xml_parses_into_entries() {
        let feed: Rss = quick_xml::de::from_str(FEED).unwrap();
        assert_eq!(feed.channel.items.len(), 2);
        assert_eq!(
            feed.channel.items[0].guid.as_ref().and_then(|g| g.value.as_deref()),
            Some("gazette-1001")
        );
        assert_eq!(feed.channel.items[1].guid.as_ref().and_then(|g| g.value.as_deref()), None);
    }

    #[test]
    fn test_entry_round_trip_produces_valid_news_item() {
        let feed: Rss = quick_xml::de::from_str(FEED).unwrap();
        let adapter = adapter();
        let item = adapter.discovered_item(feed.channel.items[0].clone());
        assert_eq!(item.stable_id, "news:gazette-1001");

        let body = serde_json::to_vec(&item.metadata).unwrap();
        let raw = RawFetch {
            body,
            headers: HashMap::new(),
            robots_policy: RobotsPolicy::AllowSnippet,
        };
        let records = adapter.parse(&raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stable_id, "news:gazette-1001");
        assert_eq!(records[0].canonical_url, "https://gazette.test/articles/housing");
        assert_eq!(records[0].robots_policy, RobotsPolicy::AllowSnippet);
        assert_eq!(
            records[0].payload.get("published_at").and_then(Value::as_str),
            Some("2025-05-06T18:00:00+00:00")
        );
        assert!(schema::validate(&records[0]).is_ok());
    }

    #[test]
    fn test_entry_without_guid_falls_back_to_link() {
        let feed: Rss = quick_xml::de::from_str(FEED).unwrap();
        let item = adapter().discovered_item(feed.channel.items[1].clone());
        assert_eq!(item.stable_id, "news:https://gazette.test/articles/budget");
    }

    #[test]
    fn test_snippet_is_bounded() {
        let long = "x".repeat(1000);
        let entry = FeedEntry {
            title: None,
            link: Some("https://gazette.test/a".to_string()),
            guid: None,
            pub_date: None,
            description: Some(long),
        };
        let adapter = adapter();
        let item = adapter.discovered_item(entry);
        let raw = RawFetch {
            body: serde_json::to_vec(&item.metadata).unwrap(),
            headers: HashMap::new(),
            robots_policy: RobotsPolicy::AllowSnippet,
        };
        let records = adapter.parse(&raw).unwrap();
        let snippet = records[0].payload.get("snippet").and_then(Value::as_str).unwrap();
        assert_eq!(snippet.chars().count(), SNIPPET_LIMIT);
    }
}
