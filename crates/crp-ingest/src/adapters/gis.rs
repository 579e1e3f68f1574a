//! GIS single-dataset adapter
//!
//! One static endpoint per dataset; discovery always yields exactly one
//! item. Payloads may be binary, so the indexed text is a bounded lossy
//! UTF-8 excerpt. An upstream `ETag` is carried through for the audit
//! trail, but the record's content hash is always recomputed from the body.

use async_trait::async_trait;
use chrono::Utc;
use crp_common::hash::{content_hash, short_hash};
use crp_common::types::{RecordType, RobotsPolicy};
use serde_json::json;
use std::collections::HashMap;

use crate::adapter::{truncate_chars, SourceAdapter};
use crate::error::IngestError;
use crate::model::{DiscoveredItem, NormalizedRecord, RawFetch};

/// Bound on the indexable text excerpt taken from a dataset.
const EXCERPT_LIMIT: usize = 4000;

pub struct GisAdapter {
    source_id: String,
    endpoint: String,
    dataset_name: String,
    client: reqwest::Client,
}

impl GisAdapter {
    pub fn new(
        source_id: impl Into<String>,
        endpoint: impl Into<String>,
        dataset_name: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            endpoint: endpoint.into(),
            dataset_name: dataset_name.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceAdapter for GisAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn discover(&self) -> Result<Vec<DiscoveredItem>, IngestError> {
        Ok(vec![DiscoveredItem {
            stable_id: format!("gis:{}", self.dataset_name),
            canonical_url: self.endpoint.clone(),
            metadata: json!({}),
        }])
    }

    async fn fetch(&self, item: &DiscoveredItem) -> Result<RawFetch, IngestError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| IngestError::fetch_failed(&item.stable_id, err.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::fetch_failed(
                &item.stable_id,
                format!("dataset endpoint returned {}", response.status()),
            ));
        }

        let mut headers = HashMap::new();
        if let Some(etag) = response.headers().get("ETag").and_then(|v| v.to_str().ok()) {
            headers.insert("ETag".to_string(), etag.to_string());
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
        let stable_id = format!("gis:{}:{}", self.dataset_name, short_hash(&raw.body, 8));
        let excerpt = truncate_chars(&String::from_utf8_lossy(&raw.body), EXCERPT_LIMIT);

        Ok(vec![NormalizedRecord {
            record_type: RecordType::Document,
            stable_id: stable_id.clone(),
            canonical_url: self.endpoint.clone(),
            payload: json!({
                "id": stable_id,
                "title": format!("GIS Dataset: {}", self.dataset_name),
                "text": excerpt,
                "page_count": 1,
            }),
            source_id: self.source_id.clone(),
            content_hash: content_hash(&raw.body),
            retrieved_at: Utc::now(),
            robots_policy: raw.robots_policy,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn adapter() -> GisAdapter {
        GisAdapter::new("county_gis", "https://gis.county.test/datasets/parcels.geojson", "parcels")
    }

    #[tokio::test]
    async fn test_discover_yields_single_item() {
        let items = adapter().discover().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].stable_id, "gis:parcels");
        assert_eq!(
            items[0].canonical_url,
            "https://gis.county.test/datasets/parcels.geojson"
        );
    }

    #[test]
    fn test_parse_bounds_excerpt_and_validates() {
        let body = vec![b'a'; 10_000];
        let raw = RawFetch {
            body,
            headers: HashMap::new(),
            robots_policy: RobotsPolicy::Allow,
        };
        let records = adapter().parse(&raw).unwrap();
        assert_eq!(records.len(), 1);
        let text = records[0].payload.get("text").and_then(|v| v.as_str()).unwrap();
        assert_eq!(text.chars().count(), EXCERPT_LIMIT);
        assert!(records[0].stable_id.starts_with("gis:parcels:"));
        assert!(schema::validate(&records[0]).is_ok());
    }

    #[test]
    fn test_parse_tolerates_binary_bodies() {
        let raw = RawFetch {
            body: vec![0x00, 0xff, 0xfe, 0x50, 0x4b],
            headers: HashMap::new(),
            robots_policy: RobotsPolicy::Allow,
        };
        let records = adapter().parse(&raw).unwrap();
        assert!(schema::validate(&records[0]).is_ok());
    }

    #[test]
    fn test_changed_content_changes_stable_id_suffix() {
        let a = adapter()
            .parse(&RawFetch {
                body: b"rev1".to_vec(),
                headers: HashMap::new(),
                robots_policy: RobotsPolicy::Allow,
            })
            .unwrap();
        let b = adapter()
            .parse(&RawFetch {
                body: b"rev2".to_vec(),
                headers: HashMap::new(),
                robots_policy: RobotsPolicy::Allow,
            })
            .unwrap();
        assert_ne!(a[0].stable_id, b[0].stable_id);
    }
}
