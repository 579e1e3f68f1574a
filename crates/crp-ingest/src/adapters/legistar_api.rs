//! Legistar web API adapter
//!
//! Discovers meetings from the paginated `/events` listing (`$top`/`$skip`
//! OData paging, optional `EventDate` filter window). Listing rows are
//! complete at discovery, so `fetch` is a local re-encoding of the row;
//! `parse` emits the meeting plus one agenda item per nested `EventItems`
//! entry, and `link` back-fills each agenda item's parent meeting id from
//! its sibling record.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use crp_common::hash::content_hash;
use crp_common::types::{RecordType, RobotsPolicy};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use super::field_string;
use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::model::{DiscoveredItem, NormalizedRecord, RawFetch};

const DEFAULT_PAGE_SIZE: usize = 200;
const DEFAULT_BODY_NAME: &str = "County Council";

pub struct LegistarApiAdapter {
    source_id: String,
    base_url: String,
    portal_url: String,
    client: reqwest::Client,
    page_size: usize,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl LegistarApiAdapter {
    pub fn new(source_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            source_id: source_id.into(),
            portal_url: base_url.clone(),
            base_url,
            client: reqwest::Client::new(),
            page_size: DEFAULT_PAGE_SIZE,
            from_date: None,
            to_date: None,
        }
    }

    /// Public-facing portal used for canonical meeting URLs, when it
    /// differs from the API host.
    pub fn with_portal_url(mut self, portal_url: impl Into<String>) -> Self {
        self.portal_url = portal_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Restrict discovery to meetings within `[from, to]` (inclusive,
    /// `YYYY-MM-DD`).
    pub fn with_window(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    fn meeting_url(&self, event_id: &str) -> String {
        format!("{}/MeetingDetail.aspx?ID={}", self.portal_url, event_id)
    }

    /// OData `$filter` expression for the configured date window.
    fn event_date_filter(&self) -> Option<String> {
        let lower = self
            .from_date
            .as_ref()
            .map(|d| format!("EventDate ge datetime'{}T00:00:00'", d));
        let upper = self
            .to_date
            .as_ref()
            .map(|d| format!("EventDate le datetime'{}T23:59:59'", d));
        match (lower, upper) {
            (Some(lower), Some(upper)) => Some(format!("{} and {}", lower, upper)),
            (Some(lower), None) => Some(lower),
            (None, Some(upper)) => Some(upper),
            (None, None) => None,
        }
    }

    fn meeting_record(
        &self,
        row: &Value,
        event_id: &str,
        body_hash: &str,
        retrieved_at: DateTime<Utc>,
    ) -> NormalizedRecord {
        let stable_id = format!("meeting:{}", event_id);
        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::String(stable_id.clone()));
        payload.insert(
            "title".to_string(),
            Value::String(
                field_string(row, "EventBodyName").unwrap_or_else(|| DEFAULT_BODY_NAME.to_string()),
            ),
        );
        // left absent when the upstream value is missing or unparseable;
        // validation then quarantines the record naming the field
        if let Some(dt) = field_string(row, "EventDate").as_deref().and_then(parse_event_datetime) {
            payload.insert(
                "meeting_datetime".to_string(),
                Value::String(dt.to_rfc3339()),
            );
        }
        if let Some(location) = field_string(row, "EventLocation") {
            payload.insert("location".to_string(), Value::String(location));
        }
        payload.insert(
            "agenda_status".to_string(),
            Value::String(
                field_string(row, "EventAgendaStatusName").unwrap_or_else(|| "Unknown".to_string()),
            ),
        );

        NormalizedRecord {
            record_type: RecordType::Meeting,
            stable_id,
            canonical_url: self.meeting_url(event_id),
            payload: Value::Object(payload),
            source_id: self.source_id.clone(),
            content_hash: body_hash.to_string(),
            retrieved_at,
            robots_policy: RobotsPolicy::Allow,
        }
    }

    fn agenda_item_record(
        &self,
        entry: &Value,
        event_id: &str,
        sequence: u64,
        body_hash: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Option<NormalizedRecord> {
        let item_id = field_string(entry, "EventItemId")?;
        let stable_id = format!("agenda_item:{}", item_id);

        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::String(stable_id.clone()));
        payload.insert(
            "title".to_string(),
            Value::String(
                field_string(entry, "EventItemTitle").unwrap_or_else(|| "Untitled".to_string()),
            ),
        );
        let order = entry
            .get("EventItemAgendaSequence")
            .and_then(Value::as_u64)
            .unwrap_or(sequence);
        payload.insert("order".to_string(), Value::from(order));
        if let Some(matter_id) = field_string(entry, "EventItemMatterId") {
            payload.insert(
                "matter_id".to_string(),
                Value::String(format!("matter:{}", matter_id)),
            );
        }
        // meeting_id is deliberately not set here; `link` back-fills it
        // from the sibling meeting record of the same batch

        Some(NormalizedRecord {
            record_type: RecordType::AgendaItem,
            stable_id,
            canonical_url: self.meeting_url(event_id),
            payload: Value::Object(payload),
            source_id: self.source_id.clone(),
            content_hash: body_hash.to_string(),
            retrieved_at,
            robots_policy: RobotsPolicy::Allow,
        })
    }
}

#[async_trait]
impl SourceAdapter for LegistarApiAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn discover(&self) -> Result<Vec<DiscoveredItem>, IngestError> {
        let mut items = Vec::new();
        let mut skip = 0usize;

        loop {
            let mut request = self.client.get(format!("{}/events", self.base_url)).query(&[
                ("$top", self.page_size.to_string()),
                ("$skip", skip.to_string()),
            ]);
            if let Some(filter) = self.event_date_filter() {
                request = request.query(&[("$filter", filter)]);
            }

            let response = request
                .send()
                .await
                .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;
            if !response.status().is_success() {
                return Err(IngestError::source_unavailable(
                    &self.source_id,
                    format!("listing returned {}", response.status()),
                ));
            }
            let chunk: Vec<Value> = response
                .json()
                .await
                .map_err(|err| IngestError::source_unavailable(&self.source_id, err.to_string()))?;
            if chunk.is_empty() {
                break;
            }

            let page_len = chunk.len();
            for row in chunk {
                let Some(event_id) = field_string(&row, "EventId") else {
                    warn!(source_id = %self.source_id, "listing row without EventId, skipping");
                    continue;
                };
                items.push(DiscoveredItem {
                    stable_id: format!("meeting:{}", event_id),
                    canonical_url: self.meeting_url(&event_id),
                    metadata: row,
                });
            }

            if page_len < self.page_size {
                break;
            }
            skip += self.page_size;
        }

        Ok(items)
    }

    async fn fetch(&self, item: &DiscoveredItem) -> Result<RawFetch, IngestError> {
        // the listing row is already the full content; re-encode it locally
        let body = serde_json::to_vec(&item.metadata)
            .map_err(|err| IngestError::fetch_failed(&item.stable_id, err.to_string()))?;
        let mut headers = HashMap::new();
        headers.insert("ETag".to_string(), content_hash(&body));
        Ok(RawFetch {
            body,
            headers,
            robots_policy: RobotsPolicy::Allow,
        })
    }

    fn parse(&self, raw: &RawFetch) -> Result<Vec<NormalizedRecord>, IngestError> {
        let row: Value = serde_json::from_slice(&raw.body)
            .map_err(|err| IngestError::Parse(err.to_string()))?;
        let event_id = field_string(&row, "EventId")
            .ok_or_else(|| IngestError::Parse("event row without EventId".to_string()))?;

        let body_hash = content_hash(&raw.body);
        let retrieved_at = Utc::now();

        let mut records = vec![self.meeting_record(&row, &event_id, &body_hash, retrieved_at)];
        if let Some(entries) = row.get("EventItems").and_then(Value::as_array) {
            for (index, entry) in entries.iter().enumerate() {
                match self.agenda_item_record(
                    entry,
                    &event_id,
                    index as u64 + 1,
                    &body_hash,
                    retrieved_at,
                ) {
                    Some(record) => records.push(record),
                    None => warn!(
                        source_id = %self.source_id,
                        event_id = %event_id,
                        "agenda entry without EventItemId, skipping"
                    ),
                }
            }
        }
        Ok(records)
    }

    fn link(&self, records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
        let meeting_id = records
            .iter()
            .find(|r| r.record_type == RecordType::Meeting)
            .and_then(|r| r.payload.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        records
            .into_iter()
            .map(|mut record| {
                if record.record_type == RecordType::AgendaItem {
                    if let (Some(obj), Some(id)) = (record.payload.as_object_mut(), &meeting_id) {
                        obj.entry("meeting_id".to_string())
                            .or_insert_with(|| Value::String(id.clone()));
                    }
                    // with no sibling meeting the reference stays absent and
                    // validation quarantines the item
                }
                record
            })
            .collect()
    }
}

/// Legistar serves `EventDate` as a naive local timestamp
/// (`2025-05-06T18:00:00`); normalize to UTC, accepting RFC 3339 too.
fn parse_event_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
