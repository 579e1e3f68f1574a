//! Structural validation of normalized records
//!
//! Each `RecordType` maps to a typed entity schema; a record's payload must
//! deserialize into the schema for its declared type, with unknown fields
//! rejected. Validation is purely structural and never reaches into network
//! or storage state. The `match` on the record type keeps the dispatch
//! exhaustive at compile time.

use chrono::{DateTime, Utc};
use crp_common::types::{CitationSpan, RecordType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::IngestError;
use crate::model::NormalizedRecord;

/// Recognized values for `Vote::vote_value`.
pub const VALID_VOTE_VALUES: &[&str] = &["aye", "nay", "abstain", "absent", "excused"];

/// A scheduled or past meeting of a public body.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub meeting_datetime: DateTime<Utc>,
    pub location: Option<String>,
    pub agenda_status: Option<String>,
}

/// One item on a meeting agenda.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgendaItem {
    pub id: String,
    pub meeting_id: String,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
    pub matter_id: Option<String>,
}

/// A legislative matter (ordinance, resolution, contract, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Matter {
    pub id: String,
    pub matter_type: String,
    pub title: String,
    pub status: String,
    pub sponsor: Option<String>,
    pub introduced_at: Option<DateTime<Utc>>,
}

/// A recorded vote by one person on one matter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vote {
    pub id: String,
    pub matter_id: String,
    pub person_name: String,
    pub vote_value: String,
}

/// An ingested document with its extracted text.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
    pub page_count: u32,
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub table_json: Vec<Value>,
    #[serde(default)]
    pub citations: Vec<CitationSpan>,
}

/// A syndicated news item about local government.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Check a record against the schema for its declared type.
///
/// Returns `SchemaViolation` naming the offending field when a required
/// field is absent, has the wrong shape, or an enumerated field holds an
/// unrecognized value.
pub fn validate(record: &NormalizedRecord) -> Result<(), IngestError> {
    validate_canonical_url(&record.canonical_url)?;
    validate_content_hash(&record.content_hash)?;

    match record.record_type {
        RecordType::Meeting => decode::<Meeting>(&record.payload).map(drop),
        RecordType::AgendaItem => decode::<AgendaItem>(&record.payload).map(drop),
        RecordType::Matter => decode::<Matter>(&record.payload).map(drop),
        RecordType::Vote => {
            let vote = decode::<Vote>(&record.payload)?;
            if !VALID_VOTE_VALUES.contains(&vote.vote_value.as_str()) {
                return Err(IngestError::schema_violation(
                    "vote_value",
                    format!(
                        "unrecognized vote value `{}`, expected one of {}",
                        vote.vote_value,
                        VALID_VOTE_VALUES.join(", ")
                    ),
                ));
            }
            Ok(())
        },
        RecordType::Document => decode::<Document>(&record.payload).map(drop),
        RecordType::NewsItem => decode::<NewsItem>(&record.payload).map(drop),
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> Result<T, IngestError> {
    serde_json::from_value(payload.clone()).map_err(|err| {
        let message = err.to_string();
        IngestError::SchemaViolation {
            field: field_from_message(&message).unwrap_or_else(|| "payload".to_string()),
            reason: message,
        }
    })
}

fn validate_canonical_url(canonical_url: &str) -> Result<(), IngestError> {
    let parsed = Url::parse(canonical_url).map_err(|err| {
        IngestError::schema_violation("canonical_url", format!("not a valid URL: {}", err))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(IngestError::schema_violation(
            "canonical_url",
            format!("unsupported scheme `{}`", parsed.scheme()),
        ));
    }
    Ok(())
}

fn validate_content_hash(content_hash: &str) -> Result<(), IngestError> {
    let is_hex = content_hash
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if content_hash.len() != 64 || !is_hex {
        return Err(IngestError::schema_violation(
            "content_hash",
            "expected a 64-character lowercase hex digest",
        ));
    }
    Ok(())
}

/// Pull the offending field name out of a serde error message
/// ("missing field `x`", "unknown field `x`, expected ...").
fn field_from_message(message: &str) -> Option<String> {
    let start = message.find("field `")? + "field `".len();
    let rest = &message[start..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crp_common::content_hash;
    use crp_common::types::RobotsPolicy;
    use serde_json::json;

    fn record(record_type: RecordType, payload: Value) -> NormalizedRecord {
        NormalizedRecord {
            record_type,
            stable_id: "meeting:1".to_string(),
            canonical_url: "https://example.legistar.test/MeetingDetail.aspx?ID=1".to_string(),
            payload,
            source_id: "county_legistar_api".to_string(),
            content_hash: content_hash(b"body"),
            retrieved_at: Utc::now(),
            robots_policy: RobotsPolicy::Allow,
        }
    }

    #[test]
    fn test_valid_meeting_passes() {
        let rec = record(
            RecordType::Meeting,
            json!({
                "id": "meeting:1",
                "title": "County Council",
                "meeting_datetime": "2025-05-06T18:00:00Z",
                "location": "Council Chambers",
                "agenda_status": "Final",
            }),
        );
        assert!(validate(&rec).is_ok());
    }

    #[test]
    fn test_meeting_missing_datetime_names_field() {
        let rec = record(
            RecordType::Meeting,
            json!({"id": "meeting:1", "title": "County Council"}),
        );
        match validate(&rec) {
            Err(IngestError::SchemaViolation { field, reason }) => {
                assert_eq!(field, "meeting_datetime");
                assert!(reason.contains("meeting_datetime"));
            },
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let rec = record(
            RecordType::Meeting,
            json!({
                "id": "meeting:1",
                "title": "County Council",
                "meeting_datetime": "2025-05-06T18:00:00Z",
                "surprise": true,
            }),
        );
        match validate(&rec) {
            Err(IngestError::SchemaViolation { field, .. }) => assert_eq!(field, "surprise"),
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_vote_value_names_field() {
        let rec = record(
            RecordType::Vote,
            json!({
                "id": "vote:9",
                "matter_id": "matter:4",
                "person_name": "Chair",
                "vote_value": "maybe",
            }),
        );
        match validate(&rec) {
            Err(IngestError::SchemaViolation { field, reason }) => {
                assert_eq!(field, "vote_value");
                assert!(reason.contains("maybe"));
            },
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_document_with_citation_spans_passes() {
        let rec = record(
            RecordType::Document,
            json!({
                "id": "gis:parcels:abc",
                "title": "GIS Dataset: parcels",
                "text": "excerpt",
                "page_count": 1,
                "citations": [{"page": 1, "line_start": 1, "line_end": 8}],
            }),
        );
        assert!(validate(&rec).is_ok());
    }

    #[test]
    fn test_malformed_citation_span_is_rejected() {
        let rec = record(
            RecordType::Document,
            json!({
                "id": "gis:parcels:abc",
                "title": "GIS Dataset: parcels",
                "text": "excerpt",
                "page_count": 1,
                "citations": [{"page": "one", "line_start": 1, "line_end": 8}],
            }),
        );
        assert!(matches!(
            validate(&rec),
            Err(IngestError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_non_http_canonical_url_is_rejected() {
        let mut rec = record(
            RecordType::NewsItem,
            json!({
                "id": "news:1",
                "title": "t",
                "snippet": "s",
                "publisher": "Gazette",
            }),
        );
        rec.canonical_url = "ftp://example.org/feed".to_string();
        match validate(&rec) {
            Err(IngestError::SchemaViolation { field, .. }) => {
                assert_eq!(field, "canonical_url")
            },
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_header_shaped_hash_is_rejected() {
        let mut rec = record(
            RecordType::NewsItem,
            json!({
                "id": "news:1",
                "title": "t",
                "snippet": "s",
                "publisher": "Gazette",
            }),
        );
        rec.content_hash = "W/\"etag-from-upstream\"".to_string();
        match validate(&rec) {
            Err(IngestError::SchemaViolation { field, .. }) => {
                assert_eq!(field, "content_hash")
            },
            other => panic!("expected schema violation, got {:?}", other),
        }
    }
}
