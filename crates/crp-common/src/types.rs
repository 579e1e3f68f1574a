//! Shared vocabulary for the records pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of normalized record an adapter can emit. Validation dispatches on
/// this tag, so adding a variant forces the validator to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Meeting,
    AgendaItem,
    Matter,
    Vote,
    Document,
    NewsItem,
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Meeting => "meeting",
            RecordType::AgendaItem => "agenda_item",
            RecordType::Matter => "matter",
            RecordType::Vote => "vote",
            RecordType::Document => "document",
            RecordType::NewsItem => "news_item",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage-rights tag attached to fetched content. Constrains what downstream
/// consumers may display: `allow-snippet` content may only be excerpted,
/// `deny` content is indexed but never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsPolicy {
    #[default]
    Allow,
    AllowSnippet,
    Deny,
}

impl RobotsPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            RobotsPolicy::Allow => "allow",
            RobotsPolicy::AllowSnippet => "allow-snippet",
            RobotsPolicy::Deny => "deny",
        }
    }
}

impl std::fmt::Display for RobotsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RobotsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "allow" => Ok(RobotsPolicy::Allow),
            "allow-snippet" => Ok(RobotsPolicy::AllowSnippet),
            "deny" => Ok(RobotsPolicy::Deny),
            _ => Err(format!("unknown robots policy: {}", s)),
        }
    }
}

/// Where, when and under what usage policy a record was retrieved.
///
/// Attached to every accepted record and consumed by the audit sink and the
/// persistent store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_id: String,
    pub content_hash: String,
    pub retrieved_at: DateTime<Utc>,
    pub robots_policy: RobotsPolicy,
}

/// Span of a document a statement was extracted from, for citation display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSpan {
    pub page: u32,
    pub line_start: u32,
    pub line_end: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_serde_tag() {
        let json = serde_json::to_string(&RecordType::AgendaItem).unwrap();
        assert_eq!(json, "\"agenda_item\"");
        let back: RecordType = serde_json::from_str("\"news_item\"").unwrap();
        assert_eq!(back, RecordType::NewsItem);
    }

    #[test]
    fn test_robots_policy_round_trip() {
        for policy in [
            RobotsPolicy::Allow,
            RobotsPolicy::AllowSnippet,
            RobotsPolicy::Deny,
        ] {
            assert_eq!(policy.as_str().parse::<RobotsPolicy>().unwrap(), policy);
        }
        assert!("nofollow".parse::<RobotsPolicy>().is_err());
    }
}
