//! Concrete source adapters
//!
//! One module per upstream source kind. All four differ only in their
//! discover/fetch/parse mechanics; the pipeline drives them identically.

pub mod gis;
pub mod legistar_api;
pub mod legistar_html;
pub mod rss;

pub use gis::GisAdapter;
pub use legistar_api::LegistarApiAdapter;
pub use legistar_html::LegistarHtmlAdapter;
pub use rss::RssAdapter;

use serde_json::Value;

/// Read a field as a string, tolerating numeric ids (Legistar serves
/// `EventId` as a number).
pub(crate) fn field_string(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
