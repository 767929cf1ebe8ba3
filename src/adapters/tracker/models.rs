//! Tracker API response models
//!
//! List endpoints answer with an envelope holding the collection under a
//! resource-specific key plus an optional pager. Single-record endpoints
//! answer with the bare object. Both pass through [`clean_record`] before
//! they become domain records.

use crate::domain::{Result, UpstreamError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Collection key of the events endpoint
pub const EVENTS_KEY: &str = "events";

/// Collection key of the tracked entity instances endpoint
pub const TRACKED_ENTITY_INSTANCES_KEY: &str = "trackedEntityInstances";

/// Collection key of the enrollments endpoint
pub const ENROLLMENTS_KEY: &str = "enrollments";

/// Paging block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    /// Current page, 1-based
    pub page: u32,

    /// Total pages, only present when `totalPages=true` was requested
    #[serde(default)]
    pub page_count: Option<u32>,

    /// Page size the server applied
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// One page of a list query
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    /// Cleaned records of this page
    pub records: Vec<Map<String, Value>>,

    /// Pager, if the server sent one
    pub pager: Option<Pager>,
}

impl ListPage {
    /// Splits a list response body into its records and pager
    ///
    /// A missing collection key is read as an empty page, which is what the
    /// server sends when nothing matches.
    pub fn from_body(body: Value, collection_key: &str) -> Result<Self> {
        let mut envelope = match body {
            Value::Object(map) => map,
            other => {
                return Err(UpstreamError::InvalidResponse(format!(
                    "Expected a JSON object holding '{collection_key}', got {}",
                    json_type(&other)
                ))
                .into())
            }
        };

        let pager = match envelope.remove("pager") {
            Some(value) => Some(serde_json::from_value(value).map_err(|e| {
                UpstreamError::InvalidResponse(format!("Invalid pager: {e}"))
            })?),
            None => None,
        };

        let records = match envelope.remove(collection_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(clean_record)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(UpstreamError::InvalidResponse(format!(
                    "Expected '{collection_key}' to be an array, got {}",
                    json_type(&other)
                ))
                .into())
            }
        };

        Ok(Self { records, pager })
    }

    /// True when the server answered with an earlier page than requested
    ///
    /// Servers that ignore the `page` parameter keep sending page 1.
    pub fn is_stale(&self, requested_page: u32) -> bool {
        self.pager.is_some_and(|p| p.page < requested_page)
    }

    /// True when another page should be requested after this one
    pub fn has_more(&self, requested_page: u32, page_size: u32) -> bool {
        if self.is_stale(requested_page) {
            return false;
        }
        match self.pager.and_then(|p| p.page_count) {
            Some(page_count) => requested_page < page_count,
            None => !self.records.is_empty() && self.records.len() as u32 >= page_size,
        }
    }
}

/// Normalizes a raw record into plain domain data
///
/// The input must be a JSON object. Keys starting with `$` carry client or
/// runtime metadata rather than domain fields and are removed at every
/// depth; all other content is kept verbatim.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidResponse`] when the value isn't an object.
///
/// # Example
///
/// ```
/// use ferry::adapters::tracker::models::clean_record;
/// use serde_json::json;
///
/// let cleaned = clean_record(json!({"event": "e1", "$resolved": true})).unwrap();
/// assert_eq!(cleaned.len(), 1);
/// assert!(cleaned.contains_key("event"));
/// ```
pub fn clean_record(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(clean_object(map)),
        other => Err(UpstreamError::InvalidResponse(format!(
            "Expected a JSON object record, got {}",
            json_type(&other)
        ))
        .into()),
    }
}

fn clean_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key, clean_value(value)))
        .collect()
}

fn clean_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(clean_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value).collect()),
        other => other,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FerryError;
    use serde_json::json;

    #[test]
    fn test_clean_record_strips_metadata_recursively() {
        let raw = json!({
            "trackedEntityInstance": "t1",
            "$promise": {},
            "$resolved": true,
            "attributes": [
                {"attribute": "a1", "value": "x", "$$hashKey": "object:12"}
            ],
            "enrollments": [{"enrollment": "en1", "$meta": 1}]
        });

        let cleaned = Value::Object(clean_record(raw).unwrap());
        assert_eq!(
            cleaned,
            json!({
                "trackedEntityInstance": "t1",
                "attributes": [{"attribute": "a1", "value": "x"}],
                "enrollments": [{"enrollment": "en1"}]
            })
        );
    }

    #[test]
    fn test_clean_record_keeps_plain_record_verbatim() {
        let raw = json!({"event": "e1", "dataValues": [], "deleted": false, "notes": null});
        assert_eq!(Value::Object(clean_record(raw.clone()).unwrap()), raw);
    }

    #[test]
    fn test_clean_record_rejects_non_objects() {
        let err = clean_record(json!(["not", "a", "record"])).unwrap_err();
        assert!(matches!(
            err,
            FerryError::Upstream(UpstreamError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_list_page_from_body() {
        let body = json!({
            "pager": {"page": 1, "pageCount": 3, "pageSize": 2, "total": 5},
            "events": [{"event": "e1"}, {"event": "e2"}]
        });
        let page = ListPage::from_body(body, EVENTS_KEY).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.pager.unwrap().page_count, Some(3));
        assert!(page.has_more(1, 2));
        assert!(!page.has_more(3, 2));
    }

    #[test]
    fn test_list_page_missing_collection_is_empty() {
        let page = ListPage::from_body(json!({}), ENROLLMENTS_KEY).unwrap();
        assert!(page.records.is_empty());
        assert!(page.pager.is_none());
        assert!(!page.has_more(1, 50));
    }

    #[test]
    fn test_list_page_without_page_count_uses_page_fill() {
        let body = json!({
            "pager": {"page": 1, "pageSize": 2},
            "trackedEntityInstances": [{"trackedEntityInstance": "t1"}, {"trackedEntityInstance": "t2"}]
        });
        let page = ListPage::from_body(body, TRACKED_ENTITY_INSTANCES_KEY).unwrap();
        assert!(page.has_more(1, 2));
        assert!(!page.has_more(1, 3));
    }

    #[test]
    fn test_list_page_repeating_an_earlier_page_is_stale() {
        let body = json!({
            "pager": {"page": 1, "pageSize": 2},
            "events": [{"event": "e1"}, {"event": "e2"}]
        });
        let page = ListPage::from_body(body, EVENTS_KEY).unwrap();
        assert!(!page.is_stale(1));
        assert!(page.is_stale(2));
        assert!(!page.has_more(2, 2));
    }

    #[test]
    fn test_list_page_rejects_non_array_collection() {
        let result = ListPage::from_body(json!({"events": {"event": "e1"}}), EVENTS_KEY);
        assert!(result.is_err());
    }
}
