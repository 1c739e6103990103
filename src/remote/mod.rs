//! Remote (server-paginated) data.
//!
//! A request is a GET query string:
//!
//! ```text
//! <ajax>?searchQuery=<q|null>&sortColumn=<n|null>&sortDirection=<asc|desc|>&start=<n>&length=<n>&datatable=1&<ajaxParams...>
//! ```
//!
//! and the answer is `{ "recordsTotal": n, "recordsFiltered": n, "data": [row, ...] }`
//! with rows in the same shape as [`TableInput`](crate::types::TableInput) rows.

#[cfg(target_arch = "wasm32")]
pub mod fetch;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{RowData, SortDirection};

/// Everything the remote service needs to produce one page.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    /// Sequence number; only the latest request's response is applied
    pub seq: u64,
    /// Endpoint base URL
    pub ajax: Option<String>,
    pub search_query: Option<String>,
    pub sort_column: Option<usize>,
    pub sort_direction: SortDirection,
    pub start: usize,
    pub length: usize,
    /// Extra parameters; the core parameters win on name clashes
    pub params: BTreeMap<String, String>,
}

const CORE_PARAMS: [&str; 6] = [
    "searchQuery",
    "sortColumn",
    "sortDirection",
    "start",
    "length",
    "datatable",
];

impl FetchRequest {
    /// Query parameters in send order: extra parameters first, then the
    /// core ones. Unset values are sent as `null`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(key, _)| !CORE_PARAMS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let null = || "null".to_string();
        pairs.extend([
            (
                "searchQuery".to_string(),
                self.search_query.clone().unwrap_or_else(null),
            ),
            (
                "sortColumn".to_string(),
                self.sort_column.map_or_else(null, |c| c.to_string()),
            ),
            (
                "sortDirection".to_string(),
                self.sort_direction.as_str().to_string(),
            ),
            ("start".to_string(), self.start.to_string()),
            ("length".to_string(), self.length.to_string()),
            ("datatable".to_string(), "1".to_string()),
        ]);
        pairs
    }

    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full request URL, or just the query string without an endpoint.
    pub fn to_url(&self) -> String {
        let query = self.to_query_string();
        match self.ajax.as_deref() {
            Some(base) if base.contains('?') => format!("{base}&{query}"),
            Some(base) => format!("{base}?{query}"),
            None => query,
        }
    }
}

/// String form of an extra request parameter.
pub fn param_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// One page of remote data.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub records_total: usize,
    pub records_filtered: usize,
    #[serde(default)]
    pub data: Vec<RowData>,
}

impl FetchResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A synchronous source of remote pages.
pub trait DataService {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Issues request sequence numbers and recognizes the latest one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest && seq != 0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn request() -> FetchRequest {
        FetchRequest {
            seq: 1,
            ajax: Some("/data".to_string()),
            search_query: None,
            sort_column: None,
            sort_direction: SortDirection::Asc,
            start: 10,
            length: 5,
            params: BTreeMap::new(),
        }
    }

    #[test]
    fn test_nulls_and_core_params() {
        assert_eq!(
            request().to_url(),
            "/data?searchQuery=null&sortColumn=null&sortDirection=asc&start=10&length=5&datatable=1"
        );
    }

    #[test]
    fn test_extra_params_and_encoding() {
        let mut req = request();
        req.ajax = Some("/data?v=2".to_string());
        req.search_query = Some("red car&co".to_string());
        req.sort_column = Some(3);
        req.sort_direction = SortDirection::Natural;
        req.params.insert("table".to_string(), "users".to_string());
        req.params.insert("start".to_string(), "999".to_string());
        assert_eq!(
            req.to_url(),
            "/data?v=2&table=users&searchQuery=red%20car%26co&sortColumn=3&sortDirection=&start=10&length=5&datatable=1"
        );
    }

    #[test]
    fn test_param_value() {
        assert_eq!(param_value(&Value::from("x")), "x");
        assert_eq!(param_value(&Value::from(2)), "2");
        assert_eq!(param_value(&Value::Null), "null");
        assert_eq!(param_value(&Value::from(true)), "true");
    }

    #[test]
    fn test_decode_response() {
        let response = FetchResponse::from_json(
            r#"{"recordsTotal": 57, "recordsFiltered": 3,
                "data": [["a", 1], {"data": ["b", 2], "attributes": {"id": "r2"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.records_total, 57);
        assert_eq!(response.records_filtered, 3);
        assert_eq!(response.data.len(), 2);
    }

    #[test]
    fn test_decode_failure_is_an_error() {
        assert!(FetchResponse::from_json("<html>oops</html>").is_err());
    }

    #[test]
    fn test_sequencer() {
        let mut seq = RequestSequencer::default();
        assert!(!seq.is_current(0));
        let first = seq.next();
        let second = seq.next();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert_eq!(seq.latest(), 2);
    }
}
