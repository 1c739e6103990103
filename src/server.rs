//! In-process reference implementation of the remote data service.
//!
//! Search is a case-insensitive regular expression over every cell, sort is
//! on one column, then the result is sliced to the requested page.

use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

use crate::error::Result;
use crate::remote::{DataService, FetchRequest, FetchResponse};
use crate::sort::{compare_keys, EmptyPlacement, SortKey};
use crate::types::{RowData, SortDirection, TableInput};

/// Page length used when the request names none (or zero).
pub const DEFAULT_LENGTH: usize = 10;

/// A page request as the service reads it from a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceQuery {
    pub start: usize,
    pub length: usize,
    /// Empty when absent or sent as `null`
    pub search: String,
    pub sort_column: Option<usize>,
    pub sort_direction: SortDirection,
}

impl Default for ServiceQuery {
    fn default() -> Self {
        Self {
            start: 0,
            length: DEFAULT_LENGTH,
            search: String::new(),
            sort_column: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

impl ServiceQuery {
    /// Parse `key=value&...`; unknown keys are ignored and malformed
    /// numbers fall back to the defaults.
    pub fn from_query_string(query: &str) -> Self {
        let mut parsed = Self::default();
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "start" => parsed.start = value.parse().unwrap_or(0),
                "length" => {
                    parsed.length = match value.parse() {
                        Ok(0) | Err(_) => DEFAULT_LENGTH,
                        Ok(n) => n,
                    }
                }
                "searchQuery" => {
                    parsed.search = if value == "null" {
                        String::new()
                    } else {
                        value.into_owned()
                    }
                }
                "sortColumn" => parsed.sort_column = value.parse().ok(),
                // Anything but "asc" sorts descending.
                "sortDirection" => {
                    parsed.sort_direction = if value == "asc" {
                        SortDirection::Asc
                    } else {
                        SortDirection::Desc
                    }
                }
                _ => {}
            }
        }
        parsed
    }
}

/// Serves pages out of an in-memory row set.
#[derive(Debug, Clone, Default)]
pub struct ReferenceService {
    rows: Vec<RowData>,
}

impl ReferenceService {
    pub fn new(rows: Vec<RowData>) -> Self {
        Self { rows }
    }

    pub fn from_input(input: TableInput) -> Self {
        Self::new(input.rows)
    }

    /// Rows as a JSON array of row values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn answer(&self, query: &ServiceQuery) -> FetchResponse {
        let mut filtered: Vec<&RowData> = match search_regex(&query.search) {
            Some(re) => self
                .rows
                .iter()
                .filter(|row| row.cells().iter().any(|cell| re.is_match(&cell.markup())))
                .collect(),
            None => self.rows.iter().collect(),
        };

        if let Some(column) = query.sort_column {
            filtered.sort_by(|a, b| compare_rows(a, b, column, query.sort_direction));
        }

        let records_filtered = filtered.len();
        let data = filtered
            .into_iter()
            .skip(query.start)
            .take(query.length)
            .cloned()
            .collect();

        FetchResponse {
            records_total: self.rows.len(),
            records_filtered,
            data,
        }
    }

    /// Answer a raw query string with the JSON body.
    pub fn answer_query_string(&self, query: &str) -> Result<String> {
        let response = self.answer(&ServiceQuery::from_query_string(query));
        Ok(serde_json::to_string(&response)?)
    }
}

impl DataService for ReferenceService {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        Ok(self.answer(&ServiceQuery::from_query_string(
            &request.to_query_string(),
        )))
    }
}

fn search_regex(search: &str) -> Option<Regex> {
    if search.is_empty() {
        return None;
    }
    let build = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
    match build(search) {
        Ok(re) => Some(re),
        Err(err) => {
            log::warn!("service search pattern rejected ({err}), matching literally");
            build(&regex::escape(search)).ok()
        }
    }
}

fn compare_rows(a: &RowData, b: &RowData, column: usize, direction: SortDirection) -> Ordering {
    let key = |row: &RowData| {
        SortKey::from_content(&row.cells().get(column).map(|c| c.markup()).unwrap_or_default())
    };
    compare_keys(&key(a), &key(b), direction, EmptyPlacement::First)
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

    fn service() -> ReferenceService {
        ReferenceService::from_json(
            r#"[["Alice", "34"], ["bob", "7"], ["Carol", "120"], ["Dave", "7"], ["alina", "50"]]"#,
        )
        .unwrap()
    }

    fn names(response: &FetchResponse) -> Vec<String> {
        response
            .data
            .iter()
            .map(|row| row.cells()[0].markup())
            .collect()
    }

    #[test]
    fn test_query_defaults_and_nulls() {
        let q = ServiceQuery::from_query_string(
            "searchQuery=null&sortColumn=null&sortDirection=asc&start=0&length=0&datatable=1",
        );
        assert_eq!(q.search, "");
        assert_eq!(q.sort_column, None);
        assert_eq!(q.length, DEFAULT_LENGTH);
    }

    #[test]
    fn test_query_decoding() {
        let q = ServiceQuery::from_query_string(
            "?searchQuery=red%20car+x&sortColumn=2&sortDirection=",
        );
        assert_eq!(q.search, "red car x");
        assert_eq!(q.sort_column, Some(2));
        assert_eq!(q.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_query_decodes_keys() {
        let q = ServiceQuery::from_query_string("s%74art=20&sortColumn=1&length=5");
        assert_eq!(q.start, 20);
        assert_eq!(q.length, 5);
        assert_eq!(q.sort_column, Some(1));
    }

    #[test]
    fn test_search_is_case_insensitive_regex() {
        let response = service().answer(&ServiceQuery {
            search: "^al".to_string(),
            ..ServiceQuery::default()
        });
        assert_eq!(response.records_total, 5);
        assert_eq!(response.records_filtered, 2);
        assert_eq!(names(&response), vec!["Alice", "alina"]);
    }

    #[test]
    fn test_sort_then_slice() {
        let response = service().answer(&ServiceQuery {
            sort_column: Some(1),
            sort_direction: SortDirection::Desc,
            start: 1,
            length: 2,
            ..ServiceQuery::default()
        });
        assert_eq!(response.records_filtered, 5);
        assert_eq!(names(&response), vec!["alina", "Alice"]);
    }

    #[test]
    fn test_slice_past_the_end() {
        let response = service().answer(&ServiceQuery {
            start: 4,
            length: 10,
            ..ServiceQuery::default()
        });
        assert_eq!(names(&response), vec!["alina"]);
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let svc = ReferenceService::from_json(r#"[["f(x)"], ["g"]]"#).unwrap();
        let response = svc.answer(&ServiceQuery {
            search: "f(".to_string(),
            ..ServiceQuery::default()
        });
        assert_eq!(response.records_filtered, 1);
    }

    #[test]
    fn test_data_service_round_trip() {
        let request = FetchRequest {
            seq: 1,
            ajax: None,
            search_query: Some("a".to_string()),
            sort_column: Some(0),
            sort_direction: SortDirection::Asc,
            start: 0,
            length: 3,
            params: Default::default(),
        };
        let response = service().fetch(&request).unwrap();
        assert_eq!(response.records_filtered, 4);
        assert_eq!(names(&response), vec!["Alice", "alina", "Carol"]);
    }
}
