//! Table state mirrored to a URL query string.
//!
//! Keys: `page`, `search`, `sortColumn`, `sortDirection`, `perPage`. Missing
//! or unreadable keys are left unset; other keys in the query are ignored.

use serde::{Deserialize, Serialize};

use crate::types::SortDirection;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlState {
    pub page: Option<usize>,
    pub search: Option<String>,
    pub sort_column: Option<usize>,
    pub sort_direction: Option<SortDirection>,
    pub per_page: Option<usize>,
}

impl UrlState {
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(column) = self.sort_column {
            pairs.push(("sortColumn", column.to_string()));
            if let Some(direction) = self.sort_direction {
                pairs.push(("sortDirection", direction.as_str().to_string()));
            }
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("perPage", per_page.to_string()));
        }

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn from_query_string(query: &str) -> Self {
        let mut state = Self::default();
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => state.page = value.parse().ok().filter(|p| *p > 0),
                "search" => state.search = Some(value.into_owned()),
                "sortColumn" => state.sort_column = value.parse().ok(),
                "sortDirection" => state.sort_direction = SortDirection::parse(&value),
                "perPage" => state.per_page = value.parse().ok().filter(|n| *n > 0),
                _ => {}
            }
        }
        state
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

    #[test]
    fn test_serialize() {
        let state = UrlState {
            page: Some(2),
            search: Some("red car".to_string()),
            sort_column: Some(1),
            sort_direction: Some(SortDirection::Desc),
            per_page: Some(10),
        };
        assert_eq!(
            state.to_query_string(),
            "page=2&search=red%20car&sortColumn=1&sortDirection=desc&perPage=10"
        );
        assert_eq!(UrlState::from_query_string(&state.to_query_string()), state);
    }

    #[test]
    fn test_parse_ignores_noise() {
        let state = UrlState::from_query_string("?utm=x&page=0&perPage=abc&sortColumn=2&flag");
        assert_eq!(state.page, None);
        assert_eq!(state.per_page, None);
        assert_eq!(state.sort_column, Some(2));
        assert_eq!(state.sort_direction, None);
    }

    #[test]
    fn test_parse_decodes_keys_and_plus() {
        let state = UrlState::from_query_string("sort%43olumn=1&page=2&search=red+car%21");
        assert_eq!(state.sort_column, Some(1));
        assert_eq!(state.page, Some(2));
        assert_eq!(state.search.as_deref(), Some("red car!"));
    }

    #[test]
    fn test_empty_state() {
        assert_eq!(UrlState::default().to_query_string(), "");
    }
}
