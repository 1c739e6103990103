//! Table configuration.
//!
//! Every recognized option is a field with a typed default; a JSON (or JS)
//! object overrides fields one by one.
//!
//! ```json
//! {
//!   "perPage": 10,
//!   "fullMatch": true,
//!   "columns": [
//!     { "select": 0, "sort": "asc" },
//!     { "select": [2, 3], "sortable": false, "searchable": false }
//!   ]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{DtviewError, Result};
use crate::sort::EmptyPlacement;
use crate::types::SortDirection;

/// Display strings with `{placeholder}` substitution.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    /// Shown in place of rows when the page is empty
    pub no_rows: String,
    /// Info line; `{start}`, `{end}`, `{page}`, `{pages}`, `{rows}`, `{rowsTotal}`
    pub info: String,
    /// Info line while a search is active
    pub info_filtered: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            no_rows: "No entries found".to_string(),
            info: "Showing {start} to {end} of {rows} entries".to_string(),
            info_filtered:
                "Showing {start} to {end} of {rows} entries (filtered from {rowsTotal} entries)"
                    .to_string(),
        }
    }
}

/// Class names the controller itself applies to header cells.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Classes {
    pub sorter: String,
}

impl Default for Classes {
    fn default() -> Self {
        Self {
            sorter: "dt-sorter".to_string(),
        }
    }
}

/// Per-column overrides.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Target column(s): a single index or a list
    #[serde(deserialize_with = "one_or_many")]
    pub select: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sortable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub searchable: Option<bool>,
    /// Initial sort; honored only when `select` names exactly one column
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort: Option<SortDirection>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Select {
        One(usize),
        Many(Vec<usize>),
    }

    Ok(match Select::deserialize(deserializer)? {
        Select::One(column) => vec![column],
        Select::Many(columns) => columns,
    })
}

/// All table options.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    pub per_page: usize,
    /// Choices offered for `per_page`; passed through to every frame
    pub per_page_select: Vec<usize>,
    /// Default sortability of columns
    pub sortable: bool,
    /// Show a search input; passed through to every frame
    pub searchable: bool,
    /// AND-combined substring search instead of regex alternation
    pub full_match: bool,

    // Pager
    pub next_prev: bool,
    pub first_last: bool,
    pub prev_text: String,
    pub next_text: String,
    pub first_text: String,
    pub last_text: String,
    pub ellipsis_text: String,
    pub truncate_pager: bool,
    /// Half-width of the truncated page window
    pub pager_delta: usize,

    /// Minimum milliseconds between two searches; calls in between are dropped
    pub search_delay: u32,
    /// Skip a search whose query equals the current one
    pub search_dedupe: bool,
    /// Wrap search matches in `<mark>` in formatted cells
    pub highlight: bool,
    pub empty_placement: EmptyPlacement,

    // Server side
    pub server_side: bool,
    /// Total row count of a server-rendered first page
    pub defer_loading: Option<usize>,
    /// Remote data endpoint
    pub ajax: Option<String>,
    /// Extra query parameters sent with every remote request
    pub ajax_params: BTreeMap<String, Value>,

    pub labels: Labels,
    pub classes: Classes,
    pub columns: Vec<ColumnDefinition>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            per_page: 5,
            per_page_select: vec![5, 10, 15, 20, 25],
            sortable: true,
            searchable: true,
            full_match: false,
            next_prev: true,
            first_last: false,
            prev_text: "&lsaquo;".to_string(),
            next_text: "&rsaquo;".to_string(),
            first_text: "&laquo;".to_string(),
            last_text: "&raquo;".to_string(),
            ellipsis_text: "&hellip;".to_string(),
            truncate_pager: true,
            pager_delta: 2,
            search_delay: 0,
            search_dedupe: false,
            highlight: true,
            empty_placement: EmptyPlacement::First,
            server_side: false,
            defer_loading: None,
            ajax: None,
            ajax_params: BTreeMap::new(),
            labels: Labels::default(),
            classes: Classes::default(),
            columns: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Parse and validate a JSON configuration; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(DtviewError::InvalidPerPage(self.per_page));
        }
        if self.server_side && self.ajax.as_deref().map_or(true, str::is_empty) {
            log::debug!("server-side table without an ajax endpoint; fetches need an explicit URL");
        }
        Ok(())
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
    fn test_empty_object_is_default() {
        let config = TableConfig::from_json("{}").unwrap();
        assert_eq!(config, TableConfig::default());
    }

    #[test]
    fn test_field_by_field_override() {
        let config = TableConfig::from_json(
            r#"{"perPage": 10, "fullMatch": true, "labels": {"noRows": "Nothing"},
                "ajaxParams": {"table": "users", "v": 2}}"#,
        )
        .unwrap();
        assert_eq!(config.per_page, 10);
        assert!(config.full_match);
        assert_eq!(config.labels.no_rows, "Nothing");
        assert_eq!(config.labels.info, Labels::default().info);
        assert!(config.truncate_pager);
        assert_eq!(config.ajax_params.len(), 2);
    }

    #[test]
    fn test_column_select_forms() {
        let config = TableConfig::from_json(
            r#"{"columns": [{"select": 1, "sort": "desc"}, {"select": [2, 3], "searchable": false}]}"#,
        )
        .unwrap();
        assert_eq!(config.columns[0].select, vec![1]);
        assert_eq!(config.columns[0].sort, Some(SortDirection::Desc));
        assert_eq!(config.columns[1].select, vec![2, 3]);
        assert_eq!(config.columns[1].searchable, Some(false));
    }

    #[test]
    fn test_zero_per_page_rejected() {
        assert!(matches!(
            TableConfig::from_json(r#"{"perPage": 0}"#),
            Err(DtviewError::InvalidPerPage(0))
        ));
    }
}
