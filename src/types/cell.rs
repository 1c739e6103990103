use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SortDirection;
use crate::html;

/// A single table cell.
///
/// The markup and its text are fixed at construction. Classes and attributes
/// may be appended afterwards as presentation hints; they never change the
/// value used for searching or sorting.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Plain text (markup stripped), used by full-match search and sorting
    pub text_content: String,
    /// Raw markup as ingested
    pub inner_html: String,
    /// Attributes of the source element
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, String>,
    /// Presentation classes, in insertion order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classes: Vec<String>,
    /// Sortability; `None` until resolved (header cells only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sortable: Option<bool>,
    /// Initial sort requested through a `data-sort` attribute (header cells only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

impl Cell {
    /// Build a cell from markup and its element attributes.
    ///
    /// `data-sortable` and `data-sort` are read the way header cells declare
    /// them in markup.
    pub fn new(inner_html: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        let inner_html = inner_html.into();
        let is_sortable = attributes
            .get("data-sortable")
            .map(|value| value.trim() == "true");
        let sort_direction = attributes
            .get("data-sort")
            .and_then(|value| SortDirection::parse(value));
        Self {
            text_content: html::text_content(&inner_html),
            inner_html,
            attributes,
            classes: Vec::new(),
            is_sortable,
            sort_direction,
        }
    }

    /// Build a cell from plain text; the markup is the escaped text.
    pub fn from_text(text: &str) -> Self {
        Self {
            text_content: text.to_string(),
            inner_html: html::escape(text),
            ..Self::default()
        }
    }

    /// Content used for searching and sorting.
    pub fn content(&self) -> &str {
        &self.text_content
    }

    /// Whether sortability was declared on the element itself.
    pub fn has_declared_sortable(&self) -> bool {
        self.attributes.contains_key("data-sortable")
    }

    pub fn set_sortable(&mut self, sortable: bool) {
        self.is_sortable = Some(sortable);
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.push(class.to_string());
    }

    /// Remove the first occurrence of `class`.
    pub fn remove_class(&mut self, class: &str) {
        if let Some(pos) = self.classes.iter().position(|c| c == class) {
            self.classes.remove(pos);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
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

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_header_attributes() {
        let cell = Cell::new(
            "Name",
            attrs(&[("data-sortable", "false"), ("data-sort", "desc")]),
        );
        assert_eq!(cell.is_sortable, Some(false));
        assert!(cell.has_declared_sortable());
        assert_eq!(cell.sort_direction, Some(SortDirection::Desc));
    }

    #[test]
    fn test_plain_cell_has_no_sort_metadata() {
        let cell = Cell::new("<em>42</em>", BTreeMap::new());
        assert_eq!(cell.content(), "42");
        assert_eq!(cell.inner_html, "<em>42</em>");
        assert_eq!(cell.is_sortable, None);
        assert_eq!(cell.sort_direction, None);
    }

    #[test]
    fn test_classes() {
        let mut cell = Cell::from_text("x");
        cell.add_class("dt-sorter");
        cell.add_class("asc");
        cell.remove_class("asc");
        cell.remove_class("missing");
        assert_eq!(cell.classes, vec!["dt-sorter"]);
        assert!(cell.has_class("dt-sorter"));
    }
}
