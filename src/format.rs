//! Cell formatting for presentation.
//!
//! Each column may carry a [`CellFormatter`]; columns without one pass the
//! cell markup through unchanged. Formatting never touches the cell values
//! that search and sort read.

use regex::{Captures, Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{DtviewError, Result};
use crate::search::{self, SearchMode};
use crate::types::{Cell, Row};

/// Produces the markup shown for one body cell.
pub trait CellFormatter {
    fn format(&self, cell: &Cell, row: &Row, column: usize) -> String;
}

impl<F> CellFormatter for F
where
    F: Fn(&Cell, &Row, usize) -> String,
{
    fn format(&self, cell: &Cell, row: &Row, column: usize) -> String {
        self(cell, row, column)
    }
}

/// Formatter lookup table with one slot per column.
pub struct ColumnRenderers {
    slots: Vec<Option<Box<dyn CellFormatter>>>,
}

impl fmt::Debug for ColumnRenderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
            .collect();
        f.debug_struct("ColumnRenderers")
            .field("columns", &self.slots.len())
            .field("set", &set)
            .finish()
    }
}

impl ColumnRenderers {
    pub fn new(columns: usize) -> Self {
        Self {
            slots: (0..columns).map(|_| None).collect(),
        }
    }

    pub fn set(&mut self, column: usize, formatter: Box<dyn CellFormatter>) -> Result<()> {
        let columns = self.slots.len();
        let slot = self
            .slots
            .get_mut(column)
            .ok_or(DtviewError::ColumnOutOfRange { column, columns })?;
        *slot = Some(formatter);
        Ok(())
    }

    /// Drop the formatter of `column`; returns whether one was set.
    pub fn clear(&mut self, column: usize) -> bool {
        self.slots
            .get_mut(column)
            .and_then(Option::take)
            .is_some()
    }

    pub fn has(&self, column: usize) -> bool {
        matches!(self.slots.get(column), Some(Some(_)))
    }

    /// Markup for `cell`: the column's formatter output, or the cell markup.
    pub fn format(&self, cell: &Cell, row: &Row, column: usize) -> String {
        match self.slots.get(column) {
            Some(Some(formatter)) => formatter.format(cell, row, column),
            _ => cell.inner_html.clone(),
        }
    }
}

/// A cell ready for display.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormattedCell {
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A row ready for display.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormattedRow {
    pub row_id: usize,
    pub cells: Vec<FormattedCell>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl FormattedRow {
    /// Header and footer rows: markup as is, plus the resolved sortability
    /// on header cells.
    pub fn plain(row: &Row) -> Self {
        let cells = row
            .cells
            .iter()
            .map(|cell| {
                let mut attributes = cell.attributes.clone();
                if let Some(sortable) = cell.is_sortable {
                    attributes.insert("data-sortable".to_string(), sortable.to_string());
                }
                FormattedCell {
                    html: cell.inner_html.clone(),
                    classes: cell.classes.clone(),
                    attributes,
                }
            })
            .collect();
        Self {
            row_id: row.row_id,
            cells,
            attributes: row.attributes.clone(),
        }
    }

    /// Body rows: column formatters, then match highlighting.
    pub fn body(row: &Row, renderers: &ColumnRenderers, highlight: Option<&Highlighter>) -> Self {
        let cells = row
            .cells
            .iter()
            .enumerate()
            .map(|(column, cell)| {
                let html = renderers.format(cell, row, column);
                FormattedCell {
                    html: match highlight {
                        Some(h) => h.apply(&html),
                        None => html,
                    },
                    classes: cell.classes.clone(),
                    attributes: cell.attributes.clone(),
                }
            })
            .collect();
        Self {
            row_id: row.row_id,
            cells,
            attributes: row.attributes.clone(),
        }
    }
}

/// Tags and whole anchor elements; highlighting only touches the text
/// between them.
#[allow(clippy::expect_used)]
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>|<[^>]*>").expect("markup pattern is valid")
});

/// Wraps search-token matches in `<mark>`.
///
/// Tokens are marked the way the search matched them: as literals in full
/// mode, as the same regular expression alternation in partial mode.
#[derive(Debug, Clone)]
pub struct Highlighter {
    re: Regex,
}

impl Highlighter {
    /// `None` when there is nothing to highlight.
    pub fn new(tokens: &[String], mode: SearchMode) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        if mode == SearchMode::Partial {
            return Some(Self {
                re: search::partial_regex(tokens),
            });
        }
        let mut escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
        // Longest first so overlapping tokens mark the widest span.
        escaped.sort_by_key(|t| std::cmp::Reverse(t.len()));
        RegexBuilder::new(&escaped.join("|"))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|re| Self { re })
    }

    pub fn apply(&self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut last = 0;
        for m in MARKUP_RE.find_iter(markup) {
            out.push_str(&self.mark(markup.get(last..m.start()).unwrap_or_default()));
            out.push_str(m.as_str());
            last = m.end();
        }
        out.push_str(&self.mark(markup.get(last..).unwrap_or_default()));
        out
    }

    fn mark(&self, text: &str) -> String {
        self.re
            .replace_all(text, |caps: &Captures<'_>| match caps.get(0) {
                Some(m) if !m.is_empty() => format!("<mark>{}</mark>", m.as_str()),
                _ => String::new(),
            })
            .into_owned()
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
    use crate::types::RowSection;
    use test_case::test_case;

    fn row(cells: &[&str]) -> Row {
        Row::new(
            cells.iter().map(|c| Cell::new(*c, BTreeMap::new())).collect(),
            7,
            RowSection::Body,
        )
    }

    #[test]
    fn test_identity_by_default() {
        let renderers = ColumnRenderers::new(2);
        let r = row(&["<b>a</b>", "b"]);
        let formatted = FormattedRow::body(&r, &renderers, None);
        assert_eq!(formatted.row_id, 7);
        assert_eq!(formatted.cells[0].html, "<b>a</b>");
    }

    #[test]
    fn test_column_formatter() {
        let mut renderers = ColumnRenderers::new(2);
        renderers
            .set(
                1,
                Box::new(|cell: &Cell, _: &Row, _: usize| format!("<em>{}</em>", cell.content())),
            )
            .unwrap();
        let formatted = FormattedRow::body(&row(&["a", "b"]), &renderers, None);
        assert_eq!(formatted.cells[0].html, "a");
        assert_eq!(formatted.cells[1].html, "<em>b</em>");
        assert!(renderers.clear(1));
        assert!(!renderers.has(1));
    }

    #[test]
    fn test_formatter_outside_table_rejected() {
        let mut renderers = ColumnRenderers::new(1);
        let result = renderers.set(3, Box::new(|_: &Cell, _: &Row, _: usize| String::new()));
        assert!(matches!(
            result,
            Err(DtviewError::ColumnOutOfRange {
                column: 3,
                columns: 1
            })
        ));
    }

    fn highlight(markup: &str, tokens: &[&str], mode: SearchMode) -> String {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        Highlighter::new(&tokens, mode).unwrap().apply(markup)
    }

    #[test_case("red car", &["red"], "<mark>red</mark> car" ; "plain text")]
    #[test_case("Red RED", &["red"], "<mark>Red</mark> <mark>RED</mark>" ; "case insensitive")]
    #[test_case(
        "<span class=\"red\">red</span>",
        &["red"],
        "<span class=\"red\"><mark>red</mark></span>" ;
        "tags untouched"
    )]
    #[test_case(
        "<a href=\"/red\">red</a> red",
        &["red"],
        "<a href=\"/red\">red</a> <mark>red</mark>" ;
        "anchors untouched"
    )]
    #[test_case("a.b", &["."], "a<mark>.</mark>b" ; "tokens are literal")]
    fn test_highlight_full(markup: &str, tokens: &[&str], expected: &str) {
        assert_eq!(highlight(markup, tokens, SearchMode::Full), expected);
    }

    #[test_case("Row 1", &["R.w", "1"], "<mark>Row</mark> <mark>1</mark>" ; "tokens are patterns")]
    #[test_case("a(b", &["("], "a<mark>(</mark>b" ; "invalid pattern is literal")]
    #[test_case("abc", &["x*"], "abc" ; "empty matches are not marked")]
    fn test_highlight_partial(markup: &str, tokens: &[&str], expected: &str) {
        assert_eq!(highlight(markup, tokens, SearchMode::Partial), expected);
    }

    #[test]
    fn test_no_tokens_no_highlighter() {
        assert!(Highlighter::new(&[], SearchMode::Full).is_none());
        assert!(Highlighter::new(&[], SearchMode::Partial).is_none());
    }

    #[test]
    fn test_header_carries_sortability() {
        let mut header = Row::new(vec![Cell::from_text("Name")], 0, RowSection::Header);
        header.cells[0].set_sortable(false);
        let formatted = FormattedRow::plain(&header);
        assert_eq!(formatted.cells[0].attributes["data-sortable"], "false");
    }
}
