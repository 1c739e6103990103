use serde::Serialize;

use super::{Cell, Row, RowSection, TableInput};
use crate::csv::{self, Delimiter};
use crate::error::Result;

/// The table's rows split into header, data rows and an optional footer.
///
/// The column count comes from the header and never changes. Data rows may be
/// reordered and hidden by the controller; their `row_id`s stay fixed.
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    header: Row,
    data_rows: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<Row>,
}

impl TableSnapshot {
    /// Build a snapshot from a table description.
    ///
    /// Row ids follow source order: header first, then the data rows, then
    /// the footer.
    pub fn from_input(input: &TableInput) -> Self {
        let header = Row::from_data(&input.header, 0, RowSection::Header);
        let data_rows: Vec<Row> = input
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| Row::from_data(row, idx + 1, RowSection::Body))
            .collect();
        let footer = input
            .footer
            .as_ref()
            .map(|row| Row::from_data(row, data_rows.len() + 1, RowSection::Footer));
        Self {
            header,
            data_rows,
            footer,
        }
    }

    /// Build a snapshot from CSV/TSV bytes; the first line is the header.
    pub fn from_delimited(data: &[u8], delim: Delimiter) -> Result<Self> {
        Ok(Self::from_input(&csv::parse_delimited(data, delim)?))
    }

    /// A header with no data rows, e.g. before the first remote page arrives.
    pub fn with_header(titles: &[&str]) -> Self {
        Self {
            header: Row::new(
                titles.iter().map(|t| Cell::from_text(t)).collect(),
                0,
                RowSection::Header,
            ),
            data_rows: Vec::new(),
            footer: None,
        }
    }

    pub fn column_count(&self) -> usize {
        self.header.column_count()
    }

    pub fn header(&self) -> &Row {
        &self.header
    }

    pub(crate) fn header_mut(&mut self) -> &mut Row {
        &mut self.header
    }

    pub fn footer(&self) -> Option<&Row> {
        self.footer.as_ref()
    }

    /// Data rows in their current order.
    pub fn data_rows(&self) -> &[Row] {
        &self.data_rows
    }

    pub(crate) fn data_rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.data_rows
    }

    /// Every row in table order: header, data rows, footer.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        std::iter::once(&self.header)
            .chain(self.data_rows.iter())
            .chain(self.footer.iter())
    }

    /// Visible data rows in their current order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.data_rows.iter().filter(|row| row.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows().count()
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
    fn test_from_input_sections() {
        let input: TableInput = serde_json::from_str(
            r#"{"header": ["A", "B"], "rows": [["1", "2"], ["3", "4"]], "footer": ["s", "t"]}"#,
        )
        .unwrap();
        let table = TableSnapshot::from_input(&input);
        assert_eq!(table.column_count(), 2);
        assert!(table.header().is_header());
        assert_eq!(table.data_rows().len(), 2);
        assert!(table
            .data_rows()
            .iter()
            .all(|r| !r.is_header() && !r.is_footer()));
        assert!(table.footer().unwrap().is_footer());

        let ids: Vec<usize> = table.rows().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_from_delimited() {
        let table = TableSnapshot::from_delimited(b"x,y\n1,<b>\n", Delimiter::Comma).unwrap();
        assert_eq!(table.column_count(), 2);
        let cell = table.data_rows()[0].cell(1).unwrap();
        assert_eq!(cell.content(), "<b>");
        assert_eq!(cell.inner_html, "&lt;b&gt;");
    }

    #[test]
    fn test_with_header_is_empty() {
        let table = TableSnapshot::with_header(&["a", "b", "c"]);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.visible_count(), 0);
    }
}
