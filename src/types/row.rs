use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Cell, CellData, RowData};

/// Which part of the table a row belongs to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RowSection {
    Header,
    #[default]
    Body,
    Footer,
}

/// An ordered sequence of cells with a stable identity.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Position in the source, assigned once at ingestion
    pub row_id: usize,
    pub section: RowSection,
    /// Cleared by search when the row does not match
    pub visible: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, String>,
}

impl Row {
    pub fn new(cells: Vec<Cell>, row_id: usize, section: RowSection) -> Self {
        Self {
            cells,
            row_id,
            section,
            visible: true,
            attributes: BTreeMap::new(),
        }
    }

    pub fn from_data(data: &RowData, row_id: usize, section: RowSection) -> Self {
        let cells = data.cells().iter().map(CellData::to_cell).collect();
        Self {
            attributes: data.attribute_strings(),
            ..Self::new(cells, row_id, section)
        }
    }

    pub fn is_header(&self) -> bool {
        self.section == RowSection::Header
    }

    pub fn is_footer(&self) -> bool {
        self.section == RowSection::Footer
    }

    pub fn column_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn cell_mut(&mut self, column: usize) -> Option<&mut Cell> {
        self.cells.get_mut(column)
    }

    /// Text of the cell at `column`; missing cells read as empty.
    pub fn cell_content(&self, column: usize) -> &str {
        self.cell(column).map_or("", Cell::content)
    }
}
