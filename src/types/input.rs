use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::Cell;

/// A cell as it arrives from JSON: a raw value, or a value with attributes.
///
/// ```json
/// "Alice"
/// 42
/// { "data": "<b>Bob</b>", "attributes": { "class": "vip" } }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CellData {
    Detailed {
        data: Value,
        #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
        attributes: BTreeMap<String, Value>,
    },
    Raw(Value),
}

/// A row as it arrives from JSON: a cell array, or cells with attributes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RowData {
    Detailed {
        data: Vec<CellData>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
        attributes: BTreeMap<String, Value>,
    },
    Cells(Vec<CellData>),
}

/// A complete table description used to build a snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableInput {
    pub header: RowData,
    #[serde(default)]
    pub rows: Vec<RowData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub footer: Option<RowData>,
}

/// Render a JSON value the way it would appear as element content.
fn value_to_markup(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

fn attributes_to_strings(attributes: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    attributes
        .iter()
        .map(|(k, v)| (k.clone(), value_to_markup(v)))
        .collect()
}

impl CellData {
    /// Plain string cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Raw(Value::String(value.into()))
    }

    /// The cell value as markup, without attributes.
    pub fn markup(&self) -> String {
        match self {
            Self::Raw(value) | Self::Detailed { data: value, .. } => value_to_markup(value),
        }
    }

    pub fn to_cell(&self) -> Cell {
        match self {
            Self::Raw(value) => Cell::new(value_to_markup(value), BTreeMap::new()),
            Self::Detailed { data, attributes } => {
                Cell::new(value_to_markup(data), attributes_to_strings(attributes))
            }
        }
    }
}

impl RowData {
    pub fn cells(&self) -> &[CellData] {
        match self {
            Self::Cells(cells) | Self::Detailed { data: cells, .. } => cells,
        }
    }

    pub(crate) fn attribute_strings(&self) -> BTreeMap<String, String> {
        match self {
            Self::Cells(_) => BTreeMap::new(),
            Self::Detailed { attributes, .. } => attributes_to_strings(attributes),
        }
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
    fn test_decode_mixed_cell_shapes() {
        let row: RowData = serde_json::from_str(
            r#"["Alice", 42, null, {"data": "<b>x</b>", "attributes": {"class": "hot", "colspan": 2}}]"#,
        )
        .unwrap();
        let cells: Vec<Cell> = row.cells().iter().map(CellData::to_cell).collect();
        assert_eq!(cells[0].content(), "Alice");
        assert_eq!(cells[1].content(), "42");
        assert_eq!(cells[2].content(), "");
        assert_eq!(cells[3].content(), "x");
        assert_eq!(cells[3].attributes["class"], "hot");
        assert_eq!(cells[3].attributes["colspan"], "2");
    }

    #[test]
    fn test_decode_row_with_attributes() {
        let row: RowData =
            serde_json::from_str(r#"{"data": ["a", "b"], "attributes": {"id": "r1"}}"#).unwrap();
        assert_eq!(row.cells().len(), 2);
        assert_eq!(row.attribute_strings()["id"], "r1");
    }

    #[test]
    fn test_decode_table_input() {
        let input: TableInput = serde_json::from_str(
            r#"{"header": ["Name", {"data": "Age", "attributes": {"data-sort": "desc"}}],
                "rows": [["a", 1], ["b", 2]]}"#,
        )
        .unwrap();
        assert_eq!(input.rows.len(), 2);
        assert!(input.footer.is_none());
    }
}
