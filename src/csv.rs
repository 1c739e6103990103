//! Minimal CSV/TSV parser that produces a [`TableInput`], first line as header.

use crate::error::{DtviewError, Result};
use crate::html;
use crate::types::{CellData, RowData, TableInput};

/// Delimiter for parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    /// Guess the delimiter from a file name extension.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".tsv") {
            Self::Tab
        } else {
            Self::Comma
        }
    }

    fn separator(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }
}

/// Parse CSV/TSV bytes into a table description.
///
/// Blank lines are skipped. Fields are plain text and are stored escaped.
pub fn parse_delimited(data: &[u8], delim: Delimiter) -> Result<TableInput> {
    let text = String::from_utf8_lossy(data);
    let sep = delim.separator();

    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| DtviewError::Config("delimited input has no header line".into()))?;

    let to_row = |line: &str| {
        RowData::Cells(
            split_csv_line(line, sep)
                .iter()
                .map(|field| CellData::text(html::escape(field.trim())))
                .collect(),
        )
    };

    Ok(TableInput {
        header: to_row(header),
        rows: lines.map(to_row).collect(),
        footer: None,
    })
}

/// Split a CSV line respecting quoted fields.
fn split_csv_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let data = b"Name,Age,City\nAlice,30,NYC\n\nBob,25,LA";
        let table = parse_delimited(data, Delimiter::Comma).unwrap();
        assert_eq!(table.header.cells().len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells()[0], CellData::text("Alice"));
        assert_eq!(table.rows[1].cells()[1], CellData::text("25"));
    }

    #[test]
    fn test_parse_tsv() {
        let data = b"A\tB\n1\t2";
        let table = parse_delimited(data, Delimiter::Tab).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells().len(), 2);
    }

    #[test]
    fn test_quoted_csv() {
        let data = b"\"Hello, World\",42\n\"She said \"\"hi\"\"\",0";
        let table = parse_delimited(data, Delimiter::Comma).unwrap();
        assert_eq!(table.header.cells()[0], CellData::text("Hello, World"));
        let cell = table.rows[0].cells()[0].to_cell();
        assert_eq!(cell.content(), "She said \"hi\"");
        assert_eq!(cell.inner_html, "She said &quot;hi&quot;");
    }

    #[test]
    fn test_empty_csv() {
        assert!(parse_delimited(b"", Delimiter::Comma).is_err());
    }

    #[test]
    fn test_delimiter_from_path() {
        assert_eq!(Delimiter::from_path("data.TSV"), Delimiter::Tab);
        assert_eq!(Delimiter::from_path("data.csv"), Delimiter::Comma);
    }
}
