//! Column sort.
//!
//! Cell text is lowercased and stripped of `$`, `,`, `%` and whitespace, then
//! read as a number when possible. Empty cells go to the configured end of
//! the order whatever the direction. A non-numeric value paired with a
//! numeric one counts as missing and goes with the empties. Everything else
//! compares by value and flips for descending.
//!
//! The order is total, so any pair of rows compares consistently. Rows with
//! equal keys keep their previous relative order; nothing else breaks ties.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{DtviewError, Result};
use crate::types::{Row, SortDirection};

/// Where empty and missing values land.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EmptyPlacement {
    /// Top of the table in both directions.
    #[default]
    First,
    /// Bottom of the table in both directions.
    Last,
}

/// Comparable form of a cell's content.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Empty,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn from_content(content: &str) -> Self {
        let stripped: String = content
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
            .collect();

        if stripped.is_empty() {
            return Self::Empty;
        }
        match stripped.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(stripped),
        }
    }

    /// Group order; groups never mix and ignore the direction.
    fn rank(&self, placement: EmptyPlacement) -> u8 {
        match (placement, self) {
            (EmptyPlacement::First, Self::Empty) | (EmptyPlacement::Last, Self::Number(_)) => 0,
            (_, Self::Text(_)) => 1,
            (EmptyPlacement::First, Self::Number(_)) | (EmptyPlacement::Last, Self::Empty) => 2,
        }
    }
}

/// Compare two keys for `direction`.
///
/// `Natural` compares as ascending; natural order itself is restored by
/// [`sort_rows`] through the row ids.
pub fn compare_keys(
    a: &SortKey,
    b: &SortKey,
    direction: SortDirection,
    placement: EmptyPlacement,
) -> Ordering {
    let (rank_a, rank_b) = (a.rank(placement), b.rank(placement));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    let ord = match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => Ordering::Equal,
    };
    match direction {
        SortDirection::Desc => ord.reverse(),
        SortDirection::Asc | SortDirection::Natural => ord,
    }
}

/// Reject columns outside `[0, columns - 1]`.
pub fn check_column(column: usize, columns: usize) -> Result<()> {
    if column < columns {
        Ok(())
    } else {
        Err(DtviewError::ColumnOutOfRange { column, columns })
    }
}

/// Reorder `rows` by `column`; `Natural` restores ascending row id order.
pub fn sort_rows(
    rows: &mut Vec<Row>,
    column: usize,
    direction: SortDirection,
    placement: EmptyPlacement,
) {
    if direction == SortDirection::Natural {
        rows.sort_by_key(|row| row.row_id);
        return;
    }

    let mut keyed: Vec<(SortKey, Row)> = std::mem::take(rows)
        .into_iter()
        .map(|row| (SortKey::from_content(row.cell_content(column)), row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, direction, placement));
    rows.extend(keyed.into_iter().map(|(_, row)| row));
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{Cell, RowSection};
    use test_case::test_case;

    fn column(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .enumerate()
            .map(|(idx, v)| Row::new(vec![Cell::from_text(v)], idx, RowSection::Body))
            .collect()
    }

    fn contents(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.cell_content(0)).collect()
    }

    fn sorted(values: &[&str], direction: SortDirection, placement: EmptyPlacement) -> Vec<String> {
        let mut rows = column(values);
        sort_rows(&mut rows, 0, direction, placement);
        contents(&rows).into_iter().map(String::from).collect()
    }

    #[test_case("$1,200.50", SortKey::Number(1200.5) ; "currency")]
    #[test_case("45 %", SortKey::Number(45.0) ; "percent")]
    #[test_case("-3", SortKey::Number(-3.0) ; "negative")]
    #[test_case("  ", SortKey::Empty ; "blank")]
    #[test_case("$", SortKey::Empty ; "only punctuation")]
    #[test_case("Hello World", SortKey::Text("helloworld".into()) ; "text lowercased and unspaced")]
    #[test_case("NaN", SortKey::Text("nan".into()) ; "nan is text")]
    #[test_case("infinity", SortKey::Text("infinity".into()) ; "infinity is text")]
    fn test_sort_key(content: &str, expected: SortKey) {
        assert_eq!(SortKey::from_content(content), expected);
    }

    #[test]
    fn test_numeric_aware_ascending() {
        assert_eq!(
            sorted(&["10", "2", "9"], SortDirection::Asc, EmptyPlacement::First),
            vec!["2", "9", "10"]
        );
    }

    #[test]
    fn test_descending_is_reverse_without_ties() {
        let values = ["pear", "apple", "fig", "banana"];
        let asc = sorted(&values, SortDirection::Asc, EmptyPlacement::First);
        let mut desc = sorted(&values, SortDirection::Desc, EmptyPlacement::First);
        desc.reverse();
        assert_eq!(asc, desc);
        assert_eq!(asc, vec!["apple", "banana", "fig", "pear"]);
    }

    #[test_case(SortDirection::Asc, &["", "", "1", "3"] ; "ascending")]
    #[test_case(SortDirection::Desc, &["", "", "3", "1"] ; "descending")]
    fn test_empty_cells_first_in_both_directions(direction: SortDirection, expected: &[&str]) {
        assert_eq!(
            sorted(&["3", "", "1", ""], direction, EmptyPlacement::First),
            expected
        );
    }

    #[test]
    fn test_empty_cells_last_when_configured() {
        assert_eq!(
            sorted(&["", "3", "1"], SortDirection::Desc, EmptyPlacement::Last),
            vec!["3", "1", ""]
        );
    }

    // An older comparator only special-cased empty cells; text mixed with
    // numbers then compared by raw value. Text now counts as missing.
    #[test_case(SortDirection::Asc, &["", "abc", "1", "5"] ; "ascending")]
    #[test_case(SortDirection::Desc, &["", "abc", "5", "1"] ; "descending")]
    fn test_text_mixed_with_numbers_counts_as_missing(
        direction: SortDirection,
        expected: &[&str],
    ) {
        assert_eq!(
            sorted(&["5", "abc", "1", ""], direction, EmptyPlacement::First),
            expected
        );
    }

    #[test]
    fn test_currency_column() {
        assert_eq!(
            sorted(&["$1,200", "$300", "$45.5"], SortDirection::Asc, EmptyPlacement::First),
            vec!["$45.5", "$300", "$1,200"]
        );
    }

    #[test]
    fn test_natural_restores_row_ids() {
        let mut rows = column(&["c", "a", "b"]);
        sort_rows(&mut rows, 0, SortDirection::Asc, EmptyPlacement::First);
        assert_eq!(contents(&rows), vec!["a", "b", "c"]);
        sort_rows(&mut rows, 0, SortDirection::Natural, EmptyPlacement::First);
        let ids: Vec<usize> = rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_equal_keys_keep_relative_order() {
        let mut rows = column(&["b", "a", "B", "A"]);
        sort_rows(&mut rows, 0, SortDirection::Asc, EmptyPlacement::First);
        let ids: Vec<usize> = rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_missing_cells_read_as_empty() {
        let mut rows = vec![
            Row::new(vec![Cell::from_text("x"), Cell::from_text("2")], 0, RowSection::Body),
            Row::new(vec![Cell::from_text("y")], 1, RowSection::Body),
        ];
        sort_rows(&mut rows, 1, SortDirection::Asc, EmptyPlacement::First);
        assert_eq!(rows[0].row_id, 1);
    }

    #[test]
    fn test_check_column() {
        assert!(check_column(2, 3).is_ok());
        assert!(matches!(
            check_column(3, 3),
            Err(DtviewError::ColumnOutOfRange {
                column: 3,
                columns: 3
            })
        ));
    }
}
