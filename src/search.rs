//! Row search.
//!
//! A query is split into tokens, then every data row's `visible` flag is
//! recomputed against the searchable cells:
//! - full match: every token must be a case-insensitive substring of some
//!   cell's text (AND across tokens, OR across cells)
//! - partial match: tokens are joined into one case-insensitive, multi-line
//!   regular expression `t1|t2|...` tested against each cell's markup
//!
//! Search never reorders rows.

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::types::Row;

/// A token is a quoted phrase or a run of non-space characters, optionally
/// prefixed with `+`/`-`.
#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[+-]?(?:'.+?'|".+?"|[^+\- ][^ ]*)"#).expect("token pattern is valid")
});

/// How query tokens combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Any token may match any cell (regular expression alternation).
    #[default]
    Partial,
    /// Every token must match some cell (substring containment).
    Full,
}

impl SearchMode {
    pub fn from_full_match(full_match: bool) -> Self {
        if full_match {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// Split a query into search tokens.
///
/// Quotes are removed from quoted phrases (escaped quotes too) and a leading
/// `+`/`-` sign is dropped. Tokens left empty are discarded.
pub fn tokenize(query: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(query)
        .map(|m| {
            let token = m.as_str();
            let token = token.strip_prefix(['+', '-']).unwrap_or(token);
            token
                .replace("\\\"", "")
                .replace("\\'", "")
                .replace(['"', '\''], "")
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// A compiled query.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// The query has no tokens; every row matches.
    All,
    /// Lowercased tokens, all of which must be found.
    Full(Vec<String>),
    /// Alternation of all tokens.
    Partial(Regex),
}

impl Matcher {
    pub fn new(query: &str, mode: SearchMode) -> Self {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Self::All;
        }
        match mode {
            SearchMode::Full => Self::Full(tokens.iter().map(|t| t.to_lowercase()).collect()),
            SearchMode::Partial => Self::Partial(partial_regex(&tokens)),
        }
    }

    /// Test a row, skipping the cells of non-searchable columns.
    pub fn matches_row(&self, row: &Row, not_searchable: &BTreeSet<usize>) -> bool {
        let mut cells = row
            .cells
            .iter()
            .enumerate()
            .filter(|(idx, _)| !not_searchable.contains(idx))
            .map(|(_, cell)| cell);

        match self {
            Self::All => true,
            Self::Partial(re) => cells.any(|cell| re.is_match(&cell.inner_html)),
            Self::Full(tokens) => {
                let texts: Vec<String> = cells.map(|cell| cell.content().to_lowercase()).collect();
                tokens
                    .iter()
                    .all(|token| texts.iter().any(|text| text.contains(token.as_str())))
            }
        }
    }
}

/// Build `t1|t2|...`; tokens are regular expressions as typed. If the joined
/// pattern does not compile, the tokens are matched literally instead.
pub(crate) fn partial_regex(tokens: &[String]) -> Regex {
    let build = |pattern: &str| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
    };

    match build(&tokens.join("|")) {
        Ok(re) => re,
        Err(err) => {
            log::warn!("search pattern rejected ({err}), matching tokens literally");
            let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
            match build(&escaped.join("|")) {
                Ok(re) => re,
                // Escaped literals only fail on the size limit; match nothing.
                Err(_) => never_matching(),
            }
        }
    }
}

#[allow(clippy::expect_used)]
fn never_matching() -> Regex {
    Regex::new(r"[^\s\S]").expect("empty class is valid")
}

/// Recompute row visibility for `query` and return the number of visible rows.
///
/// An empty or whitespace-only query makes every row visible.
pub fn apply_search(
    rows: &mut [Row],
    query: &str,
    mode: SearchMode,
    not_searchable: &BTreeSet<usize>,
) -> usize {
    if query.trim().is_empty() {
        for row in rows.iter_mut() {
            row.visible = true;
        }
        return rows.len();
    }

    let matcher = Matcher::new(query, mode);
    let mut visible = 0;
    for row in rows.iter_mut() {
        row.visible = false;
        if matcher.matches_row(row, not_searchable) {
            row.visible = true;
            visible += 1;
        }
    }
    visible
}

/// Drops search calls that repeat the current query (when dedupe is on) or
/// arrive within `delay_ms` of the last admitted search.
#[derive(Debug, Clone, Default)]
pub struct SearchGate {
    delay_ms: u32,
    dedupe: bool,
    last_admitted_ms: Option<f64>,
}

impl SearchGate {
    pub fn new(delay_ms: u32, dedupe: bool) -> Self {
        Self {
            delay_ms,
            dedupe,
            last_admitted_ms: None,
        }
    }

    /// Decide whether a search for `query` runs now. Dropped calls are not
    /// queued.
    pub fn admit(&mut self, query: &str, current: Option<&str>, now_ms: f64) -> bool {
        if self.dedupe && current == Some(query) {
            return false;
        }
        if self.delay_ms > 0 {
            if let Some(last) = self.last_admitted_ms {
                if now_ms - last < f64::from(self.delay_ms) {
                    return false;
                }
            }
        }
        self.last_admitted_ms = Some(now_ms);
        true
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
    use crate::types::{Cell, RowSection};
    use std::collections::BTreeMap;
    use test_case::test_case;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter()
            .enumerate()
            .map(|(idx, cells)| {
                Row::new(
                    cells
                        .iter()
                        .map(|html| Cell::new(*html, BTreeMap::new()))
                        .collect(),
                    idx,
                    RowSection::Body,
                )
            })
            .collect()
    }

    fn visible_ids(rows: &[Row]) -> Vec<usize> {
        rows.iter().filter(|r| r.visible).map(|r| r.row_id).collect()
    }

    #[test_case("red car", &["red", "car"] ; "bare words")]
    #[test_case("  spaced   out ", &["spaced", "out"] ; "extra spaces")]
    #[test_case("\"red car\" blue", &["red car", "blue"] ; "double quoted phrase")]
    #[test_case("'big truck'", &["big truck"] ; "single quoted phrase")]
    #[test_case("+red -blue", &["red", "blue"] ; "sign prefixes stripped")]
    #[test_case("it\\'s", &["its"] ; "escaped quote removed")]
    #[test_case("+ -", &[] ; "signs only")]
    #[test_case("", &[] ; "empty")]
    fn test_tokenize(query: &str, expected: &[&str]) {
        assert_eq!(tokenize(query), expected);
    }

    #[test]
    fn test_full_match_requires_every_token() {
        let mut data = rows(&[&["red car"], &["blue car"], &["red bike"]]);
        let visible = apply_search(&mut data, "red car", SearchMode::Full, &BTreeSet::new());
        assert_eq!(visible, 1);
        assert_eq!(visible_ids(&data), vec![0]);
    }

    #[test]
    fn test_full_match_tokens_may_hit_different_cells() {
        let mut data = rows(&[&["Red", "Car"], &["Red", "Bike"]]);
        apply_search(&mut data, "car RED", SearchMode::Full, &BTreeSet::new());
        assert_eq!(visible_ids(&data), vec![0]);
    }

    #[test]
    fn test_full_match_uses_text_not_markup() {
        let mut data = rows(&[&["<span class=\"car\">red</span>"]]);
        apply_search(&mut data, "car", SearchMode::Full, &BTreeSet::new());
        assert!(visible_ids(&data).is_empty());
    }

    #[test]
    fn test_partial_match_is_any_token() {
        let mut data = rows(&[&["red car"], &["blue car"], &["green bike"]]);
        let visible = apply_search(&mut data, "RED bike", SearchMode::Partial, &BTreeSet::new());
        assert_eq!(visible, 2);
        assert_eq!(visible_ids(&data), vec![0, 2]);
    }

    #[test]
    fn test_partial_match_sees_markup() {
        let mut data = rows(&[&["<a href=\"/docs\">read</a>"], &["plain"]]);
        apply_search(&mut data, "href", SearchMode::Partial, &BTreeSet::new());
        assert_eq!(visible_ids(&data), vec![0]);
    }

    #[test]
    fn test_partial_match_tokens_are_patterns() {
        let mut data = rows(&[&["A-100"], &["B-200"], &["C-300"]]);
        apply_search(&mut data, "^[ab]-", SearchMode::Partial, &BTreeSet::new());
        assert_eq!(visible_ids(&data), vec![0, 1]);
    }

    #[test]
    fn test_invalid_pattern_falls_back_to_literal() {
        let mut data = rows(&[&["f(x)"], &["g"]]);
        apply_search(&mut data, "f(", SearchMode::Partial, &BTreeSet::new());
        assert_eq!(visible_ids(&data), vec![0]);
    }

    #[test]
    fn test_not_searchable_columns_are_skipped() {
        let mut data = rows(&[&["alpha", "secret"], &["secret", "beta"]]);
        let skip: BTreeSet<usize> = [1].into_iter().collect();
        apply_search(&mut data, "secret", SearchMode::Partial, &skip);
        assert_eq!(visible_ids(&data), vec![1]);
        apply_search(&mut data, "secret", SearchMode::Full, &skip);
        assert_eq!(visible_ids(&data), vec![1]);
    }

    #[test_case(SearchMode::Partial ; "partial")]
    #[test_case(SearchMode::Full ; "full")]
    fn test_empty_query_round_trip(mode: SearchMode) {
        let mut data = rows(&[&["one"], &["two"], &["three"]]);
        apply_search(&mut data, "", mode, &BTreeSet::new());
        apply_search(&mut data, "two", mode, &BTreeSet::new());
        assert_eq!(visible_ids(&data), vec![1]);
        let visible = apply_search(&mut data, "   ", mode, &BTreeSet::new());
        assert_eq!(visible, 3);
        assert!(data.iter().all(|r| r.visible));
    }

    #[test]
    fn test_tokenless_query_matches_everything() {
        let mut data = rows(&[&["one"], &["two"]]);
        assert_eq!(
            apply_search(&mut data, "+", SearchMode::Partial, &BTreeSet::new()),
            2
        );
    }

    #[test]
    fn test_gate_dedupe() {
        let mut gate = SearchGate::new(0, true);
        assert!(gate.admit("abc", None, 0.0));
        assert!(!gate.admit("abc", Some("abc"), 1.0));
        assert!(gate.admit("abcd", Some("abc"), 2.0));
    }

    #[test]
    fn test_gate_delay_drops_calls_inside_window() {
        let mut gate = SearchGate::new(300, false);
        assert!(gate.admit("a", None, 1000.0));
        assert!(!gate.admit("ab", Some("a"), 1100.0));
        assert!(!gate.admit("abc", Some("a"), 1299.0));
        assert!(gate.admit("abcd", Some("a"), 1300.0));
    }
}
