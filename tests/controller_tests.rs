//! End-to-end tests of local (client-side) tables: paging, sorting, search
//! and the events and frames they produce.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use std::cell::Cell as StdCell;
use std::rc::Rc;

use common::{first_column, numbered_table, record_events, table_from_json, visible_names};
use dtview::events::{EventKind, TableEvent};
use dtview::sort::EmptyPlacement;
use dtview::url_state::UrlState;
use dtview::{
    Cell, Clock, DtviewError, PageLinkKind, Refresh, Row, SortDirection, TableConfig,
    TableController, TableSnapshot,
};

fn ready(refresh: Refresh) -> dtview::RenderFrame {
    refresh.into_frame().expect("local tables resolve immediately")
}

// ============================================================================
// Paging
// ============================================================================

#[test]
fn test_twelve_rows_five_per_page() {
    let mut table = numbered_table(12, TableConfig::default());
    let frame = ready(table.start());

    assert_eq!(frame.page_count, 3);
    assert_eq!(frame.current_page, 1);
    assert_eq!(
        first_column(&frame),
        vec!["Row 1", "Row 2", "Row 3", "Row 4", "Row 5"]
    );
    assert_eq!(frame.info, "Showing 1 to 5 of 12 entries");
    assert!(frame.message.is_none());

    let frame = ready(table.paginate(3));
    assert_eq!(first_column(&frame), vec!["Row 11", "Row 12"]);
    assert_eq!(frame.info, "Showing 11 to 12 of 12 entries");
}

#[test]
fn test_paginate_clamps_to_existing_pages() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    assert_eq!(ready(table.paginate(99)).current_page, 3);
    assert_eq!(ready(table.paginate(0)).current_page, 1);
    assert!(table.is_valid_page(3));
    assert!(!table.is_valid_page(4));
    assert!(!table.is_valid_page(0));
}

#[test]
fn test_per_page_change_keeps_page_in_range() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.paginate(3);

    let frame = ready(table.set_per_page(10).unwrap());
    assert_eq!(frame.page_count, 2);
    assert_eq!(frame.current_page, 2);
    assert_eq!(first_column(&frame), vec!["Row 11", "Row 12"]);

    assert!(matches!(
        table.set_per_page(0),
        Err(DtviewError::InvalidPerPage(0))
    ));
    assert_eq!(table.per_page(), 10);
}

#[test]
fn test_truncated_pager_links() {
    let mut table = numbered_table(100, TableConfig::default());
    table.start();
    let frame = ready(table.paginate(10));

    let labels: Vec<&str> = frame.pages.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "&lsaquo;", "1", "&hellip;", "8", "9", "10", "11", "12", "&hellip;", "20", "&rsaquo;"
        ]
    );
    let active: Vec<usize> = frame
        .pages
        .iter()
        .filter(|l| l.active)
        .map(|l| l.page)
        .collect();
    assert_eq!(active, vec![10]);
    assert_eq!(frame.pages[0].kind, PageLinkKind::Prev);
    assert_eq!(frame.pages[0].page, 9);
}

#[test]
fn test_single_page_has_no_pager() {
    let mut table = numbered_table(3, TableConfig::default());
    let frame = ready(table.start());
    assert!(frame.pages.is_empty());
    assert_eq!(frame.page_count, 1);
}

#[test]
fn test_first_last_controls() {
    let config = TableConfig {
        first_last: true,
        truncate_pager: false,
        ..TableConfig::default()
    };
    let mut table = numbered_table(12, config);
    let frame = ready(table.start());

    let kinds: Vec<PageLinkKind> = frame.pages.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PageLinkKind::First,
            PageLinkKind::Prev,
            PageLinkKind::Page,
            PageLinkKind::Page,
            PageLinkKind::Page,
            PageLinkKind::Next,
            PageLinkKind::Last,
        ]
    );
    assert_eq!(frame.pages.last().unwrap().page, 3);
}

#[test]
fn test_huge_pager_delta_lists_every_page() {
    let config = TableConfig::from_json(r#"{"pagerDelta": 18446744073709551615}"#).unwrap();
    let mut table = numbered_table(12, config);
    let frame = ready(table.start());

    let pages: Vec<usize> = frame
        .pages
        .iter()
        .filter(|l| l.kind == PageLinkKind::Page)
        .map(|l| l.page)
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[test]
fn test_frame_carries_selector_options() {
    let config = TableConfig {
        per_page_select: vec![5, 50],
        searchable: false,
        ..TableConfig::default()
    };
    let mut table = numbered_table(3, config);
    let frame = ready(table.start());
    assert_eq!(frame.per_page_select, vec![5, 50]);
    assert!(!frame.searchable);

    let frame = ready(numbered_table(3, TableConfig::default()).start());
    assert_eq!(frame.per_page_select, vec![5, 10, 15, 20, 25]);
    assert!(frame.searchable);
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn test_numeric_sort_is_not_lexicographic() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    let frame = ready(table.sort(1, SortDirection::Desc).unwrap());
    assert_eq!(
        first_column(&frame),
        vec!["Row 12", "Row 11", "Row 10", "Row 9", "Row 8"]
    );
    assert_eq!(frame.sort_column, Some(1));
    assert_eq!(frame.sort_direction, SortDirection::Desc);
    assert!(frame.header.cells[1].classes.contains(&"desc".to_string()));

    let frame = ready(table.sort(1, SortDirection::Asc).unwrap());
    assert_eq!(
        first_column(&frame),
        vec!["Row 1", "Row 2", "Row 3", "Row 4", "Row 5"]
    );
    assert!(frame.header.cells[1].classes.contains(&"asc".to_string()));
    assert!(!frame.header.cells[1].classes.contains(&"desc".to_string()));
}

#[test]
fn test_text_sort_compares_stripped_lowercase() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    let frame = ready(table.sort(0, SortDirection::Asc).unwrap());
    assert_eq!(
        first_column(&frame),
        vec!["Row 1", "Row 10", "Row 11", "Row 12", "Row 2"]
    );
}

#[test]
fn test_natural_restores_source_order() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.sort(1, SortDirection::Desc).unwrap();

    let frame = ready(table.sort(1, SortDirection::Natural).unwrap());
    assert_eq!(
        first_column(&frame),
        vec!["Row 1", "Row 2", "Row 3", "Row 4", "Row 5"]
    );
    assert!(frame.header.cells[1]
        .classes
        .iter()
        .all(|c| c != "asc" && c != "desc"));
}

#[test]
fn test_header_activation_cycles_directions() {
    let mut table = numbered_table(4, TableConfig::default());
    table.start();

    let directions: Vec<SortDirection> = (0..4)
        .map(|_| ready(table.sort_next(1).unwrap()).sort_direction)
        .collect();
    assert_eq!(
        directions,
        vec![
            SortDirection::Asc,
            SortDirection::Desc,
            SortDirection::Natural,
            SortDirection::Asc
        ]
    );

    // A different column starts over at ascending.
    table.sort(1, SortDirection::Desc).unwrap();
    assert_eq!(
        ready(table.sort_next(0).unwrap()).sort_direction,
        SortDirection::Asc
    );
}

#[test]
fn test_sort_rejects_unknown_column() {
    let mut table = numbered_table(6, TableConfig::default());
    table.start();

    let err = table.sort(5, SortDirection::Asc).unwrap_err();
    assert!(matches!(
        err,
        DtviewError::ColumnOutOfRange {
            column: 5,
            columns: 2
        }
    ));
    assert_eq!(table.sort_column(), None);
    assert!(table.sort_next(2).is_err());
}

#[test]
fn test_empty_cells_placement() {
    let json = r#"{"header": ["Name", "Value"], "rows": [["a", "3"], ["b", ""], ["c", "1"], ["d", "2"]]}"#;

    let mut table = table_from_json(json, TableConfig::default());
    table.start();
    let asc = ready(table.sort(1, SortDirection::Asc).unwrap());
    assert_eq!(first_column(&asc), vec!["b", "c", "d", "a"]);
    let desc = ready(table.sort(1, SortDirection::Desc).unwrap());
    assert_eq!(first_column(&desc), vec!["b", "a", "d", "c"]);

    let config = TableConfig {
        empty_placement: EmptyPlacement::Last,
        ..TableConfig::default()
    };
    let mut table = table_from_json(json, config);
    table.start();
    let asc = ready(table.sort(1, SortDirection::Asc).unwrap());
    assert_eq!(first_column(&asc), vec!["c", "d", "a", "b"]);
    let desc = ready(table.sort(1, SortDirection::Desc).unwrap());
    assert_eq!(first_column(&desc), vec!["a", "d", "c", "b"]);
}

#[test]
fn test_currency_and_percent_sort_as_numbers() {
    let json = r#"{"header": ["Item", "Price"], "rows": [["x", "$1,200"], ["y", "$300"], ["z", "15%"]]}"#;
    let mut table = table_from_json(json, TableConfig::default());
    table.start();
    let frame = ready(table.sort(1, SortDirection::Asc).unwrap());
    assert_eq!(first_column(&frame), vec!["z", "y", "x"]);
}

#[test]
fn test_sort_is_stable_for_equal_keys() {
    let json = r#"{"header": ["Name", "Group"], "rows": [["a", "2"], ["b", "1"], ["c", "2"], ["d", "1"]]}"#;
    let mut table = table_from_json(json, TableConfig::default());
    table.start();
    let frame = ready(table.sort(1, SortDirection::Asc).unwrap());
    assert_eq!(first_column(&frame), vec!["b", "d", "a", "c"]);
}

// ============================================================================
// Column definitions
// ============================================================================

#[test]
fn test_column_definition_disables_sorting() {
    let config = TableConfig::from_json(r#"{"columns": [{"select": 1, "sortable": false}]}"#)
        .unwrap();
    let mut table = numbered_table(4, config);
    let frame = ready(table.start());

    assert!(table.is_sortable(0));
    assert!(!table.is_sortable(1));
    assert!(frame.header.cells[0]
        .classes
        .contains(&"dt-sorter".to_string()));
    assert!(!frame.header.cells[1]
        .classes
        .contains(&"dt-sorter".to_string()));
    assert_eq!(
        frame.header.cells[1]
            .attributes
            .get("data-sortable")
            .map(String::as_str),
        Some("false")
    );
    assert_eq!(table.sort_next(1).unwrap(), Refresh::Skipped);
}

#[test]
fn test_column_definition_initial_sort() {
    let config =
        TableConfig::from_json(r#"{"columns": [{"select": 1, "sort": "desc"}]}"#).unwrap();
    let mut table = numbered_table(12, config);
    let frame = ready(table.start());
    assert_eq!(frame.sort_column, Some(1));
    assert_eq!(frame.rows[0].cells[0].html, "Row 12");
}

#[test]
fn test_header_data_sort_wins_over_definition() {
    let json = r#"{
        "header": [{"data": "Name", "attributes": {"data-sort": "desc"}}, "Value"],
        "rows": [["Row 1", "1"], ["Row 2", "2"], ["Row 9", "9"], ["Row 10", "10"]]
    }"#;
    let config =
        TableConfig::from_json(r#"{"columns": [{"select": 1, "sort": "desc"}]}"#).unwrap();
    let mut table = table_from_json(json, config);
    let frame = ready(table.start());
    assert_eq!(frame.sort_column, Some(0));
    assert_eq!(first_column(&frame), vec!["Row 9", "Row 2", "Row 10", "Row 1"]);
}

#[test]
fn test_unsearchable_column_is_skipped() {
    let config =
        TableConfig::from_json(r#"{"columns": [{"select": [1], "searchable": false}]}"#)
            .unwrap();
    let mut table = numbered_table(12, config);
    table.start();

    let frame = ready(table.search("^1[0-2]$"));
    assert!(frame.rows.is_empty());
    assert_eq!(frame.message.as_deref(), Some("No entries found"));
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_full_match_requires_every_token() {
    let config = TableConfig {
        full_match: true,
        ..TableConfig::default()
    };
    let mut table = numbered_table(12, config);
    table.start();

    let frame = ready(table.search("row 1"));
    assert_eq!(
        visible_names(&table),
        vec!["Row 1", "Row 10", "Row 11", "Row 12"]
    );
    assert!(frame.is_searching);
    assert_eq!(frame.data_count, 4);
    assert_eq!(frame.data_count_total, 12);
    assert_eq!(
        frame.info,
        "Showing 1 to 4 of 4 entries (filtered from 12 entries)"
    );
}

#[test]
fn test_partial_match_is_regex_alternation() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    table.search("Row.3 Row.5");
    assert_eq!(visible_names(&table), vec!["Row 3", "Row 5"]);

    table.search("^Row.1[01]$");
    assert_eq!(visible_names(&table), vec!["Row 10", "Row 11"]);

    table.search(r#""Row 7""#);
    assert_eq!(visible_names(&table), vec!["Row 7"]);
}

#[test]
fn test_invalid_pattern_matches_literally() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    let frame = ready(table.search("("));
    assert!(frame.rows.is_empty());
    assert_eq!(frame.data_count, 0);
    assert_eq!(frame.page_count, 1);
    assert_eq!(
        frame.info,
        "Showing 0 to 0 of 0 entries (filtered from 12 entries)"
    );
}

#[test]
fn test_blank_query_resets_search() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.search("Row.3");
    assert_eq!(table.data_count(), 1);

    let frame = ready(table.search("   "));
    assert!(!frame.is_searching);
    assert_eq!(table.data_count(), 12);
    assert_eq!(frame.info, "Showing 1 to 5 of 12 entries");
}

#[test]
fn test_sort_keeps_search_filter() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.search("Row.1");

    let frame = ready(table.sort(1, SortDirection::Desc).unwrap());
    assert_eq!(
        first_column(&frame),
        vec!["Row 12", "Row 11", "Row 10", "Row 1"]
    );
}

#[test]
fn test_switching_match_mode_reruns_query() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    table.search("row 1");
    assert_eq!(table.data_count(), 12);

    let frame = ready(table.set_full_match(true));
    assert_eq!(frame.data_count, 4);
}

#[test]
fn test_search_resets_to_first_page() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.paginate(3);

    let frame = ready(table.search("Row"));
    assert_eq!(frame.current_page, 1);
}

#[derive(Clone, Default)]
struct ManualClock(Rc<StdCell<f64>>);

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

#[test]
fn test_search_delay_drops_calls() {
    let clock = ManualClock::default();
    let config = TableConfig {
        search_delay: 300,
        ..TableConfig::default()
    };
    let snapshot = TableSnapshot::from_input(&common::numbered_input(12));
    let mut table =
        TableController::with_clock(snapshot, config, Box::new(clock.clone())).unwrap();
    table.start();

    assert!(table.search("Row.1").frame().is_some());
    clock.0.set(100.0);
    assert_eq!(table.search("Row.2"), Refresh::Skipped);
    assert_eq!(table.search_query(), Some("Row.1"));

    clock.0.set(400.0);
    assert!(table.search("Row.2").frame().is_some());
    assert_eq!(visible_names(&table), vec!["Row 2"]);
}

#[test]
fn test_search_dedupe() {
    let config = TableConfig {
        search_dedupe: true,
        ..TableConfig::default()
    };
    let mut table = numbered_table(12, config);
    table.start();

    assert!(table.search("Row").frame().is_some());
    assert_eq!(table.search("Row"), Refresh::Skipped);
    assert!(table.search("Row.4").frame().is_some());
}

// ============================================================================
// Formatting
// ============================================================================

#[test]
fn test_matches_are_highlighted() {
    let mut table = numbered_table(3, TableConfig::default());
    table.start();

    let frame = ready(table.search("row"));
    assert_eq!(frame.rows[0].cells[0].html, "<mark>Row</mark> 1");
    assert_eq!(frame.rows[0].cells[1].html, "1");
}

#[test]
fn test_partial_highlight_marks_pattern_matches() {
    let mut table = numbered_table(3, TableConfig::default());
    table.start();

    let frame = ready(table.search("R.w 1"));
    assert_eq!(frame.data_count, 3);
    assert_eq!(frame.rows[0].cells[0].html, "<mark>Row</mark> <mark>1</mark>");
    assert_eq!(frame.rows[1].cells[0].html, "<mark>Row</mark> 2");
    assert_eq!(frame.rows[0].cells[1].html, "<mark>1</mark>");
}

#[test]
fn test_highlight_skips_anchors() {
    let json = serde_json::json!({
        "header": ["Link"],
        "rows": [[r#"<a href="/row">Row link</a> row"#]],
    })
    .to_string();
    let mut table = table_from_json(&json, TableConfig::default());
    table.start();

    let frame = ready(table.search("row"));
    assert_eq!(
        frame.rows[0].cells[0].html,
        r#"<a href="/row">Row link</a> <mark>row</mark>"#
    );
}

#[test]
fn test_highlight_can_be_disabled() {
    let config = TableConfig {
        highlight: false,
        ..TableConfig::default()
    };
    let mut table = numbered_table(3, config);
    table.start();
    let frame = ready(table.search("row"));
    assert_eq!(frame.rows[0].cells[0].html, "Row 1");
}

#[test]
fn test_column_renderer() {
    let mut table = numbered_table(3, TableConfig::default());
    table
        .set_column_renderer(
            1,
            Box::new(|cell: &Cell, row: &Row, _column: usize| {
                format!("<b>{}</b>#{}", cell.content(), row.row_id)
            }),
        )
        .unwrap();

    let frame = ready(table.start());
    assert_eq!(frame.rows[0].cells[1].html, "<b>1</b>#1");
    assert_eq!(frame.rows[0].cells[0].html, "Row 1");

    assert!(table.clear_column_renderer(1));
    let frame = ready(table.refresh());
    assert_eq!(frame.rows[0].cells[1].html, "1");

    assert!(table
        .set_column_renderer(2, Box::new(|_: &Cell, _: &Row, _: usize| String::new()))
        .is_err());
}

#[test]
fn test_footer_is_not_paged() {
    let json = r#"{"header": ["N"], "rows": [["a"], ["b"]], "footer": ["total"]}"#;
    let mut table = table_from_json(json, TableConfig::default());
    let frame = ready(table.start());
    assert_eq!(first_column(&frame), vec!["a", "b"]);
    assert_eq!(frame.footer.unwrap().cells[0].html, "total");
    assert_eq!(frame.data_count, 2);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_event_order() {
    let mut table = numbered_table(12, TableConfig::default());
    let log = record_events(
        &mut table,
        &[
            EventKind::Init,
            EventKind::Update,
            EventKind::Sort,
            EventKind::Paginate,
            EventKind::PerPageChange,
        ],
    );

    table.start();
    table.sort(1, SortDirection::Desc).unwrap();
    table.paginate(2);
    table.set_per_page(10).unwrap();
    table.start();

    assert_eq!(
        *log.borrow(),
        vec![
            TableEvent::Update,
            TableEvent::Init,
            TableEvent::Update,
            TableEvent::Sort {
                column: 1,
                direction: SortDirection::Desc
            },
            TableEvent::Paginate {
                previous: 1,
                page: 2
            },
            TableEvent::Update,
            TableEvent::PerPageChange {
                previous: 5,
                per_page: 10
            },
            TableEvent::Update,
            TableEvent::Update,
        ]
    );
}

#[test]
fn test_search_event_only_for_active_queries() {
    let mut table = numbered_table(12, TableConfig::default());
    let log = record_events(&mut table, &[EventKind::Search]);
    table.start();

    table.search("Row.4");
    table.search("  ");
    assert_eq!(
        *log.borrow(),
        vec![TableEvent::Search {
            query: "Row.4".to_string()
        }]
    );
}

#[test]
fn test_unsubscribed_listener_is_silent() {
    let mut table = numbered_table(12, TableConfig::default());
    let hits = Rc::new(StdCell::new(0));
    let sink = Rc::clone(&hits);
    let id = table.on(
        EventKind::Update,
        Box::new(move |_: &TableEvent| sink.set(sink.get() + 1)),
    );

    table.start();
    assert!(table.off(id));
    table.refresh();
    assert_eq!(hits.get(), 1);
    assert!(!table.off(id));
}

// ============================================================================
// URL state
// ============================================================================

#[test]
fn test_url_state_round_trip() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();
    table.search("Row");
    table.sort(1, SortDirection::Desc).unwrap();
    table.paginate(2);

    let query = table.url_state().to_query_string();
    assert_eq!(
        query,
        "page=2&search=Row&sortColumn=1&sortDirection=desc&perPage=5"
    );

    let mut restored = numbered_table(12, TableConfig::default());
    let frame = ready(
        restored
            .restore_url_state(&UrlState::from_query_string(&query))
            .unwrap(),
    );
    assert_eq!(frame.current_page, 2);
    assert_eq!(frame.search_query.as_deref(), Some("Row"));
    assert_eq!(frame.rows[0].cells[0].html, "<mark>Row</mark> 7");
}

#[test]
fn test_url_state_restore_emits_events() {
    let mut table = numbered_table(12, TableConfig::default());
    let log = record_events(
        &mut table,
        &[EventKind::Update, EventKind::Sort, EventKind::Search],
    );

    let state = UrlState::from_query_string("search=Row+1&sortColumn=1&sortDirection=desc");
    table.restore_url_state(&state).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            TableEvent::Update,
            TableEvent::Sort {
                column: 1,
                direction: SortDirection::Desc
            },
            TableEvent::Search {
                query: "Row 1".to_string()
            },
        ]
    );

    log.borrow_mut().clear();
    table
        .restore_url_state(&UrlState::from_query_string("search=&page=2"))
        .unwrap();
    assert_eq!(*log.borrow(), vec![TableEvent::Update]);
}

#[test]
fn test_invalid_url_state_changes_nothing() {
    let mut table = numbered_table(12, TableConfig::default());
    table.start();

    let state = UrlState::from_query_string("page=2&sortColumn=9&sortDirection=asc");
    assert!(table.restore_url_state(&state).is_err());
    assert_eq!(table.current_page(), 1);
    assert_eq!(table.sort_column(), None);
}
