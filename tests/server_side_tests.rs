//! Server-side tables driven by the in-memory reference service.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::{first_column, numbered_input, record_events};
use dtview::events::{EventKind, TableEvent};
use dtview::remote::{DataService, FetchRequest, FetchResponse};
use dtview::render::FrameLog;
use dtview::server::ReferenceService;
use dtview::{
    DtviewError, Phase, Refresh, SortDirection, TableConfig, TableController, TableSnapshot,
};

fn remote_config() -> TableConfig {
    TableConfig {
        server_side: true,
        ajax: Some("/api/rows".to_string()),
        ..TableConfig::default()
    }
}

fn remote_table(config: TableConfig) -> TableController {
    TableController::new(TableSnapshot::with_header(&["Name", "Value"]), config).unwrap()
}

fn service() -> ReferenceService {
    ReferenceService::from_input(numbered_input(12))
}

fn pending(refresh: &Refresh) -> FetchRequest {
    refresh
        .request()
        .cloned()
        .expect("server-side refreshes wait for a response")
}

fn row_ids(frame: &dtview::RenderFrame) -> Vec<usize> {
    frame.rows.iter().map(|row| row.row_id).collect()
}

#[test]
fn test_first_page_is_fetched() {
    let service = service();
    let mut table = remote_table(remote_config());

    let refresh = table.start();
    let request = pending(&refresh);
    assert_eq!(table.phase(), Phase::Fetching { seq: request.seq });
    assert_eq!(
        request.to_url(),
        "/api/rows?searchQuery=null&sortColumn=null&sortDirection=asc&start=0&length=5&datatable=1"
    );

    let frame = table.resolve(refresh, &service).into_frame().unwrap();
    assert_eq!(table.phase(), Phase::Idle);
    assert_eq!(first_column(&frame).len(), 5);
    assert_eq!(row_ids(&frame), vec![1, 2, 3, 4, 5]);
    assert_eq!(frame.page_count, 3);
    assert_eq!(frame.data_count_total, 12);
    assert_eq!(frame.info, "Showing 1 to 5 of 12 entries");
}

#[test]
fn test_paging_requests_offsets() {
    let service = service();
    let mut table = remote_table(remote_config());
    let first = table.start();
    table.resolve(first, &service);

    let refresh = table.paginate(3);
    let request = pending(&refresh);
    assert_eq!(request.start, 10);
    assert_eq!(request.length, 5);

    let frame = table.resolve(refresh, &service).into_frame().unwrap();
    assert_eq!(first_column(&frame), vec!["Row 11", "Row 12"]);
    assert_eq!(row_ids(&frame), vec![11, 12]);
    assert_eq!(frame.info, "Showing 11 to 12 of 12 entries");
}

#[test]
fn test_search_is_answered_by_the_service() {
    let service = service();
    let mut table = remote_table(remote_config());
    let first = table.start();
    table.resolve(first, &service);

    let refresh = table.search("Row 1");
    assert_eq!(pending(&refresh).search_query.as_deref(), Some("Row 1"));

    let frame = table.resolve(refresh, &service).into_frame().unwrap();
    assert!(frame.is_searching);
    assert_eq!(frame.data_count, 4);
    assert_eq!(frame.data_count_total, 12);
    assert_eq!(
        frame.info,
        "Showing 1 to 4 of 4 entries (filtered from 12 entries)"
    );
}

#[test]
fn test_sort_is_answered_by_the_service() {
    let service = service();
    let mut table = remote_table(remote_config());
    let first = table.start();
    table.resolve(first, &service);

    let refresh = table.sort(1, SortDirection::Desc).unwrap();
    let request = pending(&refresh);
    assert_eq!(request.sort_column, Some(1));
    assert_eq!(request.sort_direction, SortDirection::Desc);

    let frame = table.resolve(refresh, &service).into_frame().unwrap();
    assert_eq!(
        first_column(&frame),
        vec!["Row 12", "Row 11", "Row 10", "Row 9", "Row 8"]
    );
}

#[test]
fn test_stale_responses_are_dropped() {
    let service = service();
    let mut table = remote_table(remote_config());
    let first = table.start();
    table.resolve(first, &service);

    let older = pending(&table.paginate(2));
    let newer = pending(&table.paginate(3));
    assert!(newer.seq > older.seq);

    let late = table.apply_response(older.seq, service.fetch(&older));
    assert_eq!(late, Refresh::Skipped);
    assert_eq!(table.phase(), Phase::Fetching { seq: newer.seq });

    let frame = table
        .apply_response(newer.seq, service.fetch(&newer))
        .into_frame()
        .unwrap();
    assert_eq!(first_column(&frame), vec!["Row 11", "Row 12"]);

    // A duplicate of an applied response is dropped too.
    assert_eq!(
        table.apply_response(newer.seq, service.fetch(&newer)),
        Refresh::Skipped
    );
}

#[test]
fn test_transport_failure_shows_empty_page() {
    let service = service();
    let mut table = remote_table(remote_config());
    let first = table.start();
    table.resolve(first, &service);

    let request = pending(&table.paginate(2));
    let frame = table
        .apply_response(
            request.seq,
            Err(DtviewError::Transport("connection refused".to_string())),
        )
        .into_frame()
        .unwrap();

    assert!(frame.rows.is_empty());
    assert_eq!(frame.message.as_deref(), Some("No entries found"));
    assert_eq!(frame.data_count_total, 12);
    assert_eq!(frame.page_count, 3);
    assert_eq!(table.phase(), Phase::Idle);
}

#[test]
fn test_deferred_first_page() {
    let input = numbered_input(5);
    let config = TableConfig {
        defer_loading: Some(40),
        ..remote_config()
    };
    let mut table = TableController::new(TableSnapshot::from_input(&input), config).unwrap();

    let frame = table.start().into_frame().expect("deferred page is ready");
    assert_eq!(
        first_column(&frame),
        vec!["Row 1", "Row 2", "Row 3", "Row 4", "Row 5"]
    );
    assert_eq!(frame.data_count_total, 40);
    assert_eq!(frame.page_count, 8);
    assert_eq!(frame.info, "Showing 1 to 5 of 40 entries");

    assert_eq!(pending(&table.paginate(2)).start, 5);
}

#[test]
fn test_extra_params_do_not_override_core_ones() {
    let config = TableConfig {
        ajax_params: [
            ("token".to_string(), serde_json::json!("abc")),
            ("start".to_string(), serde_json::json!(99)),
        ]
        .into_iter()
        .collect(),
        ..remote_config()
    };
    let mut table = remote_table(config);
    let request = pending(&table.start());

    let pairs = request.to_query_pairs();
    assert_eq!(pairs[0], ("token".to_string(), "abc".to_string()));
    let starts: Vec<&str> = pairs
        .iter()
        .filter(|(key, _)| key == "start")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(starts, vec!["0"]);
}

#[test]
fn test_remote_event_order() {
    let service = service();
    let mut table = remote_table(remote_config());
    let log = record_events(
        &mut table,
        &[EventKind::Init, EventKind::Update, EventKind::FetchData],
    );

    let first = table.start();
    assert_eq!(*log.borrow(), vec![TableEvent::Init]);

    table.resolve(first, &service);
    assert_eq!(
        *log.borrow(),
        vec![
            TableEvent::Init,
            TableEvent::FetchData {
                records_total: 12,
                records_filtered: 12,
                rows: 5
            },
            TableEvent::Update,
        ]
    );
}

#[test]
fn test_frames_reach_the_surface() {
    let service = service();
    let mut table = remote_table(remote_config());
    let mut surface = FrameLog::default();

    let first = table.start();
    assert!(!first.present(&mut surface));
    assert!(table.resolve(first, &service).present(&mut surface));

    let next = table.paginate(2);
    assert!(table.resolve(next, &service).present(&mut surface));

    assert_eq!(surface.frames.len(), 2);
    assert_eq!(surface.last().unwrap().current_page, 2);
}

#[test]
fn test_service_query_string() {
    let service = service();
    let body = service
        .answer_query_string("searchQuery=null&sortColumn=1&sortDirection=desc&start=0&length=0")
        .unwrap();
    let response = FetchResponse::from_json(&body).unwrap();

    assert_eq!(response.records_total, 12);
    assert_eq!(response.records_filtered, 12);
    assert_eq!(response.data.len(), 10);
    assert_eq!(response.data[0].cells()[0].markup(), "Row 12");
}
