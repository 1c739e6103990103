//! Shared builders for the integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;

use dtview::events::{EventKind, TableEvent};
use dtview::{TableConfig, TableController, TableInput, TableSnapshot};

/// `n` rows of `["Row i", "i"]` under a `Name`/`Value` header.
pub fn numbered_input(n: usize) -> TableInput {
    let rows: Vec<serde_json::Value> = (1..=n)
        .map(|i| serde_json::json!([format!("Row {i}"), i.to_string()]))
        .collect();
    serde_json::from_value(serde_json::json!({
        "header": ["Name", "Value"],
        "rows": rows,
    }))
    .expect("numbered table is valid")
}

pub fn numbered_table(n: usize, config: TableConfig) -> TableController {
    TableController::new(TableSnapshot::from_input(&numbered_input(n)), config)
        .expect("config is valid")
}

pub fn table_from_json(json: &str, config: TableConfig) -> TableController {
    let input: TableInput = serde_json::from_str(json).expect("table json is valid");
    TableController::new(TableSnapshot::from_input(&input), config).expect("config is valid")
}

/// Every event of `kinds`, in emit order.
pub fn record_events(
    table: &mut TableController,
    kinds: &[EventKind],
) -> Rc<RefCell<Vec<TableEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for &kind in kinds {
        let sink = Rc::clone(&log);
        table.on(
            kind,
            Box::new(move |event: &TableEvent| sink.borrow_mut().push(event.clone())),
        );
    }
    log
}

/// First-column markup of every row in the frame.
pub fn first_column(frame: &dtview::RenderFrame) -> Vec<String> {
    frame
        .rows
        .iter()
        .map(|row| row.cells[0].html.clone())
        .collect()
}

/// Plain first-column text of the visible data rows, in table order.
pub fn visible_names(table: &TableController) -> Vec<String> {
    table
        .table()
        .visible_rows()
        .map(|row| row.cell_content(0).to_string())
        .collect()
}
