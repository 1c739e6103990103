//! Tables loaded from delimited text files.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use std::fs;

use common::{first_column, visible_names};
use dtview::csv::Delimiter;
use dtview::{SortDirection, TableConfig, TableController, TableSnapshot};

fn inventory() -> TableController {
    let data = fs::read("tests/fixtures/inventory.csv").expect("fixture is present");
    let snapshot = TableSnapshot::from_delimited(&data, Delimiter::from_path("inventory.csv"))
        .expect("fixture parses");
    TableController::new(snapshot, TableConfig::default()).unwrap()
}

#[test]
fn test_inventory_loads() {
    let mut table = inventory();
    let frame = table.start().into_frame().unwrap();

    assert_eq!(table.table().column_count(), 3);
    assert_eq!(frame.data_count, 6);
    assert_eq!(frame.page_count, 2);
    assert_eq!(frame.header.cells[0].html, "Item");
    assert_eq!(frame.rows[0].cells[0].html, "Widget, large");
}

#[test]
fn test_inventory_price_sort() {
    let mut table = inventory();
    table.start();

    let frame = table
        .sort(1, SortDirection::Asc)
        .unwrap()
        .into_frame()
        .unwrap();
    assert_eq!(
        first_column(&frame),
        vec!["Gizmo", "Sprocket", "Doohickey", "Thingamajig", "Gadget"]
    );

    let frame = table.paginate(2).into_frame().unwrap();
    assert_eq!(first_column(&frame), vec!["Widget, large"]);
}

#[test]
fn test_inventory_full_match_search() {
    let mut table = inventory();
    table.start();
    let frame = table.set_full_match(true);
    assert!(frame.frame().is_none());

    let frame = table.search("widget LARGE").into_frame().unwrap();
    assert_eq!(visible_names(&table), vec!["Widget, large"]);
    assert_eq!(
        frame.rows[0].cells[0].html,
        "<mark>Widget</mark>, <mark>large</mark>"
    );
}

#[test]
fn test_tsv_markup_is_escaped() {
    let data = b"Tag\tUse\n<b>\tbold\n";
    let snapshot = TableSnapshot::from_delimited(data, Delimiter::Tab).unwrap();
    let mut table = TableController::new(snapshot, TableConfig::default()).unwrap();

    let frame = table.start().into_frame().unwrap();
    assert_eq!(frame.rows[0].cells[0].html, "&lt;b&gt;");

    let frame = table.search("bold").into_frame().unwrap();
    assert_eq!(frame.data_count, 1);
}
