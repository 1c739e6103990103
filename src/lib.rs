//! dtview - data table engine for the web
//!
//! Search, sort and pagination for HTML tables, compiled to WebAssembly:
//! - Quote-aware multi-word search, AND (full match) or regex OR (partial)
//! - Numeric-aware column sort with fixed placement of empty cells
//! - Page windows with a truncated, ellipsis-marked pager
//! - Optional server-side paging with stale-response fencing
//!
//! The engine produces [`RenderFrame`]s; turning them into markup is up to
//! the host.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { DtView } from 'dtview';
//! await init();
//! const view = new DtView(table, { perPage: 10, fullMatch: true });
//! view.setRenderCallback(draw);
//! view.start();
//! view.search("red car");
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use dtview::{TableConfig, TableController, TableInput, TableSnapshot};
//!
//! let input: TableInput = serde_json::from_str(
//!     r#"{"header": ["Name", "Qty"], "rows": [["pear", "10"], ["fig", "2"], ["apple", "9"]]}"#,
//! )?;
//! let mut table = TableController::new(TableSnapshot::from_input(&input), TableConfig::default())?;
//! table.start();
//! let frame = table.sort(1, dtview::SortDirection::Asc)?.into_frame();
//! assert_eq!(frame.map(|f| f.rows[0].cells[0].html.clone()).as_deref(), Some("fig"));
//! # Ok::<(), dtview::DtviewError>(())
//! ```

// Table model and algorithms
pub mod config;
pub mod csv;
pub mod error;
pub mod html;
pub mod pager;
pub mod search;
pub mod sort;
pub mod types;

// Orchestration
pub mod controller;
pub mod events;
pub mod format;
pub mod render;
pub mod url_state;

// Remote data
pub mod remote;
pub mod server;

pub mod logging;
#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::{ColumnDefinition, TableConfig};
pub use controller::{Clock, Phase, Refresh, SystemClock, TableController};
pub use error::{DtviewError, Result};
pub use events::{EventKind, TableEvent};
pub use render::{RenderFrame, RenderSurface};
pub use types::*;
#[cfg(target_arch = "wasm32")]
pub use viewer::DtView;

/// Parse a table description and return its snapshot as JSON
///
/// # Errors
/// Returns an error if the description is not valid table JSON.
#[wasm_bindgen]
pub fn parse_table(json: &str) -> std::result::Result<String, JsValue> {
    let input: TableInput =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&TableSnapshot::from_input(&input))
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Answer a reference-service query string over a JSON array of rows
///
/// # Errors
/// Returns an error if the rows are not valid JSON.
#[wasm_bindgen]
pub fn serve_query(rows_json: &str, query: &str) -> std::result::Result<String, JsValue> {
    server::ReferenceService::from_json(rows_json)
        .and_then(|service| service.answer_query_string(query))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
