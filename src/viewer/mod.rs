//! The WASM-exported `DtView` - the browser entry point.
//!
//! `DtView` wraps a [`TableController`] and a set of JS callbacks:
//! - a render callback that receives every frame
//! - event listeners registered by name (`init`, `update`, `search`, ...)
//! - per-column renderers applied to body cells
//!
//! Server-side tables fetch through the browser `fetch` API. JS callbacks are
//! only ever invoked after the controller borrow is released, so they may call
//! back into the view.
//!
//! ```javascript
//! import init, { DtView } from 'dtview';
//! await init();
//! const view = new DtView({ header: ["Name", "Age"], rows }, { perPage: 10 });
//! view.setRenderCallback((frame) => draw(frame));
//! view.on("sort", (e) => console.log(e.column, e.direction));
//! view.start();
//! ```

mod events;

use js_sys::Function;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::config::TableConfig;
use crate::controller::TableController;
use crate::error::DtviewError;
use crate::events::{EventKind, ListenerId};
use crate::logging;
use crate::render::RenderFrame;
use crate::types::{SortDirection, TableInput, TableSnapshot};
use crate::url_state::UrlState;

/// A JS function subscribed to one event kind.
pub(crate) struct JsListener {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventKind,
    pub(crate) callback: Function,
}

pub(crate) struct SharedState {
    pub(crate) controller: TableController,
    pub(crate) render_callback: Option<Function>,
    pub(crate) listeners: Vec<JsListener>,
    /// JS renderers by column: `(html, rowId, column) => html`
    pub(crate) renderers: BTreeMap<usize, Function>,
    pub(crate) last_frame: Option<RenderFrame>,
}

/// The table view exported to JavaScript
#[wasm_bindgen]
pub struct DtView {
    state: Rc<RefCell<SharedState>>,
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl DtView {
    /// Create a view from a table description and an optional config object.
    ///
    /// Nothing is rendered until `start()`, so listeners registered in
    /// between see the `init` event.
    #[wasm_bindgen(constructor)]
    pub fn new(table: JsValue, config: JsValue) -> Result<DtView, JsValue> {
        logging::init(log::LevelFilter::Info);

        let input: TableInput = serde_wasm_bindgen::from_value(table).map_err(js_error)?;
        let config: TableConfig = if config.is_undefined() || config.is_null() {
            TableConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };

        let mut controller = TableController::new(TableSnapshot::from_input(&input), config)?;
        controller.events_mut().set_buffering(true);

        Ok(DtView {
            state: Rc::new(RefCell::new(SharedState {
                controller,
                render_callback: None,
                listeners: Vec::new(),
                renderers: BTreeMap::new(),
                last_frame: None,
            })),
        })
    }

    /// Produce the first frame (fetching it for server-side tables).
    pub fn start(&self) {
        let refresh = self.state.borrow_mut().controller.start();
        Self::settle(&self.state, refresh);
    }

    pub fn search(&self, query: &str) {
        let refresh = self.state.borrow_mut().controller.search(query);
        Self::settle(&self.state, refresh);
    }

    /// Sort by `column`; `direction` is `"asc"`, `"desc"` or `""`.
    pub fn sort(&self, column: usize, direction: &str) -> Result<(), JsValue> {
        let direction = SortDirection::parse(direction).ok_or_else(|| {
            DtviewError::Config(format!("unknown sort direction {direction:?}"))
        })?;
        let refresh = self.state.borrow_mut().controller.sort(column, direction)?;
        Self::settle(&self.state, refresh);
        Ok(())
    }

    /// Header activation: cycle the column through asc, desc, natural.
    #[wasm_bindgen(js_name = "sortNext")]
    pub fn sort_next(&self, column: usize) -> Result<(), JsValue> {
        let refresh = self.state.borrow_mut().controller.sort_next(column)?;
        Self::settle(&self.state, refresh);
        Ok(())
    }

    pub fn paginate(&self, page: usize) {
        let refresh = self.state.borrow_mut().controller.paginate(page);
        Self::settle(&self.state, refresh);
    }

    #[wasm_bindgen(js_name = "setPerPage")]
    pub fn set_per_page(&self, per_page: usize) -> Result<(), JsValue> {
        let refresh = self.state.borrow_mut().controller.set_per_page(per_page)?;
        Self::settle(&self.state, refresh);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setFullMatch")]
    pub fn set_full_match(&self, full_match: bool) {
        let refresh = self.state.borrow_mut().controller.set_full_match(full_match);
        Self::settle(&self.state, refresh);
    }

    pub fn refresh(&self) {
        let refresh = self.state.borrow_mut().controller.refresh();
        Self::settle(&self.state, refresh);
    }

    /// Subscribe `callback` to the event `name`; returns the listener id.
    pub fn on(&self, name: &str, callback: Function) -> Result<u32, JsValue> {
        let kind = EventKind::parse(name)
            .ok_or_else(|| DtviewError::Config(format!("unknown event {name:?}")))?;
        let mut s = self.state.borrow_mut();
        let id = s.controller.events_mut().allocate_id();
        s.listeners.push(JsListener { id, kind, callback });
        Ok(id.0)
    }

    pub fn off(&self, id: u32) -> bool {
        let mut s = self.state.borrow_mut();
        let before = s.listeners.len();
        s.listeners.retain(|listener| listener.id != ListenerId(id));
        s.listeners.len() != before
    }

    /// Set (or with `undefined`, clear) the renderer of `column`.
    #[wasm_bindgen(js_name = "setColumnRenderer")]
    pub fn set_column_renderer(
        &self,
        column: usize,
        renderer: Option<Function>,
    ) -> Result<(), JsValue> {
        let mut s = self.state.borrow_mut();
        let columns = s.controller.table().column_count();
        if column >= columns {
            return Err(DtviewError::ColumnOutOfRange { column, columns }.into());
        }
        match renderer {
            Some(renderer) => {
                s.renderers.insert(column, renderer);
            }
            None => {
                s.renderers.remove(&column);
            }
        }
        Ok(())
    }

    /// Register the function that receives every frame.
    #[wasm_bindgen(js_name = "setRenderCallback")]
    pub fn set_render_callback(&self, callback: Option<Function>) {
        self.state.borrow_mut().render_callback = callback;
    }

    #[wasm_bindgen(js_name = "pageCount")]
    pub fn page_count(&self) -> usize {
        self.state.borrow().controller.page_count()
    }

    #[wasm_bindgen(js_name = "currentPage")]
    pub fn current_page(&self) -> usize {
        self.state.borrow().controller.current_page()
    }

    #[wasm_bindgen(js_name = "isSortable")]
    pub fn is_sortable(&self, column: usize) -> bool {
        self.state.borrow().controller.is_sortable(column)
    }

    #[wasm_bindgen(js_name = "dataCount")]
    pub fn data_count(&self) -> usize {
        self.state.borrow().controller.data_count()
    }

    /// The last presented frame, or `undefined`.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        match &self.state.borrow().last_frame {
            Some(frame) => serde_wasm_bindgen::to_value(frame).map_err(js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Current state as a query string for the page URL.
    #[wasm_bindgen(js_name = "urlState")]
    pub fn url_state(&self) -> String {
        self.state.borrow().controller.url_state().to_query_string()
    }

    /// Restore state from a query string such as `location.search`.
    #[wasm_bindgen(js_name = "restoreUrlState")]
    pub fn restore_url_state(&self, query: &str) -> Result<(), JsValue> {
        let state = UrlState::from_query_string(query);
        let refresh = self
            .state
            .borrow_mut()
            .controller
            .restore_url_state(&state)?;
        Self::settle(&self.state, refresh);
        Ok(())
    }
}
