//! Delivery of frames and events to JavaScript.
//!
//! Everything here copies what it needs out of the shared state, drops the
//! borrow, and only then calls into JS.

use js_sys::Function;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::{DtView, SharedState};
use crate::controller::Refresh;
use crate::events::{EventKind, TableEvent};
use crate::remote::fetch;
use crate::render::RenderFrame;

impl DtView {
    /// Present a ready frame or start the fetch a pending refresh asks for.
    pub(crate) fn settle(state: &Rc<RefCell<SharedState>>, refresh: Refresh) {
        match refresh {
            Refresh::Ready(frame) => Self::deliver(state, *frame),
            Refresh::Pending(request) => {
                Self::dispatch_events(state);
                let state = Rc::clone(state);
                wasm_bindgen_futures::spawn_local(async move {
                    let result = fetch::fetch_page(&request).await;
                    let refresh = state
                        .borrow_mut()
                        .controller
                        .apply_response(request.seq, result);
                    Self::settle(&state, refresh);
                });
            }
            Refresh::Skipped => Self::dispatch_events(state),
        }
    }

    fn deliver(state: &Rc<RefCell<SharedState>>, mut frame: RenderFrame) {
        let renderers: Vec<(usize, Function)> = state
            .borrow()
            .renderers
            .iter()
            .map(|(column, f)| (*column, f.clone()))
            .collect();
        Self::apply_renderers(&mut frame, &renderers);

        let callback = {
            let mut s = state.borrow_mut();
            s.last_frame = Some(frame.clone());
            s.render_callback.clone()
        };

        Self::dispatch_events(state);

        if let Some(callback) = callback {
            match serde_wasm_bindgen::to_value(&frame) {
                Ok(value) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                        log::warn!("render callback threw: {err:?}");
                    }
                }
                Err(err) => log::warn!("frame serialization failed: {err}"),
            }
        }
    }

    fn apply_renderers(frame: &mut RenderFrame, renderers: &[(usize, Function)]) {
        if renderers.is_empty() {
            return;
        }
        for row in &mut frame.rows {
            let row_id = JsValue::from(row.row_id);
            for (column, renderer) in renderers {
                let Some(cell) = row.cells.get_mut(*column) else {
                    continue;
                };
                let out = renderer.call3(
                    &JsValue::NULL,
                    &JsValue::from_str(&cell.html),
                    &row_id,
                    &JsValue::from(*column),
                );
                match out {
                    Ok(value) => {
                        if let Some(html) = value.as_string() {
                            cell.html = html;
                        }
                    }
                    Err(err) => log::warn!("renderer for column {column} threw: {err:?}"),
                }
            }
        }
    }

    /// Hand buffered controller events to the JS listeners.
    pub(crate) fn dispatch_events(state: &Rc<RefCell<SharedState>>) {
        let (events, listeners): (Vec<TableEvent>, Vec<(EventKind, Function)>) = {
            let mut s = state.borrow_mut();
            let events = s.controller.events_mut().drain();
            let listeners = s
                .listeners
                .iter()
                .map(|l| (l.kind, l.callback.clone()))
                .collect();
            (events, listeners)
        };

        for event in &events {
            let kind = event.kind();
            let payload = match serde_wasm_bindgen::to_value(event) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("event serialization failed: {err}");
                    continue;
                }
            };
            for (_, callback) in listeners.iter().filter(|(k, _)| *k == kind) {
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    log::warn!("{} listener threw: {err:?}", kind.as_str());
                }
            }
        }
    }
}
