//! Table controller.
//!
//! Owns the page/sort/search state and the order and visibility of the data
//! rows, and turns every state change into a [`Refresh`]:
//!
//! - local tables resolve the row window immediately (`Ready`)
//! - server-side tables return the request to send (`Pending`); the host
//!   fetches it and passes the outcome to [`TableController::apply_response`]
//!
//! A refresh moves through `Idle -> Fetching -> Applying -> Idle`; local
//! tables skip `Fetching`. Each request carries a sequence number and only
//! the response to the latest one is applied.

use std::collections::BTreeSet;

use crate::config::TableConfig;
use crate::error::{DtviewError, Result};
use crate::events::{EventKind, EventRegistry, Listener, ListenerId, TableEvent};
use crate::format::{CellFormatter, ColumnRenderers, FormattedRow, Highlighter};
use crate::pager::{self, Pager};
use crate::remote::{param_value, DataService, FetchRequest, FetchResponse, RequestSequencer};
use crate::render::{RenderFrame, RenderSurface};
use crate::search::{self, SearchGate, SearchMode};
use crate::sort::{self, check_column};
use crate::types::{Row, RowSection, SortDirection, TableSnapshot};
use crate::url_state::UrlState;

/// Millisecond time source for search throttling.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }
}

/// Where the current refresh stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Waiting for the response to request `seq`.
    Fetching { seq: u64 },
    /// Building the frame.
    Applying,
}

/// Outcome of a state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// The frame to present.
    Ready(Box<RenderFrame>),
    /// Send this request and hand its outcome to `apply_response`.
    Pending(FetchRequest),
    /// Nothing to present (dropped search, stale response, no-op).
    Skipped,
}

impl Refresh {
    pub fn frame(&self) -> Option<&RenderFrame> {
        match self {
            Self::Ready(frame) => Some(frame),
            Self::Pending(_) | Self::Skipped => None,
        }
    }

    pub fn into_frame(self) -> Option<RenderFrame> {
        match self {
            Self::Ready(frame) => Some(*frame),
            Self::Pending(_) | Self::Skipped => None,
        }
    }

    pub fn request(&self) -> Option<&FetchRequest> {
        match self {
            Self::Pending(request) => Some(request),
            Self::Ready(_) | Self::Skipped => None,
        }
    }

    /// Present a ready frame; returns whether one was presented.
    pub fn present(&self, surface: &mut dyn RenderSurface) -> bool {
        match self.frame() {
            Some(frame) => {
                surface.present(frame);
                true
            }
            None => false,
        }
    }
}

pub struct TableController {
    config: TableConfig,
    table: TableSnapshot,
    pager: Pager,
    renderers: ColumnRenderers,
    events: EventRegistry,
    gate: SearchGate,
    clock: Box<dyn Clock>,
    sequencer: RequestSequencer,
    phase: Phase,
    started: bool,

    current_page: usize,
    per_page: usize,
    sort_column: Option<usize>,
    sort_direction: SortDirection,
    search_query: Option<String>,
    is_searching: bool,
    columns_not_searchable: BTreeSet<usize>,

    // Server side
    filtered_data_count: Option<usize>,
    total_data_count: Option<usize>,
    /// Rows of the last remote page; `None` until the first response, when
    /// the snapshot rows stand for the server-rendered page
    remote_rows: Option<Vec<Row>>,
}

impl std::fmt::Debug for TableController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableController")
            .field("columns", &self.table.column_count())
            .field("rows", &self.table.data_rows().len())
            .field("phase", &self.phase)
            .field("current_page", &self.current_page)
            .field("per_page", &self.per_page)
            .field("sort_column", &self.sort_column)
            .field("sort_direction", &self.sort_direction)
            .field("search_query", &self.search_query)
            .field("server_side", &self.config.server_side)
            .finish_non_exhaustive()
    }
}

impl TableController {
    pub fn new(table: TableSnapshot, config: TableConfig) -> Result<Self> {
        Self::with_clock(table, config, Box::new(SystemClock))
    }

    pub fn with_clock(
        table: TableSnapshot,
        config: TableConfig,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let columns = table.column_count();
        let mut controller = Self {
            pager: Pager::from(&config),
            renderers: ColumnRenderers::new(columns),
            events: EventRegistry::new(),
            gate: SearchGate::new(config.search_delay, config.search_dedupe),
            clock,
            sequencer: RequestSequencer::default(),
            phase: Phase::Idle,
            started: false,
            current_page: 1,
            per_page: config.per_page,
            sort_column: None,
            sort_direction: SortDirection::Asc,
            search_query: None,
            is_searching: false,
            columns_not_searchable: BTreeSet::new(),
            filtered_data_count: None,
            total_data_count: config.defer_loading,
            remote_rows: None,
            table,
            config,
        };

        if let Some((column, direction)) = controller.build_columns() {
            // No refresh yet; `start` produces the first frame.
            controller.apply_sort(column, direction);
        }
        Ok(controller)
    }

    /// Resolve column definitions against the header and return the initial
    /// sort, if any.
    fn build_columns(&mut self) -> Option<(usize, SortDirection)> {
        let columns = self.table.column_count();
        let definitions = self.config.columns.clone();

        for definition in &definitions {
            for &column in &definition.select {
                let Some(cell) = self.table.header_mut().cell_mut(column) else {
                    log::debug!(
                        "column definition targets column {column}, table has {columns}; skipped"
                    );
                    continue;
                };
                if let Some(sortable) = definition.sortable {
                    if !cell.has_declared_sortable() {
                        cell.set_sortable(sortable);
                    }
                }
                if let Some(searchable) = definition.searchable {
                    cell.add_attribute("data-searchable", &searchable.to_string());
                    if !searchable {
                        self.columns_not_searchable.insert(column);
                    }
                }
            }
        }

        let global = self.config.sortable;
        let sorter = self.config.classes.sorter.clone();
        let mut from_header = None;
        for (column, cell) in self.table.header_mut().cells.iter_mut().enumerate() {
            if !*cell.is_sortable.get_or_insert(global) {
                continue;
            }
            if !cell.has_class(&sorter) {
                cell.add_class(&sorter);
            }
            if let Some(direction) = cell.sort_direction {
                from_header = Some((column, direction));
            }
        }

        let from_definitions = definitions
            .iter()
            .filter_map(|definition| match (definition.select.as_slice(), definition.sort) {
                ([column], Some(direction)) if self.is_sortable(*column) => {
                    Some((*column, direction))
                }
                _ => None,
            })
            .last();

        from_header.or(from_definitions)
    }

    /// First frame. Server-side tables with `deferLoading` present the rows
    /// they were built with; other server-side tables fetch.
    pub fn start(&mut self) -> Refresh {
        let refresh = if self.config.server_side && self.config.defer_loading.is_some() {
            self.phase = Phase::Applying;
            let frame = self.build_frame();
            self.finish(frame)
        } else {
            self.refresh()
        };
        if !self.started {
            self.started = true;
            self.events.emit(TableEvent::Init);
        }
        refresh
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Filter rows by `query`. Calls dropped by the search delay or dedupe
    /// return `Skipped`.
    pub fn search(&mut self, query: &str) -> Refresh {
        let now = self.clock.now_ms();
        if !self.gate.admit(query, self.search_query.as_deref(), now) {
            log::debug!("search for {query:?} dropped");
            return Refresh::Skipped;
        }
        self.run_search(query)
    }

    fn run_search(&mut self, query: &str) -> Refresh {
        let active = self.apply_query(query);
        let refresh = self.refresh();
        if active {
            self.events.emit(TableEvent::Search {
                query: query.to_string(),
            });
        }
        refresh
    }

    /// Record `query` and recompute visibility; returns whether a search is
    /// now active.
    fn apply_query(&mut self, query: &str) -> bool {
        self.search_query = Some(query.to_string());
        self.current_page = 1;
        self.is_searching = !query.trim().is_empty();

        if !self.config.server_side || !self.is_searching {
            search::apply_search(
                self.table.data_rows_mut(),
                query,
                SearchMode::from_full_match(self.config.full_match),
                &self.columns_not_searchable,
            );
        }
        self.is_searching
    }

    /// Switch between full and partial matching and rerun the current query.
    pub fn set_full_match(&mut self, full_match: bool) -> Refresh {
        self.config.full_match = full_match;
        match self.search_query.clone() {
            Some(query) if !query.trim().is_empty() => self.run_search(&query),
            _ => Refresh::Skipped,
        }
    }

    // ------------------------------------------------------------------
    // Sort
    // ------------------------------------------------------------------

    /// Order rows by `column`. An out-of-range column is rejected and leaves
    /// the state untouched.
    pub fn sort(&mut self, column: usize, direction: SortDirection) -> Result<Refresh> {
        check_column(column, self.table.column_count())?;
        self.apply_sort(column, direction);
        let refresh = self.refresh();
        self.events.emit(TableEvent::Sort { column, direction });
        Ok(refresh)
    }

    /// Header activation: advance `column` through asc, desc, natural.
    /// Non-sortable columns are ignored.
    pub fn sort_next(&mut self, column: usize) -> Result<Refresh> {
        check_column(column, self.table.column_count())?;
        if !self.is_sortable(column) {
            return Ok(Refresh::Skipped);
        }
        let current = (self.sort_column == Some(column)).then_some(self.sort_direction);
        self.sort(column, SortDirection::cycle(current))
    }

    fn apply_sort(&mut self, column: usize, direction: SortDirection) {
        self.sort_column = Some(column);
        self.sort_direction = direction;

        let header = self.table.header_mut();
        for cell in &mut header.cells {
            cell.remove_class(SortDirection::Asc.as_str());
            cell.remove_class(SortDirection::Desc.as_str());
        }
        if direction != SortDirection::Natural {
            if let Some(cell) = header.cell_mut(column) {
                cell.add_class(direction.as_str());
            }
        }

        if direction == SortDirection::Natural || !self.config.server_side {
            sort::sort_rows(
                self.table.data_rows_mut(),
                column,
                direction,
                self.config.empty_placement,
            );
        }
    }

    pub fn is_sortable(&self, column: usize) -> bool {
        self.table
            .header()
            .cell(column)
            .is_some_and(|cell| cell.is_sortable.unwrap_or(self.config.sortable))
    }

    // ------------------------------------------------------------------
    // Paging
    // ------------------------------------------------------------------

    /// Go to `page`, clamped to `[1, page_count]`.
    pub fn paginate(&mut self, page: usize) -> Refresh {
        let previous = self.current_page;
        self.current_page = page.clamp(1, self.page_count());
        self.events.emit(TableEvent::Paginate {
            previous,
            page: self.current_page,
        });
        self.refresh()
    }

    /// Change the page size; the current page is kept when it still exists.
    pub fn set_per_page(&mut self, per_page: usize) -> Result<Refresh> {
        if per_page == 0 {
            return Err(DtviewError::InvalidPerPage(per_page));
        }
        let previous = self.per_page;
        self.events.emit(TableEvent::PerPageChange { previous, per_page });
        self.per_page = per_page;
        Ok(self.refresh())
    }

    pub fn page_count(&self) -> usize {
        pager::page_count(self.data_count(), self.per_page)
    }

    pub fn is_valid_page(&self, page: usize) -> bool {
        pager::is_valid_page(page, self.page_count())
    }

    fn page_start(&self) -> usize {
        self.current_page.saturating_sub(1).saturating_mul(self.per_page)
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Resolve the current row window.
    pub fn refresh(&mut self) -> Refresh {
        self.current_page = self.current_page.clamp(1, self.page_count());

        if self.config.server_side {
            let seq = self.sequencer.next();
            self.phase = Phase::Fetching { seq };
            return Refresh::Pending(self.fetch_request(seq));
        }

        self.phase = Phase::Applying;
        self.events.emit(TableEvent::GetData {
            rows: self.table.data_rows().len(),
        });
        let frame = self.build_frame();
        self.finish(frame)
    }

    /// Apply the outcome of request `seq`. Anything but the latest
    /// outstanding request is dropped. A failed request shows an empty page
    /// and keeps the last known counts.
    pub fn apply_response(&mut self, seq: u64, result: Result<FetchResponse>) -> Refresh {
        if !self.sequencer.is_current(seq) || self.phase != (Phase::Fetching { seq }) {
            log::debug!(
                "dropping response {seq}; latest request is {}",
                self.sequencer.latest()
            );
            return Refresh::Skipped;
        }
        self.phase = Phase::Applying;

        match result {
            Ok(response) => {
                self.events.emit(TableEvent::FetchData {
                    records_total: response.records_total,
                    records_filtered: response.records_filtered,
                    rows: response.data.len(),
                });
                self.filtered_data_count = Some(response.records_filtered);
                self.total_data_count = Some(response.records_total);
                let start = self.page_start();
                self.remote_rows = Some(
                    response
                        .data
                        .iter()
                        .enumerate()
                        .map(|(idx, data)| Row::from_data(data, start + idx + 1, RowSection::Body))
                        .collect(),
                );
            }
            Err(err) => {
                log::warn!("remote page request {seq} failed: {err}");
                self.remote_rows = Some(Vec::new());
            }
        }

        let frame = self.build_frame();
        self.finish(frame)
    }

    /// Complete a pending refresh with a synchronous service.
    pub fn resolve(&mut self, refresh: Refresh, service: &dyn DataService) -> Refresh {
        match refresh {
            Refresh::Pending(request) => {
                let result = service.fetch(&request);
                self.apply_response(request.seq, result)
            }
            ready_or_skipped => ready_or_skipped,
        }
    }

    fn finish(&mut self, frame: RenderFrame) -> Refresh {
        self.phase = Phase::Idle;
        self.events.emit(TableEvent::Update);
        Refresh::Ready(Box::new(frame))
    }

    fn fetch_request(&self, seq: u64) -> FetchRequest {
        FetchRequest {
            seq,
            ajax: self.config.ajax.clone(),
            search_query: self.search_query.clone(),
            sort_column: self.sort_column,
            sort_direction: self.sort_direction,
            start: self.page_start(),
            length: self.per_page,
            params: self
                .config
                .ajax_params
                .iter()
                .map(|(key, value)| (key.clone(), param_value(value)))
                .collect(),
        }
    }

    /// Rows of the current page in display order.
    pub fn page_rows(&self) -> Vec<&Row> {
        if self.config.server_side {
            return match &self.remote_rows {
                Some(rows) => rows.iter().collect(),
                None => self.table.visible_rows().collect(),
            };
        }
        let (start, end) =
            pager::page_bounds(self.current_page, self.per_page, self.table.visible_count());
        self.table
            .visible_rows()
            .skip(start)
            .take(end - start)
            .collect()
    }

    fn build_frame(&self) -> RenderFrame {
        let highlighter = match self.search_query.as_deref() {
            Some(query) if self.config.highlight && self.is_searching => {
                Highlighter::new(
                    &search::tokenize(query),
                    SearchMode::from_full_match(self.config.full_match),
                )
            }
            _ => None,
        };
        let rows: Vec<FormattedRow> = self
            .page_rows()
            .into_iter()
            .map(|row| FormattedRow::body(row, &self.renderers, highlighter.as_ref()))
            .collect();
        let page_count = self.page_count();

        RenderFrame {
            header: FormattedRow::plain(self.table.header()),
            message: rows
                .is_empty()
                .then(|| self.config.labels.no_rows.clone()),
            rows,
            footer: self.table.footer().map(FormattedRow::plain),
            pages: self.pager.render(self.current_page, page_count),
            info: self.info(),
            current_page: self.current_page,
            page_count,
            per_page: self.per_page,
            per_page_select: self.config.per_page_select.clone(),
            searchable: self.config.searchable,
            sort_column: self.sort_column,
            sort_direction: self.sort_direction,
            search_query: self.search_query.clone().filter(|q| !q.is_empty()),
            is_searching: self.is_searching,
            data_count: self.data_count(),
            data_count_total: self.data_count_total(),
        }
    }

    /// The info line with its placeholders filled in.
    pub fn info(&self) -> String {
        let labels = &self.config.labels;
        let template = if self.is_searching {
            &labels.info_filtered
        } else {
            &labels.info
        };
        let count = self.data_count();
        let (start, end) = pager::page_bounds(self.current_page, self.per_page, count);
        let first = if count > 0 { start + 1 } else { 0 };

        template
            .replace("{start}", &first.to_string())
            .replace("{end}", &end.to_string())
            .replace("{page}", &self.current_page.to_string())
            .replace("{pages}", &self.page_count().to_string())
            .replace("{rows}", &count.to_string())
            .replace("{rowsTotal}", &self.data_count_total().to_string())
    }

    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    /// Rows the pager works with: filtered while searching, else all.
    pub fn data_count(&self) -> usize {
        if self.is_searching {
            self.data_count_filtered()
        } else {
            self.data_count_total()
        }
    }

    pub fn data_count_filtered(&self) -> usize {
        if self.config.server_side {
            self.filtered_data_count.unwrap_or(0)
        } else {
            self.table.visible_count()
        }
    }

    pub fn data_count_total(&self) -> usize {
        if self.config.server_side {
            self.total_data_count.unwrap_or(0)
        } else {
            self.table.data_rows().len()
        }
    }

    // ------------------------------------------------------------------
    // URL state
    // ------------------------------------------------------------------

    pub fn url_state(&self) -> UrlState {
        UrlState {
            page: Some(self.current_page),
            search: self.search_query.clone().filter(|q| !q.trim().is_empty()),
            sort_column: self.sort_column,
            sort_direction: self.sort_column.map(|_| self.sort_direction),
            per_page: Some(self.per_page),
        }
    }

    /// Restore exported state. Invalid values are rejected before anything
    /// changes. A restored sort or active search emits its event after the
    /// refresh, as `sort` and `search` do.
    pub fn restore_url_state(&mut self, state: &UrlState) -> Result<Refresh> {
        if let Some(column) = state.sort_column {
            check_column(column, self.table.column_count())?;
        }
        if state.per_page == Some(0) {
            return Err(DtviewError::InvalidPerPage(0));
        }

        if let Some(per_page) = state.per_page {
            self.per_page = per_page;
        }
        let sorted = state.sort_column.map(|column| {
            let direction = state.sort_direction.unwrap_or_default();
            self.apply_sort(column, direction);
            (column, direction)
        });
        let searched = match &state.search {
            Some(query) if self.apply_query(query) => Some(query.clone()),
            _ => None,
        };
        if let Some(page) = state.page {
            self.current_page = page.max(1);
        }

        let refresh = self.refresh();
        if let Some((column, direction)) = sorted {
            self.events.emit(TableEvent::Sort { column, direction });
        }
        if let Some(query) = searched {
            self.events.emit(TableEvent::Search { query });
        }
        Ok(refresh)
    }

    // ------------------------------------------------------------------
    // Renderers and listeners
    // ------------------------------------------------------------------

    pub fn set_column_renderer(
        &mut self,
        column: usize,
        formatter: Box<dyn CellFormatter>,
    ) -> Result<()> {
        self.renderers.set(column, formatter)
    }

    pub fn clear_column_renderer(&mut self, column: usize) -> bool {
        self.renderers.clear(column)
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    pub fn events_mut(&mut self) -> &mut EventRegistry {
        &mut self.events
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn table(&self) -> &TableSnapshot {
        &self.table
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn sort_column(&self) -> Option<usize> {
        self.sort_column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn columns_not_searchable(&self) -> &BTreeSet<usize> {
        &self.columns_not_searchable
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
    use crate::server::ReferenceService;
    use crate::types::TableInput;
    use std::cell::{Cell as StdCell, RefCell};
    use std::rc::Rc;

    /// Manually advanced clock.
    #[derive(Clone, Default)]
    struct ManualClock(Rc<StdCell<f64>>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> f64 {
            self.0.get()
        }
    }

    fn numbered(rows: usize) -> TableSnapshot {
        let body: Vec<String> = (1..=rows)
            .map(|n| format!(r#"["Row {n}", "{}"]"#, n * 10))
            .collect();
        let json = format!(r#"{{"header": ["Name", "Value"], "rows": [{}]}}"#, body.join(","));
        TableSnapshot::from_input(&serde_json::from_str::<TableInput>(&json).unwrap())
    }

    fn controller(rows: usize) -> TableController {
        TableController::new(numbered(rows), TableConfig::default()).unwrap()
    }

    fn names(frame: &RenderFrame) -> Vec<String> {
        frame.rows.iter().map(|r| r.cells[0].html.clone()).collect()
    }

    #[test]
    fn test_twelve_rows_three_pages() {
        let mut c = controller(12);
        let frame = c.start().into_frame().unwrap();
        assert_eq!(c.page_count(), 3);
        assert_eq!(frame.rows.len(), 5);
        assert_eq!(frame.info, "Showing 1 to 5 of 12 entries");

        let frame = c.paginate(4).into_frame().unwrap();
        assert_eq!(c.current_page(), 3);
        assert_eq!(names(&frame), vec!["Row 11", "Row 12"]);
        assert_eq!(frame.info, "Showing 11 to 12 of 12 entries");
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_paginate_zero_goes_to_first_page() {
        let mut c = controller(12);
        c.paginate(0);
        assert_eq!(c.current_page(), 1);
    }

    #[test]
    fn test_empty_table_has_one_empty_page() {
        let mut c = controller(0);
        let frame = c.start().into_frame().unwrap();
        assert_eq!(frame.page_count, 1);
        assert!(frame.pages.is_empty());
        assert_eq!(frame.message.as_deref(), Some("No entries found"));
        assert_eq!(frame.info, "Showing 0 to 0 of 0 entries");
    }

    #[test]
    fn test_search_resets_page_and_filters() {
        let mut c = controller(12);
        c.paginate(3);
        let frame = c.search("Row 1").into_frame().unwrap();
        // "Row" or "1": every row matches the alternation.
        assert_eq!(c.current_page(), 1);
        assert_eq!(frame.data_count, 12);

        let frame = c.search("'Row 1'").into_frame().unwrap();
        assert_eq!(frame.data_count, 4); // 1, 10, 11, 12
        assert_eq!(
            frame.info,
            "Showing 1 to 4 of 4 entries (filtered from 12 entries)"
        );
        assert!(frame.is_searching);
        assert!(frame.rows[0].cells[0].html.contains("<mark>Row 1</mark>"));

        let frame = c.search("").into_frame().unwrap();
        assert!(!frame.is_searching);
        assert_eq!(frame.data_count, 12);
        assert_eq!(frame.search_query, None);
    }

    #[test]
    fn test_set_full_match_reruns_query() {
        let mut c = controller(12);
        c.search("row 999");
        assert_eq!(c.data_count(), 12);
        let frame = c.set_full_match(true).into_frame().unwrap();
        assert_eq!(frame.data_count, 0);
        assert!(frame.message.is_some());
        assert_eq!(c.set_full_match(false).into_frame().unwrap().data_count, 12);
    }

    #[test]
    fn test_set_full_match_without_query_is_skipped() {
        let mut c = controller(3);
        assert_eq!(c.set_full_match(true), Refresh::Skipped);
        assert!(c.config().full_match);
    }

    #[test]
    fn test_sort_cycle_and_natural_order() {
        let mut c = controller(3);
        let frame = c.sort_next(1).unwrap().into_frame().unwrap();
        assert_eq!(frame.sort_direction, SortDirection::Asc);
        assert_eq!(names(&frame), vec!["Row 1", "Row 2", "Row 3"]);

        let frame = c.sort_next(1).unwrap().into_frame().unwrap();
        assert_eq!(frame.sort_direction, SortDirection::Desc);
        assert_eq!(names(&frame), vec!["Row 3", "Row 2", "Row 1"]);
        assert!(frame.header.cells[1].classes.contains(&"desc".to_string()));

        let frame = c.sort_next(1).unwrap().into_frame().unwrap();
        assert_eq!(frame.sort_direction, SortDirection::Natural);
        let ids: Vec<usize> = c.table().data_rows().iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!frame.header.cells[1].classes.contains(&"desc".to_string()));
    }

    #[test]
    fn test_sort_out_of_range_leaves_state() {
        let mut c = controller(3);
        c.sort(0, SortDirection::Desc).unwrap();
        assert!(c.sort(2, SortDirection::Asc).is_err());
        assert_eq!(c.sort_column(), Some(0));
        assert_eq!(c.sort_direction(), SortDirection::Desc);
    }

    #[test]
    fn test_per_page_change_clamps_page() {
        let mut c = controller(12);
        c.paginate(3);
        let frame = c.set_per_page(10).unwrap().into_frame().unwrap();
        assert_eq!(frame.current_page, 2);
        assert_eq!(frame.rows.len(), 2);
        assert!(matches!(
            c.set_per_page(0),
            Err(DtviewError::InvalidPerPage(0))
        ));
        assert_eq!(c.per_page(), 10);
    }

    #[test]
    fn test_column_definitions() {
        let config = TableConfig::from_json(
            r#"{"columns": [
                {"select": 0, "sortable": false},
                {"select": 1, "searchable": false, "sort": "desc"},
                {"select": 9, "sortable": false}
            ]}"#,
        )
        .unwrap();
        let mut c = TableController::new(numbered(3), config).unwrap();
        assert!(!c.is_sortable(0));
        assert!(c.is_sortable(1));
        assert!(c.columns_not_searchable().contains(&1));
        assert_eq!(c.sort_column(), Some(1));
        assert_eq!(c.sort_direction(), SortDirection::Desc);

        let frame = c.start().into_frame().unwrap();
        assert_eq!(names(&frame), vec!["Row 3", "Row 2", "Row 1"]);
        assert_eq!(frame.header.cells[0].attributes["data-sortable"], "false");
        assert!(frame.header.cells[1].classes.contains(&"dt-sorter".to_string()));
        assert_eq!(c.sort_next(0).unwrap(), Refresh::Skipped);

        // Column 1 is not searchable: "30" no longer matches anything.
        assert_eq!(c.search("30").into_frame().unwrap().data_count, 0);
    }

    #[test]
    fn test_header_data_sort_wins_over_definitions() {
        let input: TableInput = serde_json::from_str(
            r#"{"header": [{"data": "Name", "attributes": {"data-sort": "asc"}}, "Value"],
                "rows": [["b", "1"], ["a", "2"]]}"#,
        )
        .unwrap();
        let config =
            TableConfig::from_json(r#"{"columns": [{"select": 1, "sort": "desc"}]}"#).unwrap();
        let c = TableController::new(TableSnapshot::from_input(&input), config).unwrap();
        assert_eq!(c.sort_column(), Some(0));
        assert_eq!(c.table().data_rows()[0].cell_content(0), "a");
    }

    #[test]
    fn test_search_delay_drops_calls() {
        let clock = ManualClock::default();
        let config = TableConfig {
            search_delay: 300,
            ..TableConfig::default()
        };
        let mut c =
            TableController::with_clock(numbered(12), config, Box::new(clock.clone())).unwrap();
        clock.0.set(1000.0);
        assert!(c.search("Row 1").frame().is_some());
        clock.0.set(1100.0);
        assert_eq!(c.search("Row 2"), Refresh::Skipped);
        assert_eq!(c.search_query(), Some("Row 1"));
        clock.0.set(1400.0);
        assert!(c.search("Row 2").frame().is_some());
    }

    #[test]
    fn test_search_dedupe() {
        let config = TableConfig {
            search_dedupe: true,
            ..TableConfig::default()
        };
        let mut c = TableController::new(numbered(3), config).unwrap();
        assert!(c.search("Row").frame().is_some());
        assert_eq!(c.search("Row"), Refresh::Skipped);
    }

    #[test]
    fn test_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut c = controller(12);
        for kind in EventKind::ALL {
            let seen = Rc::clone(&seen);
            c.on(kind, Box::new(move |event| seen.borrow_mut().push(event.kind())));
        }
        c.start();
        c.paginate(2);
        c.sort(0, SortDirection::Asc).unwrap();
        c.search("x");

        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::GetData,
                EventKind::Update,
                EventKind::Init,
                EventKind::Paginate,
                EventKind::GetData,
                EventKind::Update,
                EventKind::GetData,
                EventKind::Update,
                EventKind::Sort,
                EventKind::GetData,
                EventKind::Update,
                EventKind::Search,
            ]
        );
    }

    #[test]
    fn test_column_renderer() {
        let mut c = controller(2);
        c.set_column_renderer(
            1,
            Box::new(|cell: &crate::types::Cell, _: &Row, _: usize| format!("${}", cell.content())),
        )
        .unwrap();
        let frame = c.refresh().into_frame().unwrap();
        assert_eq!(frame.rows[0].cells[1].html, "$10");
        let blank = |_: &crate::types::Cell, _: &Row, _: usize| String::new();
        assert!(c.set_column_renderer(5, Box::new(blank)).is_err());
    }

    #[test]
    fn test_url_state_round_trip() {
        let mut c = controller(12);
        c.sort(1, SortDirection::Desc).unwrap();
        c.search("Row");
        c.paginate(2);
        let state = c.url_state();

        let mut other = controller(12);
        let frame = other.restore_url_state(&state).unwrap().into_frame().unwrap();
        assert_eq!(frame.current_page, 2);
        assert_eq!(frame.sort_column, Some(1));
        assert_eq!(frame.sort_direction, SortDirection::Desc);
        assert_eq!(frame.search_query.as_deref(), Some("Row"));
        assert_eq!(names(&frame), vec!["Row 7", "Row 6", "Row 5", "Row 4", "Row 3"]);
    }

    #[test]
    fn test_restore_rejects_bad_column() {
        let mut c = controller(3);
        let state = UrlState {
            page: Some(2),
            sort_column: Some(5),
            ..UrlState::default()
        };
        assert!(c.restore_url_state(&state).is_err());
        assert_eq!(c.current_page(), 1);
    }

    fn server_config() -> TableConfig {
        let json = r#"{"serverSide": true, "ajax": "/data", "ajaxParams": {"table": "t"}}"#;
        TableConfig::from_json(json).unwrap()
    }

    fn service(rows: usize) -> ReferenceService {
        let rows: Vec<String> = (1..=rows)
            .map(|n| format!(r#"["Row {n}", "{}"]"#, n * 10))
            .collect();
        ReferenceService::from_json(&format!("[{}]", rows.join(","))).unwrap()
    }

    #[test]
    fn test_server_side_fetch_flow() {
        let svc = service(12);
        let mut c =
            TableController::new(TableSnapshot::with_header(&["Name", "Value"]), server_config())
                .unwrap();

        let refresh = c.start();
        let request = refresh.request().cloned().unwrap();
        assert_eq!(c.phase(), Phase::Fetching { seq: request.seq });
        assert_eq!(request.start, 0);
        assert_eq!(request.length, 5);
        assert!(request.to_url().starts_with("/data?table=t&searchQuery=null"));

        let frame = c.resolve(refresh, &svc).into_frame().unwrap();
        assert_eq!(frame.rows.len(), 5);
        assert_eq!(frame.page_count, 3);
        assert_eq!(frame.data_count_total, 12);

        let refresh = c.paginate(3);
        assert_eq!(refresh.request().unwrap().start, 10);
        let frame = c.resolve(refresh, &svc).into_frame().unwrap();
        assert_eq!(names(&frame), vec!["Row 11", "Row 12"]);

        let refresh = c.search("Row 1");
        assert_eq!(c.current_page(), 1);
        let frame = c.resolve(refresh, &svc).into_frame().unwrap();
        // The service reads the whole query as one pattern.
        assert_eq!(frame.data_count, 4);
        assert_eq!(frame.data_count_total, 12);
        assert!(frame.is_searching);
    }

    #[test]
    fn test_server_side_sort_is_forwarded_not_applied() {
        let mut c =
            TableController::new(TableSnapshot::with_header(&["Name", "Value"]), server_config())
                .unwrap();
        let request = c.sort(1, SortDirection::Desc).unwrap().request().cloned().unwrap();
        assert_eq!(request.sort_column, Some(1));
        assert_eq!(request.sort_direction, SortDirection::Desc);
        let frame = c.resolve(Refresh::Pending(request), &service(3)).into_frame().unwrap();
        assert_eq!(names(&frame), vec!["Row 3", "Row 2", "Row 1"]);
    }

    #[test]
    fn test_stale_responses_are_dropped() {
        let svc = service(12);
        let mut c =
            TableController::new(TableSnapshot::with_header(&["Name", "Value"]), server_config())
                .unwrap();
        let first = c.start().request().cloned().unwrap();
        let second = c.search("Row 2").request().cloned().unwrap();
        assert!(second.seq > first.seq);

        let stale = svc.fetch(&first);
        assert_eq!(c.apply_response(first.seq, stale), Refresh::Skipped);

        let fresh = svc.fetch(&second);
        let frame = c.apply_response(second.seq, fresh).into_frame().unwrap();
        assert_eq!(frame.data_count, 1);
        // Applying twice is also stale.
        assert_eq!(
            c.apply_response(second.seq, svc.fetch(&second)),
            Refresh::Skipped
        );
    }

    #[test]
    fn test_transport_failure_shows_empty_page() {
        let svc = service(12);
        let mut c =
            TableController::new(TableSnapshot::with_header(&["Name", "Value"]), server_config())
                .unwrap();
        let refresh = c.start();
        c.resolve(refresh, &svc);
        let request = c.search("Row").request().cloned().unwrap();
        let frame = c
            .resolve(Refresh::Pending(request), &svc)
            .into_frame()
            .unwrap();
        assert_eq!(frame.data_count, 12);

        let request = c.paginate(2).request().cloned().unwrap();
        let frame = c
            .apply_response(request.seq, Err(DtviewError::Transport("offline".into())))
            .into_frame()
            .unwrap();
        assert!(frame.rows.is_empty());
        assert_eq!(frame.message.as_deref(), Some("No entries found"));
        assert_eq!(c.data_count_filtered(), 12);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_deferred_loading_presents_initial_rows() {
        let config = TableConfig::from_json(r#"{"serverSide": true, "deferLoading": 57}"#).unwrap();
        let mut c = TableController::new(numbered(5), config).unwrap();
        let frame = c.start().into_frame().unwrap();
        assert_eq!(frame.rows.len(), 5);
        assert_eq!(frame.data_count_total, 57);
        assert_eq!(frame.page_count, 12);
        assert!(c.paginate(2).request().is_some());
    }
}
