//! Table lifecycle events and their listeners.

use serde::Serialize;

use crate::types::SortDirection;

/// Names of the events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Init,
    Update,
    Search,
    Sort,
    Paginate,
    PerPageChange,
    GetData,
    FetchData,
}

impl EventKind {
    pub const ALL: [Self; 8] = [
        Self::Init,
        Self::Update,
        Self::Search,
        Self::Sort,
        Self::Paginate,
        Self::PerPageChange,
        Self::GetData,
        Self::FetchData,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Update => "update",
            Self::Search => "search",
            Self::Sort => "sort",
            Self::Paginate => "paginate",
            Self::PerPageChange => "perPageChange",
            Self::GetData => "getData",
            Self::FetchData => "fetchData",
        }
    }
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TableEvent {
    /// The controller finished building.
    Init,
    /// A frame was produced.
    Update,
    Search { query: String },
    Sort { column: usize, direction: SortDirection },
    Paginate { previous: usize, page: usize },
    PerPageChange { previous: usize, per_page: usize },
    /// Local rows were read for a page; `rows` is the data row count.
    GetData { rows: usize },
    /// A remote page arrived.
    FetchData {
        records_total: usize,
        records_filtered: usize,
        rows: usize,
    },
}

impl TableEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Init => EventKind::Init,
            Self::Update => EventKind::Update,
            Self::Search { .. } => EventKind::Search,
            Self::Sort { .. } => EventKind::Sort,
            Self::Paginate { .. } => EventKind::Paginate,
            Self::PerPageChange { .. } => EventKind::PerPageChange,
            Self::GetData { .. } => EventKind::GetData,
            Self::FetchData { .. } => EventKind::FetchData,
        }
    }
}

/// Handle returned by [`EventRegistry::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ListenerId(pub u32);

pub type Listener = Box<dyn FnMut(&TableEvent)>;

/// Listeners per event kind, called synchronously in subscription order.
///
/// With buffering on, every emitted event is also kept until
/// [`EventRegistry::drain`], for hosts that dispatch outside the controller.
#[derive(Default)]
pub struct EventRegistry {
    next_id: u32,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    buffering: bool,
    buffered: Vec<TableEvent>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .field("buffering", &self.buffering)
            .field("buffered", &self.buffered.len())
            .finish()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = self.allocate_id();
        self.listeners.push((id, kind, listener));
        id
    }

    /// Returns whether `id` was subscribed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// A fresh id for a listener kept elsewhere (e.g. a JS function).
    pub fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub fn set_buffering(&mut self, buffering: bool) {
        self.buffering = buffering;
        if !buffering {
            self.buffered.clear();
        }
    }

    pub fn emit(&mut self, event: TableEvent) {
        let kind = event.kind();
        for (_, _, listener) in self.listeners.iter_mut().filter(|(_, k, _)| *k == kind) {
            listener(&event);
        }
        if self.buffering {
            self.buffered.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.buffered)
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
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("click"), None);
    }

    #[test]
    fn test_dispatch_by_kind_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            registry.on(
                EventKind::Sort,
                Box::new(move |event| seen.borrow_mut().push((tag, event.clone()))),
            );
        }
        registry.emit(TableEvent::Init);
        registry.emit(TableEvent::Sort {
            column: 2,
            direction: SortDirection::Desc,
        });

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "first");
        assert_eq!(seen[1].0, "second");
        assert_eq!(seen[0].1.kind(), EventKind::Sort);
    }

    #[test]
    fn test_off_unsubscribes() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = EventRegistry::new();
        let counter = Rc::clone(&count);
        let id = registry.on(EventKind::Update, Box::new(move |_| *counter.borrow_mut() += 1));
        registry.emit(TableEvent::Update);
        assert!(registry.off(id));
        assert!(!registry.off(id));
        registry.emit(TableEvent::Update);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(registry.listener_count(EventKind::Update), 0);
    }

    #[test]
    fn test_buffering() {
        let mut registry = EventRegistry::new();
        registry.emit(TableEvent::Init);
        assert!(registry.drain().is_empty());
        registry.set_buffering(true);
        registry.emit(TableEvent::Search {
            query: "x".to_string(),
        });
        assert_eq!(registry.drain().len(), 1);
        assert!(registry.drain().is_empty());
    }

    #[test]
    fn test_event_payload_shape() {
        let json = serde_json::to_value(TableEvent::PerPageChange {
            previous: 5,
            per_page: 10,
        })
        .unwrap();
        assert_eq!(json["event"], "perPageChange");
        assert_eq!(json["perPage"], 10);
    }
}
