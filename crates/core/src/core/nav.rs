//! Cross-view selection protocol.
//!
//! Any view (or the sidebar) asks the [`Navigator`] to select a program; the navigator
//! updates the store, emits one event, and asks whichever view is in the foreground to
//! bring the program into sight. Callers never need to know which view that is.

use hashbrown::HashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{SnapshotStore, StoreEvent};

/// The mutually exclusive dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    /// Force-directed lineage graph.
    #[default]
    Branching,
    Performance,
    List,
}

impl ViewKind {
    pub fn value(self) -> &'static str {
        match self {
            ViewKind::Branching => "branching",
            ViewKind::Performance => "performance",
            ViewKind::List => "list",
        }
    }

    pub fn from_value(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "branching" | "lineage" | "graph" => Some(ViewKind::Branching),
            "performance" | "scatter" => Some(ViewKind::Performance),
            "list" => Some(ViewKind::List),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Branching => "Branching",
            ViewKind::Performance => "Performance",
            ViewKind::List => "List",
        }
    }

    pub fn all() -> &'static [ViewKind] {
        &[ViewKind::Branching, ViewKind::Performance, ViewKind::List]
    }
}

/// Ask a view to bring one program into sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealRequest {
    pub id: String,
    /// Index into the current snapshot's program list.
    pub index: usize,
    pub view: ViewKind,
}

type RevealHandler = Box<dyn FnMut(&RevealRequest, &SnapshotStore)>;

#[derive(Default)]
pub struct Navigator {
    handlers: HashMap<ViewKind, RevealHandler>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("views", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how `view` reveals a program; replaces any earlier handler.
    pub fn on_reveal(&mut self, view: ViewKind, handler: impl FnMut(&RevealRequest, &SnapshotStore) + 'static) {
        self.handlers.insert(view, Box::new(handler));
    }

    /// Sticky-select `id` and reveal it in the active view.
    pub fn select_and_reveal(&mut self, store: &mut SnapshotStore, id: &str) -> Result<RevealRequest> {
        let index = self.select(store, id)?;
        let request = RevealRequest {
            id: id.to_string(),
            index,
            view: store.active_view(),
        };
        match self.handlers.get_mut(&request.view) {
            Some(reveal) => reveal(&request, store),
            None => debug!("No reveal handler for {:?}", request.view),
        }
        Ok(request)
    }

    /// Click on a circle or row: sticky selection without moving the viewport.
    /// Returns the program's index.
    pub fn select(&mut self, store: &mut SnapshotStore, id: &str) -> Result<usize> {
        let index = store
            .snapshot()
            .index_of(id)
            .ok_or_else(|| Error::UnknownProgram(id.to_string()))?;
        store.set_selection(Some(id));
        store.set_sticky(true);
        store.set_hovered(None);
        store.notify(StoreEvent::SelectionChanged);
        Ok(index)
    }

    /// Background click or the sidebar's close button.
    pub fn clear_selection(&mut self, store: &mut SnapshotStore) {
        if store.selection().is_none() && !store.sticky() {
            return;
        }
        store.set_selection(None);
        store.set_sticky(false);
        store.notify(StoreEvent::SelectionChanged);
    }

    /// Pointer entered a program. The sidebar only follows while nothing is sticky.
    pub fn hover_enter(&mut self, store: &mut SnapshotStore, id: &str) -> bool {
        if !store.snapshot().contains(id) || store.hovered() == Some(id) {
            return false;
        }
        store.set_hovered(Some(id));
        store.notify(StoreEvent::HoverChanged);
        true
    }

    pub fn hover_leave(&mut self, store: &mut SnapshotStore) -> bool {
        if store.hovered().is_none() {
            return false;
        }
        store.set_hovered(None);
        store.notify(StoreEvent::HoverChanged);
        true
    }

    /// Bring `view` to the front; it restyles itself on `ViewChanged`.
    pub fn switch_view(&mut self, store: &mut SnapshotStore, view: ViewKind) -> bool {
        self.hover_leave(store);
        store.set_active_view(view)
    }

    pub fn detail_url(&self, store: &SnapshotStore, id: &str) -> String {
        store.config().detail_url(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::DashboardConfig;
    use crate::model::{Program, Snapshot};
    use crate::scaling::StrokeStyle;

    fn store() -> SnapshotStore {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(Snapshot::new(
            vec![
                Program::new("a", 0),
                Program::new("b", 1).with_parent("a"),
                Program::new("c", 2).with_parent("b"),
            ],
            Vec::<String>::new(),
            "",
        ));
        store
    }

    fn reveals(nav: &mut Navigator) -> Rc<RefCell<Vec<(ViewKind, String)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for &view in ViewKind::all() {
            let sink = log.clone();
            nav.on_reveal(view, move |req, _| sink.borrow_mut().push((view, req.id.clone())));
        }
        log
    }

    #[test]
    fn reveal_goes_to_the_active_view_only() {
        let mut store = store();
        let mut nav = Navigator::new();
        let log = reveals(&mut nav);

        nav.switch_view(&mut store, ViewKind::List);
        let req = nav.select_and_reveal(&mut store, "a").unwrap();
        assert_eq!(req.index, 0);
        nav.switch_view(&mut store, ViewKind::Performance);
        nav.select_and_reveal(&mut store, "b").unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                (ViewKind::List, "a".to_string()),
                (ViewKind::Performance, "b".to_string())
            ]
        );
        assert_eq!(store.selection(), Some("b"));
        assert!(store.sticky());
    }

    #[test]
    fn unknown_program_changes_nothing() {
        let mut store = store();
        let mut nav = Navigator::new();
        let log = reveals(&mut nav);
        assert!(matches!(
            nav.select_and_reveal(&mut store, "zzz"),
            Err(Error::UnknownProgram(_))
        ));
        assert_eq!(store.selection(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn select_then_background_click_round_trips() {
        let mut store = store();
        let mut nav = Navigator::new();
        nav.select(&mut store, "c").unwrap();
        nav.clear_selection(&mut store);

        assert_eq!(store.selection(), None);
        assert!(!store.sticky());
        let highlighted = store.highlight_set();
        for p in store.snapshot().programs() {
            let stroke = StrokeStyle::resolve(
                store.theme(),
                store.hovered() == Some(p.id.as_str()),
                store.selection() == Some(p.id.as_str()),
                highlighted.contains(&p.id),
            );
            assert_ne!(stroke, StrokeStyle::SELECTED);
        }
    }

    #[test]
    fn one_event_per_navigation() {
        let mut store = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e, _| sink.borrow_mut().push(*e));

        let mut nav = Navigator::new();
        nav.select_and_reveal(&mut store, "b").unwrap();
        nav.clear_selection(&mut store);
        nav.clear_selection(&mut store);
        assert_eq!(
            *events.borrow(),
            vec![StoreEvent::SelectionChanged, StoreEvent::SelectionChanged]
        );
    }

    #[test]
    fn hover_preview_yields_to_sticky_selection() {
        let mut store = store();
        let mut nav = Navigator::new();
        assert!(nav.hover_enter(&mut store, "a"));
        assert_eq!(store.relevant_program().unwrap().id, "a");

        nav.select(&mut store, "c").unwrap();
        nav.hover_enter(&mut store, "b");
        assert_eq!(store.relevant_program().unwrap().id, "c");
        assert!(nav.hover_leave(&mut store));
        assert!(!nav.hover_leave(&mut store));
        assert!(!nav.hover_enter(&mut store, "missing"));
    }

    #[test]
    fn switching_views_drops_the_hover_preview_with_an_event() {
        let mut store = store();
        let mut nav = Navigator::new();
        nav.hover_enter(&mut store, "a");
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e, s| sink.borrow_mut().push((*e, s.hovered().map(str::to_string))));

        assert!(nav.switch_view(&mut store, ViewKind::List));
        assert_eq!(store.hovered(), None);
        assert_eq!(
            *events.borrow(),
            vec![(StoreEvent::HoverChanged, None), (StoreEvent::ViewChanged, None)]
        );
    }

    #[test]
    fn view_values_round_trip() {
        for &v in ViewKind::all() {
            assert_eq!(ViewKind::from_value(v.value()), Some(v));
        }
        assert_eq!(Navigator::new().detail_url(&store(), "b"), "/program/b");
    }
}
