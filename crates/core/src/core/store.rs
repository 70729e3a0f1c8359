//! The single shared store every view reads from.
//!
//! Mutation happens synchronously inside discrete event handlers (poll completion,
//! click, change, input), so listeners always observe a fully updated store.

use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::{Error, Result};
use crate::highlight::{compute_highlight_set, HighlightFilter, HighlightSet};
use crate::model::{Program, Snapshot};
use crate::nav::ViewKind;
use crate::scaling::MetricScale;
use crate::theme::Theme;

/// What changed; delivered to every subscribed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    SnapshotReplaced,
    SelectionChanged,
    HoverChanged,
    MetricChanged,
    HighlightChanged,
    ThemeChanged,
    ViewChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StoreEvent, &SnapshotStore)>;

pub struct SnapshotStore {
    config: DashboardConfig,
    snapshot: Snapshot,
    fingerprint: Option<String>,
    selection: Option<String>,
    sticky: bool,
    hovered: Option<String>,
    /// `None` until a snapshot reports a metric; reads then fall back to the configured name.
    active_metric: Option<String>,
    highlight_filter: HighlightFilter,
    theme: Theme,
    active_view: ViewKind,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("programs", &self.snapshot.len())
            .field("selection", &self.selection)
            .field("sticky", &self.sticky)
            .field("hovered", &self.hovered)
            .field("active_metric", &self.active_metric)
            .field("highlight_filter", &self.highlight_filter)
            .field("theme", &self.theme)
            .field("active_view", &self.active_view)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SnapshotStore {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            snapshot: Snapshot::empty(),
            fingerprint: None,
            selection: None,
            sticky: false,
            hovered: None,
            active_metric: None,
            highlight_filter: HighlightFilter::None,
            theme: Theme::default(),
            active_view: ViewKind::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The selected program, if it is still part of the current snapshot.
    pub fn selected_program(&self) -> Option<&Program> {
        self.snapshot.get(self.selection.as_deref()?)
    }

    pub fn sticky(&self) -> bool {
        self.sticky
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Program the detail panel should show: the sticky selection, otherwise the hover
    /// preview, otherwise a non-sticky selection.
    pub fn relevant_program(&self) -> Option<&Program> {
        let id = if self.sticky {
            self.selection.as_deref()
        } else {
            self.hovered.as_deref().or(self.selection.as_deref())
        };
        self.snapshot.get(id?)
    }

    pub fn active_metric(&self) -> &str {
        self.active_metric.as_deref().unwrap_or(&self.config.fallback_metric)
    }

    pub fn highlight_filter(&self) -> HighlightFilter {
        self.highlight_filter
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn highlight_set(&self) -> HighlightSet {
        compute_highlight_set(&self.snapshot, self.highlight_filter, self.active_metric())
    }

    /// Scaling of the active metric over the current snapshot.
    pub fn metric_scale(&self) -> MetricScale {
        MetricScale::new(&self.snapshot, self.active_metric(), &self.config)
    }

    /// Store `snapshot` unless its content equals the current one.
    ///
    /// Returns whether anything was replaced. On replacement the active metric is
    /// re-validated and a selection or hover pointing at a vanished program is cleared.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) -> bool {
        let fingerprint = snapshot.to_json().to_string();
        if self.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!("Snapshot content unchanged; skipping redraw");
            return false;
        }

        self.snapshot = snapshot;
        self.fingerprint = Some(fingerprint);

        let metric = self.resolve_metric();
        let previous = self.active_metric().to_string();
        self.active_metric = metric;
        let metric_changed = previous != self.active_metric();
        if metric_changed {
            info!("Active metric {} -> {}", previous, self.active_metric());
        }

        let selection_stale = self
            .selection
            .as_deref()
            .is_some_and(|id| !self.snapshot.contains(id));
        if selection_stale {
            debug!("Clearing stale selection {:?}", self.selection);
            self.selection = None;
            self.sticky = false;
        }

        let hover_stale = self
            .hovered
            .as_deref()
            .is_some_and(|id| !self.snapshot.contains(id));
        if hover_stale {
            self.hovered = None;
        }

        self.notify(StoreEvent::SnapshotReplaced);
        if metric_changed {
            self.notify(StoreEvent::MetricChanged);
        }
        if selection_stale {
            self.notify(StoreEvent::SelectionChanged);
        }
        if hover_stale {
            self.notify(StoreEvent::HoverChanged);
        }
        true
    }

    /// Keep the chosen metric while it exists, else the first-seen one. `None` reads as
    /// the configured fallback.
    fn resolve_metric(&self) -> Option<String> {
        match &self.active_metric {
            Some(current) if self.snapshot.has_metric(current) => Some(current.clone()),
            _ => self.snapshot.metric_names().first().cloned(),
        }
    }

    /// Silent: callers refresh views themselves (see [`crate::nav::Navigator`]).
    pub fn set_selection(&mut self, id: Option<&str>) {
        self.selection = id.map(str::to_string);
    }

    /// Silent, like [`Self::set_selection`].
    pub fn set_sticky(&mut self, sticky: bool) {
        self.sticky = sticky;
    }

    /// Silent, like [`Self::set_selection`].
    pub fn set_hovered(&mut self, id: Option<&str>) {
        self.hovered = id.map(str::to_string);
    }

    /// Switch the active metric. Unknown names are rejected.
    pub fn set_active_metric(&mut self, name: &str) -> Result<bool> {
        if name == self.active_metric() {
            return Ok(false);
        }
        if !self.snapshot.has_metric(name) {
            return Err(Error::UnknownMetric(name.to_string()));
        }
        self.active_metric = Some(name.to_string());
        self.notify(StoreEvent::MetricChanged);
        Ok(true)
    }

    pub fn set_highlight_filter(&mut self, filter: HighlightFilter) -> bool {
        if filter == self.highlight_filter {
            return false;
        }
        self.highlight_filter = filter;
        self.notify(StoreEvent::HighlightChanged);
        true
    }

    pub fn set_theme(&mut self, theme: Theme) -> bool {
        if theme == self.theme {
            return false;
        }
        self.theme = theme;
        self.notify(StoreEvent::ThemeChanged);
        true
    }

    pub fn set_active_view(&mut self, view: ViewKind) -> bool {
        if view == self.active_view {
            return false;
        }
        self.active_view = view;
        self.notify(StoreEvent::ViewChanged);
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent, &SnapshotStore) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener, in subscription order.
    pub fn notify(&mut self, event: StoreEvent) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener(&event, self);
        }
        self.listeners = listeners;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn snap(programs: Vec<Program>) -> Snapshot {
        Snapshot::new(programs, Vec::<String>::new(), "run")
    }

    fn recorder(store: &mut SnapshotStore) -> Rc<RefCell<Vec<StoreEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |e, _| sink.borrow_mut().push(*e));
        log
    }

    #[test]
    fn identical_content_is_a_noop() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        let log = recorder(&mut store);

        let programs = vec![Program::new("a", 0).with_metric("score", 1.0)];
        assert!(store.replace_snapshot(snap(programs.clone())));
        let renders = log.borrow().len();
        assert!(!store.replace_snapshot(snap(programs)));
        assert_eq!(log.borrow().len(), renders);
    }

    #[test]
    fn metric_change_alone_triggers_replacement() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![Program::new("a", 0).with_metric("score", 1.0)]));
        assert!(store.replace_snapshot(snap(vec![Program::new("a", 0).with_metric("score", 2.0)])));
    }

    #[test]
    fn removed_metric_falls_back() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![
            Program::new("a", 0).with_metric("accuracy", 0.5).with_metric("loss", 0.1),
        ]));
        assert_eq!(store.active_metric(), "accuracy");
        store.set_active_metric("loss").unwrap();

        store.replace_snapshot(snap(vec![Program::new("a", 0).with_metric("speed", 3.0)]));
        assert_eq!(store.active_metric(), "speed");
        assert_eq!(store.metric_scale().radius(&store.snapshot().programs()[0]), 21.0);

        store.replace_snapshot(snap(vec![Program::new("a", 0)]));
        assert_eq!(store.active_metric(), "overall_score");
    }

    #[test]
    fn first_snapshot_picks_first_seen_metric_over_fallback() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        assert_eq!(store.active_metric(), "overall_score");
        store.replace_snapshot(snap(vec![
            Program::new("a", 0).with_metric("combined_score", 0.4).with_metric("overall_score", 0.7),
        ]));
        assert_eq!(store.active_metric(), "combined_score");
    }

    #[test]
    fn still_present_metric_is_kept() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![
            Program::new("a", 0).with_metric("x", 0.5).with_metric("y", 0.1),
        ]));
        store.set_active_metric("y").unwrap();
        store.replace_snapshot(snap(vec![
            Program::new("b", 0).with_metric("x", 0.5).with_metric("y", 0.2),
        ]));
        assert_eq!(store.active_metric(), "y");
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![Program::new("a", 0).with_metric("x", 0.5)]));
        assert!(matches!(store.set_active_metric("nope"), Err(Error::UnknownMetric(_))));
        assert_eq!(store.active_metric(), "x");
    }

    #[test]
    fn stale_selection_is_cleared_on_replace() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![Program::new("a", 0), Program::new("b", 1)]));
        store.set_selection(Some("b"));
        store.set_sticky(true);
        store.set_hovered(Some("b"));
        let log = recorder(&mut store);

        store.replace_snapshot(snap(vec![Program::new("a", 0)]));
        assert_eq!(store.selection(), None);
        assert!(!store.sticky());
        assert_eq!(store.hovered(), None);
        assert_eq!(
            *log.borrow(),
            vec![
                StoreEvent::SnapshotReplaced,
                StoreEvent::SelectionChanged,
                StoreEvent::HoverChanged
            ]
        );
    }

    #[test]
    fn raw_selection_setters_are_silent() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![Program::new("a", 0)]));
        let log = recorder(&mut store);
        store.set_selection(Some("a"));
        store.set_sticky(true);
        store.set_hovered(None);
        assert!(log.borrow().is_empty());
        assert_eq!(store.selected_program().map(|p| p.id.as_str()), Some("a"));
    }

    #[test]
    fn setters_emit_only_on_change() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        let log = recorder(&mut store);
        assert!(store.set_theme(Theme::Dark));
        assert!(!store.set_theme(Theme::Dark));
        assert!(store.set_highlight_filter(HighlightFilter::InArchive));
        assert!(store.set_active_view(ViewKind::List));
        assert_eq!(
            *log.borrow(),
            vec![
                StoreEvent::ThemeChanged,
                StoreEvent::HighlightChanged,
                StoreEvent::ViewChanged
            ]
        );
    }

    #[test]
    fn listeners_see_updated_state_and_can_unsubscribe() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let id = store.subscribe(move |_, s| *sink.borrow_mut() = Some(s.theme()));
        store.set_theme(Theme::Dark);
        assert_eq!(*seen.borrow(), Some(Theme::Dark));

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_theme(Theme::Light);
        assert_eq!(*seen.borrow(), Some(Theme::Dark));
    }

    #[test]
    fn relevant_program_prefers_sticky_selection() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snap(vec![Program::new("a", 0), Program::new("b", 1)]));
        store.set_hovered(Some("b"));
        assert_eq!(store.relevant_program().map(|p| p.id.as_str()), Some("b"));
        store.set_selection(Some("a"));
        store.set_sticky(true);
        assert_eq!(store.relevant_program().map(|p| p.id.as_str()), Some("a"));
    }
}
