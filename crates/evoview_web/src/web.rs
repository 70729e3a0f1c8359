use evoview::prelude::*;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_time::Instant;

use crate::ui_model::{self, Gesture, PointerTracker};

mod canvas;
mod fetch;
mod graph_view;
mod list_view;
mod performance_view;
mod shell;
mod sidebar_view;
mod storage;

use graph_view::GraphView;
use list_view::ListView;
use performance_view::PerformanceView;
use shell::Topbar;
use sidebar_view::Sidebar;
use storage::{apply_theme_to_document, save_theme, PersistedPrefs};

pub fn start() {
    mount_to_body(|| view! { <App /> });
}

pub(super) fn console_warn(msg: &str) {
    web_sys::console::warn_1(&msg.into());
}

/// Everything the views read and mutate, kept outside the reactive graph.
/// Signals in [`Ui`] only announce that something in here changed.
pub(crate) struct AppState {
    store: SnapshotStore,
    nav: Navigator,
    poll: PollLoop,
    layout: ForceLayout,
    graph_zoom: ZoomTransform,
    graph_transition: Option<ZoomTransition>,
    graph_pointer: PointerTracker,
    scatter: Option<ScatterLayout>,
    perf_zoom: ZoomTransform,
    perf_transition: Option<ZoomTransition>,
    perf_pointer: PointerTracker,
    prefs: PersistedPrefs,
    viewport: (f64, f64),
    epoch: Instant,
}

#[derive(Debug, Default, Clone, Copy)]
struct FrameMoved {
    graph: bool,
    perf: bool,
}

impl AppState {
    fn new(store: SnapshotStore, nav: Navigator, prefs: PersistedPrefs, viewport: (f64, f64)) -> Self {
        let poll = PollLoop::new(store.config().poll_interval());
        Self {
            store,
            nav,
            poll,
            layout: ForceLayout::new(viewport.0, viewport.1),
            graph_zoom: ZoomTransform::IDENTITY,
            graph_transition: None,
            graph_pointer: PointerTracker::default(),
            scatter: None,
            perf_zoom: ZoomTransform::IDENTITY,
            perf_transition: None,
            perf_pointer: PointerTracker::default(),
            prefs,
            viewport,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn program_id(&self, index: usize) -> Option<String> {
        self.store.snapshot().program_at(index).map(|p| p.id.clone())
    }

    /// Bring the force layout in line with the snapshot and the active metric's radii.
    fn sync_layout(&mut self) {
        let scale = self.store.metric_scale();
        self.layout.sync(self.store.snapshot(), &scale);
    }

    fn rebuild_scatter(&mut self) {
        let scale = self.store.metric_scale();
        self.scatter = Some(ScatterLayout::build(
            self.store.snapshot(),
            &scale,
            self.viewport.0,
            self.viewport.1,
            self.prefs.split_islands,
        ));
    }

    fn resize(&mut self, viewport: (f64, f64)) {
        self.viewport = viewport;
        self.layout.resize(viewport.0, viewport.1);
    }

    /// One animation frame: cool the simulation and advance running zoom transitions.
    fn frame(&mut self, dt_ms: f64) -> FrameMoved {
        let mut moved = FrameMoved::default();
        if self.store.active_view() == ViewKind::Branching {
            moved.graph |= self.layout.tick();
            if let Some(t) = self.graph_transition.as_mut() {
                self.graph_zoom = t.advance(dt_ms);
                moved.graph = true;
                if t.is_done() {
                    self.graph_transition = None;
                }
            }
        }
        if let Some(t) = self.perf_transition.as_mut() {
            self.perf_zoom = t.advance(dt_ms);
            moved.perf = true;
            if t.is_done() {
                self.perf_transition = None;
            }
        }
        moved
    }

    fn center_graph_on(&mut self, index: usize) {
        let Some(pos) = self.layout.position(index) else {
            return;
        };
        let (w, h) = self.viewport;
        let target = ZoomTransform::centered_on(pos, self.graph_zoom.k.max(1.0), w, h);
        self.graph_transition = Some(ZoomTransition::new(
            self.graph_zoom,
            target,
            self.store.config().locate_duration_ms as f64,
        ));
    }

    fn locate_in_scatter(&mut self, index: usize) {
        if self.scatter.is_none() {
            self.rebuild_scatter();
        }
        let Some(scatter) = self.scatter.as_ref() else {
            return;
        };
        self.perf_transition =
            scatter.locate_transition(index, self.perf_zoom, self.store.config(), self.viewport);
    }

    /// Hover preview for whichever circle (if any) is under the pointer.
    fn hover_at(&mut self, hit: Option<usize>) {
        match hit.and_then(|i| self.program_id(i)) {
            Some(id) => {
                self.nav.hover_enter(&mut self.store, &id);
            }
            None => {
                self.nav.hover_leave(&mut self.store);
            }
        }
    }

    /// Click semantics shared by both canvases. Returns a detail URL to open on double-click.
    fn apply_click(&mut self, gesture: Gesture) -> Option<String> {
        match gesture {
            Gesture::Click(Some(i)) => {
                if let Some(id) = self.program_id(i) {
                    if let Err(e) = self.nav.select(&mut self.store, &id) {
                        console_warn(&e.to_string());
                    }
                }
                None
            }
            Gesture::Click(None) => {
                self.nav.clear_selection(&mut self.store);
                None
            }
            Gesture::DoubleClick(i) => self
                .program_id(i)
                .map(|id| self.nav.detail_url(&self.store, &id)),
            _ => None,
        }
    }

    fn select_and_reveal(&mut self, id: &str) {
        if let Err(e) = self.nav.select_and_reveal(&mut self.store, id) {
            console_warn(&e.to_string());
        }
    }
}

/// Copyable handles shared by every component.
#[derive(Clone, Copy)]
pub(crate) struct Ui {
    state: StoredValue<AppState, LocalStorage>,
    /// Bumped on every store event.
    revision: RwSignal<u64>,
    /// Bumped when positions derived from data must be recomputed: new snapshot, new
    /// active metric, new viewport.
    layout_revision: RwSignal<u64>,
    /// Bumped when graph positions or the graph transform moved without a store event.
    graph_frame: RwSignal<u64>,
    perf_frame: RwSignal<u64>,
    graph_reveal: RwSignal<Option<usize>>,
    perf_reveal: RwSignal<Option<usize>>,
    list_reveal: RwSignal<Option<String>>,
    status: RwSignal<String>,
}

impl Ui {
    fn bump(signal: RwSignal<u64>) {
        signal.update(|n| *n = n.wrapping_add(1));
    }

    fn open_detail(url: &str) {
        if let Some(w) = web_sys::window() {
            let _ = w.open_with_url_and_target(url, "_blank");
        }
    }
}

fn window_size() -> (f64, f64) {
    let Some(w) = web_sys::window() else {
        return (1024.0, 768.0);
    };
    let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1024.0);
    let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(768.0);
    (width, height)
}

fn viewport() -> (f64, f64) {
    let (w, h) = window_size();
    ui_model::canvas_size(w, h, true)
}

#[component]
fn App() -> impl IntoView {
    let revision = RwSignal::new(0u64);
    let layout_revision = RwSignal::new(0u64);
    let graph_reveal = RwSignal::new(None::<usize>);
    let perf_reveal = RwSignal::new(None::<usize>);
    let list_reveal = RwSignal::new(None::<String>);

    let mut store = SnapshotStore::new(DashboardConfig::default());
    let theme = storage::initial_theme();
    store.set_theme(theme);
    apply_theme_to_document(theme);
    store.subscribe(move |event, store| {
        if *event == StoreEvent::ThemeChanged {
            apply_theme_to_document(store.theme());
            save_theme(store.theme());
        }
        if ui_model::invalidates_layout(event) {
            Ui::bump(layout_revision);
        }
        Ui::bump(revision);
    });

    let mut nav = Navigator::new();
    nav.on_reveal(ViewKind::Branching, move |req, _| graph_reveal.set(Some(req.index)));
    nav.on_reveal(ViewKind::Performance, move |req, _| perf_reveal.set(Some(req.index)));
    nav.on_reveal(ViewKind::List, move |req, _| list_reveal.set(Some(req.id.clone())));

    let prefs = storage::load_prefs();
    let ui = Ui {
        state: StoredValue::new_local(AppState::new(store, nav, prefs, viewport())),
        revision,
        layout_revision,
        graph_frame: RwSignal::new(0),
        perf_frame: RwSignal::new(0),
        graph_reveal,
        perf_reveal,
        list_reveal,
        status: RwSignal::new("loading…".to_string()),
    };

    // The app lives as long as the page; the listener is never removed.
    let _resize = window_event_listener(leptos::ev::resize, move |_| {
        ui.state.update_value(|s| s.resize(viewport()));
        Ui::bump(ui.graph_frame);
        Ui::bump(ui.layout_revision);
    });

    start_poll_loop(ui);
    schedule_frame(ui, Instant::now());

    let active_view = move || {
        ui.revision.track();
        ui.state.with_value(|s| s.store.active_view())
    };

    view! {
        <div class="app">
            <Topbar ui=ui />
            <div class="app-body">
                <main class="views">
                    <div class="view" style:display=move || if active_view() == ViewKind::Branching { "block" } else { "none" }>
                        <GraphView ui=ui />
                    </div>
                    <div class="view" style:display=move || if active_view() == ViewKind::Performance { "block" } else { "none" }>
                        <PerformanceView ui=ui />
                    </div>
                    <div class="view" style:display=move || if active_view() == ViewKind::List { "block" } else { "none" }>
                        <ListView ui=ui />
                    </div>
                </main>
                <Sidebar ui=ui />
            </div>
        </div>
    }
}

/// Single-flight poll: the next fetch is scheduled only after the previous one settled.
fn start_poll_loop(ui: Ui) {
    spawn_local(async move {
        loop {
            let mut ticket = None;
            ui.state.update_value(|s| ticket = s.poll.begin());
            let endpoint = ui.state.with_value(|s| s.store.config().endpoint.clone());
            let interval_ms = ui.state.with_value(|s| s.poll.interval().as_millis() as u32);

            if let Some(ticket) = ticket {
                let result = fetch::fetch_text(&endpoint).await;
                let mut status = None;
                ui.state.update_value(|s| {
                    let outcome = s.poll.finish(ticket, result, &mut s.store);
                    if outcome == PollOutcome::Replaced {
                        s.sync_layout();
                    }
                    status = ui_model::poll_status(&outcome, s.store.snapshot().len(), s.poll.consecutive_failures());
                });
                if let Some(status) = status {
                    ui.status.set(status);
                }
            }

            fetch::sleep_ms(interval_ms).await;
        }
    });
}

fn schedule_frame(ui: Ui, last: Instant) {
    request_animation_frame(move || {
        let now = Instant::now();
        let dt_ms = now.duration_since(last).as_secs_f64() * 1000.0;
        let mut moved = FrameMoved::default();
        ui.state.update_value(|s| moved = s.frame(dt_ms));
        if moved.graph {
            Ui::bump(ui.graph_frame);
        }
        if moved.perf {
            Ui::bump(ui.perf_frame);
        }
        schedule_frame(ui, now);
    });
}
