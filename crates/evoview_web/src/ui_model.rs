//! UI models that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test tab
//! inventory, viewport sizing and pointer gestures on the host.

use evoview::fmt;
use evoview::geom::Point;
use evoview::nav::ViewKind;
use evoview::poll::PollOutcome;
use evoview::scatter::MetricSummary;
use evoview::store::StoreEvent;

/// Width reserved for the detail sidebar when it is open.
pub const SIDEBAR_WIDTH: f64 = 420.0;
const TOOLBAR_HEIGHT: f64 = 64.0;
const PAGE_PADDING: f64 = 24.0;
const MIN_CANVAS: f64 = 400.0;

/// Pointer travel (px) below which a press/release counts as a click.
pub const CLICK_SLOP: f64 = 4.0;
/// Two clicks on the same node closer than this open its detail page.
pub const DOUBLE_CLICK_MS: f64 = 350.0;

pub fn tab_icon(view: ViewKind) -> &'static str {
    match view {
        ViewKind::Branching => "🌿",
        ViewKind::Performance => "📈",
        ViewKind::List => "📋",
    }
}

/// Canvas size for the graph and scatter views, never smaller than 400×400.
pub fn canvas_size(window_w: f64, window_h: f64, sidebar_open: bool) -> (f64, f64) {
    let sidebar = if sidebar_open { SIDEBAR_WIDTH } else { 0.0 };
    let w = (window_w - sidebar - PAGE_PADDING).max(MIN_CANVAS);
    let h = (window_h - TOOLBAR_HEIGHT - PAGE_PADDING).max(MIN_CANVAS);
    (w, h)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryText {
    pub top: String,
    pub average: String,
    pub min: String,
    pub max: String,
}

impl From<&MetricSummary> for SummaryText {
    fn from(s: &MetricSummary) -> Self {
        Self {
            top: fmt::fixed(s.top, 4),
            average: fmt::fixed(s.average, 4),
            min: fmt::fixed(s.range.min, 2),
            max: fmt::fixed(s.range.max, 2),
        }
    }
}

/// Status line shown in the top bar after a poll.
pub fn poll_status(outcome: &PollOutcome, programs: usize, failures: u32) -> Option<String> {
    match outcome {
        PollOutcome::Unchanged => None,
        PollOutcome::Replaced => Some(format!("{programs} programs")),
        PollOutcome::Failed(msg) if failures > 1 => Some(format!("poll failed ({failures}×): {msg}")),
        PollOutcome::Failed(msg) => Some(format!("poll failed: {msg}")),
        PollOutcome::Rejected(msg) => Some(format!("bad payload: {msg}")),
    }
}

/// Whether `event` moves program positions (scatter points, graph radii) rather than
/// only their styling.
pub fn invalidates_layout(event: &StoreEvent) -> bool {
    matches!(event, StoreEvent::SnapshotReplaced | StoreEvent::MetricChanged)
}

/// What a completed pointer interaction means for a canvas view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    None,
    DragStart(usize),
    DragMove(usize, Point),
    DragEnd(usize),
    Pan(f64, f64),
    /// `None` is a click on empty background.
    Click(Option<usize>),
    DoubleClick(usize),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    at: Point,
    last: Point,
    target: Option<usize>,
    moved: bool,
}

/// Turns raw mouse down/move/up into clicks, drags and pans.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    press: Option<Press>,
    last_click: Option<(usize, f64)>,
}

impl PointerTracker {
    /// `target` is the node under the pointer, if any.
    pub fn down(&mut self, at: Point, target: Option<usize>) {
        self.press = Some(Press {
            at,
            last: at,
            target,
            moved: false,
        });
    }

    /// `world` is the pointer position mapped through the current zoom.
    pub fn moved(&mut self, at: Point, world: Point) -> Gesture {
        let Some(press) = self.press.as_mut() else {
            return Gesture::None;
        };
        let started = !press.moved && press.at.dist2(at) > CLICK_SLOP * CLICK_SLOP;
        if started {
            press.moved = true;
        }
        if !press.moved {
            return Gesture::None;
        }
        let (dx, dy) = (at.x - press.last.x, at.y - press.last.y);
        press.last = at;
        match press.target {
            Some(i) if started => Gesture::DragStart(i),
            Some(i) => Gesture::DragMove(i, world),
            None => Gesture::Pan(dx, dy),
        }
    }

    pub fn up(&mut self, now_ms: f64) -> Gesture {
        let Some(press) = self.press.take() else {
            return Gesture::None;
        };
        if press.moved {
            return match press.target {
                Some(i) => Gesture::DragEnd(i),
                None => Gesture::None,
            };
        }
        match press.target {
            Some(i) => {
                let double = self
                    .last_click
                    .is_some_and(|(j, t)| j == i && now_ms - t <= DOUBLE_CLICK_MS);
                if double {
                    self.last_click = None;
                    Gesture::DoubleClick(i)
                } else {
                    self.last_click = Some((i, now_ms));
                    Gesture::Click(Some(i))
                }
            }
            None => {
                self.last_click = None;
                Gesture::Click(None)
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoview::scaling::MetricRange;

    #[test]
    fn tab_inventory_is_stable() {
        let all = ViewKind::all();
        assert_eq!(all.len(), 3);
        for &v in all {
            assert!(!tab_icon(v).is_empty());
            assert!(!v.label().is_empty());
        }
    }

    #[test]
    fn canvas_never_shrinks_below_minimum() {
        assert_eq!(canvas_size(300.0, 200.0, true), (400.0, 400.0));
        let (w, h) = canvas_size(1600.0, 1000.0, true);
        assert_eq!(w, 1600.0 - SIDEBAR_WIDTH - 24.0);
        assert_eq!(h, 1000.0 - 64.0 - 24.0);
        assert!(canvas_size(1600.0, 1000.0, false).0 > w);
    }

    #[test]
    fn summary_uses_four_decimals() {
        let s = MetricSummary {
            top: 0.98765,
            average: 0.5,
            range: MetricRange { min: 0.1, max: 0.98765 },
            count: 3,
        };
        let t = SummaryText::from(&s);
        assert_eq!(t.top, "0.9877");
        assert_eq!(t.average, "0.5000");
        assert_eq!(t.max, "0.99");
    }

    #[test]
    fn only_data_events_invalidate_layout() {
        assert!(invalidates_layout(&StoreEvent::SnapshotReplaced));
        assert!(invalidates_layout(&StoreEvent::MetricChanged));
        for e in [
            StoreEvent::HoverChanged,
            StoreEvent::SelectionChanged,
            StoreEvent::HighlightChanged,
            StoreEvent::ThemeChanged,
            StoreEvent::ViewChanged,
        ] {
            assert!(!invalidates_layout(&e), "{e:?}");
        }
    }

    #[test]
    fn poll_status_messages() {
        assert_eq!(poll_status(&PollOutcome::Unchanged, 3, 0), None);
        assert_eq!(poll_status(&PollOutcome::Replaced, 3, 0).as_deref(), Some("3 programs"));
        let failed = PollOutcome::Failed("HTTP 500".into());
        assert_eq!(poll_status(&failed, 3, 1).as_deref(), Some("poll failed: HTTP 500"));
        assert!(poll_status(&failed, 3, 4).unwrap().contains("4×"));
        let rejected = PollOutcome::Rejected("missing `nodes`".into());
        assert_eq!(poll_status(&rejected, 3, 2).as_deref(), Some("bad payload: missing `nodes`"));
    }

    #[test]
    fn press_release_on_node_is_a_click_then_double_click() {
        let mut p = PointerTracker::default();
        p.down(Point::new(10.0, 10.0), Some(2));
        assert_eq!(p.moved(Point::new(11.0, 11.0), Point::default()), Gesture::None);
        assert_eq!(p.up(1000.0), Gesture::Click(Some(2)));

        p.down(Point::new(10.0, 10.0), Some(2));
        assert_eq!(p.up(1200.0), Gesture::DoubleClick(2));

        p.down(Point::new(10.0, 10.0), Some(2));
        assert_eq!(p.up(2000.0), Gesture::Click(Some(2)));
    }

    #[test]
    fn drag_on_node_and_pan_on_background() {
        let mut p = PointerTracker::default();
        p.down(Point::new(0.0, 0.0), Some(5));
        let world = Point::new(3.0, 4.0);
        assert_eq!(p.moved(Point::new(20.0, 0.0), world), Gesture::DragStart(5));
        assert_eq!(p.moved(Point::new(30.0, 0.0), world), Gesture::DragMove(5, world));
        assert_eq!(p.up(0.0), Gesture::DragEnd(5));
        assert!(!p.is_pressed());

        p.down(Point::new(0.0, 0.0), None);
        assert_eq!(p.moved(Point::new(10.0, 0.0), Point::default()), Gesture::Pan(10.0, 0.0));
        assert_eq!(p.moved(Point::new(12.0, 3.0), Point::default()), Gesture::Pan(2.0, 3.0));
        assert_eq!(p.up(0.0), Gesture::None);

        p.down(Point::new(0.0, 0.0), None);
        assert_eq!(p.up(0.0), Gesture::Click(None));
    }
}
