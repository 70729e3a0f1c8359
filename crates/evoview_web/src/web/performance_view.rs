use evoview::geom::{ZoomExtent, ZoomTransform};
use evoview::scatter::MetricSummary;
use leptos::ev::{MouseEvent, WheelEvent};
use leptos::html::Canvas;
use leptos::prelude::*;

use super::graph_view::{pointer, wheel_factor};
use super::{canvas, console_warn, storage, Ui};
use crate::ui_model::{Gesture, SummaryText};

#[component]
pub(super) fn PerformanceView(ui: Ui) -> impl IntoView {
    let canvas_ref = NodeRef::<Canvas>::new();
    let split = RwSignal::new(ui.state.with_value(|s| s.prefs.split_islands));

    // Positions depend on data, metric, viewport and split only.
    Effect::new(move |_| {
        ui.layout_revision.track();
        split.track();
        ui.state.update_value(|s| s.rebuild_scatter());
        Ui::bump(ui.perf_frame);
    });

    // Strokes follow selection, hover, highlight and theme; those only redraw.
    Effect::new(move |_| {
        ui.revision.track();
        ui.perf_frame.track();
        let Some(el) = canvas_ref.get() else {
            return;
        };
        ui.state.with_value(|s| {
            let height = s.scatter.as_ref().map_or(s.viewport.1, |l| l.height);
            canvas::fit_canvas(&el, s.viewport.0, height);
            if let Err(e) = canvas::draw_scatter(&el, s) {
                console_warn(&e);
            }
        });
    });

    Effect::new(move |_| {
        if let Some(index) = ui.perf_reveal.get() {
            ui.state.update_value(|s| s.locate_in_scatter(index));
            ui.perf_reveal.set(None);
        }
    });

    let summary = move || {
        ui.revision.track();
        ui.state.with_value(|s| {
            let summary = MetricSummary::over(s.store.snapshot(), s.store.active_metric());
            (s.store.active_metric().to_string(), SummaryText::from(&summary))
        })
    };

    let on_toggle_split = move |ev: leptos::ev::Event| {
        let checked = event_target_checked(&ev);
        ui.state.update_value(|s| {
            s.prefs.split_islands = checked;
            s.perf_zoom = ZoomTransform::IDENTITY;
            s.perf_transition = None;
            storage::save_prefs(&s.prefs);
        });
        split.set(checked);
    };

    let on_down = move |ev: MouseEvent| {
        let at = pointer(&ev);
        ui.state.update_value(|s| {
            let hit = s.scatter.as_ref().and_then(|l| l.hit_test(at, &s.perf_zoom));
            s.perf_pointer.down(at, hit);
        });
    };

    let on_move = move |ev: MouseEvent| {
        let at = pointer(&ev);
        let mut panned = false;
        ui.state.update_value(|s| {
            if !s.perf_pointer.is_pressed() {
                let hit = s.scatter.as_ref().and_then(|l| l.hit_test(at, &s.perf_zoom));
                s.hover_at(hit);
                return;
            }
            let world = s.perf_zoom.invert(at);
            // Points stay where the data puts them; only the background pans.
            if let Gesture::Pan(dx, dy) = s.perf_pointer.moved(at, world) {
                s.perf_transition = None;
                s.perf_zoom = s.perf_zoom.translate_by(dx, dy);
                panned = true;
            }
        });
        if panned {
            Ui::bump(ui.perf_frame);
        }
    };

    let on_up = move |_: MouseEvent| {
        let mut open = None;
        ui.state.update_value(|s| {
            let now = s.now_ms();
            let gesture = s.perf_pointer.up(now);
            open = s.apply_click(gesture);
        });
        if let Some(url) = open {
            Ui::open_detail(&url);
        }
    };

    let on_leave = move |_: MouseEvent| {
        ui.state.update_value(|s| {
            if s.perf_pointer.is_pressed() {
                let now = s.now_ms();
                let _ = s.perf_pointer.up(now);
            }
            s.hover_at(None);
        });
    };

    let on_wheel = move |ev: WheelEvent| {
        ev.prevent_default();
        let anchor = pointer(&ev);
        let factor = wheel_factor(&ev);
        ui.state.update_value(|s| {
            s.perf_transition = None;
            s.perf_zoom = s.perf_zoom.zoom_at(anchor, factor, ZoomExtent::SCATTER);
        });
        Ui::bump(ui.perf_frame);
    };

    view! {
        <div class="performance-view">
            <div class="view-toolbar">
                {move || {
                    let (metric, s) = summary();
                    view! {
                        <span class="summary">
                            <b>{metric}</b>
                            " top " {s.top}
                            " · avg " {s.average}
                        </span>
                    }
                }}
                <label class="toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || split.get()
                        on:change=on_toggle_split
                    />
                    " Split by island"
                </label>
            </div>
            <div class="scroll">
                <canvas
                    class="performance-canvas"
                    node_ref=canvas_ref
                    on:mousedown=on_down
                    on:mousemove=on_move
                    on:mouseup=on_up
                    on:mouseleave=on_leave
                    on:wheel=on_wheel
                ></canvas>
            </div>
        </div>
    }
}
