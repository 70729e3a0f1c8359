use evoview::geom::{Point, ZoomExtent};
use leptos::ev::{MouseEvent, WheelEvent};
use leptos::html::Canvas;
use leptos::prelude::*;

use super::{canvas, console_warn, Ui};
use crate::ui_model::Gesture;

pub(super) fn pointer(ev: &MouseEvent) -> Point {
    Point::new(ev.offset_x() as f64, ev.offset_y() as f64)
}

/// d3-zoom's wheel step: one notch of 100px halves or doubles in about five notches.
pub(super) fn wheel_factor(ev: &WheelEvent) -> f64 {
    let scale = if ev.delta_mode() == 1 { 0.05 } else { 0.002 };
    2f64.powf(-ev.delta_y() * scale)
}

/// Lineage graph: force-laid-out circles, drag to pin, wheel to zoom, drag background to pan.
#[component]
pub(super) fn GraphView(ui: Ui) -> impl IntoView {
    let canvas_ref = NodeRef::<Canvas>::new();

    Effect::new(move |_| {
        ui.revision.track();
        ui.graph_frame.track();
        let Some(el) = canvas_ref.get() else {
            return;
        };
        ui.state.with_value(|s| {
            canvas::fit_canvas(&el, s.viewport.0, s.viewport.1);
            if let Err(e) = canvas::draw_graph(&el, s) {
                console_warn(&e);
            }
        });
    });

    Effect::new(move |_| {
        if let Some(index) = ui.graph_reveal.get() {
            ui.state.update_value(|s| s.center_graph_on(index));
            ui.graph_reveal.set(None);
        }
    });

    let on_down = move |ev: MouseEvent| {
        let at = pointer(&ev);
        ui.state.update_value(|s| {
            let hit = s.layout.hit_test(at, &s.graph_zoom);
            s.graph_pointer.down(at, hit);
        });
    };

    let on_move = move |ev: MouseEvent| {
        let at = pointer(&ev);
        let mut panned = false;
        ui.state.update_value(|s| {
            if !s.graph_pointer.is_pressed() {
                let hit = s.layout.hit_test(at, &s.graph_zoom);
                s.hover_at(hit);
                return;
            }
            let world = s.graph_zoom.invert(at);
            match s.graph_pointer.moved(at, world) {
                Gesture::DragStart(i) => s.layout.drag_start(i),
                Gesture::DragMove(i, world) => s.layout.drag_to(i, world),
                Gesture::Pan(dx, dy) => {
                    s.graph_transition = None;
                    s.graph_zoom = s.graph_zoom.translate_by(dx, dy);
                    panned = true;
                }
                _ => {}
            }
        });
        if panned {
            Ui::bump(ui.graph_frame);
        }
    };

    let on_up = move |_: MouseEvent| {
        let mut open = None;
        ui.state.update_value(|s| {
            let now = s.now_ms();
            match s.graph_pointer.up(now) {
                Gesture::DragEnd(i) => s.layout.drag_end(i),
                gesture => open = s.apply_click(gesture),
            }
        });
        if let Some(url) = open {
            Ui::open_detail(&url);
        }
    };

    let on_leave = move |_: MouseEvent| {
        ui.state.update_value(|s| {
            if s.graph_pointer.is_pressed() {
                let now = s.now_ms();
                if let Gesture::DragEnd(i) = s.graph_pointer.up(now) {
                    s.layout.drag_end(i);
                }
            }
            s.hover_at(None);
        });
    };

    let on_wheel = move |ev: WheelEvent| {
        ev.prevent_default();
        let anchor = Point::new(ev.offset_x() as f64, ev.offset_y() as f64);
        let factor = wheel_factor(&ev);
        ui.state.update_value(|s| {
            s.graph_transition = None;
            s.graph_zoom = s.graph_zoom.zoom_at(anchor, factor, ZoomExtent::GRAPH);
        });
        Ui::bump(ui.graph_frame);
    };

    view! {
        <canvas
            class="graph-canvas"
            node_ref=canvas_ref
            on:mousedown=on_down
            on:mousemove=on_move
            on:mouseup=on_up
            on:mouseleave=on_leave
            on:wheel=on_wheel
        ></canvas>
    }
}
