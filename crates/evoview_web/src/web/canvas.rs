use std::f64::consts::PI;

use evoview::fmt::fixed;
use evoview::geom::ZoomTransform;
use evoview::scaling::{island_color, StrokeStyle};
use evoview::scatter::{ScatterLayout, MARGINS};
use evoview::theme::Theme;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::AppState;

pub(super) fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
    canvas
        .get_context("2d")
        .map_err(|_| "canvas: get_context threw".to_string())?
        .ok_or("canvas: missing 2d context".to_string())?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| "canvas: context is not 2d".to_string())
}

/// Resize the backing store only when it changed; assigning clears the canvas.
pub(super) fn fit_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64) {
    let (w, h) = (width.round() as u32, height.round() as u32);
    if canvas.width() != w {
        canvas.set_width(w);
    }
    if canvas.height() != h {
        canvas.set_height(h);
    }
}

fn clear(ctx: &CanvasRenderingContext2d, canvas: &HtmlCanvasElement, theme: Theme) {
    ctx.set_fill_style_str(theme.canvas_background());
    ctx.fill_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
}

fn apply_transform(ctx: &CanvasRenderingContext2d, t: &ZoomTransform) -> Result<(), String> {
    ctx.translate(t.x, t.y).map_err(|_| "canvas: translate threw".to_string())?;
    ctx.scale(t.k, t.k).map_err(|_| "canvas: scale threw".to_string())
}

struct Circle<'a> {
    x: f64,
    y: f64,
    r: f64,
    fill: &'a str,
    stroke: StrokeStyle,
}

fn draw_circle(ctx: &CanvasRenderingContext2d, c: &Circle<'_>) {
    ctx.begin_path();
    ctx.arc(c.x, c.y, c.r.max(0.5), 0.0, PI * 2.0).ok();
    ctx.set_fill_style_str(c.fill);
    ctx.fill();
    ctx.set_stroke_style_str(c.stroke.color);
    ctx.set_line_width(c.stroke.width);
    ctx.stroke();
}

/// Edges, then circles in snapshot order so later programs paint on top (matches hit testing).
pub(super) fn draw_graph(canvas: &HtmlCanvasElement, s: &AppState) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    let store = &s.store;
    let theme = store.theme();
    let snapshot = store.snapshot();
    let nodes = s.layout.nodes();

    clear(&ctx, canvas, theme);
    if nodes.len() != snapshot.len() {
        return Ok(());
    }

    ctx.save();
    apply_transform(&ctx, &s.graph_zoom)?;

    ctx.set_stroke_style_str(theme.edge_stroke());
    ctx.set_global_alpha(0.6);
    ctx.set_line_width(1.5);
    for e in snapshot.edges() {
        let (a, b) = (nodes[e.parent].pos, nodes[e.child].pos);
        ctx.begin_path();
        ctx.move_to(a.x, a.y);
        ctx.line_to(b.x, b.y);
        ctx.stroke();
    }
    ctx.set_global_alpha(1.0);

    let highlighted = store.highlight_set();
    for (node, program) in nodes.iter().zip(snapshot.programs()) {
        let id = program.id.as_str();
        let stroke = StrokeStyle::resolve(
            theme,
            store.hovered() == Some(id),
            store.selection() == Some(id),
            highlighted.contains(id),
        );
        draw_circle(
            &ctx,
            &Circle {
                x: node.pos.x,
                y: node.pos.y,
                r: node.radius,
                fill: island_color(program.island, theme),
                stroke,
            },
        );
    }

    ctx.restore();
    Ok(())
}

pub(super) fn draw_scatter(canvas: &HtmlCanvasElement, s: &AppState) -> Result<(), String> {
    let Some(layout) = s.scatter.as_ref() else {
        return Ok(());
    };
    let ctx = context_2d(canvas)?;
    let store = &s.store;
    let theme = store.theme();
    let snapshot = store.snapshot();

    clear(&ctx, canvas, theme);
    ctx.save();
    apply_transform(&ctx, &s.perf_zoom)?;

    draw_axes(&ctx, layout, store.active_metric(), theme);

    ctx.set_stroke_style_str(theme.edge_stroke());
    ctx.set_global_alpha(0.5);
    ctx.set_line_width(1.0);
    for (a, b) in layout.segments() {
        ctx.begin_path();
        ctx.move_to(a.x, a.y);
        ctx.line_to(b.x, b.y);
        ctx.stroke();
    }
    ctx.set_global_alpha(1.0);

    let highlighted = store.highlight_set();
    for (point, program) in layout.points.iter().zip(snapshot.programs()) {
        let id = program.id.as_str();
        let stroke = StrokeStyle::resolve(
            theme,
            store.hovered() == Some(id),
            store.selection() == Some(id),
            highlighted.contains(id),
        );
        draw_circle(
            &ctx,
            &Circle {
                x: point.pos.x,
                y: point.pos.y,
                r: point.radius,
                fill: island_color(program.island, theme),
                stroke,
            },
        );
    }

    ctx.restore();
    Ok(())
}

fn tick_label(v: f64) -> String {
    let s = fixed(v, 4);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn draw_axes(ctx: &CanvasRenderingContext2d, layout: &ScatterLayout, metric: &str, theme: Theme) {
    let m = MARGINS;
    let axis = theme.axis_text();
    ctx.set_stroke_style_str(axis);
    ctx.set_fill_style_str(axis);
    ctx.set_line_width(1.0);
    ctx.set_font("11px sans-serif");

    // Shared x axis along the top.
    let (x0, x1) = layout.x.range;
    ctx.begin_path();
    ctx.move_to(x0, m.top);
    ctx.line_to(x1, m.top);
    ctx.stroke();
    ctx.set_text_align("center");
    for t in layout.x.ticks(10) {
        let x = layout.x.map(t);
        ctx.begin_path();
        ctx.move_to(x, m.top);
        ctx.line_to(x, m.top - 6.0);
        ctx.stroke();
        ctx.fill_text(&tick_label(t), x, m.top - 9.0).ok();
    }
    ctx.fill_text(metric, (x0 + x1) / 2.0, m.top - 28.0).ok();

    // One y axis per band.
    let axis_x = x0 - 10.0;
    for band in &layout.bands {
        let (y0, y1) = band.y.range;
        ctx.begin_path();
        ctx.move_to(axis_x, y0);
        ctx.line_to(axis_x, y1);
        ctx.stroke();
        ctx.set_text_align("right");
        let generations = (band.y.domain.1 - band.y.domain.0).max(1.0) as usize;
        for t in band.y.ticks(generations.min(12)) {
            let y = band.y.map(t);
            ctx.begin_path();
            ctx.move_to(axis_x, y);
            ctx.line_to(axis_x - 6.0, y);
            ctx.stroke();
            ctx.fill_text(&tick_label(t), axis_x - 8.0, y + 4.0).ok();
        }
        if let Some(island) = band.island {
            ctx.set_text_align("left");
            ctx.fill_text(&format!("Island {island}"), x0, band.top + 14.0).ok();
        }
    }

    if let Some(lane) = layout.nan_lane {
        ctx.set_global_alpha(0.6);
        ctx.stroke_rect(lane.left, lane.top, lane.width, lane.bottom - lane.top);
        ctx.set_global_alpha(1.0);
        ctx.set_text_align("center");
        ctx.fill_text("NaN", lane.center_x(), lane.top - 9.0).ok();
    }
    ctx.set_text_align("start");
}
