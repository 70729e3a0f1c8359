use evoview::list::{ListModel, ListQuery, ListRow, ListSort};
use evoview::scaling::Rgb;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use super::{storage, Ui};
use crate::ui_model::SummaryText;

const LIGHT_TEXT_BELOW_LUMA: u32 = 140_000;

fn row_dom_id(index: usize) -> String {
    format!("evoview-row-{index}")
}

fn scroll_row_into_view(index: usize) {
    let Some(el) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(&row_dom_id(index)))
    else {
        return;
    };
    let opts = web_sys::ScrollIntoViewOptions::new();
    opts.set_behavior(web_sys::ScrollBehavior::Smooth);
    opts.set_block(web_sys::ScrollLogicalPosition::Center);
    if let Ok(el) = el.dyn_into::<web_sys::HtmlElement>() {
        el.scroll_into_view_with_scroll_into_view_options(&opts);
    }
}

#[component]
pub(super) fn ListView(ui: Ui) -> impl IntoView {
    let search = RwSignal::new(String::new());
    let sort = RwSignal::new(ui.state.with_value(|s| s.prefs.sort()));

    let model = move || {
        ui.revision.track();
        let query = ListQuery::new(search.get(), sort.get());
        ui.state.with_value(|s| {
            let model = ListModel::build(&s.store, &query);
            let backgrounds = model.backgrounds(s.store.snapshot(), &s.store.metric_scale(), s.store.theme());
            (model, backgrounds)
        })
    };

    // Reveal: make sure the row survives the search filter, then scroll once it is rendered.
    Effect::new(move |_| {
        let Some(id) = ui.list_reveal.get() else {
            return;
        };
        ui.list_reveal.set(None);
        let query = ListQuery::new(search.get_untracked(), sort.get_untracked());
        let found = ui.state.with_value(|s| {
            let snapshot = s.store.snapshot();
            let index = snapshot.index_of(&id)?;
            Some((index, snapshot.program_at(index).is_some_and(|p| query.matches(p))))
        });
        let Some((index, visible)) = found else {
            return;
        };
        if !visible {
            search.set(String::new());
        }
        request_animation_frame(move || scroll_row_into_view(index));
    });

    let on_sort = move |ev: leptos::ev::Event| {
        let v = event_target_value(&ev);
        let next = ListSort::from_value(&v).unwrap_or_default();
        ui.state.update_value(|s| {
            s.prefs.list_sort = next.value().to_string();
            storage::save_prefs(&s.prefs);
        });
        sort.set(next);
    };

    let select = move |id: String| {
        ui.state.update_value(|s| {
            if let Err(e) = s.nav.select(&mut s.store, &id) {
                super::console_warn(&e.to_string());
            }
        });
    };

    let follow_parent = move |id: String| {
        ui.state.update_value(|s| s.select_and_reveal(&id));
    };

    let render_row = move |row: ListRow, bg: Rgb| {
        let text = if bg.luma() < LIGHT_TEXT_BELOW_LUMA { "#f5f5f5" } else { "#111111" };
        let style = format!("background: {}; color: {text};", bg.to_css());
        let class = match (row.selected, row.highlighted) {
            (true, _) => "list-row selected",
            (false, true) => "list-row highlighted",
            _ => "list-row",
        };
        let id = row.id.clone();
        let fitness = format!("height: {}%;", row.fitness_percent());
        let island = row.island.map_or_else(|| "–".to_string(), |i| i.to_string());
        let parent = match (row.parent_id.clone(), row.parent_present) {
            (Some(pid), true) => {
                let target = pid.clone();
                view! {
                    <a
                        class="parent-link"
                        href="#"
                        on:click=move |ev| {
                            ev.prevent_default();
                            ev.stop_propagation();
                            follow_parent(target.clone());
                        }
                    >
                        {pid}
                    </a>
                }
                .into_any()
            }
            (Some(pid), false) => view! { <span class="subtle">{pid}</span> }.into_any(),
            (None, _) => view! { <span class="subtle">"–"</span> }.into_any(),
        };
        let metrics = row
            .metrics
            .into_iter()
            .map(|cell| {
                let width = format!("width: {}%;", evoview::fmt::percent(cell.fill));
                view! {
                    <div class="metric-cell">
                        <span class="metric-name">{cell.name}</span>
                        <span class="metric-value">{cell.display}</span>
                        <div class="metric-bar"><div class="metric-bar-fill" style=width></div></div>
                    </div>
                }
            })
            .collect_view();

        view! {
            <div id=row_dom_id(row.index) class=class style=style on:click=move |_| select(id.clone())>
                <div class="fitness-bar"><div class="fitness-bar-fill" style=fitness></div></div>
                <div class="row-info">
                    <div class="row-id">{row.id}</div>
                    <div>"Gen " {row.generation} " · Island " {island}</div>
                    <div>"Parent: " {parent}</div>
                </div>
                <div class="row-metrics">{metrics}</div>
            </div>
        }
    };

    view! {
        <div class="list-view">
            <div class="view-toolbar">
                <input
                    type="search"
                    placeholder="Search id…"
                    prop:value=move || search.get()
                    on:input=move |ev| search.set(event_target_value(&ev))
                />
                <select on:change=on_sort prop:value=move || sort.get().value().to_string()>
                    {ListSort::all()
                        .iter()
                        .map(|s| view! { <option value=s.value()>{s.label()}</option> })
                        .collect_view()}
                </select>
            </div>
            {move || {
                let (model, backgrounds) = model();
                let summary = SummaryText::from(&model.summary);
                let rows = model
                    .rows
                    .into_iter()
                    .zip(backgrounds)
                    .map(|(row, bg)| render_row(row, bg))
                    .collect_view();
                view! {
                    <div class="list-summary">
                        "Top " {summary.top} " · Average " {summary.average}
                        <span class="subtle">
                            " · range " {summary.min} "–" {summary.max}
                        </span>
                    </div>
                    <div class="list-rows">{rows}</div>
                }
            }}
        </div>
    }
}
