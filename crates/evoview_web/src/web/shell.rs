use evoview::highlight::HighlightFilter;
use evoview::nav::ViewKind;
use leptos::prelude::*;

use super::{console_warn, Ui};
use crate::ui_model::tab_icon;

#[component]
pub(super) fn Topbar(ui: Ui) -> impl IntoView {
    let read = move |f: fn(&super::AppState) -> String| {
        ui.revision.track();
        ui.state.with_value(f)
    };

    let active_view = move || {
        ui.revision.track();
        ui.state.with_value(|s| s.store.active_view())
    };
    let theme = move || {
        ui.revision.track();
        ui.state.with_value(|s| s.store.theme())
    };
    let metrics = move || {
        ui.revision.track();
        ui.state.with_value(|s| s.store.snapshot().metric_names().to_vec())
    };

    let switch_view = move |view: ViewKind| {
        ui.state.update_value(|s| {
            s.nav.switch_view(&mut s.store, view);
        });
    };

    let on_metric = move |ev: leptos::ev::Event| {
        let name = event_target_value(&ev);
        ui.state.update_value(|s| match s.store.set_active_metric(&name) {
            Ok(true) => s.sync_layout(),
            Ok(false) => {}
            Err(e) => console_warn(&e.to_string()),
        });
    };

    let on_highlight = move |ev: leptos::ev::Event| {
        let filter = HighlightFilter::from_value(&event_target_value(&ev)).unwrap_or_default();
        ui.state.update_value(|s| {
            s.store.set_highlight_filter(filter);
        });
    };

    let toggle_theme = move |_: leptos::ev::MouseEvent| {
        ui.state.update_value(|s| {
            let next = s.store.theme().toggle();
            s.store.set_theme(next);
        });
    };

    view! {
        <header class="app-header">
            <div class="app-header-left">
                <h1 class="brand">"evoview"</h1>
                <span class="subtle">{move || read(|s| s.store.snapshot().checkpoint_dir().to_string())}</span>
                <nav class="tabs">
                    {ViewKind::all()
                        .iter()
                        .map(|&view| {
                            view! {
                                <button
                                    class=move || if active_view() == view { "tab active" } else { "tab" }
                                    on:click=move |_| switch_view(view)
                                >
                                    {tab_icon(view)}" "{view.label()}
                                </button>
                            }
                        })
                        .collect_view()}
                </nav>
            </div>
            <div class="app-header-right">
                <label>
                    "Metric "
                    <select
                        on:change=on_metric
                        prop:value=move || read(|s| s.store.active_metric().to_string())
                    >
                        {move || {
                            metrics()
                                .into_iter()
                                .map(|m| view! { <option value=m.clone()>{m.clone()}</option> })
                                .collect_view()
                        }}
                    </select>
                </label>
                <label>
                    "Highlight "
                    <select
                        on:change=on_highlight
                        prop:value=move || read(|s| s.store.highlight_filter().value().to_string())
                    >
                        {HighlightFilter::all()
                            .iter()
                            .map(|f| view! { <option value=f.value()>{f.label()}</option> })
                            .collect_view()}
                    </select>
                </label>
                <span class="status">{move || ui.status.get()}</span>
                <button
                    class="btn sm ghost"
                    title=move || format!("Theme: {}", theme().label())
                    on:click=toggle_theme
                >
                    {move || theme().icon()}" "{move || theme().label()}
                </button>
            </div>
        </header>
    }
}
