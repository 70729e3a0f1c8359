use evoview::sidebar::SidebarModel;
use leptos::prelude::*;

use super::Ui;

/// Details of the relevant program. Tab choice is remembered per program id.
#[component]
pub(super) fn Sidebar(ui: Ui) -> impl IntoView {
    let tab = RwSignal::new((String::new(), 0usize));

    let model = move || {
        ui.revision.track();
        let mut model = ui.state.with_value(|s| SidebarModel::from_store(&s.store))?;
        let (id, index) = tab.get();
        if id == model.id {
            model.select_tab(index);
        }
        Some(model)
    };

    let close = move |_: leptos::ev::MouseEvent| {
        ui.state.update_value(|s| s.nav.clear_selection(&mut s.store));
    };

    view! {
        <aside class="sidebar">
            {move || match model() {
                None => view! { <div class="sidebar-empty subtle">"Hover or click a program"</div> }.into_any(),
                Some(m) => {
                    let star = if m.in_archive { "★ " } else { "" };
                    let island = m.island.map_or_else(|| "–".to_string(), |i| i.to_string());
                    let parent = match m.parent_link().map(str::to_string) {
                        Some(pid) => {
                            let target = pid.clone();
                            let parent_island = m
                                .parent_island
                                .map(|i| format!(" (island {i})"))
                                .unwrap_or_default();
                            view! {
                                <a
                                    href="#"
                                    class="parent-link"
                                    on:click=move |ev| {
                                        ev.prevent_default();
                                        ui.state.update_value(|s| s.select_and_reveal(&target));
                                    }
                                >
                                    {pid}
                                </a>
                                {parent_island}
                            }
                            .into_any()
                        }
                        None => view! { <span class="subtle">{m.parent_id.clone().unwrap_or_else(|| "–".to_string())}</span> }.into_any(),
                    };
                    let metrics = m
                        .metrics
                        .iter()
                        .map(|(k, v)| view! { <tr><td>{k.clone()}</td><td>{v.clone()}</td></tr> })
                        .collect_view();
                    let id = m.id.clone();
                    let tabs = m
                        .tabs
                        .iter()
                        .enumerate()
                        .map(|(i, t)| {
                            let class = if i == m.active_tab { "tab active" } else { "tab" };
                            let id = id.clone();
                            view! {
                                <button class=class on:click=move |_| tab.set((id.clone(), i))>
                                    {t.label().to_string()}
                                </button>
                            }
                        })
                        .collect_view();
                    let content = m.active_content().map(str::to_string);

                    view! {
                        <div class="sidebar-header">
                            <h2>{star}{m.id.clone()}</h2>
                            <button class="icon-btn" title="Close" on:click=close>"×"</button>
                        </div>
                        <a href=m.detail_url.clone() target="_blank" rel="noopener">"[open in new window]"</a>
                        <div>"Generation: " {m.generation}</div>
                        <div>"Island: " {island}</div>
                        <div>"Parent: " {parent}</div>
                        <table class="metrics">{metrics}</table>
                        {(!m.tabs.is_empty()).then(|| view! { <div class="tabs">{tabs}</div> })}
                        {content.map(|text| view! { <pre class="tab-content">{text}</pre> })}
                    }
                    .into_any()
                }
            }}
        </aside>
    }
}
