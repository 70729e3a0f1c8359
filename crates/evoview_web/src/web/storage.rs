use evoview::list::ListSort;
use evoview::theme::Theme;
use serde::{Deserialize, Serialize};

const LOCALSTORAGE_THEME_KEY: &str = "theme";
const LOCALSTORAGE_PREFS_KEY: &str = "evoview.prefs.v1";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(super) fn local_storage_get_string(key: &str) -> Option<String> {
    local_storage().and_then(|s| s.get_item(key).ok().flatten())
}

pub(super) fn local_storage_set_string(key: &str, value: &str) {
    if let Some(s) = local_storage() {
        let _ = s.set_item(key, value);
    }
}

fn platform_prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .is_some_and(|mq| mq.matches())
}

/// Persisted choice first, then `prefers-color-scheme`.
pub(super) fn initial_theme() -> Theme {
    let persisted = local_storage_get_string(LOCALSTORAGE_THEME_KEY);
    Theme::resolve_initial(persisted.as_deref(), platform_prefers_dark())
}

pub(super) fn save_theme(theme: Theme) {
    local_storage_set_string(LOCALSTORAGE_THEME_KEY, theme.as_attr());
}

pub(super) fn apply_theme_to_document(theme: Theme) {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(el) = doc.document_element() else {
        return;
    };
    let _ = el.set_attribute("data-theme", theme.as_attr());
}

/// View preferences that survive a reload. The theme is stored separately under the
/// plain `theme` key so a static page can apply it before the wasm module loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct PersistedPrefs {
    #[serde(default)]
    pub(super) split_islands: bool,
    #[serde(default = "default_sort")]
    pub(super) list_sort: String,
}

fn default_sort() -> String {
    ListSort::default().value().to_string()
}

impl Default for PersistedPrefs {
    fn default() -> Self {
        Self {
            split_islands: false,
            list_sort: default_sort(),
        }
    }
}

impl PersistedPrefs {
    pub(super) fn sort(&self) -> ListSort {
        ListSort::from_value(&self.list_sort).unwrap_or_default()
    }
}

pub(super) fn load_prefs() -> PersistedPrefs {
    local_storage_get_string(LOCALSTORAGE_PREFS_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub(super) fn save_prefs(prefs: &PersistedPrefs) {
    if let Ok(raw) = serde_json::to_string(prefs) {
        local_storage_set_string(LOCALSTORAGE_PREFS_KEY, &raw);
    }
}
