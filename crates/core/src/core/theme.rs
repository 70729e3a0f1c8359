#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Value of the `data-theme` document attribute and of the persisted preference.
    pub fn as_attr(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_attr(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Theme::Light => "☀️",
            Theme::Dark => "🌙",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Theme at load: a persisted choice wins, otherwise the platform preference.
    pub fn resolve_initial(persisted: Option<&str>, platform_prefers_dark: bool) -> Self {
        persisted.and_then(Theme::from_attr).unwrap_or(if platform_prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        })
    }

    /// Neutral stroke for unselected, unhighlighted circles.
    pub fn node_stroke(self) -> &'static str {
        match self {
            Theme::Light => "#333333",
            Theme::Dark => "#d7dce5",
        }
    }

    /// Fill for programs that carry no island.
    pub fn node_default_fill(self) -> &'static str {
        match self {
            Theme::Light => "#ffffff",
            Theme::Dark => "#9aa4b2",
        }
    }

    pub fn edge_stroke(self) -> &'static str {
        match self {
            Theme::Light => "#999999",
            Theme::Dark => "#5b6473",
        }
    }

    pub fn canvas_background(self) -> &'static str {
        match self {
            Theme::Light => "#fafafa",
            Theme::Dark => "#0a0f1a",
        }
    }

    pub fn axis_text(self) -> &'static str {
        match self {
            Theme::Light => "#888888",
            Theme::Dark => "#9aa4b2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_theme_wins_over_platform() {
        assert_eq!(Theme::resolve_initial(Some("light"), true), Theme::Light);
        assert_eq!(Theme::resolve_initial(Some("DARK"), false), Theme::Dark);
    }

    #[test]
    fn garbage_preference_falls_back_to_platform() {
        assert_eq!(Theme::resolve_initial(Some("sepia"), true), Theme::Dark);
        assert_eq!(Theme::resolve_initial(None, false), Theme::Light);
    }

    #[test]
    fn toggle_round_trips_through_attr() {
        for t in [Theme::Light, Theme::Dark] {
            assert_eq!(Theme::from_attr(t.as_attr()), Some(t));
            assert_eq!(t.toggle().toggle(), t);
        }
    }
}
