//! Metric → visual encodings shared by every view.
//!
//! All ranges are taken over the full snapshot, never over a filtered subset, and
//! values are clamped into the range before mapping.

use crate::config::DashboardConfig;
use crate::model::{Program, Snapshot};
use crate::theme::Theme;

/// Ten-color categorical palette; islands index it modulo its length.
pub const ISLAND_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const GRAY_LIGHT: (f64, f64) = (120.0, 230.0);
const GRAY_DARK: (f64, f64) = (40.0, 120.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl Default for MetricRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl MetricRange {
    /// Range of finite values of `metric` over every program; `[0, 1]` when none exist.
    pub fn over(snapshot: &Snapshot, metric: &str) -> Self {
        Self::from_values(snapshot.programs().iter().filter_map(|p| p.metric(metric)))
    }

    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut range: Option<(f64, f64)> = None;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        range.map_or_else(Self::default, |(min, max)| Self { min, max })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Position of `v` inside the range, clamped to `[0, 1]`; `None` when degenerate,
    /// inverted or not finite.
    pub fn unit(&self, v: f64) -> Option<f64> {
        let usable = self.min.is_finite() && self.max.is_finite() && self.min < self.max;
        if !usable || v.is_nan() {
            return None;
        }
        let v = v.clamp(self.min, self.max);
        Some((v - self.min) / (self.max - self.min))
    }
}

/// Clamped share of a bar to fill; 0 when the range is degenerate or `value` is unset.
pub fn bar_fill(value: Option<f64>, min: f64, max: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => MetricRange { min, max }.unit(v).unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_css(self) -> String {
        format!("rgb({},{},{})", self.0, self.1, self.2)
    }

    /// Perceived lightness, used to order shades.
    pub fn luma(self) -> u32 {
        299 * self.0 as u32 + 587 * self.1 as u32 + 114 * self.2 as u32
    }
}

/// Gray for a unit position; higher is lighter. `None` gets the darkest shade.
pub fn gray_for(unit: Option<f64>, theme: Theme) -> Rgb {
    let (lo, hi) = match theme {
        Theme::Light => GRAY_LIGHT,
        Theme::Dark => GRAY_DARK,
    };
    let g = match unit {
        Some(t) => (lo + t.clamp(0.0, 1.0) * (hi - lo)).round() as u8,
        None => lo as u8,
    };
    match theme {
        Theme::Light => Rgb(g, g, g),
        Theme::Dark => Rgb(g, g.saturating_add(10), g.saturating_add(20)),
    }
}

/// Fill color of a program's circle: its island's palette entry.
pub fn island_color(island: Option<u32>, theme: Theme) -> &'static str {
    match island {
        Some(i) => ISLAND_PALETTE[i as usize % ISLAND_PALETTE.len()],
        None => theme.node_default_fill(),
    }
}

/// Scaling of one metric over one snapshot.
#[derive(Debug, Clone)]
pub struct MetricScale {
    metric: String,
    range: MetricRange,
    radius_min: f64,
    radius_max: f64,
}

impl MetricScale {
    pub fn new(snapshot: &Snapshot, metric: &str, config: &DashboardConfig) -> Self {
        Self {
            metric: metric.to_string(),
            range: MetricRange::over(snapshot, metric),
            radius_min: config.radius_min,
            radius_max: config.radius_max,
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn range(&self) -> MetricRange {
        self.range
    }

    /// Radius used for programs without a finite value.
    pub fn unknown_radius(&self) -> f64 {
        self.radius_min / 2.0
    }

    pub fn radius_for(&self, value: Option<f64>) -> f64 {
        match value.filter(|v| v.is_finite()) {
            None => self.unknown_radius(),
            Some(v) => match self.range.unit(v) {
                Some(t) => self.radius_min + t * (self.radius_max - self.radius_min),
                None => (self.radius_min + self.radius_max) / 2.0,
            },
        }
    }

    pub fn radius(&self, program: &Program) -> f64 {
        self.radius_for(program.metric(&self.metric))
    }

    pub fn gray_shade_for(&self, value: Option<f64>, theme: Theme) -> Rgb {
        let unit = value
            .filter(|v| v.is_finite())
            .map(|v| self.range.unit(v).unwrap_or(0.5));
        gray_for(unit, theme)
    }

    pub fn gray_shade(&self, program: &Program, theme: Theme) -> Rgb {
        self.gray_shade_for(program.metric(&self.metric), theme)
    }

    pub fn bar_fill(&self, program: &Program) -> f64 {
        bar_fill(program.metric(&self.metric), self.range.min, self.range.max)
    }
}

/// Outline of a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: &'static str,
    pub width: f64,
}

impl StrokeStyle {
    pub const HOVER: StrokeStyle = StrokeStyle {
        color: "#FFD600",
        width: 4.0,
    };
    pub const SELECTED: StrokeStyle = StrokeStyle {
        color: "red",
        width: 3.0,
    };
    pub const HIGHLIGHTED: StrokeStyle = StrokeStyle {
        color: "#2196f3",
        width: 2.0,
    };

    /// Hover beats selection, selection beats highlight.
    pub fn resolve(theme: Theme, hovered: bool, selected: bool, highlighted: bool) -> Self {
        if hovered {
            Self::HOVER
        } else if selected {
            Self::SELECTED
        } else if highlighted {
            Self::HIGHLIGHTED
        } else {
            StrokeStyle {
                color: theme.node_stroke(),
                width: 1.5,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_over(values: &[f64]) -> MetricScale {
        let programs = values
            .iter()
            .enumerate()
            .map(|(i, v)| Program::new(format!("p{i}"), 0).with_metric("m", *v))
            .collect();
        let s = Snapshot::new(programs, Vec::<String>::new(), "");
        MetricScale::new(&s, "m", &DashboardConfig::default())
    }

    #[test]
    fn radius_is_monotonic_and_bounded() {
        let scale = scale_over(&[0.0, 0.25, 0.5, 1.0]);
        let mut last = 0.0;
        for i in 0..=20 {
            let r = scale.radius_for(Some(i as f64 / 20.0));
            assert!(r >= last);
            assert!((10.0..=32.0).contains(&r));
            last = r;
        }
        assert_eq!(scale.radius_for(Some(1.0)), 32.0);
        assert_eq!(scale.radius_for(Some(5.0)), 32.0);
        assert_eq!(scale.radius_for(None), 5.0);
        assert_eq!(scale.radius_for(Some(f64::NAN)), 5.0);
    }

    #[test]
    fn gray_gets_lighter_with_higher_values() {
        let scale = scale_over(&[-3.0, 7.0]);
        for theme in [Theme::Light, Theme::Dark] {
            let mut last = 0;
            for i in 0..=10 {
                let luma = scale.gray_shade_for(Some(-3.0 + i as f64), theme).luma();
                assert!(luma >= last);
                last = luma;
            }
            let unknown = scale.gray_shade_for(None, theme);
            let lowest = scale.gray_shade_for(Some(-3.0), theme);
            assert_eq!(unknown, lowest);
        }
        assert_eq!(scale.gray_shade_for(Some(7.0), Theme::Light), Rgb(230, 230, 230));
        assert_eq!(scale.gray_shade_for(Some(7.0), Theme::Dark), Rgb(120, 130, 140));
    }

    #[test]
    fn uniform_population_maps_to_midpoints() {
        let scale = scale_over(&[0.4, 0.4, 0.4]);
        assert!(scale.range().is_degenerate());
        assert_eq!(scale.radius_for(Some(0.4)), 21.0);
        assert_eq!(scale.gray_shade_for(Some(0.4), Theme::Light), Rgb(175, 175, 175));
        assert_eq!(bar_fill(Some(0.4), 0.4, 0.4), 0.0);
    }

    #[test]
    fn outlier_saturates_alone() {
        let scale = scale_over(&[0.1, 0.2, 0.3, 100.0]);
        let a = scale.radius_for(Some(0.1));
        let b = scale.radius_for(Some(0.3));
        assert!(b > a);
        assert_eq!(scale.radius_for(Some(100.0)), 32.0);
    }

    #[test]
    fn empty_range_defaults_to_unit_interval() {
        let s = Snapshot::new(vec![Program::new("x", 0)], Vec::<String>::new(), "");
        assert_eq!(MetricRange::over(&s, "m"), MetricRange { min: 0.0, max: 1.0 });
    }

    #[test]
    fn bar_fill_clamps() {
        assert_eq!(bar_fill(Some(-1.0), 0.0, 2.0), 0.0);
        assert_eq!(bar_fill(Some(1.0), 0.0, 2.0), 0.5);
        assert_eq!(bar_fill(Some(9.0), 0.0, 2.0), 1.0);
        assert_eq!(bar_fill(None, 0.0, 2.0), 0.0);
    }

    #[test]
    fn bar_fill_tolerates_bad_bounds() {
        assert_eq!(bar_fill(Some(1.0), 2.0, 0.0), 0.0);
        assert_eq!(bar_fill(Some(1.0), f64::NAN, 2.0), 0.0);
        assert_eq!(bar_fill(Some(1.0), 0.0, f64::INFINITY), 0.0);
        assert_eq!(MetricRange { min: 3.0, max: 1.0 }.unit(2.0), None);
    }

    #[test]
    fn island_palette_wraps() {
        assert_eq!(island_color(Some(0), Theme::Light), "#1f77b4");
        assert_eq!(island_color(Some(13), Theme::Light), ISLAND_PALETTE[3]);
        assert_eq!(island_color(None, Theme::Dark), Theme::Dark.node_default_fill());
    }

    #[test]
    fn stroke_precedence() {
        let t = Theme::Light;
        assert_eq!(StrokeStyle::resolve(t, true, true, true), StrokeStyle::HOVER);
        assert_eq!(StrokeStyle::resolve(t, false, true, true), StrokeStyle::SELECTED);
        assert_eq!(StrokeStyle::resolve(t, false, false, true), StrokeStyle::HIGHLIGHTED);
        assert_eq!(StrokeStyle::resolve(t, false, false, false).width, 1.5);
    }
}
