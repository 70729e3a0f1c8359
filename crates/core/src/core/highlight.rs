use hashbrown::HashSet;

use crate::model::Snapshot;

pub type HighlightSet = HashSet<String>;

/// Which programs the views should visually emphasize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightFilter {
    #[default]
    None,
    TopByMetric,
    FirstGeneration,
    Failed,
    MetricUnset,
    InArchive,
}

impl HighlightFilter {
    /// Stable option value used by selects, URLs and the CLI.
    pub fn value(self) -> &'static str {
        match self {
            HighlightFilter::None => "",
            HighlightFilter::TopByMetric => "top",
            HighlightFilter::FirstGeneration => "first",
            HighlightFilter::Failed => "failed",
            HighlightFilter::MetricUnset => "unset",
            HighlightFilter::InArchive => "archive",
        }
    }

    pub fn from_value(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(HighlightFilter::None),
            "top" => Some(HighlightFilter::TopByMetric),
            "first" => Some(HighlightFilter::FirstGeneration),
            "failed" => Some(HighlightFilter::Failed),
            "unset" => Some(HighlightFilter::MetricUnset),
            "archive" => Some(HighlightFilter::InArchive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HighlightFilter::None => "No highlight",
            HighlightFilter::TopByMetric => "Top score",
            HighlightFilter::FirstGeneration => "First generation",
            HighlightFilter::Failed => "Failed",
            HighlightFilter::MetricUnset => "Metric unset",
            HighlightFilter::InArchive => "MAP-Elites archive",
        }
    }

    pub fn all() -> &'static [HighlightFilter] {
        &[
            HighlightFilter::None,
            HighlightFilter::TopByMetric,
            HighlightFilter::FirstGeneration,
            HighlightFilter::Failed,
            HighlightFilter::MetricUnset,
            HighlightFilter::InArchive,
        ]
    }
}

/// Ids of the programs to emphasize under `filter`.
///
/// - `TopByMetric`: every program tied at the maximum finite value of `metric` (exact
///   equality). With no finite value anywhere the best is `-inf` and nothing matches.
/// - `FirstGeneration`: generation 0.
/// - `Failed`: a metric literally named `error` is present and non-null.
/// - `MetricUnset`: no metrics, or no finite value for `metric`. An unknown metric
///   therefore marks everyone.
/// - `InArchive`: member of the snapshot's archive.
pub fn compute_highlight_set(snapshot: &Snapshot, filter: HighlightFilter, metric: &str) -> HighlightSet {
    let programs = snapshot.programs();
    match filter {
        HighlightFilter::None => HighlightSet::new(),
        HighlightFilter::TopByMetric => {
            let best = programs
                .iter()
                .filter_map(|p| p.metric(metric))
                .fold(f64::NEG_INFINITY, f64::max);
            programs
                .iter()
                .filter(|p| p.metric(metric) == Some(best))
                .map(|p| p.id.clone())
                .collect()
        }
        HighlightFilter::FirstGeneration => programs
            .iter()
            .filter(|p| p.generation == 0)
            .map(|p| p.id.clone())
            .collect(),
        HighlightFilter::Failed => programs
            .iter()
            .filter(|p| p.metric_value("error").is_some_and(|v| v.is_present()))
            .map(|p| p.id.clone())
            .collect(),
        HighlightFilter::MetricUnset => programs
            .iter()
            .filter(|p| p.metric(metric).is_none())
            .map(|p| p.id.clone())
            .collect(),
        HighlightFilter::InArchive => programs
            .iter()
            .filter(|p| snapshot.in_archive(&p.id))
            .map(|p| p.id.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricValue, Program};

    fn population() -> Snapshot {
        Snapshot::new(
            vec![
                Program::new("a", 0).with_metric("score", 0.2),
                Program::new("b", 1).with_metric("score", 0.9),
                Program::new("c", 1).with_metric("score", 0.9),
                Program::new("d", 2).with_metric("score", f64::NAN),
                Program::new("e", 2)
                    .with_metric("score", 0.1)
                    .with_metric_value("error", MetricValue::Text("timeout".into())),
                Program::new("f", 3).with_metric_value("error", MetricValue::Missing),
                Program::new("g", 0),
            ],
            ["c", "g", "ghost"],
            "",
        )
    }

    fn ids(set: &HighlightSet) -> Vec<&str> {
        let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn top_includes_every_tie() {
        let s = population();
        let set = compute_highlight_set(&s, HighlightFilter::TopByMetric, "score");
        assert_eq!(ids(&set), vec!["b", "c"]);
    }

    #[test]
    fn top_of_unknown_metric_is_empty() {
        let s = population();
        assert!(compute_highlight_set(&s, HighlightFilter::TopByMetric, "nope").is_empty());
    }

    #[test]
    fn unset_counts_nan_and_missing_metrics() {
        let s = population();
        let set = compute_highlight_set(&s, HighlightFilter::MetricUnset, "score");
        assert_eq!(ids(&set), vec!["d", "f", "g"]);

        let all = compute_highlight_set(&s, HighlightFilter::MetricUnset, "nope");
        assert_eq!(all.len(), s.len());
    }

    #[test]
    fn failed_needs_non_null_error() {
        let s = population();
        let set = compute_highlight_set(&s, HighlightFilter::Failed, "score");
        assert_eq!(ids(&set), vec!["e"]);
    }

    #[test]
    fn first_generation_and_archive() {
        let s = population();
        assert_eq!(
            ids(&compute_highlight_set(&s, HighlightFilter::FirstGeneration, "score")),
            vec!["a", "g"]
        );
        // "ghost" is archived but absent from the snapshot.
        assert_eq!(
            ids(&compute_highlight_set(&s, HighlightFilter::InArchive, "score")),
            vec!["c", "g"]
        );
    }

    #[test]
    fn every_filter_is_idempotent_and_a_subset() {
        let s = population();
        for &filter in HighlightFilter::all() {
            let first = compute_highlight_set(&s, filter, "score");
            let second = compute_highlight_set(&s, filter, "score");
            assert_eq!(first, second);
            assert!(first.iter().all(|id| s.contains(id)));
        }
        assert!(compute_highlight_set(&s, HighlightFilter::None, "score").is_empty());
    }

    #[test]
    fn option_values_round_trip() {
        for &filter in HighlightFilter::all() {
            assert_eq!(HighlightFilter::from_value(filter.value()), Some(filter));
            assert!(!filter.label().is_empty());
        }
        assert_eq!(HighlightFilter::from_value("bogus"), None);
    }
}
