use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::fmt;
use crate::highlight::HighlightSet;
use crate::model::{Program, Snapshot};
use crate::scaling::{bar_fill, MetricRange, MetricScale, Rgb};
use crate::scatter::MetricSummary;
use crate::store::SnapshotStore;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSort {
    Id,
    #[default]
    Generation,
    Island,
    /// Active metric, descending; unset values last.
    Score,
}

impl ListSort {
    pub fn value(self) -> &'static str {
        match self {
            ListSort::Id => "id",
            ListSort::Generation => "generation",
            ListSort::Island => "island",
            ListSort::Score => "score",
        }
    }

    pub fn from_value(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "id" => Some(ListSort::Id),
            "generation" | "gen" => Some(ListSort::Generation),
            "island" => Some(ListSort::Island),
            "score" => Some(ListSort::Score),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListSort::Id => "ID",
            ListSort::Generation => "Generation",
            ListSort::Island => "Island",
            ListSort::Score => "Score",
        }
    }

    pub fn all() -> &'static [ListSort] {
        &[ListSort::Id, ListSort::Generation, ListSort::Island, ListSort::Score]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive id substring; blank matches everything.
    pub search: String,
    pub sort: ListSort,
}

impl ListQuery {
    pub fn new(search: impl Into<String>, sort: ListSort) -> Self {
        Self {
            search: search.into(),
            sort,
        }
    }

    pub fn matches(&self, program: &Program) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || program.id.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub name: String,
    pub display: String,
    /// Scaled against this metric's own range over the full population.
    pub fill: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    /// Index into the snapshot's program list.
    pub index: usize,
    pub id: String,
    pub generation: u32,
    pub island: Option<u32>,
    pub parent_id: Option<String>,
    /// Whether the parent link can be followed in this snapshot.
    pub parent_present: bool,
    /// Active-metric fill of the vertical fitness bar, in `[0, 1]`.
    pub fitness: f64,
    pub selected: bool,
    pub highlighted: bool,
    pub metrics: Vec<MetricCell>,
}

impl ListRow {
    pub fn fitness_percent(&self) -> u32 {
        fmt::percent(self.fitness)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListModel {
    pub rows: Vec<ListRow>,
    pub summary: MetricSummary,
    /// Labels of the fitness bar ends.
    pub fitness_range: MetricRange,
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl ListModel {
    pub fn build(store: &SnapshotStore, query: &ListQuery) -> Self {
        Self::build_from(
            store.snapshot(),
            store.active_metric(),
            query,
            store.selection(),
            &store.highlight_set(),
        )
    }

    pub fn build_from(
        snapshot: &Snapshot,
        metric: &str,
        query: &ListQuery,
        selection: Option<&str>,
        highlighted: &HighlightSet,
    ) -> Self {
        let ranges: HashMap<&str, MetricRange> = snapshot
            .metric_names()
            .iter()
            .map(|name| (name.as_str(), MetricRange::over(snapshot, name)))
            .collect();
        let summary = MetricSummary::over(snapshot, metric);
        let fitness_range = summary.range;

        let mut matching: Vec<(usize, &Program)> = snapshot
            .programs()
            .iter()
            .enumerate()
            .filter(|(_, p)| query.matches(p))
            .collect();

        match query.sort {
            ListSort::Id => matching.sort_by(|(_, a), (_, b)| a.id.cmp(&b.id)),
            ListSort::Generation => matching.sort_by_key(|(_, p)| p.generation),
            ListSort::Island => matching.sort_by_key(|(_, p)| p.island.unwrap_or(0)),
            ListSort::Score => {
                matching.sort_by(|(_, a), (_, b)| compare_scores(a.metric(metric), b.metric(metric)))
            }
        }

        let rows = matching
            .into_iter()
            .map(|(index, p)| ListRow {
                index,
                id: p.id.clone(),
                generation: p.generation,
                island: p.island,
                parent_id: p.parent_id.clone(),
                parent_present: p.parent_id.as_deref().is_some_and(|id| snapshot.contains(id)),
                fitness: bar_fill(p.metric(metric), fitness_range.min, fitness_range.max),
                selected: selection == Some(p.id.as_str()),
                highlighted: highlighted.contains(&p.id),
                metrics: p
                    .metrics
                    .iter()
                    .flat_map(|m| m.iter())
                    .map(|(name, value)| {
                        let range = ranges.get(name).copied().unwrap_or_default();
                        MetricCell {
                            name: name.to_string(),
                            display: value.display(),
                            fill: bar_fill(value.as_finite(), range.min, range.max),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            rows,
            summary,
            fitness_range,
        }
    }

    /// Row position of `id`, for scroll-into-view.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Row backgrounds for `theme`; depends on the metric scale, never on the query.
    pub fn backgrounds(&self, snapshot: &Snapshot, scale: &MetricScale, theme: Theme) -> Vec<Rgb> {
        self.rows
            .iter()
            .map(|row| match snapshot.program_at(row.index) {
                Some(p) => scale.gray_shade(p, theme),
                None => scale.gray_shade_for(None, theme),
            })
            .collect()
    }
}
