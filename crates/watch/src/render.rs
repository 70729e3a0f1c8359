//! Plain-text renderings of the dashboard views.

use std::fmt::Write as _;

use evoview::fmt::fixed;
use evoview::highlight::HighlightFilter;
use evoview::list::ListModel;
use evoview::model::Snapshot;
use evoview::scatter::MetricSummary;
use evoview::sidebar::SidebarModel;
use evoview::store::SnapshotStore;

/// One line per population change.
pub fn summary(store: &SnapshotStore) -> String {
    let snapshot = store.snapshot();
    let metric = store.active_metric();
    let s = MetricSummary::over(snapshot, metric);
    let mut line = format!(
        "{} · {} programs · max gen {} · {metric} top {} avg {}",
        if snapshot.checkpoint_dir().is_empty() { "-" } else { snapshot.checkpoint_dir() },
        snapshot.len(),
        snapshot.max_generation(),
        fixed(s.top, 4),
        fixed(s.average, 4),
    );
    let filter = store.highlight_filter();
    if filter != HighlightFilter::None {
        let _ = write!(line, " · {}: {}", filter.label(), store.highlight_set().len());
    }
    line
}

fn mark(on: bool, c: char) -> char {
    if on {
        c
    } else {
        ' '
    }
}

/// Rows as a fixed-width table. `*` marks archive members, `+` highlighted rows, `>` the selection.
pub fn list_table(model: &ListModel, snapshot: &Snapshot, metric: &str, limit: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "top {} · avg {} · {} rows",
        fixed(model.summary.top, 4),
        fixed(model.summary.average, 4),
        model.rows.len()
    );
    let _ = writeln!(out, "    {:<24} {:>4} {:>6} {:<24} {:>10}", "id", "gen", "island", "parent", metric);

    let shown = limit.unwrap_or(model.rows.len()).min(model.rows.len());
    for row in &model.rows[..shown] {
        let value = snapshot
            .program_at(row.index)
            .and_then(|p| p.metric_value(metric))
            .map(|v| v.display())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{}{}{} {:<24} {:>4} {:>6} {:<24} {:>10}",
            mark(row.selected, '>'),
            mark(snapshot.in_archive(&row.id), '*'),
            mark(row.highlighted, '+'),
            row.id,
            row.generation,
            row.island.map_or_else(|| "-".to_string(), |i| i.to_string()),
            row.parent_id.as_deref().unwrap_or("-"),
            value,
        );
    }
    if shown < model.rows.len() {
        let _ = writeln!(out, "… {} more", model.rows.len() - shown);
    }
    out
}

pub fn detail(model: &SidebarModel) -> String {
    let mut out = String::new();
    let star = if model.in_archive { "★ " } else { "" };
    let _ = writeln!(out, "{star}{}", model.id);
    let _ = writeln!(out, "  generation: {}", model.generation);
    if let Some(island) = model.island {
        let _ = writeln!(out, "  island:     {island}");
    }
    match (&model.parent_id, model.parent_island) {
        (Some(pid), Some(island)) => {
            let _ = writeln!(out, "  parent:     {pid} (island {island})");
        }
        (Some(pid), None) if !model.parent_present => {
            let _ = writeln!(out, "  parent:     {pid} (not in snapshot)");
        }
        (Some(pid), None) => {
            let _ = writeln!(out, "  parent:     {pid}");
        }
        (None, _) => {}
    }
    let _ = writeln!(out, "  detail:     {}", model.detail_url);
    if !model.metrics.is_empty() {
        let _ = writeln!(out, "  metrics:");
        for (name, value) in &model.metrics {
            let _ = writeln!(out, "    {name:<24} {value}");
        }
    }
    for (i, tab) in model.tabs.iter().enumerate() {
        let _ = writeln!(out, "--- {} ---", tab.label());
        if let Some(text) = model.tab_content(i) {
            let _ = writeln!(out, "{}", text.trim_end());
        }
    }
    out
}

/// `id` and its ancestors, one per line, nearest first.
pub fn lineage(snapshot: &Snapshot, id: &str, metric: &str) -> Option<String> {
    let chain = snapshot.lineage(id);
    if chain.is_empty() {
        return None;
    }
    let mut out = String::new();
    for (depth, p) in chain.iter().enumerate() {
        let value = p.metric_value(metric).map_or_else(|| "-".to_string(), |v| v.display());
        let _ = writeln!(
            out,
            "{:indent$}{} (gen {}, {metric} {value})",
            "",
            p.id,
            p.generation,
            indent = depth * 2
        );
    }
    if let Some(last) = chain.last() {
        if let Some(missing) = last.parent_id.as_deref().filter(|pid| !snapshot.contains(pid)) {
            let _ = writeln!(out, "{:indent$}{missing} (not in snapshot)", "", indent = chain.len() * 2);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoview::config::DashboardConfig;
    use evoview::list::{ListQuery, ListSort};
    use evoview::model::Program;

    fn store() -> SnapshotStore {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(Snapshot::new(
            vec![
                Program::new("root", 0).with_island(0).with_metric("score", 0.5),
                Program::new("kid", 1)
                    .with_island(1)
                    .with_parent("root")
                    .with_metric("score", 0.9)
                    .with_code("print(1)\n"),
                Program::new("grandkid", 2).with_parent("kid"),
                Program::new("stray", 3).with_parent("lost").with_metric("score", 0.1),
            ],
            ["kid"],
            "checkpoint_7",
        ));
        store
    }

    #[test]
    fn summary_mentions_highlight_count_only_when_filtering() {
        let mut store = store();
        let line = summary(&store);
        assert!(line.starts_with("checkpoint_7 · 4 programs · max gen 3 · score top 0.9000"));
        assert!(!line.contains(':'));

        store.set_highlight_filter(HighlightFilter::MetricUnset);
        assert!(summary(&store).ends_with(": 1"));
    }

    #[test]
    fn table_marks_and_limits() {
        let store = store();
        let model = ListModel::build(&store, &ListQuery::new("", ListSort::Score));
        let table = list_table(&model, store.snapshot(), "score", Some(2));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with(" *  kid"));
        assert!(lines[3].contains("root"));
        assert_eq!(lines[4], "… 2 more");
    }

    #[test]
    fn detail_lists_metrics_and_code() {
        let store = store();
        let s = store.snapshot();
        let model = SidebarModel::for_program(s, s.get("kid").unwrap(), store.config());
        let text = detail(&model);
        assert!(text.starts_with("★ kid\n"));
        assert!(text.contains("parent:     root (island 0)"));
        assert!(text.contains("/program/kid"));
        assert!(text.contains("--- Code ---\nprint(1)\n"));
    }

    #[test]
    fn lineage_walks_to_the_root_or_a_missing_parent() {
        let store = store();
        let text = lineage(store.snapshot(), "grandkid", "score").unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["grandkid (gen 2, score -)", "  kid (gen 1, score 0.9000)", "    root (gen 0, score 0.5000)"]);

        let stray = lineage(store.snapshot(), "stray", "score").unwrap();
        assert!(stray.ends_with("  lost (not in snapshot)\n"));
        assert!(lineage(store.snapshot(), "nobody", "score").is_none());
    }
}
