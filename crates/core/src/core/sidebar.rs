//! Detail panel for whichever program is currently relevant.
//!
//! The panel is read-only. Its close button and parent link go through
//! [`crate::nav::Navigator`]; the model only says what to show.

use crate::config::DashboardConfig;
use crate::model::{Program, Prompt, Snapshot};
use crate::store::SnapshotStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarTab {
    Code,
    Prompt(String),
}

impl SidebarTab {
    pub fn label(&self) -> &str {
        match self {
            SidebarTab::Code => "Code",
            SidebarTab::Prompt(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarModel {
    pub id: String,
    pub generation: u32,
    pub island: Option<u32>,
    pub parent_id: Option<String>,
    /// Island of the parent, when the parent is part of the snapshot.
    pub parent_island: Option<u32>,
    pub parent_present: bool,
    /// Shown as a star.
    pub in_archive: bool,
    pub detail_url: String,
    /// Name / formatted value, in payload order.
    pub metrics: Vec<(String, String)>,
    /// Empty when the program has neither code nor prompts.
    pub tabs: Vec<SidebarTab>,
    pub active_tab: usize,
    code: Option<String>,
    prompts: Vec<Prompt>,
}

impl SidebarModel {
    pub fn for_program(snapshot: &Snapshot, program: &Program, config: &DashboardConfig) -> Self {
        let parent = snapshot.parent_of(&program.id);

        let mut tabs = Vec::new();
        if program.has_code() {
            tabs.push(SidebarTab::Code);
        }
        tabs.extend(program.prompts.iter().map(|p| SidebarTab::Prompt(p.name.clone())));

        Self {
            id: program.id.clone(),
            generation: program.generation,
            island: program.island,
            parent_id: program.parent_id.clone(),
            parent_island: parent.and_then(|p| p.island),
            parent_present: parent.is_some(),
            in_archive: snapshot.in_archive(&program.id),
            detail_url: config.detail_url(&program.id),
            metrics: program
                .metrics
                .iter()
                .flat_map(|m| m.iter())
                .map(|(k, v)| (k.to_string(), v.display()))
                .collect(),
            tabs,
            active_tab: 0,
            code: program.code.clone(),
            prompts: program.prompts.clone(),
        }
    }

    /// Model for the store's relevant program, or `None` when the panel should be empty.
    pub fn from_store(store: &SnapshotStore) -> Option<Self> {
        let program = store.relevant_program()?;
        Some(Self::for_program(store.snapshot(), program, store.config()))
    }

    /// Parent id worth linking to: only when the parent can be revealed.
    pub fn parent_link(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|_| self.parent_present)
    }

    pub fn select_tab(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() || index == self.active_tab {
            return false;
        }
        self.active_tab = index;
        true
    }

    pub fn tab_content(&self, index: usize) -> Option<&str> {
        match self.tabs.get(index)? {
            SidebarTab::Code => self.code.as_deref(),
            SidebarTab::Prompt(name) => self
                .prompts
                .iter()
                .find(|p| &p.name == name)
                .map(|p| p.text.as_str()),
        }
    }

    pub fn active_content(&self) -> Option<&str> {
        self.tab_content(self.active_tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Program::new("root", 0).with_island(3),
                Program::new("kid", 1)
                    .with_island(1)
                    .with_parent("root")
                    .with_metric("score", 0.123456)
                    .with_code("def f(): pass")
                    .with_prompt("diff_user", "improve f")
                    .with_prompt("system", "you are"),
                Program::new("orphan", 2).with_parent("gone").with_code("   "),
            ],
            ["kid"],
            "",
        )
    }

    #[test]
    fn tabs_come_from_data_presence() {
        let s = snapshot();
        let cfg = DashboardConfig::default();
        let kid = SidebarModel::for_program(&s, s.get("kid").unwrap(), &cfg);
        assert_eq!(kid.tabs.len(), 3);
        assert_eq!(kid.tabs[0], SidebarTab::Code);
        assert_eq!(kid.active_content(), Some("def f(): pass"));

        let orphan = SidebarModel::for_program(&s, s.get("orphan").unwrap(), &cfg);
        assert!(orphan.tabs.is_empty());
        assert_eq!(orphan.active_content(), None);
    }

    #[test]
    fn switching_tabs_changes_content() {
        let s = snapshot();
        let mut kid = SidebarModel::for_program(&s, s.get("kid").unwrap(), &DashboardConfig::default());
        assert!(kid.select_tab(2));
        assert_eq!(kid.tabs[2].label(), "system");
        assert_eq!(kid.active_content(), Some("you are"));
        assert!(!kid.select_tab(2));
        assert!(!kid.select_tab(9));
    }

    #[test]
    fn identity_archive_and_parent() {
        let s = snapshot();
        let cfg = DashboardConfig::default();
        let kid = SidebarModel::for_program(&s, s.get("kid").unwrap(), &cfg);
        assert!(kid.in_archive);
        assert_eq!(kid.parent_island, Some(3));
        assert_eq!(kid.parent_link(), Some("root"));
        assert_eq!(kid.detail_url, "/program/kid");
        assert_eq!(kid.metrics, vec![("score".to_string(), "0.1235".to_string())]);

        let orphan = SidebarModel::for_program(&s, s.get("orphan").unwrap(), &cfg);
        assert_eq!(orphan.parent_id.as_deref(), Some("gone"));
        assert_eq!(orphan.parent_link(), None);
    }

    #[test]
    fn empty_without_a_relevant_program() {
        let mut store = SnapshotStore::new(DashboardConfig::default());
        store.replace_snapshot(snapshot());
        assert!(SidebarModel::from_store(&store).is_none());
        store.set_hovered(Some("root"));
        assert_eq!(SidebarModel::from_store(&store).unwrap().id, "root");
    }
}
