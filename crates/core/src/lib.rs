//! # evoview
//!
//! Client-side state and view models for an evolutionary program-search dashboard.
//!
//! A run is polled as a [`model::Snapshot`]: programs linked by parent/child lineage,
//! annotated with numeric metrics, grouped into islands. One [`store::SnapshotStore`]
//! owns the snapshot and the shared UI state (selection, sticky flag, active metric,
//! highlight filter, theme, active view); every view derives what it draws from it.
//!
//! ## Quick Start
//!
//! ```
//! use evoview::prelude::*;
//!
//! let raw = r#"{
//!     "nodes": [
//!         {"id": "a", "generation": 0, "island": 0, "metrics": {"score": 0.2}},
//!         {"id": "b", "generation": 1, "island": 0, "parent_id": "a", "metrics": {"score": 0.9}}
//!     ],
//!     "archive": ["b"],
//!     "checkpoint_dir": "checkpoint_10"
//! }"#;
//!
//! let mut store = SnapshotStore::new(DashboardConfig::default());
//! let mut poll = PollLoop::new(store.config().poll_interval());
//!
//! let ticket = poll.begin().unwrap();
//! let outcome = poll.finish(ticket, Ok(raw.to_string()), &mut store);
//! assert_eq!(outcome, PollOutcome::Replaced);
//!
//! let best = compute_highlight_set(store.snapshot(), HighlightFilter::TopByMetric, "score");
//! assert!(best.contains("b"));
//!
//! let mut nav = Navigator::new();
//! nav.select_and_reveal(&mut store, "a").unwrap();
//! assert_eq!(store.selection(), Some("a"));
//! ```
//!
//! ## Modules
//!
//! - [`model`]: programs, snapshots, payload decoding
//! - [`store`]: the single shared store and its listener registry
//! - [`highlight`]: emphasis sets per filter kind
//! - [`scaling`]: radius / gray / bar-fill mappings and stroke styles
//! - [`graph`]: lineage force layout
//! - [`scatter`]: metric-vs-generation layout
//! - [`list`]: sortable, searchable rows and the summary header
//! - [`sidebar`]: detail panel model
//! - [`nav`]: cross-view selection protocol
//! - [`poll`]: single-flight poll state machine

#[path = "core/error.rs"]
pub mod error;

#[path = "core/fmt.rs"]
pub mod fmt;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/theme.rs"]
pub mod theme;

#[path = "core/model.rs"]
pub mod model;

#[path = "core/highlight.rs"]
pub mod highlight;

#[path = "core/scaling.rs"]
pub mod scaling;

#[path = "core/store.rs"]
pub mod store;

#[path = "core/geom.rs"]
pub mod geom;

#[path = "core/graph.rs"]
pub mod graph;

#[path = "core/scatter.rs"]
pub mod scatter;

#[path = "core/list.rs"]
pub mod list;

#[path = "core/sidebar.rs"]
pub mod sidebar;

#[path = "core/nav.rs"]
pub mod nav;

#[path = "core/poll.rs"]
pub mod poll;

/// Prelude module for convenient imports.
///
/// ```
/// use evoview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::DashboardConfig;
    pub use crate::error::{Error, Result};
    pub use crate::geom::{Point, ZoomExtent, ZoomTransform, ZoomTransition};
    pub use crate::graph::ForceLayout;
    pub use crate::highlight::{compute_highlight_set, HighlightFilter, HighlightSet};
    pub use crate::list::{ListModel, ListQuery, ListSort};
    pub use crate::model::{MetricValue, Program, Snapshot};
    pub use crate::nav::{Navigator, RevealRequest, ViewKind};
    pub use crate::poll::{Fingerprint, PollLoop, PollOutcome};
    pub use crate::scaling::{MetricRange, MetricScale, Rgb, StrokeStyle};
    pub use crate::scatter::{MetricSummary, ScatterLayout};
    pub use crate::sidebar::{SidebarModel, SidebarTab};
    pub use crate::store::{SnapshotStore, StoreEvent};
    pub use crate::theme::Theme;
}
