use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Metric used when a snapshot reports no metric names at all.
pub const FALLBACK_METRIC: &str = "overall_score";

/// Characters escaped when a program id becomes one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Knobs shared by every view and by the poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Path (browser) or URL (native) of the snapshot endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
    /// Prefix of the per-program detail page; the id is appended.
    #[serde(default = "default_detail_path")]
    pub detail_path: String,
    #[serde(default = "default_fallback_metric")]
    pub fallback_metric: String,
    #[serde(default = "default_radius_min")]
    pub radius_min: f64,
    #[serde(default = "default_radius_max")]
    pub radius_max: f64,
    /// Zoom factor used by locate-and-center.
    #[serde(default = "default_locate_zoom")]
    pub locate_zoom: f64,
    #[serde(default = "default_locate_duration_ms")]
    pub locate_duration_ms: u32,
}

fn default_endpoint() -> String {
    "/api/data".to_string()
}

fn default_poll_interval_ms() -> u32 {
    2000
}

fn default_detail_path() -> String {
    "/program/".to_string()
}

fn default_fallback_metric() -> String {
    FALLBACK_METRIC.to_string()
}

fn default_radius_min() -> f64 {
    10.0
}

fn default_radius_max() -> f64 {
    32.0
}

fn default_locate_zoom() -> f64 {
    2.0
}

fn default_locate_duration_ms() -> u32 {
    600
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            poll_interval_ms: default_poll_interval_ms(),
            detail_path: default_detail_path(),
            fallback_metric: default_fallback_metric(),
            radius_min: default_radius_min(),
            radius_max: default_radius_max(),
            locate_zoom: default_locate_zoom(),
            locate_duration_ms: default_locate_duration_ms(),
        }
    }
}

impl DashboardConfig {
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms as u64)
    }

    /// Link target of the program detail page; the id is percent-encoded as one segment.
    pub fn detail_url(&self, program_id: &str) -> String {
        format!("{}{}", self.detail_path, utf8_percent_encode(program_id, PATH_SEGMENT))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms < 100 {
            return Err(Error::Config(format!(
                "poll_interval_ms must be at least 100 (got {})",
                self.poll_interval_ms
            )));
        }
        if !(self.radius_min > 0.0 && self.radius_max >= self.radius_min) {
            return Err(Error::Config(
                "radius range must satisfy 0 < radius_min <= radius_max".to_string(),
            ));
        }
        if !(self.locate_zoom > 0.0) {
            return Err(Error::Config("locate_zoom must be positive".to_string()));
        }
        if self.fallback_metric.trim().is_empty() {
            return Err(Error::Config("fallback_metric must not be empty".to_string()));
        }
        Ok(())
    }

    /// Apply `EVOVIEW_ENDPOINT`, `EVOVIEW_POLL_MS` and `EVOVIEW_METRIC` overrides.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("EVOVIEW_ENDPOINT") {
            if !v.trim().is_empty() {
                self.endpoint = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("EVOVIEW_POLL_MS") {
            match v.trim().parse::<u32>() {
                Ok(ms) if ms >= 100 => self.poll_interval_ms = ms,
                _ => warn!("Ignoring EVOVIEW_POLL_MS value: {}", v),
            }
        }
        if let Some(v) = lookup("EVOVIEW_METRIC") {
            if v.trim().is_empty() {
                warn!("Ignoring empty EVOVIEW_METRIC");
            } else {
                self.fallback_metric = v.trim().to_string();
            }
        }
        self
    }
}
