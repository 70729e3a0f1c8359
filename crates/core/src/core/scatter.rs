//! Performance view layout: active metric on x, generation on y.
//!
//! Programs without a finite metric value sit in a narrow lane left of the plot so they
//! keep their generation and their edges. With the island split on, each island gets its
//! own band (own y scale) under one shared x scale.

use crate::config::DashboardConfig;
use crate::geom::{Point, ZoomTransform, ZoomTransition};
use crate::model::{Edge, Snapshot};
use crate::scaling::{MetricRange, MetricScale};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const MARGINS: Margins = Margins {
    top: 60.0,
    right: 40.0,
    bottom: 40.0,
    left: 60.0,
};
pub const NAN_LANE_WIDTH: f64 = 70.0;
pub const NAN_LANE_GAP: f64 = 54.0;
const MIN_BAND_HEIGHT: f64 = 400.0;
const ROW_HEIGHT: f64 = 48.0;

fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// Continuous linear map `domain → range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Extend the domain outward to round tick values.
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }
        if !(start.is_finite() && stop.is_finite()) || start == stop {
            return self;
        }
        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if step == prestep {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }
        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }

    /// A degenerate domain maps everything to the middle of the range.
    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round values inside the domain, for axis labels.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if !(lo.is_finite() && hi.is_finite()) {
            return Vec::new();
        }
        if lo == hi {
            return vec![lo];
        }
        let step = tick_increment(lo, hi, count);
        if step > 0.0 {
            let (i0, i1) = ((lo / step).ceil() as i64, (hi / step).floor() as i64);
            (i0..=i1).map(|i| i as f64 * step).collect()
        } else {
            let inv = -step;
            let (i0, i1) = ((lo * inv).ceil() as i64, (hi * inv).floor() as i64);
            (i0..=i1).map(|i| i as f64 / inv).collect()
        }
    }
}

/// Top score and average of the active metric over the whole population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub top: f64,
    pub average: f64,
    pub range: MetricRange,
    pub count: usize,
}

impl MetricSummary {
    /// Zeros when nobody reports a finite value.
    pub fn over(snapshot: &Snapshot, metric: &str) -> Self {
        let values: Vec<f64> = snapshot
            .programs()
            .iter()
            .filter_map(|p| p.metric(metric))
            .collect();
        if values.is_empty() {
            return Self {
                top: 0.0,
                average: 0.0,
                range: MetricRange::default(),
                count: 0,
            };
        }
        let range = MetricRange::from_values(values.iter().copied());
        Self {
            top: range.max,
            average: values.iter().sum::<f64>() / values.len() as f64,
            range,
            count: values.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IslandBand {
    /// `None` for the single unsplit band or for programs without an island.
    pub island: Option<u32>,
    pub top: f64,
    pub height: f64,
    pub y: LinearScale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub pos: Point,
    pub radius: f64,
    pub band: usize,
    pub in_nan_lane: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NanLane {
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub bottom: f64,
}

impl NanLane {
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Positions for one draw; point `i` belongs to program `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterLayout {
    pub width: f64,
    pub height: f64,
    pub x: LinearScale,
    pub bands: Vec<IslandBand>,
    pub points: Vec<ScatterPoint>,
    pub nan_lane: Option<NanLane>,
    edges: Vec<Edge>,
}

impl ScatterLayout {
    pub fn build(
        snapshot: &Snapshot,
        scale: &MetricScale,
        width: f64,
        viewport_height: f64,
        split_islands: bool,
    ) -> Self {
        let m = MARGINS;
        let metric = scale.metric();
        let max_gen = snapshot.max_generation() as f64;
        let band_height = MIN_BAND_HEIGHT.max((max_gen + 1.0) * ROW_HEIGHT + m.top + m.bottom);

        let islands: Vec<Option<u32>> = if split_islands {
            let mut islands: Vec<Option<u32>> = snapshot.programs().iter().map(|p| p.island).collect();
            islands.sort_unstable();
            islands.dedup();
            if islands.is_empty() {
                islands.push(None);
            }
            islands
        } else {
            vec![None]
        };

        let bands: Vec<IslandBand> = islands
            .iter()
            .enumerate()
            .map(|(i, &island)| {
                let top = m.top + i as f64 * band_height;
                IslandBand {
                    island,
                    top,
                    height: band_height,
                    y: LinearScale::new((0.0, max_gen), (top, top + band_height - m.bottom)).nice(10),
                }
            })
            .collect();

        let finite = snapshot.programs().iter().filter_map(|p| p.metric(metric));
        let range = MetricRange::from_values(finite);
        let offset = NAN_LANE_WIDTH + NAN_LANE_GAP;
        let x = LinearScale::new((range.min, range.max), (m.left + offset, width - m.right)).nice(10);

        let lane_x = m.left + NAN_LANE_WIDTH / 2.0;
        let mut any_nan = false;
        let points = snapshot
            .programs()
            .iter()
            .map(|p| {
                let band = if split_islands {
                    islands.iter().position(|i| *i == p.island).unwrap_or(0)
                } else {
                    0
                };
                let y = bands[band].y.map(p.generation as f64);
                let value = p.metric(metric);
                any_nan |= value.is_none();
                ScatterPoint {
                    pos: Point::new(value.map_or(lane_x, |v| x.map(v)), y),
                    radius: scale.radius(p),
                    band,
                    in_nan_lane: value.is_none(),
                }
            })
            .collect();

        let bottom = m.top + bands.len() as f64 * band_height - m.bottom;
        let nan_lane = any_nan.then_some(NanLane {
            left: m.left,
            width: NAN_LANE_WIDTH,
            top: m.top,
            bottom,
        });

        Self {
            width,
            height: viewport_height.max(bands.len() as f64 * band_height),
            x,
            bands,
            points,
            nan_lane,
            edges: snapshot.edges().to_vec(),
        }
    }

    /// Parent → child segments, including those touching the undefined lane.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.edges
            .iter()
            .map(|e| (self.points[e.parent].pos, self.points[e.child].pos))
    }

    pub fn hit_test(&self, screen: Point, transform: &ZoomTransform) -> Option<usize> {
        let world = transform.invert(screen);
        self.points
            .iter()
            .enumerate()
            .rev()
            .find(|(_, p)| p.pos.dist2(world) <= p.radius * p.radius)
            .map(|(i, _)| i)
    }

    /// Transform that centers program `index` at the configured locate zoom.
    pub fn locate(&self, index: usize, config: &DashboardConfig, viewport: (f64, f64)) -> Option<ZoomTransform> {
        let p = self.points.get(index)?;
        Some(ZoomTransform::centered_on(p.pos, config.locate_zoom, viewport.0, viewport.1))
    }

    /// Animated locate-and-center starting from `current`.
    pub fn locate_transition(
        &self,
        index: usize,
        current: ZoomTransform,
        config: &DashboardConfig,
        viewport: (f64, f64),
    ) -> Option<ZoomTransition> {
        let target = self.locate(index, config, viewport)?;
        Some(ZoomTransition::new(current, target, config.locate_duration_ms as f64))
    }
}
