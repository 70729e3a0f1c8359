//! Lineage graph layout: a deterministic velocity-Verlet force simulation.
//!
//! Nodes are kept parallel to the snapshot's program list, so node `i` is program `i`.
//! Forces per tick: parent/child springs, pairwise repulsion and a centering shift.

use hashbrown::HashMap;

use crate::geom::{Point, ZoomTransform};
use crate::model::Snapshot;
use crate::prng::Prng;
use crate::scaling::MetricScale;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub link_distance: f64,
    /// Negative repels.
    pub charge: f64,
    /// Below this squared distance repulsion stops growing.
    pub charge_distance_min2: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub velocity_decay: f64,
    /// Alpha the simulation is raised to while a node is dragged.
    pub drag_alpha_target: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: 80.0,
            charge: -200.0,
            charge_distance_min2: 1.0,
            alpha_min,
            // Cools from 1 to alpha_min in ~300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub pos: Point,
    pub radius: f64,
    vx: f64,
    vy: f64,
    pinned: Option<Point>,
}

impl LayoutNode {
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct Link {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

#[derive(Debug, Clone)]
pub struct ForceLayout {
    params: ForceParams,
    nodes: Vec<LayoutNode>,
    links: Vec<Link>,
    alpha: f64,
    alpha_target: f64,
    center: Point,
    rng: Prng,
}

fn phyllotaxis(i: usize, center: Point) -> Point {
    let initial_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    let radius = 10.0 * (0.5 + i as f64).sqrt();
    let angle = i as f64 * initial_angle;
    Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

impl ForceLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_params(width, height, ForceParams::default())
    }

    pub fn with_params(width: f64, height: f64, params: ForceParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            links: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            center: Point::new(width / 2.0, height / 2.0),
            rng: Prng::new(0x5EED),
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, index: usize) -> Option<Point> {
        self.nodes.get(index).map(|n| n.pos)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.center = Point::new(width / 2.0, height / 2.0);
    }

    /// Rebuild nodes and links for `snapshot`.
    ///
    /// Programs that were already laid out keep their position and velocity; new ones
    /// start on a phyllotaxis spiral. Any membership change restarts the simulation.
    pub fn sync(&mut self, snapshot: &Snapshot, scale: &MetricScale) {
        let mut previous: HashMap<String, LayoutNode> = self
            .nodes
            .drain(..)
            .map(|n| (n.id.clone(), n))
            .collect();
        let carried_all = previous.len() == snapshot.len();

        let mut fresh = 0;
        self.nodes = snapshot
            .programs()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let radius = scale.radius(p);
                match previous.remove(&p.id) {
                    Some(mut node) => {
                        node.radius = radius;
                        node
                    }
                    None => {
                        fresh += 1;
                        LayoutNode {
                            id: p.id.clone(),
                            pos: phyllotaxis(i, self.center),
                            radius,
                            vx: 0.0,
                            vy: 0.0,
                            pinned: None,
                        }
                    }
                }
            })
            .collect();

        let mut degree = vec![0usize; self.nodes.len()];
        for e in snapshot.edges() {
            degree[e.parent] += 1;
            degree[e.child] += 1;
        }
        self.links = snapshot
            .edges()
            .iter()
            .map(|e| {
                let (s, t) = (degree[e.parent] as f64, degree[e.child] as f64);
                Link {
                    source: e.parent,
                    target: e.child,
                    strength: 1.0 / s.min(t),
                    bias: s / (s + t),
                }
            })
            .collect();

        if fresh > 0 || !carried_all {
            self.alpha = 1.0;
        }
    }

    /// Advance one tick. Returns false once the simulation has cooled.
    pub fn tick(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();

        let keep = 1.0 - self.params.velocity_decay;
        for node in &mut self.nodes {
            match node.pinned {
                Some(p) => {
                    node.pos = p;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.vy *= keep;
                    node.pos.x += node.vx;
                    node.pos.y += node.vy;
                }
            }
        }
        true
    }

    /// Tick until cooled or `max_ticks` elapsed; returns ticks run.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut n = 0;
        while n < max_ticks && self.tick() {
            n += 1;
        }
        n
    }

    fn apply_links(&mut self) {
        for link in &self.links {
            let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
            let mut x = t.pos.x + t.vx - s.pos.x - s.vx;
            let mut y = t.pos.y + t.vy - s.pos.y - s.vy;
            if x == 0.0 {
                x = self.rng.jiggle();
            }
            if y == 0.0 {
                y = self.rng.jiggle();
            }
            let len = (x * x + y * y).sqrt();
            let l = (len - self.params.link_distance) / len * self.alpha * link.strength;
            x *= l;
            y *= l;

            let target = &mut self.nodes[link.target];
            target.vx -= x * link.bias;
            target.vy -= y * link.bias;
            let source = &mut self.nodes[link.source];
            source.vx += x * (1.0 - link.bias);
            source.vy += y * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self) {
        let n = self.nodes.len();
        let strength = self.params.charge * self.alpha;
        for i in 0..n {
            let (mut dvx, mut dvy) = (0.0, 0.0);
            let pi = self.nodes[i].pos;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let pj = self.nodes[j].pos;
                let mut x = pj.x - pi.x;
                let mut y = pj.y - pi.y;
                if x == 0.0 {
                    x = self.rng.jiggle();
                }
                if y == 0.0 {
                    y = self.rng.jiggle();
                }
                let mut l = x * x + y * y;
                if l < self.params.charge_distance_min2 {
                    l = (self.params.charge_distance_min2 * l).sqrt();
                }
                let w = strength / l;
                dvx += x * w;
                dvy += y * w;
            }
            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    fn apply_center(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.pos.x, sy + node.pos.y));
        let dx = sx / n - self.center.x;
        let dy = sy / n - self.center.y;
        for node in &mut self.nodes {
            node.pos.x -= dx;
            node.pos.y -= dy;
        }
    }

    /// Pin node `index` where it is and reheat.
    pub fn drag_start(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pinned = Some(node.pos);
            self.alpha_target = self.params.drag_alpha_target;
            self.alpha = self.alpha.max(self.params.drag_alpha_target);
        }
    }

    pub fn drag_to(&mut self, index: usize, world: Point) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pinned = Some(world);
            node.pos = world;
        }
    }

    /// Release the pin and let the simulation cool again.
    pub fn drag_end(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pinned = None;
        }
        self.alpha_target = 0.0;
    }

    /// Topmost node under the screen point `screen`.
    pub fn hit_test(&self, screen: Point, transform: &ZoomTransform) -> Option<usize> {
        let world = transform.invert(screen);
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, n)| n.pos.dist2(world) <= n.radius * n.radius)
            .map(|(i, _)| i)
    }
}
