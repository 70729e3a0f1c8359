//! Pan/zoom transforms and their animated transitions.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist2(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Allowed zoom factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomExtent {
    pub min: f64,
    pub max: f64,
}

impl ZoomExtent {
    pub const GRAPH: ZoomExtent = ZoomExtent { min: 0.1, max: 10.0 };
    pub const SCATTER: ZoomExtent = ZoomExtent { min: 0.2, max: 10.0 };

    pub fn clamp(self, k: f64) -> f64 {
        k.clamp(self.min, self.max)
    }
}

/// `screen = k * world + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0, y: 0.0 };

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn translate_by(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Multiply the zoom by `factor`, keeping the screen point `anchor` fixed.
    pub fn zoom_at(self, anchor: Point, factor: f64, extent: ZoomExtent) -> Self {
        let k = extent.clamp(self.k * factor);
        let world = self.invert(anchor);
        Self {
            k,
            x: anchor.x - world.x * k,
            y: anchor.y - world.y * k,
        }
    }

    /// Transform that shows the world point `target` at the center of a `width × height`
    /// viewport at scale `k`.
    pub fn centered_on(target: Point, k: f64, width: f64, height: f64) -> Self {
        Self {
            k,
            x: width / 2.0 - k * target.x,
            y: height / 2.0 - k * target.y,
        }
    }

    pub fn lerp(self, to: ZoomTransform, t: f64) -> Self {
        Self {
            k: self.k + (to.k - self.k) * t,
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// An in-flight animated change of transform. A newer transition simply replaces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    from: ZoomTransform,
    to: ZoomTransform,
    duration_ms: f64,
    elapsed_ms: f64,
}

impl ZoomTransition {
    pub fn new(from: ZoomTransform, to: ZoomTransform, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
        }
    }

    pub fn target(&self) -> ZoomTransform {
        self.to
    }

    /// Advance by `dt_ms` and return the transform to draw with.
    pub fn advance(&mut self, dt_ms: f64) -> ZoomTransform {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
        self.current()
    }

    pub fn current(&self) -> ZoomTransform {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        let t = ease_cubic_in_out(self.elapsed_ms / self.duration_ms);
        self.from.lerp(self.to, t)
    }

    pub fn is_done(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}
