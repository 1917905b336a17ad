use crate::error::{GeometryError, Result};
use crate::math::{Point2, POSITION_DELTA};

/// A straight line segment from `a` to `b` in image coordinates.
///
/// Length, extents and per-axis deltas are cached at construction because
/// the overlap walk queries them repeatedly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    a: Point2,
    b: Point2,
    length: f64,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    dx: f64,
    dy: f64,
}

impl Segment {
    /// Creates a segment between two points.
    #[must_use]
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            a,
            b,
            length: nalgebra::distance(&a, &b),
            min_x: a.x.min(b.x),
            max_x: a.x.max(b.x),
            min_y: a.y.min(b.y),
            max_y: a.y.max(b.y),
            dx: b.x - a.x,
            dy: b.y - a.y,
        }
    }

    /// Start point.
    #[must_use]
    pub fn a(&self) -> Point2 {
        self.a
    }

    /// End point.
    #[must_use]
    pub fn b(&self) -> Point2 {
        self.b
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    #[must_use]
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Returns `true` if both endpoints coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// Returns the y coordinate at which the line through this segment
    /// crosses the vertical `x`.
    ///
    /// Only true crossings count: the segment's x-extent must straddle `x`,
    /// and a vertical segment never intersects a vertical line.
    #[must_use]
    pub fn intersect_with_vertical(&self, x: f64) -> Option<f64> {
        if self.dx.abs() > POSITION_DELTA && self.min_x <= x && x <= self.max_x {
            return Some(self.a.y + (x - self.a.x) * self.dy / self.dx);
        }
        None
    }

    /// Returns the x coordinate at which the line through this segment
    /// crosses the horizontal `y`.
    ///
    /// A horizontal segment never intersects a horizontal line.
    #[must_use]
    pub fn intersect_with_horizontal(&self, y: f64) -> Option<f64> {
        if self.dy.abs() > POSITION_DELTA && self.min_y <= y && y <= self.max_y {
            return Some(self.a.x + (y - self.a.y) * self.dx / self.dy);
        }
        None
    }

    /// Returns the point at parameter `z`, running from `a` (z = 0) to
    /// `b` (z = 1). The endpoints are returned as stored, not recomputed.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` if `z` is outside `[0, 1]`.
    pub fn locate(&self, z: f64) -> Result<Point2> {
        if !(0.0..=1.0).contains(&z) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "z",
                value: z,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        #[allow(clippy::float_cmp)]
        let p = if z == 0.0 {
            self.a
        } else if z == 1.0 {
            self.b
        } else {
            Point2::new(self.a.x + z * self.dx, self.a.y + z * self.dy)
        };
        Ok(p)
    }

    /// Tests whether `p` lies on this segment within `delta`.
    ///
    /// The parameter z is solved along the axis with the larger extent, so
    /// the division never goes through a near-zero delta. A degenerate
    /// segment contains nothing.
    #[must_use]
    pub fn contains(&self, p: &Point2, delta: f64) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let (z, predicted, actual) = if self.dx.abs() >= self.dy.abs() {
            let z = (p.x - self.a.x) / self.dx;
            (z, self.a.y + z * self.dy, p.y)
        } else {
            let z = (p.y - self.a.y) / self.dy;
            (z, self.a.x + z * self.dx, p.x)
        };
        (-delta..=1.0 + delta).contains(&z) && (predicted - actual).abs() < delta
    }
}
