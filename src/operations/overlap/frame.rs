use crate::error::{MaskError, Result};
use crate::geometry::Polygon;
use crate::math::Point2;

/// The margin rectangle of the image receiving projected points.
///
/// All coordinates are center-origin. Points within `delta` of the
/// rectangle count as inside.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarginFrame {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    delta: f64,
    snap: f64,
}

impl MarginFrame {
    pub(crate) fn new(width: f64, height: f64, margin: f64, delta: f64, snap: f64) -> Self {
        Self {
            left: -width / 2.0 - margin,
            right: width / 2.0 + margin,
            bottom: -height / 2.0 - margin,
            top: height / 2.0 + margin,
            delta,
            snap,
        }
    }

    /// Corners in margin polygon order.
    pub(crate) fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.left, self.top),
            Point2::new(self.right, self.top),
            Point2::new(self.right, self.bottom),
            Point2::new(self.left, self.bottom),
        ]
    }

    pub(crate) fn polygon(&self) -> Polygon {
        Polygon::closed(&self.corners())
    }

    pub(crate) fn left(&self) -> f64 {
        self.left
    }

    fn contains(&self, p: &Point2) -> bool {
        (self.left..=self.right).contains(&p.x) && (self.bottom..=self.top).contains(&p.y)
    }

    /// Distance of an inside point to the nearest margin line.
    fn distance_to_margin(&self, p: &Point2) -> f64 {
        (p.x - self.left)
            .min(self.right - p.x)
            .min(p.y - self.bottom)
            .min(self.top - p.y)
    }

    /// Distance of an outside point to the rectangle.
    fn distance_outside(&self, p: &Point2) -> f64 {
        let dx = (self.left - p.x).max(p.x - self.right).max(0.0);
        let dy = (self.bottom - p.y).max(p.y - self.top).max(0.0);
        dx.hypot(dy)
    }

    /// Classifies a projected point, returning `(inside, proximity)`.
    ///
    /// A failed projection is outside with proximity 0. Points outside the
    /// rectangle but within `delta` of it are inside with proximity 0.
    pub(crate) fn classify(&self, twin: Option<Point2>) -> (bool, f64) {
        let Some(p) = twin else {
            return (false, 0.0);
        };
        if self.contains(&p) {
            return (true, self.distance_to_margin(&p));
        }
        let proximity = self.distance_outside(&p);
        if proximity <= self.delta {
            (true, 0.0)
        } else {
            (false, proximity)
        }
    }

    /// Moves a point lying near the margin exactly onto it.
    ///
    /// Each coordinate within the snap tolerance of a margin line is
    /// replaced by that line's coordinate; near a corner both are.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::SnapFailed` if neither coordinate is close
    /// enough to a margin line, or the point lies beyond the ends of the
    /// margin side it would snap to.
    pub(crate) fn put_on_margin(&self, p: Point2) -> Result<Point2> {
        let x = if (p.x - self.left).abs() <= self.snap {
            Some(self.left)
        } else if (p.x - self.right).abs() <= self.snap {
            Some(self.right)
        } else {
            None
        };
        let y = if (p.y - self.top).abs() <= self.snap {
            Some(self.top)
        } else if (p.y - self.bottom).abs() <= self.snap {
            Some(self.bottom)
        } else {
            None
        };
        let within = p.x >= self.left - self.snap
            && p.x <= self.right + self.snap
            && p.y >= self.bottom - self.snap
            && p.y <= self.top + self.snap;
        if !within || (x.is_none() && y.is_none()) {
            return Err(MaskError::SnapFailed { x: p.x, y: p.y }.into());
        }
        Ok(Point2::new(x.unwrap_or(p.x), y.unwrap_or(p.y)))
    }
}
