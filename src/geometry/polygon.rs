use crate::math::Point2;

use super::segment::Segment;

/// An ordered sequence of segments approximating a contour.
///
/// Consecutive segments share an endpoint. A closed polygon ends with a
/// segment returning to its first point. Closure is not verified after
/// construction; the polygon only grows through [`Polygon::take_in`], which
/// preserves it.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    segments: Vec<Segment>,
}

impl Polygon {
    /// Builds a polygon through `points`, optionally traversed in reverse
    /// and optionally closed back to the first point.
    ///
    /// Fewer than two points yield an empty polygon.
    #[must_use]
    pub fn new(points: &[Point2], reverse: bool, close: bool) -> Self {
        let ordered: Vec<Point2> = if reverse {
            points.iter().rev().copied().collect()
        } else {
            points.to_vec()
        };
        if ordered.len() < 2 {
            return Self::default();
        }
        let mut segments: Vec<Segment> = ordered
            .windows(2)
            .map(|w| Segment::new(w[0], w[1]))
            .collect();
        if close {
            segments.push(Segment::new(ordered[ordered.len() - 1], ordered[0]));
        }
        Self { segments }
    }

    /// Builds a closed polygon through `points` in the given order.
    #[must_use]
    pub fn closed(points: &[Point2]) -> Self {
        Self::new(points, false, true)
    }

    /// Corner points of an image margin in center-origin coordinates,
    /// widened outward by `margin` on every side.
    ///
    /// Order: (left, top), (right, top), (right, bottom), (left, bottom).
    #[must_use]
    pub fn margin_points(width: f64, height: f64, margin: f64) -> [Point2; 4] {
        let left = -width / 2.0 - margin;
        let bottom = -height / 2.0 - margin;
        let right = width / 2.0 + margin;
        let top = height / 2.0 + margin;
        [
            Point2::new(left, top),
            Point2::new(right, top),
            Point2::new(right, bottom),
            Point2::new(left, bottom),
        ]
    }

    /// The closed margin rectangle of an image; see [`Polygon::margin_points`].
    #[must_use]
    pub fn margin(width: f64, height: f64, margin: f64) -> Self {
        Self::closed(&Self::margin_points(width, height, margin))
    }

    /// Number of segments.
    #[must_use]
    pub fn count(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Start points of all segments, in order.
    pub fn vertices(&self) -> impl Iterator<Item = Point2> + '_ {
        self.segments.iter().map(Segment::a)
    }

    /// Total length of all segments.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Splits the first segment containing `p` into two segments meeting
    /// at `p`.
    ///
    /// Returns `false` if no segment contains `p` within `delta`. At most
    /// one segment is split per call.
    pub fn take_in(&mut self, p: Point2, delta: f64) -> bool {
        self.take_in_at(p, delta).is_some()
    }

    /// Like [`Polygon::take_in`], but returns the index of the new segment
    /// starting at `p`, which is also the index of `p` in
    /// [`Polygon::vertices`].
    pub fn take_in_at(&mut self, p: Point2, delta: f64) -> Option<usize> {
        let index = self.segments.iter().position(|s| s.contains(&p, delta))?;
        let split = self.segments[index];
        self.segments[index] = Segment::new(split.a(), p);
        self.segments.insert(index + 1, Segment::new(p, split.b()));
        Some(index + 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Polygon {
        Polygon::closed(&[
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ])
    }

    #[test]
    fn closed_polygon_has_one_segment_per_point() {
        let poly = square(1.0);
        assert_eq!(poly.count(), 4);
        assert_eq!(poly.segments()[3].b(), Point2::new(0.0, 0.0));
        assert_relative_eq!(poly.perimeter(), 4.0);
    }

    #[test]
    fn open_and_reversed_construction() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        let open = Polygon::new(&pts, false, false);
        assert_eq!(open.count(), 2);
        let rev = Polygon::new(&pts, true, true);
        assert_eq!(rev.count(), 3);
        assert_eq!(rev.segments()[0].a(), Point2::new(1.0, 1.0));
        assert_eq!(rev.segments()[2].b(), Point2::new(1.0, 1.0));
        assert!(Polygon::new(&pts[..1], false, true).is_empty());
    }

    #[test]
    fn margin_rectangle_is_center_origin() {
        let poly = Polygon::margin(100.0, 60.0, 5.0);
        let corners: Vec<Point2> = poly.vertices().collect();
        assert_eq!(corners[0], Point2::new(-55.0, 35.0));
        assert_eq!(corners[2], Point2::new(55.0, -35.0));
        assert_relative_eq!(poly.perimeter(), 2.0 * (110.0 + 70.0));
    }

    #[test]
    fn take_in_splits_containing_segment() {
        let mut poly = square(10.0);
        let before = poly.perimeter();
        let p = Point2::new(10.0, 3.5);
        assert!(poly.take_in(p, 1e-6));
        assert_eq!(poly.count(), 5);
        assert_eq!(poly.segments()[1].b(), p);
        assert_eq!(poly.segments()[2].a(), p);
        assert_relative_eq!(poly.perimeter(), before, epsilon = 1e-9);
    }

    #[test]
    fn take_in_reports_vertex_index() {
        let mut poly = square(10.0);
        assert_eq!(poly.take_in_at(Point2::new(4.0, 10.0), 1e-6), Some(3));
        assert_eq!(poly.vertices().nth(3), Some(Point2::new(4.0, 10.0)));
        assert_eq!(poly.take_in_at(Point2::new(2.0, 0.0), 1e-6), Some(1));
        assert_eq!(poly.count(), 6);
    }

    #[test]
    fn take_in_rejects_points_off_the_contour() {
        let mut poly = square(10.0);
        assert!(!poly.take_in(Point2::new(5.0, 5.0), 1e-6));
        assert!(!poly.take_in(Point2::new(10.1, 5.0), 1e-6));
        assert_eq!(poly.count(), 4);
    }

    #[test]
    fn take_in_many_points_preserves_perimeter() {
        let mut poly = Polygon::margin(640.0, 480.0, 0.0);
        let before = poly.perimeter();
        let points = [
            Point2::new(-320.0, 17.25),
            Point2::new(100.5, 240.0),
            Point2::new(320.0, -200.0),
            Point2::new(-3.0, -240.0),
            Point2::new(319.999_999_9, 0.0),
        ];
        for p in points {
            assert!(poly.take_in(p, 1e-6));
        }
        assert_eq!(poly.count(), 9);
        assert_relative_eq!(poly.perimeter(), before, epsilon = 1e-6);
    }
}
