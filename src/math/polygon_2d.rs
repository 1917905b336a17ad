use super::{Point2, POSITION_DELTA};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise winding in a
/// y-up frame. The closing edge from the last to the first point is implied.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut previous = points[n - 1];
    for current in points {
        sum += (previous.x + current.x) * (current.y - previous.y);
        previous = *current;
    }
    sum * 0.5
}

/// Accumulates the perimeter of a closed polygon together with the
/// length-weighted sums of its edge midpoints.
///
/// Returns `(length, weighted_x, weighted_y)`.
#[must_use]
pub fn perimeter_moments(points: &[Point2]) -> (f64, f64, f64) {
    let Some(&last) = points.last() else {
        return (0.0, 0.0, 0.0);
    };
    let mut lsum = 0.0;
    let mut xsum = 0.0;
    let mut ysum = 0.0;
    let mut previous = last;
    for current in points {
        let l = nalgebra::distance(&previous, current);
        let mid = nalgebra::center(&previous, current);
        lsum += l;
        xsum += l * mid.x;
        ysum += l * mid.y;
        previous = *current;
    }
    (lsum, xsum, ysum)
}

/// Axis-aligned extents `(min, max)` of a point set, `None` if it is empty.
#[must_use]
pub fn extents<'a, I>(points: I) -> Option<(Point2, Point2)>
where
    I: IntoIterator<Item = &'a Point2>,
{
    let mut iter = points.into_iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    for p in iter {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Returns the index of the leftmost point (smallest x), breaking ties by
/// smallest y.
#[must_use]
pub fn leftmost_index(points: &[Point2]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, pt) in points.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(b) => {
                let bp = &points[b];
                if pt.x < bp.x - POSITION_DELTA
                    || ((pt.x - bp.x).abs() < POSITION_DELTA && pt.y < bp.y)
                {
                    best = Some(i);
                }
            }
        }
    }
    best
}

/// Rotates a closed point sequence so it starts at index `start`.
#[must_use]
pub fn rotate_to_start<T: Clone>(items: &[T], start: usize) -> Vec<T> {
    if start == 0 || start >= items.len() {
        return items.to_vec();
    }
    let mut rotated = Vec::with_capacity(items.len());
    rotated.extend_from_slice(&items[start..]);
    rotated.extend_from_slice(&items[..start]);
    rotated
}
