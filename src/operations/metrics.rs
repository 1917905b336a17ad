//! Area and centroid of include masks.

use crate::math::polygon_2d::{perimeter_moments, signed_area};
use crate::math::Point2;
use crate::operations::overlap::Mask;

/// Fraction of a `width` x `height` image covered by `include_masks`.
///
/// Each mask contributes the absolute value of its shoelace area, so the
/// result does not depend on winding. Overlapping masks are counted twice;
/// the builder never produces those.
#[must_use]
pub fn calculate_overlap_ratio(include_masks: &[Mask], width: f64, height: f64) -> f64 {
    let area = width * height;
    if area <= 0.0 {
        return 0.0;
    }
    let covered: f64 = include_masks
        .iter()
        .map(|m| signed_area(&m.points).abs())
        .sum();
    covered / area
}

/// Centroid of the include masks' outlines: the mean of all edge midpoints,
/// weighted by edge length.
///
/// Returns `None` if the masks have no perimeter.
#[must_use]
pub fn calculate_overlap_center(include_masks: &[Mask]) -> Option<Point2> {
    let (mut lsum, mut xsum, mut ysum) = (0.0, 0.0, 0.0);
    for mask in include_masks {
        let (l, x, y) = perimeter_moments(&mask.points);
        lsum += l;
        xsum += x;
        ysum += y;
    }
    (lsum > 0.0).then(|| Point2::new(xsum / lsum, ysum / lsum))
}
