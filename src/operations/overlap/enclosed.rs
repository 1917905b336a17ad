use tracing::debug;

use super::descriptor::{taller_than_wide, Mask, Overlap};
use super::frame::MarginFrame;
use super::outline::Sample;
use crate::error::{MaskError, Result};
use crate::math::polygon_2d::{leftmost_index, rotate_to_start};
use crate::math::Point2;
use crate::operations::metrics::calculate_overlap_center;

/// Image sizes of one direction of a pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairSizes {
    pub(crate) this: (f64, f64),
    pub(crate) other: (f64, f64),
}

/// Builds the descriptors for an outline lying wholly inside this image.
///
/// This image gets the projected outline as include mask and a mask with a
/// hole as exclude mask: its margin rectangle, joined at the left margin to
/// the reversed outline starting at its leftmost point. The other image
/// keeps its own sampled outline. `projected_origin` is the other image's
/// center mapped into this image, if that mapping succeeds.
///
/// # Errors
///
/// Returns `MaskError::BrokenChain` if the outline is empty or a sample
/// has no projection.
pub(crate) fn mask_with_hole(
    outline: &[Sample],
    frame: &MarginFrame,
    sizes: PairSizes,
    projected_origin: Option<Point2>,
) -> Result<(Overlap, Overlap)> {
    let twins = outline
        .iter()
        .map(|s| s.twin)
        .collect::<Option<Vec<Point2>>>()
        .ok_or_else(|| MaskError::BrokenChain("enclosed outline without projection".into()))?;
    let start = leftmost_index(&twins)
        .ok_or_else(|| MaskError::BrokenChain("empty outline".into()))?;
    let circuit = rotate_to_start(&twins, start);
    let leftmost = circuit[0];
    let seam = Point2::new(frame.left(), leftmost.y);

    let mut hole: Vec<Point2> = frame.corners().to_vec();
    hole.push(seam);
    hole.push(leftmost);
    hole.extend(circuit.iter().skip(1).rev());
    hole.push(leftmost);
    hole.push(seam);

    let include = Mask::new(circuit);
    let rotate = taller_than_wide(std::slice::from_ref(&include));
    let center = projected_origin
        .or_else(|| calculate_overlap_center(std::slice::from_ref(&include)))
        .unwrap_or_else(Point2::origin);
    debug!(
        seam_y = seam.y,
        outline = outline.len(),
        "other image lies within this one, masking with a hole"
    );

    let (w, h) = sizes.this;
    let this = Overlap::new(vec![include], vec![Mask::new(hole)], center, rotate, w, h);

    let (ow, oh) = sizes.other;
    let own = Mask::new(outline.iter().map(|s| s.pos).collect());
    let other = Overlap::new(vec![own], Vec::new(), Point2::origin(), false, ow, oh);
    Ok((this, other))
}
