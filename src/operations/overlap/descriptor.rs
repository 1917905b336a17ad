use crate::math::polygon_2d::{extents, signed_area};
use crate::math::Point2;
use crate::operations::metrics::calculate_overlap_ratio;
use crate::transform::PanoTransform;

/// A mask polygon in center-origin image coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mask {
    /// The ordered vertices; the polygon closes implicitly.
    pub points: Vec<Point2>,
}

impl Mask {
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed shoelace area; the sign reflects the winding.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// The mask in corner-origin pixel coordinates of a `width` x `height`
    /// image, where pixel centers run from 0 to w - 1 and the image spans
    /// -0.5 to w - 0.5.
    #[must_use]
    pub fn to_pixel(&self, width: u32, height: u32) -> Vec<Point2> {
        let ox = f64::from(width) / 2.0 - 0.5;
        let oy = f64::from(height) / 2.0 - 0.5;
        self.points
            .iter()
            .map(|p| Point2::new(p.x + ox, p.y + oy))
            .collect()
    }
}

/// The overlap of an image with its partner, in that image's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    /// Regions to keep.
    pub include_masks: Vec<Mask>,
    /// Regions to discard, used for masks with a hole.
    pub exclude_masks: Vec<Mask>,
    /// Centroid of the include masks' outlines.
    pub center: Point2,
    /// Whether the panorama should be turned by 90 degrees so the longer
    /// extent of the overlap runs horizontally.
    pub rotate_overlap_pano: bool,
    /// Fraction of the image area covered by the include masks.
    pub ratio: f64,
}

impl Overlap {
    /// Creates a descriptor, computing the ratio against a `width` x
    /// `height` image.
    #[must_use]
    pub fn new(
        include_masks: Vec<Mask>,
        exclude_masks: Vec<Mask>,
        center: Point2,
        rotate_overlap_pano: bool,
        width: f64,
        height: f64,
    ) -> Self {
        let ratio = calculate_overlap_ratio(&include_masks, width, height);
        Self {
            include_masks,
            exclude_masks,
            center,
            rotate_overlap_pano,
            ratio,
        }
    }

    /// Width and height of the include masks' common bounding box.
    #[must_use]
    pub fn include_extent(&self) -> Option<(f64, f64)> {
        include_extent(&self.include_masks)
    }

    /// The panorama rotation that brings the overlap center to the
    /// panorama origin, with the overlap's longer extent horizontal.
    ///
    /// Expects a transform onto an equirectangular 360 x 180 panorama, whose
    /// coordinates are longitude and latitude in degrees. Returns `None` if
    /// the center cannot be mapped.
    #[must_use]
    pub fn alignment<T: PanoTransform + ?Sized>(&self, transform: &T) -> Option<PanoRotation> {
        let center = transform.image_to_pano(self.center)?;
        Some(PanoRotation {
            yaw: -center.x,
            pitch: center.y,
            roll: if self.rotate_overlap_pano { 90.0 } else { 0.0 },
        })
    }
}

/// Rotation of the panorama in degrees, applied as yaw, then pitch, then
/// roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanoRotation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

pub(crate) fn include_extent(masks: &[Mask]) -> Option<(f64, f64)> {
    let (min, max) = extents(masks.iter().flat_map(|m| m.points.iter()))?;
    Some((max.x - min.x, max.y - min.y))
}

/// `true` when the masks are taller than wide.
pub(crate) fn taller_than_wide(masks: &[Mask]) -> bool {
    include_extent(masks).is_some_and(|(dx, dy)| dx < dy)
}
