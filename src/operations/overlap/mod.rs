//! Overlap masks for one image against another.
//!
//! [`MaskNonoverlaps`] walks the other image's margin, projects every stop
//! into this image and finds where the projected outline crosses this
//! image's margin. The crossings split both outlines into chains, which are
//! reassembled into include masks (the overlap) and exclude masks (the
//! rest).

mod chains;
mod descriptor;
mod enclosed;
mod frame;
mod outline;

pub use descriptor::{Mask, Overlap, PanoRotation};
pub use outline::Direction;

use tracing::debug;

use crate::error::{GeometryError, MaskError, Result};
use crate::math::polygon_2d::rotate_to_start;
use crate::math::{Point2, POSITION_DELTA, SNAP_TOLERANCE};
use crate::operations::metrics::calculate_overlap_center;
use crate::transform::{PanoTransform, SourceImage};

use chains::{ChainArena, Turn};
use descriptor::taller_than_wide;
use enclosed::{mask_with_hole, PairSizes};
use frame::MarginFrame;
use outline::{is_total_coincidence, Prober};

/// Parameters controlling the overlap walk.
#[derive(Debug, Clone, Copy)]
pub struct MaskParams {
    /// Pixels added around each image rectangle.
    pub margin: f64,
    /// Arc length between samples on the other image's margin.
    pub stride: f64,
    /// Positions closer than this are considered equal.
    pub position_delta: f64,
    /// Maximum distance a crossing is moved to put it on the margin.
    pub snap_tolerance: f64,
    /// Two consecutive inside samples projecting further apart than this
    /// fraction of this image's smaller side abort the pair.
    pub hop_factor: f64,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            margin: 0.0,
            stride: 100.0,
            position_delta: POSITION_DELTA,
            snap_tolerance: SNAP_TOLERANCE,
            hop_factor: 0.7,
        }
    }
}

impl MaskParams {
    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn with_stride(mut self, stride: f64) -> Self {
        self.stride = stride;
        self
    }

    #[must_use]
    pub fn with_snap_tolerance(mut self, snap_tolerance: f64) -> Self {
        self.snap_tolerance = snap_tolerance;
        self
    }

    #[must_use]
    pub fn with_hop_factor(mut self, hop_factor: f64) -> Self {
        self.hop_factor = hop_factor;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("stride", self.stride),
            ("position_delta", self.position_delta),
            ("snap_tolerance", self.snap_tolerance),
            ("hop_factor", self.hop_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidInput(format!(
                    "{name} must be positive, got {value}"
                ))
                .into());
            }
        }
        if !self.margin.is_finite() {
            return Err(GeometryError::InvalidInput(format!(
                "margin must be finite, got {}",
                self.margin
            ))
            .into());
        }
        Ok(())
    }
}

/// What [`MaskNonoverlaps`] found for one direction of a pair.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskOutcome {
    /// The other image lies wholly outside this one. It may still enclose
    /// this image, which the reverse call detects.
    Disjoint,
    /// The margins coincide; the whole image is the overlap.
    Coincident(Overlap),
    /// The outlines cross; masks for this image only.
    Crossing(Overlap),
    /// The other image lies wholly inside this one. Both images get their
    /// masks from this call.
    Enclosing { this: Overlap, other: Overlap },
}

impl MaskOutcome {
    /// This image's descriptor, if any.
    #[must_use]
    pub fn this(&self) -> Option<&Overlap> {
        match self {
            Self::Disjoint => None,
            Self::Coincident(o) | Self::Crossing(o) | Self::Enclosing { this: o, .. } => Some(o),
        }
    }

    /// The other image's descriptor, produced only when it lies inside
    /// this one.
    #[must_use]
    pub fn other(&self) -> Option<&Overlap> {
        match self {
            Self::Enclosing { other, .. } => Some(other),
            _ => None,
        }
    }
}

/// Computes the include and exclude masks of `this` image with respect to
/// `other`.
pub struct MaskNonoverlaps<'a, T, O> {
    this: &'a SourceImage<T>,
    other: &'a SourceImage<O>,
    params: MaskParams,
}

impl<'a, T, O> MaskNonoverlaps<'a, T, O>
where
    T: PanoTransform,
    O: PanoTransform,
{
    /// Creates the operation with default parameters.
    #[must_use]
    pub fn new(this: &'a SourceImage<T>, other: &'a SourceImage<O>) -> Self {
        Self {
            this,
            other,
            params: MaskParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: MaskParams) -> Self {
        self.params = params;
        self
    }

    /// Runs the walk and builds the masks.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidInput` for invalid parameters and a
    /// `MaskError` when the projected outline cannot be turned into masks:
    /// a crossing that cannot be put on or inserted into the margin, a hop
    /// across the image, or chains that do not close.
    pub fn execute(&self) -> Result<MaskOutcome> {
        self.params.validate()?;
        let p = self.params;
        let (w, h) = (self.this.width_f64(), self.this.height_f64());
        let frame = MarginFrame::new(w, h, p.margin, p.position_delta, p.snap_tolerance);
        let prober = Prober::new(
            &self.other.transform,
            &self.this.transform,
            frame,
            p.position_delta,
        );

        let contour = self.other.margin_polygon(p.margin);
        let outline = prober.sample_outline(&contour, p.stride)?;
        let Some(first) = outline.first() else {
            return Ok(MaskOutcome::Disjoint);
        };

        if is_total_coincidence(&outline, p.position_delta) {
            debug!(samples = outline.len(), "image margins coincide");
            let include = vec![Mask::new(frame.corners().to_vec())];
            let center = calculate_overlap_center(&include).unwrap_or_else(Point2::origin);
            return Ok(MaskOutcome::Coincident(Overlap::new(
                include,
                Vec::new(),
                center,
                false,
                w,
                h,
            )));
        }

        let hop_threshold = p.hop_factor * w.min(h);
        let (amended, crossings) = prober.amend(&outline, hop_threshold)?;

        if crossings == 0 {
            if !first.inside {
                debug!("other image lies outside this one");
                return Ok(MaskOutcome::Disjoint);
            }
            let sizes = PairSizes {
                this: (w, h),
                other: (self.other.width_f64(), self.other.height_f64()),
            };
            let projected_origin = prober.project_in(Point2::origin());
            let (this, other) = mask_with_hole(&outline, &frame, sizes, projected_origin)?;
            return Ok(MaskOutcome::Enclosing { this, other });
        }

        let start = amended
            .iter()
            .position(|s| s.direction == Some(Direction::In))
            .ok_or_else(|| MaskError::BrokenChain("no entering crossing".into()))?;
        let amended = rotate_to_start(&amended, start);

        let mut margin = frame.polygon();
        let mut arena = ChainArena::build(&amended, &mut margin, p.position_delta)?;
        let exclude_masks = arena.walk(Turn::Left)?;
        let include_masks = arena.walk(Turn::Right)?;
        debug!(
            crossings,
            nodes = arena.len(),
            include = include_masks.len(),
            exclude = exclude_masks.len(),
            "assembled overlap masks"
        );

        let rotate = taller_than_wide(&include_masks);
        let center = calculate_overlap_center(&include_masks).unwrap_or_else(Point2::origin);
        Ok(MaskOutcome::Crossing(Overlap::new(
            include_masks,
            exclude_masks,
            center,
            rotate,
            w,
            h,
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::math::Vector2;
    use crate::transform::{AffineTransform, RectilinearTransform};
    use approx::assert_relative_eq;

    fn image(width: u32, height: u32, dx: f64, dy: f64) -> SourceImage<AffineTransform> {
        SourceImage::new(width, height, AffineTransform::translation(dx, dy))
    }

    fn total_area(masks: &[Mask]) -> f64 {
        masks.iter().map(|m| signed_area(&m.points).abs()).sum()
    }

    #[test]
    fn crossing_rectangles() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 430.0, 170.0);
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Crossing(overlap) = outcome else {
            panic!("expected a crossing, got {outcome:?}");
        };
        assert_eq!(overlap.include_masks.len(), 1);
        assert_eq!(overlap.exclude_masks.len(), 1);
        assert_relative_eq!(overlap.ratio, 570.0 * 630.0 / 800_000.0, epsilon = 1e-9);
        assert!(overlap.rotate_overlap_pano);
        assert_relative_eq!(
            total_area(&overlap.include_masks) + total_area(&overlap.exclude_masks),
            800_000.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(overlap.center.x, 215.0, epsilon = 1e-6);
        assert_relative_eq!(overlap.center.y, 85.0, epsilon = 1e-6);
    }

    #[test]
    fn crossing_is_symmetric_for_equal_images() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 430.0, 170.0);
        let ab = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let ba = MaskNonoverlaps::new(&b, &a).execute().unwrap();
        let (ab, ba) = (ab.this().unwrap(), ba.this().unwrap());
        assert_relative_eq!(ab.ratio, ba.ratio, epsilon = 1e-9);
        assert_relative_eq!(ba.center.x, -215.0, epsilon = 1e-6);
        assert_relative_eq!(ba.center.y, -85.0, epsilon = 1e-6);
    }

    #[test]
    fn enclosed_image_gets_a_mask_with_a_hole() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(400, 300, 37.0, -52.0);
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Enclosing { this, other } = outcome else {
            panic!("expected an enclosure, got {outcome:?}");
        };
        assert_relative_eq!(this.ratio, 0.15, epsilon = 1e-9);
        assert_eq!(this.exclude_masks.len(), 1);
        assert_relative_eq!(
            this.exclude_masks[0].signed_area().abs(),
            680_000.0,
            epsilon = 1e-6
        );
        assert_eq!(this.center, Point2::new(37.0, -52.0));
        assert!(!this.rotate_overlap_pano);

        assert_relative_eq!(other.ratio, 1.0, epsilon = 1e-9);
        assert!(other.exclude_masks.is_empty());
        let corners: Vec<Point2> = b.margin_polygon(0.0).vertices().collect();
        for corner in corners {
            assert!(other.include_masks[0].points.contains(&corner));
        }

        let reverse = MaskNonoverlaps::new(&b, &a).execute().unwrap();
        assert_eq!(reverse, MaskOutcome::Disjoint);
    }

    #[test]
    fn low_resolution_enclosed_image_is_no_hop() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = SourceImage::new(160, 120, AffineTransform::new(Vector2::zeros(), 0.0, 6.0));
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Enclosing { this, other } = outcome else {
            panic!("expected an enclosure, got {outcome:?}");
        };
        assert_relative_eq!(this.ratio, 960.0 * 720.0 / 800_000.0, epsilon = 1e-9);
        assert_eq!(this.center, Point2::origin());
        assert_relative_eq!(other.ratio, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn low_resolution_crossing_image_is_no_hop() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = SourceImage::new(
            160,
            120,
            AffineTransform::new(Vector2::new(400.0, 100.0), 0.0, 6.0),
        );
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Crossing(overlap) = outcome else {
            panic!("expected a crossing, got {outcome:?}");
        };
        assert_eq!(overlap.include_masks.len(), 1);
        assert_relative_eq!(overlap.ratio, 580.0 * 660.0 / 800_000.0, epsilon = 1e-9);
    }

    #[test]
    fn images_sharing_an_edge_line_overlap_by_half() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 0.0, 400.0);
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Crossing(overlap) = outcome else {
            panic!("expected a crossing, got {outcome:?}");
        };
        assert_eq!(overlap.include_masks.len(), 1);
        assert_relative_eq!(overlap.ratio, 0.5, epsilon = 1e-9);
        assert_relative_eq!(overlap.center.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(overlap.center.y, 200.0, epsilon = 1e-6);
        assert!(!overlap.rotate_overlap_pano);
        assert_relative_eq!(
            total_area(&overlap.include_masks) + total_area(&overlap.exclude_masks),
            800_000.0,
            epsilon = 1e-6
        );

        let reverse = MaskNonoverlaps::new(&b, &a).execute().unwrap();
        assert_relative_eq!(reverse.this().unwrap().ratio, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn identical_images_coincide() {
        let a = image(1000, 800, 0.0, 0.0);
        let outcome = MaskNonoverlaps::new(&a, &a).execute().unwrap();
        let MaskOutcome::Coincident(overlap) = outcome else {
            panic!("expected coincidence, got {outcome:?}");
        };
        assert_relative_eq!(overlap.ratio, 1.0);
        assert!(overlap.exclude_masks.is_empty());
        assert_relative_eq!(overlap.center.x, 0.0);
        assert_relative_eq!(overlap.center.y, 0.0);
    }

    #[test]
    fn distant_images_are_disjoint() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 2000.0, 0.0);
        assert_eq!(MaskNonoverlaps::new(&a, &b).execute().unwrap(), MaskOutcome::Disjoint);
        assert_eq!(MaskNonoverlaps::new(&b, &a).execute().unwrap(), MaskOutcome::Disjoint);
    }

    #[test]
    fn margin_widens_the_overlap() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 430.0, 170.0);
        let params = MaskParams::default().with_margin(10.0);
        let outcome = MaskNonoverlaps::new(&a, &b).with_params(params).execute().unwrap();
        let overlap = outcome.this().unwrap();
        assert_relative_eq!(overlap.ratio, 590.0 * 650.0 / 800_000.0, epsilon = 1e-9);
    }

    #[test]
    fn rectilinear_neighbours_overlap() {
        let a = SourceImage::new(1000, 750, RectilinearTransform::new(1000, 60.0, 0.0, 0.0, 0.0));
        let b = SourceImage::new(1000, 750, RectilinearTransform::new(1000, 60.0, 40.0, 0.0, 0.0));
        let outcome = MaskNonoverlaps::new(&a, &b).execute().unwrap();
        let MaskOutcome::Crossing(overlap) = outcome else {
            panic!("expected a crossing, got {outcome:?}");
        };
        assert!(overlap.ratio > 0.1 && overlap.ratio < 0.5, "{}", overlap.ratio);
        assert!(overlap.rotate_overlap_pano);
        assert!(overlap.center.x > 0.0);
        for p in overlap.include_masks.iter().flat_map(|m| m.points.iter()) {
            assert!(p.x >= -500.0 - 1e-6 && p.x <= 500.0 + 1e-6);
            assert!(p.y >= -375.0 - 1e-6 && p.y <= 375.0 + 1e-6);
        }
        assert_relative_eq!(
            total_area(&overlap.include_masks) + total_area(&overlap.exclude_masks),
            750_000.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let a = image(100, 100, 0.0, 0.0);
        let params = MaskParams::default().with_stride(0.0);
        assert!(MaskNonoverlaps::new(&a, &a).with_params(params).execute().is_err());
        let params = MaskParams::default().with_hop_factor(f64::NAN);
        assert!(MaskNonoverlaps::new(&a, &a).with_params(params).execute().is_err());
        let params = MaskParams::default().with_snap_tolerance(-0.1);
        assert!(MaskNonoverlaps::new(&a, &a).with_params(params).execute().is_err());
    }

    #[test]
    fn wider_snap_tolerance_keeps_exact_crossings() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 430.0, 170.0);
        let params = MaskParams::default().with_snap_tolerance(0.5);
        let outcome = MaskNonoverlaps::new(&a, &b).with_params(params).execute().unwrap();
        let overlap = outcome.this().unwrap();
        assert_relative_eq!(overlap.ratio, 570.0 * 630.0 / 800_000.0, epsilon = 1e-9);
    }

    #[test]
    fn outcome_accessors() {
        assert!(MaskOutcome::Disjoint.this().is_none());
        assert!(MaskOutcome::Disjoint.other().is_none());
    }
}
