use nalgebra::Rotation2;

use super::PanoTransform;
use crate::math::{Point2, Vector2};

/// A similarity transform between the image plane and a planar panorama.
///
/// `pano = offset + scale * R(rotation) * image`. Useful for flat scans and
/// for exercising the overlap algorithm with exactly known geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    rotation: Rotation2<f64>,
    scale: f64,
    offset: Vector2,
}

impl AffineTransform {
    /// Creates a transform with rotation in radians.
    ///
    /// A zero `scale` makes the inverse mapping fail.
    #[must_use]
    pub fn new(offset: Vector2, rotation: f64, scale: f64) -> Self {
        Self {
            rotation: Rotation2::new(rotation),
            scale,
            offset,
        }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(Vector2::zeros(), 0.0, 1.0)
    }

    /// A pure translation by `(dx, dy)`.
    #[must_use]
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(Vector2::new(dx, dy), 0.0, 1.0)
    }
}

impl PanoTransform for AffineTransform {
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2> {
        Some(Point2::from(
            self.rotation * image_xy.coords * self.scale + self.offset,
        ))
    }

    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2> {
        if self.scale.abs() < f64::EPSILON {
            return None;
        }
        let local = self.rotation.inverse() * (pano_xy.coords - self.offset) / self.scale;
        Some(Point2::from(local))
    }
}
