//! Point-wise mapping between image space and panorama space.
//!
//! The overlap algorithm never looks inside a projection. It only asks an
//! injected [`PanoTransform`] to move single points back and forth, and
//! treats a failed mapping as "outside".

mod affine;
mod rectilinear;

pub use affine::AffineTransform;
pub use rectilinear::RectilinearTransform;

use crate::geometry::Polygon;
use crate::math::Point2;

/// Forward and inverse mapping between an image's center-origin pixel
/// coordinates and panorama coordinates.
///
/// Implementations return `None` for points outside their domain and never
/// panic on such input.
pub trait PanoTransform {
    /// Maps an image point into panorama space.
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2>;
    /// Maps a panorama point into image space.
    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2>;
}

impl<T: PanoTransform + ?Sized> PanoTransform for &T {
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2> {
        (**self).image_to_pano(image_xy)
    }

    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2> {
        (**self).pano_to_image(pano_xy)
    }
}

impl<T: PanoTransform + ?Sized> PanoTransform for Box<T> {
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2> {
        (**self).image_to_pano(image_xy)
    }

    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2> {
        (**self).pano_to_image(pano_xy)
    }
}

/// Maps a point from one image into another through panorama space.
#[must_use]
pub fn double_transform<F, T>(p: Point2, from: &F, to: &T) -> Option<Point2>
where
    F: PanoTransform + ?Sized,
    T: PanoTransform + ?Sized,
{
    let pano = from.image_to_pano(p)?;
    let q = to.pano_to_image(pano)?;
    (q.x.is_finite() && q.y.is_finite()).then_some(q)
}

/// Wraps the panorama x coordinate into one `period` centered on 0, like
/// longitude at the seam of a full-turn panorama. The inverse is the
/// identity on the principal period.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Seam {
    pub(crate) period: f64,
}

#[cfg(test)]
impl PanoTransform for Seam {
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2> {
        let turns = ((image_xy.x + self.period / 2.0) / self.period).floor();
        Some(Point2::new(image_xy.x - turns * self.period, image_xy.y))
    }

    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2> {
        Some(pano_xy)
    }
}

/// An image taking part in the panorama: its pixel size and its transform.
#[derive(Debug, Clone)]
pub struct SourceImage<T> {
    pub width: u32,
    pub height: u32,
    pub transform: T,
}

impl<T: PanoTransform> SourceImage<T> {
    /// Creates a new source image.
    #[must_use]
    pub fn new(width: u32, height: u32, transform: T) -> Self {
        Self {
            width,
            height,
            transform,
        }
    }

    #[must_use]
    pub fn width_f64(&self) -> f64 {
        f64::from(self.width)
    }

    #[must_use]
    pub fn height_f64(&self) -> f64 {
        f64::from(self.height)
    }

    /// Area in pixels.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width_f64() * self.height_f64()
    }

    /// The image rectangle widened by `margin`, in center-origin coordinates.
    #[must_use]
    pub fn margin_polygon(&self, margin: f64) -> Polygon {
        Polygon::margin(self.width_f64(), self.height_f64(), margin)
    }

    /// Offset from center-origin to corner-origin pixel coordinates.
    ///
    /// Pixel coordinates run from -0.5 to w - 0.5, hence the half-pixel.
    #[must_use]
    pub fn pixel_offset(&self) -> (f64, f64) {
        (self.width_f64() / 2.0 - 0.5, self.height_f64() / 2.0 - 0.5)
    }

    /// Converts a center-origin point to corner-origin pixel coordinates.
    #[must_use]
    pub fn image_to_pixel(&self, p: Point2) -> Point2 {
        let (ox, oy) = self.pixel_offset();
        Point2::new(p.x + ox, p.y + oy)
    }

    /// Converts corner-origin pixel coordinates to a center-origin point.
    #[must_use]
    pub fn pixel_to_image(&self, p: Point2) -> Point2 {
        let (ox, oy) = self.pixel_offset();
        Point2::new(p.x - ox, p.y - oy)
    }

    /// Maps a panorama point to corner-origin pixel coordinates.
    ///
    /// Returns `None` if the transform fails, produces NaN, or lands outside
    /// the pixel area.
    #[must_use]
    pub fn pano_to_pixel(&self, pano_xy: Point2) -> Option<Point2> {
        let p = self.transform.pano_to_image(pano_xy)?;
        let px = self.image_to_pixel(p);
        if px.x.is_nan() || px.y.is_nan() {
            return None;
        }
        let inside = px.x >= -0.5
            && px.x <= self.width_f64() - 0.5
            && px.y >= -0.5
            && px.y <= self.height_f64() - 0.5;
        inside.then_some(px)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Failing;

    impl PanoTransform for Failing {
        fn image_to_pano(&self, _: Point2) -> Option<Point2> {
            None
        }

        fn pano_to_image(&self, _: Point2) -> Option<Point2> {
            None
        }
    }

    #[test]
    fn double_transform_composes() {
        let a = AffineTransform::translation(10.0, 0.0);
        let b = AffineTransform::translation(0.0, -5.0);
        let q = double_transform(Point2::new(1.0, 1.0), &a, &b).unwrap();
        assert_relative_eq!(q.x, 11.0);
        assert_relative_eq!(q.y, 6.0);
    }

    #[test]
    fn double_transform_propagates_failure() {
        let a = AffineTransform::identity();
        assert!(double_transform(Point2::origin(), &a, &Failing).is_none());
        assert!(double_transform(Point2::origin(), &Failing, &a).is_none());
    }

    #[test]
    fn boxed_transforms_are_transforms() {
        let boxed: Box<dyn PanoTransform> = Box::new(AffineTransform::translation(1.0, 2.0));
        let q = boxed.image_to_pano(Point2::origin()).unwrap();
        assert_relative_eq!(q.x, 1.0);
        assert_relative_eq!(q.y, 2.0);
    }

    #[test]
    fn pixel_conversion_uses_half_pixel_convention() {
        let img = SourceImage::new(100, 50, AffineTransform::identity());
        let px = img.image_to_pixel(Point2::new(-50.0, -25.0));
        assert_relative_eq!(px.x, -0.5);
        assert_relative_eq!(px.y, -0.5);
        let back = img.pixel_to_image(px);
        assert_relative_eq!(back.x, -50.0);
        assert_relative_eq!(back.y, -25.0);
    }

    #[test]
    fn pano_to_pixel_rejects_points_outside_the_image() {
        let img = SourceImage::new(100, 50, AffineTransform::translation(20.0, 0.0));
        let px = img.pano_to_pixel(Point2::new(20.0, 0.0)).unwrap();
        assert_relative_eq!(px.x, 49.5);
        assert_relative_eq!(px.y, 24.5);
        assert!(img.pano_to_pixel(Point2::new(80.0, 0.0)).is_none());
        let broken = SourceImage::new(100, 50, Failing);
        assert!(broken.pano_to_pixel(Point2::origin()).is_none());
    }

    #[test]
    fn seam_wraps_into_one_period() {
        let seam = Seam { period: 1000.0 };
        let p = seam.image_to_pano(Point2::new(550.0, 3.0)).unwrap();
        assert_relative_eq!(p.x, -450.0);
        assert_relative_eq!(p.y, 3.0);
        assert_relative_eq!(seam.image_to_pano(Point2::new(-600.0, 0.0)).unwrap().x, 400.0);
        assert_relative_eq!(seam.image_to_pano(Point2::new(499.0, 0.0)).unwrap().x, 499.0);
    }

    #[test]
    fn margin_polygon_and_area() {
        let img = SourceImage::new(30, 20, AffineTransform::identity());
        assert_relative_eq!(img.area(), 600.0);
        assert_relative_eq!(img.margin_polygon(1.0).perimeter(), 2.0 * (32.0 + 22.0));
    }
}
