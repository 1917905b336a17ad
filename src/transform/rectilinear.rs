use nalgebra::Rotation3;

use super::PanoTransform;
use crate::math::{Point2, Vector3};

/// Directions closer than this to the image plane's horizon are rejected.
const MIN_FORWARD: f64 = 1e-9;

/// A pinhole (rectilinear) camera looking out from the center of a sphere.
///
/// Panorama coordinates are `(longitude, latitude)` in degrees, i.e. an
/// equirectangular panorama of 360 x 180 units. The camera looks along +x
/// at yaw = pitch = roll = 0; image x grows to the right and image y grows
/// downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectilinearTransform {
    focal: f64,
    orientation: Rotation3<f64>,
}

impl RectilinearTransform {
    /// Creates a camera for an image `width` pixels wide covering
    /// `hfov` degrees horizontally, oriented by yaw, pitch and roll in
    /// degrees. Positive pitch tilts the view upward.
    #[must_use]
    pub fn new(width: u32, hfov: f64, yaw: f64, pitch: f64, roll: f64) -> Self {
        let focal = f64::from(width) / 2.0 / (hfov.to_radians() / 2.0).tan();
        Self {
            focal,
            orientation: Rotation3::from_euler_angles(
                roll.to_radians(),
                -pitch.to_radians(),
                yaw.to_radians(),
            ),
        }
    }

    /// Focal length in pixels.
    #[must_use]
    pub fn focal(&self) -> f64 {
        self.focal
    }
}

impl PanoTransform for RectilinearTransform {
    fn image_to_pano(&self, image_xy: Point2) -> Option<Point2> {
        let ray = self.orientation * Vector3::new(self.focal, image_xy.x, -image_xy.y);
        let norm = ray.norm();
        if !norm.is_finite() || norm < MIN_FORWARD {
            return None;
        }
        let lon = ray.y.atan2(ray.x).to_degrees();
        let lat = (ray.z / norm).clamp(-1.0, 1.0).asin().to_degrees();
        Some(Point2::new(lon, lat))
    }

    fn pano_to_image(&self, pano_xy: Point2) -> Option<Point2> {
        let lon = pano_xy.x.to_radians();
        let lat = pano_xy.y.to_radians();
        let world = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
        let cam = self.orientation.inverse() * world;
        if cam.x < MIN_FORWARD {
            return None;
        }
        Some(Point2::new(
            self.focal * cam.y / cam.x,
            -self.focal * cam.z / cam.x,
        ))
    }
}
