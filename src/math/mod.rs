pub mod polygon_2d;

/// 2D point type, in center-origin image coordinates unless stated otherwise.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Positions closer than this are considered equal.
pub const POSITION_DELTA: f64 = 1e-6;

/// Maximum distance over which a projected crossing point is snapped onto
/// the image margin. The double transform is too imprecise for anything
/// tighter.
pub const SNAP_TOLERANCE: f64 = 0.1;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(p: &Point2, q: &Point2) -> f64 {
    nalgebra::distance(p, q)
}

/// Component-wise difference `q - p`.
#[must_use]
pub fn delta(p: &Point2, q: &Point2) -> Vector2 {
    q - p
}
