pub mod cursor;
pub mod polygon;
pub mod segment;

pub use cursor::ContourCursor;
pub use polygon::Polygon;
pub use segment::Segment;
