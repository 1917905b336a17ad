use crate::error::{GeometryError, Result};
use crate::math::{Point2, POSITION_DELTA};

use super::polygon::Polygon;
use super::segment::Segment;

/// A cursor sampling a polygon's perimeter at a fixed arc-length stride.
///
/// The cursor never steps over a vertex: when the next stride would reach
/// or pass the end of the current segment it stops at the start of the
/// next one instead. Copy the cursor before a walk and hand the copy to
/// [`ContourCursor::passed`] to detect a full lap.
#[derive(Debug, Clone)]
pub struct ContourCursor<'a> {
    track: &'a Polygon,
    stage: usize,
    wind: usize,
    stride: f64,
    z: f64,
    delta: f64,
}

impl<'a> ContourCursor<'a> {
    /// Creates a cursor at the first vertex of `track`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the polygon has no segments,
    /// or `GeometryError::InvalidInput` if `stride` is not a positive
    /// finite number.
    pub fn new(track: &'a Polygon, stride: f64) -> Result<Self> {
        if track.is_empty() {
            return Err(GeometryError::Degenerate("cursor on an empty polygon".into()).into());
        }
        if !(stride.is_finite() && stride > 0.0) {
            return Err(GeometryError::InvalidInput(format!(
                "cursor stride must be positive, got {stride}"
            ))
            .into());
        }
        Ok(Self {
            track,
            stage: 0,
            wind: 0,
            stride,
            z: 0.0,
            delta: POSITION_DELTA,
        })
    }

    /// Overrides the tolerance used when deciding that a segment end is
    /// reached.
    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Index of the current segment.
    #[must_use]
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Number of completed laps.
    #[must_use]
    pub fn wind(&self) -> usize {
        self.wind
    }

    /// Parameter on the current segment.
    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    fn current_segment(&self) -> &Segment {
        &self.track.segments()[self.stage]
    }

    /// The point under the cursor.
    ///
    /// # Errors
    ///
    /// Propagates `GeometryError::ParameterOutOfRange` from
    /// [`Segment::locate`]; `advance` keeps `z` inside `[0, 1)`, so this
    /// only fails on a corrupted cursor.
    pub fn position(&self) -> Result<Point2> {
        self.current_segment().locate(self.z)
    }

    /// Moves one stride along the contour, or to the next vertex if that is
    /// nearer.
    pub fn advance(&mut self) {
        self.z += self.stride / self.current_segment().length();
        if self.z + self.delta >= 1.0 {
            self.stage += 1;
            if self.stage >= self.track.count() {
                self.stage = 0;
                self.wind += 1;
            }
            self.z = 0.0;
        }
    }

    /// Returns `true` once the cursor has completed a lap relative to
    /// `start` and reached or passed `start`'s position again.
    #[must_use]
    pub fn passed(&self, start: &ContourCursor<'_>) -> bool {
        if self.wind <= start.wind {
            return false;
        }
        self.wind > start.wind + 1
            || self.stage > start.stage
            || (self.stage == start.stage && self.z + self.delta >= start.z)
    }
}
