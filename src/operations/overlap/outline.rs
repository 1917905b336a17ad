use tracing::trace;

use super::frame::MarginFrame;
use crate::error::{MaskError, Result};
use crate::geometry::{ContourCursor, Polygon};
use crate::math::{self, Point2};
use crate::transform::{double_transform, PanoTransform};

/// Which way the other image's outline passes the margin at a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The outline enters this image.
    In,
    /// The outline leaves this image.
    Out,
}

/// A point on the other image's outline, annotated with its projection
/// into this image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sample {
    /// Position in the other image.
    pub(crate) pos: Point2,
    /// Position in this image, `None` if the projection failed.
    pub(crate) twin: Option<Point2>,
    pub(crate) inside: bool,
    pub(crate) proximity: f64,
    /// Set on localized crossings only.
    pub(crate) direction: Option<Direction>,
}

/// Projects points of the other image into this image and classifies them
/// against this image's margin.
pub(crate) struct Prober<'a, O: ?Sized, T: ?Sized> {
    other: &'a O,
    this: &'a T,
    frame: MarginFrame,
    delta: f64,
}

impl<'a, O, T> Prober<'a, O, T>
where
    O: PanoTransform + ?Sized,
    T: PanoTransform + ?Sized,
{
    pub(crate) fn new(other: &'a O, this: &'a T, frame: MarginFrame, delta: f64) -> Self {
        Self {
            other,
            this,
            frame,
            delta,
        }
    }

    pub(crate) fn project_in(&self, p: Point2) -> Option<Point2> {
        double_transform(p, self.other, self.this)
    }

    fn probe(&self, pos: Point2) -> Sample {
        let twin = self.project_in(pos);
        let (inside, proximity) = self.frame.classify(twin);
        Sample {
            pos,
            twin,
            inside,
            proximity,
            direction: None,
        }
    }

    /// Walks `contour` once at `stride`, probing every stop.
    ///
    /// # Errors
    ///
    /// Returns a `GeometryError` if the contour is empty or the stride is
    /// not positive.
    pub(crate) fn sample_outline(&self, contour: &Polygon, stride: f64) -> Result<Vec<Sample>> {
        let mut cursor = ContourCursor::new(contour, stride)?.with_delta(self.delta);
        let start = cursor.clone();
        let mut outline = Vec::new();
        while !cursor.passed(&start) {
            outline.push(self.probe(cursor.position()?));
            cursor.advance();
        }
        Ok(outline)
    }

    /// Bisects the segment between two samples on opposite sides of the
    /// margin and returns the crossing, its twin snapped onto the margin.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::ProjectionFailed` if the inside sample has no
    /// projection, or `MaskError::SnapFailed` if the crossing's twin cannot
    /// be put on the margin.
    pub(crate) fn localize_crossing(&self, previous: &Sample, current: &Sample) -> Result<Sample> {
        let (inner, pout, direction) = if previous.inside {
            (previous, current.pos, Direction::Out)
        } else {
            (current, previous.pos, Direction::In)
        };
        let mut pin = inner.pos;
        let mut twin = inner
            .twin
            .ok_or(MaskError::ProjectionFailed { x: pin.x, y: pin.y })?;
        let step = math::delta(&pin, &pout);
        let mut stride = 0.5;
        while stride >= self.delta {
            let candidate = pin + step * stride;
            if let Some(t) = self
                .project_in(candidate)
                .filter(|t| self.frame.classify(Some(*t)).0)
            {
                pin = candidate;
                twin = t;
            }
            stride /= 2.0;
        }
        let twin = self.frame.put_on_margin(twin)?;
        trace!(?direction, x = twin.x, y = twin.y, "localized crossing");
        Ok(Sample {
            pos: pin,
            twin: Some(twin),
            inside: true,
            proximity: 0.0,
            direction: Some(direction),
        })
    }

    /// Checks two consecutive inside samples projecting at least
    /// `hop_threshold` apart for a jump in the projected outline.
    ///
    /// The stretch between them is halved, keeping the half with the larger
    /// jump. A continuous projection soon brings the jump below the
    /// threshold; a jump that survives down to `delta`, or a midpoint that
    /// does not project, is returned.
    fn hop(&self, previous: &Sample, current: &Sample, hop_threshold: f64) -> Option<f64> {
        let (mut a, mut b) = (previous.pos, current.pos);
        let (mut ta, mut tb) = (previous.twin?, current.twin?);
        let mut jump = math::distance(&ta, &tb);
        while jump >= hop_threshold {
            if math::distance(&a, &b) < self.delta {
                return Some(jump);
            }
            let mid = nalgebra::center(&a, &b);
            let Some(tm) = self.project_in(mid) else {
                return Some(jump);
            };
            if math::distance(&ta, &tm) >= math::distance(&tm, &tb) {
                b = mid;
                tb = tm;
            } else {
                a = mid;
                ta = tm;
            }
            jump = math::distance(&ta, &tb);
        }
        None
    }

    /// Weaves localized crossings into the outline wherever two consecutive
    /// samples lie on different sides of the margin. The scan is cyclic:
    /// the first sample is compared against the last.
    ///
    /// Returns the amended outline and the number of crossings.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::HopThresholdExceeded` if the outline jumps across
    /// this image between two consecutive inside samples, i.e. leaves it and
    /// reappears elsewhere. Propagates localization errors.
    pub(crate) fn amend(
        &self,
        outline: &[Sample],
        hop_threshold: f64,
    ) -> Result<(Vec<Sample>, usize)> {
        let Some(mut previous) = outline.last() else {
            return Ok((Vec::new(), 0));
        };
        let mut amended = Vec::with_capacity(outline.len() + 4);
        let mut crossings = 0;
        for current in outline {
            if current.inside != previous.inside {
                amended.push(self.localize_crossing(previous, current)?);
                crossings += 1;
            } else if let Some(distance) = current
                .inside
                .then(|| self.hop(previous, current, hop_threshold))
                .flatten()
            {
                return Err(MaskError::HopThresholdExceeded {
                    x: current.pos.x,
                    y: current.pos.y,
                    distance,
                    threshold: hop_threshold,
                }
                .into());
            }
            amended.push(*current);
            previous = current;
        }
        Ok((amended, crossings))
    }
}

/// Returns `true` if every sample is inside and on the margin, i.e. the
/// two images' margins coincide.
pub(crate) fn is_total_coincidence(outline: &[Sample], delta: f64) -> bool {
    !outline.is_empty() && outline.iter().all(|s| s.inside && s.proximity < delta)
}
