use thiserror::Error;

/// Top-level error type for overlap masking.
#[derive(Debug, Error)]
pub enum OvermaskError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mask(#[from] MaskError),

    /// An error raised while processing one image pair of a batch.
    #[error("image pair ({first}, {second}): {source}")]
    Pair {
        first: usize,
        second: usize,
        #[source]
        source: Box<OvermaskError>,
    },
}

impl OvermaskError {
    /// Wraps this error with the indices of the image pair it belongs to.
    #[must_use]
    pub fn in_pair(self, first: usize, second: usize) -> Self {
        Self::Pair {
            first,
            second,
            source: Box::new(self),
        }
    }
}

/// Precondition violations in the geometric primitives.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Inconsistencies that abort the mask computation for the current pair.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("failed to insert crossing point ({x:.6}, {y:.6}) into the margin polygon")]
    InsertionFailed { x: f64, y: f64 },

    #[error("cannot put ({x:.6}, {y:.6}) on the image margin")]
    SnapFailed { x: f64, y: f64 },

    #[error("cannot project ({x:.6}, {y:.6}) into this image")]
    ProjectionFailed { x: f64, y: f64 },

    #[error("hop threshold exceeded: outline jumps {distance:.3} across this image before ({x:.3}, {y:.3}) (threshold {threshold:.3})")]
    HopThresholdExceeded {
        x: f64,
        y: f64,
        distance: f64,
        threshold: f64,
    },

    #[error("broken mask chain: {0}")]
    BrokenChain(String),
}

/// Convenience type alias for results using [`OvermaskError`].
pub type Result<T> = std::result::Result<T, OvermaskError>;
