pub mod metrics;
pub mod overlap;
pub mod pair;

pub use metrics::{calculate_overlap_center, calculate_overlap_ratio};
pub use overlap::{
    Direction, Mask, MaskNonoverlaps, MaskOutcome, MaskParams, Overlap, PanoRotation,
};
pub use pair::{
    select_pairs, BatchAnalysis, BatchReport, OverlapAnalysis, PairOverlap, PairParams,
    PairReport,
};
