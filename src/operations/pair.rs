//! Overlap analysis of image pairs.

use tracing::{debug, info, warn};

use crate::error::{GeometryError, OvermaskError, Result};
use crate::operations::overlap::{MaskNonoverlaps, MaskOutcome, MaskParams, Overlap};
use crate::transform::{PanoTransform, SourceImage};

/// Bounds on the overlap ratio deciding whether a pair is worth matching.
#[derive(Debug, Clone, Copy)]
pub struct PairParams {
    /// Pairs where both ratios are at or below this are too small.
    pub threshold: f64,
    /// Pairs where both ratios exceed this are too large.
    pub ceiling: f64,
}

impl Default for PairParams {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            ceiling: 1.0,
        }
    }
}

impl PairParams {
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// # Errors
    ///
    /// Returns `GeometryError::InvalidInput` if the threshold exceeds the
    /// ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > self.ceiling {
            return Err(GeometryError::InvalidInput(format!(
                "overlap threshold {} is above ceiling {}",
                self.threshold, self.ceiling
            ))
            .into());
        }
        Ok(())
    }
}

/// The overlap of both images of a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairOverlap {
    /// Overlap in the first image, `None` if the images do not overlap.
    pub first: Option<Overlap>,
    /// Overlap in the second image.
    pub second: Option<Overlap>,
}

impl PairOverlap {
    /// Overlap ratio of the first image, 0 without overlap.
    #[must_use]
    pub fn first_ratio(&self) -> f64 {
        self.first.as_ref().map_or(0.0, |o| o.ratio)
    }

    /// Overlap ratio of the second image, 0 without overlap.
    #[must_use]
    pub fn second_ratio(&self) -> f64 {
        self.second.as_ref().map_or(0.0, |o| o.ratio)
    }

    /// Returns `false` if both ratios are at or below the threshold, or
    /// both exceed the ceiling.
    #[must_use]
    pub fn qualifies(&self, params: &PairParams) -> bool {
        let (a, b) = (self.first_ratio(), self.second_ratio());
        if a <= params.threshold && b <= params.threshold {
            return false;
        }
        !(a > params.ceiling && b > params.ceiling)
    }
}

/// Runs [`MaskNonoverlaps`] in both directions of an image pair.
pub struct OverlapAnalysis<'a, A, B> {
    first: &'a SourceImage<A>,
    second: &'a SourceImage<B>,
    params: MaskParams,
}

impl<'a, A, B> OverlapAnalysis<'a, A, B>
where
    A: PanoTransform,
    B: PanoTransform,
{
    #[must_use]
    pub fn new(first: &'a SourceImage<A>, second: &'a SourceImage<B>) -> Self {
        Self {
            first,
            second,
            params: MaskParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: MaskParams) -> Self {
        self.params = params;
        self
    }

    /// Computes both images' overlap descriptors.
    ///
    /// Each image takes its own result from the call where it is `this`;
    /// an image lying inside its partner gets its descriptor from the
    /// reverse call instead.
    ///
    /// # Errors
    ///
    /// Propagates errors from either direction.
    pub fn execute(&self) -> Result<PairOverlap> {
        let forward = MaskNonoverlaps::new(self.first, self.second)
            .with_params(self.params)
            .execute()?;
        let backward = MaskNonoverlaps::new(self.second, self.first)
            .with_params(self.params)
            .execute()?;
        let first = pick(&forward, &backward);
        let second = pick(&backward, &forward);
        Ok(PairOverlap { first, second })
    }
}

fn pick(own: &MaskOutcome, reverse: &MaskOutcome) -> Option<Overlap> {
    own.this().or_else(|| reverse.other()).cloned()
}

/// Lists the image pairs to analyse.
///
/// Without a focus image, every combination `(a, b)` with `a` before `b`
/// in `images`; with one, every `(focus, b)`. Images in `exclude` are
/// skipped.
///
/// # Errors
///
/// Returns `GeometryError::InvalidInput` if the focus image is not in
/// `images` or is excluded.
pub fn select_pairs(
    images: &[usize],
    focus: Option<usize>,
    exclude: &[usize],
) -> Result<Vec<(usize, usize)>> {
    let active: Vec<usize> = images
        .iter()
        .copied()
        .filter(|i| !exclude.contains(i))
        .collect();
    if let Some(f) = focus {
        if !active.contains(&f) {
            return Err(GeometryError::InvalidInput(format!(
                "focus image {f} is not among the selected images"
            ))
            .into());
        }
        return Ok(active
            .iter()
            .copied()
            .filter(|&i| i != f)
            .map(|i| (f, i))
            .collect());
    }
    let mut pairs = Vec::new();
    for (n, &a) in active.iter().enumerate() {
        for &b in &active[n + 1..] {
            pairs.push((a, b));
        }
    }
    Ok(pairs)
}

/// The analysis of one pair in a batch.
#[derive(Debug, Clone)]
pub struct PairReport {
    pub first: usize,
    pub second: usize,
    pub overlap: PairOverlap,
    /// Whether the pair passed the threshold and ceiling.
    pub qualifies: bool,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Pairs analysed successfully, in processing order.
    pub pairs: Vec<PairReport>,
    /// Errors of pairs that were skipped, each wrapped with its pair.
    pub failures: Vec<OvermaskError>,
    /// Whether the stop signal ended the batch early.
    pub stopped: bool,
}

impl BatchReport {
    /// Pairs worth matching.
    pub fn qualifying(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|r| r.qualifies)
    }
}

/// Analyses many pairs of a set of images. A failing pair is logged and
/// skipped.
pub struct BatchAnalysis<'a, T> {
    images: &'a [SourceImage<T>],
    mask_params: MaskParams,
    pair_params: PairParams,
    focus: Option<usize>,
    exclude: Vec<usize>,
}

impl<'a, T: PanoTransform> BatchAnalysis<'a, T> {
    #[must_use]
    pub fn new(images: &'a [SourceImage<T>]) -> Self {
        Self {
            images,
            mask_params: MaskParams::default(),
            pair_params: PairParams::default(),
            focus: None,
            exclude: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mask_params(mut self, params: MaskParams) -> Self {
        self.mask_params = params;
        self
    }

    #[must_use]
    pub fn with_pair_params(mut self, params: PairParams) -> Self {
        self.pair_params = params;
        self
    }

    /// Only pairs with this image are analysed.
    #[must_use]
    pub fn with_focus(mut self, focus: usize) -> Self {
        self.focus = Some(focus);
        self
    }

    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<usize>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Analyses all selected pairs.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidInput` for invalid pair parameters or
    /// focus image. Errors of single pairs are collected in the report.
    pub fn execute(&self) -> Result<BatchReport> {
        self.execute_until(|| false)
    }

    /// Like [`BatchAnalysis::execute`], checking `stop` before each pair
    /// and ending the batch once it returns `true`.
    ///
    /// # Errors
    ///
    /// See [`BatchAnalysis::execute`].
    pub fn execute_until<F>(&self, mut stop: F) -> Result<BatchReport>
    where
        F: FnMut() -> bool,
    {
        self.pair_params.validate()?;
        let indices: Vec<usize> = (0..self.images.len()).collect();
        let pairs = select_pairs(&indices, self.focus, &self.exclude)?;
        let mut report = BatchReport::default();

        for (a, b) in pairs {
            if stop() {
                info!(
                    analysed = report.pairs.len(),
                    "stop requested, ending batch"
                );
                report.stopped = true;
                break;
            }
            debug!(first = a, second = b, "examining image pair");
            let analysis = OverlapAnalysis::new(&self.images[a], &self.images[b])
                .with_params(self.mask_params)
                .execute();
            match analysis {
                Ok(overlap) => {
                    let qualifies = overlap.qualifies(&self.pair_params);
                    debug!(
                        first = a,
                        second = b,
                        first_ratio = overlap.first_ratio(),
                        second_ratio = overlap.second_ratio(),
                        qualifies,
                        "pair analysed"
                    );
                    report.pairs.push(PairReport {
                        first: a,
                        second: b,
                        overlap,
                        qualifies,
                    });
                }
                Err(err) => {
                    let err = err.in_pair(a, b);
                    warn!(error = %err, "skipping image pair");
                    report.failures.push(err);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::transform::{AffineTransform, Seam};
    use approx::assert_relative_eq;

    fn image(width: u32, height: u32, dx: f64, dy: f64) -> SourceImage<AffineTransform> {
        SourceImage::new(width, height, AffineTransform::translation(dx, dy))
    }

    #[test]
    fn crossing_pair_fills_both_sides() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 430.0, 170.0);
        let pair = OverlapAnalysis::new(&a, &b).execute().unwrap();
        assert_relative_eq!(pair.first_ratio(), 0.448_875, epsilon = 1e-9);
        assert_relative_eq!(pair.second_ratio(), 0.448_875, epsilon = 1e-9);
        assert!(pair.qualifies(&PairParams::default()));
        assert!(!pair.qualifies(&PairParams::default().with_ceiling(0.4)));
        assert!(!pair.qualifies(&PairParams::default().with_threshold(0.5)));
    }

    #[test]
    fn enclosed_image_is_filled_from_the_reverse_call() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(400, 300, 37.0, -52.0);

        let pair = OverlapAnalysis::new(&b, &a).execute().unwrap();
        assert_relative_eq!(pair.first_ratio(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(pair.second_ratio(), 0.15, epsilon = 1e-9);
        let first = pair.first.as_ref().unwrap();
        assert_eq!(first.center, Point2::origin());
        assert!(first.exclude_masks.is_empty());
        assert_eq!(pair.second.as_ref().unwrap().exclude_masks.len(), 1);
    }

    #[test]
    fn disjoint_pair_does_not_qualify() {
        let a = image(1000, 800, 0.0, 0.0);
        let b = image(1000, 800, 2000.0, 0.0);
        let pair = OverlapAnalysis::new(&a, &b).execute().unwrap();
        assert!(pair.first.is_none() && pair.second.is_none());
        assert_relative_eq!(pair.first_ratio(), 0.0);
        assert!(!pair.qualifies(&PairParams::default()));
    }

    #[test]
    fn identical_images_exceed_a_lower_ceiling() {
        let a = image(1000, 800, 0.0, 0.0);
        let pair = OverlapAnalysis::new(&a, &a).execute().unwrap();
        assert!(pair.qualifies(&PairParams::default()));
        assert!(!pair.qualifies(&PairParams::default().with_ceiling(0.9)));
    }

    #[test]
    fn select_all_combinations() {
        let pairs = select_pairs(&[0, 1, 2, 3], None, &[]).unwrap();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn select_with_focus_and_exclusion() {
        let pairs = select_pairs(&[0, 1, 2, 3], Some(2), &[1]).unwrap();
        assert_eq!(pairs, vec![(2, 0), (2, 3)]);
        let pairs = select_pairs(&[0, 1, 2, 3], None, &[0, 3]).unwrap();
        assert_eq!(pairs, vec![(1, 2)]);
        assert!(select_pairs(&[0, 1, 2], Some(1), &[1]).is_err());
        assert!(select_pairs(&[0, 1], Some(5), &[]).is_err());
    }

    #[test]
    fn threshold_above_ceiling_is_invalid() {
        let params = PairParams::default().with_threshold(0.8).with_ceiling(0.5);
        assert!(params.validate().is_err());
        let images = [image(100, 100, 0.0, 0.0)];
        assert!(BatchAnalysis::new(&images)
            .with_pair_params(params)
            .execute()
            .is_err());
    }

    fn boxed<T: PanoTransform + 'static>(
        width: u32,
        height: u32,
        transform: T,
    ) -> SourceImage<Box<dyn PanoTransform>> {
        let transform: Box<dyn PanoTransform> = Box::new(transform);
        SourceImage::new(width, height, transform)
    }

    /// A strip wrapping across a full-turn seam, with images on both sides.
    fn seam_row() -> Vec<SourceImage<Box<dyn PanoTransform>>> {
        vec![
            boxed(1000, 800, AffineTransform::identity()),
            boxed(1000, 800, AffineTransform::translation(430.0, 600.0)),
            boxed(1200, 300, Seam { period: 1000.0 }),
        ]
    }

    #[test]
    fn batch_isolates_failing_pairs() {
        // the strip leaves image 0 through its right margin and reappears at its left
        let images = seam_row();
        let report = BatchAnalysis::new(&images).execute().unwrap();
        assert!(!report.stopped);
        assert_eq!(report.pairs.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!((report.pairs[0].first, report.pairs[0].second), (0, 1));
        assert_relative_eq!(report.pairs[0].overlap.first_ratio(), 0.1425, epsilon = 1e-9);
        assert!(report.pairs[0].qualifies);
        assert_eq!((report.pairs[1].first, report.pairs[1].second), (1, 2));
        assert!(!report.pairs[1].qualifies);
        let failure = &report.failures[0];
        assert!(
            matches!(failure, OvermaskError::Pair { first: 0, second: 2, .. }),
            "{failure}"
        );
        assert!(failure.to_string().contains("hop threshold"), "{failure}");
    }

    #[test]
    fn batch_skips_excluded_images() {
        let images = seam_row();
        let report = BatchAnalysis::new(&images)
            .with_exclude(vec![2])
            .execute()
            .unwrap();
        let visited: Vec<(usize, usize)> =
            report.pairs.iter().map(|r| (r.first, r.second)).collect();
        assert_eq!(visited, vec![(0, 1)]);
        assert!(report.failures.is_empty());
        assert_eq!(report.qualifying().count(), 1);
    }

    #[test]
    fn batch_honours_the_stop_signal() {
        let images = [
            image(1000, 800, 0.0, 0.0),
            image(1000, 800, 430.0, 170.0),
            image(1000, 800, -430.0, 60.0),
        ];
        let mut calls = 0;
        let report = BatchAnalysis::new(&images)
            .execute_until(|| {
                calls += 1;
                calls > 1
            })
            .unwrap();
        assert!(report.stopped);
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.qualifying().count(), 1);
    }

    #[test]
    fn batch_with_focus_only_visits_focus_pairs() {
        let images = [
            image(1000, 800, 0.0, 0.0),
            image(1000, 800, 430.0, 170.0),
            image(1000, 800, -430.0, 60.0),
        ];
        let report = BatchAnalysis::new(&images).with_focus(2).execute().unwrap();
        let visited: Vec<(usize, usize)> =
            report.pairs.iter().map(|r| (r.first, r.second)).collect();
        assert_eq!(visited, vec![(2, 0), (2, 1)]);
        assert!(report.failures.is_empty());
    }
}
