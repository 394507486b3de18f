//! Up-front shape and label checks shared by the resolver and the compositing pass.

use image::RgbImage;

use crate::error::{RecolorError, RecolorResult};
use crate::region_labelling::LabelMap;

/// Per-label pixel counts, produced by [`validate`].
///
/// Index `0` counts background pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHistogram {
    counts: Vec<u64>,
}

impl RegionHistogram {
    /// The label count `N` this histogram was validated against.
    pub fn label_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of pixels carrying `label`, `0` for labels outside `[0, N - 1]`.
    pub fn pixel_count(&self, label: usize) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Non-background labels with no member pixels, in ascending order.
    pub fn empty_labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, count)| **count == 0)
            .map(|(label, _)| label)
    }
}

/// Fails with [`RecolorError::ShapeMismatch`] unless both `(width, height)` pairs agree.
///
/// `what` names the input compared against the base image in the diagnostic.
pub fn check_dimensions(
    what: &'static str,
    base: (u32, u32),
    other: (u32, u32),
) -> RecolorResult<()> {
    if base != other {
        return Err(RecolorError::ShapeMismatch { what, base, other });
    }
    Ok(())
}

/// Validates `base`, `labels` and `label_count` before any pixel is written.
///
/// Checks, in order:
///
/// 1. base image and label map have identical width and height;
/// 2. `label_count` is positive;
/// 3. every label lies in `[0, label_count - 1]`.
///
/// The label scan doubles as a histogram pass, so callers get per-label pixel
/// counts for free.
///
/// # Errors
///
/// [`RecolorError::ShapeMismatch`], [`RecolorError::InvalidLabelCount`], or
/// [`RecolorError::Allocation`] if the histogram for `label_count` labels
/// cannot be allocated.
pub fn validate(
    base: &RgbImage,
    labels: &LabelMap,
    label_count: usize,
) -> RecolorResult<RegionHistogram> {
    check_dimensions("label map", base.dimensions(), labels.dimensions())?;

    if label_count == 0 {
        return Err(RecolorError::label_count(
            "label count must be at least 1 (background)",
        ));
    }

    let mut counts = Vec::new();
    counts.try_reserve_exact(label_count)?;
    counts.resize(label_count, 0u64);

    let width = labels.width() as usize;
    for (i, &label) in labels.as_slice().iter().enumerate() {
        match usize::try_from(label) {
            Ok(index) if index < label_count => counts[index] += 1,
            _ => {
                return Err(RecolorError::label_count(format!(
                    "label {label} at ({}, {}) is outside [0, {}]",
                    i % width,
                    i / width,
                    label_count - 1
                )));
            }
        }
    }

    Ok(RegionHistogram { counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn block_labels() -> LabelMap {
        LabelMap::from_fn(4, 4, |x, y| i32::from((1..3).contains(&x) && (1..3).contains(&y)))
    }

    #[test]
    fn histogram_counts_every_label() {
        let base = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let histogram = validate(&base, &block_labels(), 3).unwrap();

        assert_eq!(histogram.label_count(), 3);
        assert_eq!(histogram.pixel_count(0), 12);
        assert_eq!(histogram.pixel_count(1), 4);
        assert_eq!(histogram.pixel_count(2), 0);
        assert_eq!(histogram.pixel_count(9), 0);
        assert_eq!(histogram.empty_labels().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn mismatched_dimensions_are_reported() {
        let base = RgbImage::new(4, 5);
        let err = validate(&base, &block_labels(), 2).unwrap_err();
        match err {
            RecolorError::ShapeMismatch { what, base, other } => {
                assert_eq!(what, "label map");
                assert_eq!(base, (4, 5));
                assert_eq!(other, (4, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_label_count_is_rejected() {
        let base = RgbImage::new(4, 4);
        let err = validate(&base, &block_labels(), 0).unwrap_err();
        assert!(matches!(err, RecolorError::InvalidLabelCount(_)));
    }

    #[test]
    fn out_of_range_and_negative_labels_are_rejected() {
        let base = RgbImage::new(2, 2);

        let too_large = LabelMap::from_raw(2, 2, vec![0, 1, 0, 5]).unwrap();
        let err = validate(&base, &too_large, 3).unwrap_err();
        assert!(matches!(err, RecolorError::InvalidLabelCount(_)));
        assert!(err.to_string().contains("label 5 at (1, 1)"));

        let negative = LabelMap::from_raw(2, 2, vec![0, -1, 0, 0]).unwrap();
        let err = validate(&base, &negative, 3).unwrap_err();
        assert!(err.to_string().contains("label -1 at (1, 0)"));
    }

    #[test]
    fn empty_images_validate() {
        let base = RgbImage::new(0, 0);
        let labels = LabelMap::from_raw(0, 0, Vec::new()).unwrap();
        let histogram = validate(&base, &labels, 1).unwrap();
        assert_eq!(histogram.pixel_count(0), 0);
        assert_eq!(histogram.empty_labels().count(), 0);
    }
}
