//! The compositing pass: paints resolved region colors over a copy of the base image.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

use crate::error::{RecolorError, RecolorResult};
use crate::region_labelling::LabelMap;
use crate::resolve::RegionColors;
use crate::validation::validate;

/// Minimum number of rows handed to one rayon task.
const BAND_ROWS: usize = 16;

/// Produces a new image where every pixel with a non-zero label takes its
/// region's color and background pixels are copied from `base`.
///
/// All preconditions are checked before the output buffer is allocated:
/// matching dimensions, `label_count >= 1`, every label in
/// `[0, label_count - 1]`, and a color table covering `label_count` labels.
/// The pass itself runs row bands in parallel on the current rayon pool.
///
/// # Errors
///
/// [`RecolorError::ShapeMismatch`], [`RecolorError::InvalidLabelCount`] or
/// [`RecolorError::Allocation`]. No partial output is ever returned.
pub fn composite(
    base: &RgbImage,
    labels: &LabelMap,
    colors: &RegionColors,
    label_count: usize,
) -> RecolorResult<RgbImage> {
    validate(base, labels, label_count)?;
    composite_validated(base, labels, colors, label_count)
}

/// [`composite`] for inputs that already went through [`validate`].
#[tracing::instrument(skip_all, fields(width = base.width(), height = base.height(), label_count = label_count))]
pub(crate) fn composite_validated(
    base: &RgbImage,
    labels: &LabelMap,
    colors: &RegionColors,
    label_count: usize,
) -> RecolorResult<RgbImage> {
    if colors.label_count() != label_count {
        return Err(RecolorError::label_count(format!(
            "color table covers {} labels, label count is {label_count}",
            colors.label_count()
        )));
    }

    let (width, height) = base.dimensions();
    let row_len = width as usize * 3;
    let len = row_len * height as usize;

    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(len)?;
    out.resize(len, 0);

    if len > 0 {
        let table = colors.table();
        out.par_chunks_exact_mut(row_len)
            .zip(base.as_raw().par_chunks_exact(row_len))
            .zip(labels.as_slice().par_chunks_exact(width as usize))
            .with_min_len(BAND_ROWS)
            .for_each(|((out_row, base_row), label_row)| {
                paint_row(out_row, base_row, label_row, table);
            });
    }

    tracing::debug!(pixels = len / 3, "composited regions");

    RgbImage::from_raw(width, height, out).ok_or(RecolorError::ShapeMismatch {
        what: "label map",
        base: (width, height),
        other: labels.dimensions(),
    })
}

/// Labels must already be validated against `table`.
fn paint_row(out: &mut [u8], base: &[u8], labels: &[i32], table: &[Rgb<u8>]) {
    for ((dst, src), &label) in out
        .chunks_exact_mut(3)
        .zip(base.chunks_exact(3))
        .zip(labels)
    {
        if label == 0 {
            dst.copy_from_slice(src);
        } else {
            dst.copy_from_slice(&table[label as usize].0);
        }
    }
}

/// Builds a dedicated worker pool with exactly `threads` workers.
pub(crate) fn build_thread_pool(threads: usize) -> RecolorResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(RecolorError::config("threads must be >= 1 when set"));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| RecolorError::ThreadPool(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ColorPolicy, resolve_region_colors};

    fn colors_for(base: &RgbImage, labels: &LabelMap, n: usize) -> RegionColors {
        let histogram = validate(base, labels, n).unwrap();
        let policy = ColorPolicy::Cyclic(vec![Rgb([255, 0, 0]), Rgb([0, 0, 255])]);
        resolve_region_colors(base, labels, &histogram, &policy).unwrap()
    }

    #[test]
    fn paints_regions_and_keeps_background() {
        let base = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let labels = LabelMap::from_raw(3, 2, vec![0, 1, 0, 2, 2, 0]).unwrap();
        let colors = colors_for(&base, &labels, 3);

        let out = composite(&base, &labels, &colors, 3).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 7]));
        assert_eq!(*out.get_pixel(1, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(2, 0), Rgb([2, 0, 7]));
        assert_eq!(*out.get_pixel(0, 1), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 1), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(2, 1), Rgb([2, 1, 7]));
    }

    #[test]
    fn table_must_cover_label_count() {
        let base = RgbImage::new(3, 2);
        let labels = LabelMap::from_raw(3, 2, vec![0, 1, 0, 1, 1, 0]).unwrap();
        let colors = colors_for(&base, &labels, 2);

        let err = composite(&base, &labels, &colors, 4).unwrap_err();
        assert!(matches!(err, RecolorError::InvalidLabelCount(_)));
    }

    #[test]
    fn out_of_range_label_fails_before_output() {
        let base = RgbImage::new(3, 2);
        let good = LabelMap::from_raw(3, 2, vec![0, 1, 0, 1, 1, 0]).unwrap();
        let colors = colors_for(&base, &good, 2);
        let bad = LabelMap::from_raw(3, 2, vec![0, 1, 0, 1, 2, 0]).unwrap();

        let err = composite(&base, &bad, &colors, 2).unwrap_err();
        assert!(matches!(err, RecolorError::InvalidLabelCount(_)));
    }

    #[test]
    fn empty_image_composites_to_empty_image() {
        let base = RgbImage::new(0, 3);
        let labels = LabelMap::from_raw(0, 3, Vec::new()).unwrap();
        let colors = colors_for(&base, &labels, 1);

        let out = composite(&base, &labels, &colors, 1).unwrap();
        assert_eq!(out.dimensions(), (0, 3));
    }

    #[test]
    fn output_is_identical_across_pool_sizes() {
        let base = RgbImage::from_fn(37, 53, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let labels = LabelMap::from_fn(37, 53, |x, y| ((x / 5 + y / 7) % 4) as i32);
        let colors = colors_for(&base, &labels, 4);

        let single = build_thread_pool(1)
            .unwrap()
            .install(|| composite(&base, &labels, &colors, 4))
            .unwrap();
        let many = build_thread_pool(4)
            .unwrap()
            .install(|| composite(&base, &labels, &colors, 4))
            .unwrap();
        assert_eq!(single.as_raw(), many.as_raw());
    }

    #[test]
    fn zero_threads_is_a_config_error() {
        assert!(matches!(
            build_thread_pool(0),
            Err(RecolorError::InvalidConfig(_))
        ));
    }
}
