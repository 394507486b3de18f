//! Label maps and the providers that produce them from binary masks.

use image::{GrayImage, ImageBuffer, Luma, Pixel, Primitive};
use imageproc::contrast::{ThresholdType, threshold};
pub use imageproc::region_labelling::Connectivity;
use num_traits::ToPrimitive;

use crate::error::{RecolorError, RecolorResult};

/// A dense grid of region labels, row-major, one `i32` per pixel.
///
/// Label `0` is background. Labels `1..N` identify regions, where `N` is the
/// label count handed around alongside the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<i32>,
}

impl LabelMap {
    /// Wraps a raw row-major buffer.
    ///
    /// Returns `None` if `labels.len()` is not `width * height`.
    pub fn from_raw(width: u32, height: u32, labels: Vec<i32>) -> Option<Self> {
        let len = (width as usize).checked_mul(height as usize)?;
        (labels.len() == len).then_some(Self {
            width,
            height,
            labels,
        })
    }

    /// Builds a map by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> i32) -> Self {
        let mut labels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                labels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            labels,
        }
    }

    /// Converts a single-channel label image (such as the output of
    /// [`imageproc::region_labelling::connected_components`]) into a `LabelMap`.
    ///
    /// # Errors
    ///
    /// Returns [`RecolorError::InvalidLabelCount`] if a label does not fit in an `i32`.
    pub fn from_label_image<T>(image: &ImageBuffer<Luma<T>, Vec<T>>) -> RecolorResult<Self>
    where
        T: Primitive + ToPrimitive,
        Luma<T>: Pixel<Subpixel = T>,
    {
        let (width, height) = image.dimensions();
        let raw = image.as_raw();
        let mut labels = Vec::new();
        labels.try_reserve_exact(raw.len())?;

        for (i, value) in raw.iter().enumerate() {
            let Some(label) = value.to_i32() else {
                let x = i % width as usize;
                let y = i / width as usize;
                return Err(RecolorError::label_count(format!(
                    "label at ({x}, {y}) does not fit in i32"
                )));
            };
            labels.push(label);
        }

        Ok(Self {
            width,
            height,
            labels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The label at `(x, y)`, or `None` outside the map.
    pub fn get(&self, x: u32, y: u32) -> Option<i32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.labels
    }

    /// The largest label present, or `None` for an empty map.
    pub fn max_label(&self) -> Option<i32> {
        self.labels.iter().copied().max()
    }
}

/// Produces a label map and its label count from a binarized mask.
///
/// The returned count `N` is one more than the largest region label, so that
/// every label lies in `[0, N - 1]`.
pub trait LabelProvider {
    fn label(&self, mask: &GrayImage) -> RecolorResult<(LabelMap, usize)>;
}

/// Connected-component labelling backed by `imageproc`, with `Luma([0])` as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedComponents {
    pub connectivity: Connectivity,
}

impl Default for ConnectedComponents {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Eight,
        }
    }
}

impl LabelProvider for ConnectedComponents {
    #[tracing::instrument(skip(mask), fields(width = mask.width(), height = mask.height()))]
    fn label(&self, mask: &GrayImage) -> RecolorResult<(LabelMap, usize)> {
        let components =
            imageproc::region_labelling::connected_components(mask, self.connectivity, Luma([0]));
        let labels = LabelMap::from_label_image(&components)?;
        let count = labels.max_label().map_or(1, |max| max.max(0) as usize + 1);
        tracing::debug!(regions = count - 1, "labelled connected components");
        Ok((labels, count))
    }
}

/// Binarizes a grayscale mask: values strictly above `level` become 255, the rest 0.
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::Binary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| Luma([rows[y as usize][x as usize]]))
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(LabelMap::from_raw(2, 2, vec![0, 1, 1, 0]).is_some());
        assert!(LabelMap::from_raw(2, 2, vec![0, 1, 1]).is_none());
        assert!(LabelMap::from_raw(0, 5, Vec::new()).is_some());
    }

    #[test]
    fn get_is_row_major_and_bounded() {
        let map = LabelMap::from_fn(3, 2, |x, y| (y * 3 + x) as i32);
        assert_eq!(map.get(0, 0), Some(0));
        assert_eq!(map.get(2, 0), Some(2));
        assert_eq!(map.get(1, 1), Some(4));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.get(0, 2), None);
        assert_eq!(map.max_label(), Some(5));
    }

    #[test]
    fn from_label_image_rejects_overflowing_labels() {
        let mut image: ImageBuffer<Luma<u32>, Vec<u32>> = ImageBuffer::new(3, 2);
        image.put_pixel(1, 1, Luma([u32::MAX]));

        let err = LabelMap::from_label_image(&image).unwrap_err();
        assert!(matches!(err, RecolorError::InvalidLabelCount(_)));
        assert!(err.to_string().contains("(1, 1)"));
    }

    #[test]
    fn binarize_keeps_only_values_above_level() {
        let gray = mask_from_rows(&[&[0, 1, 2, 255]]);
        let binary = binarize(&gray, 1);
        assert_eq!(binary.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn connectivity_decides_diagonal_neighbours() {
        let mask = mask_from_rows(&[
            &[255, 0, 0, 0],
            &[0, 255, 0, 0],
            &[0, 0, 0, 255],
            &[0, 0, 0, 255],
        ]);

        let eight = ConnectedComponents {
            connectivity: Connectivity::Eight,
        };
        let (labels, count) = eight.label(&mask).unwrap();
        assert_eq!(count, 3);
        assert_eq!(labels.get(0, 0), labels.get(1, 1));
        assert_eq!(labels.get(3, 2), labels.get(3, 3));
        assert_ne!(labels.get(0, 0), labels.get(3, 3));
        assert_eq!(labels.get(1, 0), Some(0));

        let four = ConnectedComponents {
            connectivity: Connectivity::Four,
        };
        let (labels, count) = four.label(&mask).unwrap();
        assert_eq!(count, 4);
        assert_ne!(labels.get(0, 0), labels.get(1, 1));
    }

    #[test]
    fn empty_mask_has_only_background() {
        let mask = GrayImage::new(5, 5);
        let (labels, count) = ConnectedComponents::default().label(&mask).unwrap();
        assert_eq!(count, 1);
        assert!(labels.as_slice().iter().all(|&l| l == 0));
    }
}
