//! End-to-end recoloring: mask in, recolored image out.

use image::{GrayImage, RgbImage};

use crate::composite::{build_thread_pool, composite_validated};
use crate::error::{RecolorError, RecolorResult};
use crate::region_labelling::{
    Connectivity, ConnectedComponents, LabelMap, LabelProvider, binarize,
};
use crate::resolve::{ColorPolicy, resolve_region_colors};
use crate::validation::{check_dimensions, validate};

/// Settings for [`process_polygons`] and [`recolor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecolorConfig {
    pub policy: ColorPolicy,
    pub connectivity: Connectivity,
    /// Mask values strictly above this level count as foreground.
    pub threshold: u8,
    /// Worker count for a dedicated pool. `None` runs on rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for RecolorConfig {
    fn default() -> Self {
        Self {
            policy: ColorPolicy::default(),
            connectivity: Connectivity::Eight,
            threshold: 1,
            threads: None,
        }
    }
}

impl RecolorConfig {
    pub fn with_policy(mut self, policy: ColorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn validate(&self) -> RecolorResult<()> {
        if self.threads == Some(0) {
            return Err(RecolorError::config("threads must be >= 1 when set"));
        }
        self.policy.validate()
    }
}

/// Validates, resolves and composites a label map produced by any [`LabelProvider`].
///
/// Resolution finishes before compositing starts, so the color table is
/// read-only for the whole parallel pass.
#[tracing::instrument(skip_all, fields(label_count = label_count))]
pub fn recolor(
    base: &RgbImage,
    labels: &LabelMap,
    label_count: usize,
    config: &RecolorConfig,
) -> RecolorResult<RgbImage> {
    config.validate()?;
    let histogram = validate(base, labels, label_count)?;
    let colors = resolve_region_colors(base, labels, &histogram, &config.policy)?;

    match config.threads {
        Some(threads) => {
            let pool = build_thread_pool(threads)?;
            pool.install(|| composite_validated(base, labels, &colors, label_count))
        }
        None => composite_validated(base, labels, &colors, label_count),
    }
}

/// Recolors every connected region of `mask` on top of `base`.
///
/// The mask is binarized at `config.threshold`, labelled with
/// [`ConnectedComponents`] and handed to [`recolor`].
///
/// # Errors
///
/// [`RecolorError::ShapeMismatch`] if `mask` and `base` differ in size, plus
/// anything [`recolor`] reports.
pub fn process_polygons(
    base: &RgbImage,
    mask: &GrayImage,
    config: &RecolorConfig,
) -> RecolorResult<RgbImage> {
    let provider = ConnectedComponents {
        connectivity: config.connectivity,
    };
    process_polygons_with(base, mask, &provider, config)
}

/// [`process_polygons`] with a caller-supplied label provider.
pub fn process_polygons_with<P: LabelProvider + ?Sized>(
    base: &RgbImage,
    mask: &GrayImage,
    provider: &P,
    config: &RecolorConfig,
) -> RecolorResult<RgbImage> {
    config.validate()?;
    check_dimensions("mask", base.dimensions(), mask.dimensions())?;

    let binary = binarize(mask, config.threshold);
    let (labels, label_count) = provider.label(&binary)?;
    tracing::info!(regions = label_count.saturating_sub(1), "labelled mask");

    recolor(base, &labels, label_count, config)
}
