//! Region color resolution: decides which color each labelled region is painted with.

use image::{Rgb, RgbImage};

use crate::colors::contrasting_colors;
use crate::error::{RecolorError, RecolorResult};
use crate::region_labelling::LabelMap;
use crate::validation::{RegionHistogram, check_dimensions};

/// Color assigned to labels that have no member pixels.
pub const FALLBACK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// How region colors are chosen.
///
/// The palette policies (`Contrasting`, `Cyclic`) depend on the label index
/// only. `Mean` depends on the base image pixels under each region.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorPolicy {
    /// Evenly spaced HSL hues, one per region label, starting at red.
    Contrasting { saturation: f32, lightness: f32 },
    /// Label `l` gets `colors[(l - 1) % colors.len()]`.
    Cyclic(Vec<Rgb<u8>>),
    /// Per-channel mean of the base pixels inside the region, rounded half-up.
    Mean,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self::Contrasting {
            saturation: 0.9,
            lightness: 0.5,
        }
    }
}

impl ColorPolicy {
    /// Rejects empty cyclic palettes and HSL parameters outside `[0, 1]`.
    pub fn validate(&self) -> RecolorResult<()> {
        match self {
            ColorPolicy::Contrasting {
                saturation,
                lightness,
            } => {
                let unit = 0.0f32..=1.0;
                if !unit.contains(saturation) || !unit.contains(lightness) {
                    return Err(RecolorError::config(format!(
                        "saturation ({saturation}) and lightness ({lightness}) must be within [0, 1]"
                    )));
                }
                Ok(())
            }
            ColorPolicy::Cyclic(colors) if colors.is_empty() => {
                Err(RecolorError::config("cyclic palette is empty"))
            }
            ColorPolicy::Cyclic(_) | ColorPolicy::Mean => Ok(()),
        }
    }
}

/// The resolved label → color table for one compositing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionColors {
    // Slot 0 is background and never painted.
    table: Vec<Rgb<u8>>,
    empty: Vec<usize>,
}

impl RegionColors {
    pub fn label_count(&self) -> usize {
        self.table.len()
    }

    /// The color for a region label, `None` for background or out-of-range labels.
    pub fn get(&self, label: usize) -> Option<Rgb<u8>> {
        if label == 0 {
            return None;
        }
        self.table.get(label).copied()
    }

    /// Labels that had no member pixels and received [`FALLBACK_COLOR`].
    pub fn empty_labels(&self) -> &[usize] {
        &self.empty
    }

    pub(crate) fn table(&self) -> &[Rgb<u8>] {
        &self.table
    }
}

/// Resolves a color for every region label `1..N` of a validated label map.
///
/// `histogram` must come from [`crate::validation::validate`] on the same
/// `base` and `labels`. Labels without member pixels resolve to
/// [`FALLBACK_COLOR`] whatever the policy, and are reported through
/// [`RegionColors::empty_labels`].
///
/// # Errors
///
/// [`RecolorError::ShapeMismatch`] if `base` and `labels` disagree,
/// [`RecolorError::InvalidConfig`] for an invalid policy,
/// [`RecolorError::InvalidLabelCount`] if `Mean` finds `histogram` disagreeing
/// with `labels`, or
/// [`RecolorError::Allocation`] if the table cannot be allocated.
#[tracing::instrument(skip_all, fields(label_count = histogram.label_count()))]
pub fn resolve_region_colors(
    base: &RgbImage,
    labels: &LabelMap,
    histogram: &RegionHistogram,
    policy: &ColorPolicy,
) -> RecolorResult<RegionColors> {
    check_dimensions("label map", base.dimensions(), labels.dimensions())?;
    policy.validate()?;

    let label_count = histogram.label_count();
    let regions = label_count.saturating_sub(1);

    let policy_colors = match policy {
        ColorPolicy::Contrasting {
            saturation,
            lightness,
        } => contrasting_colors(regions, *saturation, *lightness),
        // Non-empty, checked by `policy.validate()`.
        ColorPolicy::Cyclic(colors) => (0..regions).map(|i| colors[i % colors.len()]).collect(),
        ColorPolicy::Mean => mean_colors(base, labels, histogram)?,
    };

    let mut table = Vec::new();
    table.try_reserve_exact(label_count)?;
    table.push(FALLBACK_COLOR);

    let mut empty = Vec::new();
    for (label, color) in (1..label_count).zip(policy_colors) {
        if histogram.pixel_count(label) == 0 {
            empty.push(label);
            table.push(FALLBACK_COLOR);
        } else {
            table.push(color);
        }
    }

    if !empty.is_empty() {
        tracing::warn!(
            count = empty.len(),
            first = empty[0],
            "regions without member pixels resolved to fallback color"
        );
    }

    Ok(RegionColors { table, empty })
}

/// Mean colors for labels `1..N`, rounded half-up. Empty labels get [`FALLBACK_COLOR`].
///
/// Member counts are taken in the same pass as the channel sums; a histogram
/// that disagrees with them belongs to another label map and is rejected.
fn mean_colors(
    base: &RgbImage,
    labels: &LabelMap,
    histogram: &RegionHistogram,
) -> RecolorResult<Vec<Rgb<u8>>> {
    let label_count = histogram.label_count();

    let mut sums: Vec<([u64; 3], u64)> = Vec::new();
    sums.try_reserve_exact(label_count)?;
    sums.resize(label_count, ([0; 3], 0));

    for (pixel, &label) in base.pixels().zip(labels.as_slice()) {
        if label == 0 {
            continue;
        }
        let Some((sum, count)) = usize::try_from(label).ok().and_then(|l| sums.get_mut(l)) else {
            return Err(RecolorError::label_count(format!(
                "label {label} is outside the histogram's [0, {}]",
                label_count.saturating_sub(1)
            )));
        };
        for (acc, &channel) in sum.iter_mut().zip(pixel.0.iter()) {
            *acc += u64::from(channel);
        }
        *count += 1;
    }

    let mut means = Vec::with_capacity(label_count.saturating_sub(1));
    for (label, &(sum, count)) in sums.iter().enumerate().skip(1) {
        if count != histogram.pixel_count(label) {
            return Err(RecolorError::label_count(format!(
                "histogram counts {} pixels for label {label}, label map has {count}",
                histogram.pixel_count(label)
            )));
        }
        if count == 0 {
            means.push(FALLBACK_COLOR);
            continue;
        }
        let mut channels = [0u8; 3];
        for (out, s) in channels.iter_mut().zip(sum) {
            *out = u8::try_from((s + count / 2) / count).map_err(|_| {
                RecolorError::label_count(format!("mean of label {label} exceeds u8"))
            })?;
        }
        means.push(Rgb(channels));
    }

    Ok(means)
}
