//! Recolors the connected regions ("polygons") of a mask on top of a base image.
//!
//! A mask is binarized and labelled into a [`LabelMap`], every region label is
//! resolved to a color according to a [`ColorPolicy`], and a single parallel
//! pass paints those colors over a copy of the base image. Background pixels
//! are passed through unchanged.
//!
//! ```
//! use image::{GrayImage, Luma, Rgb, RgbImage};
//! use polygon_recolor::{ColorPolicy, RecolorConfig, process_polygons};
//!
//! let base = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
//! let mask = GrayImage::from_fn(4, 4, |x, _| Luma([if x < 2 { 255 } else { 0 }]));
//!
//! let config = RecolorConfig::default().with_policy(ColorPolicy::Mean);
//! let out = process_polygons(&base, &mask, &config).unwrap();
//! assert_eq!(out.dimensions(), (4, 4));
//! ```

mod colors;
pub mod composite;
pub mod error;
pub mod measure;
pub mod overlay;
pub mod pipeline;
pub mod region_labelling;
pub mod resolve;
pub mod validation;

pub use composite::composite;
pub use error::{RecolorError, RecolorResult};
pub use overlay::{apply_mask_overlay, to_mask};
pub use pipeline::{RecolorConfig, process_polygons, process_polygons_with, recolor};
pub use region_labelling::{ConnectedComponents, Connectivity, LabelMap, LabelProvider, binarize};
pub use resolve::{ColorPolicy, FALLBACK_COLOR, RegionColors, resolve_region_colors};
pub use validation::{RegionHistogram, validate};
