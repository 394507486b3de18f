//! Error types for region recoloring.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while validating, resolving or compositing regions.
#[derive(Debug, Error)]
pub enum RecolorError {
    /// The base image and another input (`what`) disagree in width or height.
    #[error(
        "shape mismatch: base image is {}x{}, {what} is {}x{}",
        .base.0,
        .base.1,
        .other.0,
        .other.1
    )]
    ShapeMismatch {
        what: &'static str,
        base: (u32, u32),
        other: (u32, u32),
    },

    /// The label count is zero, or a label lies outside `[0, N - 1]`.
    #[error("invalid label count: {0}")]
    InvalidLabelCount(String),

    /// The output buffer or color table could not be allocated.
    #[error("allocation failure: {0}")]
    Allocation(#[from] TryReserveError),

    /// Rejected configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A dedicated worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

impl RecolorError {
    pub fn label_count(msg: impl Into<String>) -> Self {
        Self::InvalidLabelCount(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for recoloring operations
pub type RecolorResult<T> = Result<T, RecolorError>;
