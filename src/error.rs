//! Error types for terrain generation.

use thiserror::Error;

/// Everything that can abort a generation run.
///
/// Soft outcomes (no slope footprint, no scatter points) are not errors and
/// are reported through `bool`/`Option` returns instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The configuration cannot produce a valid map.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An acre grid invariant was broken by the elevation step.
    #[error("consistency violation at acre ({x}, {y}): {message}")]
    Consistency { x: usize, y: usize, message: String },

    /// A cliff walk used up its revert budget.
    #[error("no cliff solution for island {island} after {reverts} reverts")]
    NoSolution { island: u32, reverts: usize },

    /// A cliff walk reverted past its first step.
    #[error("cliff walk for island {island} exhausted its step stack")]
    StackExhausted { island: u32 },

    #[error("cliff catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
