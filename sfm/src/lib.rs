//! Structure from Motion module
//!
//! This crate turns known scene structure into the observations a camera
//! rig would make of it: projected feature tracks, reprojection error
//! metrics, and synthetic scenes to drive both.

pub mod metrics;
pub mod projection;
pub mod scene;

pub use metrics::{reprojection_errors, reprojection_rmse, ReprojectionError};
pub use projection::{
    projected_tracks, ProjectionOptions, ProjectionOutput, ProjectionStats, Projector,
};

/// Error type for SfM operations
#[derive(Debug, thiserror::Error)]
pub enum SfmError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] cv_core::Error),

    #[error(transparent)]
    Runtime(#[from] cv_runtime::Error),
}

pub type Result<T> = std::result::Result<T, SfmError>;
