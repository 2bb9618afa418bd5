pub mod assembler;
pub mod camera;
pub mod camera_map;
pub mod geometry;
pub mod ids;
pub mod landmark;
pub mod track;

pub use assembler::*;
pub use camera::*;
pub use camera_map::*;
pub use geometry::*;
pub use ids::*;
pub use landmark::*;
pub use track::*;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("{track} already has an observation in {frame}")]
    DuplicateObservation { track: TrackId, frame: FrameId },

    #[error("{0} appears more than once")]
    DuplicateTrack(TrackId),
}

pub type Result<T> = std::result::Result<T, Error>;
