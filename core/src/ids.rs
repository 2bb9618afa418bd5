//! Identity newtypes shared by landmarks, cameras and tracks.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identity of a 3D landmark.
    LandmarkId,
    "landmark#"
);
define_id!(
    /// Frame index a camera belongs to. Need not be contiguous.
    FrameId,
    "frame#"
);
define_id!(
    /// Identity of a feature track.
    TrackId,
    "track#"
);

/// A projected track carries the identity of the landmark it came from.
impl From<LandmarkId> for TrackId {
    fn from(id: LandmarkId) -> Self {
        Self(id.0)
    }
}

impl From<TrackId> for LandmarkId {
    fn from(id: TrackId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_preserves_landmark_id() {
        let lm = LandmarkId::new(42);
        let track = TrackId::from(lm);
        assert_eq!(track.value(), 42);
        assert_eq!(LandmarkId::from(track), lm);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameId(3).to_string(), "frame#3");
        assert_eq!(TrackId(7).to_string(), "track#7");
    }

    #[test]
    fn test_ordering() {
        let mut frames = vec![FrameId(5), FrameId(0), FrameId(2)];
        frames.sort();
        assert_eq!(frames, vec![FrameId(0), FrameId(2), FrameId(5)]);
    }
}
