use crate::camera::{Camera, CameraModel};
use crate::ids::FrameId;
use std::collections::{BTreeMap, HashMap};

/// Read-only view of cameras by frame.
pub trait CameraStore: Sync {
    type Camera: CameraModel;

    fn get(&self, frame: FrameId) -> Option<&Self::Camera>;

    /// All frame identities, ascending.
    fn identities(&self) -> Vec<FrameId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cameras keyed by frame, iterated in ascending frame order.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMap<C = Camera> {
    cameras: BTreeMap<FrameId, C>,
}

impl<C> Default for CameraMap<C> {
    fn default() -> Self {
        Self {
            cameras: BTreeMap::new(),
        }
    }
}

impl<C> CameraMap<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cameras numbered `0..n` in iteration order.
    pub fn from_sequence<I, T>(cameras: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<C>,
    {
        cameras
            .into_iter()
            .enumerate()
            .map(|(i, c)| (FrameId(i as u64), c.into()))
            .collect()
    }

    pub fn insert(&mut self, frame: FrameId, camera: impl Into<C>) -> Option<C> {
        self.cameras.insert(frame, camera.into())
    }

    pub fn remove(&mut self, frame: FrameId) -> Option<C> {
        self.cameras.remove(&frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &C)> {
        self.cameras.iter().map(|(frame, c)| (*frame, c))
    }
}

impl<C> FromIterator<(FrameId, C)> for CameraMap<C> {
    fn from_iter<I: IntoIterator<Item = (FrameId, C)>>(iter: I) -> Self {
        Self {
            cameras: iter.into_iter().collect(),
        }
    }
}

impl<C: CameraModel> CameraStore for CameraMap<C> {
    type Camera = C;

    fn get(&self, frame: FrameId) -> Option<&C> {
        self.cameras.get(&frame)
    }

    fn identities(&self) -> Vec<FrameId> {
        self.cameras.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.cameras.len()
    }
}

impl<C: CameraModel, S: std::hash::BuildHasher + Sync> CameraStore for HashMap<FrameId, C, S> {
    type Camera = C;

    fn get(&self, frame: FrameId) -> Option<&C> {
        HashMap::get(self, &frame)
    }

    fn identities(&self) -> Vec<FrameId> {
        let mut frames: Vec<FrameId> = self.keys().copied().collect();
        frames.sort_unstable();
        frames
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}
