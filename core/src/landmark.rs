use crate::ids::LandmarkId;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};

/// A scene point. The position is `None` until something resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub position: Option<Point3<f64>>,
}

impl Landmark {
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position: Some(position),
        }
    }

    pub fn unset() -> Self {
        Self { position: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.position.is_some()
    }
}

impl From<Point3<f64>> for Landmark {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

/// Read-only view of landmarks by identity.
pub trait LandmarkStore: Sync {
    fn get(&self, id: LandmarkId) -> Option<&Landmark>;

    /// All identities in the store. Order is unspecified.
    fn identities(&self) -> Vec<LandmarkId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolved position of `id`, if the landmark exists and has one.
    fn position(&self, id: LandmarkId) -> Option<Point3<f64>> {
        self.get(id).and_then(|lm| lm.position)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkMap {
    landmarks: BTreeMap<LandmarkId, Landmark>,
}

impl LandmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Landmarks numbered `0..n` in iteration order.
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        positions
            .into_iter()
            .enumerate()
            .map(|(i, p)| (LandmarkId(i as u64), Landmark::new(p)))
            .collect()
    }

    /// Insert or replace; returns the previous entry.
    pub fn insert(&mut self, id: LandmarkId, landmark: impl Into<Landmark>) -> Option<Landmark> {
        self.landmarks.insert(id, landmark.into())
    }

    pub fn remove(&mut self, id: LandmarkId) -> Option<Landmark> {
        self.landmarks.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &Landmark)> {
        self.landmarks.iter().map(|(id, lm)| (*id, lm))
    }
}

impl FromIterator<(LandmarkId, Landmark)> for LandmarkMap {
    fn from_iter<I: IntoIterator<Item = (LandmarkId, Landmark)>>(iter: I) -> Self {
        Self {
            landmarks: iter.into_iter().collect(),
        }
    }
}

impl LandmarkStore for LandmarkMap {
    fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    fn identities(&self) -> Vec<LandmarkId> {
        self.landmarks.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.landmarks.len()
    }
}

impl<S: std::hash::BuildHasher + Sync> LandmarkStore for HashMap<LandmarkId, Landmark, S> {
    fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        HashMap::get(self, &id)
    }

    fn identities(&self) -> Vec<LandmarkId> {
        self.keys().copied().collect()
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}
