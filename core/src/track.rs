//! Feature tracks: per-landmark observations across frames.

use crate::ids::{FrameId, TrackId};
use crate::{Error, Result};
use nalgebra::Point2;
use std::collections::{BTreeMap, BTreeSet};

/// One camera's image of one landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub frame: FrameId,
    pub point: Point2<f64>,
}

impl Observation {
    pub fn new(frame: FrameId, point: Point2<f64>) -> Self {
        Self { frame, point }
    }
}

/// Observations of a single landmark, strictly ascending by frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub(crate) id: TrackId,
    pub(crate) observations: Vec<Observation>,
}

impl Track {
    /// Sorts `observations` by frame. Fails if two share a frame.
    pub fn new(id: TrackId, mut observations: Vec<Observation>) -> Result<Self> {
        observations.sort_by_key(|obs| obs.frame);
        if let Some(pair) = observations.windows(2).find(|w| w[0].frame == w[1].frame) {
            return Err(Error::DuplicateObservation {
                track: id,
                frame: pair[0].frame,
            });
        }
        Ok(Self { id, observations })
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_frame(&self) -> Option<FrameId> {
        self.observations.first().map(|obs| obs.frame)
    }

    pub fn last_frame(&self) -> Option<FrameId> {
        self.observations.last().map(|obs| obs.frame)
    }

    pub fn frames(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.observations.iter().map(|obs| obs.frame)
    }

    pub fn observation_at(&self, frame: FrameId) -> Option<&Observation> {
        self.observations
            .binary_search_by_key(&frame, |obs| obs.frame)
            .ok()
            .map(|i| &self.observations[i])
    }
}

/// Tracks keyed by identity. Built once, then read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSet {
    pub(crate) tracks: BTreeMap<TrackId, Track>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if two tracks share an identity.
    pub fn from_tracks<I>(tracks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Track>,
    {
        let mut map = BTreeMap::new();
        for track in tracks {
            let id = track.id();
            if map.insert(id, track).is_some() {
                return Err(Error::DuplicateTrack(id));
            }
        }
        Ok(Self { tracks: map })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }

    /// Tracks in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn observation_count(&self) -> usize {
        self.tracks.values().map(Track::len).sum()
    }

    pub fn all_frame_ids(&self) -> BTreeSet<FrameId> {
        self.tracks.values().flat_map(Track::frames).collect()
    }

    pub fn first_frame(&self) -> Option<FrameId> {
        self.tracks.values().filter_map(Track::first_frame).min()
    }

    pub fn last_frame(&self) -> Option<FrameId> {
        self.tracks.values().filter_map(Track::last_frame).max()
    }

    /// Tracks observed in `frame`.
    pub fn active_tracks(&self, frame: FrameId) -> Vec<&Track> {
        self.tracks
            .values()
            .filter(|t| t.observation_at(frame).is_some())
            .collect()
    }

    /// Every point observed in `frame`, by track, for drawing overlays.
    pub fn frame_observations(&self, frame: FrameId) -> Vec<(TrackId, Point2<f64>)> {
        self.tracks
            .values()
            .filter_map(|t| t.observation_at(frame).map(|obs| (t.id(), obs.point)))
            .collect()
    }

    /// Same tracks and frames with every point replaced by `f`.
    pub fn map_points<F>(&self, mut f: F) -> TrackSet
    where
        F: FnMut(TrackId, &Observation) -> Point2<f64>,
    {
        let tracks = self
            .tracks
            .iter()
            .map(|(id, track)| {
                let observations = track
                    .observations
                    .iter()
                    .map(|obs| Observation::new(obs.frame, f(*id, obs)))
                    .collect();
                (
                    *id,
                    Track {
                        id: *id,
                        observations,
                    },
                )
            })
            .collect();
        TrackSet { tracks }
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::collections::btree_map::Values<'a, TrackId, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(frame: u64, x: f64) -> Observation {
        Observation::new(FrameId(frame), Point2::new(x, 0.0))
    }

    #[test]
    fn test_track_sorts_observations() {
        let track = Track::new(TrackId(1), vec![obs(5, 5.0), obs(1, 1.0), obs(3, 3.0)]).unwrap();
        let frames: Vec<_> = track.frames().collect();
        assert_eq!(frames, vec![FrameId(1), FrameId(3), FrameId(5)]);
        assert_eq!(track.first_frame(), Some(FrameId(1)));
        assert_eq!(track.last_frame(), Some(FrameId(5)));
        assert_eq!(track.observation_at(FrameId(3)).unwrap().point.x, 3.0);
        assert!(track.observation_at(FrameId(2)).is_none());
    }

    #[test]
    fn test_track_rejects_duplicate_frame() {
        let err = Track::new(TrackId(2), vec![obs(4, 0.0), obs(1, 0.0), obs(4, 1.0)]).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateObservation {
                track: TrackId(2),
                frame: FrameId(4)
            }
        );
    }

    #[test]
    fn test_track_set_queries() {
        let set = TrackSet::from_tracks(vec![
            Track::new(TrackId(0), vec![obs(0, 0.0), obs(1, 1.0)]).unwrap(),
            Track::new(TrackId(3), vec![obs(1, 2.0), obs(4, 3.0)]).unwrap(),
        ])
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.observation_count(), 4);
        assert_eq!(set.first_frame(), Some(FrameId(0)));
        assert_eq!(set.last_frame(), Some(FrameId(4)));
        assert_eq!(
            set.all_frame_ids().into_iter().collect::<Vec<_>>(),
            vec![FrameId(0), FrameId(1), FrameId(4)]
        );
        assert_eq!(set.active_tracks(FrameId(1)).len(), 2);
        assert_eq!(set.active_tracks(FrameId(2)).len(), 0);

        let overlay = set.frame_observations(FrameId(4));
        assert_eq!(overlay, vec![(TrackId(3), Point2::new(3.0, 0.0))]);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![TrackId(0), TrackId(3)]);
        assert_eq!((&set).into_iter().count(), 2);
    }

    #[test]
    fn test_track_set_rejects_duplicate_ids() {
        let result = TrackSet::from_tracks(vec![
            Track::new(TrackId(1), vec![obs(0, 0.0)]).unwrap(),
            Track::new(TrackId(1), vec![obs(1, 0.0)]).unwrap(),
        ]);
        assert_eq!(result.unwrap_err(), Error::DuplicateTrack(TrackId(1)));
    }

    #[test]
    fn test_map_points_keeps_structure() {
        let set = TrackSet::from_tracks(vec![
            Track::new(TrackId(5), vec![obs(2, 1.0), obs(3, 2.0)]).unwrap(),
        ])
        .unwrap();
        let shifted = set.map_points(|_, o| o.point + nalgebra::Vector2::new(10.0, 0.0));
        let track = shifted.get(TrackId(5)).unwrap();
        assert_eq!(track.frames().collect::<Vec<_>>(), vec![FrameId(2), FrameId(3)]);
        assert_eq!(track.observation_at(FrameId(3)).unwrap().point.x, 12.0);
    }

    #[test]
    fn test_empty_track_set() {
        let set = TrackSet::new();
        assert!(set.is_empty());
        assert!(set.first_frame().is_none());
        assert!(set.all_frame_ids().is_empty());
        assert!(set.into_tracks().is_empty());
    }
}
