//! Incremental construction of a [`TrackSet`].

use crate::ids::{FrameId, LandmarkId, TrackId};
use crate::track::{Observation, Track, TrackSet};
use crate::{Error, Result};
use nalgebra::Point2;
use std::collections::BTreeMap;

/// Collects observations into one track per landmark.
///
/// Observations stay sorted by frame whatever the insertion order. Recording
/// a second observation for the same landmark and frame is an error: it means
/// the caller visited a (landmark, camera) pair twice.
#[derive(Debug, Default)]
pub struct TrackAssembler {
    tracks: BTreeMap<TrackId, Vec<Observation>>,
}

impl TrackAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        landmark: LandmarkId,
        frame: FrameId,
        point: Point2<f64>,
    ) -> Result<()> {
        let track = TrackId::from(landmark);
        let observations = self.tracks.entry(track).or_default();
        insert_sorted(observations, track, Observation::new(frame, point))
    }

    /// Fold in observations gathered by another assembler.
    pub fn merge(&mut self, other: TrackAssembler) -> Result<()> {
        for (track, incoming) in other.tracks {
            let observations = self.tracks.entry(track).or_default();
            for obs in incoming {
                insert_sorted(observations, track, obs)?;
            }
        }
        Ok(())
    }

    /// Number of tracks started so far.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    pub fn finalize(self) -> TrackSet {
        let tracks = self
            .tracks
            .into_iter()
            .filter(|(_, observations)| !observations.is_empty())
            .map(|(id, observations)| (id, Track { id, observations }))
            .collect();
        TrackSet { tracks }
    }
}

fn insert_sorted(
    observations: &mut Vec<Observation>,
    track: TrackId,
    obs: Observation,
) -> Result<()> {
    // Ascending frame order is the common case.
    if observations.last().map_or(true, |last| last.frame < obs.frame) {
        observations.push(obs);
        return Ok(());
    }
    match observations.binary_search_by_key(&obs.frame, |o| o.frame) {
        Ok(_) => Err(Error::DuplicateObservation {
            track,
            frame: obs.frame,
        }),
        Err(pos) => {
            observations.insert(pos, obs);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creates_tracks() {
        let mut asm = TrackAssembler::new();
        assert!(asm.is_empty());
        asm.record(LandmarkId(3), FrameId(0), Point2::new(1.0, 2.0)).unwrap();
        asm.record(LandmarkId(3), FrameId(1), Point2::new(1.5, 2.0)).unwrap();
        asm.record(LandmarkId(8), FrameId(1), Point2::new(0.0, 0.0)).unwrap();
        assert_eq!(asm.len(), 2);
        assert_eq!(asm.observation_count(), 3);

        let set = asm.finalize();
        assert_eq!(set.len(), 2);
        let track = set.get(TrackId(3)).unwrap();
        assert_eq!(track.id(), TrackId(3));
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_out_of_order_record_is_sorted() {
        let mut asm = TrackAssembler::new();
        for f in [4u64, 0, 9, 2] {
            asm.record(LandmarkId(1), FrameId(f), Point2::new(f as f64, 0.0)).unwrap();
        }
        let set = asm.finalize();
        let frames: Vec<_> = set.get(TrackId(1)).unwrap().frames().collect();
        assert_eq!(frames, vec![FrameId(0), FrameId(2), FrameId(4), FrameId(9)]);
    }

    #[test]
    fn test_duplicate_record_fails() {
        let mut asm = TrackAssembler::new();
        asm.record(LandmarkId(1), FrameId(2), Point2::new(0.0, 0.0)).unwrap();
        asm.record(LandmarkId(1), FrameId(5), Point2::new(0.0, 0.0)).unwrap();
        let err = asm
            .record(LandmarkId(1), FrameId(2), Point2::new(9.0, 9.0))
            .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateObservation {
                track: TrackId(1),
                frame: FrameId(2)
            }
        );
        // The rejected observation left the track untouched.
        let set = asm.finalize();
        let track = set.get(TrackId(1)).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.observation_at(FrameId(2)).unwrap().point, Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_duplicate_at_tail_fails() {
        let mut asm = TrackAssembler::new();
        asm.record(LandmarkId(0), FrameId(1), Point2::new(0.0, 0.0)).unwrap();
        assert!(asm.record(LandmarkId(0), FrameId(1), Point2::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_merge() {
        let mut a = TrackAssembler::new();
        a.record(LandmarkId(1), FrameId(0), Point2::new(0.0, 0.0)).unwrap();
        a.record(LandmarkId(1), FrameId(2), Point2::new(0.0, 0.0)).unwrap();

        let mut b = TrackAssembler::new();
        b.record(LandmarkId(1), FrameId(1), Point2::new(0.0, 0.0)).unwrap();
        b.record(LandmarkId(2), FrameId(1), Point2::new(0.0, 0.0)).unwrap();

        a.merge(b).unwrap();
        let set = a.finalize();
        assert_eq!(set.len(), 2);
        let frames: Vec<_> = set.get(TrackId(1)).unwrap().frames().collect();
        assert_eq!(frames, vec![FrameId(0), FrameId(1), FrameId(2)]);
    }

    #[test]
    fn test_merge_detects_overlap() {
        let mut a = TrackAssembler::new();
        a.record(LandmarkId(1), FrameId(0), Point2::new(0.0, 0.0)).unwrap();
        let mut b = TrackAssembler::new();
        b.record(LandmarkId(1), FrameId(0), Point2::new(1.0, 0.0)).unwrap();
        assert!(matches!(
            a.merge(b),
            Err(Error::DuplicateObservation { .. })
        ));
    }

    #[test]
    fn test_finalize_empty() {
        assert!(TrackAssembler::new().finalize().is_empty());
    }
}
