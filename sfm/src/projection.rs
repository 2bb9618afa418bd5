//! Projection of landmarks into cameras to produce feature tracks.
//!
//! Every (landmark, camera) pair is evaluated independently: the landmark's
//! position is projected by the camera and, when the projection is valid,
//! becomes an observation on the track that shares the landmark's identity.
//! Invalid projections and unset landmarks are skipped. The only failure is a
//! structural one, such as a camera store listing the same frame twice.

use crate::Result;
use cv_core::{
    CameraModel, CameraStore, FrameId, LandmarkId, LandmarkStore, TrackAssembler, TrackSet,
    Visibility,
};
use cv_runtime::orchestrator::{scheduler, ResourceGroup};
use nalgebra::Point2;
use rayon::prelude::*;
use std::sync::Arc;

/// Options controlling how a projection pass is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Partition landmarks across a thread pool.
    pub parallel: bool,
    /// Below this many landmarks the pass stays on the calling thread.
    pub min_parallel_landmarks: usize,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_landmarks: 256,
        }
    }
}

impl ProjectionOptions {
    pub fn serial() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

/// Counters describing one projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    pub landmarks: usize,
    pub unresolved_landmarks: usize,
    pub cameras: usize,
    /// (landmark, camera) pairs projected.
    pub evaluated: usize,
    pub accepted: usize,
    pub behind_camera: usize,
    pub out_of_bounds: usize,
    pub non_finite: usize,
    pub degenerate: usize,
}

impl ProjectionStats {
    pub fn rejected(&self) -> usize {
        self.behind_camera + self.out_of_bounds + self.non_finite + self.degenerate
    }

    fn tally(&mut self, visibility: Visibility) {
        self.evaluated += 1;
        match visibility {
            Visibility::Visible => self.accepted += 1,
            Visibility::BehindCamera => self.behind_camera += 1,
            Visibility::OutOfBounds => self.out_of_bounds += 1,
            Visibility::NonFinite => self.non_finite += 1,
            Visibility::Degenerate => self.degenerate += 1,
        }
    }

    fn absorb(&mut self, other: &ProjectionStats) {
        self.unresolved_landmarks += other.unresolved_landmarks;
        self.evaluated += other.evaluated;
        self.accepted += other.accepted;
        self.behind_camera += other.behind_camera;
        self.out_of_bounds += other.out_of_bounds;
        self.non_finite += other.non_finite;
        self.degenerate += other.degenerate;
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionOutput {
    pub tracks: TrackSet,
    pub stats: ProjectionStats,
}

/// Projections of a single landmark, ascending by frame.
struct LandmarkProjections {
    id: LandmarkId,
    observations: Vec<(FrameId, Point2<f64>)>,
    stats: ProjectionStats,
}

/// Projects landmark stores through camera stores.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    options: ProjectionOptions,
    group: Option<Arc<ResourceGroup>>,
}

impl Projector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self {
            options,
            group: None,
        }
    }

    /// Run parallel passes in `group` instead of the scheduler's default group.
    pub fn with_group(mut self, group: Arc<ResourceGroup>) -> Self {
        self.group = Some(group);
        self
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    pub fn run<L, C>(&self, landmarks: &L, cameras: &C) -> Result<ProjectionOutput>
    where
        L: LandmarkStore + ?Sized,
        C: CameraStore + ?Sized,
    {
        let frames = resolve_cameras(cameras);
        let ids = landmarks.identities();

        let mut stats = ProjectionStats {
            landmarks: ids.len(),
            cameras: frames.len(),
            ..Default::default()
        };

        let per_landmark: Vec<LandmarkProjections> = if ids.is_empty() || frames.is_empty() {
            Vec::new()
        } else {
            match self.parallel_group(ids.len()) {
                Some(group) => group.run(|| {
                    ids.par_iter()
                        .map(|&id| project_landmark(id, landmarks, &frames))
                        .collect()
                }),
                None => ids
                    .iter()
                    .map(|&id| project_landmark(id, landmarks, &frames))
                    .collect(),
            }
        };

        let mut assembler = TrackAssembler::new();
        for projections in per_landmark {
            stats.absorb(&projections.stats);
            for (frame, point) in projections.observations {
                assembler.record(projections.id, frame, point)?;
            }
        }
        let tracks = assembler.finalize();

        tracing::debug!(
            landmarks = stats.landmarks,
            unresolved = stats.unresolved_landmarks,
            cameras = stats.cameras,
            tracks = tracks.len(),
            observations = stats.accepted,
            rejected = stats.rejected(),
            "projected landmarks into cameras"
        );

        Ok(ProjectionOutput { tracks, stats })
    }

    fn parallel_group(&self, landmark_count: usize) -> Option<Arc<ResourceGroup>> {
        if !self.options.parallel || landmark_count < self.options.min_parallel_landmarks {
            return None;
        }
        if let Some(group) = &self.group {
            return Some(group.clone());
        }
        match scheduler().and_then(|s| s.get_default_group()) {
            Ok(group) => Some(group),
            Err(e) => {
                tracing::warn!(error = %e, "no resource group available, projecting serially");
                None
            }
        }
    }
}

/// Use the cameras to project the landmarks back into their images.
///
/// Returns one track per landmark that at least one camera sees, with the
/// landmark's identity and one observation per such camera in ascending
/// frame order.
pub fn projected_tracks<L, C>(landmarks: &L, cameras: &C) -> Result<TrackSet>
where
    L: LandmarkStore + ?Sized,
    C: CameraStore + ?Sized,
{
    Ok(Projector::default().run(landmarks, cameras)?.tracks)
}

fn resolve_cameras<C>(cameras: &C) -> Vec<(FrameId, &C::Camera)>
where
    C: CameraStore + ?Sized,
{
    let mut frames: Vec<(FrameId, &C::Camera)> = cameras
        .identities()
        .into_iter()
        .filter_map(|frame| match cameras.get(frame) {
            Some(camera) => Some((frame, camera)),
            None => {
                tracing::warn!(%frame, "camera store lists a frame it cannot resolve");
                None
            }
        })
        .collect();
    frames.sort_by_key(|(frame, _)| *frame);
    frames
}

fn project_landmark<L, K>(
    id: LandmarkId,
    landmarks: &L,
    frames: &[(FrameId, &K)],
) -> LandmarkProjections
where
    L: LandmarkStore + ?Sized,
    K: CameraModel,
{
    let mut stats = ProjectionStats::default();
    let Some(position) = landmarks.position(id) else {
        stats.unresolved_landmarks += 1;
        return LandmarkProjections {
            id,
            observations: Vec::new(),
            stats,
        };
    };

    let mut observations = Vec::new();
    for &(frame, camera) in frames {
        let projection = camera.project(&position);
        stats.tally(projection.visibility);
        match projection.valid_point() {
            Some(point) => observations.push((frame, point)),
            None => tracing::trace!(
                landmark = %id,
                %frame,
                visibility = ?projection.visibility,
                "projection rejected"
            ),
        }
    }

    LandmarkProjections {
        id,
        observations,
        stats,
    }
}
