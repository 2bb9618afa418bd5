use cv_core::{
    CameraModel, CameraStore, FrameId, LandmarkId, LandmarkStore, TrackId, TrackSet, Visibility,
};

/// Distance in pixels between an observation and its landmark's projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectionError {
    pub track: TrackId,
    pub frame: FrameId,
    pub error: f64,
}

/// Reprojection error of every observation that has a camera, a resolved
/// landmark, and a computable projection.
///
/// Projections that land outside a camera's image extent still count; only
/// points behind the camera or non-finite results are skipped.
pub fn reprojection_errors<C, L>(
    cameras: &C,
    landmarks: &L,
    tracks: &TrackSet,
) -> Vec<ReprojectionError>
where
    C: CameraStore + ?Sized,
    L: LandmarkStore + ?Sized,
{
    let mut errors = Vec::with_capacity(tracks.observation_count());
    for track in tracks {
        let Some(position) = landmarks.position(LandmarkId::from(track.id())) else {
            continue;
        };
        for obs in track.observations() {
            let Some(camera) = cameras.get(obs.frame) else {
                continue;
            };
            let projection = camera.project(&position);
            if !matches!(
                projection.visibility,
                Visibility::Visible | Visibility::OutOfBounds
            ) {
                continue;
            }
            errors.push(ReprojectionError {
                track: track.id(),
                frame: obs.frame,
                error: (projection.point - obs.point).norm(),
            });
        }
    }
    errors
}

/// Root-mean-square reprojection error; `0.0` when nothing can be compared.
pub fn reprojection_rmse<C, L>(cameras: &C, landmarks: &L, tracks: &TrackSet) -> f64
where
    C: CameraStore + ?Sized,
    L: LandmarkStore + ?Sized,
{
    let errors = reprojection_errors(cameras, landmarks, tracks);
    if errors.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = errors.iter().map(|e| e.error * e.error).sum();
    (sum_sq / errors.len() as f64).sqrt()
}
