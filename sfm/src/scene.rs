//! Synthetic scenes for exercising reconstruction code against known truth.

use crate::{Result, SfmError};
use cv_core::{
    CameraIntrinsics, CameraMap, Landmark, LandmarkId, LandmarkMap, PinholeCamera, TrackSet,
};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use rand::Rng;
use rand_distr::Normal;
use std::f64::consts::TAU;

fn normal(stdev: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, stdev)
        .map_err(|e| SfmError::InvalidInput(format!("bad noise deviation {stdev}: {e}")))
}

/// The eight corners of an axis-aligned cube of edge `size` centred on the origin.
pub fn cube_corners(size: f64) -> LandmarkMap {
    let h = size / 2.0;
    let mut corners = Vec::with_capacity(8);
    for &x in &[-h, h] {
        for &y in &[-h, h] {
            for &z in &[-h, h] {
                corners.push(Point3::new(x, y, z));
            }
        }
    }
    LandmarkMap::from_positions(corners)
}

/// `count` landmarks scattered around `center` with the given deviation.
pub fn random_landmarks<R: Rng>(
    count: usize,
    center: &Point3<f64>,
    stdev: f64,
    rng: &mut R,
) -> Result<LandmarkMap> {
    let dist = normal(stdev)?;
    Ok(LandmarkMap::from_positions((0..count).map(|_| {
        center + Vector3::new(rng.sample(dist), rng.sample(dist), rng.sample(dist))
    })))
}

/// `count` cameras evenly spaced on a horizontal circle of `radius`, all
/// looking at the origin with world -Y as image up. Frame 0 sits on -Z.
pub fn camera_seq(
    count: usize,
    intrinsics: CameraIntrinsics,
    radius: f64,
) -> Result<CameraMap<PinholeCamera>> {
    let up = Vector3::new(0.0, -1.0, 0.0);
    let mut cameras = CameraMap::new();
    for i in 0..count {
        let theta = TAU * i as f64 / count as f64;
        let center = Point3::new(radius * theta.sin(), 0.0, -radius * theta.cos());
        let camera = PinholeCamera::look_at(intrinsics, &center, &Point3::origin(), &up)?;
        cameras.insert((i as u64).into(), camera);
    }
    Ok(cameras)
}

/// Copy of `landmarks` with Gaussian noise added to every resolved position.
pub fn noisy_landmarks<R: Rng>(
    landmarks: &LandmarkMap,
    stdev: f64,
    rng: &mut R,
) -> Result<LandmarkMap> {
    let dist = normal(stdev)?;
    Ok(landmarks
        .iter()
        .map(|(id, lm): (LandmarkId, &Landmark)| {
            let position = lm.position.map(|p| {
                p + Vector3::new(rng.sample(dist), rng.sample(dist), rng.sample(dist))
            });
            (id, Landmark { position })
        })
        .collect())
}

/// Copy of `tracks` with Gaussian pixel noise added to every observation.
pub fn noisy_tracks<R: Rng>(tracks: &TrackSet, stdev: f64, rng: &mut R) -> Result<TrackSet> {
    let dist = normal(stdev)?;
    Ok(tracks.map_points(|_, obs| -> Point2<f64> {
        obs.point + Vector2::new(rng.sample(dist), rng.sample(dist))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{projected_tracks, reprojection_rmse};
    use cv_core::{CameraModel, CameraStore, FrameId, LandmarkStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(1000.0, 1000.0, 640.0, 480.0)
    }

    #[test]
    fn test_cube_corners() {
        let cube = cube_corners(2.0);
        assert_eq!(cube.len(), 8);
        for (_, lm) in cube.iter() {
            let p = lm.position.unwrap();
            assert_eq!(p.x.abs(), 1.0);
            assert_eq!(p.y.abs(), 1.0);
            assert_eq!(p.z.abs(), 1.0);
        }
    }

    #[test]
    fn test_camera_seq_looks_at_origin() {
        let cameras = camera_seq(6, intrinsics(), 10.0).unwrap();
        assert_eq!(cameras.len(), 6);
        for (_, cam) in cameras.iter() {
            assert!((cam.center().coords.norm() - 10.0).abs() < 1e-9);
            let p = cam.project(&Point3::origin());
            assert!(p.is_valid());
            assert!((p.point - intrinsics().principal_point()).norm() < 1e-6);
        }
        let first = cameras.get(FrameId(0)).unwrap();
        assert!((first.center() - Point3::new(0.0, 0.0, -10.0)).norm() < 1e-9);
    }

    #[test]
    fn test_camera_seq_rejects_zero_radius() {
        assert!(camera_seq(3, intrinsics(), 0.0).is_err());
    }

    #[test]
    fn test_cube_fully_tracked_by_camera_ring() {
        let cube = cube_corners(2.0);
        let cameras = camera_seq(8, intrinsics(), 10.0).unwrap();
        let tracks = projected_tracks(&cube, &cameras).unwrap();
        assert_eq!(tracks.len(), 8);
        for track in &tracks {
            assert_eq!(track.len(), 8);
        }
    }

    #[test]
    fn test_noisy_tracks_rmse() {
        let mut rng = StdRng::seed_from_u64(7);
        let landmarks = random_landmarks(200, &Point3::origin(), 1.0, &mut rng).unwrap();
        let cameras = camera_seq(4, intrinsics(), 12.0).unwrap();
        let tracks = projected_tracks(&landmarks, &cameras).unwrap();

        let noisy = noisy_tracks(&tracks, 1.0, &mut rng).unwrap();
        assert_eq!(noisy.len(), tracks.len());
        assert_eq!(noisy.observation_count(), tracks.observation_count());
        let rmse = reprojection_rmse(&cameras, &landmarks, &noisy);
        // Two-dimensional unit noise has an RMS norm near sqrt(2).
        assert!(rmse > 1.2 && rmse < 1.6, "rmse = {rmse}");
    }

    #[test]
    fn test_noisy_landmarks_keeps_identities() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cube = cube_corners(1.0);
        cube.insert(LandmarkId(100), Landmark::unset());
        let noisy = noisy_landmarks(&cube, 0.01, &mut rng).unwrap();
        assert_eq!(noisy.identities(), cube.identities());
        assert!(noisy.position(LandmarkId(100)).is_none());
        let before = cube.position(LandmarkId(0)).unwrap();
        let moved = (noisy.position(LandmarkId(0)).unwrap() - before).norm();
        assert!(moved > 0.0 && moved < 0.1);
    }

    #[test]
    fn test_negative_deviation_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_landmarks(3, &Point3::origin(), -1.0, &mut rng),
            Err(SfmError::InvalidInput(_))
        ));
    }
}
