//! Camera models that map world points into image coordinates.
//!
//! Every model reports a [`Projection`] carrying the image point, the signed
//! depth along the viewing axis and a [`Visibility`] verdict. Only
//! [`Visibility::Visible`] projections are usable; the others describe why the
//! point cannot be imaged by that camera. Projection never fails.

use crate::geometry::{CameraIntrinsics, Distortion, ImageSize, Pose};
use crate::{Error, Result};
use nalgebra::{Matrix3, Matrix3x4, Point2, Point3, Rotation3, UnitQuaternion, Vector3};

const LOOK_AT_EPS: f64 = 1e-12;

/// Why a projection is or is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    /// Depth along the viewing axis is zero or negative.
    BehindCamera,
    /// The camera has a known extent and the point falls outside it.
    OutOfBounds,
    /// The camera-space point, depth or image coordinate is NaN or infinite.
    NonFinite,
    /// The camera's own parameters cannot produce a projection.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub point: Point2<f64>,
    pub depth: f64,
    pub visibility: Visibility,
}

impl Projection {
    fn degenerate() -> Self {
        Self {
            point: Point2::new(f64::NAN, f64::NAN),
            depth: f64::NAN,
            visibility: Visibility::Degenerate,
        }
    }

    /// Apply the depth, finiteness and extent checks in that order.
    fn classify(point: Point2<f64>, depth: f64, image_size: Option<ImageSize>) -> Self {
        let visibility = if !depth.is_finite() {
            Visibility::NonFinite
        } else if depth <= 0.0 {
            Visibility::BehindCamera
        } else if !(point.x.is_finite() && point.y.is_finite()) {
            Visibility::NonFinite
        } else if image_size.is_some_and(|size| !size.contains(&point)) {
            Visibility::OutOfBounds
        } else {
            Visibility::Visible
        };
        Self {
            point,
            depth,
            visibility,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn valid_point(&self) -> Option<Point2<f64>> {
        self.is_valid().then_some(self.point)
    }
}

/// Capability shared by all camera kinds.
pub trait CameraModel: Send + Sync {
    fn project(&self, point: &Point3<f64>) -> Projection;

    /// Signed depth of `point` along the viewing axis.
    fn depth(&self, point: &Point3<f64>) -> f64;

    /// Extent used for bounds checking. `None` disables the check.
    fn image_size(&self) -> Option<ImageSize>;

    fn is_visible(&self, point: &Point3<f64>) -> bool {
        self.project(point).is_valid()
    }
}

/// Calibrated pinhole camera with optional lens distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    pub intrinsics: CameraIntrinsics,
    pub pose: Pose,
    pub distortion: Distortion,
    pub image_size: Option<ImageSize>,
}

impl PinholeCamera {
    pub fn new(intrinsics: CameraIntrinsics, pose: Pose) -> Self {
        Self {
            intrinsics,
            pose,
            distortion: Distortion::none(),
            image_size: None,
        }
    }

    pub fn from_center(
        intrinsics: CameraIntrinsics,
        rotation: UnitQuaternion<f64>,
        center: &Point3<f64>,
    ) -> Self {
        Self::new(intrinsics, Pose::from_center(rotation, center))
    }

    /// Place the camera at `center` looking at `target`, with `up` pointing
    /// towards the top of the image (image +y runs down).
    pub fn look_at(
        intrinsics: CameraIntrinsics,
        center: &Point3<f64>,
        target: &Point3<f64>,
        up: &Vector3<f64>,
    ) -> Result<Self> {
        let forward = target - center;
        if forward.norm() < LOOK_AT_EPS {
            return Err(Error::InvalidGeometry(
                "look_at target coincides with camera center".to_string(),
            ));
        }
        let z = forward.normalize();
        let up_ortho = up - z * up.dot(&z);
        if up_ortho.norm() < LOOK_AT_EPS {
            return Err(Error::InvalidGeometry(
                "look_at up vector is parallel to the viewing direction".to_string(),
            ));
        }
        let y = -up_ortho.normalize();
        let x = y.cross(&z);

        let r = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
        Ok(Self::from_center(intrinsics, rotation, center))
    }

    pub fn with_distortion(mut self, distortion: Distortion) -> Self {
        self.distortion = distortion;
        self
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some(ImageSize::new(width, height));
        self
    }

    pub fn center(&self) -> Point3<f64> {
        self.pose.center()
    }

    pub fn is_degenerate(&self) -> bool {
        self.intrinsics.is_degenerate() || !self.distortion.is_finite() || !self.pose.is_finite()
    }

    /// The equivalent 3x4 matrix `K [R | t]`. Distortion is dropped.
    pub fn projection_matrix(&self) -> Matrix3x4<f64> {
        let mut rt = Matrix3x4::<f64>::zeros();
        rt.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.pose.rotation_matrix());
        rt.fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.pose.translation);
        self.intrinsics.matrix() * rt
    }
}

impl CameraModel for PinholeCamera {
    fn project(&self, point: &Point3<f64>) -> Projection {
        if self.is_degenerate() {
            return Projection::degenerate();
        }
        let pc = self.pose.transform_point(point);
        if !pc.iter().all(|v| v.is_finite()) {
            return Projection {
                point: Point2::new(f64::NAN, f64::NAN),
                depth: f64::NAN,
                visibility: Visibility::NonFinite,
            };
        }
        let (xd, yd) = self.distortion.apply(pc.x / pc.z, pc.y / pc.z);
        Projection::classify(self.intrinsics.map(xd, yd), pc.z, self.image_size)
    }

    fn depth(&self, point: &Point3<f64>) -> f64 {
        self.pose.transform_point(point).z
    }

    fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }
}

/// General projective camera given by a 3x4 matrix `P = [M | p4]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectiveCamera {
    pub matrix: Matrix3x4<f64>,
    pub image_size: Option<ImageSize>,
}

impl ProjectiveCamera {
    pub fn new(matrix: Matrix3x4<f64>) -> Self {
        Self {
            matrix,
            image_size: None,
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some(ImageSize::new(width, height));
        self
    }

    fn left_block(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn is_degenerate(&self) -> bool {
        !self.matrix.iter().all(|v| v.is_finite()) || self.left_block().determinant() == 0.0
    }
}

impl From<&PinholeCamera> for ProjectiveCamera {
    fn from(camera: &PinholeCamera) -> Self {
        Self {
            matrix: camera.projection_matrix(),
            image_size: camera.image_size,
        }
    }
}

impl CameraModel for ProjectiveCamera {
    fn project(&self, point: &Point3<f64>) -> Projection {
        if self.is_degenerate() {
            return Projection::degenerate();
        }
        let h = self.matrix * point.to_homogeneous();
        let image_point = Point2::new(h.x / h.z, h.y / h.z);
        Projection::classify(image_point, self.depth(point), self.image_size)
    }

    /// `sign(det M) * w / |m3|`, the metric depth for a camera in canonical form.
    fn depth(&self, point: &Point3<f64>) -> f64 {
        let m = self.left_block();
        let w = (self.matrix * point.to_homogeneous()).z;
        m.determinant().signum() * w / m.row(2).norm()
    }

    fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }
}

/// Camera kinds a camera store can hold side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Camera {
    Pinhole(PinholeCamera),
    Projective(ProjectiveCamera),
}

impl CameraModel for Camera {
    fn project(&self, point: &Point3<f64>) -> Projection {
        match self {
            Camera::Pinhole(c) => c.project(point),
            Camera::Projective(c) => c.project(point),
        }
    }

    fn depth(&self, point: &Point3<f64>) -> f64 {
        match self {
            Camera::Pinhole(c) => c.depth(point),
            Camera::Projective(c) => c.depth(point),
        }
    }

    fn image_size(&self) -> Option<ImageSize> {
        match self {
            Camera::Pinhole(c) => c.image_size(),
            Camera::Projective(c) => c.image_size(),
        }
    }
}

impl From<PinholeCamera> for Camera {
    fn from(camera: PinholeCamera) -> Self {
        Camera::Pinhole(camera)
    }
}

impl From<ProjectiveCamera> for Camera {
    fn from(camera: ProjectiveCamera) -> Self {
        Camera::Projective(camera)
    }
}
