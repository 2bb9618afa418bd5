use nalgebra::{Matrix3, Point2, Point3, UnitQuaternion, Vector3};

/// Pinhole calibration: focal lengths, principal point and skew, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub skew: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            skew: 0.0,
        }
    }

    /// Square pixels, focal length `f`, principal point `principal`.
    pub fn from_focal_length(f: f64, principal: Point2<f64>) -> Self {
        Self::new(f, f, principal.x, principal.y)
    }

    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.fy / self.fx
    }

    pub fn principal_point(&self) -> Point2<f64> {
        Point2::new(self.cx, self.cy)
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, self.skew, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// True when the calibration cannot map points to pixels: a zero or
    /// non-finite focal length, or any non-finite parameter.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.fx, self.fy, self.cx, self.cy, self.skew]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.fx == 0.0 || self.fy == 0.0
    }

    /// Map normalized image coordinates to pixels.
    pub fn map(&self, x: f64, y: f64) -> Point2<f64> {
        Point2::new(
            self.fx * x + self.skew * y + self.cx,
            self.fy * y + self.cy,
        )
    }

    /// Map pixels back to normalized image coordinates.
    pub fn unmap(&self, pixel: &Point2<f64>) -> (f64, f64) {
        let y = (pixel.y - self.cy) / self.fy;
        let x = (pixel.x - self.cx - self.skew * y) / self.fx;
        (x, y)
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }
}

/// Radial-tangential (Brown-Conrady) lens distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64, k3: f64) -> Self {
        Self { k1, k2, p1, p2, k3 }
    }

    pub fn none() -> Self {
        Self {
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            k3: 0.0,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    pub fn is_finite(&self) -> bool {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Distort normalized image coordinates.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_none() {
            return (x, y);
        }
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + dx, y * radial + dy)
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::none()
    }
}

/// World-to-camera rigid transform: `X_cam = R * X_world + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Pose {
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build from the camera center in world coordinates instead of `t`.
    pub fn from_center(rotation: UnitQuaternion<f64>, center: &Point3<f64>) -> Self {
        Self {
            rotation,
            translation: -(rotation * center.coords),
        }
    }

    /// Camera center in world coordinates, `-R^T t`.
    pub fn center(&self) -> Point3<f64> {
        Point3::from(-(self.rotation.inverse() * self.translation))
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    pub fn is_finite(&self) -> bool {
        self.rotation.coords.iter().all(|v| v.is_finite())
            && self.translation.iter().all(|v| v.is_finite())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }
}

/// Image extent in pixels. Valid projections lie in `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= 0.0
            && point.x < f64::from(self.width)
            && point.y >= 0.0
            && point.y < f64::from(self.height)
    }
}
