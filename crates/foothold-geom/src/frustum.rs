//! View frustum with an incremental containment test for grid sweeps.
//!
//! The sweep walks columns x-outer, z-inner, and tests several heights per
//! column. [`IncrementalFrustum::prepare_x`] and
//! [`IncrementalFrustum::prepare_xz`] accumulate the per-axis partial dot
//! products so [`IncrementalFrustum::contains_y`] only adds the y term.
//! [`IncrementalFrustum::contains`] performs the same arithmetic in one go and
//! accepts exactly the same points.

use crate::{Rect, Vec3};

/// Camera pose and projection the frustum is built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub near: f32,
    pub far: f32,
    /// Vertical field of view, degrees.
    pub fov_y: f32,
    pub aspect: f32,
}

impl CameraView {
    /// Builds the camera basis from yaw/pitch in degrees (fly-camera convention).
    pub fn from_yaw_pitch(
        position: Vec3,
        yaw: f32,
        pitch: f32,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let yaw_rad = yaw.to_radians();
        let pitch_rad = pitch.clamp(-89.9, 89.9).to_radians();
        let forward = Vec3::new(
            yaw_rad.cos() * pitch_rad.cos(),
            pitch_rad.sin(),
            yaw_rad.sin() * pitch_rad.cos(),
        )
        .normalized();
        let right = forward.cross(Vec3::UP).normalized();
        let up = right.cross(forward).normalized();
        Self {
            position,
            forward,
            right,
            up,
            near,
            far,
            fov_y,
            aspect,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IncrementalFrustum {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    near: f32,
    far: f32,
    tan_half_v: f32,
    tan_half_h: f32,
    // x-only partials
    x_fwd: f32,
    x_right: f32,
    x_up: f32,
    x_dist2: f32,
    // x+z partials
    xz_fwd: f32,
    xz_right: f32,
    xz_up: f32,
    xz_dist2: f32,
}

impl IncrementalFrustum {
    /// `far_override`, when set and positive, replaces the camera far plane
    /// (the scan uses the detection radius here).
    pub fn new(view: &CameraView, far_override: Option<f32>) -> Self {
        let far = match far_override {
            Some(f) if f > 0.0 => f,
            _ => view.far,
        };
        let tan_half_v = (0.5 * view.fov_y.to_radians()).tan();
        Self {
            origin: view.position,
            forward: view.forward,
            right: view.right,
            up: view.up,
            near: view.near,
            far,
            tan_half_v,
            tan_half_h: tan_half_v * view.aspect,
            x_fwd: 0.0,
            x_right: 0.0,
            x_up: 0.0,
            x_dist2: 0.0,
            xz_fwd: 0.0,
            xz_right: 0.0,
            xz_up: 0.0,
            xz_dist2: 0.0,
        }
    }

    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn prepare_x(&mut self, x: f32) {
        let dx = x - self.origin.x;
        self.x_fwd = dx * self.forward.x;
        self.x_right = dx * self.right.x;
        self.x_up = dx * self.up.x;
        self.x_dist2 = dx * dx;
    }

    /// Requires a prior [`Self::prepare_x`] for the column's x.
    #[inline]
    pub fn prepare_xz(&mut self, z: f32) {
        let dz = z - self.origin.z;
        self.xz_fwd = self.x_fwd + dz * self.forward.z;
        self.xz_right = self.x_right + dz * self.right.z;
        self.xz_up = self.x_up + dz * self.up.z;
        self.xz_dist2 = self.x_dist2 + dz * dz;
    }

    /// Tests the point `(x, y, z)` for the x/z last prepared.
    #[inline]
    pub fn contains_y(&self, y: f32) -> bool {
        let dy = y - self.origin.y;
        self.accepts(
            self.xz_fwd + dy * self.forward.y,
            self.xz_right + dy * self.right.y,
            self.xz_up + dy * self.up.y,
            self.xz_dist2 + dy * dy,
        )
    }

    /// Direct containment test. Sums the components in the same order as the
    /// incremental path (x, then z, then y).
    pub fn contains(&self, point: Vec3) -> bool {
        let d = point - self.origin;
        let fwd = (d.x * self.forward.x + d.z * self.forward.z) + d.y * self.forward.y;
        let right = (d.x * self.right.x + d.z * self.right.z) + d.y * self.right.y;
        let up = (d.x * self.up.x + d.z * self.up.z) + d.y * self.up.y;
        let dist2 = (d.x * d.x + d.z * d.z) + d.y * d.y;
        self.accepts(fwd, right, up, dist2)
    }

    #[inline]
    fn accepts(&self, fwd: f32, right: f32, up: f32, dist2: f32) -> bool {
        if fwd < self.near || fwd > self.far {
            return false;
        }
        if right.abs() > fwd * self.tan_half_h {
            return false;
        }
        if up.abs() > fwd * self.tan_half_v {
            return false;
        }
        // forward distance over-approximates at the view edges
        dist2 >= self.near * self.near && dist2 <= self.far * self.far
    }

    /// The 8 corners of the near and far planes.
    pub fn corners(&self) -> [Vec3; 8] {
        let near_h = self.near * self.tan_half_v;
        let near_w = self.near * self.tan_half_h;
        let far_h = self.far * self.tan_half_v;
        let far_w = self.far * self.tan_half_h;
        let c_near = self.origin + self.forward * self.near;
        let c_far = self.origin + self.forward * self.far;
        let (u, r) = (self.up, self.right);
        [
            c_near + u * near_h - r * near_w,
            c_near + u * near_h + r * near_w,
            c_near - u * near_h - r * near_w,
            c_near - u * near_h + r * near_w,
            c_far + u * far_h - r * far_w,
            c_far + u * far_h + r * far_w,
            c_far - u * far_h - r * far_w,
            c_far - u * far_h + r * far_w,
        ]
    }

    /// Horizontal bounding box `(min_x, max_x, min_z, max_z)` of the frustum.
    pub fn xz_bounds(&self) -> (f32, f32, f32, f32) {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_z = f32::INFINITY;
        let mut max_z = f32::NEG_INFINITY;
        for p in self.corners() {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_z = min_z.min(p.z);
            max_z = max_z.max(p.z);
        }
        (min_x, max_x, min_z, max_z)
    }

    /// [`Self::xz_bounds`] rounded outward to the column grid. `step` is the
    /// grid spacing in tenths; the result is a half-open rect in key space.
    pub fn quantized_xz_bounds(&self, step: i32) -> Rect {
        let step = step.max(1);
        let spacing = step as f32 / 10.0;
        let (min_x, max_x, min_z, max_z) = self.xz_bounds();
        Rect::new(
            (min_x / spacing).floor() as i32 * step,
            (min_z / spacing).floor() as i32 * step,
            (max_x / spacing).ceil() as i32 * step + step,
            (max_z / spacing).ceil() as i32 * step + step,
        )
    }
}
