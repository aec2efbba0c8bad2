//! Orbit camera state and the per-frame projection transform.
//!
//! The camera circles the origin at a fixed radius, looking inward. Its
//! azimuth integrates `omegaDegPerSec` over wall time; height and tilt are
//! static angles from the camera section. Projection is a plain pinhole:
//! screen offset is proportional to `fov / depth`, normalized so that a
//! `fov` of 600 fills a 600 pixel viewport at unit scale.

use serde_json::Value;

use crate::config::num;
use crate::noise::to_rad;

/// Reference viewport edge in pixels; `fov` values are calibrated to it.
const FOV_REF_PX: f64 = 600.0;

/// Minimum camera-space depth; anything at or behind it is rejected.
const NEAR_LIMIT: f64 = 0.01;

/// Accumulated orbit azimuth, owned by the engine across frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrbitState {
    theta_deg: f64,
}

impl OrbitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the azimuth by `omega * dt` and wraps it into `[0, 360)`.
    pub fn advance(&mut self, omega_deg_per_sec: f64, dt_secs: f64) {
        self.theta_deg = (self.theta_deg + omega_deg_per_sec * dt_secs).rem_euclid(360.0);
    }

    pub fn theta_deg(&self) -> f64 {
        self.theta_deg
    }
}

/// One projected position plus its camera-space depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub sx: f64,
    pub sy: f64,
    pub depth: f64,
}

/// Camera transform with all trig precomputed for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameCamera {
    cos_theta: f64,
    sin_theta: f64,
    cos_height: f64,
    sin_height: f64,
    cos_tilt: f64,
    sin_tilt: f64,
    radius: f64,
    fov_scale: f64,
    cx: f64,
    cy: f64,
}

impl FrameCamera {
    /// Builds the frame transform from the camera section, the current
    /// orbit azimuth and the viewport size in pixels.
    pub fn new(camera: &Value, theta_deg: f64, width: f64, height: f64) -> Self {
        let theta = to_rad(theta_deg);
        let height_angle = to_rad(num(camera, "camHeightDeg", 0.0));
        let tilt = to_rad(num(camera, "camTiltDeg", 0.0));
        let radius = {
            let r = num(camera, "camRadius", 3.2);
            if r == 0.0 { 3.2 } else { r }
        };
        let fov = {
            let f = num(camera, "fov", 600.0);
            if f == 0.0 { 600.0 } else { f }
        };
        Self {
            cos_theta: theta.cos(),
            sin_theta: theta.sin(),
            cos_height: height_angle.cos(),
            sin_height: height_angle.sin(),
            cos_tilt: tilt.cos(),
            sin_tilt: tilt.sin(),
            radius,
            fov_scale: fov * (width.min(height) / FOV_REF_PX),
            cx: width / 2.0,
            cy: height / 2.0,
        }
    }

    /// Projects a world-space point to the screen.
    ///
    /// Returns `None` when the point lands at or behind the near limit, or
    /// when the screen coordinates come out non-finite.
    pub fn project(&self, x: f64, y: f64, z: f64) -> Option<Projected> {
        // Orbit azimuth around Y.
        let xc = self.cos_theta * x - self.sin_theta * z;
        let zc = self.sin_theta * x + self.cos_theta * z;
        let yc = y;

        // Camera height pitch.
        let yc2 = self.cos_height * yc - self.sin_height * zc;
        let zc2 = self.sin_height * yc + self.cos_height * zc;

        // Roll around the view axis.
        let xc3 = self.cos_tilt * xc - self.sin_tilt * yc2;
        let yc3 = self.sin_tilt * xc + self.cos_tilt * yc2;

        let depth = zc2 + self.radius;
        if depth <= NEAR_LIMIT {
            return None;
        }
        let inv = self.fov_scale / depth;
        let sx = self.cx + xc3 * inv;
        let sy = self.cy + yc3 * inv;
        if !sx.is_finite() || !sy.is_finite() {
            return None;
        }
        Some(Projected { sx, sy, depth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_camera() -> Value {
        json!({
            "camRadius": 3.2,
            "camHeightDeg": 0,
            "camTiltDeg": 0,
            "fov": 600,
        })
    }

    #[test]
    fn orbit_integrates_and_wraps() {
        let mut orbit = OrbitState::new();
        orbit.advance(20.0, 0.5);
        assert!((orbit.theta_deg() - 10.0).abs() < 1e-9);
        orbit.advance(20.0, 20.0);
        assert!((orbit.theta_deg() - 50.0).abs() < 1e-9);
        let mut orbit = OrbitState::new();
        orbit.advance(-20.0, 1.0);
        assert!((orbit.theta_deg() - 340.0).abs() < 1e-9);
    }

    #[test]
    fn origin_projects_to_viewport_center() {
        let cam = FrameCamera::new(&default_camera(), 0.0, 800.0, 600.0);
        let p = cam.project(0.0, 0.0, 0.0).unwrap();
        assert!((p.sx - 400.0).abs() < 1e-9);
        assert!((p.sy - 300.0).abs() < 1e-9);
        assert!((p.depth - 3.2).abs() < 1e-9);
    }

    #[test]
    fn nearer_points_project_larger_offsets() {
        let cam = FrameCamera::new(&default_camera(), 0.0, 600.0, 600.0);
        // Negative z moves toward the camera at theta 0.
        let near = cam.project(0.5, 0.0, -1.0).unwrap();
        let far = cam.project(0.5, 0.0, 1.0).unwrap();
        assert!(near.depth < far.depth);
        assert!((near.sx - 300.0).abs() > (far.sx - 300.0).abs());
    }

    #[test]
    fn points_behind_the_camera_are_rejected() {
        let cam = FrameCamera::new(&json!({"camRadius": 1.0, "fov": 600}), 0.0, 600.0, 600.0);
        assert!(cam.project(0.0, 0.0, -2.0).is_none());
        assert!(cam.project(0.0, 0.0, -0.5).is_some());
    }

    #[test]
    fn orbit_azimuth_rotates_the_scene() {
        let cam0 = FrameCamera::new(&default_camera(), 0.0, 600.0, 600.0);
        let cam90 = FrameCamera::new(&default_camera(), 90.0, 600.0, 600.0);
        let p0 = cam0.project(1.0, 0.0, 0.0).unwrap();
        let p90 = cam90.project(1.0, 0.0, 0.0).unwrap();
        // At theta 0 the +x point is off-center; at 90 it sits on the view axis.
        assert!((p0.sx - 300.0).abs() > 1.0);
        assert!((p90.sx - 300.0).abs() < 1e-6);
    }

    #[test]
    fn fov_scales_with_the_smaller_viewport_edge() {
        let cam_small = FrameCamera::new(&default_camera(), 0.0, 300.0, 300.0);
        let cam_large = FrameCamera::new(&default_camera(), 0.0, 600.0, 600.0);
        let small = cam_small.project(0.5, 0.0, 0.0).unwrap();
        let large = cam_large.project(0.5, 0.0, 0.0).unwrap();
        let off_small = small.sx - 150.0;
        let off_large = large.sx - 300.0;
        assert!((off_large / off_small - 2.0).abs() < 1e-9);
    }

    #[test]
    fn tilt_rolls_the_projection() {
        let cam = FrameCamera::new(
            &json!({"camRadius": 3.2, "camTiltDeg": 90, "fov": 600}),
            0.0,
            600.0,
            600.0,
        );
        let p = cam.project(0.5, 0.0, 0.0).unwrap();
        // A 90 degree roll moves the horizontal offset onto the y axis.
        assert!((p.sx - 300.0).abs() < 1e-6);
        assert!((p.sy - 300.0).abs() > 1.0);
    }
}
