//! Per-frame point deformation and the per-point rotation/pulse stage.
//!
//! Stage order is fixed: noise warp, field flow, radial repel, density
//! pulse, then the static orientation rotations (X, then Y, then Z). Every
//! stage is skipped entirely when its strength is zero, so the default
//! state leaves the base cloud untouched.

use std::f64::consts::PI;

use serde_json::Value;

use crate::config::num;
use crate::noise::{clamp01, hash01, to_rad, value_noise3};
use crate::point::Point3;

/// Applies the distribution deformation stages and the fixed orientation
/// to one base point, producing this frame's animated position.
///
/// The warp stages sample noise at the *base* coordinates, not the output
/// of earlier stages, which keeps the warp field attached to the geometry
/// instead of feeding back on itself.
pub fn apply_point_modifiers(
    geometry: &Value,
    distribution: &Value,
    dynamics: &Value,
    base: &Point3,
    now_ms: f64,
) -> Point3 {
    let radius = {
        let r = num(geometry, "R", 1.0);
        if r == 0.0 { 1.0 } else { r }
    };
    let (mut x, mut y, mut z) = (base.x, base.y, base.z);

    let noise_warp = num(distribution, "noiseWarp", 0.0);
    if noise_warp != 0.0 {
        let amp = noise_warp * radius * 0.4;
        let freq = 1.3;
        let anim = now_ms * 0.0006;
        x += amp
            * (value_noise3(
                (base.x + anim) * freq,
                (base.y - anim) * freq,
                (base.z + 2.0 + anim) * freq,
            ) * 2.0
                - 1.0);
        y += amp
            * (value_noise3(
                (base.x - anim) * freq,
                (base.y + anim) * freq,
                (base.z - anim) * freq,
            ) * 2.0
                - 1.0);
        z += amp
            * (value_noise3(
                (base.x + anim * 0.5) * freq,
                (base.y + 2.0 * anim) * freq,
                (base.z - anim * 0.25) * freq,
            ) * 2.0
                - 1.0);
    }

    let flow = num(distribution, "fieldFlow", 0.0);
    if flow != 0.0 {
        // Swirl around Y, sheared by height so layers drift apart.
        let angle = flow * 0.4 * now_ms * 0.001 + flow * 0.3 * (y / radius.max(1e-6));
        let (sin_a, cos_a) = angle.sin_cos();
        (x, z) = (cos_a * x - sin_a * z, sin_a * x + cos_a * z);
    }

    let repel = num(distribution, "repelForce", 0.0);
    if repel != 0.0 {
        let r = {
            let r = (x * x + y * y + z * z).sqrt();
            if r == 0.0 { 1.0 } else { r }
        };
        let diff = radius - r;
        let k = repel * 0.6;
        x += diff * k * (x / r);
        y += diff * k * (y / r);
        z += diff * k * (z / r);
    }

    let pulse = num(distribution, "densityPulse", 0.0);
    if pulse != 0.0 {
        let scale = 1.0 + 0.3 * pulse * (now_ms * 0.001 * 2.0 * PI).sin();
        x *= scale;
        y *= scale;
        z *= scale;
    }

    let orient_x = num(dynamics, "orientXDeg", 0.0);
    if orient_x != 0.0 {
        let (sin_x, cos_x) = to_rad(orient_x).sin_cos();
        (y, z) = (cos_x * y - sin_x * z, sin_x * y + cos_x * z);
    }
    let orient_y = num(dynamics, "orientYDeg", 0.0);
    if orient_y != 0.0 {
        let (sin_y, cos_y) = to_rad(orient_y).sin_cos();
        (x, z) = (cos_y * x + sin_y * z, -sin_y * x + cos_y * z);
    }
    let orient_z = num(dynamics, "orientZDeg", 0.0);
    if orient_z != 0.0 {
        let (sin_z, cos_z) = to_rad(orient_z).sin_cos();
        (x, y) = (cos_z * x - sin_z * y, sin_z * x + cos_z * y);
    }

    Point3::with_seed(x, y, z, base.seed)
}

/// Per-point phase factor in `[0, 1]` for the configured `rotPhaseMode`.
///
/// `by_index` spreads the phase along the point order, `by_radius` along
/// the distance from the spin axis, and `random` assigns each point a
/// stable draw (salt 77). `none` yields zero for all points.
pub fn phase_factor(
    dynamics: &Value,
    geometry: &Value,
    point: &Point3,
    index: usize,
    total: usize,
) -> f64 {
    match crate::config::text(dynamics, "rotPhaseMode", "none") {
        "by_index" => {
            if total <= 1 {
                0.0
            } else {
                index as f64 / (total - 1) as f64
            }
        }
        "by_radius" => {
            let radius = {
                let r = num(geometry, "R", 1.0);
                if r == 0.0 { 1.0 } else { r }
            };
            clamp01((point.x * point.x + point.z * point.z).sqrt() / radius.max(1e-6))
        }
        "random" => hash01(index as i64, 77),
        _ => 0.0,
    }
}

/// Breathing scale for this frame: `1 + A * sin(w*t + phase0 + 2*pi*phase)`.
pub fn pulse_scale(dynamics: &Value, now_ms: f64, phase: f64) -> f64 {
    let amp = num(dynamics, "pulseA", 0.0);
    let w = num(dynamics, "pulseW", 0.0);
    let phi = to_rad(num(dynamics, "pulsePhaseDeg", 0.0));
    1.0 + amp * (w * now_ms * 0.001 + phi + 2.0 * PI * phase).sin()
}

/// Continuous spin angles (radians) for this frame and phase factor.
///
/// Rates are in degrees per second; `rotPhaseDeg` offsets each axis by the
/// same phase-scaled amount.
pub fn spin_angles(dynamics: &Value, now_ms: f64, phase: f64) -> (f64, f64, f64) {
    let t = now_ms * 0.001;
    let offset = to_rad(num(dynamics, "rotPhaseDeg", 0.0)) * phase;
    (
        to_rad(num(dynamics, "rotX", 0.0)) * t + offset,
        to_rad(num(dynamics, "rotY", 0.0)) * t + offset,
        to_rad(num(dynamics, "rotZ", 0.0)) * t + offset,
    )
}

/// Rotates a scaled point by the spin angles, Z axis first, then X, then Y.
pub fn spin(x: f64, y: f64, z: f64, angles: (f64, f64, f64)) -> (f64, f64, f64) {
    let (ang_x, ang_y, ang_z) = angles;
    let (sin_z, cos_z) = ang_z.sin_cos();
    let (sin_x, cos_x) = ang_x.sin_cos();
    let (sin_y, cos_y) = ang_y.sin_cos();

    let xz = cos_z * x - sin_z * y;
    let yz = sin_z * x + cos_z * y;
    let zz = z;

    let yx = cos_x * yz - sin_x * zz;
    let zx = sin_x * yz + cos_x * zz;

    (cos_y * xz + sin_y * zx, yx, -sin_y * xz + cos_y * zx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zeroed_stages_leave_the_point_untouched() {
        let geometry = json!({"R": 1.0});
        let distribution = json!({});
        let dynamics = json!({});
        let base = Point3::with_seed(0.3, -0.7, 0.2, 5);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &base, 1234.0);
        assert_eq!(out, base);
    }

    #[test]
    fn noise_warp_moves_points_within_amplitude() {
        let geometry = json!({"R": 1.0});
        let distribution = json!({"noiseWarp": 0.5});
        let dynamics = json!({});
        let base = Point3::new(0.5, 0.5, 0.5);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &base, 500.0);
        let amp = 0.5 * 0.4;
        assert!((out.x - base.x).abs() <= amp + 1e-9);
        assert!((out.y - base.y).abs() <= amp + 1e-9);
        assert!((out.z - base.z).abs() <= amp + 1e-9);
        assert_ne!(out, base);
    }

    #[test]
    fn field_flow_preserves_height_and_axis_distance() {
        let geometry = json!({"R": 1.0});
        let distribution = json!({"fieldFlow": 1.0});
        let dynamics = json!({});
        let base = Point3::new(0.8, 0.3, 0.0);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &base, 2000.0);
        assert_eq!(out.y, base.y);
        let before = (base.x * base.x + base.z * base.z).sqrt();
        let after = (out.x * out.x + out.z * out.z).sqrt();
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn repel_pushes_inner_points_outward() {
        let geometry = json!({"R": 1.0});
        let distribution = json!({"repelForce": 1.0});
        let dynamics = json!({});
        let inner = Point3::new(0.5, 0.0, 0.0);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &inner, 0.0);
        assert!(out.x > inner.x, "inner point should move toward the shell");
        let outer = Point3::new(2.0, 0.0, 0.0);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &outer, 0.0);
        assert!(out.x < outer.x, "outer point should move inward");
    }

    #[test]
    fn orientation_rotates_in_x_y_z_order() {
        let geometry = json!({"R": 1.0});
        let distribution = json!({});
        let dynamics = json!({"orientZDeg": 90.0});
        let base = Point3::new(1.0, 0.0, 0.0);
        let out = apply_point_modifiers(&geometry, &distribution, &dynamics, &base, 0.0);
        assert!(out.x.abs() < 1e-9);
        assert!((out.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn phase_factor_modes_cover_their_ranges() {
        let geometry = json!({"R": 1.0});
        let p = Point3::new(0.5, 0.0, 0.0);

        let by_index = json!({"rotPhaseMode": "by_index"});
        assert_eq!(phase_factor(&by_index, &geometry, &p, 0, 5), 0.0);
        assert_eq!(phase_factor(&by_index, &geometry, &p, 4, 5), 1.0);
        assert_eq!(phase_factor(&by_index, &geometry, &p, 0, 1), 0.0);

        let by_radius = json!({"rotPhaseMode": "by_radius"});
        assert!((phase_factor(&by_radius, &geometry, &p, 0, 5) - 0.5).abs() < 1e-9);

        let random = json!({"rotPhaseMode": "random"});
        let a = phase_factor(&random, &geometry, &p, 3, 5);
        let b = phase_factor(&random, &geometry, &p, 3, 5);
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));

        let none = json!({});
        assert_eq!(phase_factor(&none, &geometry, &p, 3, 5), 0.0);
    }

    #[test]
    fn pulse_scale_oscillates_around_one() {
        let dynamics = json!({"pulseA": 0.2, "pulseW": 1.0});
        let mut seen_above = false;
        let mut seen_below = false;
        for step in 0..100 {
            let s = pulse_scale(&dynamics, step as f64 * 100.0, 0.0);
            assert!((0.8..=1.2).contains(&s));
            seen_above |= s > 1.0;
            seen_below |= s < 1.0;
        }
        assert!(seen_above && seen_below);
        assert_eq!(pulse_scale(&json!({}), 12345.0, 0.3), 1.0);
    }

    #[test]
    fn spin_applies_z_then_x_then_y() {
        // 90 degrees around Z maps +x to +y.
        let (x, y, z) = spin(1.0, 0.0, 0.0, (0.0, 0.0, std::f64::consts::FRAC_PI_2));
        assert!(x.abs() < 1e-9 && (y - 1.0).abs() < 1e-9 && z.abs() < 1e-9);
        // Z then X: +x goes to +y, then 90 degrees around X sends +y to +z.
        let (x, y, z) = spin(
            1.0,
            0.0,
            0.0,
            (std::f64::consts::FRAC_PI_2, 0.0, std::f64::consts::FRAC_PI_2),
        );
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9 && (z - 1.0).abs() < 1e-9);
    }
}
