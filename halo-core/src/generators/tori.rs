//! Torus-family generators, plus the twisted strip and Klein bottle that
//! share the same tube parameters.

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use serde_json::Value;

use crate::config::{int, num};
use crate::point::Point3;

use super::{capped, clamp_count, nonzero};

fn torus_with(geo: &Value, cap: usize, r_major: f64, r_minor: f64) -> Vec<Point3> {
    let lat_steps = int(geo, "lat", 0).max(3) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let radius = num(geo, "R", 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let theta = i as f64 / lat_steps as f64 * 2.0 * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let ring = r_major + r_minor * cos_theta;
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            out.push(Point3::new(
                radius * ring * phi.cos(),
                radius * r_minor * sin_theta,
                radius * ring * phi.sin(),
            ));
        }
    }
    capped(out, cap)
}

pub(super) fn torus(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let r_major = nonzero(num(geo, "R_major", 0.0), 1.2);
    let r_minor = nonzero(num(geo, "r_minor", 0.0), 0.45);
    torus_with(geo, cap, r_major, r_minor)
}

/// Two nested tori; the second uses `R_major2` as its major radius.
pub(super) fn double_torus(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let mut combined = torus(geo, cap, rng);
    let secondary_major = nonzero(num(geo, "R_major2", num(geo, "R_major", 1.2)), 1.2);
    let r_minor = nonzero(num(geo, "r_minor", 0.0), 0.45);
    combined.extend(torus_with(geo, cap, secondary_major, r_minor));
    capped(combined, cap)
}

/// Torus degenerated so the tube touches the axis. The major radius is
/// clamped to the minor radius to hold that shape.
pub(super) fn horn_torus(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let r_minor = nonzero(num(geo, "r_minor", 0.45), 0.45);
    let r_major = {
        let r = nonzero(num(geo, "R_major", 0.0), r_minor);
        if !r.is_finite() { r_minor } else { r.min(r_minor) }
    };
    torus_with(geo, cap, r_major, r_minor)
}

/// Self-intersecting torus; the major radius is kept strictly below the
/// minor radius.
pub(super) fn spindle_torus(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let r_minor = nonzero(num(geo, "r_minor", 0.45), 0.45);
    let mut r_major = nonzero(num(geo, "R_major", 0.0), 0.75 * r_minor);
    if !r_major.is_finite() {
        r_major = 0.75 * r_minor;
    }
    if r_major >= r_minor {
        r_major = (0.25 * r_minor).max(r_minor * 0.75);
    }
    torus_with(geo, cap, r_major, r_minor)
}

/// (p, q) torus knot sampled along its full arc length.
pub(super) fn torus_knot(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(50) as usize, cap);
    let p = int(geo, "torus_knot_p", 0).max(1) as f64;
    let q = int(geo, "torus_knot_q", 0).max(1) as f64;
    let r_major = nonzero(num(geo, "R_major", 1.0), 1.0);
    let r_minor = nonzero(num(geo, "r_minor", 0.2), 0.2);
    let radius = num(geo, "R", 1.0);
    let total = 2.0 * PI * p;
    (0..count)
        .map(|i| {
            let t = total * i as f64 / count as f64;
            let (sin_q, cos_q) = (q * t / p).sin_cos();
            let ring = r_major + r_minor * cos_q;
            Point3::new(
                ring * t.cos() * radius,
                ring * t.sin() * radius,
                r_minor * sin_q * radius,
            )
        })
        .collect()
}

/// Rectangular strip wrapped around a circle with `strip_n` half twists.
pub(super) fn strip_twist(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let lat_steps = int(geo, "lat", 0).max(3) as usize;
    let lon_steps = int(geo, "lon", 0).max(20) as usize;
    let half_w = num(geo, "strip_w", 0.0) / 2.0;
    let twist_n = num(geo, "strip_n", 0.0);
    let radius = num(geo, "R", 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lon_steps {
        let u = i as f64 / lon_steps as f64 * 2.0 * PI;
        for j in 0..lat_steps {
            let v = -half_w
                + j as f64 / (lat_steps - 1).max(1) as f64 * (2.0 * half_w);
            let angle = twist_n * u / 2.0;
            let ring = radius + v * angle.cos();
            out.push(Point3::new(
                ring * u.cos(),
                v * angle.sin(),
                ring * u.sin(),
            ));
        }
    }
    capped(out, cap)
}

/// Figure-8 immersion of the Klein bottle.
pub(super) fn klein_bottle(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let lat_steps = int(geo, "lat", 0).max(3) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let r_major = num(geo, "R_major", 0.0);
    let r_minor = num(geo, "r_minor", 0.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lon_steps {
        let v = i as f64 / lon_steps as f64 * 2.0 * PI;
        let sin_v = v.sin();
        let sin_2v = (2.0 * v).sin();
        for j in 0..lat_steps {
            let u = j as f64 / lat_steps as f64 * 2.0 * PI;
            let (sin_u, cos_u) = u.sin_cos();
            let (sin_half, cos_half) = (u / 2.0).sin_cos();
            let ring = r_major + r_minor * cos_half * sin_v - r_minor * sin_half * sin_2v;
            out.push(Point3::new(
                ring * cos_u,
                ring * sin_u,
                r_minor * sin_half * sin_v + r_minor * cos_half * sin_2v,
            ));
        }
    }
    capped(out, cap)
}

/// Classic Mobius band of width `mobius_w`.
pub(super) fn mobius(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(3) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let width = nonzero(num(geo, "mobius_w", 0.4), 0.4);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let u = i as f64 / lat_steps as f64 * 2.0 * PI;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_half, cos_half) = (u / 2.0).sin_cos();
        for j in 0..lon_steps {
            let v = j as f64 / (lon_steps - 1).max(1) as f64 * 2.0 - 1.0;
            let s = v * width * 0.5;
            let ring = radius + s * cos_half;
            out.push(Point3::new(ring * cos_u, ring * sin_u, s * sin_half));
        }
    }
    capped(out, cap)
}

/// Streamlines advected over the torus surface at fixed angular rates,
/// seeded at random tube angles.
pub(super) fn stream_on_torus(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let stream_count = int(geo, "stream_N", 0).max(1) as usize;
    let steps = int(geo, "stream_steps", 0).max(8) as usize;
    let r_major = nonzero(num(geo, "R_major", 1.0), 1.0);
    let r_minor = nonzero(num(geo, "r_minor", 0.3), 0.3);
    let mut out = Vec::with_capacity(stream_count * steps);
    for i in 0..stream_count {
        let mut theta = i as f64 / stream_count as f64 * 2.0 * PI;
        let mut phi = rng.random::<f64>() * 2.0 * PI;
        for _ in 0..steps {
            theta += 0.08;
            phi += 0.12;
            let ring = r_major + r_minor * theta.cos();
            out.push(Point3::new(
                ring * phi.cos() * radius,
                r_minor * theta.sin() * radius,
                ring * phi.sin() * radius,
            ));
        }
    }
    capped(out, cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn torus_points_sit_on_the_tube() {
        let geo = json!({"R": 1.0, "R_major": 1.2, "r_minor": 0.45, "lat": 16, "lon": 16});
        let mut rng = StdRng::seed_from_u64(0);
        for p in torus(&geo, 0, &mut rng) {
            // Distance from the ring circle equals the minor radius.
            let axial = (p.x * p.x + p.z * p.z).sqrt() - 1.2;
            let tube = (axial * axial + p.y * p.y).sqrt();
            assert!((tube - 0.45).abs() < 1e-9);
        }
    }

    #[test]
    fn double_torus_combines_two_rings() {
        let geo = json!({"R": 1.0, "R_major": 1.2, "R_major2": 0.8,
                         "r_minor": 0.2, "lat": 8, "lon": 8});
        let mut rng = StdRng::seed_from_u64(0);
        let points = double_torus(&geo, 0, &mut rng);
        assert_eq!(points.len(), 128);
        let axial: Vec<f64> = points
            .iter()
            .map(|p| (p.x * p.x + p.z * p.z).sqrt())
            .collect();
        assert!(axial.iter().any(|&r| r > 1.1));
        assert!(axial.iter().any(|&r| r < 1.05));
    }

    #[test]
    fn horn_torus_clamps_the_major_radius() {
        let geo = json!({"R": 1.0, "R_major": 2.0, "r_minor": 0.45, "lat": 8, "lon": 8});
        let mut rng = StdRng::seed_from_u64(0);
        // With R_major clamped to r_minor the tube passes through the origin.
        let min_r = horn_torus(&geo, 0, &mut rng)
            .iter()
            .map(Point3::length)
            .fold(f64::INFINITY, f64::min);
        assert!(min_r < 0.2);
    }

    #[test]
    fn spindle_torus_keeps_major_below_minor() {
        let geo = json!({"R": 1.0, "R_major": 1.0, "r_minor": 0.45, "lat": 12, "lon": 12});
        let mut rng = StdRng::seed_from_u64(0);
        let max_axial = spindle_torus(&geo, 0, &mut rng)
            .iter()
            .map(|p| (p.x * p.x + p.z * p.z).sqrt())
            .fold(0.0f64, f64::max);
        assert!(max_axial < 0.45 * 0.75 + 0.45 + 1e-9);
    }

    #[test]
    fn torus_knot_closes_within_the_tube_bounds() {
        let geo = json!({"R": 1.0, "torus_knot_p": 3, "torus_knot_q": 2,
                         "R_major": 1.0, "r_minor": 0.2, "N": 200});
        let mut rng = StdRng::seed_from_u64(0);
        let points = torus_knot(&geo, 0, &mut rng);
        assert_eq!(points.len(), 200);
        for p in &points {
            let planar = (p.x * p.x + p.y * p.y).sqrt();
            assert!(planar <= 1.2 + 1e-9 && planar >= 0.8 - 1e-9);
            assert!(p.z.abs() <= 0.2 + 1e-9);
        }
    }

    #[test]
    fn mobius_band_width_bounds_the_band() {
        let geo = json!({"R": 1.0, "mobius_w": 0.4, "lat": 24, "lon": 5});
        let mut rng = StdRng::seed_from_u64(0);
        for p in mobius(&geo, 0, &mut rng) {
            assert!(p.z.abs() <= 0.2 + 1e-9);
            let planar = (p.x * p.x + p.y * p.y).sqrt();
            assert!((0.8..=1.2 + 1e-9).contains(&planar));
        }
    }

    #[test]
    fn stream_on_torus_emits_streams_times_steps() {
        let geo = json!({"R": 1.0, "stream_N": 4, "stream_steps": 16,
                         "R_major": 1.0, "r_minor": 0.3});
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(stream_on_torus(&geo, 0, &mut rng).len(), 64);
    }
}
