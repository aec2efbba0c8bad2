//! Space-curve generators and the random geometric graph.

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use serde_json::Value;

use crate::config::{int, num};
use crate::point::Point3;

use super::{capped, clamp_count, nonzero};

/// Circular helix centered on the origin.
pub(super) fn helix(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let r = nonzero(num(geo, "helix_r", 0.4), 0.4) * radius;
    let pitch = nonzero(num(geo, "helix_pitch", 0.3), 0.3) * radius;
    let turns = nonzero(num(geo, "helix_turns", 1.0), 1.0).max(0.1);
    let height = pitch * turns;
    (0..count)
        .map(|i| {
            let t = turns * 2.0 * PI * i as f64 / (count - 1).max(1) as f64;
            Point3::new(
                r * t.cos(),
                -height / 2.0 + pitch * t / (2.0 * PI),
                r * t.sin(),
            )
        })
        .collect()
}

/// Viviani's curve, the intersection of a sphere and a tangent cylinder,
/// recentered so it orbits the origin.
pub(super) fn viviani_curve(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let a = nonzero(num(geo, "viviani_a", 1.0), 1.0);
    let radius = num(geo, "R", 1.0);
    (0..count)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / (count - 1).max(1) as f64;
            let x = a * (1.0 + t.cos());
            let y = a * t.sin();
            let z = 2.0 * a * (t / 2.0).sin();
            Point3::new((x - 1.5 * a) * radius, y * radius, z * radius)
        })
        .collect()
}

/// Closed 3D Lissajous figure with integer frequencies per axis.
pub(super) fn lissajous3d(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let ax = nonzero(num(geo, "lissajous3d_Ax", 1.0), 1.0);
    let ay = nonzero(num(geo, "lissajous3d_Ay", 1.0), 1.0);
    let az = nonzero(num(geo, "lissajous3d_Az", 1.0), 1.0);
    let wx = int(geo, "lissajous3d_wx", 1).max(1) as f64;
    let wy = int(geo, "lissajous3d_wy", 1).max(1) as f64;
    let wz = int(geo, "lissajous3d_wz", 1).max(1) as f64;
    let phi = num(geo, "lissajous3d_phi", 0.0);
    let radius = num(geo, "R", 1.0);
    (0..count)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / count as f64;
            Point3::new(
                ax * (wx * t + phi).sin() * radius,
                ay * (wy * t).sin() * radius,
                az * (wz * t + phi / 2.0).sin() * radius,
            )
        })
        .collect()
}

/// Random nodes in a flattened box, with short edges interpolated between
/// every pair closer than `rgg_radius`.
pub(super) fn random_geometric_graph(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let nodes = clamp_count(int(geo, "rgg_nodes", 0).max(1) as usize, cap);
    let connect_radius = nonzero(num(geo, "rgg_radius", 0.2), 0.2) * radius;
    let points: Vec<Point3> = (0..nodes)
        .map(|_| {
            Point3::new(
                rng.random_range(-radius..=radius),
                rng.random_range(-radius..=radius) * 0.3,
                rng.random_range(-radius..=radius),
            )
        })
        .collect();
    let mut out = points.clone();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let dz = b.z - a.z;
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            if dist <= connect_radius && dist > 1e-6 {
                // Two interior samples along the edge.
                for s in 1..3 {
                    let t = s as f64 / 3.0;
                    out.push(Point3::new(a.x + dx * t, a.y + dy * t, a.z + dz * t));
                }
            }
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
    fn helix_spans_its_height_symmetrically() {
        let geo = json!({"R": 1.0, "helix_r": 0.4, "helix_pitch": 0.3, "helix_turns": 3.0, "N": 100});
        let mut rng = StdRng::seed_from_u64(0);
        let points = helix(&geo, 0, &mut rng);
        let height = 0.3 * 3.0;
        assert!((points[0].y + height / 2.0).abs() < 1e-9);
        assert!((points[99].y - height / 2.0).abs() < 1e-9);
        for p in &points {
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 0.4).abs() < 1e-9);
        }
    }

    #[test]
    fn viviani_curve_is_closed() {
        let geo = json!({"R": 1.0, "viviani_a": 1.0, "N": 64});
        let mut rng = StdRng::seed_from_u64(0);
        let points = viviani_curve(&geo, 0, &mut rng);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert!((first.x - last.x).abs() < 1e-9);
        assert!((first.y - last.y).abs() < 1e-9);
        // z flips sign across the full parameter range but both ends are 0.
        assert!(first.z.abs() < 1e-9 && last.z.abs() < 1e-6);
    }

    #[test]
    fn lissajous3d_amplitudes_bound_each_axis() {
        let geo = json!({"R": 1.0, "lissajous3d_Ax": 0.5, "lissajous3d_Ay": 1.0,
                         "lissajous3d_Az": 0.25, "N": 256});
        let mut rng = StdRng::seed_from_u64(0);
        for p in lissajous3d(&geo, 0, &mut rng) {
            assert!(p.x.abs() <= 0.5 + 1e-9);
            assert!(p.y.abs() <= 1.0 + 1e-9);
            assert!(p.z.abs() <= 0.25 + 1e-9);
        }
    }

    #[test]
    fn geometric_graph_contains_its_nodes() {
        let geo = json!({"R": 1.0, "rgg_nodes": 50, "rgg_radius": 0.4});
        let mut rng = StdRng::seed_from_u64(4);
        let points = random_geometric_graph(&geo, 0, &mut rng);
        assert!(points.len() >= 50, "edge samples only ever add points");
        for p in &points {
            assert!(p.x.abs() <= 1.0 && p.z.abs() <= 1.0);
            assert!(p.y.abs() <= 0.3 + 1e-9);
        }
    }
}
