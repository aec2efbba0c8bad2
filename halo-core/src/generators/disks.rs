//! Planar generators: phyllotaxis disks, spirals, rose and superformula
//! curves, rejection-sampled disks and the flat packing layouts. All of
//! them emit points on the `y = 0` plane.

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use serde_json::Value;

use crate::config::{int, num, text};
use crate::expr::Expr;
use crate::noise::clamp01;
use crate::point::Point3;

use super::{capped, clamp_count, nonzero, parse_bbox, superformula2d};

/// Vogel phyllotaxis: points at golden-angle turns, radius growing with
/// the square root of the index for even area coverage.
pub(super) fn disk_phyllo(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let phi_g = num(geo, "phi_g", 0.0);
    let denom = (count - 1).max(1) as f64;
    (0..count)
        .map(|k| {
            let theta = k as f64 * phi_g;
            let r = radius * (k as f64 / denom).sqrt();
            Point3::new(r * theta.cos(), 0.0, r * theta.sin())
        })
        .collect()
}

/// `r = a + b * theta`, rescaled so the outermost turn touches `R`.
pub(super) fn archimede_spiral(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let theta_max = nonzero(num(geo, "theta_max", 0.0), PI * 6.0).max(0.1);
    let arch_a = num(geo, "arch_a", 0.0);
    let arch_b = num(geo, "arch_b", 0.0);
    let radius = num(geo, "R", 1.0);
    let denom = arch_a + arch_b * theta_max;
    let scale = if denom != 0.0 { radius / denom.abs() } else { radius };
    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                theta_max * i as f64 / (count - 1) as f64
            };
            let r = (arch_a + arch_b * t).abs() * scale;
            Point3::new(r * t.cos(), 0.0, r * t.sin())
        })
        .collect()
}

/// `r = a * exp(b * theta)`, rescaled to end at `R`.
pub(super) fn log_spiral(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let theta_max = nonzero(num(geo, "theta_max", 0.0), PI * 6.0).max(0.1);
    let log_a = num(geo, "log_a", 0.0);
    let log_b = num(geo, "log_b", 0.0);
    let radius = num(geo, "R", 1.0);
    let end = log_a * (log_b * theta_max).exp();
    let scale = if end != 0.0 { radius / end } else { radius };
    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                theta_max * i as f64 / (count - 1) as f64
            };
            let r = (log_a * (log_b * t).exp()).abs() * scale;
            Point3::new(r * t.cos(), 0.0, r * t.sin())
        })
        .collect()
}

/// Rose curve `r = |cos(k * theta)| * R`.
pub(super) fn rose_curve(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let theta_max = nonzero(num(geo, "theta_max", 0.0), 2.0 * PI).max(0.1);
    let rose_k = num(geo, "rose_k", 0.0);
    let radius = num(geo, "R", 1.0);
    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.0
            } else {
                theta_max * i as f64 / (count - 1) as f64
            };
            let r = (rose_k * t).cos().abs() * radius;
            Point3::new(r * t.cos(), 0.0, r * t.sin())
        })
        .collect()
}

pub(super) fn superformula_2d(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let m = num(geo, "sf2_m", 0.0);
    let a = nonzero(num(geo, "sf2_a", 0.0), 1.0);
    let b = nonzero(num(geo, "sf2_b", 0.0), 1.0);
    let n1 = nonzero(num(geo, "sf2_n1", 0.0), 0.5);
    let n2 = nonzero(num(geo, "sf2_n2", 0.0), 0.5);
    let n3 = nonzero(num(geo, "sf2_n3", 0.0), 0.5);
    (0..count)
        .map(|i| {
            let theta = i as f64 / count as f64 * 2.0 * PI;
            let r = radius * superformula2d(theta, m, a, b, n1, n2, n3);
            Point3::new(r * theta.cos(), 0.0, r * theta.sin())
        })
        .collect()
}

/// Rejection-samples the unit disk against a `density_pdf` expression of
/// `r` and `u`. Gives up after 20 attempts per requested point, so an
/// expression that is zero almost everywhere yields fewer points instead
/// of hanging.
pub(super) fn density_warp(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let pdf_expr = Expr::parse(text(geo, "density_pdf", "")).ok();
    let mut out = Vec::with_capacity(count);
    let max_attempts = count * 20;
    let mut attempts = 0;
    while out.len() < count && attempts < max_attempts {
        attempts += 1;
        let u = rng.random::<f64>();
        let r = u.sqrt();
        let pdf = match &pdf_expr {
            Some(expr) => expr.eval(&[("r", r), ("u", u)]).unwrap_or(0.0).max(0.0),
            None => 1.0,
        };
        if pdf <= 0.0 {
            continue;
        }
        if rng.random::<f64>() > clamp01(pdf) {
            continue;
        }
        let theta = rng.random::<f64>() * 2.0 * PI;
        let r_abs = radius * r;
        out.push(Point3::new(r_abs * theta.cos(), 0.0, r_abs * theta.sin()));
    }
    out
}

/// Dart-throwing Poisson sampling with 50 attempts per requested point.
pub(super) fn poisson_disk(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let min_dist = num(geo, "poisson_dmin", 0.0).max(0.0) * radius;
    let min_sq = min_dist * min_dist;
    let mut out: Vec<Point3> = Vec::with_capacity(count);
    let max_tries = count * 50;
    let mut tries = 0;
    while out.len() < count && tries < max_tries {
        tries += 1;
        let r = radius * rng.random::<f64>().sqrt();
        let theta = rng.random::<f64>() * 2.0 * PI;
        let candidate = Point3::new(r * theta.cos(), 0.0, r * theta.sin());
        let ok = out.iter().all(|existing| {
            let dx = candidate.x - existing.x;
            let dz = candidate.z - existing.z;
            dx * dx + dz * dz >= min_sq
        });
        if ok {
            out.push(candidate);
        }
    }
    out
}

pub(super) fn lissajous_disk(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(2) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let a = int(geo, "lissajous_a", 0).max(1) as f64;
    let b = int(geo, "lissajous_b", 0).max(1) as f64;
    let phase = num(geo, "lissajous_phase", 0.0);
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64 * 2.0 * PI;
            Point3::new(
                radius * (a * t + phase).cos(),
                0.0,
                radius * (b * t).sin(),
            )
        })
        .collect()
}

/// Evenly spaced rings out to `R`; a single ring collapses to the center.
pub(super) fn concentric_rings(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let rings = int(geo, "rings_count", 0).max(1) as usize;
    let per_ring = int(geo, "ring_points", 0).max(3) as usize;
    let mut out = Vec::with_capacity(rings * per_ring + 1);
    if rings <= 1 {
        out.push(Point3::new(0.0, 0.0, 0.0));
    }
    for ring in 0..rings {
        let r = if rings > 1 {
            radius * ring as f64 / (rings - 1) as f64
        } else {
            0.0
        };
        for j in 0..per_ring {
            let angle = j as f64 / per_ring as f64 * 2.0 * PI;
            out.push(Point3::new(r * angle.cos(), 0.0, r * angle.sin()));
        }
    }
    capped(out, cap)
}

/// Hexagonal lattice, rescaled so the farthest site sits at `R`.
pub(super) fn hex_packing_plane(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let step = nonzero(num(geo, "hex_step", 0.2), 0.2);
    let nx = int(geo, "hex_nx", 1).max(1) as usize;
    let ny = int(geo, "hex_ny", 1).max(1) as usize;
    let mut sites = Vec::with_capacity(nx * ny);
    for ix in 0..nx {
        for iy in 0..ny {
            let x = (ix as f64 - (nx - 1) as f64 / 2.0) * step;
            let mut z = (iy as f64 - (ny - 1) as f64 / 2.0) * step * 3f64.sqrt() / 2.0;
            if ix % 2 == 1 {
                z += step * 3f64.sqrt() / 4.0;
            }
            sites.push((x, z));
        }
    }
    let max_len = sites
        .iter()
        .map(|&(x, z)| x.hypot(z))
        .fold(0.0f64, f64::max)
        .max(1e-12);
    let scale = radius / max_len;
    let out = sites
        .into_iter()
        .map(|(x, z)| Point3::new(x * scale, 0.0, z * scale))
        .collect();
    capped(out, cap)
}

/// Uniform random seeds inside `voronoi_bbox`, scaled by `R`.
pub(super) fn voronoi_seeds(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let count = clamp_count(int(geo, "voronoi_N", 0).max(1) as usize, cap);
    let (xmin, xmax, ymin, ymax) = parse_bbox(text(geo, "voronoi_bbox", ""));
    (0..count)
        .map(|_| {
            Point3::new(
                rng.random_range(xmin..=xmax) * radius,
                0.0,
                rng.random_range(ymin..=ymax) * radius,
            )
        })
        .collect()
}
