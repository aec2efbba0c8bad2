//! Sphere-family generators: lattice and spiral samplings of the sphere,
//! superquadric variants and the displaced spheres (noise, harmonics,
//! weight expressions).

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use serde_json::Value;

use crate::config::{int, num, text};
use crate::expr::Expr;
use crate::noise::value_noise3;
use crate::point::Point3;

use super::{capped, clamp_count, nonzero, normalize, superformula2d};

/// Latitude/longitude lattice over the full sphere.
///
/// Rows run pole to pole; the seam column is not duplicated.
pub(super) fn uv_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            out.push(Point3::new(
                radius * sin_theta * phi.cos(),
                radius * cos_theta,
                radius * sin_theta * phi.sin(),
            ));
        }
    }
    capped(out, cap)
}

/// Fibonacci lattice: `N` points at golden-angle increments.
pub(super) fn fibo_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let phi_g = num(geo, "phi_g", 0.0);
    let denom = (count - 1).max(1) as f64;
    (0..count)
        .map(|i| {
            let z = 1.0 - 2.0 * i as f64 / denom;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let phi = i as f64 * phi_g;
            Point3::new(radius * r * phi.cos(), radius * z, radius * r * phi.sin())
        })
        .collect()
}

/// Vogel spiral mapped onto the sphere with a configurable angle step.
pub(super) fn vogel_sphere_spiral(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let radius = num(geo, "R", 1.0);
    let k = nonzero(num(geo, "vogel_k", 2.399_963_2), 2.399_963_2);
    (0..count)
        .map(|i| {
            let t = (i as f64 + 0.5) / count as f64;
            let theta = (1.0 - 2.0 * t).acos();
            let phi = (i as f64 * k).rem_euclid(2.0 * PI);
            let sin_theta = theta.sin();
            Point3::new(
                radius * sin_theta * phi.cos(),
                radius * theta.cos(),
                radius * sin_theta * phi.sin(),
            )
        })
        .collect()
}

fn sq_cos(angle: f64, exponent: f64) -> f64 {
    let e = exponent.max(1e-3);
    angle.cos().abs().powf(2.0 / e).copysign(angle.cos())
}

fn sq_sin(angle: f64, exponent: f64) -> f64 {
    let e = exponent.max(1e-3);
    angle.sin().abs().powf(2.0 / e).copysign(angle.sin())
}

pub(super) fn superquadric(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let eps1 = nonzero(num(geo, "eps1", 1.0), 1.0);
    let eps2 = nonzero(num(geo, "eps2", 1.0), 1.0);
    let ax = nonzero(num(geo, "ax", 1.0), 1.0);
    let ay = nonzero(num(geo, "ay", 1.0), 1.0);
    let az = nonzero(num(geo, "az", 1.0), 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = -0.5 * PI + PI * i as f64 / (lat_steps - 1).max(1) as f64;
        let cv = sq_cos(v, eps1);
        let sv = sq_sin(v, eps1);
        for j in 0..lon_steps {
            let u = -PI + 2.0 * PI * j as f64 / lon_steps as f64;
            out.push(Point3::new(
                radius * ax * cv * sq_cos(u, eps2),
                radius * ay * cv * sq_sin(u, eps2),
                radius * az * sv,
            ));
        }
    }
    capped(out, cap)
}

pub(super) fn superellipsoid(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let ax = nonzero(num(geo, "ax", 1.0), 1.0);
    let ay = nonzero(num(geo, "ay", 1.0), 1.0);
    let az = nonzero(num(geo, "az", 1.0), 1.0);
    let n1 = nonzero(num(geo, "se_n1", 1.0), 1.0);
    let n2 = nonzero(num(geo, "se_n2", 1.0), 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = -0.5 * PI + PI * i as f64 / (lat_steps - 1).max(1) as f64;
        let (sv, cv) = v.sin_cos();
        for j in 0..lon_steps {
            let u = -PI + 2.0 * PI * j as f64 / lon_steps as f64;
            let (su, cu) = u.sin_cos();
            let pow = |base: f64, n: f64| base.abs().powf(2.0 / n.max(1e-3)).copysign(base);
            out.push(Point3::new(
                radius * ax * pow(cv, n1) * pow(cu, n2),
                radius * ay * pow(cv, n1) * pow(su, n2),
                radius * az * pow(sv, n1),
            ));
        }
    }
    capped(out, cap)
}

/// Upper hemisphere, with the vertical axis squashed by `half_height`.
pub(super) fn half_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let height = nonzero(num(geo, "half_height", 1.0), 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64 * 0.5 * PI;
        let (sin_theta, cos_theta) = v.sin_cos();
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            out.push(Point3::new(
                radius * sin_theta * phi.cos(),
                radius * cos_theta * height,
                radius * sin_theta * phi.sin(),
            ));
        }
    }
    capped(out, cap)
}

/// Sphere displaced by three octaves of value noise.
pub(super) fn noisy_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let amp = num(geo, "noisy_amp", 0.1);
    let freq = nonzero(num(geo, "noisy_freq", 1.0), 1.0);
    let gain = nonzero(num(geo, "noisy_gain", 1.0), 1.0);
    let omega = num(geo, "noisy_omega", 0.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            let nx = sin_theta * phi.cos();
            let ny = cos_theta;
            let nz = sin_theta * phi.sin();
            let mut n = 0.0;
            let mut frequency = freq;
            let mut amplitude = 1.0;
            for _ in 0..3 {
                n += value_noise3(
                    nx * frequency + omega,
                    ny * frequency,
                    nz * frequency - omega,
                ) * amplitude;
                amplitude *= gain;
                frequency *= 2.0;
            }
            let offset = 1.0 + amp * (n - 0.5);
            out.push(Point3::new(
                radius * nx * offset,
                radius * ny * offset,
                radius * nz * offset,
            ));
        }
    }
    capped(out, cap)
}

/// `l,m,amp` triples separated by semicolons.
fn parse_spherical_terms(source: &str) -> Vec<(i64, i64, f64)> {
    let cleaned = source.replace('\r', "");
    let mut terms = Vec::new();
    for token in cleaned.split(';') {
        if token.trim().is_empty() {
            continue;
        }
        let parts: Vec<f64> = token
            .replace(',', " ")
            .split_whitespace()
            .filter_map(|p| p.parse().ok())
            .collect();
        if parts.len() < 3 {
            continue;
        }
        terms.push(((parts[0] as i64).max(0), parts[1] as i64, parts[2]));
    }
    terms
}

fn associated_legendre(l: i64, m: i64, x: f64) -> f64 {
    let m_abs = m.abs();
    let mut pmm = 1.0;
    if m_abs > 0 {
        let somx2 = (1.0 - x * x).max(0.0).sqrt();
        let mut fact = 1.0;
        for _ in 1..=m_abs {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m_abs {
        return pmm;
    }
    let mut pmmp1 = x * (2 * m_abs + 1) as f64 * pmm;
    if l == m_abs + 1 {
        return pmmp1;
    }
    let mut pll = 0.0;
    for n in (m_abs + 2)..=l {
        pll = ((2 * n - 1) as f64 * x * pmmp1 - (n + m_abs - 1) as f64 * pmm)
            / (n - m_abs) as f64;
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

fn factorial(n: i64) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

fn real_spherical_harmonic(l: i64, m: i64, theta: f64, phi: f64) -> f64 {
    let m_abs = m.abs();
    let norm = (((2 * l + 1) as f64 / (4.0 * PI))
        * (factorial(l - m_abs) / factorial(l + m_abs).max(1.0)))
    .sqrt();
    let p_lm = associated_legendre(l, m_abs, theta.cos());
    if m == 0 {
        return norm * p_lm;
    }
    let factor = 2f64.sqrt() * norm;
    if m > 0 {
        factor * p_lm * (m as f64 * phi).cos()
    } else {
        factor * p_lm * (m_abs as f64 * phi).sin()
    }
}

/// Sphere displaced by a sum of real spherical harmonics.
///
/// ### Parameters
/// - `sph_terms`: `l,m,amp` triples separated by semicolons.
pub(super) fn spherical_harmonics(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let terms = parse_spherical_terms(text(geo, "sph_terms", ""));
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            let mut amp = 1.0;
            for &(l, m, coeff) in &terms {
                amp += coeff * real_spherical_harmonic(l, m, theta, phi);
            }
            let amp = amp.max(0.1);
            out.push(Point3::new(
                radius * amp * sin_theta * phi.cos(),
                radius * amp * cos_theta,
                radius * amp * sin_theta * phi.sin(),
            ));
        }
    }
    capped(out, cap)
}

/// Spiral sphere whose radius is modulated by a `weight_map` expression of
/// `theta` and `phi`. A zero weight falls back to 1, and everything is
/// floored at 0.05 to keep the shape visible.
pub(super) fn weighted_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let count = clamp_count(int(geo, "N", 0).max(1) as usize, cap);
    let weight_expr = Expr::parse(text(geo, "weight_map", "")).ok();
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let u = (i as f64 + 0.5) / count as f64;
        let theta = (1.0 - 2.0 * u).acos();
        let phi = (i as f64 * 2.399_963_2).rem_euclid(2.0 * PI);
        let weight = match &weight_expr {
            Some(expr) => expr
                .eval(&[("theta", theta), ("phi", phi)])
                .unwrap_or(0.0),
            None => 1.0,
        };
        let weight = nonzero(weight, 1.0).max(0.05);
        let sin_theta = theta.sin();
        out.push(Point3::new(
            radius * weight * sin_theta * phi.cos(),
            radius * weight * theta.cos(),
            radius * weight * sin_theta * phi.sin(),
        ));
    }
    out
}

/// Sphere displaced by a single octave of value noise.
pub(super) fn blob(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let amp = nonzero(num(geo, "blob_noise_amp", 0.2), 0.2);
    let scale = nonzero(num(geo, "blob_noise_scale", 1.0), 1.0);
    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI;
            let nx = sin_theta * phi.cos();
            let ny = cos_theta;
            let nz = sin_theta * phi.sin();
            let n = value_noise3(nx * scale, ny * scale, nz * scale);
            let offset = 1.0 + amp * (n - 0.5);
            out.push(Point3::new(
                radius * nx * offset,
                radius * ny * offset,
                radius * nz * offset,
            ));
        }
    }
    capped(out, cap)
}

/// Gielis superformula extended to 3D via two angular products.
pub(super) fn superformula_3d(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let lat_steps = int(geo, "lat", 0).max(2) as usize;
    let lon_steps = int(geo, "lon", 0).max(3) as usize;
    let m1 = num(geo, "sf3_m1", 0.0);
    let m2 = num(geo, "sf3_m2", 0.0);
    let m3 = num(geo, "sf3_m3", 0.0);
    let n1 = nonzero(num(geo, "sf3_n1", 0.5), 0.5);
    let n2 = nonzero(num(geo, "sf3_n2", 0.5), 0.5);
    let n3 = nonzero(num(geo, "sf3_n3", 0.5), 0.5);
    let a = nonzero(num(geo, "sf3_a", 1.0), 1.0);
    let b = nonzero(num(geo, "sf3_b", 1.0), 1.0);
    let scale = nonzero(num(geo, "sf3_scale", 1.0), 1.0);

    let sf = |angle: f64, m: f64| superformula2d(angle, m, a, b, n1, n2, n3);

    let mut out = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let v = i as f64 / (lat_steps - 1).max(1) as f64;
        let theta = v * PI - PI / 2.0;
        let r2 = sf(theta, m2);
        for j in 0..lon_steps {
            let phi = j as f64 / lon_steps as f64 * 2.0 * PI - PI;
            let r1 = sf(phi, m1);
            let r3 = sf(phi, m3);
            out.push(Point3::new(
                scale * radius * r1 * r2 * theta.cos() * phi.cos(),
                scale * radius * r1 * r2 * theta.sin(),
                scale * radius * r3 * theta.cos() * phi.sin(),
            ));
        }
    }
    capped(out, cap)
}

/// Random great circles traced as closed streamlines on the sphere.
pub(super) fn lic_sphere(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let line_count = int(geo, "lic_N", 1).max(1) as usize;
    let steps = int(geo, "lic_steps", 0).max(4) as usize;
    let mut out = Vec::with_capacity(line_count * steps);
    for _ in 0..line_count {
        let theta = rng.random::<f64>() * PI;
        let phi = rng.random::<f64>() * 2.0 * PI;
        let normal = (
            theta.sin() * phi.cos(),
            theta.cos(),
            theta.sin() * phi.sin(),
        );
        let mut reference = (0.0, 1.0, 0.0);
        if (normal.0 * reference.0 + normal.1 * reference.1 + normal.2 * reference.2).abs() > 0.9 {
            reference = (1.0, 0.0, 0.0);
        }
        let u = normalize((
            normal.1 * reference.2 - normal.2 * reference.1,
            normal.2 * reference.0 - normal.0 * reference.2,
            normal.0 * reference.1 - normal.1 * reference.0,
        ));
        let v = (
            normal.1 * u.2 - normal.2 * u.1,
            normal.2 * u.0 - normal.0 * u.2,
            normal.0 * u.1 - normal.1 * u.0,
        );
        for j in 0..steps {
            let angle = 2.0 * PI * j as f64 / steps as f64;
            let (sin_a, cos_a) = angle.sin_cos();
            out.push(Point3::new(
                (u.0 * cos_a + v.0 * sin_a) * radius,
                (u.1 * cos_a + v.1 * sin_a) * radius,
                (u.2 * cos_a + v.2 * sin_a) * radius,
            ));
        }
    }
    capped(out, cap)
}
