//! Scalar helpers shared by the whole engine: clamping, smoothstep, a
//! lattice value noise and the stable hash-to-unit-interval draw.
//!
//! The stable draw is deliberately *not* a stateful RNG: masking and phase
//! decisions must return the same value for the same point seed on every
//! frame, otherwise borderline points flicker.

#[inline]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[inline]
pub fn to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

/// Cubic Hermite transition from 0 at `edge0` to 1 at `edge1`.
///
/// Degenerate edges (`edge0 == edge1`) collapse to a step function.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp01((x - edge0) / (edge1 - edge0).max(1e-6));
    t * t * (3.0 - 2.0 * t)
}

/// Deterministic pseudo-random draw in `[0, 1)` keyed by an integer seed.
///
/// Same `(seed, salt)` always yields the same value. The sine-fract
/// construction is the classic shader hash; it keeps mask decisions stable
/// frame to frame without any RNG state.
pub fn hash01(seed: i64, salt: i64) -> f64 {
    let s = seed as f64 * 12.9898 + salt as f64 * 78.233;
    let x = s.sin() * 43758.5453;
    x - x.floor()
}

fn lattice_hash(ix: i64, iy: i64, iz: i64) -> f64 {
    let n = ix
        .wrapping_mul(15731)
        .wrapping_add(iy.wrapping_mul(789_221))
        .wrapping_add(iz.wrapping_mul(1_376_312_589));
    let n = (n << 13) ^ n;
    let m = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589)
        & 0x7FFF_FFFF;
    (1.0 - m as f64 / 1_073_741_824.0) * 0.5 + 0.5
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Trilinear value noise over an integer lattice, output in `[0, 1]`.
pub fn value_noise3(x: f64, y: f64, z: f64) -> f64 {
    let (xi, yi, zi) = (x.floor(), y.floor(), z.floor());
    let (xf, yf, zf) = (x - xi, y - yi, z - zi);
    let (ix, iy, iz) = (xi as i64, yi as i64, zi as i64);

    let c000 = lattice_hash(ix, iy, iz);
    let c100 = lattice_hash(ix + 1, iy, iz);
    let c010 = lattice_hash(ix, iy + 1, iz);
    let c110 = lattice_hash(ix + 1, iy + 1, iz);
    let c001 = lattice_hash(ix, iy, iz + 1);
    let c101 = lattice_hash(ix + 1, iy, iz + 1);
    let c011 = lattice_hash(ix, iy + 1, iz + 1);
    let c111 = lattice_hash(ix + 1, iy + 1, iz + 1);

    let u = smooth(xf);
    let v = smooth(yf);
    let w = smooth(zf);

    let x00 = lerp(c000, c100, u);
    let x10 = lerp(c010, c110, u);
    let x01 = lerp(c001, c101, u);
    let x11 = lerp(c011, c111, u);
    let y0 = lerp(x00, x10, v);
    let y1 = lerp(x01, x11, v);
    lerp(y0, y1, w)
}

/// Polar angle (from +Y) and wrapped azimuth of a cartesian position.
pub fn spherical_from_cartesian(x: f64, y: f64, z: f64) -> (f64, f64) {
    let r = (x * x + y * y + z * z).sqrt();
    let r = if r == 0.0 { 1.0 } else { r };
    let theta = (y / r).clamp(-1.0, 1.0).acos();
    let phi = z.atan2(x).rem_euclid(2.0 * std::f64::consts::PI);
    (theta, phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_is_monotone_between_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        let mid = smoothstep(0.0, 1.0, 0.5);
        assert!(mid > 0.49 && mid < 0.51);
        // Equal edges degrade to a step.
        assert_eq!(smoothstep(0.3, 0.3, 0.2), 0.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.4), 1.0);
    }

    #[test]
    fn hash01_is_stable_and_in_unit_interval() {
        for seed in 0..500 {
            let a = hash01(seed, 7);
            let b = hash01(seed, 7);
            assert_eq!(a, b, "same seed must give the same draw");
            assert!((0.0..1.0).contains(&a));
        }
        // Different salts decorrelate the draws.
        assert_ne!(hash01(3, 0), hash01(3, 77));
    }

    #[test]
    fn value_noise_stays_in_unit_interval() {
        for i in 0..200 {
            let t = i as f64 * 0.37;
            let n = value_noise3(t, t * 1.7 - 3.0, -t * 0.9);
            assert!((0.0..=1.0).contains(&n), "noise {n} out of range");
        }
    }

    #[test]
    fn spherical_angles_cover_poles_and_equator() {
        let (theta, _) = spherical_from_cartesian(0.0, 1.0, 0.0);
        assert!(theta.abs() < 1e-9);
        let (theta, _) = spherical_from_cartesian(0.0, -1.0, 0.0);
        assert!((theta - std::f64::consts::PI).abs() < 1e-9);
        let (theta, phi) = spherical_from_cartesian(1.0, 0.0, 0.0);
        assert!((theta - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!(phi.abs() < 1e-9);
    }
}
