//! Density weighting and spherical masks.
//!
//! Both produce a survival weight in `[0, 1]` for a point. The final keep
//! decision compares the combined weight against the point's stable hash
//! draw, so a point either survives or not consistently across frames as
//! long as the weights do not change.

use std::f64::consts::PI;

use serde_json::Value;

use crate::config::{boolean, num, text};
use crate::noise::{clamp01, hash01, smoothstep, spherical_from_cartesian, to_rad, value_noise3};
use crate::point::Point3;

/// Radial/noise density weight for the configured `densityMode`.
///
/// `uniform` and unknown modes weigh 1. `centered` concentrates points near
/// the origin with a Gaussian falloff, `edges` favors the shell, and
/// `noise_field` thins the cloud by a fixed-offset value noise.
pub fn density_weight(distribution: &Value, point: &Point3, radius: f64) -> f64 {
    let mode = text(distribution, "densityMode", "uniform");
    let r_norm = point.length() / radius.max(1e-6);
    match mode {
        "centered" => (-3.0 * r_norm * r_norm).exp(),
        "edges" => clamp01(r_norm.powf(0.75)),
        "noise_field" => clamp01(value_noise3(
            point.x * 1.6 + 11.1,
            point.y * 1.6 + 22.2,
            point.z * 1.6 + 33.3,
        )),
        _ => 1.0,
    }
}

/// Angular mask weight in `[0, 1]` for the mask section settings.
///
/// Masks carve regions out of the unit sphere of directions: polar caps, an
/// equatorial band, or a longitudinal wedge, each with a smoothstep soft
/// edge of `softDeg` degrees. `invert` flips the kept region.
pub fn mask_weight(mask: &Value, point: &Point3) -> f64 {
    if !boolean(mask, "enabled", false) {
        return 1.0;
    }
    let mode = text(mask, "mode", "none");
    if mode == "none" {
        return 1.0;
    }
    let (theta, phi) = spherical_from_cartesian(point.x, point.y, point.z);
    let soft = to_rad(num(mask, "softDeg", 0.0));
    let mut weight = match mode {
        "north_cap" => {
            let cutoff = to_rad(num(mask, "angleDeg", 30.0));
            1.0 - smoothstep(cutoff, cutoff + soft, theta)
        }
        "south_cap" => {
            let cutoff = to_rad(num(mask, "angleDeg", 30.0));
            1.0 - smoothstep(cutoff, cutoff + soft, PI - theta)
        }
        "equatorial_band" => {
            let half = to_rad(num(mask, "bandHalfDeg", 20.0));
            let diff = (theta - PI / 2.0).abs();
            1.0 - smoothstep(half, half + soft, diff)
        }
        "longitudinal_band" => {
            let center = to_rad(num(mask, "lonCenterDeg", 0.0));
            let width = to_rad(num(mask, "lonWidthDeg", 30.0));
            // Wrapped angular distance to the band center.
            let diff = ((phi - center + PI).rem_euclid(2.0 * PI) - PI).abs();
            1.0 - smoothstep(width / 2.0, width / 2.0 + soft, diff)
        }
        _ => 1.0,
    };
    if boolean(mask, "invert", false) {
        weight = 1.0 - weight;
    }
    clamp01(weight)
}

/// Full survival decision for one animated point.
///
/// The density and mask weights multiply; a fractional weight is resolved
/// by the point's stable draw (`seed + 1` salt 0), never by a stateful RNG,
/// so borderline points do not flicker between frames.
pub fn keep_point(
    distribution: &Value,
    mask: &Value,
    point: &Point3,
    seed: i64,
    radius: f64,
) -> bool {
    let mut weight = density_weight(distribution, point, radius);
    weight *= mask_weight(mask, point);
    let weight = clamp01(weight);
    if weight <= 0.0 {
        return false;
    }
    if weight >= 1.0 {
        return true;
    }
    hash01(seed + 1, 0) <= weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn north_pole() -> Point3 {
        Point3::new(0.0, 1.0, 0.0)
    }

    fn south_pole() -> Point3 {
        Point3::new(0.0, -1.0, 0.0)
    }

    fn equator() -> Point3 {
        Point3::new(1.0, 0.0, 0.0)
    }

    #[test]
    fn disabled_mask_keeps_everything() {
        let mask = json!({"enabled": false, "mode": "north_cap", "angleDeg": 90});
        assert_eq!(mask_weight(&mask, &north_pole()), 1.0);
        let mask = json!({"enabled": true, "mode": "none"});
        assert_eq!(mask_weight(&mask, &north_pole()), 1.0);
    }

    #[test]
    fn north_cap_keeps_pole_and_drops_equator() {
        let mask = json!({
            "enabled": true, "mode": "north_cap",
            "angleDeg": 30, "softDeg": 0, "invert": false,
        });
        assert_eq!(mask_weight(&mask, &north_pole()), 1.0);
        assert_eq!(mask_weight(&mask, &equator()), 0.0);
        assert_eq!(mask_weight(&mask, &south_pole()), 0.0);
    }

    #[test]
    fn south_cap_mirrors_north_cap() {
        let mask = json!({
            "enabled": true, "mode": "south_cap",
            "angleDeg": 30, "softDeg": 0,
        });
        assert_eq!(mask_weight(&mask, &south_pole()), 1.0);
        assert_eq!(mask_weight(&mask, &north_pole()), 0.0);
    }

    #[test]
    fn equatorial_band_keeps_equator_only() {
        let mask = json!({
            "enabled": true, "mode": "equatorial_band",
            "bandHalfDeg": 20, "softDeg": 0,
        });
        assert_eq!(mask_weight(&mask, &equator()), 1.0);
        assert_eq!(mask_weight(&mask, &north_pole()), 0.0);
    }

    #[test]
    fn longitudinal_band_wraps_around_the_seam() {
        let mask = json!({
            "enabled": true, "mode": "longitudinal_band",
            "lonCenterDeg": 0, "lonWidthDeg": 40, "softDeg": 0,
        });
        // phi = 0 sits at the band center.
        assert_eq!(mask_weight(&mask, &Point3::new(1.0, 0.0, 0.0)), 1.0);
        // phi slightly below 2*pi is 1 degree away from center, not 359.
        let phi = (-1.0f64).to_radians();
        let p = Point3::new(phi.cos(), 0.0, phi.sin());
        assert_eq!(mask_weight(&mask, &p), 1.0);
        // phi = pi is on the far side.
        assert_eq!(mask_weight(&mask, &Point3::new(-1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn invert_flips_the_kept_region() {
        let mask = json!({
            "enabled": true, "mode": "north_cap",
            "angleDeg": 30, "softDeg": 0, "invert": true,
        });
        assert_eq!(mask_weight(&mask, &north_pole()), 0.0);
        assert_eq!(mask_weight(&mask, &equator()), 1.0);
    }

    #[test]
    fn soft_edge_produces_intermediate_weights() {
        let mask = json!({
            "enabled": true, "mode": "north_cap",
            "angleDeg": 30, "softDeg": 30,
        });
        // 45 degrees from the pole falls inside the soft transition.
        let theta = 45.0f64.to_radians();
        let p = Point3::new(theta.sin(), theta.cos(), 0.0);
        let w = mask_weight(&mask, &p);
        assert!(w > 0.0 && w < 1.0, "weight {w} should be in the soft edge");
    }

    #[test]
    fn density_modes_weigh_center_and_edges() {
        let dist_centered = json!({"densityMode": "centered"});
        let dist_edges = json!({"densityMode": "edges"});
        let near = Point3::new(0.05, 0.0, 0.0);
        let far = Point3::new(0.95, 0.0, 0.0);
        assert!(
            density_weight(&dist_centered, &near, 1.0)
                > density_weight(&dist_centered, &far, 1.0)
        );
        assert!(density_weight(&dist_edges, &far, 1.0) > density_weight(&dist_edges, &near, 1.0));
        let dist_uniform = json!({"densityMode": "uniform"});
        assert_eq!(density_weight(&dist_uniform, &far, 1.0), 1.0);
    }

    #[test]
    fn keep_decision_is_stable_across_calls() {
        let dist = json!({"densityMode": "centered"});
        let mask = json!({"enabled": false});
        let p = Point3::new(0.6, 0.1, 0.2);
        for seed in 0..100 {
            let first = keep_point(&dist, &mask, &p, seed, 1.0);
            let second = keep_point(&dist, &mask, &p, seed, 1.0);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn zero_weight_always_drops() {
        let dist = json!({"densityMode": "uniform"});
        let mask = json!({
            "enabled": true, "mode": "north_cap",
            "angleDeg": 10, "softDeg": 0,
        });
        for seed in 0..50 {
            assert!(!keep_point(&dist, &mask, &equator(), seed, 1.0));
        }
    }
}
