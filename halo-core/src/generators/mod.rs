//! Built-in topology generators.
//!
//! Each generator turns the geometry section of the state document into a
//! list of base points. Generators are pure except for the ones that
//! sample randomly; those draw from the caller's RNG so tests can seed
//! them. A `cap` of zero means unlimited; a positive cap truncates the
//! output, mirroring the `Nmax` system limit.
//!
//! The dispatch table at the bottom maps every public topology name
//! (including legacy aliases) to its function.

mod curves;
mod disks;
mod implicit;
mod polyhedra;
mod spheres;
mod tori;

use rand::RngCore;
use serde_json::Value;

use crate::point::Point3;

pub use polyhedra::{parse_polyhedron_json, subdivide_geodesic};

/// Signature shared by every builtin generator.
pub type GeneratorFn = fn(geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3>;

/// Golden ratio, used by the icosahedron family.
pub(crate) const PHI: f64 = 1.618_033_988_749_895;

#[inline]
pub(crate) fn clamp_count(value: usize, cap: usize) -> usize {
    if cap > 0 { value.min(cap) } else { value }
}

/// Truncates the output to the cap, in place, and returns it.
pub(crate) fn capped(mut points: Vec<Point3>, cap: usize) -> Vec<Point3> {
    points.truncate(clamp_count(points.len(), cap));
    points
}

/// Whitespace/semicolon separated floats; non-numeric tokens are skipped.
pub(crate) fn parse_number_list(text: &str) -> Vec<f64> {
    text.replace(['\n', ';'], " ")
        .split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// Semicolon separated `x,y,z` triples; short entries are zero padded.
pub(crate) fn parse_vector_list(text: &str) -> Vec<(f64, f64, f64)> {
    let cleaned = text.replace('\r', "");
    let tokens: Vec<&str> = cleaned.split(';').map(str::trim).collect();
    if tokens.iter().all(|t| t.is_empty()) {
        let flat = parse_number_list(text);
        if flat.len() >= 3 {
            return vec![(flat[0], flat[1], flat[2])];
        }
        return Vec::new();
    }
    let mut vectors = Vec::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let mut values: Vec<f64> = token
            .replace(',', " ")
            .split_whitespace()
            .filter_map(|part| part.parse().ok())
            .collect();
        if values.is_empty() {
            continue;
        }
        while values.len() < 3 {
            values.push(0.0);
        }
        vectors.push((values[0], values[1], values[2]));
    }
    vectors
}

/// `xmin xmax ymin ymax` (whitespace or semicolon separated, same token
/// rules as [`parse_number_list`]); anything shorter falls back to the
/// unit box.
pub(crate) fn parse_bbox(text: &str) -> (f64, f64, f64, f64) {
    let values = parse_number_list(text);
    if values.len() >= 4 {
        (values[0], values[1], values[2], values[3])
    } else {
        (-1.0, 1.0, -1.0, 1.0)
    }
}

pub(crate) fn normalize(v: (f64, f64, f64)) -> (f64, f64, f64) {
    let len = {
        let l = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
        if l == 0.0 { 1.0 } else { l }
    };
    (v.0 / len, v.1 / len, v.2 / len)
}

pub(crate) fn vscale(v: (f64, f64, f64), s: f64) -> (f64, f64, f64) {
    (v.0 * s, v.1 * s, v.2 * s)
}

pub(crate) fn mix(
    a: (f64, f64, f64),
    b: (f64, f64, f64),
    t: f64,
) -> (f64, f64, f64) {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Projects the vectors onto the sphere of `radius`, drops duplicates at 6
/// decimal precision and caps the result. Seeds follow input order.
pub(crate) fn unique_points(
    vectors: &[(f64, f64, f64)],
    radius: f64,
    cap: usize,
) -> Vec<Point3> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (idx, &v) in vectors.iter().enumerate() {
        let len = {
            let l = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
            if l == 0.0 { 1.0 } else { l }
        };
        let scaled = (radius * v.0 / len, radius * v.1 / len, radius * v.2 / len);
        if !seen.insert(round_key(scaled)) {
            continue;
        }
        out.push(Point3::with_seed(scaled.0, scaled.1, scaled.2, idx as i64));
        if cap > 0 && out.len() >= cap {
            break;
        }
    }
    out
}

/// Dedup key at 6 decimal places.
pub(crate) fn round_key(v: (f64, f64, f64)) -> (i64, i64, i64) {
    const SCALE: f64 = 1e6;
    (
        (v.0 * SCALE).round() as i64,
        (v.1 * SCALE).round() as i64,
        (v.2 * SCALE).round() as i64,
    )
}

/// Zero-tolerant parameter read: zero falls back like a missing value.
#[inline]
pub(crate) fn nonzero(value: f64, fallback: f64) -> f64 {
    if value == 0.0 { fallback } else { value }
}

/// 2D superformula radius for angle `theta`.
pub(crate) fn superformula2d(
    theta: f64,
    m: f64,
    a: f64,
    b: f64,
    n1: f64,
    n2: f64,
    n3: f64,
) -> f64 {
    let a = if a == 0.0 { 1.0 } else { a };
    let b = if b == 0.0 { 1.0 } else { b };
    let part1 = ((m * theta / 4.0).cos() / a).abs().powf(n2);
    let part2 = ((m * theta / 4.0).sin() / b).abs().powf(n3);
    (part1 + part2).powf(-1.0 / n1.max(1e-6))
}

/// Looks up a builtin generator by its public topology name.
pub fn builtin(name: &str) -> Option<GeneratorFn> {
    let f: GeneratorFn = match name {
        "uv_sphere" => spheres::uv_sphere,
        "fibo_sphere" => spheres::fibo_sphere,
        "vogel_sphere_spiral" => spheres::vogel_sphere_spiral,
        "superquadric" => spheres::superquadric,
        "superellipsoid" => spheres::superellipsoid,
        "half_sphere" => spheres::half_sphere,
        "noisy_sphere" => spheres::noisy_sphere,
        "spherical_harmonics" => spheres::spherical_harmonics,
        "weighted_sphere" => spheres::weighted_sphere,
        "blob" => spheres::blob,
        "superformula_3D" => spheres::superformula_3d,
        "line_integral_convolution_sphere" => spheres::lic_sphere,
        "disk_phyllo" | "disk_phyllotaxis" => disks::disk_phyllo,
        "archimede_spiral" => disks::archimede_spiral,
        "log_spiral" => disks::log_spiral,
        "rose_curve" => disks::rose_curve,
        "superformula_2d" | "superformula_2D" => disks::superformula_2d,
        "density_warp" | "density_warp_disk" => disks::density_warp,
        "poisson_disk" => disks::poisson_disk,
        "lissajous_disk" => disks::lissajous_disk,
        "concentric_rings" => disks::concentric_rings,
        "hex_packing_plane" => disks::hex_packing_plane,
        "voronoi_seeds" => disks::voronoi_seeds,
        "torus" => tori::torus,
        "double_torus" => tori::double_torus,
        "horn_torus" => tori::horn_torus,
        "spindle_torus" => tori::spindle_torus,
        "torus_knot" => tori::torus_knot,
        "strip_twist" => tori::strip_twist,
        "klein_bottle" => tori::klein_bottle,
        "mobius" => tori::mobius,
        "stream_on_torus" => tori::stream_on_torus,
        "helix" => curves::helix,
        "viviani_curve" => curves::viviani_curve,
        "lissajous3d" | "lissajous3D" => curves::lissajous3d,
        "random_geometric_graph" => curves::random_geometric_graph,
        "geodesic_sphere" => polyhedra::geodesic_sphere,
        "geodesic" => polyhedra::geodesic,
        "geodesic_graph" => polyhedra::geodesic_graph,
        "tetrahedron" => polyhedra::tetrahedron,
        "cube" => polyhedra::cube,
        "octahedron" => polyhedra::octahedron,
        "dodecahedron" => polyhedra::dodecahedron,
        "icosahedron" => polyhedra::icosahedron,
        "polyhedron" => polyhedra::custom_polyhedron,
        "truncated_icosa" => polyhedra::truncated_icosa,
        "stellated_icosa" => polyhedra::stellated_icosa,
        "gyroid" => implicit::gyroid,
        "schwarz_P" => implicit::schwarz_p,
        "schwarz_D" => implicit::schwarz_d,
        "heart_implicit" => implicit::heart,
        "metaballs" => implicit::metaballs,
        "distance_field_shape" => implicit::distance_field_shape,
        _ => return None,
    };
    Some(f)
}

/// Canonical topology names, aliases excluded, in display order.
pub fn builtin_names() -> &'static [&'static str] {
    &[
        "uv_sphere",
        "fibo_sphere",
        "vogel_sphere_spiral",
        "superquadric",
        "superellipsoid",
        "half_sphere",
        "noisy_sphere",
        "spherical_harmonics",
        "weighted_sphere",
        "blob",
        "superformula_3D",
        "line_integral_convolution_sphere",
        "disk_phyllo",
        "archimede_spiral",
        "log_spiral",
        "rose_curve",
        "superformula_2d",
        "density_warp",
        "poisson_disk",
        "lissajous_disk",
        "concentric_rings",
        "hex_packing_plane",
        "voronoi_seeds",
        "torus",
        "double_torus",
        "horn_torus",
        "spindle_torus",
        "torus_knot",
        "strip_twist",
        "klein_bottle",
        "mobius",
        "stream_on_torus",
        "helix",
        "viviani_curve",
        "lissajous3d",
        "random_geometric_graph",
        "geodesic_sphere",
        "geodesic",
        "geodesic_graph",
        "tetrahedron",
        "cube",
        "octahedron",
        "dodecahedron",
        "icosahedron",
        "polyhedron",
        "truncated_icosa",
        "stellated_icosa",
        "gyroid",
        "schwarz_P",
        "schwarz_D",
        "heart_implicit",
        "metaballs",
        "distance_field_shape",
    ]
}
