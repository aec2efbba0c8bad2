//! Platonic solids, geodesic subdivisions of the icosahedron and custom
//! polyhedra loaded from JSON vertex/face data.
//!
//! Solid generators share one expansion routine: optional inner shells
//! (`poly_layers`) and interpolated edge samples (`poly_link_steps`), with
//! exact-duplicate vertices dropped at 6 decimal precision.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::RngCore;
use serde_json::Value;

use crate::config::{int, num, text};
use crate::point::Point3;

use super::{mix, normalize, round_key, unique_points, vscale, PHI};

type Vec3 = (f64, f64, f64);
type Face = Vec<usize>;

fn solid_data(name: &str) -> (Vec<Vec3>, Vec<Face>) {
    match name {
        "tetrahedron" => (
            vec![
                (1.0, 1.0, 1.0),
                (1.0, -1.0, -1.0),
                (-1.0, 1.0, -1.0),
                (-1.0, -1.0, 1.0),
            ],
            vec![vec![0, 1, 2], vec![0, 3, 1], vec![0, 2, 3], vec![1, 3, 2]],
        ),
        "cube" => (
            vec![
                (-1.0, -1.0, -1.0),
                (1.0, -1.0, -1.0),
                (1.0, 1.0, -1.0),
                (-1.0, 1.0, -1.0),
                (-1.0, -1.0, 1.0),
                (1.0, -1.0, 1.0),
                (1.0, 1.0, 1.0),
                (-1.0, 1.0, 1.0),
            ],
            vec![
                vec![0, 1, 2, 3],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![2, 3, 7, 6],
                vec![1, 2, 6, 5],
                vec![3, 0, 4, 7],
            ],
        ),
        "octahedron" => (
            vec![
                (1.0, 0.0, 0.0),
                (-1.0, 0.0, 0.0),
                (0.0, 1.0, 0.0),
                (0.0, -1.0, 0.0),
                (0.0, 0.0, 1.0),
                (0.0, 0.0, -1.0),
            ],
            vec![
                vec![0, 2, 4],
                vec![2, 1, 4],
                vec![1, 3, 4],
                vec![3, 0, 4],
                vec![2, 0, 5],
                vec![1, 2, 5],
                vec![3, 1, 5],
                vec![0, 3, 5],
            ],
        ),
        "icosahedron" => (
            vec![
                (-1.0, PHI, 0.0),
                (1.0, PHI, 0.0),
                (-1.0, -PHI, 0.0),
                (1.0, -PHI, 0.0),
                (0.0, -1.0, PHI),
                (0.0, 1.0, PHI),
                (0.0, -1.0, -PHI),
                (0.0, 1.0, -PHI),
                (PHI, 0.0, -1.0),
                (PHI, 0.0, 1.0),
                (-PHI, 0.0, -1.0),
                (-PHI, 0.0, 1.0),
            ],
            vec![
                vec![0, 11, 5],
                vec![0, 5, 1],
                vec![0, 1, 7],
                vec![0, 7, 10],
                vec![0, 10, 11],
                vec![1, 5, 9],
                vec![5, 11, 4],
                vec![11, 10, 2],
                vec![10, 7, 6],
                vec![7, 1, 8],
                vec![3, 9, 4],
                vec![3, 4, 2],
                vec![3, 2, 6],
                vec![3, 6, 8],
                vec![3, 8, 9],
                vec![4, 9, 5],
                vec![2, 4, 11],
                vec![6, 2, 10],
                vec![8, 6, 7],
                vec![9, 8, 1],
            ],
        ),
        "dodecahedron" => {
            let inv = 1.0 / PHI;
            (
                vec![
                    (-1.0, -1.0, -1.0),
                    (-1.0, -1.0, 1.0),
                    (-1.0, 1.0, -1.0),
                    (-1.0, 1.0, 1.0),
                    (1.0, -1.0, -1.0),
                    (1.0, -1.0, 1.0),
                    (1.0, 1.0, -1.0),
                    (1.0, 1.0, 1.0),
                    (0.0, -inv, -PHI),
                    (0.0, -inv, PHI),
                    (0.0, inv, -PHI),
                    (0.0, inv, PHI),
                    (-inv, -PHI, 0.0),
                    (-inv, PHI, 0.0),
                    (inv, -PHI, 0.0),
                    (inv, PHI, 0.0),
                    (-PHI, 0.0, -inv),
                    (PHI, 0.0, -inv),
                    (-PHI, 0.0, inv),
                    (PHI, 0.0, inv),
                ],
                vec![
                    vec![0, 8, 10, 2, 16],
                    vec![0, 12, 14, 4, 8],
                    vec![0, 16, 18, 1, 12],
                    vec![1, 9, 11, 3, 13],
                    vec![1, 18, 19, 5, 9],
                    vec![2, 10, 6, 17, 16],
                    vec![2, 3, 11, 7, 6],
                    vec![3, 13, 15, 7, 11],
                    vec![4, 14, 15, 7, 6],
                    vec![4, 5, 19, 17, 8],
                    vec![5, 9, 11, 7, 15],
                    vec![6, 7, 15, 14, 10],
                ],
            )
        }
        _ => (Vec::new(), Vec::new()),
    }
}

/// Expands a vertex/face set into a point cloud: inner shells at fractional
/// scale, edge interpolation, then scale by `radius` with duplicates
/// dropped.
fn polyhedron_points(
    base_vertices: &[Vec3],
    faces: &[Face],
    radius: f64,
    layers: usize,
    link_steps: usize,
    cap: usize,
) -> Vec<Point3> {
    if base_vertices.is_empty() {
        return Vec::new();
    }
    let mut vectors: Vec<Vec3> = base_vertices.to_vec();
    let layers = layers.max(1);
    for layer in 1..layers {
        let scale = layer as f64 / layers as f64;
        vectors.extend(base_vertices.iter().map(|&v| vscale(v, scale)));
    }
    if link_steps > 0 && !faces.is_empty() {
        let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
        for face in faces {
            if face.len() < 2 {
                continue;
            }
            for i in 0..face.len() {
                let a = face[i];
                let b = face[(i + 1) % face.len()];
                edges.insert((a.min(b), a.max(b)));
            }
        }
        for (a, b) in edges {
            let (Some(&va), Some(&vb)) = (base_vertices.get(a), base_vertices.get(b)) else {
                continue;
            };
            for step in 1..=link_steps {
                let t = step as f64 / (link_steps + 1) as f64;
                vectors.push(mix(va, vb, t));
            }
        }
    }
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for (idx, v) in vectors.iter().enumerate() {
        let scaled = (radius * v.0, radius * v.1, radius * v.2);
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

/// Parses `{"vertices": [[x,y,z],...], "faces": [[i,j,k,...],...]}`.
///
/// Malformed entries are skipped; anything that is not an object with the
/// expected arrays yields empty lists.
pub fn parse_polyhedron_json(source: &str) -> (Vec<Vec3>, Vec<Face>) {
    let Ok(payload) = serde_json::from_str::<Value>(source) else {
        return (Vec::new(), Vec::new());
    };
    let mut vertices = Vec::new();
    if let Some(raw) = payload.get("vertices").and_then(Value::as_array) {
        for entry in raw {
            if let Some(coords) = entry.as_array() {
                let values: Vec<f64> = coords.iter().filter_map(Value::as_f64).collect();
                if values.len() >= 3 {
                    vertices.push((values[0], values[1], values[2]));
                }
            }
        }
    }
    let mut faces = Vec::new();
    if let Some(raw) = payload.get("faces").and_then(Value::as_array) {
        for face in raw {
            if let Some(indices) = face.as_array() {
                let clean: Face = indices
                    .iter()
                    .filter_map(Value::as_i64)
                    .map(|i| i.max(0) as usize)
                    .collect();
                if clean.len() >= 3 {
                    faces.push(clean);
                }
            }
        }
    }
    (vertices, faces)
}

/// Subdivides the unit icosahedron `level` times, splitting every triangle
/// into four. Midpoints are cached per edge so shared vertices are not
/// duplicated.
pub fn subdivide_geodesic(level: usize) -> (Vec<Vec3>, Vec<[usize; 3]>) {
    let (base, base_faces) = solid_data("icosahedron");
    let mut verts: Vec<Vec3> = base.iter().map(|&v| normalize(v)).collect();
    let mut tris: Vec<[usize; 3]> = base_faces
        .iter()
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    for _ in 0..level {
        let mut cache: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, verts: &mut Vec<Vec3>| -> usize {
            let key = (a.min(b), a.max(b));
            if let Some(&idx) = cache.get(&key) {
                return idx;
            }
            let va = verts[a];
            let vb = verts[b];
            let mid = normalize((
                (va.0 + vb.0) * 0.5,
                (va.1 + vb.1) * 0.5,
                (va.2 + vb.2) * 0.5,
            ));
            verts.push(mid);
            let idx = verts.len() - 1;
            cache.insert(key, idx);
            idx
        };
        let mut next = Vec::with_capacity(tris.len() * 4);
        for [a, b, c] in tris {
            let ab = midpoint(a, b, &mut verts);
            let bc = midpoint(b, c, &mut verts);
            let ca = midpoint(c, a, &mut verts);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        tris = next;
    }
    (verts, tris)
}

fn solid_generator(name: &'static str, geo: &Value, cap: usize) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let layers = int(geo, "poly_layers", 0).max(1) as usize;
    let link_steps = int(geo, "poly_link_steps", 0).max(0) as usize;
    let (vertices, faces) = solid_data(name);
    polyhedron_points(&vertices, &faces, radius, layers, link_steps, cap)
}

pub(super) fn tetrahedron(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    solid_generator("tetrahedron", geo, cap)
}

pub(super) fn cube(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    solid_generator("cube", geo, cap)
}

pub(super) fn octahedron(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    solid_generator("octahedron", geo, cap)
}

pub(super) fn dodecahedron(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    solid_generator("dodecahedron", geo, cap)
}

pub(super) fn icosahedron(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    solid_generator("icosahedron", geo, cap)
}

/// User-defined solid from the `polyhedron_data` JSON; falls back to the
/// cube when the payload has no usable vertices.
pub(super) fn custom_polyhedron(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let layers = int(geo, "poly_layers", 0).max(1) as usize;
    let link_steps = int(geo, "poly_link_steps", 0).max(0) as usize;
    let (mut vertices, mut faces) = parse_polyhedron_json(text(geo, "polyhedron_data", ""));
    if vertices.is_empty() {
        (vertices, faces) = solid_data("cube");
    }
    polyhedron_points(&vertices, &faces, radius, layers, link_steps, cap)
}

/// Icosahedron with each triangle corner pulled toward its face center.
pub(super) fn truncated_icosa(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let ratio = num(geo, "trunc_ratio", 0.333).clamp(0.05, 0.45);
    let (base, faces) = solid_data("icosahedron");
    let mut vectors = Vec::with_capacity(faces.len() * 3);
    for face in &faces {
        let pts: Vec<Vec3> = face[..3].iter().map(|&i| base[i]).collect();
        let center = (
            (pts[0].0 + pts[1].0 + pts[2].0) / 3.0,
            (pts[0].1 + pts[1].1 + pts[2].1) / 3.0,
            (pts[0].2 + pts[1].2 + pts[2].2) / 3.0,
        );
        for &v in &pts {
            vectors.push(mix(v, center, ratio));
        }
    }
    let layers = int(geo, "poly_layers", 0).max(1) as usize;
    let link_steps = int(geo, "poly_link_steps", 0).max(0) as usize;
    polyhedron_points(&vectors, &[], radius, layers, link_steps, cap)
}

/// Icosahedron plus a spike above the center of every face.
pub(super) fn stellated_icosa(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let spike = {
        let s = num(geo, "stellated_scale", 1.4);
        if s == 0.0 { 1.4 } else { s }
    };
    let (base, faces) = solid_data("icosahedron");
    let mut vectors = base.clone();
    for face in &faces {
        let pts: Vec<Vec3> = face[..3].iter().map(|&i| base[i]).collect();
        let center = normalize((
            (pts[0].0 + pts[1].0 + pts[2].0) / 3.0,
            (pts[0].1 + pts[1].1 + pts[2].1) / 3.0,
            (pts[0].2 + pts[1].2 + pts[2].2) / 3.0,
        ));
        vectors.push(vscale(center, spike));
    }
    let layers = int(geo, "poly_layers", 0).max(1) as usize;
    let link_steps = int(geo, "poly_link_steps", 0).max(0) as usize;
    polyhedron_points(&vectors, &[], radius, layers, link_steps, cap)
}

/// Vertices of the subdivided icosahedron projected onto the sphere.
pub(super) fn geodesic_sphere(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let level = int(geo, "geo_level", 0).max(0) as usize;
    let (vertices, _faces) = subdivide_geodesic(level);
    unique_points(&vertices, radius, cap)
}

/// Geodesic vertices plus each triangle's edge midpoints.
pub(super) fn geodesic(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let level = int(geo, "geo_level", 0).max(0) as usize;
    let (vertices, faces) = subdivide_geodesic(level);
    let mut vectors = vertices.clone();
    for [a, b, c] in faces {
        vectors.push(mix(vertices[a], vertices[b], 0.5));
        vectors.push(mix(vertices[b], vertices[c], 0.5));
        vectors.push(mix(vertices[c], vertices[a], 0.5));
    }
    unique_points(&vectors, radius, cap)
}

/// Geodesic edge network: both endpoints and the midpoint of each edge.
pub(super) fn geodesic_graph(geo: &Value, cap: usize, _rng: &mut dyn RngCore) -> Vec<Point3> {
    let radius = num(geo, "R", 1.0);
    let level = int(geo, "geo_graph_level", 0).max(0) as usize;
    let (vertices, faces) = subdivide_geodesic(level);
    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    for [a, b, c] in &faces {
        for (p, q) in [(a, b), (b, c), (c, a)] {
            edges.insert((*p.min(q), *p.max(q)));
        }
    }
    let mut vectors = Vec::with_capacity(edges.len() * 3);
    for (a, b) in edges {
        vectors.push(vertices[a]);
        vectors.push(vertices[b]);
        vectors.push(mix(vertices[a], vertices[b], 0.5));
    }
    unique_points(&vectors, radius, cap)
}
