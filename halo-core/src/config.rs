//! The engine state document and the merge/accessor layer over it.
//!
//! State is a single JSON object split into named sections (`camera`,
//! `geometry`, `appearance`, `dynamics`, `distribution`, `mask`, `system`).
//! Incoming patches are merged recursively, so a caller can update one key
//! without restating its section. Unknown sections and keys are kept as-is,
//! which lets host applications stash their own data in the same document.

use serde_json::{json, Map, Value};

/// Builds the complete default state document.
///
/// Every key the engine reads exists here with its default value, so
/// accessors never have to invent defaults per call site. The geometry
/// section carries the union of all generator parameters; each generator
/// only reads its own subset.
pub fn default_state() -> Value {
    json!({
        "camera": {
            "camRadius": 3.2,
            "camHeightDeg": 15,
            "camTiltDeg": 0,
            "omegaDegPerSec": 20,
            "fov": 600,
        },
        "geometry": {
            "topology": "torus",
            "R": 1.0,
            "lat": 64,
            "lon": 64,
            "N": 4096,
            "phi_g": 3.883222,
            "R_major": 1.2,
            "R_major2": 0.8,
            "r_minor": 0.45,
            "eps1": 1.0,
            "eps2": 1.0,
            "ax": 1.0,
            "ay": 1.0,
            "az": 1.0,
            "geo_level": 1,
            "mobius_w": 0.4,
            "arch_a": 0.0,
            "arch_b": 0.6,
            "theta_max": 6.28318,
            "log_a": 0.2,
            "log_b": 0.15,
            "rose_k": 4.0,
            "sf2_m": 6.0,
            "sf2_a": 1.0,
            "sf2_b": 1.0,
            "sf2_n1": 0.5,
            "sf2_n2": 0.5,
            "sf2_n3": 0.5,
            "density_pdf": "1",
            "poisson_dmin": 0.05,
            "lissajous_a": 3,
            "lissajous_b": 2,
            "lissajous_phase": 0.0,
            "vogel_k": 2.3999632,
            "se_n1": 1.0,
            "se_n2": 1.0,
            "half_height": 1.0,
            "noisy_amp": 0.1,
            "noisy_freq": 3.0,
            "noisy_gain": 1.0,
            "noisy_omega": 0.0,
            "sph_terms": "2,0,0.4;3,2,0.2",
            "weight_map": "1",
            "torus_knot_p": 3,
            "torus_knot_q": 2,
            "strip_w": 0.4,
            "strip_n": 2,
            "blob_noise_amp": 0.25,
            "blob_noise_scale": 2.0,
            "gyroid_scale": 1.0,
            "gyroid_thickness": 0.05,
            "gyroid_c": 0.0,
            "schwarz_scale": 1.0,
            "schwarz_iso": 0.0,
            "heart_scale": 1.0,
            "polyhedron_data": "",
            "poly_layers": 1,
            "poly_link_steps": 0,
            "metaballs_centers": "0,0,0",
            "metaballs_radii": "0.6",
            "metaballs_iso": 1.0,
            "df_ops": "sphere(1.0)",
            "sf3_m1": 3.0,
            "sf3_m2": 3.0,
            "sf3_m3": 3.0,
            "sf3_n1": 0.5,
            "sf3_n2": 0.5,
            "sf3_n3": 0.5,
            "sf3_a": 1.0,
            "sf3_b": 1.0,
            "sf3_scale": 1.0,
            "helix_r": 0.4,
            "helix_pitch": 0.3,
            "helix_turns": 3.0,
            "lissajous3d_Ax": 1.0,
            "lissajous3d_Ay": 1.0,
            "lissajous3d_Az": 1.0,
            "lissajous3d_wx": 3,
            "lissajous3d_wy": 2,
            "lissajous3d_wz": 5,
            "lissajous3d_phi": 0.0,
            "viviani_a": 1.0,
            "lic_N": 12,
            "lic_steps": 180,
            "lic_h": 0.05,
            "stream_N": 12,
            "stream_steps": 220,
            "geo_graph_level": 2,
            "rgg_nodes": 400,
            "rgg_radius": 0.2,
            "rings_count": 5,
            "ring_points": 96,
            "hex_step": 0.2,
            "hex_nx": 12,
            "hex_ny": 12,
            "voronoi_N": 50,
            "voronoi_bbox": "-1,1,-1,1",
        },
        "appearance": {
            "color": "#00C8FF",
            "colors": "#00C8FF@0,#FFFFFF@1",
            "opacity": 1.0,
            "px": 2.0,
            "palette": "uniform",
            "paletteK": 2,
            "h0": 200,
            "dh": 0,
            "wh": 0,
            "blendMode": "source-over",
            "shape": "circle",
            "alphaDepth": 0.0,
            "noiseScale": 1.0,
            "noiseSpeed": 0.0,
            "pxModMode": "none",
            "pxModAmp": 0,
            "pxModFreq": 0,
            "pxModPhaseDeg": 0,
        },
        "dynamics": {
            "rotX": 0,
            "rotY": 0,
            "rotZ": 0,
            "rotXMax": 360,
            "rotYMax": 360,
            "rotZMax": 360,
            "orientXDeg": 0,
            "orientYDeg": 0,
            "orientZDeg": 0,
            "pulseA": 0,
            "pulseW": 1,
            "pulsePhaseDeg": 0,
            "rotPhaseMode": "none",
            "rotPhaseDeg": 0,
        },
        "distribution": {
            "densityMode": "uniform",
            "dmin": 0,
            "dmin_px": 0,
            "noiseWarp": 0,
            "fieldFlow": 0,
            "repelForce": 0,
            "densityPulse": 0,
        },
        "mask": {
            "enabled": false,
            "mode": "none",
            "angleDeg": 30,
            "bandHalfDeg": 20,
            "lonCenterDeg": 0,
            "lonWidthDeg": 30,
            "softDeg": 10,
            "invert": false,
        },
        "system": {
            "Nmax": 50000,
            "depthSort": true,
            "transparent": true,
        },
    })
}

/// Recursively merges `patch` into `target`.
///
/// Objects merge key by key, everything else replaces the existing value.
/// Keys present only in `patch` are inserted, keys absent from `patch`
/// survive untouched.
pub fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(slot) if slot.is_object() && value.is_object() => {
                        merge(slot, value);
                    }
                    _ => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, other) => *slot = other.clone(),
    }
}

static EMPTY: Value = Value::Null;

/// Borrow of a named section; missing sections read as an empty object.
pub fn section<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc.get(name).unwrap_or(&EMPTY)
}

/// Numeric lookup. Accepts JSON numbers, booleans and numeric strings,
/// mirroring how loosely typed the state document is in practice.
pub fn num(v: &Value, key: &str, default: f64) -> f64 {
    match v.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn int(v: &Value, key: &str, default: i64) -> i64 {
    let f = num(v, key, default as f64);
    if f.is_finite() {
        f.round() as i64
    } else {
        default
    }
}

pub fn text<'a>(v: &'a Value, key: &str, default: &'a str) -> &'a str {
    match v.get(key) {
        Some(Value::String(s)) => s,
        _ => default,
    }
}

pub fn boolean(v: &Value, key: &str, default: bool) -> bool {
    match v.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
        _ => default,
    }
}

/// Collects the section object as name/number pairs, skipping anything
/// non-numeric. Declarative topology programs read their parameters this way.
pub fn numeric_entries(v: &Value) -> Vec<(String, f64)> {
    match v {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|f| (key.clone(), f)))
            .collect(),
        _ => Vec::new(),
    }
}

/// True when the patch touches any key inside the named section.
pub fn patch_touches(patch: &Value, name: &str) -> bool {
    match patch.get(name) {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Deep-copies the sub-object at `name`, or an empty object if absent.
pub fn section_snapshot(doc: &Value, name: &str) -> Value {
    doc.get(name)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_every_section() {
        let doc = default_state();
        for name in [
            "camera",
            "geometry",
            "appearance",
            "dynamics",
            "distribution",
            "mask",
            "system",
        ] {
            assert!(doc.get(name).is_some(), "missing section {name}");
        }
        assert_eq!(text(section(&doc, "geometry"), "topology", ""), "torus");
        assert_eq!(num(section(&doc, "camera"), "camRadius", 0.0), 3.2);
    }

    #[test]
    fn merge_is_recursive_and_keeps_unrelated_keys() {
        let mut doc = default_state();
        merge(&mut doc, &json!({"camera": {"fov": 450}}));
        let cam = section(&doc, "camera");
        assert_eq!(num(cam, "fov", 0.0), 450.0);
        // Siblings survive a one-key patch.
        assert_eq!(num(cam, "camRadius", 0.0), 3.2);
    }

    #[test]
    fn merge_passes_unknown_sections_through() {
        let mut doc = default_state();
        merge(&mut doc, &json!({"hostExtras": {"windowTitle": "demo"}}));
        assert_eq!(
            text(section(&doc, "hostExtras"), "windowTitle", ""),
            "demo"
        );
    }

    #[test]
    fn numeric_accessor_tolerates_strings_and_bools() {
        let v = json!({"a": "2.5", "b": true, "c": "not a number"});
        assert_eq!(num(&v, "a", 0.0), 2.5);
        assert_eq!(num(&v, "b", 0.0), 1.0);
        assert_eq!(num(&v, "c", 7.0), 7.0);
        assert_eq!(num(&v, "missing", -1.0), -1.0);
        assert_eq!(int(&v, "a", 0), 3);
    }

    #[test]
    fn patch_touches_detects_section_updates() {
        let patch = json!({"geometry": {"N": 100}, "appearance": {}});
        assert!(patch_touches(&patch, "geometry"));
        assert!(!patch_touches(&patch, "appearance"));
        assert!(!patch_touches(&patch, "camera"));
    }

    #[test]
    fn numeric_entries_skip_non_numbers() {
        let v = json!({"R": 1.5, "topology": "torus", "lat": 64});
        let mut entries = numeric_entries(&v);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            entries,
            vec![("R".to_string(), 1.5), ("lat".to_string(), 64.0)]
        );
    }
}
