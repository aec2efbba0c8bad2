//! The frame engine: owns the configuration document and the base point
//! cloud, and turns both into a list of [`RenderItem`]s per frame.
//!
//! The engine is deliberately free of any UI type. A host surface calls
//! [`Engine::set_params`] with partial configuration patches and
//! [`Engine::step`] once per frame with the current viewport size; painting
//! the returned items is the host's problem.
//!
//! Geometry is rebuilt only when a patch touches the `geometry`,
//! `distribution` or `system` sections. Everything else (camera, colors,
//! dynamics, masking) is evaluated per frame against the unchanged base
//! cloud, so tweaking those never stalls on regeneration.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use crate::anim::{apply_point_modifiers, phase_factor, pulse_scale, spin, spin_angles};
use crate::camera::{FrameCamera, OrbitState};
use crate::config::{self, boolean, int, num, patch_touches, section, text};
use crate::dedup::{filter_min_dist_2d, filter_min_dist_3d};
use crate::generators;
use crate::mask::{keep_point, mask_weight};
use crate::noise::{clamp01, spherical_from_cartesian, value_noise3};
use crate::palette::{depth_fade, Gradient, Rgb, DEFAULT_COLOR};
use crate::point::{Point3, RenderItem};
use crate::registry::{Generator, TopologyRegistry};

fn nonzero(value: f64, fallback: f64) -> f64 {
    if value == 0.0 {
        fallback
    } else {
        value
    }
}

pub struct Engine {
    state: Value,
    registry: Option<TopologyRegistry>,
    base_points: Vec<Point3>,
    gradient: Gradient,
    orbit: OrbitState,
    epoch: Instant,
    last_ms: f64,
}

impl Engine {
    /// An engine over the built-in generator families only.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// An engine that resolves topology names through `registry` first,
    /// falling back to the built-ins.
    pub fn with_registry(registry: TopologyRegistry) -> Self {
        Self::build(Some(registry))
    }

    fn build(registry: Option<TopologyRegistry>) -> Self {
        let state = config::default_state();
        let gradient = Gradient::parse(text(section(&state, "appearance"), "colors", ""));
        let mut engine = Self {
            state,
            registry,
            base_points: Vec::new(),
            gradient,
            orbit: OrbitState::new(),
            epoch: Instant::now(),
            last_ms: 0.0,
        };
        engine.rebuild_geometry();
        engine
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn registry(&self) -> Option<&TopologyRegistry> {
        self.registry.as_ref()
    }

    pub fn registry_mut(&mut self) -> Option<&mut TopologyRegistry> {
        self.registry.as_mut()
    }

    /// The current base cloud, before any per-frame animation.
    pub fn base_points(&self) -> &[Point3] {
        &self.base_points
    }

    /// Milliseconds since the engine was created.
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Merges a whole configuration document, e.g. a loaded profile.
    ///
    /// Unlike [`set_params`](Self::set_params) this refreshes the gradient
    /// and rebuilds the base cloud unconditionally, since a full document
    /// can change anything.
    pub fn merge_state(&mut self, doc: &Value) {
        config::merge(&mut self.state, doc);
        self.gradient = Gradient::parse(text(section(&self.state, "appearance"), "colors", ""));
        self.rebuild_geometry();
    }

    /// Merges a partial configuration patch into the document.
    ///
    /// Unknown keys pass through untouched. The base cloud is rebuilt only
    /// when the patch touches a section that feeds generation.
    pub fn set_params(&mut self, patch: &Value) {
        config::merge(&mut self.state, patch);
        if patch_touches(patch, "appearance") {
            self.gradient = Gradient::parse(text(section(&self.state, "appearance"), "colors", ""));
        }
        if patch_touches(patch, "geometry")
            || patch_touches(patch, "distribution")
            || patch_touches(patch, "system")
        {
            self.rebuild_geometry();
        }
    }

    /// Regenerates the base cloud from the current document.
    ///
    /// The named topology is resolved through the registry (when present),
    /// then the built-ins; a missing or empty result falls back to the UV
    /// sphere so the view never goes blank. The cloud is centered on its
    /// centroid, thinned by the world-space minimum distance and reseeded
    /// by index.
    pub fn rebuild_geometry(&mut self) {
        let geometry = config::section_snapshot(&self.state, "geometry");
        let system = section(&self.state, "system");
        let cap = int(system, "Nmax", 50_000).max(0) as usize;
        let seed = int(system, "seed", 0) as u64;
        let name = text(&geometry, "topology", "torus").to_string();

        let mut rng = StdRng::seed_from_u64(seed);
        let generator = self
            .registry
            .as_ref()
            .and_then(|registry| registry.resolve(&name))
            .or_else(|| generators::builtin(&name).map(Generator::Builtin));
        let mut points = match generator {
            Some(generator) => generator.generate(&geometry, cap, &mut rng),
            None => Vec::new(),
        };
        if points.is_empty() {
            points = generators::builtin("uv_sphere")
                .map(|f| f(&geometry, cap, &mut rng))
                .unwrap_or_default();
        }

        let dmin = num(section(&self.state, "distribution"), "dmin", 0.0);
        if dmin > 0.0 {
            points = filter_min_dist_3d(&points, dmin);
        }

        if !points.is_empty() {
            let inv = 1.0 / points.len() as f64;
            let (mut cx, mut cy, mut cz) = (0.0, 0.0, 0.0);
            for p in &points {
                cx += p.x;
                cy += p.y;
                cz += p.z;
            }
            let (cx, cy, cz) = (cx * inv, cy * inv, cz * inv);
            for (index, p) in points.iter_mut().enumerate() {
                p.x -= cx;
                p.y -= cy;
                p.z -= cz;
                p.seed = index as i64;
            }
        }
        self.base_points = points;
    }

    /// Produces one frame using the engine's own clock.
    pub fn step(&mut self, width: f64, height: f64) -> Vec<RenderItem> {
        let now = self.now_ms();
        self.step_at(now, width, height)
    }

    /// Produces one frame for an explicit timestamp (milliseconds).
    ///
    /// The camera orbit advances by the clamped delta since the previous
    /// call, so a long stall never causes the azimuth to jump.
    pub fn step_at(&mut self, now_ms: f64, width: f64, height: f64) -> Vec<RenderItem> {
        if width <= 0.0 || height <= 0.0 {
            return Vec::new();
        }
        let dt = ((now_ms - self.last_ms) / 1000.0).clamp(0.0, 0.1);
        self.last_ms = now_ms;

        let camera_cfg = config::section_snapshot(&self.state, "camera");
        let geometry = config::section_snapshot(&self.state, "geometry");
        let appearance = config::section_snapshot(&self.state, "appearance");
        let dynamics = config::section_snapshot(&self.state, "dynamics");
        let distribution = config::section_snapshot(&self.state, "distribution");
        let mask = config::section_snapshot(&self.state, "mask");

        self.orbit.advance(num(&camera_cfg, "omegaDegPerSec", 0.0), dt);
        let camera = FrameCamera::new(&camera_cfg, self.orbit.theta_deg(), width, height);

        let radius = nonzero(num(&geometry, "R", 1.0), 1.0);
        let px_radius = nonzero(num(&appearance, "px", 2.0), 2.0).max(1.0);
        let total = self.base_points.len();

        let mut items = Vec::new();
        for (index, base) in self.base_points.iter().enumerate() {
            let moved = apply_point_modifiers(&geometry, &distribution, &dynamics, base, now_ms);
            if !keep_point(&distribution, &mask, &moved, moved.seed, radius) {
                continue;
            }
            let phase = phase_factor(&dynamics, &geometry, &moved, index, total);
            let pulse = pulse_scale(&dynamics, now_ms, phase);
            let angles = spin_angles(&dynamics, now_ms, phase);
            let (x, y, z) = spin(moved.x * pulse, moved.y * pulse, moved.z * pulse, angles);
            let Some(projected) = camera.project(x, y, z) else {
                continue;
            };
            items.push(RenderItem {
                sx: projected.sx,
                sy: projected.sy,
                radius: px_radius,
                color: DEFAULT_COLOR,
                alpha: 1.0,
                depth: projected.depth,
                world: Point3::with_seed(x, y, z, index as i64),
            });
        }

        let dmin_px = num(&distribution, "dmin_px", 0.0);
        if dmin_px > 0.0 {
            let positions: Vec<(f64, f64)> = items.iter().map(|item| (item.sx, item.sy)).collect();
            let kept = filter_min_dist_2d(&positions, dmin_px);
            let mut filtered = Vec::with_capacity(kept.len());
            for index in kept {
                filtered.push(items[index].clone());
            }
            items = filtered;
        }

        let opacity = nonzero(num(&appearance, "opacity", 1.0), 1.0);
        let alpha_depth = num(&appearance, "alphaDepth", 0.0);
        for item in &mut items {
            item.color = self.pick_color(&appearance, item, now_ms, width, height);
            item.alpha = clamp01(
                opacity * depth_fade(item.depth, alpha_depth) * mask_weight(&mask, &item.world),
            );
        }

        if boolean(section(&self.state, "system"), "depthSort", true) {
            items.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        }
        items
    }

    fn pick_color(
        &self,
        appearance: &Value,
        item: &RenderItem,
        now_ms: f64,
        width: f64,
        height: f64,
    ) -> Rgb {
        match text(appearance, "palette", "uniform") {
            "gradient_radial" => {
                let dx = item.sx - width / 2.0;
                let dy = item.sy - height / 2.0;
                let max_radius = 0.5 * width.min(height);
                self.gradient
                    .sample(clamp01(dx.hypot(dy) / max_radius.max(1.0)))
            }
            "gradient_linear" => {
                // Sweep over the middle half of the viewport width.
                let t = clamp01((item.sx - width * 0.25) / (width * 0.5).max(1.0));
                self.gradient.sample(t)
            }
            "by_lat" => {
                let (theta, _) =
                    spherical_from_cartesian(item.world.x, item.world.y, item.world.z);
                let factor = (1.0 - theta / std::f64::consts::PI) * 2.0 - 1.0;
                hsl_from_params(appearance, factor, now_ms)
            }
            "by_lon" => {
                let (_, phi) =
                    spherical_from_cartesian(item.world.x, item.world.y, item.world.z);
                let factor = (phi / std::f64::consts::TAU) * 2.0 - 1.0;
                hsl_from_params(appearance, factor, now_ms)
            }
            "by_noise" => {
                let scale = nonzero(num(appearance, "noiseScale", 1.0), 1.0).max(0.05);
                let speed = num(appearance, "noiseSpeed", 0.0);
                let n = value_noise3(
                    item.world.x * scale + speed * now_ms * 0.001,
                    item.world.y * scale,
                    item.world.z * scale,
                );
                self.gradient.sample(n)
            }
            // "uniform" and anything unrecognized use the flat color.
            _ => {
                let hex = text(appearance, "color", "");
                if hex.trim().is_empty() {
                    DEFAULT_COLOR
                } else {
                    Rgb::from_hex(hex)
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Parametric HSL color used by the `by_lat`/`by_lon` palettes.
///
/// `factor` runs over `[-1, 1]`; hue drifts with time through `wh`.
fn hsl_from_params(appearance: &Value, factor: f64, now_ms: f64) -> Rgb {
    let base = num(appearance, "h0", 0.0);
    let delta = num(appearance, "dh", 0.0);
    let wave = num(appearance, "wh", 0.0);
    let hue = (base + delta * factor + wave * (now_ms * 0.001).sin()).rem_euclid(360.0);
    let sat = clamp01(0.55 + 0.2 * factor);
    let light = clamp01(0.55 + 0.25 * factor);
    Rgb::from_hsl(hue / 360.0, sat, light)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_engine() -> Engine {
        let mut engine = Engine::new();
        engine.set_params(&json!({
            "geometry": {"topology": "uv_sphere", "N": 200, "lat": 10, "lon": 20},
            "system": {"Nmax": 500},
        }));
        engine
    }

    #[test]
    fn rebuild_centers_the_cloud_and_assigns_seeds() {
        let engine = small_engine();
        let points = engine.base_points();
        assert!(!points.is_empty());
        let n = points.len() as f64;
        let cx: f64 = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy: f64 = points.iter().map(|p| p.y).sum::<f64>() / n;
        let cz: f64 = points.iter().map(|p| p.z).sum::<f64>() / n;
        assert!(cx.abs() < 1e-9 && cy.abs() < 1e-9 && cz.abs() < 1e-9);
        for (index, p) in points.iter().enumerate() {
            assert_eq!(p.seed, index as i64);
        }
    }

    #[test]
    fn unknown_topology_falls_back_to_the_uv_sphere() {
        let mut engine = Engine::new();
        engine.set_params(&json!({
            "geometry": {"topology": "definitely_not_a_topology", "N": 50},
        }));
        assert!(!engine.base_points().is_empty());
    }

    #[test]
    fn geometry_patches_rebuild_and_appearance_patches_do_not() {
        let mut engine = small_engine();
        let before = engine.base_points().to_vec();

        engine.set_params(&json!({"appearance": {"px": 5.0, "opacity": 0.5}}));
        assert_eq!(engine.base_points(), &before[..]);

        engine.set_params(&json!({"geometry": {"N": 64, "lat": 4, "lon": 8}}));
        assert_ne!(engine.base_points().len(), before.len());
    }

    #[test]
    fn merge_state_always_rebuilds() {
        let mut engine = small_engine();
        let before = engine.base_points().len();
        engine.merge_state(&json!({"geometry": {"lat": 6, "lon": 6}}));
        assert_ne!(engine.base_points().len(), before);
    }

    #[test]
    fn unknown_sections_pass_through_the_merge() {
        let mut engine = Engine::new();
        engine.set_params(&json!({"plugin": {"custom": 1}}));
        assert_eq!(engine.state()["plugin"]["custom"], json!(1));
    }

    #[test]
    fn zero_viewport_yields_no_items() {
        let mut engine = small_engine();
        assert!(engine.step_at(0.0, 0.0, 600.0).is_empty());
        assert!(engine.step_at(0.0, 800.0, 0.0).is_empty());
    }

    #[test]
    fn step_projects_items_with_sane_fields() {
        let mut engine = small_engine();
        let items = engine.step_at(16.0, 800.0, 600.0);
        assert!(!items.is_empty());
        for item in &items {
            assert!(item.sx.is_finite() && item.sy.is_finite());
            assert!(item.depth > 0.01);
            assert!((0.0..=1.0).contains(&item.alpha));
            assert!(item.radius >= 1.0);
        }
    }

    #[test]
    fn depth_sort_orders_far_to_near() {
        let mut engine = small_engine();
        engine.set_params(&json!({"system": {"depthSort": true}}));
        let items = engine.step_at(16.0, 800.0, 600.0);
        for pair in items.windows(2) {
            assert!(pair[0].depth >= pair[1].depth);
        }
    }

    #[test]
    fn screen_dedup_thins_the_frame() {
        let mut engine = small_engine();
        let dense = engine.step_at(16.0, 800.0, 600.0).len();
        engine.set_params(&json!({"distribution": {"dmin_px": 40.0}}));
        let sparse = engine.step_at(32.0, 800.0, 600.0).len();
        assert!(sparse < dense, "{sparse} should be < {dense}");
    }

    #[test]
    fn opacity_scales_the_final_alpha() {
        let mut engine = small_engine();
        engine.set_params(&json!({"appearance": {"opacity": 0.25, "alphaDepth": 0.0}}));
        let items = engine.step_at(16.0, 800.0, 600.0);
        assert!(!items.is_empty());
        for item in &items {
            assert!(item.alpha <= 0.25 + 1e-9);
        }
    }

    #[test]
    fn uniform_palette_uses_the_flat_color() {
        let mut engine = small_engine();
        engine.set_params(&json!({
            "appearance": {"palette": "uniform", "color": "#FF0000"},
        }));
        let items = engine.step_at(16.0, 800.0, 600.0);
        assert!(items.iter().all(|item| item.color == Rgb { r: 255, g: 0, b: 0 }));
    }

    #[test]
    fn fixed_timestamps_are_reproducible() {
        let mut a = small_engine();
        let mut b = small_engine();
        a.set_params(&json!({"dynamics": {"rotY": 45.0, "pulseA": 0.2, "pulseW": 2.0}}));
        b.set_params(&json!({"dynamics": {"rotY": 45.0, "pulseA": 0.2, "pulseW": 2.0}}));
        let frame_a = a.step_at(250.0, 640.0, 480.0);
        let frame_b = b.step_at(250.0, 640.0, 480.0);
        assert_eq!(frame_a.len(), frame_b.len());
        for (x, y) in frame_a.iter().zip(&frame_b) {
            assert_eq!(x.sx, y.sx);
            assert_eq!(x.sy, y.sy);
            assert_eq!(x.color, y.color);
        }
    }
}
