//! Interactive animated point-cloud viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the [`Engine`] and implements
//! [`eframe::App`] to render each frame and drive the engine through an
//! egui UI. All simulation logic lives in `halo-core`; this crate only
//! translates UI edits into configuration patches and paints the
//! [`RenderItem`]s the engine returns.

use eframe::App;
use halo_core::config::{boolean, num, section, text};
use halo_core::engine::Engine;
use halo_core::generators;
use halo_core::point::RenderItem;
use serde_json::json;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The engine core: an [`Engine`] holding the configuration document and
///   base point cloud (optionally backed by a topology registry).
/// - UI mirror fields for the controls that are edited as local values
///   before being committed as patches.
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Build the control panels; any edit becomes a `set_params` patch.
/// 2. If `running`, call [`Engine::step`] with the central panel size.
/// 3. Paint the returned items and request a repaint.
///
/// ### Fields
/// - `engine` - The configuration document, base cloud and frame pipeline.
/// - `running` - Whether the animation is advancing.
/// - `topology` - Currently selected topology name.
/// - `point_count` - Requested point count (`geometry.N`).
/// - `last_frame_items` - Item count of the last painted frame (status bar).
pub struct Viewer {
    engine: Engine,

    running: bool,
    topology: String,
    point_count: u32,

    last_frame_items: usize,
}

impl Viewer {
    /// Creates a viewer around a fresh engine with the default document.
    ///
    /// The engine starts on the default topology with its default point
    /// count; the animation is running from the first frame.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to `eframe::run_native`.
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }

    /// Creates a viewer around a caller-provided engine, e.g. one backed
    /// by a topology registry directory.
    pub fn with_engine(engine: Engine) -> Self {
        let geometry = section(engine.state(), "geometry");
        let topology = text(geometry, "topology", "torus").to_string();
        let point_count = num(geometry, "N", 0.0).max(0.0) as u32;
        Self {
            engine,
            running: true,
            topology,
            point_count,
            last_frame_items: 0,
        }
    }

    /// Helper to draw a labeled `f64` slider that patches one document key.
    ///
    /// The current value is read from the live document section, so the
    /// slider never drifts from engine state; an edit is written back as a
    /// minimal `{section: {key: value}}` patch.
    fn slider(
        &mut self,
        ui: &mut egui::Ui,
        section_name: &str,
        key: &str,
        label: &str,
        range: std::ops::RangeInclusive<f64>,
    ) {
        let mut value = num(section(self.engine.state(), section_name), key, 0.0);
        if ui
            .add(egui::Slider::new(&mut value, range).text(label))
            .changed()
        {
            self.engine
                .set_params(&json!({ section_name: { key: value } }));
        }
    }

    /// Helper to draw a labeled checkbox that patches one boolean key.
    fn toggle(&mut self, ui: &mut egui::Ui, section_name: &str, key: &str, label: &str) {
        let mut value = boolean(section(self.engine.state(), section_name), key, false);
        if ui.checkbox(&mut value, label).changed() {
            self.engine
                .set_params(&json!({ section_name: { key: value } }));
        }
    }

    /// Helper to draw a combo box over fixed mode strings for one key.
    fn mode_combo(
        &mut self,
        ui: &mut egui::Ui,
        section_name: &str,
        key: &str,
        label: &str,
        modes: &[&str],
    ) {
        let current = text(section(self.engine.state(), section_name), key, modes[0]).to_string();
        let mut selected = current.clone();
        egui::ComboBox::from_label(label)
            .selected_text(&selected)
            .show_ui(ui, |ui| {
                for mode in modes {
                    ui.selectable_value(&mut selected, mode.to_string(), *mode);
                }
            });
        if selected != current {
            self.engine
                .set_params(&json!({ section_name: { key: selected } }));
        }
    }

    /// Builds the top panel UI (run controls and the topology picker).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Rebuild").clicked() {
                    self.engine.rebuild_geometry();
                }

                ui.separator();
                self.ui_topology_picker(ui);

                let mut count = self.point_count;
                ui.add(
                    egui::DragValue::new(&mut count)
                        .prefix("N = ")
                        .range(0..=50_000)
                        .speed(50),
                );
                if count != self.point_count {
                    self.point_count = count;
                    self.engine.set_params(&json!({"geometry": {"N": count}}));
                }
            });
        });
    }

    /// Builds the topology combo box from the registry catalog (grouped by
    /// category) followed by the built-in generator names.
    fn ui_topology_picker(&mut self, ui: &mut egui::Ui) {
        let mut selected = self.topology.clone();
        egui::ComboBox::from_label("Topology")
            .selected_text(&selected)
            .show_ui(ui, |ui| {
                if let Some(registry) = self.engine.registry() {
                    for (category, definitions) in registry.grouped_definitions() {
                        ui.label(egui::RichText::new(category).strong());
                        for definition in definitions {
                            ui.selectable_value(
                                &mut selected,
                                definition.name.clone(),
                                &definition.label,
                            );
                        }
                        ui.separator();
                    }
                }
                for name in generators::builtin_names() {
                    ui.selectable_value(&mut selected, name.to_string(), *name);
                }
            });
        if selected != self.topology {
            self.topology = selected.clone();
            self.engine
                .set_params(&json!({"geometry": {"topology": selected}}));
        }
    }

    /// Builds the bottom status bar (base cloud size, painted items).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("painted = {}", self.last_frame_items));
                ui.label(format!("base points = {}", self.engine.base_points().len()));
                ui.separator();
                ui.label(format!("topology = {}", self.topology));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Every control reads from and patches the engine document directly,
    /// grouped the same way the document is sectioned.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Camera");
                    self.slider(ui, "camera", "omegaDegPerSec", "orbit °/s", -180.0..=180.0);
                    self.slider(ui, "camera", "camHeightDeg", "height °", -89.0..=89.0);
                    self.slider(ui, "camera", "camTiltDeg", "tilt °", -180.0..=180.0);
                    self.slider(ui, "camera", "camRadius", "distance", 0.5..=12.0);
                    self.slider(ui, "camera", "fov", "fov", 100.0..=1500.0);

                    ui.separator();
                    ui.heading("Geometry");
                    self.slider(ui, "geometry", "R", "radius", 0.1..=4.0);

                    ui.separator();
                    ui.heading("Appearance");
                    self.slider(ui, "appearance", "px", "point px", 1.0..=12.0);
                    self.slider(ui, "appearance", "opacity", "opacity", 0.0..=1.0);
                    self.slider(ui, "appearance", "alphaDepth", "depth fade", 0.0..=1.0);
                    self.mode_combo(
                        ui,
                        "appearance",
                        "palette",
                        "palette",
                        &[
                            "uniform",
                            "gradient_linear",
                            "gradient_radial",
                            "by_lat",
                            "by_lon",
                            "by_noise",
                        ],
                    );
                    self.mode_combo(ui, "appearance", "shape", "shape", &["circle", "square"]);
                    self.slider(ui, "appearance", "h0", "hue base", 0.0..=360.0);
                    self.slider(ui, "appearance", "dh", "hue spread", -180.0..=180.0);
                    self.slider(ui, "appearance", "wh", "hue wave", 0.0..=180.0);

                    ui.separator();
                    ui.heading("Dynamics");
                    self.slider(ui, "dynamics", "rotX", "spin X °/s", -360.0..=360.0);
                    self.slider(ui, "dynamics", "rotY", "spin Y °/s", -360.0..=360.0);
                    self.slider(ui, "dynamics", "rotZ", "spin Z °/s", -360.0..=360.0);
                    self.slider(ui, "dynamics", "pulseA", "pulse amp", 0.0..=1.0);
                    self.slider(ui, "dynamics", "pulseW", "pulse rate", 0.0..=12.0);
                    self.mode_combo(
                        ui,
                        "dynamics",
                        "rotPhaseMode",
                        "phase mode",
                        &["none", "by_index", "by_radius", "random"],
                    );
                    self.slider(ui, "dynamics", "rotPhaseDeg", "phase °", 0.0..=360.0);

                    ui.separator();
                    ui.heading("Distribution");
                    self.mode_combo(
                        ui,
                        "distribution",
                        "densityMode",
                        "density",
                        &["uniform", "centered", "edges", "noise_field"],
                    );
                    self.slider(ui, "distribution", "dmin_px", "screen dmin px", 0.0..=40.0);
                    self.slider(ui, "distribution", "noiseWarp", "noise warp", 0.0..=1.0);
                    self.slider(ui, "distribution", "fieldFlow", "field flow", 0.0..=2.0);
                    self.slider(ui, "distribution", "repelForce", "repel", 0.0..=1.0);
                    self.slider(ui, "distribution", "densityPulse", "breath", 0.0..=1.0);

                    ui.separator();
                    ui.heading("Mask");
                    self.toggle(ui, "mask", "enabled", "enabled");
                    self.mode_combo(
                        ui,
                        "mask",
                        "mode",
                        "mask mode",
                        &[
                            "none",
                            "north_cap",
                            "south_cap",
                            "equatorial_band",
                            "longitudinal_band",
                        ],
                    );
                    self.slider(ui, "mask", "angleDeg", "cap angle °", 0.0..=180.0);
                    self.slider(ui, "mask", "bandHalfDeg", "band half °", 0.0..=90.0);
                    self.slider(ui, "mask", "lonCenterDeg", "lon center °", 0.0..=360.0);
                    self.slider(ui, "mask", "lonWidthDeg", "lon width °", 0.0..=180.0);
                    self.slider(ui, "mask", "softDeg", "soft edge °", 0.0..=45.0);
                    self.toggle(ui, "mask", "invert", "invert");

                    ui.separator();
                    ui.heading("System");
                    self.toggle(ui, "system", "depthSort", "depth sort");
                    self.toggle(ui, "system", "transparent", "transparent");
                });
            });
    }

    /// Paints one frame's items into `rect`.
    ///
    /// Items arrive far-to-near when depth sorting is on, so plain
    /// painter's-algorithm iteration gives correct overlap. The item's
    /// screen position is relative to the engine viewport, which is exactly
    /// `rect` here, so only the rect origin offset is applied.
    fn paint_items(&self, painter: &egui::Painter, rect: egui::Rect, items: &[RenderItem]) {
        let appearance = section(self.engine.state(), "appearance");
        let square = text(appearance, "shape", "circle") == "square";
        if !boolean(section(self.engine.state(), "system"), "transparent", true) {
            painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
        }
        for item in items {
            let pos = egui::pos2(rect.min.x + item.sx as f32, rect.min.y + item.sy as f32);
            let alpha = (item.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            if alpha == 0 {
                continue;
            }
            let color = egui::Color32::from_rgba_unmultiplied(
                item.color.r,
                item.color.g,
                item.color.b,
                alpha,
            );
            let radius = item.radius as f32;
            if square {
                painter.rect_filled(
                    egui::Rect::from_center_size(pos, egui::vec2(radius * 2.0, radius * 2.0)),
                    0.0,
                    color,
                );
            } else {
                painter.circle_filled(pos, radius, color);
            }
        }
    }

    /// Builds the central panel: steps the engine and paints the frame.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if self.running {
                let items = self
                    .engine
                    .step(rect.width() as f64, rect.height() as f64);
                self.last_frame_items = items.len();
                self.paint_items(&painter, rect, &items);
                ctx.request_repaint();
            }
        });
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Renders the config side panel.
    /// - Steps the engine and paints the frame into the central panel.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_mirrors_the_default_document() {
        let viewer = Viewer::new();
        assert_eq!(viewer.topology, "torus");
        assert!(viewer.point_count > 0);
        assert!(viewer.running);
    }

    #[test]
    fn topology_change_patches_the_engine() {
        let mut viewer = Viewer::new();
        viewer.topology = "uv_sphere".to_string();
        viewer
            .engine
            .set_params(&json!({"geometry": {"topology": "uv_sphere"}}));
        let geometry = section(viewer.engine.state(), "geometry");
        assert_eq!(text(geometry, "topology", ""), "uv_sphere");
        assert!(!viewer.engine.base_points().is_empty());
    }
}
