//! Application entry point for the animated point-cloud viewer.
//!
//! This binary sets up eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use halo_core::engine::Engine;
use halo_core::registry::TopologyRegistry;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// When a directory path is passed as the first argument it is opened as a
/// topology registry and its documents become selectable alongside the
/// built-in generators; without an argument only the built-ins are
/// available.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let engine = match std::env::args().nth(1) {
        Some(dir) => match TopologyRegistry::new(&dir) {
            Ok(registry) => {
                for event in registry.events() {
                    eprintln!("registry: {event:?}");
                }
                Engine::with_registry(registry)
            }
            Err(err) => {
                eprintln!("could not open topology registry `{dir}`: {err}");
                Engine::new()
            }
        },
        None => Engine::new(),
    };

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Halo",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::with_engine(engine)))),
    )
}
