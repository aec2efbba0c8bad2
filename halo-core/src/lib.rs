// The default configuration document is one large `json!` literal; macro
// expansion needs more headroom than the default limit allows.
#![recursion_limit = "512"]

//! Core animated point-cloud engine library.
//!
//! Main components:
//! - [`config`] — the JSON configuration document and merge semantics.
//! - [`generators`] — the built-in topology generator families.
//! - [`registry`] — the on-disk topology library and its declarative programs.
//! - [`engine`] — per-frame pipeline from base cloud to render items.
//! - [`anim`] — point modifiers, phase factors, pulse and spin.
//! - [`camera`] — orbit state and perspective projection.
//! - [`mask`] — density and spherical-mask survival decisions.
//! - [`palette`] — colors, gradients and depth fade.
//! - [`dedup`] — world-space and screen-space minimum-distance filters.
//! - [`expr`] — the constrained expression evaluator.
//! - [`noise`] — value noise and small numeric helpers.
//! - [`point`] — shared point and render-item types.

pub mod anim;
pub mod camera;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod expr;
pub mod generators;
pub mod mask;
pub mod noise;
pub mod palette;
pub mod point;
pub mod registry;
