//! Album-ambience rendering engine.
//!
//! Turns a still image into a continuously animated, organically drifting
//! background. The expensive work — reducing the source to a small, heavily
//! blurred "album" texture — happens once per image; the per-frame path only
//! blends, warps, and composites:
//!
//! ```text
//!   load_image / load_gradient
//!          │ RasterSource (decode on worker thread)
//!          ▼
//!   ingest ──▶ tint ──▶ Kawase ×N (ping-pong) ──▶ album slot ──▶ crossfade
//!                                                                  │
//!   every frame:  blend (while fading) ─▶ domain warp ─▶ composite ─▶ surface
//!                                              ▲
//!                                    AnimationClock (smoothed speed)
//! ```
//!
//! [`Engine`] owns every GPU resource and is driven by the host's redraw
//! callback; see the crate-level binary for a winit host.

mod clock;
mod engine;
mod gpu;
mod gradient;
mod options;
mod source;

pub use engine::Engine;
pub use gradient::ColorStop;
pub use options::{
    EngineOptions, OptionsUpdate, ANIMATION_SPEED_RANGE, BLUR_PASSES_RANGE, DITHERING_RANGE,
    SATURATION_RANGE, TINT_INTENSITY_RANGE, TRANSITION_MS_RANGE, WARP_INTENSITY_RANGE,
};
pub use source::{LoadError, LoadTicket, RasterSource};
