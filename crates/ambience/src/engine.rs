use std::time::Instant;

use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;

use crate::clock::AnimationClock;
use crate::gpu::GpuState;
use crate::gradient::{self, ColorStop};
use crate::options::{EngineOptions, OptionsUpdate};
use crate::source::{spawn_load, LoadError, LoadTicket, PendingLoad, RasterSource};

/// The album-ambience rendering engine, bound to one output surface.
///
/// All methods must be called from the thread that renders; the only
/// background work the engine performs is image fetch+decode, whose results
/// are re-joined here between frames. Construction creates every GPU resource
/// the engine will ever own; [`Engine::dispose`] releases them exactly once.
pub struct Engine {
    gpu: Option<GpuState>,
    clock: AnimationClock,
    options: EngineOptions,
    playing: bool,
    pending_load: Option<PendingLoad>,
    disposed: bool,
}

impl Engine {
    /// Builds the engine against a window-like surface target.
    ///
    /// Fails when no adapter/device can be acquired or a program fails to
    /// compile; there is no recovery short of constructing a fresh engine.
    pub fn new<T>(target: &T, size: PhysicalSize<u32>, options: EngineOptions) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let options = options.clamped();
        let gpu = GpuState::new(target, size).context("failed to initialise rendering engine")?;
        info!(
            width = size.width,
            height = size.height,
            "ambience engine ready"
        );
        Ok(Self {
            gpu: Some(gpu),
            clock: AnimationClock::new(options.animation_speed),
            options,
            playing: false,
            pending_load: None,
            disposed: false,
        })
    }

    /// Fetches and decodes an image from a filesystem path or `http(s)` URL
    /// on a worker thread.
    ///
    /// The returned ticket resolves only after the decoded image has been
    /// uploaded and blurred here on the rendering thread (see
    /// [`Engine::poll_loads`]); a fetch or decode failure leaves the
    /// currently displayed album untouched.
    pub fn load_image(&mut self, location: &str) -> LoadTicket {
        if self.disposed {
            return LoadTicket::resolved(Err(LoadError::Disposed));
        }
        debug!(location, "starting image load");
        let (pending, ticket) = spawn_load(location);
        // Any load already in flight is superseded.
        self.pending_load = Some(pending);
        ticket
    }

    /// Drains a finished fetch+decode, ingesting its raster. Returns true
    /// when a new image was ingested. Called automatically by the render
    /// entry points; hosts may also call it while not rendering.
    pub fn poll_loads(&mut self) -> bool {
        let Some(pending) = self.pending_load.as_ref() else {
            return false;
        };
        let Some(outcome) = pending.poll() else {
            return false;
        };
        let pending = self.pending_load.take().expect("pending load present");
        if self.disposed {
            pending.resolve(Err(LoadError::Disposed));
            return false;
        }
        match outcome {
            Ok(raster) => {
                self.ingest(&raster);
                pending.resolve(Ok(()));
                true
            }
            Err(error) => {
                warn!(error = %error, "image load failed");
                pending.resolve(Err(error));
                false
            }
        }
    }

    /// Ingests an already-decoded raster synchronously.
    pub fn load_from_raster(&mut self, raster: &RasterSource) {
        self.ingest(raster);
    }

    /// Ingests a raw RGBA8 pixel buffer synchronously.
    pub fn load_from_raw_pixels(
        &mut self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
    ) -> std::result::Result<(), LoadError> {
        let raster = RasterSource::from_raw_pixels(pixels, width, height)?;
        self.ingest(&raster);
        Ok(())
    }

    /// Synthesizes a linear gradient raster and ingests it as a normal image.
    pub fn load_gradient(&mut self, stops: &[ColorStop], angle_degrees: f32) {
        let raster = gradient::synthesize(stops, angle_degrees);
        self.ingest(&raster);
    }

    /// Begins continuous animation; the host should render a frame per
    /// display refresh while [`Engine::is_playing`] holds.
    pub fn start(&mut self) {
        if !self.disposed {
            self.playing = true;
        }
    }

    /// Halts the animation loop immediately; no further frames are expected.
    pub fn stop(&mut self) {
        self.playing = false;
        self.clock.pause();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Renders the next animation frame: joins finished loads, advances the
    /// smoothed logical clock, and draws.
    pub fn render_frame(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        self.poll_loads();
        let now = Instant::now();
        let t = if self.playing {
            self.clock.tick(now)
        } else {
            self.clock.time()
        };
        self.render_at(t, now)
    }

    /// Renders a single frame outside the animation loop, at the supplied
    /// logical time (or the clock's current value), without advancing time.
    pub fn render_once(
        &mut self,
        time: Option<f32>,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        self.poll_loads();
        let t = time.unwrap_or_else(|| self.clock.time());
        self.render_at(t, Instant::now())
    }

    /// Re-derives the full-resolution target from the new surface size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(size);
        }
    }

    /// Reconfigures the surface after a lost/outdated report.
    pub fn recover_surface(&mut self) {
        if let Some(gpu) = self.gpu.as_ref() {
            gpu.reconfigure_surface();
        }
    }

    /// Applies a partial option update, clamping each field.
    ///
    /// A change to the blur inputs (passes, tint) while an image is displayed
    /// re-runs the blur against the displayed slot in place — no crossfade
    /// starts. Everything else takes effect on the next frame.
    pub fn set_options(&mut self, update: &OptionsUpdate) {
        let previous = self.options.clone();
        self.options.apply(update);
        self.clock.set_target_speed(self.options.animation_speed);

        if previous.blur_inputs_differ(&self.options) {
            if let Some(gpu) = self.gpu.as_mut() {
                if gpu.has_image() {
                    debug!(
                        blur_passes = self.options.blur_passes,
                        tint_intensity = self.options.tint_intensity,
                        "blur inputs changed; reblurring in place"
                    );
                    gpu.reblur_in_place(&self.options);
                }
            }
        }
    }

    /// The fully resolved current parameter set.
    pub fn options(&self) -> EngineOptions {
        self.options.clone()
    }

    /// Whether an image has been ingested since construction.
    pub fn has_image(&self) -> bool {
        self.gpu.as_ref().is_some_and(GpuState::has_image)
    }

    /// Current output size in physical pixels.
    pub fn size(&self) -> Option<PhysicalSize<u32>> {
        self.gpu.as_ref().map(GpuState::size)
    }

    /// Releases all GPU resources and halts the loop. Idempotent; any load
    /// that resolves afterwards is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        // Stop first so no further frames touch resources mid-teardown.
        self.playing = false;
        self.disposed = true;
        if let Some(pending) = self.pending_load.take() {
            pending.resolve(Err(LoadError::Disposed));
        }
        self.gpu = None;
        info!("ambience engine disposed");
    }

    fn ingest(&mut self, raster: &RasterSource) {
        if self.disposed {
            return;
        }
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.blur_and_transition(raster, &self.options, Instant::now());
        }
    }

    fn render_at(
        &mut self,
        t: f32,
        now: Instant,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        match self.gpu.as_mut() {
            Some(gpu) => gpu.render(t, &self.options, now),
            None => Ok(()),
        }
    }
}
