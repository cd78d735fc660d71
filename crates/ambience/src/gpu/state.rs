use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use winit::dpi::PhysicalSize;

use crate::options::EngineOptions;
use crate::source::RasterSource;

use super::blur::encode_blur_chain;
use super::context::GpuContext;
use super::pipeline::{encode_pass, PassPrograms};
use super::targets::{AlbumSlots, RenderTarget, ALBUM_RESOLUTION, OFFSCREEN_FORMAT};
use super::transition::Transition;
use super::uniforms::{BlendParams, BlurParams, CompositeParams, TintParams, WarpParams};

/// Uploaded copy of the most recent raster, at its native resolution.
///
/// Reused across ingests whenever the dimensions match; recreated otherwise.
struct SourceTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// One uniform buffer plus the bind group exposing it to a pass.
struct PassUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PassUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: u64, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// All GPU-side state of one engine: context, the five programs, the fixed
/// target pool, the uploaded source, and the crossfade machine.
///
/// Everything here is created at construction and mutated only from the
/// rendering thread; dropping the struct releases every GPU object.
pub(crate) struct GpuState {
    context: GpuContext,
    programs: PassPrograms,
    scratch: [RenderTarget; 2],
    albums: AlbumSlots,
    full_res: RenderTarget,
    source: Option<SourceTexture>,
    transition: Transition,
    tint: PassUniforms,
    blur: PassUniforms,
    blend: PassUniforms,
    warp: PassUniforms,
    composite: PassUniforms,
    last_fps_update: Instant,
    frames_since_last_update: u32,
    frames_per_second: f32,
}

impl GpuState {
    pub(crate) fn new<T>(target: &T, initial_size: PhysicalSize<u32>) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let programs = PassPrograms::new(&context.device, context.surface_format, OFFSCREEN_FORMAT)?;

        let scratch = [
            RenderTarget::new(
                &context.device,
                &programs.layouts,
                small_extent(),
                "blur scratch A",
            ),
            RenderTarget::new(
                &context.device,
                &programs.layouts,
                small_extent(),
                "blur scratch B",
            ),
        ];
        let albums = AlbumSlots::new(&context.device, &programs.layouts);
        let full_res = RenderTarget::new(
            &context.device,
            &programs.layouts,
            context.size,
            "full-res target",
        );

        let uniform_layout = &programs.layouts.uniform_layout;
        let tint = PassUniforms::new(
            &context.device,
            uniform_layout,
            std::mem::size_of::<TintParams>() as u64,
            "tint params",
        );
        let blur = PassUniforms::new(
            &context.device,
            uniform_layout,
            std::mem::size_of::<BlurParams>() as u64,
            "blur params",
        );
        let blend = PassUniforms::new(
            &context.device,
            uniform_layout,
            std::mem::size_of::<BlendParams>() as u64,
            "blend params",
        );
        let warp = PassUniforms::new(
            &context.device,
            uniform_layout,
            std::mem::size_of::<WarpParams>() as u64,
            "warp params",
        );
        let composite = PassUniforms::new(
            &context.device,
            uniform_layout,
            std::mem::size_of::<CompositeParams>() as u64,
            "composite params",
        );

        let state = Self {
            context,
            programs,
            scratch,
            albums,
            full_res,
            source: None,
            transition: Transition::new(),
            tint,
            blur,
            blend,
            warp,
            composite,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
            frames_per_second: 60.0,
        };
        state.clear_offscreen_targets();
        Ok(state)
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        // Only the full-resolution target tracks the surface; the small
        // targets never change size.
        self.full_res = RenderTarget::new(
            &self.context.device,
            &self.programs.layouts,
            new_size,
            "full-res target",
        );
    }

    pub(crate) fn reconfigure_surface(&self) {
        self.context.reconfigure();
    }

    /// Ingests a new image: upload, swap the album slots, blur into the freed
    /// slot, and start a crossfade. The blur submission completes before this
    /// returns, so no frame can observe a half-written album.
    pub(crate) fn blur_and_transition(
        &mut self,
        raster: &RasterSource,
        options: &EngineOptions,
        now: Instant,
    ) {
        self.upload_source(raster);
        self.albums.swap();
        self.run_blur(options);
        self.transition.begin(now, options.transition_duration);
    }

    /// Re-runs the blur chain against the retained source, writing the
    /// displayed slot in place. No slot swap, no transition.
    pub(crate) fn reblur_in_place(&mut self, options: &EngineOptions) {
        if self.source.is_none() {
            return;
        }
        self.run_blur(options);
    }

    /// Renders one frame at logical time `t` and presents it.
    pub(crate) fn render(
        &mut self,
        t: f32,
        options: &EngineOptions,
        now: Instant,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.frames_since_last_update += 1;
        let since_fps_update = now.saturating_duration_since(self.last_fps_update);
        if since_fps_update >= Duration::from_secs(1) {
            self.frames_per_second =
                self.frames_since_last_update as f32 / since_fps_update.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                time = t,
                transitioning = self.transition.is_active(),
                "render stats"
            );
        }

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        if self.source.is_none() {
            // Nothing ingested yet: present plain black.
            clear_view(&mut encoder, &view);
            self.context.queue.submit(std::iter::once(encoder.finish()));
            frame.present();
            return Ok(());
        }

        let blend_factor = self.transition.blend_factor(now);

        // Steady state serves straight from the freshest album slot; the
        // small-res blend runs only while a crossfade is in flight.
        let warp_input = if blend_factor < 1.0 {
            self.context.queue.write_buffer(
                &self.blend.buffer,
                0,
                bytemuck::bytes_of(&BlendParams {
                    blend_factor,
                    _pad0: 0.0,
                    _pad1: [0.0; 2],
                }),
            );
            encode_pass(
                &mut encoder,
                "album blend pass",
                &self.programs.blend,
                &self.blend.bind_group,
                self.albums.blend_bind_group(),
                &self.programs.quad_vertices,
                &self.scratch[0].view,
                wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            );
            &self.scratch[0].bind_group
        } else {
            &self.albums.next().bind_group
        };

        self.context.queue.write_buffer(
            &self.warp.buffer,
            0,
            bytemuck::bytes_of(&WarpParams {
                time: t,
                intensity: options.warp_intensity,
                _pad: [0.0; 2],
            }),
        );
        encode_pass(
            &mut encoder,
            "domain warp pass",
            &self.programs.warp,
            &self.warp.bind_group,
            warp_input,
            &self.programs.quad_vertices,
            &self.full_res.view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );

        self.context.queue.write_buffer(
            &self.composite.buffer,
            0,
            bytemuck::bytes_of(&CompositeParams {
                resolution: [self.context.size.width as f32, self.context.size.height as f32],
                time: t,
                saturation: options.saturation,
                dithering: options.dithering,
                _pad0: 0.0,
                _pad1: [0.0; 2],
            }),
        );
        encode_pass(
            &mut encoder,
            "composite pass",
            &self.programs.composite,
            &self.composite.bind_group,
            &self.full_res.bind_group,
            &self.programs.quad_vertices,
            &view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn run_blur(&mut self, options: &EngineOptions) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("blur encoder"),
                });
        encode_blur_chain(
            &self.context.device,
            &self.context.queue,
            &mut encoder,
            &self.programs,
            &self.tint.bind_group,
            &self.blur.bind_group,
            &self.tint.buffer,
            &self.blur.buffer,
            &source.bind_group,
            &self.scratch,
            &self.albums.next().view,
            TintParams {
                tint_color: options.tint_color,
                intensity: options.tint_intensity,
            },
            options.blur_passes,
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    fn upload_source(&mut self, raster: &RasterSource) {
        let needs_new_texture = !matches!(
            &self.source,
            Some(existing) if existing.width == raster.width && existing.height == raster.height
        );
        if needs_new_texture {
            debug!(
                width = raster.width,
                height = raster.height,
                "allocating source texture"
            );
            let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("source image"),
                size: wgpu::Extent3d {
                    width: raster.width,
                    height: raster.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = self.context.device.create_sampler(&wgpu::SamplerDescriptor {
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            });
            let bind_group = self
                .context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("source image"),
                    layout: &self.programs.layouts.single_texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });
            self.source = Some(SourceTexture {
                texture,
                bind_group,
                width: raster.width,
                height: raster.height,
            });
        }

        let source = self.source.as_ref().expect("source texture just ensured");
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &raster.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(raster.width * 4),
                rows_per_image: Some(raster.height),
            },
            wgpu::Extent3d {
                width: raster.width,
                height: raster.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Clears every offscreen target once at construction so the first
    /// crossfade fades up from black instead of sampling undefined memory.
    fn clear_offscreen_targets(&self) {
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("target clear encoder"),
                });
        for view in self.albums.views() {
            clear_view(&mut encoder, view);
        }
        clear_view(&mut encoder, &self.full_res.view);
        for target in &self.scratch {
            clear_view(&mut encoder, &target.view);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn clear_view(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}

fn small_extent() -> PhysicalSize<u32> {
    PhysicalSize::new(ALBUM_RESOLUTION, ALBUM_RESOLUTION)
}
