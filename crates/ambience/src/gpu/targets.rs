use winit::dpi::PhysicalSize;

use super::pipeline::PipelineLayouts;

/// Fixed edge length of the small blur/album targets.
pub(crate) const ALBUM_RESOLUTION: u32 = 128;

/// Offscreen pixel format. The extra precision keeps repeated blur and blend
/// passes from banding before the final dither.
pub(crate) const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// One offscreen color target that later passes re-sample.
pub(crate) struct RenderTarget {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

impl RenderTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.single_texture_layout,
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

        Self {
            _texture: texture,
            view,
            sampler,
            bind_group,
        }
    }

    fn small(device: &wgpu::Device, layouts: &PipelineLayouts, label: &str) -> Self {
        Self::new(
            device,
            layouts,
            PhysicalSize::new(ALBUM_RESOLUTION, ALBUM_RESOLUTION),
            label,
        )
    }
}

/// The two blurred-album slots, addressed through a single index.
///
/// `next` always names the most recently blurred image; the other slot holds
/// whatever was displayed before. Promoting a new image is an index flip plus
/// a blur into the freed slot — no pixels move and no targets are allocated,
/// however many images are ingested.
pub(crate) struct AlbumSlots {
    slots: [RenderTarget; 2],
    blend_pairs: [wgpu::BindGroup; 2],
    next: usize,
}

impl AlbumSlots {
    pub(crate) fn new(device: &wgpu::Device, layouts: &PipelineLayouts) -> Self {
        let slots = [
            RenderTarget::small(device, layouts, "album slot 0"),
            RenderTarget::small(device, layouts, "album slot 1"),
        ];
        // Both (current, next) orderings are prepared up front so a swap
        // never creates GPU resources.
        let blend_pairs = [
            blend_pair(device, layouts, &slots[1], &slots[0], "album blend pair 0"),
            blend_pair(device, layouts, &slots[0], &slots[1], "album blend pair 1"),
        ];
        Self {
            slots,
            blend_pairs,
            next: 0,
        }
    }

    /// The slot holding the most recent blurred image.
    pub(crate) fn next(&self) -> &RenderTarget {
        &self.slots[self.next]
    }

    /// Retires the previous "next" to "current" and frees the other slot for
    /// the incoming blur.
    pub(crate) fn swap(&mut self) {
        self.next = 1 - self.next;
    }

    /// Dual-texture bind group ordered (current, next) for the blend pass.
    pub(crate) fn blend_bind_group(&self) -> &wgpu::BindGroup {
        &self.blend_pairs[self.next]
    }

    /// Views of both slots, for construction-time clears.
    pub(crate) fn views(&self) -> [&wgpu::TextureView; 2] {
        [&self.slots[0].view, &self.slots[1].view]
    }
}

fn blend_pair(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    current: &RenderTarget,
    next: &RenderTarget,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.dual_texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&current.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&current.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&next.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&next.sampler),
            },
        ],
    })
}
