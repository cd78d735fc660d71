use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::compile::{
    compile_fragment_shader, compile_vertex_shader, BLEND_FRAGMENT_GLSL, BLUR_FRAGMENT_GLSL,
    COMPOSITE_FRAGMENT_GLSL, TINT_FRAGMENT_GLSL, WARP_FRAGMENT_GLSL,
};

/// One corner of the shared full-screen quad.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

/// Full-screen quad as a triangle strip, with the texture-coordinate origin
/// at the top-left so rasters appear upright.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        uv: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        uv: [1.0, 0.0],
    },
];

/// Bind group layouts shared by every pass pipeline.
pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub single_texture_layout: wgpu::BindGroupLayout,
    pub dual_texture_layout: wgpu::BindGroupLayout,
}

impl PipelineLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pass uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let single_texture_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("single texture layout"),
                entries: &texture_layout_entries(1),
            });
        let dual_texture_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("dual texture layout"),
                entries: &texture_layout_entries(2),
            });

        Self {
            uniform_layout,
            single_texture_layout,
            dual_texture_layout,
        }
    }
}

fn texture_layout_entries(count: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(count as usize * 2);
    for index in 0..count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

/// The five pass programs, compiled and linked once at engine construction,
/// plus the shared quad geometry every pass draws.
pub(crate) struct PassPrograms {
    pub layouts: PipelineLayouts,
    pub quad_vertices: wgpu::Buffer,
    pub tint: wgpu::RenderPipeline,
    pub blur: wgpu::RenderPipeline,
    pub blend: wgpu::RenderPipeline,
    pub warp: wgpu::RenderPipeline,
    pub composite: wgpu::RenderPipeline,
}

impl PassPrograms {
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        offscreen_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let layouts = PipelineLayouts::new(device);
        let vertex_module = compile_vertex_shader(device)?;

        let quad_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tint = build_pipeline(
            device,
            "tint pipeline",
            &layouts,
            &layouts.single_texture_layout,
            &vertex_module,
            &compile_fragment_shader(device, "tint fragment", TINT_FRAGMENT_GLSL)?,
            offscreen_format,
        );
        let blur = build_pipeline(
            device,
            "blur pipeline",
            &layouts,
            &layouts.single_texture_layout,
            &vertex_module,
            &compile_fragment_shader(device, "blur fragment", BLUR_FRAGMENT_GLSL)?,
            offscreen_format,
        );
        let blend = build_pipeline(
            device,
            "blend pipeline",
            &layouts,
            &layouts.dual_texture_layout,
            &vertex_module,
            &compile_fragment_shader(device, "blend fragment", BLEND_FRAGMENT_GLSL)?,
            offscreen_format,
        );
        let warp = build_pipeline(
            device,
            "warp pipeline",
            &layouts,
            &layouts.single_texture_layout,
            &vertex_module,
            &compile_fragment_shader(device, "warp fragment", WARP_FRAGMENT_GLSL)?,
            offscreen_format,
        );
        let composite = build_pipeline(
            device,
            "composite pipeline",
            &layouts,
            &layouts.single_texture_layout,
            &vertex_module,
            &compile_fragment_shader(device, "composite fragment", COMPOSITE_FRAGMENT_GLSL)?,
            surface_format,
        );

        Ok(Self {
            layouts,
            quad_vertices,
            tint,
            blur,
            blend,
            warp,
            composite,
        })
    }
}

/// Encodes one full-screen pass: bind the pipeline and its two groups, draw
/// the shared quad into `target`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn encode_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    uniforms: &wgpu::BindGroup,
    textures: &wgpu::BindGroup,
    quad: &wgpu::Buffer,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, uniforms, &[]);
    pass.set_bind_group(1, textures, &[]);
    pass.set_vertex_buffer(0, quad.slice(..));
    pass.draw(0..4, 0..1);
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    layouts: &PipelineLayouts,
    texture_layout: &wgpu::BindGroupLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layouts.uniform_layout, texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 8,
                        shader_location: 1,
                    },
                ],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
