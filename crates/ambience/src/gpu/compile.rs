use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

/// Compiles the shared full-screen quad vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(QUAD_VERTEX_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }))
}

/// Compiles one of the fixed fragment programs through naga's GLSL frontend.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Full-screen quad vertex shader; positions and texture coordinates come in
/// through the shared vertex buffer.
const QUAD_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 uv;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = uv;
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Tint pass: pulls dark regions of the source toward the tint color.
///
/// Also serves as the native-resolution to small-target downsample pass, so
/// it runs at the head of every blur chain even when the intensity is zero
/// (the mix is then an identity).
pub(crate) const TINT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform TintParams {
    vec3 tint_color;
    float intensity;
} params;

layout(set = 1, binding = 0) uniform texture2D source_texture;
layout(set = 1, binding = 1) uniform sampler source_sampler;

void main() {
    vec4 color = texture(sampler2D(source_texture, source_sampler), v_uv);
    float luma = dot(color.rgb, vec3(0.299, 0.587, 0.114));
    float darkness = 1.0 - smoothstep(0.0, 0.5, luma);
    vec3 tinted = mix(color.rgb, params.tint_color, darkness * params.intensity);
    outColor = vec4(tinted, 1.0);
}
";

/// One Kawase pass: four diagonal taps at `offset` texels, averaged.
///
/// An offset of zero collapses the four taps onto the texel center, which
/// makes the same program double as the copy-out pass of the blur chain.
pub(crate) const BLUR_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform BlurParams {
    vec2 texel;
    float offset;
    float _pad;
} params;

layout(set = 1, binding = 0) uniform texture2D source_texture;
layout(set = 1, binding = 1) uniform sampler source_sampler;

void main() {
    vec2 d = params.texel * params.offset;
    vec4 sum = texture(sampler2D(source_texture, source_sampler), v_uv + vec2(d.x, d.y))
        + texture(sampler2D(source_texture, source_sampler), v_uv + vec2(-d.x, d.y))
        + texture(sampler2D(source_texture, source_sampler), v_uv + vec2(d.x, -d.y))
        + texture(sampler2D(source_texture, source_sampler), v_uv + vec2(-d.x, -d.y));
    outColor = sum * 0.25;
}
";

/// Crossfade pass: linear blend of the current and next album targets.
pub(crate) const BLEND_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform BlendParams {
    float blend_factor;
    float _pad0;
    vec2 _pad1;
} params;

layout(set = 1, binding = 0) uniform texture2D current_texture;
layout(set = 1, binding = 1) uniform sampler current_sampler;
layout(set = 1, binding = 2) uniform texture2D next_texture;
layout(set = 1, binding = 3) uniform sampler next_sampler;

void main() {
    vec4 current = texture(sampler2D(current_texture, current_sampler), v_uv);
    vec4 next = texture(sampler2D(next_texture, next_sampler), v_uv);
    outColor = mix(current, next, params.blend_factor);
}
";

/// Domain-warp pass: displaces the sample coordinate by two octaves of
/// simplex noise before sampling the small album texture at full resolution.
///
/// The radial falloff pins the edges so motion stays concentrated centrally,
/// and the clamp keeps displaced coordinates inside the texture.
pub(crate) const WARP_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform WarpParams {
    float time;
    float intensity;
    vec2 _pad;
} params;

layout(set = 1, binding = 0) uniform texture2D album_texture;
layout(set = 1, binding = 1) uniform sampler album_sampler;

vec3 permute(vec3 x) {
    return mod(((x * 34.0) + 1.0) * x, 289.0);
}

float snoise(vec2 v) {
    vec4 C = vec4(0.211324865405187, 0.366025403784439,
                  -0.577350269189626, 0.024390243902439);
    vec2 i = floor(v + dot(v, C.yy));
    vec2 x0 = v - i + dot(i, C.xx);
    vec2 i1 = vec2(0.0, 1.0);
    if (x0.x > x0.y) {
        i1 = vec2(1.0, 0.0);
    }
    vec2 x1 = x0 - i1 + C.xx;
    vec2 x2 = x0 + C.zz;
    i = mod(i, 289.0);
    vec3 p = permute(permute(i.y + vec3(0.0, i1.y, 1.0)) + i.x + vec3(0.0, i1.x, 1.0));
    vec3 m = max(0.5 - vec3(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3(0.0));
    m = m * m;
    m = m * m;
    vec3 x = 2.0 * fract(p * C.www) - 1.0;
    vec3 h = abs(x) - 0.5;
    vec3 ox = floor(x + 0.5);
    vec3 a0 = x - ox;
    m = m * (1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h));
    vec3 g = vec3(a0.x * x0.x + h.x * x0.y,
                  a0.y * x1.x + h.y * x1.y,
                  a0.z * x2.x + h.z * x2.y);
    return 130.0 * dot(m, g);
}

float warp_field(vec2 p, float t) {
    float large = snoise(p * 0.35 + vec2(t * 0.031, -t * 0.017));
    float medium = snoise(p * 0.9 + vec2(-t * 0.023, t * 0.041));
    return large * 0.65 + medium * 0.35;
}

void main() {
    vec2 centered = v_uv - vec2(0.5);
    float radius = length(centered) * 2.0;
    float falloff = 1.0 - smoothstep(0.0, 0.7, radius);
    float dx = warp_field(v_uv + vec2(0.0, 17.3), params.time);
    float dy = warp_field(v_uv + vec2(43.1, 0.0), params.time * 1.09);
    vec2 warped = v_uv + vec2(dx, dy) * falloff * params.intensity;
    warped = clamp(warped, vec2(0.0), vec2(1.0));
    outColor = texture(sampler2D(album_texture, album_sampler), warped);
}
";

/// Output composite: vignette, saturation grading, and time-bucketed dither.
pub(crate) const COMPOSITE_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform CompositeParams {
    vec2 resolution;
    float time;
    float saturation;
    float dithering;
    float _pad0;
    vec2 _pad1;
} params;

layout(set = 1, binding = 0) uniform texture2D frame_texture;
layout(set = 1, binding = 1) uniform sampler frame_sampler;

float hash(vec2 p, float seed) {
    return fract(sin(dot(p, vec2(12.9898, 78.233)) + seed * 0.618) * 43758.5453);
}

void main() {
    vec3 color = texture(sampler2D(frame_texture, frame_sampler), v_uv).rgb;

    vec2 centered = v_uv - vec2(0.5);
    float r2 = dot(centered, centered) * 4.0;
    color = color * (1.0 - 0.3 * r2);

    float luma = dot(color, vec3(0.299, 0.587, 0.114));
    color = mix(vec3(luma), color, params.saturation);

    float bucket = floor(params.time * 60.0);
    float grain = hash(v_uv * params.resolution, bucket) - 0.5;
    color = color + grain * params.dithering;

    outColor = vec4(color, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_passes_use_bt601_weights() {
        for source in [TINT_FRAGMENT_GLSL, COMPOSITE_FRAGMENT_GLSL] {
            assert!(source.contains("vec3(0.299, 0.587, 0.114)"));
        }
    }

    #[test]
    fn tint_mask_spans_luma_zero_to_half() {
        assert!(TINT_FRAGMENT_GLSL.contains("smoothstep(0.0, 0.5, luma)"));
    }

    #[test]
    fn blur_averages_four_diagonal_taps() {
        assert_eq!(BLUR_FRAGMENT_GLSL.matches("texture(sampler2D").count(), 4);
        assert!(BLUR_FRAGMENT_GLSL.contains("sum * 0.25"));
    }

    #[test]
    fn warp_combines_two_weighted_octaves_with_edge_falloff() {
        assert!(WARP_FRAGMENT_GLSL.contains("p * 0.35"));
        assert!(WARP_FRAGMENT_GLSL.contains("p * 0.9"));
        assert!(WARP_FRAGMENT_GLSL.contains("large * 0.65 + medium * 0.35"));
        assert!(WARP_FRAGMENT_GLSL.contains("smoothstep(0.0, 0.7, radius)"));
        assert!(WARP_FRAGMENT_GLSL.contains("clamp(warped, vec2(0.0), vec2(1.0))"));
    }

    #[test]
    fn composite_applies_vignette_then_saturation_then_dither() {
        assert!(COMPOSITE_FRAGMENT_GLSL.contains("1.0 - 0.3 * r2"));
        assert!(COMPOSITE_FRAGMENT_GLSL.contains("mix(vec3(luma), color, params.saturation)"));
        assert!(COMPOSITE_FRAGMENT_GLSL.contains("floor(params.time * 60.0)"));
        let vignette = COMPOSITE_FRAGMENT_GLSL.find("0.3 * r2").unwrap();
        let saturation = COMPOSITE_FRAGMENT_GLSL.find("params.saturation").unwrap();
        let dither = COMPOSITE_FRAGMENT_GLSL.find("params.dithering").unwrap();
        assert!(vignette < saturation && saturation < dither);
    }
}
