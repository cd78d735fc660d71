use bytemuck::{Pod, Zeroable};

/// Parameter block for the tint pass; layout mirrors `TintParams` in the
/// shader (vec3 + float packs into one 16-byte std140 row).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct TintParams {
    pub tint_color: [f32; 3],
    pub intensity: f32,
}

/// Parameter block for one Kawase pass. `offset` carries the full tap
/// distance in texels; the copy-out pass sets it to zero.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct BlurParams {
    pub texel: [f32; 2],
    pub offset: f32,
    pub _pad: f32,
}

/// Parameter block for the crossfade blend pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct BlendParams {
    pub blend_factor: f32,
    pub _pad0: f32,
    pub _pad1: [f32; 2],
}

/// Parameter block for the domain-warp pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct WarpParams {
    pub time: f32,
    pub intensity: f32,
    pub _pad: [f32; 2],
}

/// Parameter block for the output composite pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct CompositeParams {
    pub resolution: [f32; 2],
    pub time: f32,
    pub saturation: f32,
    pub dithering: f32,
    pub _pad0: f32,
    pub _pad1: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_match_their_std140_sizes() {
        assert_eq!(std::mem::size_of::<TintParams>(), 16);
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
        assert_eq!(std::mem::size_of::<BlendParams>(), 16);
        assert_eq!(std::mem::size_of::<WarpParams>(), 16);
        assert_eq!(std::mem::size_of::<CompositeParams>(), 32);
    }
}
