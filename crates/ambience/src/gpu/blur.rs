use wgpu::util::DeviceExt;

use super::pipeline::{encode_pass, PassPrograms};
use super::targets::{RenderTarget, ALBUM_RESOLUTION};
use super::uniforms::{BlurParams, TintParams};

/// Tap-distance schedule for one blur chain: `(i + 0.5)` texels per Kawase
/// pass, then a zero-offset pass that copies the result out of the scratch
/// ping-pong into the destination slot.
pub(crate) fn kawase_offsets(passes: u32) -> Vec<f32> {
    let mut offsets: Vec<f32> = (0..passes).map(|index| index as f32 + 0.5).collect();
    offsets.push(0.0);
    offsets
}

/// Encodes the full blur chain: tint from the native-resolution source into
/// scratch A, `passes` Kawase passes ping-ponging the scratch pair, and the
/// copy-out pass into `destination`.
///
/// The blur uniform buffer is rewritten between passes with staging-buffer
/// copies on the encoder, so every pass inside the single submission sees its
/// own tap distance.
#[allow(clippy::too_many_arguments)]
pub(crate) fn encode_blur_chain(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    encoder: &mut wgpu::CommandEncoder,
    programs: &PassPrograms,
    tint_uniforms: &wgpu::BindGroup,
    blur_uniforms: &wgpu::BindGroup,
    tint_buffer: &wgpu::Buffer,
    blur_buffer: &wgpu::Buffer,
    source: &wgpu::BindGroup,
    scratch: &[RenderTarget; 2],
    destination: &wgpu::TextureView,
    tint: TintParams,
    passes: u32,
) {
    // The tint runs once per chain, so a plain queue write suffices; it is
    // ordered ahead of the submission that consumes it.
    queue.write_buffer(tint_buffer, 0, bytemuck::bytes_of(&tint));
    encode_pass(
        encoder,
        "tint pass",
        &programs.tint,
        tint_uniforms,
        source,
        &programs.quad_vertices,
        &scratch[0].view,
        wgpu::LoadOp::Clear(wgpu::Color::BLACK),
    );

    let texel = 1.0 / ALBUM_RESOLUTION as f32;
    for (index, offset) in kawase_offsets(passes).into_iter().enumerate() {
        let params = BlurParams {
            texel: [texel, texel],
            offset,
            _pad: 0.0,
        };
        let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("blur params staging"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(
            &staging,
            0,
            blur_buffer,
            0,
            std::mem::size_of::<BlurParams>() as u64,
        );

        let read = &scratch[index % 2];
        let is_copy_out = index as u32 == passes;
        let write = if is_copy_out {
            destination
        } else {
            &scratch[(index + 1) % 2].view
        };
        encode_pass(
            encoder,
            if is_copy_out { "blur copy-out pass" } else { "kawase pass" },
            &programs.blur,
            blur_uniforms,
            &read.bind_group,
            &programs.quad_vertices,
            write,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_grow_by_one_texel_per_pass() {
        let offsets = kawase_offsets(4);
        assert_eq!(offsets, vec![0.5, 1.5, 2.5, 3.5, 0.0]);
    }

    #[test]
    fn chain_always_ends_with_the_copy_out_pass() {
        for passes in [1, 7, 40] {
            let offsets = kawase_offsets(passes);
            assert_eq!(offsets.len() as u32, passes + 1);
            assert_eq!(*offsets.last().unwrap(), 0.0);
        }
    }

    #[test]
    fn single_pass_chain_still_blurs_once() {
        assert_eq!(kawase_offsets(1), vec![0.5, 0.0]);
    }
}
