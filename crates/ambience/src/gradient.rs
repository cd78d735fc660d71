use crate::source::RasterSource;

/// Edge length of synthesized gradient rasters.
const GRADIENT_SIZE: u32 = 256;

/// One stop of a linear gradient, at a normalized offset along the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient axis, clamped to [0, 1].
    pub offset: f32,
    /// Stop color, each channel in [0, 1].
    pub color: [f32; 3],
}

impl ColorStop {
    pub fn new(offset: f32, color: [f32; 3]) -> Self {
        Self { offset, color }
    }
}

/// Synthesizes a square RGBA8 raster for a linear gradient.
///
/// The gradient axis is rotated by `angle_degrees` (0 sweeps left→right,
/// 90 sweeps top→bottom). Pixels are projected onto the axis and the
/// projection normalized so the stops span the full raster corner to corner.
/// An empty stop list yields a black raster; a single stop a solid fill.
pub(crate) fn synthesize(stops: &[ColorStop], angle_degrees: f32) -> RasterSource {
    let mut sorted: Vec<ColorStop> = stops
        .iter()
        .map(|stop| ColorStop {
            offset: stop.offset.clamp(0.0, 1.0),
            color: [
                stop.color[0].clamp(0.0, 1.0),
                stop.color[1].clamp(0.0, 1.0),
                stop.color[2].clamp(0.0, 1.0),
            ],
        })
        .collect();
    sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let radians = angle_degrees.to_radians();
    let direction = (radians.cos(), radians.sin());
    // Normalizing by the L1 extent maps the square's extreme corners to
    // exactly 0 and 1 for any angle.
    let extent = direction.0.abs() + direction.1.abs();

    let size = GRADIENT_SIZE as usize;
    let mut pixels = vec![0u8; size * size * 4];
    for y in 0..size {
        let v = (y as f32 + 0.5) / GRADIENT_SIZE as f32 - 0.5;
        for x in 0..size {
            let u = (x as f32 + 0.5) / GRADIENT_SIZE as f32 - 0.5;
            let t = if extent > f32::EPSILON {
                (u * direction.0 + v * direction.1) / extent + 0.5
            } else {
                0.5
            };
            let color = sample_stops(&sorted, t.clamp(0.0, 1.0));
            let index = (y * size + x) * 4;
            pixels[index] = (color[0] * 255.0 + 0.5) as u8;
            pixels[index + 1] = (color[1] * 255.0 + 0.5) as u8;
            pixels[index + 2] = (color[2] * 255.0 + 0.5) as u8;
            pixels[index + 3] = 255;
        }
    }

    RasterSource {
        pixels,
        width: GRADIENT_SIZE,
        height: GRADIENT_SIZE,
    }
}

fn sample_stops(stops: &[ColorStop], t: f32) -> [f32; 3] {
    match stops {
        [] => [0.0, 0.0, 0.0],
        [only] => only.color,
        _ => {
            if t <= stops[0].offset {
                return stops[0].color;
            }
            if let Some(last) = stops.last() {
                if t >= last.offset {
                    return last.color;
                }
            }
            for pair in stops.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if t >= a.offset && t <= b.offset {
                    let span = (b.offset - a.offset).max(f32::EPSILON);
                    let mix = (t - a.offset) / span;
                    return [
                        a.color[0] + (b.color[0] - a.color[0]) * mix,
                        a.color[1] + (b.color[1] - a.color[1]) * mix,
                        a.color[2] + (b.color[2] - a.color[2]) * mix,
                    ];
                }
            }
            stops[stops.len() - 1].color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(raster: &RasterSource, x: u32, y: u32) -> [u8; 4] {
        let index = ((y * raster.width + x) * 4) as usize;
        let px = &raster.pixels[index..index + 4];
        [px[0], px[1], px[2], px[3]]
    }

    #[test]
    fn output_is_square_opaque_rgba() {
        let raster = synthesize(&[ColorStop::new(0.0, [1.0, 0.0, 0.0])], 0.0);
        assert_eq!(raster.width, raster.height);
        assert_eq!(
            raster.pixels.len(),
            (raster.width * raster.height * 4) as usize
        );
        assert_eq!(pixel(&raster, 10, 10)[3], 255);
    }

    #[test]
    fn horizontal_gradient_sweeps_left_to_right() {
        let stops = [
            ColorStop::new(0.0, [0.0, 0.0, 0.0]),
            ColorStop::new(1.0, [1.0, 1.0, 1.0]),
        ];
        let raster = synthesize(&stops, 0.0);
        let mid = raster.height / 2;
        let left = pixel(&raster, 0, mid)[0];
        let right = pixel(&raster, raster.width - 1, mid)[0];
        assert!(left < 8, "left edge should be near black, got {left}");
        assert!(right > 247, "right edge should be near white, got {right}");
    }

    #[test]
    fn vertical_gradient_sweeps_top_to_bottom() {
        let stops = [
            ColorStop::new(0.0, [0.0, 0.0, 0.0]),
            ColorStop::new(1.0, [0.0, 1.0, 0.0]),
        ];
        let raster = synthesize(&stops, 90.0);
        let mid = raster.width / 2;
        let top = pixel(&raster, mid, 0)[1];
        let bottom = pixel(&raster, mid, raster.height - 1)[1];
        assert!(top < 8);
        assert!(bottom > 247);
    }

    #[test]
    fn middle_stop_is_hit_at_its_offset() {
        let stops = [
            ColorStop::new(0.0, [0.0, 0.0, 0.0]),
            ColorStop::new(0.5, [1.0, 0.0, 0.0]),
            ColorStop::new(1.0, [0.0, 0.0, 0.0]),
        ];
        let raster = synthesize(&stops, 0.0);
        let center = pixel(&raster, raster.width / 2, raster.height / 2);
        assert!(center[0] > 247, "center red = {}", center[0]);
        assert!(center[1] < 8);
    }

    #[test]
    fn unsorted_stops_are_ordered_before_sampling() {
        let stops = [
            ColorStop::new(1.0, [1.0, 1.0, 1.0]),
            ColorStop::new(0.0, [0.0, 0.0, 0.0]),
        ];
        let raster = synthesize(&stops, 0.0);
        assert!(pixel(&raster, 0, 128)[0] < 8);
    }

    #[test]
    fn empty_stop_list_yields_black() {
        let raster = synthesize(&[], 45.0);
        assert_eq!(pixel(&raster, 100, 100), [0, 0, 0, 255]);
    }
}
