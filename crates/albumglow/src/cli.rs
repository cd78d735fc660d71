use std::path::PathBuf;
use std::time::Duration;

use ambience::{ColorStop, OptionsUpdate};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "albumglow",
    author,
    version,
    about = "Album-art ambience wallpaper",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Image files or URLs to display, in order.
    #[arg(value_name = "IMAGE")]
    pub images: Vec<String>,

    /// Rotate through the images described by a playlist TOML file.
    #[arg(long, value_name = "FILE")]
    pub playlist: Option<PathBuf>,

    /// Render a synthesized gradient instead of an image,
    /// e.g. `#0a1a2f,#804030` or `#000:0,#fff:0.7`.
    #[arg(long, value_name = "STOPS", value_parser = parse_gradient)]
    pub gradient: Option<GradientSpec>,

    /// Gradient axis angle in degrees (0 sweeps left to right).
    #[arg(long, value_name = "DEGREES", default_value_t = 0.0)]
    pub gradient_angle: f32,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Seconds each image stays up when several are given without a playlist.
    #[arg(long, value_name = "SECONDS", default_value_t = 30.0)]
    pub interval: f32,

    /// Shuffle the rotation order.
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for the shuffle order.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Domain-warp strength (0-1).
    #[arg(long, value_name = "AMOUNT")]
    pub warp: Option<f32>,

    /// Number of blur passes (1-40).
    #[arg(long, value_name = "COUNT")]
    pub blur_passes: Option<u32>,

    /// Animation speed multiplier (0.1-5).
    #[arg(long, value_name = "FACTOR")]
    pub speed: Option<f32>,

    /// Crossfade duration in milliseconds (0-5000).
    #[arg(long, value_name = "MILLISECONDS")]
    pub transition_ms: Option<u64>,

    /// Color saturation (0 grayscale, 1 neutral, up to 3).
    #[arg(long, value_name = "FACTOR")]
    pub saturation: Option<f32>,

    /// Tint color applied to dark regions (`#rrggbb`).
    #[arg(long, value_name = "#RRGGBB", value_parser = parse_hex_color)]
    pub tint: Option<[f32; 3]>,

    /// Tint strength (0-1).
    #[arg(long, value_name = "AMOUNT")]
    pub tint_strength: Option<f32>,

    /// Dither amplitude (0-0.1).
    #[arg(long, value_name = "AMOUNT")]
    pub dither: Option<f32>,

    /// Show a static frame instead of animating.
    #[arg(long)]
    pub paused: bool,
}

impl Cli {
    /// Collects the engine option flags into one patch.
    pub fn options_update(&self) -> OptionsUpdate {
        OptionsUpdate {
            warp_intensity: self.warp,
            blur_passes: self.blur_passes,
            animation_speed: self.speed,
            transition_duration: self.transition_ms.map(Duration::from_millis),
            saturation: self.saturation,
            tint_color: self.tint,
            tint_intensity: self.tint_strength,
            dithering: self.dither,
        }
    }
}

/// Parsed `--gradient` stop list.
#[derive(Debug, Clone)]
pub struct GradientSpec {
    pub stops: Vec<ColorStop>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((width, height))
}

fn parse_hex_color(value: &str) -> Result<[f32; 3], String> {
    let hex = value.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 3 {
        return Err(format!("expected #rrggbb or #rgb, got '{value}'"));
    }
    let expand = |component: &str| -> Result<f32, String> {
        let raw = if component.len() == 1 {
            format!("{component}{component}")
        } else {
            component.to_string()
        };
        u8::from_str_radix(&raw, 16)
            .map(|byte| byte as f32 / 255.0)
            .map_err(|_| format!("invalid hex color '{value}'"))
    };
    let step = hex.len() / 3;
    Ok([
        expand(&hex[0..step])?,
        expand(&hex[step..2 * step])?,
        expand(&hex[2 * step..3 * step])?,
    ])
}

/// Stops are comma-separated `#rrggbb` entries with an optional `:offset`
/// suffix; entries without an offset spread evenly along the axis.
fn parse_gradient(value: &str) -> Result<GradientSpec, String> {
    let entries: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return Err("gradient needs at least one color stop".to_string());
    }

    let mut stops = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let (color_part, offset_part) = match entry.rsplit_once(':') {
            Some((color, offset)) => (color, Some(offset)),
            None => (*entry, None),
        };
        let color = parse_hex_color(color_part)?;
        let offset = match offset_part {
            Some(raw) => raw
                .parse::<f32>()
                .map_err(|_| format!("invalid stop offset '{raw}'"))?,
            None if entries.len() == 1 => 0.0,
            None => index as f32 / (entries.len() - 1) as f32,
        };
        stops.push(ColorStop::new(offset, color));
    }
    Ok(GradientSpec { stops })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_width_by_height() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size("640X480").unwrap(), (640, 480));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
    }

    #[test]
    fn hex_colors_parse_in_long_and_short_form() {
        let color = parse_hex_color("#ff8000").unwrap();
        assert!((color[0] - 1.0).abs() < 1e-6);
        assert!((color[1] - 128.0 / 255.0).abs() < 1e-6);
        assert!(color[2].abs() < 1e-6);

        let short = parse_hex_color("#f80").unwrap();
        assert!((short[0] - 1.0).abs() < 1e-6);
        assert!(parse_hex_color("#12345").is_err());
    }

    #[test]
    fn gradient_spreads_unoffsetted_stops_evenly() {
        let spec = parse_gradient("#000,#888,#fff").unwrap();
        assert_eq!(spec.stops.len(), 3);
        assert_eq!(spec.stops[0].offset, 0.0);
        assert_eq!(spec.stops[1].offset, 0.5);
        assert_eq!(spec.stops[2].offset, 1.0);
    }

    #[test]
    fn gradient_honours_explicit_offsets() {
        let spec = parse_gradient("#000:0,#fff:0.7").unwrap();
        assert_eq!(spec.stops[1].offset, 0.7);
    }

    #[test]
    fn option_flags_collect_into_a_patch() {
        let cli = Cli::parse_from([
            "albumglow",
            "cover.jpg",
            "--warp",
            "0.3",
            "--transition-ms",
            "800",
        ]);
        let update = cli.options_update();
        assert_eq!(update.warp_intensity, Some(0.3));
        assert_eq!(update.transition_duration, Some(Duration::from_millis(800)));
        assert_eq!(update.blur_passes, None);
    }
}
