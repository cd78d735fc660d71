use std::time::Duration;

/// Allowed range for [`EngineOptions::warp_intensity`].
pub const WARP_INTENSITY_RANGE: (f32, f32) = (0.0, 1.0);
/// Allowed range for [`EngineOptions::blur_passes`].
pub const BLUR_PASSES_RANGE: (u32, u32) = (1, 40);
/// Allowed range for [`EngineOptions::animation_speed`].
pub const ANIMATION_SPEED_RANGE: (f32, f32) = (0.1, 5.0);
/// Allowed range for [`EngineOptions::transition_duration`], in milliseconds.
pub const TRANSITION_MS_RANGE: (u64, u64) = (0, 5000);
/// Allowed range for [`EngineOptions::saturation`].
pub const SATURATION_RANGE: (f32, f32) = (0.0, 3.0);
/// Allowed range for [`EngineOptions::tint_intensity`].
pub const TINT_INTENSITY_RANGE: (f32, f32) = (0.0, 1.0);
/// Allowed range for [`EngineOptions::dithering`].
pub const DITHERING_RANGE: (f32, f32) = (0.0, 0.1);

/// Resolved parameter set driving the ambience render recipe.
///
/// Every field is kept inside its documented range: constructors and
/// [`EngineOptions::clamped`] pull out-of-range values back to the nearest
/// boundary instead of rejecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Strength of the noise-driven domain warp applied every frame.
    pub warp_intensity: f32,
    /// Number of Kawase passes run when an image is (re)blurred.
    pub blur_passes: u32,
    /// Target logical-time speed; the running speed eases toward it.
    pub animation_speed: f32,
    /// Crossfade length used when a new image finishes blurring.
    pub transition_duration: Duration,
    /// Color intensity of the composite; 1 is neutral, 0 grayscale.
    pub saturation: f32,
    /// Color that dark regions of the source are pulled toward.
    pub tint_color: [f32; 3],
    /// How strongly the darkness tint is applied; 0 disables it.
    pub tint_intensity: f32,
    /// Amplitude of the banding-masking dither in the final composite.
    pub dithering: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            warp_intensity: 0.12,
            blur_passes: 8,
            animation_speed: 1.0,
            transition_duration: Duration::from_millis(1200),
            saturation: 1.0,
            tint_color: [0.0, 0.0, 0.0],
            tint_intensity: 0.0,
            dithering: 0.02,
        }
    }
}

impl EngineOptions {
    /// Returns a copy with every field clamped to its documented range.
    pub fn clamped(&self) -> Self {
        Self {
            warp_intensity: clamp_f32(self.warp_intensity, WARP_INTENSITY_RANGE),
            blur_passes: self
                .blur_passes
                .clamp(BLUR_PASSES_RANGE.0, BLUR_PASSES_RANGE.1),
            animation_speed: clamp_f32(self.animation_speed, ANIMATION_SPEED_RANGE),
            transition_duration: clamp_duration(self.transition_duration, TRANSITION_MS_RANGE),
            saturation: clamp_f32(self.saturation, SATURATION_RANGE),
            tint_color: [
                self.tint_color[0].clamp(0.0, 1.0),
                self.tint_color[1].clamp(0.0, 1.0),
                self.tint_color[2].clamp(0.0, 1.0),
            ],
            tint_intensity: clamp_f32(self.tint_intensity, TINT_INTENSITY_RANGE),
            dithering: clamp_f32(self.dithering, DITHERING_RANGE),
        }
    }

    /// Applies a partial update, clamping each supplied field.
    pub fn apply(&mut self, update: &OptionsUpdate) {
        if let Some(value) = update.warp_intensity {
            self.warp_intensity = value;
        }
        if let Some(value) = update.blur_passes {
            self.blur_passes = value;
        }
        if let Some(value) = update.animation_speed {
            self.animation_speed = value;
        }
        if let Some(value) = update.transition_duration {
            self.transition_duration = value;
        }
        if let Some(value) = update.saturation {
            self.saturation = value;
        }
        if let Some(value) = update.tint_color {
            self.tint_color = value;
        }
        if let Some(value) = update.tint_intensity {
            self.tint_intensity = value;
        }
        if let Some(value) = update.dithering {
            self.dithering = value;
        }
        *self = self.clamped();
    }

    /// True when `other` differs in any field that feeds the blur chain.
    ///
    /// These are the fields whose change requires re-running the blur
    /// pipeline against the displayed album slot.
    pub(crate) fn blur_inputs_differ(&self, other: &EngineOptions) -> bool {
        self.blur_passes != other.blur_passes
            || self.tint_color != other.tint_color
            || self.tint_intensity != other.tint_intensity
    }
}

/// Partial option patch; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsUpdate {
    pub warp_intensity: Option<f32>,
    pub blur_passes: Option<u32>,
    pub animation_speed: Option<f32>,
    pub transition_duration: Option<Duration>,
    pub saturation: Option<f32>,
    pub tint_color: Option<[f32; 3]>,
    pub tint_intensity: Option<f32>,
    pub dithering: Option<f32>,
}

fn clamp_f32(value: f32, range: (f32, f32)) -> f32 {
    if value.is_nan() {
        return range.0;
    }
    value.clamp(range.0, range.1)
}

fn clamp_duration(value: Duration, range_ms: (u64, u64)) -> Duration {
    let millis = value.as_millis().min(u128::from(u64::MAX)) as u64;
    Duration::from_millis(millis.clamp(range_ms.0, range_ms.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_in_range() {
        let options = EngineOptions::default();
        assert_eq!(options, options.clamped());
    }

    #[test]
    fn out_of_range_values_clamp_to_boundaries() {
        let options = EngineOptions {
            warp_intensity: -5.0,
            blur_passes: 999,
            animation_speed: 80.0,
            transition_duration: Duration::from_secs(60),
            saturation: -1.0,
            tint_color: [2.0, -0.5, 0.4],
            tint_intensity: 7.0,
            dithering: 1.0,
        }
        .clamped();

        assert_eq!(options.warp_intensity, 0.0);
        assert_eq!(options.blur_passes, 40);
        assert_eq!(options.animation_speed, 5.0);
        assert_eq!(options.transition_duration, Duration::from_millis(5000));
        assert_eq!(options.saturation, 0.0);
        assert_eq!(options.tint_color, [1.0, 0.0, 0.4]);
        assert_eq!(options.tint_intensity, 1.0);
        assert_eq!(options.dithering, 0.1);
    }

    #[test]
    fn zero_blur_passes_clamps_up_to_one() {
        let options = EngineOptions {
            blur_passes: 0,
            ..EngineOptions::default()
        };
        assert_eq!(options.clamped().blur_passes, 1);
    }

    #[test]
    fn nan_falls_back_to_lower_bound() {
        let options = EngineOptions {
            warp_intensity: f32::NAN,
            ..EngineOptions::default()
        };
        assert_eq!(options.clamped().warp_intensity, 0.0);
    }

    #[test]
    fn partial_update_touches_only_supplied_fields() {
        let mut options = EngineOptions::default();
        let before = options.clone();
        options.apply(&OptionsUpdate {
            saturation: Some(9.0),
            ..OptionsUpdate::default()
        });
        assert_eq!(options.saturation, 3.0);
        assert_eq!(options.blur_passes, before.blur_passes);
        assert_eq!(options.tint_color, before.tint_color);
    }

    #[test]
    fn blur_inputs_difference_tracks_blur_fields_only() {
        let base = EngineOptions::default();
        let mut changed = base.clone();
        changed.warp_intensity = 0.9;
        assert!(!base.blur_inputs_differ(&changed));

        changed = base.clone();
        changed.blur_passes = 20;
        assert!(base.blur_inputs_differ(&changed));

        changed = base.clone();
        changed.tint_intensity = 0.5;
        assert!(base.blur_inputs_differ(&changed));
    }
}
