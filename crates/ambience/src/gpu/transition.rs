use std::time::{Duration, Instant};

/// Crossfade state between the two album slots.
///
/// `Idle → Active` fires only when a blur completes for a *new* image; a
/// reblur of the displayed image never touches this machine. The fall back to
/// `Idle` is evaluated lazily from [`Transition::blend_factor`] during frame
/// rendering, not by a timer.
#[derive(Debug)]
pub(crate) enum Transition {
    Idle,
    Active { started: Instant, duration: Duration },
}

impl Transition {
    pub(crate) fn new() -> Self {
        Transition::Idle
    }

    /// Starts (or rebases) a crossfade. A zero duration is an immediate cut:
    /// the machine stays idle and the blend factor reports 1.
    pub(crate) fn begin(&mut self, now: Instant, duration: Duration) {
        if duration.is_zero() {
            *self = Transition::Idle;
        } else {
            *self = Transition::Active {
                started: now,
                duration,
            };
        }
    }

    /// Progress through the active crossfade, clamped to [0, 1].
    ///
    /// Monotonically non-decreasing for a fixed transition; flips the machine
    /// back to `Idle` the first time it reaches 1.
    pub(crate) fn blend_factor(&mut self, now: Instant) -> f32 {
        match self {
            Transition::Idle => 1.0,
            Transition::Active { started, duration } => {
                let elapsed = now.saturating_duration_since(*started);
                let progress =
                    elapsed.as_secs_f32() / duration.as_secs_f32().max(f32::EPSILON);
                if progress >= 1.0 {
                    *self = Transition::Idle;
                    1.0
                } else {
                    progress
                }
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(self, Transition::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_reports_fully_blended() {
        let mut transition = Transition::new();
        assert_eq!(transition.blend_factor(Instant::now()), 1.0);
        assert!(!transition.is_active());
    }

    #[test]
    fn factor_tracks_elapsed_fraction() {
        let start = Instant::now();
        let mut transition = Transition::new();
        transition.begin(start, Duration::from_millis(1000));

        let at_start = transition.blend_factor(start);
        assert!(at_start.abs() < 1e-6);
        let halfway = transition.blend_factor(start + Duration::from_millis(500));
        assert!((halfway - 0.5).abs() < 1e-3, "halfway = {halfway}");
        assert!(transition.is_active());
    }

    #[test]
    fn factor_is_monotonic_and_terminates_at_one() {
        let start = Instant::now();
        let mut transition = Transition::new();
        transition.begin(start, Duration::from_millis(1000));

        let mut last = 0.0;
        for ms in (0..=1200).step_by(100) {
            let factor = transition.blend_factor(start + Duration::from_millis(ms));
            assert!(factor >= last);
            last = factor;
        }
        assert_eq!(last, 1.0);
        assert!(!transition.is_active(), "machine should fall back to idle");
    }

    #[test]
    fn zero_duration_is_an_immediate_cut() {
        let start = Instant::now();
        let mut transition = Transition::new();
        transition.begin(start, Duration::ZERO);
        assert_eq!(transition.blend_factor(start), 1.0);
        assert!(!transition.is_active());
    }

    #[test]
    fn rebase_restarts_progress_from_zero() {
        let start = Instant::now();
        let mut transition = Transition::new();
        transition.begin(start, Duration::from_millis(1000));
        transition.blend_factor(start + Duration::from_millis(700));

        // A second image mid-transition starts a fresh crossfade.
        let rebased = start + Duration::from_millis(800);
        transition.begin(rebased, Duration::from_millis(1000));
        let factor = transition.blend_factor(rebased + Duration::from_millis(100));
        assert!((factor - 0.1).abs() < 1e-3, "factor = {factor}");
    }
}
