use std::time::Instant;

/// Per-tick easing factor pulling the running speed toward the target.
const SPEED_SMOOTHING: f32 = 0.05;

/// Accumulates logical animation time at a smoothed, adjustable speed.
///
/// Wall-clock deltas between ticks are scaled by a running speed value that
/// eases toward the requested target, so speed changes ramp instead of
/// jumping. Pausing clears the tick origin; the first tick after a resume
/// contributes a zero delta rather than the whole pause.
pub(crate) struct AnimationClock {
    target_speed: f32,
    current_speed: f32,
    accumulated: f64,
    last_tick: Option<Instant>,
}

impl AnimationClock {
    pub fn new(target_speed: f32) -> Self {
        Self {
            target_speed,
            current_speed: target_speed,
            accumulated: 0.0,
            last_tick: None,
        }
    }

    pub fn set_target_speed(&mut self, speed: f32) {
        self.target_speed = speed;
    }

    /// Advances logical time and returns the accumulated value in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last_tick {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f64(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.current_speed += (self.target_speed - self.current_speed) * SPEED_SMOOTHING;
        self.accumulated += dt * f64::from(self.current_speed);
        self.accumulated as f32
    }

    /// Current logical time without advancing it.
    pub fn time(&self) -> f32 {
        self.accumulated as f32
    }

    pub fn pause(&mut self) {
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_tick_contributes_no_time() {
        let mut clock = AnimationClock::new(1.0);
        let t = clock.tick(Instant::now());
        assert_eq!(t, 0.0);
    }

    #[test]
    fn accumulates_delta_times_speed() {
        let mut clock = AnimationClock::new(2.0);
        let start = Instant::now();
        clock.tick(start);
        let t = clock.tick(start + Duration::from_millis(500));
        assert!((t - 1.0).abs() < 1e-3, "t = {t}");
    }

    #[test]
    fn speed_eases_toward_target() {
        let mut clock = AnimationClock::new(1.0);
        let mut now = Instant::now();
        clock.tick(now);
        clock.set_target_speed(5.0);

        // One tick moves 5% of the gap; many ticks converge.
        now += Duration::from_millis(16);
        clock.tick(now);
        let after_one = clock.current_speed;
        assert!((after_one - 1.2).abs() < 1e-4, "speed = {after_one}");

        for _ in 0..400 {
            now += Duration::from_millis(16);
            clock.tick(now);
        }
        assert!((clock.current_speed - 5.0).abs() < 1e-2);
    }

    #[test]
    fn pause_suppresses_the_gap() {
        let mut clock = AnimationClock::new(1.0);
        let start = Instant::now();
        clock.tick(start);
        clock.tick(start + Duration::from_secs(1));
        let before_pause = clock.time();

        clock.pause();
        let t = clock.tick(start + Duration::from_secs(100));
        assert!((t - before_pause).abs() < 1e-4);
    }
}
