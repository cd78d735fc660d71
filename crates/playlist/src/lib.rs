//! Image rotation for the ambience engine: a TOML-described playlist plus a
//! runtime that decides when the next image should be loaded.

mod config;

pub use config::{ConfigError, RotationConfig, RotationItem, RotationMode};

use std::time::{Duration, Instant};

use rand::prelude::*;

/// The image the rotation currently points at, with resolved timings.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentItem {
    pub image: String,
    pub duration: Duration,
    pub transition: Duration,
}

/// Walks a [`RotationConfig`], advancing when the current item's duration
/// elapses. Shuffle mode draws a fresh order every full cycle.
pub struct Rotation {
    config: RotationConfig,
    order: Vec<usize>,
    cursor: usize,
    last_started: Instant,
    rng: StdRng,
}

impl Rotation {
    pub fn new(config: RotationConfig, seed: u64, now: Instant) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let order = build_order(config.items.len(), config.mode, &mut rng);
        Self {
            config,
            order,
            cursor: 0,
            last_started: now,
            rng,
        }
    }

    /// The item currently scheduled for display.
    pub fn current(&self) -> CurrentItem {
        let item = &self.config.items[self.order[self.cursor]];
        CurrentItem {
            image: item.image.clone(),
            duration: item.duration.unwrap_or(self.config.item_duration),
            transition: item.transition.unwrap_or(self.config.transition),
        }
    }

    /// Advances when the current item has been up long enough; returns the
    /// new item if a change happened.
    pub fn advance_if_elapsed(&mut self, now: Instant) -> Option<CurrentItem> {
        if self.config.items.len() <= 1 {
            return None;
        }
        if now.saturating_duration_since(self.last_started) < self.current().duration {
            return None;
        }
        self.advance(now);
        Some(self.current())
    }

    /// Skips to the next item immediately.
    pub fn skip(&mut self, now: Instant) -> Option<CurrentItem> {
        if self.config.items.len() <= 1 {
            return None;
        }
        self.advance(now);
        Some(self.current())
    }

    fn advance(&mut self, now: Instant) {
        self.cursor += 1;
        if self.cursor >= self.order.len() {
            self.order = build_order(self.config.items.len(), self.config.mode, &mut self.rng);
            self.cursor = 0;
        }
        self.last_started = now;
    }
}

fn build_order(len: usize, mode: RotationMode, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if mode == RotationMode::Shuffle {
        order.shuffle(rng);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(raw: &str) -> RotationConfig {
        RotationConfig::from_toml_str(raw).unwrap()
    }

    #[test]
    fn advances_when_the_item_duration_elapses() {
        let mut rotation = Rotation::new(
            config(
                r#"
version = 1
item_duration = 1

[[items]]
image = "one.jpg"
[[items]]
image = "two.jpg"
"#,
            ),
            1,
            Instant::now(),
        );
        let start = Instant::now();
        assert_eq!(rotation.current().image, "one.jpg");
        assert!(rotation.advance_if_elapsed(start).is_none());

        let changed = rotation.advance_if_elapsed(start + Duration::from_secs(2));
        assert_eq!(changed.unwrap().image, "two.jpg");
    }

    #[test]
    fn per_item_duration_overrides_the_default() {
        let mut rotation = Rotation::new(
            config(
                r#"
version = 1
item_duration = 1

[[items]]
image = "long.jpg"
duration = 10
[[items]]
image = "short.jpg"
"#,
            ),
            1,
            Instant::now(),
        );
        let start = Instant::now();
        assert!(rotation
            .advance_if_elapsed(start + Duration::from_secs(5))
            .is_none());
        assert!(rotation
            .advance_if_elapsed(start + Duration::from_secs(11))
            .is_some());
    }

    #[test]
    fn single_item_never_advances() {
        let mut rotation = Rotation::new(
            config(
                r#"
version = 1
item_duration = 1

[[items]]
image = "only.jpg"
"#,
            ),
            1,
            Instant::now(),
        );
        assert!(rotation
            .advance_if_elapsed(Instant::now() + Duration::from_secs(100))
            .is_none());
        assert!(rotation.skip(Instant::now()).is_none());
    }

    #[test]
    fn shuffle_visits_every_item_each_cycle() {
        let mut rotation = Rotation::new(
            config(
                r#"
version = 1
mode = "shuffle"
item_duration = 1

[[items]]
image = "a.jpg"
[[items]]
image = "b.jpg"
[[items]]
image = "c.jpg"
"#,
            ),
            42,
            Instant::now(),
        );
        let mut seen = std::collections::BTreeSet::new();
        seen.insert(rotation.current().image);
        for _ in 0..2 {
            seen.insert(rotation.skip(Instant::now()).unwrap().image);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn transition_falls_back_to_playlist_default() {
        let rotation = Rotation::new(
            config(
                r#"
version = 1
transition = "500ms"

[[items]]
image = "a.jpg"
"#,
            ),
            7,
            Instant::now(),
        );
        assert_eq!(rotation.current().transition, Duration::from_millis(500));
    }
}
