use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse playlist: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid playlist: {0}")]
    Invalid(String),
}

/// How the rotation walks its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    Continuous,
    Shuffle,
}

/// A TOML-described image rotation.
///
/// Durations accept humantime strings (`"45s"`, `"2m"`) or plain seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    pub version: u32,
    #[serde(default = "default_mode")]
    pub mode: RotationMode,
    #[serde(
        default = "default_item_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub item_duration: Duration,
    #[serde(
        default = "default_transition",
        deserialize_with = "deserialize_duration"
    )]
    pub transition: Duration,
    #[serde(default)]
    pub items: Vec<RotationItem>,
}

/// One rotation entry: an image path or URL, with optional per-item overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct RotationItem {
    pub image: String,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub duration: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub transition: Option<Duration>,
}

impl RotationConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RotationConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported playlist version {}",
                self.version
            )));
        }
        if self.items.is_empty() {
            return Err(ConfigError::Invalid(
                "playlist has no items".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_mode() -> RotationMode {
    RotationMode::Continuous
}

fn default_item_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_transition() -> Duration {
    Duration::from_millis(1200)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or_else(default_item_duration))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;

    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration in seconds or a humantime string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value < 0 {
                return Err(E::custom("duration cannot be negative"));
            }
            Ok(Some(Duration::from_secs(value as u64)))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !value.is_finite() || value < 0.0 {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Ok(Some(Duration::from_secs_f64(value)))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(value)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{value}': {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(Visitor)
        }
    }

    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
version = 1
mode = "continuous"
item_duration = "45s"
transition = "1500ms"

[[items]]
image = "covers/one.jpg"

[[items]]
image = "covers/two.jpg"
duration = "2m"
transition = "0s"
"#;

    #[test]
    fn parses_durations_in_humantime_form() {
        let config = RotationConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.item_duration, Duration::from_secs(45));
        assert_eq!(config.transition, Duration::from_millis(1500));
        assert_eq!(config.items.len(), 2);
        assert_eq!(config.items[1].duration, Some(Duration::from_secs(120)));
        assert_eq!(config.items[1].transition, Some(Duration::ZERO));
        assert_eq!(config.items[0].duration, None);
    }

    #[test]
    fn plain_numbers_are_seconds() {
        let config = RotationConfig::from_toml_str(
            r#"
version = 1
item_duration = 30

[[items]]
image = "a.png"
"#,
        )
        .unwrap();
        assert_eq!(config.item_duration, Duration::from_secs(30));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config = RotationConfig::from_toml_str(
            r#"
version = 1

[[items]]
image = "a.png"
"#,
        )
        .unwrap();
        assert_eq!(config.mode, RotationMode::Continuous);
        assert_eq!(config.item_duration, Duration::from_secs(60));
        assert_eq!(config.transition, Duration::from_millis(1200));
    }

    #[test]
    fn rejects_unknown_versions() {
        let result = RotationConfig::from_toml_str(
            r#"
version = 2

[[items]]
image = "a.png"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_playlists() {
        let result = RotationConfig::from_toml_str("version = 1\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
