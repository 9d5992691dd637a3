//! Player configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compute::{DEFAULT_ALPHA, DEFAULT_FLIP_OFFSET, TransformError, TransformMatrix, TransformTable};
use crate::playback::{DEFAULT_FPS, Effect, EffectEntry, EffectError, PlaybackSettings, Playlist};
use crate::transport::DEFAULT_INTER_MESSAGE_DELAY;

fn default_fps() -> f32 {
    DEFAULT_FPS
}

fn default_transform() -> Option<TransformMatrix> {
    Some(TransformMatrix::KELP)
}

fn default_flip_offset() -> i32 {
    DEFAULT_FLIP_OFFSET
}

fn default_alpha() -> u8 {
    DEFAULT_ALPHA
}

fn default_inter_message_delay_ms() -> f32 {
    1.0
}

fn default_effect_duration_secs() -> f32 {
    30.0
}

/// Top-level player configuration, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// Orientation transform. `null` plays in source order.
    #[serde(default = "default_transform")]
    pub transform: Option<TransformMatrix>,
    /// Added to every negated axis of the transform.
    #[serde(default = "default_flip_offset")]
    pub flip_offset: i32,
    /// Alpha byte of every composed voxel.
    #[serde(default = "default_alpha")]
    pub alpha: u8,
    /// Gap between the two halves of a frame, in milliseconds.
    #[serde(default = "default_inter_message_delay_ms")]
    pub inter_message_delay_ms: f32,
    /// How long a single movie plays. Absent or 0 means until interrupted.
    #[serde(default)]
    pub duration_secs: Option<f32>,
    /// Display endpoints, e.g. `osc-udp://192.168.1.69:9999`.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Address to listen on for `/lights` control messages.
    #[serde(default)]
    pub control: Option<String>,
    /// How long each effect of the rotation plays. Must be positive.
    #[serde(default = "default_effect_duration_secs")]
    pub effect_duration_secs: f32,
    /// How long a remotely requested effect plays. Absent or 0 means until
    /// the next interrupt or control message.
    #[serde(default)]
    pub jump_duration_secs: Option<f32>,
    /// Effect catalog, in rotation order.
    #[serde(default = "default_effects")]
    pub effects: Vec<EffectEntry>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            transform: default_transform(),
            flip_offset: DEFAULT_FLIP_OFFSET,
            alpha: DEFAULT_ALPHA,
            inter_message_delay_ms: default_inter_message_delay_ms(),
            duration_secs: None,
            targets: vec![
                "osc-udp://192.168.1.69:9999".into(),
                "osc-udp://192.168.1.99:9999".into(),
            ],
            control: None,
            effect_duration_secs: default_effect_duration_secs(),
            jump_duration_secs: None,
            effects: default_effects(),
        }
    }
}

/// The stock catalog: pulses, hue sweep, the bundled movies, and manual-only
/// solids and sequence.
pub fn default_effects() -> Vec<EffectEntry> {
    let color_pulse = |color| Effect::Pulse {
        color,
        hold: 0.2,
        decay: 3.0,
        period: 3.0,
    };
    let movie = |file: &str| Effect::Movie {
        path: format!("media/raw888/{file}").into(),
    };
    vec![
        EffectEntry::new(
            "hues",
            Effect::HueCycle {
                rate: 0.3,
                period: 8.0,
                ramp: true,
            },
        ),
        EffectEntry::new("red-pulse", color_pulse([1.0, 0.0, 0.0])),
        EffectEntry::new("waves", movie("Waves_8x8x8_color.raw")),
        EffectEntry::new("blue-pulse", color_pulse([0.0, 0.0, 1.0])),
        EffectEntry::new("test-pattern", movie("TestXYZ_8x8x8_color.raw")),
        EffectEntry::new("two-balls", movie("TwoBalls_8x8x8_color.raw")),
        EffectEntry::new("green-pulse", color_pulse([0.0, 1.0, 0.0])),
        EffectEntry::new("rainbow", movie("PlaqueRainbowRotation_8x8x8_color.raw")),
        EffectEntry::new("white", Effect::Solid { color: [1.0, 1.0, 1.0] }).manual(),
        EffectEntry::new("black", Effect::Solid { color: [0.0, 0.0, 0.0] }).manual(),
        EffectEntry::new("amber", Effect::Solid { color: [0.8, 0.8, 0.0] }).manual(),
        EffectEntry::new(
            "sequence",
            Effect::PulseSequence {
                colors: vec![[1.0, 1.0, 1.0]],
                sequence_period: 1.0,
                hold: 0.1,
                decay: 2.0,
                period: 2.0,
            },
        )
        .manual(),
    ]
}

impl PlayerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings()
            .frame_interval()
            .map_err(|_| ConfigError::InvalidFps(self.fps))?;
        if seconds(self.inter_message_delay_ms / 1000.0).is_none() {
            return Err(ConfigError::InvalidDuration {
                field: "inter_message_delay_ms",
                value: self.inter_message_delay_ms,
            });
        }
        for (field, value) in [
            ("duration_secs", self.duration_secs),
            ("jump_duration_secs", self.jump_duration_secs),
        ] {
            if let Some(v) = value {
                if seconds(v).is_none() {
                    return Err(ConfigError::InvalidDuration { field, value: v });
                }
            }
        }
        if !seconds(self.effect_duration_secs).is_some_and(|d| !d.is_zero()) {
            return Err(ConfigError::InvalidDuration {
                field: "effect_duration_secs",
                value: self.effect_duration_secs,
            });
        }
        if let Some(matrix) = &self.transform {
            TransformTable::build_with_flip_offset(matrix, self.flip_offset)?;
        }
        for (i, entry) in self.effects.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(ConfigError::UnnamedEffect(i));
            }
            entry
                .effect
                .validate()
                .map_err(|source| ConfigError::InvalidEffect {
                    name: entry.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Scheduler settings derived from this config.
    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            fps: self.fps,
            transform: self.transform,
            flip_offset: self.flip_offset,
            alpha: self.alpha,
            inter_message_delay: self.inter_message_delay(),
        }
    }

    pub fn inter_message_delay(&self) -> Duration {
        seconds(self.inter_message_delay_ms / 1000.0).unwrap_or(DEFAULT_INTER_MESSAGE_DELAY)
    }

    /// Single-movie duration, if bounded.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.and_then(bounded)
    }

    /// The effect rotation described by this config.
    pub fn playlist(&self) -> Playlist {
        let effect_duration = seconds(self.effect_duration_secs)
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs_f32(default_effect_duration_secs()));
        Playlist::new(
            self.effects.clone(),
            effect_duration,
            self.jump_duration_secs.and_then(bounded),
        )
    }
}

/// `secs` as a [`Duration`], if it is non-negative and representable.
fn seconds(secs: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(secs).ok()
}

/// Like [`seconds`], with zero meaning unbounded.
fn bounded(secs: f32) -> Option<Duration> {
    seconds(secs).filter(|d| !d.is_zero())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame rate must be positive, got {0}")]
    InvalidFps(f32),
    #[error("{field} must be a non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f32 },
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("Effect {0} has no name")]
    UnnamedEffect(usize),
    #[error("Effect {name:?}: {source}")]
    InvalidEffect { name: String, source: EffectError },
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transform, Some(TransformMatrix::KELP));

        let settings = config.settings();
        assert_eq!(settings.frame_interval().unwrap(), Duration::from_millis(25));
        assert_eq!(settings.inter_message_delay, Duration::from_millis(1));
        assert_eq!(settings.alpha, 200);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = PlayerConfig::from_json(r#"{"targets":["osc-udp://127.0.0.1:9999"]}"#).unwrap();
        assert_eq!(config.fps, 40.0);
        assert_eq!(config.flip_offset, 7);
        assert_eq!(config.transform, Some(TransformMatrix::KELP));
        assert_eq!(config.effects, default_effects());
        assert_eq!(config.duration(), None);
    }

    #[test]
    fn test_null_transform_is_identity_order() {
        let config = PlayerConfig::from_json(r#"{"transform":null,"alpha":255}"#).unwrap();
        assert_eq!(config.transform, None);
        assert!(config.settings().transform_table().unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = PlayerConfig {
            fps: 0.0,
            ..PlayerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFps(_))));

        let config = PlayerConfig {
            duration_secs: Some(-1.0),
            ..PlayerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "duration_secs",
                ..
            })
        ));

        let config = PlayerConfig {
            flip_offset: 3,
            ..PlayerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Transform(_))));

        let config = PlayerConfig {
            effect_duration_secs: 0.0,
            ..PlayerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "effect_duration_secs",
                ..
            })
        ));

        assert!(matches!(
            PlayerConfig::from_json(r#"{"transform":[[1,1,0],[0,1,0],[0,0,1]]}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_values_that_overflow_duration() {
        assert!(matches!(
            PlayerConfig::from_json(r#"{"fps":1e-30}"#),
            Err(ConfigError::InvalidFps(_))
        ));
        for field in ["duration_secs", "jump_duration_secs", "effect_duration_secs"] {
            let json = format!(r#"{{"{field}":1e20}}"#);
            assert!(
                matches!(
                    PlayerConfig::from_json(&json),
                    Err(ConfigError::InvalidDuration { field: f, .. }) if f == field
                ),
                "{field}"
            );
        }
        assert!(matches!(
            PlayerConfig::from_json(r#"{"inter_message_delay_ms":1e30}"#),
            Err(ConfigError::InvalidDuration {
                field: "inter_message_delay_ms",
                ..
            })
        ));

        let config = PlayerConfig {
            duration_secs: Some(f32::MAX),
            fps: 1e-30,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.duration(), None);
        assert!(config.settings().frame_interval().is_err());
    }

    #[test]
    fn test_zero_duration_means_forever() {
        let config = PlayerConfig::from_json(r#"{"duration_secs":0,"jump_duration_secs":0}"#).unwrap();
        assert_eq!(config.duration(), None);

        let config = PlayerConfig::from_json(r#"{"duration_secs":2.5}"#).unwrap();
        assert_eq!(config.duration(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_rejects_bad_effects() {
        let mut config = PlayerConfig::default();
        config.effects.push(EffectEntry::new(
            "broken",
            Effect::Sequence {
                period: 1.0,
                colors: vec![],
            },
        ));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEffect { ref name, .. }) if name == "broken"
        ));

        config.effects = vec![EffectEntry::new("", Effect::Solid { color: [0.0; 3] })];
        assert!(matches!(config.validate(), Err(ConfigError::UnnamedEffect(0))));
    }

    #[test]
    fn test_playlist_from_config() {
        let config = PlayerConfig {
            effect_duration_secs: 2.0,
            jump_duration_secs: Some(5.0),
            ..PlayerConfig::default()
        };
        let playlist = config.playlist();
        assert_eq!(playlist.entries().len(), config.effects.len());
        assert_eq!(playlist.find("amber").map(|e| e.auto), Some(false));
        assert_eq!(playlist.find("hues").map(|e| e.auto), Some(true));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = PlayerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed = PlayerConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
