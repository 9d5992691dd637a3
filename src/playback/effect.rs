//! Effects: time-driven fills and container-backed voxel animations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Linear RGB with components in [0, 1].
pub type Color = [f32; 3];

/// What an effect wants shown at time `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectOutput {
    /// Fill the whole cube with one color.
    Fill(Color),
    /// Show the current frame of the effect's container.
    VoxelFrame,
}

/// Effect validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    #[error("Period must be positive, got {0}")]
    NonPositivePeriod(f32),
    #[error("Decay must not be negative, got {0}")]
    NegativeDecay(f32),
    #[error("Color sequence is empty")]
    EmptySequence,
}

/// A playable effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Effect {
    /// Constant fill.
    Solid { color: Color },
    /// Hold a color, then fade it out, repeating every `period` seconds.
    /// Green fades quadratically.
    Pulse {
        color: Color,
        hold: f32,
        decay: f32,
        period: f32,
    },
    /// Step through `colors`, spending `period / colors.len()` on each.
    Sequence { period: f32, colors: Vec<Color> },
    /// A [`Sequence`](Effect::Sequence) color with a [`Pulse`](Effect::Pulse)
    /// envelope.
    PulseSequence {
        colors: Vec<Color>,
        sequence_period: f32,
        hold: f32,
        decay: f32,
        period: f32,
    },
    /// Sweep the hue wheel at `rate` turns per second, restarting every
    /// `period` seconds. With `ramp`, brightness follows the same phase,
    /// rising from black to full over the first turn of each period.
    HueCycle {
        rate: f32,
        period: f32,
        #[serde(default)]
        ramp: bool,
    },
    /// Play a raw888 container.
    Movie { path: PathBuf },
}

impl Effect {
    /// Evaluate at `t` seconds since the effect started.
    pub fn evaluate(&self, t: f32) -> EffectOutput {
        match self {
            Effect::Solid { color } => EffectOutput::Fill(*color),
            Effect::Pulse {
                color,
                hold,
                decay,
                period,
            } => EffectOutput::Fill(pulse(*color, envelope(t, *hold, *decay, *period))),
            Effect::Sequence { period, colors } => {
                EffectOutput::Fill(sequence_color(colors, *period, t))
            }
            Effect::PulseSequence {
                colors,
                sequence_period,
                hold,
                decay,
                period,
            } => {
                let color = sequence_color(colors, *sequence_period, t);
                EffectOutput::Fill(pulse(color, envelope(t, *hold, *decay, *period)))
            }
            Effect::HueCycle { rate, period, ramp } => {
                let phase = rate * wrap(t, *period);
                let value = if *ramp { phase.clamp(0.0, 1.0) } else { 1.0 };
                EffectOutput::Fill(hsv_to_rgb(phase.rem_euclid(1.0), 1.0, value))
            }
            Effect::Movie { .. } => EffectOutput::VoxelFrame,
        }
    }

    /// Check timing parameters.
    pub fn validate(&self) -> Result<(), EffectError> {
        let positive = |p: f32| {
            if p > 0.0 && p.is_finite() {
                Ok(())
            } else {
                Err(EffectError::NonPositivePeriod(p))
            }
        };
        let decay_ok = |d: f32| {
            if d >= 0.0 {
                Ok(())
            } else {
                Err(EffectError::NegativeDecay(d))
            }
        };
        match self {
            Effect::Solid { .. } | Effect::Movie { .. } => Ok(()),
            Effect::Pulse { decay, period, .. } => {
                positive(*period)?;
                decay_ok(*decay)
            }
            Effect::Sequence { period, colors } => {
                positive(*period)?;
                non_empty(colors)
            }
            Effect::PulseSequence {
                colors,
                sequence_period,
                decay,
                period,
                ..
            } => {
                positive(*sequence_period)?;
                positive(*period)?;
                decay_ok(*decay)?;
                non_empty(colors)
            }
            Effect::HueCycle { period, .. } => positive(*period),
        }
    }

    /// Replace the colors (and their period) of a sequence effect. Other
    /// effects are returned unchanged.
    pub fn with_sequence(&self, colors: &[Color], period: f32) -> Effect {
        match self {
            Effect::Sequence { .. } => Effect::Sequence {
                period,
                colors: colors.to_vec(),
            },
            Effect::PulseSequence {
                hold,
                decay,
                period: pulse_period,
                ..
            } => Effect::PulseSequence {
                colors: colors.to_vec(),
                sequence_period: period,
                hold: *hold,
                decay: *decay,
                period: *pulse_period,
            },
            other => other.clone(),
        }
    }
}

fn non_empty(colors: &[Color]) -> Result<(), EffectError> {
    if colors.is_empty() {
        Err(EffectError::EmptySequence)
    } else {
        Ok(())
    }
}

/// `t` folded into [0, period).
fn wrap(t: f32, period: f32) -> f32 {
    if period > 0.0 { t.rem_euclid(period) } else { t }
}

/// Brightness of a pulse at `t`: 1 while holding, then a linear fade over
/// `decay` seconds.
fn envelope(t: f32, hold: f32, decay: f32, period: f32) -> f32 {
    let t = wrap(t, period);
    if t < hold {
        1.0
    } else if decay <= 0.0 {
        0.0
    } else {
        1.0 - ((t - hold) / decay).min(1.0)
    }
}

fn pulse([r, g, b]: Color, left: f32) -> Color {
    [r * left, g * left * left, b * left]
}

fn sequence_color(colors: &[Color], period: f32, t: f32) -> Color {
    if colors.is_empty() {
        return [0.0; 3];
    }
    let slot = period / colors.len() as f32;
    let index = if slot > 0.0 {
        (wrap(t, period) / slot) as usize
    } else {
        0
    };
    colors[index.min(colors.len() - 1)]
}

/// HSV to RGB, all components in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    if s <= 0.0 {
        return [v, v, v];
    }
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Color, b: Color) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn fill(output: EffectOutput) -> Color {
        match output {
            EffectOutput::Fill(c) => c,
            EffectOutput::VoxelFrame => panic!("expected a fill"),
        }
    }

    #[test]
    fn test_solid() {
        let effect = Effect::Solid {
            color: [0.8, 0.8, 0.0],
        };
        assert_eq!(effect.evaluate(123.0), EffectOutput::Fill([0.8, 0.8, 0.0]));
    }

    #[test]
    fn test_pulse_envelope() {
        let effect = Effect::Pulse {
            color: [1.0, 1.0, 1.0],
            hold: 0.2,
            decay: 0.8,
            period: 1.5,
        };
        assert!(approx(fill(effect.evaluate(0.1)), [1.0, 1.0, 1.0]));
        // Halfway through the decay: linear red/blue, quadratic green.
        assert!(approx(fill(effect.evaluate(0.6)), [0.5, 0.25, 0.5]));
        // Fully decayed until the period wraps.
        assert!(approx(fill(effect.evaluate(1.2)), [0.0, 0.0, 0.0]));
        assert!(approx(fill(effect.evaluate(1.6)), [1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_sequence_slots() {
        let colors = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let effect = Effect::Sequence {
            period: 3.0,
            colors: colors.clone(),
        };
        assert_eq!(fill(effect.evaluate(0.5)), colors[0]);
        assert_eq!(fill(effect.evaluate(1.5)), colors[1]);
        assert_eq!(fill(effect.evaluate(2.5)), colors[2]);
        assert_eq!(fill(effect.evaluate(3.5)), colors[0]);
    }

    #[test]
    fn test_pulse_sequence_combines() {
        let effect = Effect::PulseSequence {
            colors: vec![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            sequence_period: 4.0,
            hold: 0.1,
            decay: 2.0,
            period: 2.0,
        };
        assert!(approx(fill(effect.evaluate(0.0)), [1.0, 0.0, 0.0]));
        assert!(approx(fill(effect.evaluate(2.05)), [0.0, 0.0, 1.0]));
        assert!(approx(fill(effect.evaluate(3.1)), [0.0, 0.0, 0.5]));
    }

    #[test]
    fn test_hue_cycle() {
        let effect = Effect::HueCycle {
            rate: 0.5,
            period: 8.0,
            ramp: false,
        };
        assert!(approx(fill(effect.evaluate(0.0)), [1.0, 0.0, 0.0]));
        // rate 0.5 at t = 1/3 s is a sixth of a turn: yellow.
        assert!(approx(fill(effect.evaluate(1.0 / 3.0)), [1.0, 1.0, 0.0]));
        assert!(approx(fill(effect.evaluate(8.0)), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_hue_cycle_ramp() {
        let effect = Effect::HueCycle {
            rate: 0.5,
            period: 8.0,
            ramp: true,
        };
        assert!(approx(fill(effect.evaluate(0.0)), [0.0, 0.0, 0.0]));
        assert!(approx(fill(effect.evaluate(1.0 / 3.0)), [1.0 / 6.0, 1.0 / 6.0, 0.0]));
        assert!(approx(fill(effect.evaluate(4.0)), [1.0, 0.0, 0.0]));
        // Restarts dark at the top of each period.
        assert!(approx(fill(effect.evaluate(8.0)), [0.0, 0.0, 0.0]));

        let parsed: Effect =
            serde_json::from_str(r#"{"type":"HueCycle","rate":0.3,"period":8.0}"#).unwrap();
        assert_eq!(
            parsed,
            Effect::HueCycle {
                rate: 0.3,
                period: 8.0,
                ramp: false
            }
        );
    }

    #[test]
    fn test_movie_is_voxel_frame() {
        let effect = Effect::Movie {
            path: "media/raw888/Waves_8x8x8_color.raw".into(),
        };
        assert_eq!(effect.evaluate(1.0), EffectOutput::VoxelFrame);
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(approx(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]));
        assert!(approx(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), [0.0, 1.0, 0.0]));
        assert!(approx(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), [0.0, 0.0, 1.0]));
        assert!(approx(hsv_to_rgb(0.5, 0.0, 0.4), [0.4, 0.4, 0.4]));
    }

    #[test]
    fn test_validate() {
        assert!(Effect::Solid { color: [0.0; 3] }.validate().is_ok());
        assert_eq!(
            Effect::Sequence {
                period: 1.0,
                colors: vec![]
            }
            .validate(),
            Err(EffectError::EmptySequence)
        );
        assert_eq!(
            Effect::HueCycle {
                rate: 1.0,
                period: 0.0,
                ramp: false
            }
            .validate(),
            Err(EffectError::NonPositivePeriod(0.0))
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = r#"{"type":"Pulse","color":[1.0,0.0,0.0],"hold":0.2,"decay":3.0,"period":3.0}"#;
        let effect: Effect = serde_json::from_str(json).unwrap();
        assert_eq!(
            effect,
            Effect::Pulse {
                color: [1.0, 0.0, 0.0],
                hold: 0.2,
                decay: 3.0,
                period: 3.0
            }
        );
    }

    #[test]
    fn test_with_sequence() {
        let effect = Effect::PulseSequence {
            colors: vec![[1.0, 1.0, 1.0]],
            sequence_period: 1.0,
            hold: 0.1,
            decay: 2.0,
            period: 2.0,
        };
        let replaced = effect.with_sequence(&[[0.0, 1.0, 0.0]], 4.0);
        assert!(matches!(
            replaced,
            Effect::PulseSequence { ref colors, sequence_period, period, .. }
                if colors == &vec![[0.0, 1.0, 0.0]] && sequence_period == 4.0 && period == 2.0
        ));
        let solid = Effect::Solid { color: [1.0; 3] };
        assert_eq!(solid.with_sequence(&[], 1.0), solid);
    }
}
