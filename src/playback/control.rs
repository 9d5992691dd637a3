//! Remote control over OSC: `/lights <effect-name> [args...]`.
//!
//! ```text
//! /lights "red-pulse"                      jump to a named effect
//! /lights "resume"                         end the current jump
//! /lights "sequence" 4.0 27 47 230 227 187 0
//!                                          set sequence colors, play "sequence"
//! ```

use super::effect::Color;
use super::interrupt::Interrupt;
use crate::transport::{MessageChannel, OscMessage};

/// OSC address carrying control commands.
pub const LIGHTS_ADDRESS: &str = "/lights";

/// Name of the catalog entry a `sequence` command jumps to.
pub const SEQUENCE_EFFECT: &str = "sequence";

/// Control message errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("Control message has no effect name")]
    MissingName,
    #[error("Sequence needs a numeric period")]
    MissingPeriod,
    #[error("Sequence period must be positive, got {0}")]
    InvalidPeriod(f32),
    #[error("Sequence has no colors")]
    EmptySequence,
    #[error("Sequence expects R, G, B triples (0-255), got {0} components")]
    BadComponentCount(usize),
    #[error("Sequence component {0} is not numeric")]
    BadComponent(usize),
}

/// A parsed control command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Interrupt and play the named effect.
    Play(String),
    /// Interrupt and continue with the regular rotation.
    Resume,
    /// Install new sequence colors and play the sequence effect.
    Sequence { period: f32, colors: Vec<Color> },
}

impl ControlCommand {
    /// Parse a control message. Messages for other addresses yield `None`.
    pub fn parse(message: &OscMessage) -> Result<Option<Self>, ControlError> {
        if message.address != LIGHTS_ADDRESS {
            return Ok(None);
        }
        let name = message
            .args
            .first()
            .and_then(|a| a.as_str())
            .ok_or(ControlError::MissingName)?;

        let command = match name {
            "resume" => ControlCommand::Resume,
            SEQUENCE_EFFECT => {
                let period = message
                    .args
                    .get(1)
                    .and_then(|a| a.as_f32())
                    .ok_or(ControlError::MissingPeriod)?;
                if !(period > 0.0 && period.is_finite()) {
                    return Err(ControlError::InvalidPeriod(period));
                }
                let components = message.args.get(2..).unwrap_or_default();
                if components.is_empty() {
                    return Err(ControlError::EmptySequence);
                }
                if components.len() % 3 != 0 {
                    return Err(ControlError::BadComponentCount(components.len()));
                }
                let values = components
                    .iter()
                    .enumerate()
                    .map(|(i, a)| a.as_f32().map(|v| v / 255.0).ok_or(ControlError::BadComponent(i)))
                    .collect::<Result<Vec<_>, _>>()?;
                let colors = values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
                ControlCommand::Sequence { period, colors }
            }
            other => ControlCommand::Play(other.to_owned()),
        };
        Ok(Some(command))
    }
}

/// Pending jump and sequence override accumulated from control messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    jump: Option<String>,
    sequence: Option<(f32, Vec<Color>)>,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command.
    pub fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Play(name) => self.jump = Some(name),
            ControlCommand::Resume => self.jump = None,
            ControlCommand::Sequence { period, colors } => {
                self.sequence = Some((period, colors));
                self.jump = Some(SEQUENCE_EFFECT.to_owned());
            }
        }
    }

    /// Drain `channel`, applying every valid command. Returns true if any
    /// command arrived.
    pub fn poll(&mut self, channel: &mut dyn MessageChannel) -> bool {
        let mut received = false;
        loop {
            match channel.try_recv() {
                Ok(Some(message)) => match ControlCommand::parse(&message) {
                    Ok(Some(command)) => {
                        log::info!("Control command: {:?}", command);
                        self.apply(command);
                        received = true;
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Ignoring control message: {}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    log::debug!("Control channel error: {}", e);
                    break;
                }
            }
        }
        received
    }

    /// Take the pending jump, if any.
    pub fn take_jump(&mut self) -> Option<String> {
        self.jump.take()
    }

    /// Colors installed by the last `sequence` command.
    pub fn sequence(&self) -> Option<(f32, &[Color])> {
        self.sequence.as_ref().map(|(p, c)| (*p, c.as_slice()))
    }
}

/// Interrupt that fires on a keyboard-style interrupt or on any control
/// command.
pub struct ControlInterrupt<'a> {
    pub keyboard: &'a mut dyn Interrupt,
    pub control: &'a mut dyn MessageChannel,
    pub state: &'a mut ControlState,
}

impl Interrupt for ControlInterrupt<'_> {
    fn poll(&mut self) -> bool {
        self.keyboard.poll() || self.state.poll(self.control)
    }
}
