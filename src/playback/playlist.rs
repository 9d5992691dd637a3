//! The effect rotation: auto entries in order, with remote jumps in between.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::control::{ControlInterrupt, ControlState};
use super::effect::Effect;
use super::interrupt::Interrupt;
use super::scheduler::{PlaybackError, PlaybackReport, Scheduler};
use crate::transport::MessageChannel;

/// A named effect in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    pub name: String,
    pub effect: Effect,
    /// Part of the regular rotation. Entries with `auto: false` only play
    /// when requested by name.
    #[serde(default = "default_auto")]
    pub auto: bool,
}

fn default_auto() -> bool {
    true
}

impl EffectEntry {
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            effect,
            auto: true,
        }
    }

    /// Exclude from the rotation.
    pub fn manual(mut self) -> Self {
        self.auto = false;
        self
    }
}

/// One effect that ran (or was attempted) during a rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedEffect {
    pub name: String,
    /// Played because of a control command rather than the rotation.
    pub jumped: bool,
    /// `None` if the effect failed to start.
    pub report: Option<PlaybackReport>,
}

/// Ordered effect catalog plus rotation timing.
#[derive(Debug, Clone)]
pub struct Playlist {
    entries: Vec<EffectEntry>,
    effect_duration: Duration,
    jump_duration: Option<Duration>,
}

impl Playlist {
    pub fn new(
        entries: Vec<EffectEntry>,
        effect_duration: Duration,
        jump_duration: Option<Duration>,
    ) -> Self {
        Self {
            entries,
            effect_duration,
            jump_duration,
        }
    }

    pub fn entries(&self) -> &[EffectEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&EffectEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Play the entry called `name` until `duration` elapses or `interrupt`
    /// fires. Returns `None` if there is no such entry or it fails to start.
    pub fn play_named<C: Clock>(
        &self,
        scheduler: &mut Scheduler<C>,
        name: &str,
        duration: Option<Duration>,
        interrupt: &mut dyn Interrupt,
    ) -> Option<PlaybackReport> {
        let Some(entry) = self.find(name) else {
            log::warn!("No effect named {:?}", name);
            return None;
        };
        log::info!("Effect: {}", entry.name);
        report_or_skip(scheduler.play_effect(&entry.effect, duration, interrupt))
    }

    /// Play every auto entry once for `effect_duration` each.
    ///
    /// Before each entry any pending jump is served, and jumps requested
    /// during a jump are served back to back. A keyboard interrupt ends only
    /// the effect currently playing. Effects that fail to start are logged
    /// and skipped.
    pub fn run_once<C: Clock>(
        &self,
        scheduler: &mut Scheduler<C>,
        mut control: Option<&mut dyn MessageChannel>,
        keyboard: &mut dyn Interrupt,
        state: &mut ControlState,
    ) -> Vec<PlayedEffect> {
        let mut played = Vec::new();
        for entry in self.entries.iter().filter(|e| e.auto) {
            if let Some(channel) = control.as_deref_mut() {
                state.poll(channel);
            }
            while let Some(name) = state.take_jump() {
                let Some(target) = self.find(&name) else {
                    log::warn!("No effect named {:?}", name);
                    continue;
                };
                let effect = sequenced(&target.effect, state);
                let report = play(
                    scheduler,
                    &effect,
                    self.jump_duration,
                    &mut control,
                    keyboard,
                    state,
                );
                played.push(PlayedEffect {
                    name,
                    jumped: true,
                    report,
                });
            }

            log::info!("Effect: {}", entry.name);
            let effect = sequenced(&entry.effect, state);
            let report = play(
                scheduler,
                &effect,
                Some(self.effect_duration),
                &mut control,
                keyboard,
                state,
            );
            played.push(PlayedEffect {
                name: entry.name.clone(),
                jumped: false,
                report,
            });
        }
        played
    }
}

/// `effect` with the sequence colors installed by the last control command.
fn sequenced(effect: &Effect, state: &ControlState) -> Effect {
    match state.sequence() {
        Some((period, colors)) => effect.with_sequence(colors, period),
        None => effect.clone(),
    }
}

fn play<C: Clock>(
    scheduler: &mut Scheduler<C>,
    effect: &Effect,
    duration: Option<Duration>,
    control: &mut Option<&mut dyn MessageChannel>,
    keyboard: &mut dyn Interrupt,
    state: &mut ControlState,
) -> Option<PlaybackReport> {
    let result = match control {
        Some(channel) => {
            let mut interrupt = ControlInterrupt {
                keyboard: &mut *keyboard,
                control: &mut **channel,
                state,
            };
            scheduler.play_effect(effect, duration, &mut interrupt)
        }
        None => scheduler.play_effect(effect, duration, keyboard),
    };
    report_or_skip(result)
}

fn report_or_skip(result: Result<PlaybackReport, PlaybackError>) -> Option<PlaybackReport> {
    match result {
        Ok(report) => Some(report),
        Err(e) => {
            log::error!("Skipping effect: {}", e);
            None
        }
    }
}
