//! Fixed-rate playback loop.
//!
//! Each tick the scheduler checks the deadline, then the interrupt, then
//! composes the current frame, sends it to every target and sleeps out the
//! rest of the frame interval. Interrupts are only observed at tick
//! boundaries.

use std::path::Path;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::effect::{Effect, EffectOutput};
use super::interrupt::Interrupt;
use crate::animation::{Container, FormatError};
use crate::compute::{
    Compositor, DEFAULT_ALPHA, DEFAULT_FLIP_OFFSET, TransformError, TransformMatrix,
    TransformTable,
};
use crate::transport::{
    DEFAULT_INTER_MESSAGE_DELAY, MessageChannel, OscMessage, fill_message, send_frame,
};

/// Frame rate used when none is configured.
pub const DEFAULT_FPS: f32 = 40.0;

/// Errors that abort a playback attempt before the first frame is sent.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("Frame rate {0} does not give a usable frame interval")]
    InvalidFps(f32),
}

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No session running.
    Idle,
    /// Sending frames.
    Playing,
    /// Wrapped from the last frame back to the first on the latest tick.
    Looped,
    /// Ended by an interrupt.
    Stopped,
    /// Ended because the duration elapsed.
    Expired,
}

impl PlaybackState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlaybackState::Stopped | PlaybackState::Expired)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    Expired,
}

/// Summary of one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    pub reason: StopReason,
    /// Ticks that sent a frame.
    pub ticks: u64,
    /// Times playback wrapped to frame 0.
    pub loops: u64,
    /// Sends that failed and were skipped.
    pub transmit_failures: u64,
    /// Time from session start to exit.
    pub elapsed: Duration,
}

/// Timing and output parameters shared by all sessions of a scheduler.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// Target frame rate.
    pub fps: f32,
    /// Orientation transform; `None` plays in source order.
    pub transform: Option<TransformMatrix>,
    /// Amount added to negated axes by the transform.
    pub flip_offset: i32,
    /// Alpha written into every composed voxel.
    pub alpha: u8,
    /// Gap between the two halves of a frame.
    pub inter_message_delay: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            transform: Some(TransformMatrix::KELP),
            flip_offset: DEFAULT_FLIP_OFFSET,
            alpha: DEFAULT_ALPHA,
            inter_message_delay: DEFAULT_INTER_MESSAGE_DELAY,
        }
    }
}

impl PlaybackSettings {
    /// Duration of one tick. Fails unless `fps` is positive, finite and
    /// large enough for the interval to fit in a [`Duration`].
    pub fn frame_interval(&self) -> Result<Duration, PlaybackError> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(PlaybackError::InvalidFps(self.fps));
        }
        Duration::try_from_secs_f64(1.0 / f64::from(self.fps))
            .map_err(|_| PlaybackError::InvalidFps(self.fps))
    }

    /// End-of-tick sleep: the frame interval minus the time already spent
    /// between fragments.
    pub fn tick_sleep(&self) -> Result<Duration, PlaybackError> {
        Ok(self
            .frame_interval()?
            .saturating_sub(self.inter_message_delay))
    }

    /// Build the transform table for a session.
    pub fn transform_table(&self) -> Result<Option<TransformTable>, TransformError> {
        self.transform
            .as_ref()
            .map(|m| TransformTable::build_with_flip_offset(m, self.flip_offset))
            .transpose()
    }
}

/// Transient state of one movie playback.
#[derive(Debug)]
pub struct PlaybackSession {
    pub frame_index: usize,
    pub started: Duration,
    pub deadline: Option<Duration>,
    table: Option<TransformTable>,
    compositor: Compositor,
}

impl PlaybackSession {
    fn begin(
        settings: &PlaybackSettings,
        started: Duration,
        duration: Option<Duration>,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            frame_index: 0,
            started,
            deadline: duration.map(|d| started + d),
            table: settings.transform_table()?,
            compositor: Compositor::new(settings.alpha),
        })
    }
}

/// What one tick did.
struct TickResult {
    failures: u64,
    wrapped: bool,
}

/// Drives composition and transmission at a fixed frame rate.
///
/// Usage:
/// ```ignore
/// let targets: Vec<Box<dyn MessageChannel>> = vec![Box::new(UdpChannel::connect("osc-udp://192.168.1.69:9999")?)];
/// let mut scheduler = Scheduler::new(PlaybackSettings::default(), targets, SystemClock::new());
/// let report = scheduler.open_and_play("waves.raw", Some(Duration::from_secs(30)), &mut Never)?;
/// ```
pub struct Scheduler<C: Clock = SystemClock> {
    settings: PlaybackSettings,
    targets: Vec<Box<dyn MessageChannel>>,
    clock: C,
    state: PlaybackState,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(settings: PlaybackSettings, targets: Vec<Box<dyn MessageChannel>>, clock: C) -> Self {
        Self {
            settings,
            targets,
            clock,
            state: PlaybackState::Idle,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Send an arbitrary message to every target, ignoring failures.
    pub fn broadcast(&mut self, message: &OscMessage) -> u64 {
        let mut failures = 0;
        for target in &mut self.targets {
            if let Err(e) = target.send(message) {
                log::debug!("Send to {} failed: {}", target.name(), e);
                failures += 1;
            }
        }
        failures
    }

    /// Decode `path` and play it. A decode failure is returned before any
    /// frame is sent.
    pub fn open_and_play<P: AsRef<Path>>(
        &mut self,
        path: P,
        duration: Option<Duration>,
        interrupt: &mut dyn Interrupt,
    ) -> Result<PlaybackReport, PlaybackError> {
        let container = Container::open(path)?;
        self.play_movie(&container, duration, interrupt)
    }

    /// Loop `container` until `duration` elapses or `interrupt` fires.
    /// Without a duration the movie loops until interrupted.
    pub fn play_movie(
        &mut self,
        container: &Container,
        duration: Option<Duration>,
        interrupt: &mut dyn Interrupt,
    ) -> Result<PlaybackReport, PlaybackError> {
        let sleep = self.settings.tick_sleep()?;
        let mut session = PlaybackSession::begin(&self.settings, self.clock.now(), duration)?;
        let frame_count = container.frame_count();
        let delay = self.settings.inter_message_delay;
        log::info!(
            "Playing {} frames at {} fps{}",
            frame_count,
            self.settings.fps,
            duration
                .map(|d| format!(" for {:.1}s", d.as_secs_f32()))
                .unwrap_or_default()
        );

        let report = self.drive(session.started, duration, sleep, interrupt, |targets, clock, _| {
            let frame =
                session
                    .compositor
                    .compose(container, session.frame_index, session.table.as_ref());

            let mut failures = 0;
            for target in targets.iter_mut() {
                if let Err(e) = send_frame(target.as_mut(), frame, clock, delay) {
                    log::debug!("Dropped frame {} for {}: {}", session.frame_index, target.name(), e);
                    failures += 1;
                }
            }

            session.frame_index = (session.frame_index + 1) % frame_count;
            TickResult {
                failures,
                wrapped: session.frame_index == 0,
            }
        });

        Ok(report)
    }

    /// Play any effect. Movies open their container and loop it; every
    /// other effect is evaluated once per tick and sent as a fill.
    pub fn play_effect(
        &mut self,
        effect: &Effect,
        duration: Option<Duration>,
        interrupt: &mut dyn Interrupt,
    ) -> Result<PlaybackReport, PlaybackError> {
        if let Effect::Movie { path } = effect {
            return self.open_and_play(path, duration, interrupt);
        }

        let sleep = self.settings.tick_sleep()?;
        let started = self.clock.now();
        let report = self.drive(started, duration, sleep, interrupt, |targets, _, t| {
            let mut failures = 0;
            if let EffectOutput::Fill(color) = effect.evaluate(t.as_secs_f32()) {
                let message = fill_message(color);
                for target in targets.iter_mut() {
                    if let Err(e) = target.send(&message) {
                        log::debug!("Dropped fill for {}: {}", target.name(), e);
                        failures += 1;
                    }
                }
            }
            TickResult {
                failures,
                wrapped: false,
            }
        });

        Ok(report)
    }

    /// The tick loop shared by movies and effects.
    fn drive<F>(
        &mut self,
        started: Duration,
        duration: Option<Duration>,
        sleep: Duration,
        interrupt: &mut dyn Interrupt,
        mut tick: F,
    ) -> PlaybackReport
    where
        F: FnMut(&mut [Box<dyn MessageChannel>], &C, Duration) -> TickResult,
    {
        let mut ticks = 0;
        let mut loops = 0;
        let mut transmit_failures = 0;
        self.state = PlaybackState::Playing;

        let reason = loop {
            let elapsed = self.clock.now().saturating_sub(started);
            if duration.is_some_and(|d| elapsed > d) {
                break StopReason::Expired;
            }
            if interrupt.poll() {
                break StopReason::Interrupted;
            }

            let result = tick(&mut self.targets, &self.clock, elapsed);
            ticks += 1;
            transmit_failures += result.failures;
            if result.wrapped {
                loops += 1;
                self.state = PlaybackState::Looped;
            } else {
                self.state = PlaybackState::Playing;
            }

            self.clock.sleep(sleep);
        };

        self.state = match reason {
            StopReason::Interrupted => PlaybackState::Stopped,
            StopReason::Expired => PlaybackState::Expired,
        };
        let elapsed = self.clock.now().saturating_sub(started);
        if transmit_failures > 0 {
            log::warn!("{} sends failed during playback", transmit_failures);
        }
        log::info!(
            "Playback ended ({:?}) after {} ticks, {:.1}s",
            reason,
            ticks,
            elapsed.as_secs_f32()
        );

        PlaybackReport {
            reason,
            ticks,
            loops,
            transmit_failures,
            elapsed,
        }
    }
}
