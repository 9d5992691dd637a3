//! Frame scheduling, effects and the effect rotation.
//!
//! ```text
//!  Playlist ──► Scheduler ──tick──► Compositor ──► send_frame ──► targets
//!     ▲             │
//!  ControlState   Clock / Interrupt
//! ```

mod clock;
mod control;
mod effect;
mod interrupt;
mod playlist;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use control::{
    ControlCommand, ControlError, ControlInterrupt, ControlState, LIGHTS_ADDRESS, SEQUENCE_EFFECT,
};
pub use effect::{Color, Effect, EffectError, EffectOutput, hsv_to_rgb};
pub use interrupt::{Interrupt, Never, PollFn, poll_fn, spawn_stdin_watcher};
pub use playlist::{EffectEntry, PlayedEffect, Playlist};
pub use scheduler::{
    DEFAULT_FPS, PlaybackError, PlaybackReport, PlaybackSession, PlaybackSettings, PlaybackState,
    Scheduler, StopReason,
};
