//! Kelp - Volumetric playback for an 8x8x8 LED cube.
//!
//! This crate streams raw888 voxel movies and computed color effects to the
//! cube's display controllers as OSC over UDP.
//!
//! # Architecture
//!
//! - `animation`: The raw888 container format (decode, sample, record)
//! - `compute`: Orientation transform and RGBA frame composition
//! - `transport`: OSC codec, message channels and frame fragmentation
//! - `playback`: Fixed-rate scheduler, effects, remote control, rotation
//! - `schema`: JSON player configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kelp::{
//!     playback::{Never, Scheduler, SystemClock},
//!     schema::PlayerConfig,
//!     transport::{MessageChannel, UdpChannel},
//! };
//!
//! let config = PlayerConfig::default();
//! let targets: Vec<Box<dyn MessageChannel>> =
//!     vec![Box::new(UdpChannel::connect("osc-udp://192.168.1.69:9999").unwrap())];
//!
//! let mut scheduler = Scheduler::new(config.settings(), targets, SystemClock::new());
//! let report = scheduler
//!     .open_and_play("media/raw888/Waves_8x8x8_color.raw", Some(Duration::from_secs(30)), &mut Never)
//!     .unwrap();
//!
//! println!("Sent {} frames, looped {} times", report.ticks, report.loops);
//! ```

pub mod animation;
pub mod compute;
pub mod playback;
pub mod schema;
pub mod transport;

// Re-export commonly used types
pub use animation::{Container, FormatError};
pub use compute::{Compositor, TransformMatrix, TransformTable};
pub use playback::{Effect, PlaybackReport, PlaybackSettings, Playlist, Scheduler};
pub use schema::PlayerConfig;
