//! Display controller wire protocol.
//!
//! The controller addresses the cube as an 8-wide, 64-tall raster of RGBA
//! pixels (eight 8x8 panels stacked). A composed frame is 2048 bytes, larger
//! than a safe Ethernet payload, so it goes out as two `/screenxy` messages:
//!
//! ```text
//! /screenxy ,iiiib  width=8  height=32  x=0  y=0   blob=bytes[0..1024]
//! /screenxy ,iiiib  width=8  height=32  x=0  y=32  blob=bytes[1024..2048]
//! ```
//!
//! The second half must trail the first by a short delay or the
//! controller's ingest buffer overruns.

use std::time::Duration;

use super::channel::{MessageChannel, TransmitError};
use super::osc::{OscArg, OscMessage};
use crate::compute::{BYTES_PER_VOXEL, COMPOSED_FRAME_SIZE, ComposedFrame};
use crate::playback::Clock;

/// Address of the raster blit message.
pub const SCREEN_ADDRESS: &str = "/screenxy";

/// Address of the solid fill command.
pub const FILL_ADDRESS: &str = "/fill";

/// Address of the global brightness command.
pub const BRIGHT_ADDRESS: &str = "/bright";

/// Raster width in pixels.
pub const RASTER_WIDTH: usize = 8;

/// Height of one fragment in pixels.
pub const FRAGMENT_HEIGHT: usize = 32;

/// Number of fragments per frame.
pub const FRAGMENTS_PER_FRAME: usize = 2;

/// Payload bytes carried by one fragment.
pub const FRAGMENT_PAYLOAD: usize = RASTER_WIDTH * FRAGMENT_HEIGHT * BYTES_PER_VOXEL;

/// Gap between the two fragments of a frame.
pub const DEFAULT_INTER_MESSAGE_DELAY: Duration = Duration::from_millis(1);

const _: () = assert!(FRAGMENT_PAYLOAD * FRAGMENTS_PER_FRAME == COMPOSED_FRAME_SIZE);

/// One half of a composed frame, addressed into the controller raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
    pub payload: &'a [u8],
}

impl Fragment<'_> {
    /// Encode as a `/screenxy` message.
    pub fn to_message(&self) -> OscMessage {
        OscMessage::new(SCREEN_ADDRESS)
            .arg(OscArg::Int(self.width))
            .arg(OscArg::Int(self.height))
            .arg(OscArg::Int(self.x))
            .arg(OscArg::Int(self.y))
            .arg(OscArg::Blob(self.payload.to_vec()))
    }
}

/// Split a frame into its top and bottom halves.
pub fn fragment(frame: &ComposedFrame) -> [Fragment<'_>; FRAGMENTS_PER_FRAME] {
    let (top, bottom) = frame.as_bytes().split_at(FRAGMENT_PAYLOAD);
    let half = |y: usize, payload| Fragment {
        width: RASTER_WIDTH as i32,
        height: FRAGMENT_HEIGHT as i32,
        x: 0,
        y: y as i32,
        payload,
    };
    [half(0, top), half(FRAGMENT_HEIGHT, bottom)]
}

/// Send one frame to `channel`: top half, delay, bottom half.
///
/// Stops at the first failed send; the caller decides whether to care.
pub fn send_frame<C: Clock + ?Sized>(
    channel: &mut dyn MessageChannel,
    frame: &ComposedFrame,
    clock: &C,
    inter_message_delay: Duration,
) -> Result<(), TransmitError> {
    let [top, bottom] = fragment(frame);
    channel.send(&top.to_message())?;
    clock.sleep(inter_message_delay);
    channel.send(&bottom.to_message())
}

/// `/fill r g b` with components in [0, 1].
pub fn fill_message(color: [f32; 3]) -> OscMessage {
    let [r, g, b] = color.map(|c| c.clamp(0.0, 1.0));
    OscMessage::new(FILL_ADDRESS)
        .arg(OscArg::Float(r))
        .arg(OscArg::Float(g))
        .arg(OscArg::Float(b))
}

/// `/bright level` with level in [0, 1].
pub fn brightness_message(level: f32) -> OscMessage {
    OscMessage::new(BRIGHT_ADDRESS).arg(OscArg::Float(level.clamp(0.0, 1.0)))
}
