//! Animation containers for the kelp.
//!
//! Animations are stored as "raw888" containers: an optional header block
//! followed by a flat run of planar 8x8x8 RGB frames.
//!
//! # File Format
//!
//! ```text
//! Header (optional, 256 bytes):
//!   Magic: "Ls" (2 bytes)
//!   Unused: 254 bytes
//!
//! Frames (1536 bytes each, repeated):
//!   Red plane:   512 bytes, indexed x + 8*y + 64*z
//!   Green plane: 512 bytes
//!   Blue plane:  512 bytes
//! ```
//!
//! A file that does not end on a frame boundary still plays; the partial
//! frame at the end is ignored.

mod format;
mod player;
mod recorder;

pub use format::{
    FRAME_SIZE, FormatError, GRID, HEADER_MAGIC, HEADER_SIZE, PLANE_SIZE, RawFrame, Rgb, VOXELS,
    detect_header, plane_offset,
};
pub use player::{Container, FrameIterator};
pub use recorder::{ContainerRecorder, RecorderConfig};
