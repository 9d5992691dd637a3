//! Binary layout of raw888 kelp animation containers.

use std::io;

/// Edge length of the cube in voxels.
pub const GRID: usize = 8;

/// Number of voxels in one cube frame.
pub const VOXELS: usize = GRID * GRID * GRID;

/// Size of one color plane (all red bytes, all green bytes or all blue bytes).
pub const PLANE_SIZE: usize = VOXELS;

/// Size of one stored frame: R plane, G plane, B plane.
pub const FRAME_SIZE: usize = 3 * PLANE_SIZE;

/// Magic bytes announcing a header block.
pub const HEADER_MAGIC: &[u8; 2] = b"Ls";

/// Size of the header block when [`HEADER_MAGIC`] is present.
pub const HEADER_SIZE: usize = 0x100;

/// One 8-bit color sample read from a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Append an alpha channel.
    #[inline]
    pub fn with_alpha(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }
}

/// Size of the header block at the start of `bytes` (0 when headerless).
pub fn detect_header(bytes: &[u8]) -> usize {
    if bytes.starts_with(HEADER_MAGIC) {
        HEADER_SIZE
    } else {
        0
    }
}

/// Errors raised while decoding a container. All of them are fatal to the
/// playback attempt that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Container is {len} bytes, need at least {required} (header {header} + one frame)")]
    TooShort {
        len: usize,
        header: usize,
        required: usize,
    },
    #[error("Frame index {index} out of range ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
    #[error("Failed to read container: {0}")]
    Io(#[from] io::Error),
}

/// One stored frame in planar layout, indexed `x + 8y + 64z` within each plane.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    planes: Box<[u8; FRAME_SIZE]>,
}

impl RawFrame {
    /// An all-black frame.
    pub fn new() -> Self {
        Self {
            planes: Box::new([0u8; FRAME_SIZE]),
        }
    }

    /// Copy a frame out of a planar byte slice.
    ///
    /// Returns `None` unless `bytes` is exactly [`FRAME_SIZE`] long.
    pub fn from_planes(bytes: &[u8]) -> Option<Self> {
        let planes: [u8; FRAME_SIZE] = bytes.try_into().ok()?;
        Some(Self {
            planes: Box::new(planes),
        })
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Rgb {
        let idx = plane_offset(x, y, z);
        Rgb {
            r: self.planes[idx],
            g: self.planes[idx + PLANE_SIZE],
            b: self.planes[idx + 2 * PLANE_SIZE],
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, color: Rgb) {
        let idx = plane_offset(x, y, z);
        self.planes[idx] = color.r;
        self.planes[idx + PLANE_SIZE] = color.g;
        self.planes[idx + 2 * PLANE_SIZE] = color.b;
    }

    /// Raw planar bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.planes[..]
    }
}

impl Default for RawFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.planes.iter().filter(|&&b| b != 0).count();
        f.debug_struct("RawFrame")
            .field("nonzero_bytes", &lit)
            .finish()
    }
}

/// Offset of voxel (x, y, z) within one plane.
#[inline]
pub fn plane_offset(x: usize, y: usize, z: usize) -> usize {
    x + y * GRID + z * GRID * GRID
}
