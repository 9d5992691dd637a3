//! Fully buffered container decoder and voxel sampler.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::format::{FRAME_SIZE, FormatError, PLANE_SIZE, RawFrame, Rgb, detect_header};
use crate::compute::Voxel;

/// A decoded raw888 animation container.
///
/// The bytes are immutable and reference counted, so cloning a container is
/// cheap and several playback sessions can share one read-only.
///
/// Usage:
/// ```ignore
/// let container = Container::open("waves.raw")?;
/// println!("{} frames", container.frame_count());
///
/// let base = container.frame_base(3);
/// let rgb = container.sample(base, Voxel::new(1, 2, 3));
/// ```
#[derive(Debug, Clone)]
pub struct Container {
    bytes: Arc<[u8]>,
    header_size: usize,
    frame_count: usize,
}

impl Container {
    /// Read and decode a container file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        log::info!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(bytes)
    }

    /// Decode a container from an in-memory buffer.
    ///
    /// Fails if the buffer cannot hold the header plus one frame. Trailing
    /// bytes past the last whole frame are logged and ignored.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, FormatError> {
        let bytes: Arc<[u8]> = bytes.into();
        let header_size = detect_header(&bytes);
        let required = header_size + FRAME_SIZE;

        if bytes.len() < required {
            return Err(FormatError::TooShort {
                len: bytes.len(),
                header: header_size,
                required,
            });
        }

        let body = bytes.len() - header_size;
        let frame_count = body / FRAME_SIZE;
        let trailing = body % FRAME_SIZE;
        if trailing != 0 {
            log::warn!(
                "Container does not end on a frame boundary ({} trailing bytes), playing {} frames",
                trailing,
                frame_count
            );
        }

        Ok(Self {
            bytes,
            header_size,
            frame_count,
        })
    }

    /// Number of whole frames.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Size of the header block (0 or 256).
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    pub fn has_header(&self) -> bool {
        self.header_size > 0
    }

    /// Bytes after the last whole frame.
    pub fn trailing_bytes(&self) -> usize {
        (self.bytes.len() - self.header_size) % FRAME_SIZE
    }

    /// Total buffer length including header and trailing bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte offset of the first red sample of `frame_index`.
    #[inline]
    pub fn frame_base(&self, frame_index: usize) -> usize {
        self.header_size + frame_index * FRAME_SIZE
    }

    /// Sample one voxel of the frame starting at `frame_base`.
    ///
    /// Coordinates must lie in [0, 8); nothing is clamped.
    #[inline]
    pub fn sample(&self, frame_base: usize, voxel: Voxel) -> Rgb {
        let offset = frame_base + voxel.index();
        Rgb {
            r: self.bytes[offset],
            g: self.bytes[offset + PLANE_SIZE],
            b: self.bytes[offset + 2 * PLANE_SIZE],
        }
    }

    /// Copy one frame out of the container.
    pub fn read_frame(&self, frame_index: usize) -> Result<RawFrame, FormatError> {
        if frame_index >= self.frame_count {
            return Err(FormatError::FrameOutOfRange {
                index: frame_index,
                count: self.frame_count,
            });
        }
        let base = self.frame_base(frame_index);
        let frame = RawFrame::from_planes(&self.bytes[base..base + FRAME_SIZE]);
        Ok(frame.unwrap_or_default())
    }

    /// Iterate over all whole frames.
    pub fn frames(&self) -> FrameIterator<'_> {
        FrameIterator {
            container: self,
            current: 0,
        }
    }
}

/// Iterator over container frames.
pub struct FrameIterator<'a> {
    container: &'a Container,
    current: usize,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.container.read_frame(self.current).ok()?;
        self.current += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.container.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIterator<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::HEADER_SIZE;
    use crate::animation::{ContainerRecorder, RecorderConfig};
    use tempfile::tempdir;

    fn numbered_frames(n: usize) -> Vec<RawFrame> {
        (0..n)
            .map(|i| {
                let mut frame = RawFrame::new();
                frame.set(i % 8, 0, 0, Rgb::new(i as u8 + 1, 2 * i as u8, 255 - i as u8));
                frame
            })
            .collect()
    }

    fn record(frames: &[RawFrame], with_header: bool) -> Vec<u8> {
        let mut recorder = ContainerRecorder::new(Vec::new(), RecorderConfig { with_header })
            .unwrap();
        for frame in frames {
            recorder.record_frame(frame).unwrap();
        }
        recorder.finalize().unwrap()
    }

    #[test]
    fn test_headerless_frame_count() {
        let bytes = record(&numbered_frames(4), false);
        let container = Container::from_bytes(bytes).unwrap();
        assert!(!container.has_header());
        assert_eq!(container.frame_count(), 4);
        assert_eq!(container.frame_base(0), 0);
        assert_eq!(container.frame_base(3), 3 * FRAME_SIZE);
    }

    #[test]
    fn test_header_frame_base() {
        let bytes = record(&numbered_frames(2), true);
        let container = Container::from_bytes(bytes).unwrap();
        assert!(container.has_header());
        assert_eq!(container.header_size(), HEADER_SIZE);
        assert_eq!(container.frame_count(), 2);
        assert_eq!(container.frame_base(1), HEADER_SIZE + FRAME_SIZE);
    }

    #[test]
    fn test_roundtrip_every_frame() {
        let frames = numbered_frames(6);
        let container = Container::from_bytes(record(&frames, true)).unwrap();

        for (i, expected) in frames.iter().enumerate() {
            let loaded = container.read_frame(i).unwrap();
            assert_eq!(&loaded, expected, "Mismatch at frame {}", i);

            let base = container.frame_base(i);
            assert_eq!(
                container.sample(base, Voxel::new(i % 8, 0, 0)),
                expected.get(i % 8, 0, 0)
            );
        }
    }

    #[test]
    fn test_partial_frame_is_warning() {
        let mut bytes = record(&numbered_frames(1), true);
        bytes.extend_from_slice(&[7u8; FRAME_SIZE / 2]);

        let container = Container::from_bytes(bytes).unwrap();
        assert_eq!(container.frame_count(), 1);
        assert_eq!(container.trailing_bytes(), FRAME_SIZE / 2);
    }

    #[test]
    fn test_too_short_is_format_error() {
        let mut bytes = vec![0u8; HEADER_SIZE + FRAME_SIZE - 1];
        bytes[..2].copy_from_slice(b"Ls");
        let err = Container::from_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TooShort {
                required,
                ..
            } if required == HEADER_SIZE + FRAME_SIZE
        ));

        assert!(Container::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_read_frame_out_of_range() {
        let container = Container::from_bytes(record(&numbered_frames(2), false)).unwrap();
        assert!(matches!(
            container.read_frame(2),
            Err(FormatError::FrameOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_frames_iterator() {
        let frames = numbered_frames(3);
        let container = Container::from_bytes(record(&frames, false)).unwrap();
        let iter = container.frames();
        assert_eq!(iter.len(), 3);
        let loaded: Vec<_> = iter.collect();
        assert_eq!(loaded, frames);
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movie.raw");
        std::fs::write(&path, record(&numbered_frames(2), true)).unwrap();

        let container = Container::open(&path).unwrap();
        assert_eq!(container.frame_count(), 2);

        let missing = Container::open(dir.path().join("missing.raw"));
        assert!(matches!(missing, Err(FormatError::Io(_))));
    }
}
