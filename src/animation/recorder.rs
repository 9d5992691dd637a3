//! Container recorder for writing raw888 animations.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::format::{HEADER_MAGIC, HEADER_SIZE, RawFrame};

/// Configuration for container recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Prefix the frames with an "Ls" header block.
    pub with_header: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self { with_header: true }
    }
}

/// Writes frames into a raw888 container.
///
/// Usage:
/// ```ignore
/// let mut recorder = ContainerRecorder::create("sweep.raw", Default::default())?;
/// for frame in pattern::xyz_sweep() {
///     recorder.record_frame(&frame)?;
/// }
/// recorder.finalize()?;
/// ```
pub struct ContainerRecorder<W: Write> {
    writer: W,
    frames_written: usize,
}

impl ContainerRecorder<BufWriter<File>> {
    /// Create a recorder writing to a new file.
    pub fn create<P: AsRef<Path>>(path: P, config: RecorderConfig) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), config)
    }
}

impl<W: Write> ContainerRecorder<W> {
    /// Create a recorder over any writer. The header block, if configured,
    /// is written immediately.
    pub fn new(mut writer: W, config: RecorderConfig) -> io::Result<Self> {
        if config.with_header {
            let mut header = [0u8; HEADER_SIZE];
            header[..HEADER_MAGIC.len()].copy_from_slice(HEADER_MAGIC);
            writer.write_all(&header)?;
        }

        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    /// Append one frame.
    pub fn record_frame(&mut self, frame: &RawFrame) -> io::Result<()> {
        self.writer.write_all(frame.as_bytes())?;
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames recorded so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finalize(mut self) -> io::Result<W> {
        self.writer.flush()?;
        log::debug!("Recorded {} frames", self.frames_written);
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::{FRAME_SIZE, Rgb};
    use crate::animation::Container;
    use tempfile::tempdir;

    #[test]
    fn test_header_layout() {
        let recorder = ContainerRecorder::new(Vec::new(), RecorderConfig::default()).unwrap();
        let bytes = recorder.finalize().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..2], b"Ls");
        assert!(bytes[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frames_are_appended() {
        let mut recorder =
            ContainerRecorder::new(Vec::new(), RecorderConfig { with_header: false }).unwrap();
        let mut frame = RawFrame::new();
        frame.set(0, 0, 0, Rgb::new(1, 2, 3));
        recorder.record_frame(&frame).unwrap();
        recorder.record_frame(&RawFrame::new()).unwrap();
        assert_eq!(recorder.frames_written(), 2);

        let bytes = recorder.finalize().unwrap();
        assert_eq!(bytes.len(), 2 * FRAME_SIZE);
        assert_eq!(&bytes[..FRAME_SIZE], frame.as_bytes());
    }

    #[test]
    fn test_create_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorded.raw");

        let mut frame = RawFrame::new();
        frame.set(7, 7, 7, Rgb::new(255, 128, 64));
        {
            let mut recorder = ContainerRecorder::create(&path, RecorderConfig::default()).unwrap();
            recorder.record_frame(&frame).unwrap();
            recorder.finalize().unwrap();
        }

        let container = Container::open(&path).unwrap();
        assert!(container.has_header());
        assert_eq!(container.frame_count(), 1);
        assert_eq!(container.read_frame(0).unwrap(), frame);
    }
}
