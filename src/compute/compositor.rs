//! Frame composition: container frame + transform table -> RGBA wire order.

use super::transform::{TransformTable, Voxel};
use crate::animation::{Container, VOXELS};

/// Bytes per composed voxel (R, G, B, A).
pub const BYTES_PER_VOXEL: usize = 4;

/// Size of one composed frame in bytes.
pub const COMPOSED_FRAME_SIZE: usize = VOXELS * BYTES_PER_VOXEL;

/// Alpha written when none is configured.
pub const DEFAULT_ALPHA: u8 = 200;

/// 512 RGBA samples in display order, ready for the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct ComposedFrame {
    bytes: Box<[u8; COMPOSED_FRAME_SIZE]>,
}

impl ComposedFrame {
    /// An all-zero frame (black, zero alpha).
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0u8; COMPOSED_FRAME_SIZE]),
        }
    }

    /// Every voxel set to `rgba`.
    pub fn filled(rgba: [u8; 4]) -> Self {
        let mut frame = Self::new();
        for chunk in frame.bytes.chunks_exact_mut(BYTES_PER_VOXEL) {
            chunk.copy_from_slice(&rgba);
        }
        frame
    }

    /// Horizontal layers: z-layer `z` takes `colors[z % colors.len()]`.
    pub fn layers(colors: &[[u8; 4]]) -> Self {
        let mut frame = Self::new();
        if colors.is_empty() {
            return frame;
        }
        for voxel in Voxel::all() {
            frame.set(voxel.index(), colors[voxel.z % colors.len()]);
        }
        frame
    }

    /// RGBA sample at display position `index`.
    pub fn get(&self, index: usize) -> [u8; 4] {
        let start = index * BYTES_PER_VOXEL;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes[start..start + BYTES_PER_VOXEL]);
        out
    }

    pub fn set(&mut self, index: usize, rgba: [u8; 4]) {
        let start = index * BYTES_PER_VOXEL;
        self.bytes[start..start + BYTES_PER_VOXEL].copy_from_slice(&rgba);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for ComposedFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComposedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self
            .bytes
            .chunks_exact(BYTES_PER_VOXEL)
            .filter(|px| px[..3].iter().any(|&c| c != 0))
            .count();
        f.debug_struct("ComposedFrame")
            .field("lit_voxels", &lit)
            .finish()
    }
}

/// Composes container frames into a reusable output buffer.
///
/// One compositor belongs to one playback session; it is the only writer of
/// its frame.
#[derive(Debug, Clone)]
pub struct Compositor {
    alpha: u8,
    frame: ComposedFrame,
}

impl Compositor {
    pub fn new(alpha: u8) -> Self {
        Self {
            alpha,
            frame: ComposedFrame::new(),
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Compose `frame_index` of `container`, remapped through `table` when
    /// given, and return the refreshed buffer.
    pub fn compose(
        &mut self,
        container: &Container,
        frame_index: usize,
        table: Option<&TransformTable>,
    ) -> &ComposedFrame {
        let base = container.frame_base(frame_index);
        let alpha = self.alpha;

        for (dest, px) in self
            .frame
            .bytes
            .chunks_exact_mut(BYTES_PER_VOXEL)
            .enumerate()
        {
            let src = match table {
                Some(table) => table.source(dest),
                None => Voxel::from_index(dest),
            };
            px.copy_from_slice(&container.sample(base, src).with_alpha(alpha));
        }

        &self.frame
    }

    /// Last composed frame.
    pub fn frame(&self) -> &ComposedFrame {
        &self.frame
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ContainerRecorder, RawFrame, RecorderConfig, Rgb};
    use crate::compute::TransformMatrix;
    use std::time::Instant;

    fn container_of(frames: &[RawFrame]) -> Container {
        let mut recorder = ContainerRecorder::new(Vec::new(), RecorderConfig::default()).unwrap();
        for frame in frames {
            recorder.record_frame(frame).unwrap();
        }
        Container::from_bytes(recorder.finalize().unwrap()).unwrap()
    }

    #[test]
    fn test_single_red_voxel_identity() {
        let mut frame = RawFrame::new();
        frame.set(3, 0, 0, Rgb::new(255, 0, 0));
        let container = container_of(&[frame]);

        let mut compositor = Compositor::new(DEFAULT_ALPHA);
        let composed = compositor.compose(&container, 0, None);
        assert_eq!(composed.as_bytes().len(), COMPOSED_FRAME_SIZE);

        let target = Voxel::new(3, 0, 0).index();
        for i in 0..VOXELS {
            let px = composed.get(i);
            if i == target {
                assert_eq!(px, [255, 0, 0, DEFAULT_ALPHA]);
            } else {
                assert_eq!(px, [0, 0, 0, DEFAULT_ALPHA], "Unexpected color at {}", i);
            }
        }
    }

    #[test]
    fn test_identity_table_equals_no_table() {
        let mut frame = RawFrame::new();
        for v in Voxel::all() {
            frame.set(v.x, v.y, v.z, Rgb::new(v.x as u8, v.y as u8 * 10, v.z as u8 * 20));
        }
        let container = container_of(&[frame]);

        let mut a = Compositor::default();
        let mut b = Compositor::default();
        let table = TransformTable::identity();
        assert_eq!(
            a.compose(&container, 0, None),
            b.compose(&container, 0, Some(&table))
        );
    }

    #[test]
    fn test_transform_moves_voxel() {
        let mut frame = RawFrame::new();
        frame.set(7, 0, 7, Rgb::new(1, 2, 3));
        let container = container_of(&[frame]);

        let table = TransformTable::build(&TransformMatrix::KELP);
        let mut compositor = Compositor::new(255);
        let composed = compositor.compose(&container, 0, Some(&table));

        // Source (7, 0, 7) lands on display (0, 0, 0) under the kelp orientation.
        assert_eq!(composed.get(0), [1, 2, 3, 255]);
        let lit: Vec<_> = (0..VOXELS).filter(|&i| composed.get(i)[..3] != [0, 0, 0]).collect();
        assert_eq!(lit, vec![0]);
    }

    #[test]
    fn test_selects_requested_frame() {
        let frames: Vec<_> = (0..3u8)
            .map(|i| {
                let mut f = RawFrame::new();
                f.set(0, 0, 0, Rgb::new(i + 1, 0, 0));
                f
            })
            .collect();
        let container = container_of(&frames);

        let mut compositor = Compositor::default();
        for i in 0..3 {
            assert_eq!(compositor.compose(&container, i, None).get(0)[0], i as u8 + 1);
        }
    }

    #[test]
    fn test_layers_pattern() {
        let red = [200, 0, 0, 255];
        let green = [0, 200, 0, 255];
        let frame = ComposedFrame::layers(&[red, green]);
        assert_eq!(frame.get(Voxel::new(5, 5, 0).index()), red);
        assert_eq!(frame.get(Voxel::new(5, 5, 1).index()), green);
        assert_eq!(frame.get(Voxel::new(0, 0, 6).index()), red);

        assert_eq!(ComposedFrame::layers(&[]), ComposedFrame::new());
        assert_eq!(ComposedFrame::filled(red).get(VOXELS - 1), red);
    }

    #[test]
    fn test_compose_is_fast() {
        let container = container_of(&[RawFrame::new()]);
        let table = TransformTable::build(&TransformMatrix::KELP);
        let mut compositor = Compositor::default();

        let start = Instant::now();
        for _ in 0..100 {
            compositor.compose(&container, 0, Some(&table));
        }
        // Well under a tenth of a 25 ms frame interval per frame.
        assert!(start.elapsed().as_millis() < 250);
    }
}
