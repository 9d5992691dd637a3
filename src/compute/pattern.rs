//! Synthetic test content for checking cube wiring and orientation.

use super::compositor::ComposedFrame;
use super::transform::Voxel;
use crate::animation::{GRID, RawFrame, Rgb, VOXELS};

/// Eight-frame sweep where frame `n` lights red on the `x == n` plane, green on
/// `y == n` and blue on `z == n`.
///
/// Played through a transform, each color shows which physical axis a source
/// axis ended up on.
pub fn xyz_sweep() -> Vec<RawFrame> {
    (0..GRID)
        .map(|n| {
            let mut frame = RawFrame::new();
            for v in Voxel::all() {
                let on = |c: usize| if c == n { 255 } else { 0 };
                frame.set(v.x, v.y, v.z, Rgb::new(on(v.x), on(v.y), on(v.z)));
            }
            frame
        })
        .collect()
}

/// Light exactly one voxel, `step % 512` in display order.
pub fn index_sweep(step: usize) -> ComposedFrame {
    let mut frame = ComposedFrame::new();
    frame.set(step % VOXELS, [240, 240, 240, 255]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xyz_sweep_planes() {
        let frames = xyz_sweep();
        assert_eq!(frames.len(), GRID);

        let f = &frames[2];
        assert_eq!(f.get(2, 0, 0), Rgb::new(255, 0, 0));
        assert_eq!(f.get(0, 2, 0), Rgb::new(0, 255, 0));
        assert_eq!(f.get(0, 0, 2), Rgb::new(0, 0, 255));
        assert_eq!(f.get(2, 2, 2), Rgb::new(255, 255, 255));
        assert_eq!(f.get(1, 1, 1), Rgb::BLACK);
    }

    #[test]
    fn test_index_sweep_wraps() {
        let frame = index_sweep(VOXELS + 5);
        let lit: Vec<_> = (0..VOXELS).filter(|&i| frame.get(i)[3] != 0).collect();
        assert_eq!(lit, vec![5]);
    }
}
