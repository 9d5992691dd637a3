//! Voxel coordinates and the axis permutation/flip transform table.
//!
//! The cube is mounted rotated relative to the orientation animations are
//! authored in. A [`TransformMatrix`] selects, for every display axis, which
//! source axis feeds it and whether it runs backwards. [`TransformTable`]
//! precomputes the resulting source voxel for all 512 display positions so
//! the per-frame work is a plain lookup.

use serde::{Deserialize, Serialize};

use crate::animation::{GRID, VOXELS};

/// Flip offset for an 8-wide axis: a negated coordinate `-i` becomes `7 - i`.
pub const DEFAULT_FLIP_OFFSET: i32 = GRID as i32 - 1;

/// One cube position, each component in [0, 8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Voxel {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Voxel {
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Voxel at position `index` of display order (z outer, y, x inner).
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self {
            x: index % GRID,
            y: (index / GRID) % GRID,
            z: index / (GRID * GRID),
        }
    }

    /// Flat index `x + 8y + 64z`, shared by display order and plane layout.
    #[inline]
    pub const fn index(self) -> usize {
        self.x + self.y * GRID + self.z * GRID * GRID
    }

    /// All 512 voxels in display order.
    pub fn all() -> impl Iterator<Item = Voxel> {
        (0..VOXELS).map(Voxel::from_index)
    }

    fn to_array(self) -> [i32; 3] {
        [self.x as i32, self.y as i32, self.z as i32]
    }
}

/// Transform configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("Transform row {row} must contain exactly one entry of +1 or -1, got {entries:?}")]
    NotOneHot { row: usize, entries: [i8; 3] },
    #[error("Flip offset {offset} maps display voxel {dest} axis {axis} to {value}, outside [0, 8)")]
    OutOfRange {
        offset: i32,
        dest: usize,
        axis: usize,
        value: i32,
    },
}

/// A 3x3 signed axis permutation.
///
/// Row `i` picks the source axis for display axis `i`; a `-1` runs that axis
/// backwards. Only one-hot rows are accepted, so this is never a general
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[[i8; 3]; 3]", into = "[[i8; 3]; 3]")]
pub struct TransformMatrix([[i8; 3]; 3]);

impl TransformMatrix {
    pub const IDENTITY: TransformMatrix = TransformMatrix([[1, 0, 0], [0, 1, 0], [0, 0, 1]]);

    /// Orientation of the installed kelp cube.
    pub const KELP: TransformMatrix = TransformMatrix([[-1, 0, 0], [0, 0, 1], [0, -1, 0]]);

    /// Validate and wrap a matrix.
    pub fn new(rows: [[i8; 3]; 3]) -> Result<Self, TransformError> {
        for (row, entries) in rows.iter().enumerate() {
            let nonzero: Vec<i8> = entries.iter().copied().filter(|&e| e != 0).collect();
            if nonzero.len() != 1 || !matches!(nonzero[0], 1 | -1) {
                return Err(TransformError::NotOneHot {
                    row,
                    entries: *entries,
                });
            }
        }
        Ok(Self(rows))
    }

    pub fn rows(&self) -> [[i8; 3]; 3] {
        self.0
    }

    /// `M · (1, 1, 1)`: the sign of each display axis.
    pub fn flip_signs(&self) -> [i32; 3] {
        self.0.map(|row| row.iter().map(|&e| i32::from(e)).sum())
    }

    /// `M · p` without the flip offset; components may be negative.
    pub fn apply(&self, p: [i32; 3]) -> [i32; 3] {
        self.0
            .map(|row| row.iter().zip(p).map(|(&e, c)| i32::from(e) * c).sum())
    }

    /// Source coordinate for a display voxel, flip offset applied per axis.
    pub fn source_of(&self, dest: Voxel, flip_offset: i32) -> [i32; 3] {
        let flip = self.flip_signs();
        let mut src = self.apply(dest.to_array());
        for axis in 0..3 {
            if flip[axis] < 0 {
                src[axis] += flip_offset;
            }
        }
        src
    }
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<[[i8; 3]; 3]> for TransformMatrix {
    type Error = TransformError;

    fn try_from(rows: [[i8; 3]; 3]) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<TransformMatrix> for [[i8; 3]; 3] {
    fn from(m: TransformMatrix) -> Self {
        m.0
    }
}

/// Precomputed source voxel for every display position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformTable {
    sources: Vec<Voxel>,
}

impl TransformTable {
    /// Table that maps every voxel to itself.
    pub fn identity() -> Self {
        Self {
            sources: Voxel::all().collect(),
        }
    }

    /// Build the table for a validated matrix with the standard flip offset.
    pub fn build(matrix: &TransformMatrix) -> Self {
        let sources = Voxel::all()
            .map(|dest| {
                let [x, y, z] = matrix.source_of(dest, DEFAULT_FLIP_OFFSET);
                debug_assert!([x, y, z].iter().all(|c| (0..GRID as i32).contains(c)));
                Voxel::new(x as usize, y as usize, z as usize)
            })
            .collect();
        Self { sources }
    }

    /// Build the table with a custom flip offset.
    ///
    /// Offsets other than 7 can push coordinates off the cube, which is
    /// reported rather than wrapped.
    pub fn build_with_flip_offset(
        matrix: &TransformMatrix,
        flip_offset: i32,
    ) -> Result<Self, TransformError> {
        let mut sources = Vec::with_capacity(VOXELS);
        for dest in Voxel::all() {
            let src = matrix.source_of(dest, flip_offset);
            for (axis, &value) in src.iter().enumerate() {
                if !(0..GRID as i32).contains(&value) {
                    return Err(TransformError::OutOfRange {
                        offset: flip_offset,
                        dest: dest.index(),
                        axis,
                        value,
                    });
                }
            }
            sources.push(Voxel::new(src[0] as usize, src[1] as usize, src[2] as usize));
        }
        Ok(Self { sources })
    }

    /// Source voxel feeding display position `dest_index`.
    #[inline]
    pub fn source(&self, dest_index: usize) -> Voxel {
        self.sources[dest_index]
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voxel> {
        self.sources.iter()
    }
}
