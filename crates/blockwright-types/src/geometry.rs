//! Block-grid geometry: positions, faces, and structure dimensions.
//!
//! The world is an integer grid. `y` is up; `north` is `-z` and `east` is
//! `+x`. All arithmetic saturates so that coordinates near the numeric limits
//! never wrap around.

use serde::{Deserialize, Serialize};

/// A block position in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North-south coordinate.
    pub z: i32,
}

impl Position {
    /// Create a position from its three coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by the given deltas.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The neighbouring position across `face`.
    pub const fn neighbor(self, face: Face) -> Self {
        let (dx, dy, dz) = face.vector();
        self.offset(dx, dy, dz)
    }

    /// The position directly below.
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The position directly above.
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Chebyshev (king-move) distance in all three axes.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        let m = if dx > dy { dx } else { dy };
        if m > dz { m } else { dz }
    }

    /// Chebyshev distance ignoring the vertical axis.
    pub const fn horizontal_chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        if dx > dz { dx } else { dz }
    }

    /// Squared euclidean distance, widened so it cannot overflow.
    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        let dz = u64::from(self.z.abs_diff(other.z));
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Face {
    /// `-y`
    Down,
    /// `+y`
    Up,
    /// `-z`
    North,
    /// `+z`
    South,
    /// `+x`
    East,
    /// `-x`
    West,
}

impl Face {
    /// Neighbour search order used by the placement protocol: below, above,
    /// then the four lateral faces.
    pub const SEARCH_ORDER: [Self; 6] = [
        Self::Down,
        Self::Up,
        Self::North,
        Self::South,
        Self::East,
        Self::West,
    ];

    /// The four horizontal faces.
    pub const LATERAL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Unit offset of this face.
    pub const fn vector(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
        }
    }

    /// The face pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

/// Width (`x`), length (`z`) and height (`y`) of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent along `x`.
    pub width: u32,
    /// Extent along `z`.
    pub length: u32,
    /// Extent along `y`.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    pub const fn new(width: u32, length: u32, height: u32) -> Self {
        Self {
            width,
            length,
            height,
        }
    }
}
