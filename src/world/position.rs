use serde::{Deserialize, Serialize};

/// Side length of one index bucket in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Horizontal block coordinate. `z` is the second horizontal axis; height is
/// never part of a claim boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position2D {
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position2D {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord {
            x: self.x.div_euclid(CHUNK_SIZE),
            z: self.z.div_euclid(CHUNK_SIZE),
        }
    }
}

impl Position3D {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn to_2d(self) -> Position2D {
        Position2D {
            x: self.x,
            z: self.z,
        }
    }
}

impl From<Position3D> for Position2D {
    fn from(position: Position3D) -> Self {
        position.to_2d()
    }
}

/// Index bucket coordinate, like a map sector but on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

/// Inclusive rectangle on the horizontal plane with `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub min: Position2D,
    pub max: Position2D,
}

impl Area {
    /// Builds an area from two arbitrary corners.
    pub fn from_corners(a: Position2D, b: Position2D) -> Self {
        Area {
            min: Position2D::new(a.x.min(b.x), a.z.min(b.z)),
            max: Position2D::new(a.x.max(b.x), a.z.max(b.z)),
        }
    }

    /// Square area of side `size` around `anchor`. Even sizes extend one
    /// block further on the positive side. `None` if a corner falls outside
    /// the coordinate range.
    pub fn centered(anchor: Position2D, size: i32) -> Option<Self> {
        let offset_min = size.checked_sub(1)? / 2;
        let offset_max = size / 2;
        Some(Area {
            min: Position2D::new(
                anchor.x.checked_sub(offset_min)?,
                anchor.z.checked_sub(offset_min)?,
            ),
            max: Position2D::new(
                anchor.x.checked_add(offset_max)?,
                anchor.z.checked_add(offset_max)?,
            ),
        })
    }

    pub fn contains(&self, position: Position2D) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.z >= self.min.z
            && position.z <= self.max.z
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.z <= self.max.z
    }

    /// Every index bucket the area touches.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkCoord> {
        let low = self.min.chunk();
        let high = self.max.chunk();
        (low.x..=high.x).flat_map(move |x| (low.z..=high.z).map(move |z| ChunkCoord { x, z }))
    }
}
