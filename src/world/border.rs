use crate::entities::ids::WorldId;
use crate::error::StorageError;
use crate::world::position::Area;
use std::collections::HashMap;

/// Host-provided world boundary check.
pub trait WorldBorder: Send + Sync {
    fn is_inside_world_border(&self, world_id: WorldId, area: &Area) -> Result<bool, StorageError>;
}

/// Fixed borders per world. Worlds without a configured border are treated as
/// unbounded.
#[derive(Debug, Clone, Default)]
pub struct StaticWorldBorder {
    borders: HashMap<WorldId, Area>,
}

impl StaticWorldBorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_border(mut self, world_id: WorldId, border: Area) -> Self {
        self.borders.insert(world_id, border);
        self
    }
}

impl WorldBorder for StaticWorldBorder {
    fn is_inside_world_border(&self, world_id: WorldId, area: &Area) -> Result<bool, StorageError> {
        let Some(border) = self.borders.get(&world_id) else {
            return Ok(true);
        };
        Ok(border.contains(area.min) && border.contains(area.max))
    }
}
