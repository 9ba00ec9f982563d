use crate::entities::ids::{ClaimId, GuildId, PartitionId, PlayerId, WorldId};
use crate::world::position::{Area, Position3D};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_CLAIM_NAME_CHARS: usize = 50;

/// A named, owned region of one world. Its shape is the union of its
/// partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub world_id: WorldId,
    pub owner_id: PlayerId,
    pub guild_id: Option<GuildId>,
    pub anchor: Position3D,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(
        world_id: WorldId,
        owner_id: PlayerId,
        anchor: Position3D,
        name: impl Into<String>,
    ) -> Self {
        Claim {
            id: ClaimId::new(),
            world_id,
            owner_id,
            guild_id: None,
            anchor,
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_guild_owned(&self) -> bool {
        self.guild_id.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        let name_chars = self.name.chars().count();
        if name_chars == 0 || name_chars > MAX_CLAIM_NAME_CHARS {
            return Err(format!(
                "claim name must be 1..={} characters, got {}",
                MAX_CLAIM_NAME_CHARS, name_chars
            ));
        }
        Ok(())
    }
}

/// One rectangular piece of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub id: PartitionId,
    pub claim_id: ClaimId,
    pub area: Area,
}

impl Partition {
    pub fn new(claim_id: ClaimId, area: Area) -> Self {
        Partition {
            id: PartitionId::new(),
            claim_id,
            area,
        }
    }
}
