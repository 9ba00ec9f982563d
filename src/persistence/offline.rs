//! A collaborator whose every call fails, for exercising storage-error paths.

use crate::entities::ids::{ClaimId, GuildId, PlayerId, RoleId, WorldId};
use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::StorageError;
use crate::guilds::directory::{GuildDirectory, GuildMember, GuildRole};
use crate::persistence::repository::{
    ClaimPermissionRepository, PlayerAccessRepository, PlayerStateRepository,
};
use crate::world::border::WorldBorder;
use crate::world::position::Area;

#[derive(Debug, Clone, Copy)]
pub struct Offline(pub &'static str);

impl Offline {
    fn fail<T>(&self) -> Result<T, StorageError> {
        Err(StorageError::unavailable(self.0))
    }
}

impl PlayerStateRepository for Offline {
    fn has_override(&self, _: PlayerId) -> Result<bool, StorageError> {
        self.fail()
    }
}

impl PlayerAccessRepository for Offline {
    fn add(&self, _: ClaimId, _: PlayerId, _: PermissionCategory) -> Result<bool, StorageError> {
        self.fail()
    }

    fn remove(&self, _: ClaimId, _: PlayerId, _: PermissionCategory) -> Result<bool, StorageError> {
        self.fail()
    }

    fn get_for_player_in_claim(
        &self,
        _: ClaimId,
        _: PlayerId,
    ) -> Result<CategorySet, StorageError> {
        self.fail()
    }

    fn get_players_with_permission(
        &self,
        _: ClaimId,
    ) -> Result<Vec<(PlayerId, CategorySet)>, StorageError> {
        self.fail()
    }
}

impl ClaimPermissionRepository for Offline {
    fn add(&self, _: ClaimId, _: PermissionCategory) -> Result<bool, StorageError> {
        self.fail()
    }

    fn remove(&self, _: ClaimId, _: PermissionCategory) -> Result<bool, StorageError> {
        self.fail()
    }

    fn get_by_claim(&self, _: ClaimId) -> Result<CategorySet, StorageError> {
        self.fail()
    }
}

impl GuildDirectory for Offline {
    fn player_guilds(&self, _: PlayerId) -> Result<Vec<GuildId>, StorageError> {
        self.fail()
    }

    fn guild_members(&self, _: GuildId) -> Result<Vec<GuildMember>, StorageError> {
        self.fail()
    }

    fn member(&self, _: PlayerId, _: GuildId) -> Result<Option<GuildMember>, StorageError> {
        self.fail()
    }

    fn role(&self, _: RoleId) -> Result<Option<GuildRole>, StorageError> {
        self.fail()
    }
}

impl WorldBorder for Offline {
    fn is_inside_world_border(&self, _: WorldId, _: &Area) -> Result<bool, StorageError> {
        self.fail()
    }
}
