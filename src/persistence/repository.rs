//! Storage seams consumed by the decision engine.
//!
//! Every method is synchronous and is expected to be served from a local,
//! pre-loaded store: `authorize` calls several of them inline with a player
//! interaction.

use crate::entities::claim::{Claim, Partition};
use crate::entities::ids::{ClaimId, PartitionId, PlayerId};
use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::StorageError;
use crate::world::position::Position2D;

pub trait ClaimRepository: Send + Sync {
    fn get_by_id(&self, id: ClaimId) -> Result<Option<Claim>, StorageError>;

    fn get_by_player(&self, player_id: PlayerId) -> Result<Vec<Claim>, StorageError>;

    /// Claim owned by `player_id` with exactly this name.
    fn get_by_name(&self, player_id: PlayerId, name: &str) -> Result<Option<Claim>, StorageError>;

    fn add(&self, claim: Claim) -> Result<(), StorageError>;

    /// Replaces the stored record. Returns `false` if no claim has this id.
    fn update(&self, claim: Claim) -> Result<bool, StorageError>;

    fn remove(&self, id: ClaimId) -> Result<bool, StorageError>;
}

pub trait PartitionRepository: Send + Sync {
    fn add(&self, partition: Partition) -> Result<(), StorageError>;

    fn remove(&self, id: PartitionId) -> Result<bool, StorageError>;

    /// Every partition whose area contains `position`, across all worlds.
    fn get_by_position(&self, position: Position2D) -> Result<Vec<Partition>, StorageError>;

    fn get_by_claim(&self, claim_id: ClaimId) -> Result<Vec<Partition>, StorageError>;
}

/// Per-player grants.
pub trait PlayerAccessRepository: Send + Sync {
    /// Returns `true` if the grant was newly recorded.
    fn add(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError>;

    /// Returns `true` if an existing grant was removed.
    fn remove(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError>;

    fn get_for_player_in_claim(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> Result<CategorySet, StorageError>;

    /// Players holding at least one grant in the claim.
    fn get_players_with_permission(
        &self,
        claim_id: ClaimId,
    ) -> Result<Vec<(PlayerId, CategorySet)>, StorageError>;

    fn has_permission(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        Ok(self
            .get_for_player_in_claim(claim_id, player_id)?
            .contains(category))
    }
}

/// Claim-wide default grants, applying to every non-owner.
pub trait ClaimPermissionRepository: Send + Sync {
    fn add(&self, claim_id: ClaimId, category: PermissionCategory) -> Result<bool, StorageError>;

    fn remove(&self, claim_id: ClaimId, category: PermissionCategory) -> Result<bool, StorageError>;

    fn get_by_claim(&self, claim_id: ClaimId) -> Result<CategorySet, StorageError>;

    fn has_permission(
        &self,
        claim_id: ClaimId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        Ok(self.get_by_claim(claim_id)?.contains(category))
    }
}

/// Transient per-player state. Never persisted with claim data.
pub trait PlayerStateRepository: Send + Sync {
    fn has_override(&self, player_id: PlayerId) -> Result<bool, StorageError>;
}
