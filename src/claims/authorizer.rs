use crate::entities::claim::Claim;
use crate::entities::ids::{PlayerId, WorldId};
use crate::entities::permission::ActionType;
use crate::error::{OutcomeKind, StorageError};
use crate::guilds::role_resolver::GuildRoleResolver;
use crate::persistence::repository::{
    ClaimPermissionRepository, ClaimRepository, PartitionRepository, PlayerAccessRepository,
    PlayerStateRepository,
};
use crate::world::position::Position2D;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decision for one player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed(Claim),
    Denied(Claim),
    /// No claim covers the position; the action is unrestricted.
    NoClaimFound,
    /// The action is never guarded by claims.
    NoAssociatedPermission,
    StorageError,
}

impl Authorization {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Authorization::Allowed(_)
            | Authorization::NoClaimFound
            | Authorization::NoAssociatedPermission => OutcomeKind::Success,
            Authorization::Denied(_) => OutcomeKind::Unauthorized,
            Authorization::StorageError => OutcomeKind::Storage,
        }
    }

    /// `false` only for an explicit denial. Storage failures fail closed.
    pub fn permits(&self) -> bool {
        matches!(
            self,
            Authorization::Allowed(_)
                | Authorization::NoClaimFound
                | Authorization::NoAssociatedPermission
        )
    }

    pub fn claim(&self) -> Option<&Claim> {
        match self {
            Authorization::Allowed(claim) | Authorization::Denied(claim) => Some(claim),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimAtPosition {
    Found(Claim),
    NoClaimFound,
    StorageError,
}

impl ClaimAtPosition {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ClaimAtPosition::Found(_) => OutcomeKind::Success,
            ClaimAtPosition::NoClaimFound => OutcomeKind::NotFound,
            ClaimAtPosition::StorageError => OutcomeKind::Storage,
        }
    }
}

/// Collaborators the authorizer reads from. Shared with the grant and
/// lifecycle services so all of them see the same stores.
#[derive(Clone)]
pub struct ClaimStores {
    pub claims: Arc<dyn ClaimRepository>,
    pub partitions: Arc<dyn PartitionRepository>,
    pub player_grants: Arc<dyn PlayerAccessRepository>,
    pub claim_grants: Arc<dyn ClaimPermissionRepository>,
    pub player_state: Arc<dyn PlayerStateRepository>,
}

pub struct ActionAuthorizer {
    stores: ClaimStores,
    roles: Arc<GuildRoleResolver>,
}

impl ActionAuthorizer {
    pub fn new(stores: ClaimStores, roles: Arc<GuildRoleResolver>) -> Self {
        Self { stores, roles }
    }

    pub fn authorize(
        &self,
        player_id: PlayerId,
        world_id: WorldId,
        position: Position2D,
        action: ActionType,
    ) -> Authorization {
        match self.decide(player_id, world_id, position, action) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    player = %player_id,
                    world = %world_id,
                    x = position.x,
                    z = position.z,
                    ?action,
                    error = %err,
                    "authorization storage failure"
                );
                Authorization::StorageError
            }
        }
    }

    fn decide(
        &self,
        player_id: PlayerId,
        world_id: WorldId,
        position: Position2D,
        action: ActionType,
    ) -> Result<Authorization, StorageError> {
        let Some(claim) = self.find_claim(world_id, position)? else {
            return Ok(Authorization::NoClaimFound);
        };
        if claim.owner_id == player_id || self.stores.player_state.has_override(player_id)? {
            return Ok(Authorization::Allowed(claim));
        }
        let Some(category) = action.category() else {
            return Ok(Authorization::NoAssociatedPermission);
        };
        if self.roles.has_permission(player_id, claim.id, category)?
            || self
                .stores
                .player_grants
                .has_permission(claim.id, player_id, category)?
            || self.stores.claim_grants.has_permission(claim.id, category)?
        {
            return Ok(Authorization::Allowed(claim));
        }
        debug!(player = %player_id, claim = %claim.id, %category, "action denied");
        Ok(Authorization::Denied(claim))
    }

    pub fn claim_at(&self, world_id: WorldId, position: Position2D) -> ClaimAtPosition {
        match self.find_claim(world_id, position) {
            Ok(Some(claim)) => ClaimAtPosition::Found(claim),
            Ok(None) => ClaimAtPosition::NoClaimFound,
            Err(err) => {
                warn!(
                    world = %world_id,
                    x = position.x,
                    z = position.z,
                    error = %err,
                    "claim lookup failed"
                );
                ClaimAtPosition::StorageError
            }
        }
    }

    /// Claim in `world_id` covering `position`. Same-world overlaps resolve
    /// to the oldest claim.
    fn find_claim(
        &self,
        world_id: WorldId,
        position: Position2D,
    ) -> Result<Option<Claim>, StorageError> {
        let partitions = self.stores.partitions.get_by_position(position)?;
        let mut candidates: Vec<Claim> = Vec::with_capacity(partitions.len());
        for partition in partitions {
            if candidates.iter().any(|claim| claim.id == partition.claim_id) {
                continue;
            }
            if let Some(claim) = self.stores.claims.get_by_id(partition.claim_id)? {
                if claim.world_id == world_id {
                    candidates.push(claim);
                }
            }
        }
        if candidates.len() > 1 {
            candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            warn!(
                world = %world_id,
                x = position.x,
                z = position.z,
                overlapping = candidates.len(),
                chosen = %candidates[0].id,
                "overlapping claims in one world, using the oldest"
            );
        }
        Ok(candidates.into_iter().next())
    }
}
