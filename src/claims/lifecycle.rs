use crate::claims::authorizer::{ActionAuthorizer, ClaimAtPosition, ClaimStores};
use crate::config::ClaimsConfig;
use crate::entities::claim::{Claim, Partition, MAX_CLAIM_NAME_CHARS};
use crate::entities::ids::{ClaimId, GuildId, PlayerId, WorldId};
use crate::error::{OutcomeKind, StorageError};
use crate::guilds::directory::GuildDirectory;
use crate::guilds::role_resolver::GuildRoleResolver;
use crate::sync::keyed_lock::KeyedLocks;
use crate::world::border::WorldBorder;
use crate::world::position::{Area, Position3D};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateClaimResult {
    Success(Claim),
    LimitExceeded,
    NameCannotBeBlank,
    NameTooLong,
    NameAlreadyExists,
    TooCloseToWorldBorder,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertClaimResult {
    Success { guild_id: GuildId },
    ClaimNotFound,
    NotClaimOwner,
    AlreadyGuildOwned,
    PlayerNotInGuild,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAnchorResult {
    Success,
    ClaimNotFound,
    /// The new position is not inside the claim being moved.
    InvalidPosition,
    NoPermission,
    StorageError,
}

impl CreateClaimResult {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CreateClaimResult::Success(_) => OutcomeKind::Success,
            CreateClaimResult::NameAlreadyExists => OutcomeKind::Conflict,
            CreateClaimResult::LimitExceeded
            | CreateClaimResult::NameCannotBeBlank
            | CreateClaimResult::NameTooLong
            | CreateClaimResult::TooCloseToWorldBorder => OutcomeKind::Rejected,
            CreateClaimResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl ConvertClaimResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            ConvertClaimResult::Success { .. } => OutcomeKind::Success,
            ConvertClaimResult::ClaimNotFound => OutcomeKind::NotFound,
            ConvertClaimResult::NotClaimOwner => OutcomeKind::Unauthorized,
            ConvertClaimResult::AlreadyGuildOwned => OutcomeKind::Conflict,
            ConvertClaimResult::PlayerNotInGuild => OutcomeKind::Rejected,
            ConvertClaimResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl MoveAnchorResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            MoveAnchorResult::Success => OutcomeKind::Success,
            MoveAnchorResult::ClaimNotFound => OutcomeKind::NotFound,
            MoveAnchorResult::InvalidPosition => OutcomeKind::Rejected,
            MoveAnchorResult::NoPermission => OutcomeKind::Unauthorized,
            MoveAnchorResult::StorageError => OutcomeKind::Storage,
        }
    }
}

/// Creates claims and changes their ownership or anchor.
pub struct ClaimLifecycleManager {
    stores: ClaimStores,
    guilds: Arc<dyn GuildDirectory>,
    border: Arc<dyn WorldBorder>,
    roles: Arc<GuildRoleResolver>,
    lookup: Arc<ActionAuthorizer>,
    claim_limit: usize,
    initial_claim_size: i32,
    claim_locks: Arc<KeyedLocks<ClaimId>>,
    player_locks: KeyedLocks<PlayerId>,
}

pub struct LifecycleDeps {
    pub stores: ClaimStores,
    pub guilds: Arc<dyn GuildDirectory>,
    pub border: Arc<dyn WorldBorder>,
    pub roles: Arc<GuildRoleResolver>,
    pub lookup: Arc<ActionAuthorizer>,
    pub claim_locks: Arc<KeyedLocks<ClaimId>>,
}

impl ClaimLifecycleManager {
    pub fn new(deps: LifecycleDeps, config: &ClaimsConfig) -> Self {
        Self {
            stores: deps.stores,
            guilds: deps.guilds,
            border: deps.border,
            roles: deps.roles,
            lookup: deps.lookup,
            claim_limit: config.claim_limit,
            initial_claim_size: config.initial_claim_size,
            claim_locks: deps.claim_locks,
            player_locks: KeyedLocks::new(),
        }
    }

    pub fn create_claim(
        &self,
        player_id: PlayerId,
        name: &str,
        anchor: Position3D,
        world_id: WorldId,
    ) -> CreateClaimResult {
        let outcome = self
            .player_locks
            .with_lock(&player_id, || self.create_locked(player_id, name, anchor, world_id));
        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(player = %player_id, name, error = %err, "claim creation storage failure");
                CreateClaimResult::StorageError
            }
        }
    }

    fn create_locked(
        &self,
        player_id: PlayerId,
        name: &str,
        anchor: Position3D,
        world_id: WorldId,
    ) -> Result<CreateClaimResult, StorageError> {
        let existing = self.stores.claims.get_by_player(player_id)?;
        if existing.len() >= self.claim_limit {
            return Ok(CreateClaimResult::LimitExceeded);
        }
        if name.trim().is_empty() {
            return Ok(CreateClaimResult::NameCannotBeBlank);
        }
        if name.chars().count() > MAX_CLAIM_NAME_CHARS {
            return Ok(CreateClaimResult::NameTooLong);
        }
        if self.stores.claims.get_by_name(player_id, name)?.is_some() {
            return Ok(CreateClaimResult::NameAlreadyExists);
        }

        let Some(area) = Area::centered(anchor.to_2d(), self.initial_claim_size) else {
            return Ok(CreateClaimResult::TooCloseToWorldBorder);
        };
        if !self.border.is_inside_world_border(world_id, &area)? {
            return Ok(CreateClaimResult::TooCloseToWorldBorder);
        }

        let claim = Claim::new(world_id, player_id, anchor, name);
        let partition = Partition::new(claim.id, area);
        self.stores.claims.add(claim.clone())?;
        if let Err(err) = self.stores.partitions.add(partition) {
            match self.stores.claims.remove(claim.id) {
                Ok(_) => warn!(claim = %claim.id, "partition write failed, claim rolled back"),
                Err(rollback) => error!(
                    claim = %claim.id,
                    error = %rollback,
                    "partition write failed and claim rollback failed"
                ),
            }
            return Err(err);
        }
        info!(
            claim = %claim.id,
            player = %player_id,
            world = %world_id,
            name,
            "claim created"
        );
        Ok(CreateClaimResult::Success(claim))
    }

    /// One-way conversion of a personal claim to guild ownership.
    pub fn convert_claim_to_guild(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> ConvertClaimResult {
        let outcome = self
            .claim_locks
            .with_lock(&claim_id, || self.convert_locked(claim_id, player_id));
        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    claim = %claim_id,
                    player = %player_id,
                    error = %err,
                    "claim conversion storage failure"
                );
                ConvertClaimResult::StorageError
            }
        }
    }

    fn convert_locked(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> Result<ConvertClaimResult, StorageError> {
        let Some(mut claim) = self.stores.claims.get_by_id(claim_id)? else {
            return Ok(ConvertClaimResult::ClaimNotFound);
        };
        if claim.owner_id != player_id {
            return Ok(ConvertClaimResult::NotClaimOwner);
        }
        if claim.is_guild_owned() {
            return Ok(ConvertClaimResult::AlreadyGuildOwned);
        }
        let guilds = self.guilds.player_guilds(player_id)?;
        let Some(&guild_id) = guilds.first() else {
            return Ok(ConvertClaimResult::PlayerNotInGuild);
        };
        if guilds.len() > 1 {
            warn!(
                player = %player_id,
                guilds = guilds.len(),
                chosen = %guild_id,
                "player belongs to several guilds, converting to the first"
            );
        }

        claim.guild_id = Some(guild_id);
        if !self.stores.claims.update(claim)? {
            return Ok(ConvertClaimResult::ClaimNotFound);
        }
        self.roles.invalidate_guild_cache(guild_id);
        info!(claim = %claim_id, guild = %guild_id, "claim converted to guild ownership");
        Ok(ConvertClaimResult::Success { guild_id })
    }

    /// Moves the claim's anchor to a position inside the same claim.
    pub fn move_anchor(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        world_id: WorldId,
        position: Position3D,
    ) -> MoveAnchorResult {
        let outcome = self
            .claim_locks
            .with_lock(&claim_id, || self.move_locked(claim_id, player_id, world_id, position));
        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    claim = %claim_id,
                    player = %player_id,
                    error = %err,
                    "anchor move storage failure"
                );
                MoveAnchorResult::StorageError
            }
        }
    }

    fn move_locked(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        world_id: WorldId,
        position: Position3D,
    ) -> Result<MoveAnchorResult, StorageError> {
        let Some(mut claim) = self.stores.claims.get_by_id(claim_id)? else {
            return Ok(MoveAnchorResult::ClaimNotFound);
        };
        match self.lookup.claim_at(world_id, position.to_2d()) {
            ClaimAtPosition::Found(found) if found.id == claim_id => {}
            ClaimAtPosition::Found(_) | ClaimAtPosition::NoClaimFound => {
                return Ok(MoveAnchorResult::InvalidPosition)
            }
            ClaimAtPosition::StorageError => {
                return Err(StorageError::unavailable("claim lookup for anchor move"))
            }
        }
        // An unreadable override flag counts as no override.
        let has_override = self
            .stores
            .player_state
            .has_override(player_id)
            .unwrap_or(false);
        if claim.owner_id != player_id && !has_override {
            return Ok(MoveAnchorResult::NoPermission);
        }
        claim.anchor = position;
        if !self.stores.claims.update(claim)? {
            return Ok(MoveAnchorResult::ClaimNotFound);
        }
        info!(
            claim = %claim_id,
            x = position.x,
            y = position.y,
            z = position.z,
            "claim anchor moved"
        );
        Ok(MoveAnchorResult::Success)
    }
}
