use crate::claims::authorizer::ClaimStores;
use crate::entities::claim::Claim;
use crate::entities::ids::{ClaimId, PlayerId};
use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::{OutcomeKind, StorageError};
use crate::guilds::directory::GuildDirectory;
use crate::sync::keyed_lock::KeyedLocks;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantResult {
    Success,
    AlreadyExists,
    ClaimNotFound,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeResult {
    Success,
    DoesNotExist,
    ClaimNotFound,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAllResult {
    /// At least one category was newly granted.
    Success,
    AllAlreadyGranted,
    ClaimNotFound,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeAllResult {
    /// At least one category was removed.
    Success,
    AllAlreadyRevoked,
    ClaimNotFound,
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildShareResult {
    Success {
        granted_count: usize,
        already_had_access_count: usize,
    },
    ClaimNotFound,
    NotClaimOwner,
    ClaimNotGuildOwned,
    NoGuildMembers,
    StorageError,
}

impl GrantResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            GrantResult::Success => OutcomeKind::Success,
            GrantResult::AlreadyExists => OutcomeKind::Conflict,
            GrantResult::ClaimNotFound => OutcomeKind::NotFound,
            GrantResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl RevokeResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            RevokeResult::Success => OutcomeKind::Success,
            RevokeResult::DoesNotExist => OutcomeKind::Conflict,
            RevokeResult::ClaimNotFound => OutcomeKind::NotFound,
            RevokeResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl GrantAllResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            GrantAllResult::Success => OutcomeKind::Success,
            GrantAllResult::AllAlreadyGranted => OutcomeKind::Conflict,
            GrantAllResult::ClaimNotFound => OutcomeKind::NotFound,
            GrantAllResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl RevokeAllResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            RevokeAllResult::Success => OutcomeKind::Success,
            RevokeAllResult::AllAlreadyRevoked => OutcomeKind::Conflict,
            RevokeAllResult::ClaimNotFound => OutcomeKind::NotFound,
            RevokeAllResult::StorageError => OutcomeKind::Storage,
        }
    }
}

impl GuildShareResult {
    pub fn kind(self) -> OutcomeKind {
        match self {
            GuildShareResult::Success { .. } => OutcomeKind::Success,
            GuildShareResult::ClaimNotFound => OutcomeKind::NotFound,
            GuildShareResult::NotClaimOwner => OutcomeKind::Unauthorized,
            GuildShareResult::ClaimNotGuildOwned | GuildShareResult::NoGuildMembers => {
                OutcomeKind::Rejected
            }
            GuildShareResult::StorageError => OutcomeKind::Storage,
        }
    }
}

/// Intermediate failure inside a locked mutation.
enum Failure {
    ClaimNotFound,
    Storage(StorageError),
}

impl From<StorageError> for Failure {
    fn from(err: StorageError) -> Self {
        Failure::Storage(err)
    }
}

/// Claim-wide and per-player grant management. Every mutation holds the
/// claim's key lock, so concurrent admins editing one claim are serialized.
pub struct GrantManager {
    stores: ClaimStores,
    guilds: Arc<dyn GuildDirectory>,
    locks: Arc<KeyedLocks<ClaimId>>,
}

impl GrantManager {
    pub fn new(
        stores: ClaimStores,
        guilds: Arc<dyn GuildDirectory>,
        locks: Arc<KeyedLocks<ClaimId>>,
    ) -> Self {
        Self {
            stores,
            guilds,
            locks,
        }
    }

    fn locked<T>(
        &self,
        claim_id: ClaimId,
        operation: &str,
        f: impl FnOnce(&Claim) -> Result<T, StorageError>,
    ) -> Result<T, Failure> {
        self.locks
            .with_lock(&claim_id, || -> Result<T, Failure> {
                let claim = self
                    .stores
                    .claims
                    .get_by_id(claim_id)?
                    .ok_or(Failure::ClaimNotFound)?;
                Ok(f(&claim)?)
            })
            .inspect_err(|failure| {
                if let Failure::Storage(err) = failure {
                    warn!(claim = %claim_id, operation, error = %err, "grant storage failure");
                }
            })
    }

    pub fn grant_claim_wide_permission(
        &self,
        claim_id: ClaimId,
        category: PermissionCategory,
    ) -> GrantResult {
        let outcome = self.locked(claim_id, "grant claim-wide", |_| {
            self.stores.claim_grants.add(claim_id, category)
        });
        match outcome {
            Ok(true) => {
                info!(claim = %claim_id, %category, "claim-wide permission granted");
                GrantResult::Success
            }
            Ok(false) => GrantResult::AlreadyExists,
            Err(Failure::ClaimNotFound) => GrantResult::ClaimNotFound,
            Err(Failure::Storage(_)) => GrantResult::StorageError,
        }
    }

    pub fn revoke_claim_wide_permission(
        &self,
        claim_id: ClaimId,
        category: PermissionCategory,
    ) -> RevokeResult {
        let outcome = self.locked(claim_id, "revoke claim-wide", |_| {
            self.stores.claim_grants.remove(claim_id, category)
        });
        match outcome {
            Ok(true) => {
                info!(claim = %claim_id, %category, "claim-wide permission revoked");
                RevokeResult::Success
            }
            Ok(false) => RevokeResult::DoesNotExist,
            Err(Failure::ClaimNotFound) => RevokeResult::ClaimNotFound,
            Err(Failure::Storage(_)) => RevokeResult::StorageError,
        }
    }

    pub fn grant_all_claim_wide_permissions(&self, claim_id: ClaimId) -> GrantAllResult {
        let outcome = self.locked(claim_id, "grant all claim-wide", |_| {
            let mut changed = 0;
            for category in PermissionCategory::ALL {
                if self.stores.claim_grants.add(claim_id, category)? {
                    changed += 1;
                }
            }
            Ok(changed)
        });
        match outcome {
            Ok(0) => GrantAllResult::AllAlreadyGranted,
            Ok(changed) => {
                info!(claim = %claim_id, changed, "all claim-wide permissions granted");
                GrantAllResult::Success
            }
            Err(Failure::ClaimNotFound) => GrantAllResult::ClaimNotFound,
            Err(Failure::Storage(_)) => GrantAllResult::StorageError,
        }
    }

    pub fn revoke_all_claim_wide_permissions(&self, claim_id: ClaimId) -> RevokeAllResult {
        let outcome = self.locked(claim_id, "revoke all claim-wide", |_| {
            let mut changed = 0;
            for category in PermissionCategory::ALL {
                if self.stores.claim_grants.remove(claim_id, category)? {
                    changed += 1;
                }
            }
            Ok(changed)
        });
        match outcome {
            Ok(0) => RevokeAllResult::AllAlreadyRevoked,
            Ok(changed) => {
                info!(claim = %claim_id, changed, "all claim-wide permissions revoked");
                RevokeAllResult::Success
            }
            Err(Failure::ClaimNotFound) => RevokeAllResult::ClaimNotFound,
            Err(Failure::Storage(_)) => RevokeAllResult::StorageError,
        }
    }

    pub fn grant_player_claim_permission(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> GrantResult {
        let outcome = self.locked(claim_id, "grant player", |_| {
            self.stores.player_grants.add(claim_id, player_id, category)
        });
        match outcome {
            Ok(true) => {
                info!(
                    claim = %claim_id,
                    player = %player_id,
                    %category,
                    "player permission granted"
                );
                GrantResult::Success
            }
            Ok(false) => GrantResult::AlreadyExists,
            Err(Failure::ClaimNotFound) => GrantResult::ClaimNotFound,
            Err(Failure::Storage(_)) => GrantResult::StorageError,
        }
    }

    pub fn revoke_player_claim_permission(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> RevokeResult {
        let outcome = self.locked(claim_id, "revoke player", |_| {
            self.stores.player_grants.remove(claim_id, player_id, category)
        });
        match outcome {
            Ok(true) => {
                info!(
                    claim = %claim_id,
                    player = %player_id,
                    %category,
                    "player permission revoked"
                );
                RevokeResult::Success
            }
            Ok(false) => RevokeResult::DoesNotExist,
            Err(Failure::ClaimNotFound) => RevokeResult::ClaimNotFound,
            Err(Failure::Storage(_)) => RevokeResult::StorageError,
        }
    }

    pub fn grant_all_player_claim_permissions(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> GrantAllResult {
        let outcome = self.locked(claim_id, "grant all player", |_| {
            self.grant_every_category(claim_id, player_id)
        });
        match outcome {
            Ok(0) => GrantAllResult::AllAlreadyGranted,
            Ok(changed) => {
                info!(
                    claim = %claim_id,
                    player = %player_id,
                    changed,
                    "all player permissions granted"
                );
                GrantAllResult::Success
            }
            Err(Failure::ClaimNotFound) => GrantAllResult::ClaimNotFound,
            Err(Failure::Storage(_)) => GrantAllResult::StorageError,
        }
    }

    pub fn revoke_all_player_claim_permissions(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> RevokeAllResult {
        let outcome = self.locked(claim_id, "revoke all player", |_| {
            let mut changed = 0;
            for category in PermissionCategory::ALL {
                if self.stores.player_grants.remove(claim_id, player_id, category)? {
                    changed += 1;
                }
            }
            Ok(changed)
        });
        match outcome {
            Ok(0) => RevokeAllResult::AllAlreadyRevoked,
            Ok(changed) => {
                info!(
                    claim = %claim_id,
                    player = %player_id,
                    changed,
                    "all player permissions revoked"
                );
                RevokeAllResult::Success
            }
            Err(Failure::ClaimNotFound) => RevokeAllResult::ClaimNotFound,
            Err(Failure::Storage(_)) => RevokeAllResult::StorageError,
        }
    }

    fn grant_every_category(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> Result<usize, StorageError> {
        let mut changed = 0;
        for category in PermissionCategory::ALL {
            if self.stores.player_grants.add(claim_id, player_id, category)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Grants every category to each member of the claim's guild except the
    /// owner. Members who already held every category count as already
    /// having access.
    pub fn grant_guild_members_claim_permissions(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> GuildShareResult {
        enum Share {
            NotOwner,
            NotGuildOwned,
            NoMembers,
            Done(usize, usize),
        }

        let outcome = self.locked(claim_id, "grant guild members", |claim| {
            if claim.owner_id != player_id {
                return Ok(Share::NotOwner);
            }
            let Some(guild_id) = claim.guild_id else {
                return Ok(Share::NotGuildOwned);
            };
            let members = self.guilds.guild_members(guild_id)?;
            if members.is_empty() {
                return Ok(Share::NoMembers);
            }
            let mut granted = 0;
            let mut already = 0;
            for member in members.iter().filter(|member| member.player_id != claim.owner_id) {
                if self.grant_every_category(claim_id, member.player_id)? > 0 {
                    granted += 1;
                } else {
                    already += 1;
                }
            }
            Ok(Share::Done(granted, already))
        });
        match outcome {
            Ok(Share::NotOwner) => GuildShareResult::NotClaimOwner,
            Ok(Share::NotGuildOwned) => GuildShareResult::ClaimNotGuildOwned,
            Ok(Share::NoMembers) => GuildShareResult::NoGuildMembers,
            Ok(Share::Done(granted_count, already_had_access_count)) => {
                info!(
                    claim = %claim_id,
                    granted_count,
                    already_had_access_count,
                    "claim shared with guild members"
                );
                GuildShareResult::Success {
                    granted_count,
                    already_had_access_count,
                }
            }
            Err(Failure::ClaimNotFound) => GuildShareResult::ClaimNotFound,
            Err(Failure::Storage(_)) => GuildShareResult::StorageError,
        }
    }

    pub fn claim_wide_permissions(&self, claim_id: ClaimId) -> Result<CategorySet, StorageError> {
        self.stores.claim_grants.get_by_claim(claim_id)
    }

    pub fn player_permissions(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> Result<CategorySet, StorageError> {
        self.stores.player_grants.get_for_player_in_claim(claim_id, player_id)
    }

    pub fn players_with_permission(
        &self,
        claim_id: ClaimId,
    ) -> Result<Vec<(PlayerId, CategorySet)>, StorageError> {
        self.stores.player_grants.get_players_with_permission(claim_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::override_state::OverrideState;
    use crate::entities::ids::{GuildId, WorldId};
    use crate::guilds::directory::InMemoryGuildDirectory;
    use crate::persistence::grant_store::{ClaimWideGrantStore, PlayerGrantStore};
    use crate::persistence::offline::Offline;
    use crate::persistence::repository::{ClaimRepository, PlayerAccessRepository};
    use crate::persistence::store::ClaimStore;
    use crate::world::partition_index::PartitionIndex;
    use crate::world::position::Position3D;

    struct Harness {
        claims: Arc<ClaimStore>,
        guilds: Arc<InMemoryGuildDirectory>,
        manager: GrantManager,
    }

    fn harness_with(player_grants: Arc<dyn PlayerAccessRepository>) -> Harness {
        let claims = Arc::new(ClaimStore::new());
        let guilds = Arc::new(InMemoryGuildDirectory::new());
        let stores = ClaimStores {
            claims: claims.clone(),
            partitions: Arc::new(PartitionIndex::new()),
            player_grants,
            claim_grants: Arc::new(ClaimWideGrantStore::new()),
            player_state: Arc::new(OverrideState::new()),
        };
        let manager = GrantManager::new(stores, guilds.clone(), Arc::new(KeyedLocks::new()));
        Harness {
            claims,
            guilds,
            manager,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(PlayerGrantStore::new()))
    }

    fn claim(h: &Harness, owner: PlayerId) -> Claim {
        let claim = Claim::new(WorldId::new(), owner, Position3D::new(0, 64, 0), "Base");
        h.claims.add(claim.clone()).expect("claim");
        claim
    }

    #[test]
    fn single_claim_wide_grants_are_idempotent() {
        let h = harness();
        let claim = claim(&h, PlayerId::new());
        let m = &h.manager;
        assert_eq!(
            m.grant_claim_wide_permission(claim.id, PermissionCategory::Door),
            GrantResult::Success
        );
        assert_eq!(
            m.grant_claim_wide_permission(claim.id, PermissionCategory::Door),
            GrantResult::AlreadyExists
        );
        assert_eq!(
            m.revoke_claim_wide_permission(claim.id, PermissionCategory::Door),
            RevokeResult::Success
        );
        let again = m.revoke_claim_wide_permission(claim.id, PermissionCategory::Door);
        assert_eq!(again, RevokeResult::DoesNotExist);
        assert_eq!(again.kind(), OutcomeKind::Conflict);
        assert_eq!(
            m.grant_claim_wide_permission(ClaimId::new(), PermissionCategory::Door),
            GrantResult::ClaimNotFound
        );
    }

    #[test]
    fn grant_all_then_revoke_all_leaves_nothing() {
        let h = harness();
        let claim = claim(&h, PlayerId::new());
        let m = &h.manager;
        m.grant_claim_wide_permission(claim.id, PermissionCategory::View);
        assert_eq!(m.grant_all_claim_wide_permissions(claim.id), GrantAllResult::Success);
        assert_eq!(m.claim_wide_permissions(claim.id).expect("read"), CategorySet::all());
        assert_eq!(m.grant_all_claim_wide_permissions(claim.id), GrantAllResult::AllAlreadyGranted);
        assert_eq!(m.revoke_all_claim_wide_permissions(claim.id), RevokeAllResult::Success);
        assert!(m.claim_wide_permissions(claim.id).expect("read").is_empty());
        assert_eq!(
            m.revoke_all_claim_wide_permissions(claim.id),
            RevokeAllResult::AllAlreadyRevoked
        );
    }

    #[test]
    fn player_grants_follow_the_same_shape() {
        let h = harness();
        let claim = claim(&h, PlayerId::new());
        let friend = PlayerId::new();
        let m = &h.manager;
        assert_eq!(
            m.grant_player_claim_permission(claim.id, friend, PermissionCategory::Trade),
            GrantResult::Success
        );
        assert_eq!(m.grant_all_player_claim_permissions(claim.id, friend), GrantAllResult::Success);
        assert_eq!(
            m.grant_all_player_claim_permissions(claim.id, friend),
            GrantAllResult::AllAlreadyGranted
        );
        assert_eq!(
            m.players_with_permission(claim.id).expect("holders"),
            vec![(friend, CategorySet::all())]
        );
        assert_eq!(
            m.revoke_player_claim_permission(claim.id, friend, PermissionCategory::Trade),
            RevokeResult::Success
        );
        assert_eq!(m.player_permissions(claim.id, friend).expect("read").len(), 13);
        assert_eq!(
            m.revoke_all_player_claim_permissions(claim.id, friend),
            RevokeAllResult::Success
        );
        assert_eq!(
            m.revoke_all_player_claim_permissions(claim.id, friend),
            RevokeAllResult::AllAlreadyRevoked
        );
        assert_eq!(
            m.revoke_player_claim_permission(ClaimId::new(), friend, PermissionCategory::Trade),
            RevokeResult::ClaimNotFound
        );
    }

    #[test]
    fn guild_share_checks_ownership_and_guild() {
        let h = harness();
        let owner = PlayerId::new();
        let mut claim = claim(&h, owner);
        let m = &h.manager;
        assert_eq!(
            m.grant_guild_members_claim_permissions(ClaimId::new(), owner),
            GuildShareResult::ClaimNotFound
        );
        assert_eq!(
            m.grant_guild_members_claim_permissions(claim.id, PlayerId::new()),
            GuildShareResult::NotClaimOwner
        );
        assert_eq!(
            m.grant_guild_members_claim_permissions(claim.id, owner),
            GuildShareResult::ClaimNotGuildOwned
        );
        let guild = GuildId::new();
        claim.guild_id = Some(guild);
        h.claims.update(claim.clone()).expect("update");
        assert_eq!(
            m.grant_guild_members_claim_permissions(claim.id, owner),
            GuildShareResult::NoGuildMembers
        );
    }

    #[test]
    fn guild_share_counts_new_and_existing_access() {
        let h = harness();
        let owner = PlayerId::new();
        let mut claim = claim(&h, owner);
        let guild = GuildId::new();
        claim.guild_id = Some(guild);
        h.claims.update(claim.clone()).expect("update");
        let veteran = PlayerId::new();
        let newcomer = PlayerId::new();
        let partial = PlayerId::new();
        for player in [owner, veteran, newcomer, partial] {
            h.guilds.join(player, guild, None);
        }
        h.manager.grant_all_player_claim_permissions(claim.id, veteran);
        h.manager
            .grant_player_claim_permission(claim.id, partial, PermissionCategory::View);

        let result = h.manager.grant_guild_members_claim_permissions(claim.id, owner);
        assert_eq!(
            result,
            GuildShareResult::Success {
                granted_count: 2,
                already_had_access_count: 1,
            }
        );
        assert!(h.manager.player_permissions(claim.id, owner).expect("owner").is_empty());
        assert_eq!(
            h.manager.player_permissions(claim.id, partial).expect("partial"),
            CategorySet::all()
        );
    }

    #[test]
    fn storage_failures_are_reported_not_raised() {
        let h = harness_with(Arc::new(Offline("player grants")));
        let claim = claim(&h, PlayerId::new());
        let result = h
            .manager
            .grant_player_claim_permission(claim.id, PlayerId::new(), PermissionCategory::Build);
        assert_eq!(result, GrantResult::StorageError);
        assert_eq!(result.kind(), OutcomeKind::Storage);
        assert_eq!(
            h.manager.revoke_all_player_claim_permissions(claim.id, PlayerId::new()),
            RevokeAllResult::StorageError
        );
        assert!(h.manager.player_permissions(claim.id, PlayerId::new()).is_err());
    }

    #[test]
    fn guild_and_claim_wide_failures_are_reported() {
        let claims = Arc::new(ClaimStore::new());
        let offline = Arc::new(Offline("guild subsystem"));
        let stores = ClaimStores {
            claims: claims.clone(),
            partitions: Arc::new(PartitionIndex::new()),
            player_grants: Arc::new(PlayerGrantStore::new()),
            claim_grants: offline.clone(),
            player_state: Arc::new(OverrideState::new()),
        };
        let manager = GrantManager::new(stores, offline, Arc::new(KeyedLocks::new()));
        let owner = PlayerId::new();
        let mut claim = Claim::new(WorldId::new(), owner, Position3D::new(0, 64, 0), "Hall");
        claim.guild_id = Some(GuildId::new());
        claims.add(claim.clone()).expect("claim");

        let shared = manager.grant_guild_members_claim_permissions(claim.id, owner);
        assert_eq!(shared, GuildShareResult::StorageError);
        assert_eq!(shared.kind(), OutcomeKind::Storage);
        assert_eq!(
            manager.grant_claim_wide_permission(claim.id, PermissionCategory::Door),
            GrantResult::StorageError
        );
        assert_eq!(
            manager.revoke_all_claim_wide_permissions(claim.id),
            RevokeAllResult::StorageError
        );
    }

    #[test]
    fn concurrent_grant_and_revoke_leave_one_consistent_state() {
        let h = harness();
        let claim = claim(&h, PlayerId::new());
        let player = PlayerId::new();
        std::thread::scope(|scope| {
            for worker in 0..6 {
                let manager = &h.manager;
                let claim_id = claim.id;
                scope.spawn(move || {
                    for _ in 0..200 {
                        if worker % 2 == 0 {
                            manager.grant_player_claim_permission(
                                claim_id,
                                player,
                                PermissionCategory::Sign,
                            );
                        } else {
                            manager.revoke_player_claim_permission(
                                claim_id,
                                player,
                                PermissionCategory::Sign,
                            );
                        }
                    }
                });
            }
        });
        let holders = h.manager.players_with_permission(claim.id).expect("holders");
        let held = h
            .manager
            .player_permissions(claim.id, player)
            .expect("read")
            .contains(PermissionCategory::Sign);
        assert_eq!(holders.len(), usize::from(held));
    }
}
