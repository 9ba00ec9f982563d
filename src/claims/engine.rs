use crate::admin::override_state::OverrideState;
use crate::claims::authorizer::{ActionAuthorizer, ClaimStores};
use crate::claims::grants::GrantManager;
use crate::claims::lifecycle::{ClaimLifecycleManager, LifecycleDeps};
use crate::config::ClaimsConfig;
use crate::guilds::directory::GuildDirectory;
use crate::guilds::role_resolver::GuildRoleResolver;
use crate::persistence::grant_store::{ClaimWideGrantStore, PlayerGrantStore};
use crate::persistence::store::ClaimStore;
use crate::sync::keyed_lock::KeyedLocks;
use crate::world::border::WorldBorder;
use crate::world::partition_index::PartitionIndex;
use std::sync::Arc;

/// Fully wired engine over the in-memory stores. Hosts with their own
/// repositories build the services directly from a [`ClaimStores`].
pub struct ClaimEngine {
    pub claims: Arc<ClaimStore>,
    pub partitions: Arc<PartitionIndex>,
    pub player_grants: Arc<PlayerGrantStore>,
    pub claim_grants: Arc<ClaimWideGrantStore>,
    pub overrides: Arc<OverrideState>,
    pub roles: Arc<GuildRoleResolver>,
    pub authorizer: Arc<ActionAuthorizer>,
    pub grants: GrantManager,
    pub lifecycle: ClaimLifecycleManager,
}

impl ClaimEngine {
    pub fn in_memory(
        config: &ClaimsConfig,
        guilds: Arc<dyn GuildDirectory>,
        border: Arc<dyn WorldBorder>,
    ) -> Self {
        let claims = Arc::new(ClaimStore::new());
        let partitions = Arc::new(PartitionIndex::new());
        let player_grants = Arc::new(PlayerGrantStore::new());
        let claim_grants = Arc::new(ClaimWideGrantStore::new());
        let overrides = Arc::new(OverrideState::new());
        let stores = ClaimStores {
            claims: claims.clone(),
            partitions: partitions.clone(),
            player_grants: player_grants.clone(),
            claim_grants: claim_grants.clone(),
            player_state: overrides.clone(),
        };
        let roles = Arc::new(GuildRoleResolver::new(
            claims.clone(),
            guilds.clone(),
            config.team_role_permissions.clone(),
        ));
        let authorizer = Arc::new(ActionAuthorizer::new(stores.clone(), roles.clone()));
        let claim_locks = Arc::new(KeyedLocks::new());
        let grants = GrantManager::new(stores.clone(), guilds.clone(), claim_locks.clone());
        let lifecycle = ClaimLifecycleManager::new(
            LifecycleDeps {
                stores,
                guilds,
                border,
                roles: roles.clone(),
                lookup: authorizer.clone(),
                claim_locks,
            },
            config,
        );
        Self {
            claims,
            partitions,
            player_grants,
            claim_grants,
            overrides,
            roles,
            authorizer,
            grants,
            lifecycle,
        }
    }
}
