use crate::config::RolePermissionsConfig;
use crate::entities::ids::{ClaimId, GuildId, PlayerId, RoleId};
use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::StorageError;
use crate::guilds::directory::GuildDirectory;
use crate::persistence::repository::ClaimRepository;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key inside one guild's snapshot. Members without a role share the
/// `None` entry.
type RoleKey = Option<RoleId>;

/// Immutable view of one guild's resolved role permissions.
#[derive(Debug)]
struct GuildSnapshot {
    generation: u64,
    built_at: Instant,
    roles: HashMap<RoleKey, CategorySet>,
}

impl GuildSnapshot {
    fn empty(generation: u64) -> Self {
        Self {
            generation,
            built_at: Instant::now(),
            roles: HashMap::new(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.built_at.elapsed() < ttl
    }
}

/// Resolves the categories a player holds in a guild-owned claim through
/// their guild role.
///
/// Each guild's cached entries live in a single `Arc<GuildSnapshot>`. Readers
/// clone the `Arc` and never see a half-built set. Writers build a new
/// snapshot and swap it in under the guild's map shard only, so unrelated
/// guilds do not contend. Invalidation bumps the generation, which makes any
/// population computed against the old generation a no-op.
pub struct GuildRoleResolver {
    claims: Arc<dyn ClaimRepository>,
    guilds: Arc<dyn GuildDirectory>,
    roles: RolePermissionsConfig,
    ttl: Duration,
    cache: DashMap<GuildId, Arc<GuildSnapshot>>,
}

impl GuildRoleResolver {
    pub fn new(
        claims: Arc<dyn ClaimRepository>,
        guilds: Arc<dyn GuildDirectory>,
        roles: RolePermissionsConfig,
    ) -> Self {
        let ttl = roles.cache_ttl();
        Self {
            claims,
            guilds,
            roles,
            ttl,
            cache: DashMap::new(),
        }
    }

    /// Overrides the configured TTL. `Duration::ZERO` rebuilds on every read.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn has_permission(
        &self,
        player_id: PlayerId,
        claim_id: ClaimId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        Ok(self.permissions(player_id, claim_id)?.contains(category))
    }

    /// Effective guild-derived set for the player in the claim. Empty when
    /// the claim is personal or the player is not in the owning guild.
    pub fn permissions(
        &self,
        player_id: PlayerId,
        claim_id: ClaimId,
    ) -> Result<CategorySet, StorageError> {
        let Some(claim) = self.claims.get_by_id(claim_id)? else {
            return Ok(CategorySet::empty());
        };
        let Some(guild_id) = claim.guild_id else {
            return Ok(CategorySet::empty());
        };
        let Some(member) = self.guilds.member(player_id, guild_id)? else {
            return Ok(CategorySet::empty());
        };
        self.role_permissions(guild_id, member.role_id)
    }

    fn role_permissions(
        &self,
        guild_id: GuildId,
        role_key: RoleKey,
    ) -> Result<CategorySet, StorageError> {
        let snapshot = self.current_snapshot(guild_id);
        if let Some(set) = snapshot.roles.get(&role_key) {
            return Ok(*set);
        }
        let set = self.compute(role_key)?;
        self.populate(guild_id, snapshot.generation, role_key, set);
        Ok(set)
    }

    /// Returns the guild's snapshot, replacing it with an empty one first if
    /// it outlived the TTL.
    fn current_snapshot(&self, guild_id: GuildId) -> Arc<GuildSnapshot> {
        if let Some(snapshot) = self.cache.get(&guild_id) {
            if snapshot.is_fresh(self.ttl) {
                return Arc::clone(&snapshot);
            }
        }
        let mut entry = self
            .cache
            .entry(guild_id)
            .or_insert_with(|| Arc::new(GuildSnapshot::empty(0)));
        if !entry.is_fresh(self.ttl) && !entry.roles.is_empty() {
            debug!(guild = %guild_id, "guild role snapshot expired");
            *entry = Arc::new(GuildSnapshot::empty(entry.generation + 1));
        }
        Arc::clone(&entry)
    }

    fn populate(&self, guild_id: GuildId, generation: u64, role_key: RoleKey, set: CategorySet) {
        let Some(mut entry) = self.cache.get_mut(&guild_id) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        let mut roles = entry.roles.clone();
        roles.insert(role_key, set);
        *entry = Arc::new(GuildSnapshot {
            generation,
            built_at: entry.built_at,
            roles,
        });
    }

    fn compute(&self, role_key: RoleKey) -> Result<CategorySet, StorageError> {
        let Some(role_id) = role_key else {
            return Ok(self.roles.default_categories());
        };
        let Some(role) = self.guilds.role(role_id)? else {
            return Ok(self.roles.default_categories());
        };
        match self.roles.role_categories(&role.name) {
            Some(set) => Ok(set),
            None => {
                debug!(role = role.name.as_str(), "no mapping for role, using defaults");
                Ok(self.roles.default_categories())
            }
        }
    }

    /// Discards every cached role set for the guild. Populations that started
    /// before this call will not be stored.
    pub fn invalidate_guild_cache(&self, guild_id: GuildId) {
        let mut entry = self
            .cache
            .entry(guild_id)
            .or_insert_with(|| Arc::new(GuildSnapshot::empty(0)));
        *entry = Arc::new(GuildSnapshot::empty(entry.generation + 1));
        debug!(guild = %guild_id, generation = entry.generation, "guild role cache invalidated");
    }

    pub fn clear(&self) {
        let guilds: Vec<GuildId> = self.cache.iter().map(|entry| *entry.key()).collect();
        for guild_id in guilds {
            self.invalidate_guild_cache(guild_id);
        }
    }

    /// Guilds with at least one cached role set.
    pub fn cached_guilds(&self) -> Vec<GuildId> {
        self.cache
            .iter()
            .filter(|entry| !entry.roles.is_empty())
            .map(|entry| *entry.key())
            .collect()
    }
}
