use crate::entities::ids::{GuildId, PlayerId, RoleId};
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Rank inside a guild. Claim categories are derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: RoleId,
    pub guild_id: GuildId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildMember {
    pub player_id: PlayerId,
    pub guild_id: GuildId,
    pub role_id: Option<RoleId>,
}

/// Read access to the guild subsystem.
pub trait GuildDirectory: Send + Sync {
    /// Guilds the player belongs to, in the subsystem's own order.
    fn player_guilds(&self, player_id: PlayerId) -> Result<Vec<GuildId>, StorageError>;

    fn guild_members(&self, guild_id: GuildId) -> Result<Vec<GuildMember>, StorageError>;

    /// Membership record, or `None` if the player is not in the guild.
    fn member(
        &self,
        player_id: PlayerId,
        guild_id: GuildId,
    ) -> Result<Option<GuildMember>, StorageError>;

    fn role(&self, role_id: RoleId) -> Result<Option<GuildRole>, StorageError>;
}

#[derive(Debug, Default)]
struct DirectoryInner {
    roles: HashMap<RoleId, GuildRole>,
    // Insertion order per player is the order `player_guilds` reports.
    memberships: Vec<GuildMember>,
}

/// In-memory guild directory. Mutations here do not notify any cache; callers
/// that change roles or membership must invalidate the resolver themselves.
#[derive(Debug, Default)]
pub struct InMemoryGuildDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryGuildDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role(&self, guild_id: GuildId, name: impl Into<String>) -> RoleId {
        let role = GuildRole {
            id: RoleId::new(),
            guild_id,
            name: name.into(),
        };
        let id = role.id;
        self.inner.write().roles.insert(id, role);
        id
    }

    pub fn rename_role(&self, role_id: RoleId, name: impl Into<String>) -> bool {
        match self.inner.write().roles.get_mut(&role_id) {
            Some(role) => {
                role.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Adds or updates a membership. Returns `false` if the player was
    /// already a member, in which case only the role is changed.
    pub fn join(&self, player_id: PlayerId, guild_id: GuildId, role_id: Option<RoleId>) -> bool {
        let mut inner = self.inner.write();
        if let Some(existing) = inner
            .memberships
            .iter_mut()
            .find(|member| member.player_id == player_id && member.guild_id == guild_id)
        {
            existing.role_id = role_id;
            return false;
        }
        inner.memberships.push(GuildMember {
            player_id,
            guild_id,
            role_id,
        });
        true
    }

    pub fn set_role(
        &self,
        player_id: PlayerId,
        guild_id: GuildId,
        role_id: Option<RoleId>,
    ) -> bool {
        let mut inner = self.inner.write();
        match inner
            .memberships
            .iter_mut()
            .find(|member| member.player_id == player_id && member.guild_id == guild_id)
        {
            Some(member) => {
                member.role_id = role_id;
                true
            }
            None => false,
        }
    }

    pub fn leave(&self, player_id: PlayerId, guild_id: GuildId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.memberships.len();
        inner
            .memberships
            .retain(|member| !(member.player_id == player_id && member.guild_id == guild_id));
        inner.memberships.len() != before
    }
}

impl GuildDirectory for InMemoryGuildDirectory {
    fn player_guilds(&self, player_id: PlayerId) -> Result<Vec<GuildId>, StorageError> {
        Ok(self
            .inner
            .read()
            .memberships
            .iter()
            .filter(|member| member.player_id == player_id)
            .map(|member| member.guild_id)
            .collect())
    }

    fn guild_members(&self, guild_id: GuildId) -> Result<Vec<GuildMember>, StorageError> {
        Ok(self
            .inner
            .read()
            .memberships
            .iter()
            .filter(|member| member.guild_id == guild_id)
            .copied()
            .collect())
    }

    fn member(
        &self,
        player_id: PlayerId,
        guild_id: GuildId,
    ) -> Result<Option<GuildMember>, StorageError> {
        Ok(self
            .inner
            .read()
            .memberships
            .iter()
            .find(|member| member.player_id == player_id && member.guild_id == guild_id)
            .copied())
    }

    fn role(&self, role_id: RoleId) -> Result<Option<GuildRole>, StorageError> {
        Ok(self.inner.read().roles.get(&role_id).cloned())
    }
}
