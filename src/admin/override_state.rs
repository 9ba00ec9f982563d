use crate::entities::ids::PlayerId;
use crate::error::StorageError;
use crate::persistence::repository::PlayerStateRepository;
use dashmap::DashMap;
use tracing::info;

/// Admin bypass flags. Held in memory only and reset on restart.
#[derive(Debug, Default)]
pub struct OverrideState {
    flags: DashMap<PlayerId, bool>,
}

impl OverrideState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, player_id: PlayerId) -> bool {
        self.flags.get(&player_id).map(|flag| *flag).unwrap_or(false)
    }

    pub fn enable(&self, player_id: PlayerId) {
        self.flags.insert(player_id, true);
        info!(player = %player_id, "claim override enabled");
    }

    pub fn disable(&self, player_id: PlayerId) {
        self.flags.remove(&player_id);
        info!(player = %player_id, "claim override disabled");
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self, player_id: PlayerId) -> bool {
        let mut entry = self.flags.entry(player_id).or_insert(false);
        *entry = !*entry;
        let enabled = *entry;
        drop(entry);
        if !enabled {
            self.flags.remove_if(&player_id, |_, flag| !*flag);
        }
        info!(player = %player_id, enabled, "claim override toggled");
        enabled
    }

    pub fn active_count(&self) -> usize {
        self.flags.iter().filter(|entry| *entry.value()).count()
    }
}

impl PlayerStateRepository for OverrideState {
    fn has_override(&self, player_id: PlayerId) -> Result<bool, StorageError> {
        Ok(self.has(player_id))
    }
}
