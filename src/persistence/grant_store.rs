use crate::entities::ids::{ClaimId, PlayerId};
use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::StorageError;
use crate::persistence::repository::{ClaimPermissionRepository, PlayerAccessRepository};
use dashmap::DashMap;

/// Claim-wide grants keyed by claim. Each mutation touches one map entry,
/// so concurrent grant and revoke on the same claim never lose a bit.
#[derive(Debug, Default)]
pub struct ClaimWideGrantStore {
    grants: DashMap<ClaimId, CategorySet>,
}

impl ClaimWideGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClaimPermissionRepository for ClaimWideGrantStore {
    fn add(&self, claim_id: ClaimId, category: PermissionCategory) -> Result<bool, StorageError> {
        Ok(self.grants.entry(claim_id).or_default().insert(category))
    }

    fn remove(
        &self,
        claim_id: ClaimId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        let removed = match self.grants.get_mut(&claim_id) {
            Some(mut set) => set.remove(category),
            None => false,
        };
        self.grants.remove_if(&claim_id, |_, set| set.is_empty());
        Ok(removed)
    }

    fn get_by_claim(&self, claim_id: ClaimId) -> Result<CategorySet, StorageError> {
        Ok(self
            .grants
            .get(&claim_id)
            .map(|set| *set)
            .unwrap_or_default())
    }
}

/// Per-player grants keyed by (claim, player).
#[derive(Debug, Default)]
pub struct PlayerGrantStore {
    grants: DashMap<(ClaimId, PlayerId), CategorySet>,
}

impl PlayerGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerAccessRepository for PlayerGrantStore {
    fn add(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        Ok(self
            .grants
            .entry((claim_id, player_id))
            .or_default()
            .insert(category))
    }

    fn remove(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
        category: PermissionCategory,
    ) -> Result<bool, StorageError> {
        let key = (claim_id, player_id);
        let removed = match self.grants.get_mut(&key) {
            Some(mut set) => set.remove(category),
            None => false,
        };
        self.grants.remove_if(&key, |_, set| set.is_empty());
        Ok(removed)
    }

    fn get_for_player_in_claim(
        &self,
        claim_id: ClaimId,
        player_id: PlayerId,
    ) -> Result<CategorySet, StorageError> {
        Ok(self
            .grants
            .get(&(claim_id, player_id))
            .map(|set| *set)
            .unwrap_or_default())
    }

    fn get_players_with_permission(
        &self,
        claim_id: ClaimId,
    ) -> Result<Vec<(PlayerId, CategorySet)>, StorageError> {
        Ok(self
            .grants
            .iter()
            .filter(|entry| entry.key().0 == claim_id && !entry.value().is_empty())
            .map(|entry| (entry.key().1, *entry.value()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_wide_add_and_remove_report_state_changes() {
        let store = ClaimWideGrantStore::new();
        let claim = ClaimId::new();
        assert!(store.add(claim, PermissionCategory::Door).expect("add"));
        assert!(!store.add(claim, PermissionCategory::Door).expect("add again"));
        assert!(store.has_permission(claim, PermissionCategory::Door).expect("has"));
        assert!(store.remove(claim, PermissionCategory::Door).expect("remove"));
        assert!(!store.remove(claim, PermissionCategory::Door).expect("remove again"));
        assert!(store.get_by_claim(claim).expect("get").is_empty());
    }

    #[test]
    fn player_grants_are_scoped_by_claim_and_player() {
        let store = PlayerGrantStore::new();
        let claim = ClaimId::new();
        let other_claim = ClaimId::new();
        let alice = PlayerId::new();
        let bob = PlayerId::new();
        store.add(claim, alice, PermissionCategory::Build).expect("alice");
        store.add(claim, bob, PermissionCategory::View).expect("bob");
        store.add(other_claim, alice, PermissionCategory::Sleep).expect("other");

        assert!(store.has_permission(claim, alice, PermissionCategory::Build).expect("has"));
        assert!(!store.has_permission(claim, alice, PermissionCategory::Sleep).expect("has"));
        let mut holders = store.get_players_with_permission(claim).expect("holders");
        holders.sort_by_key(|(player, _)| *player);
        assert_eq!(holders.len(), 2);
        let sleep: CategorySet = [PermissionCategory::Sleep].into_iter().collect();
        assert_eq!(
            store.get_players_with_permission(other_claim).expect("other holders"),
            vec![(alice, sleep)]
        );
    }

    #[test]
    fn concurrent_grant_and_revoke_converge() {
        let store = PlayerGrantStore::new();
        let claim = ClaimId::new();
        let player = PlayerId::new();
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..500 {
                        if worker % 2 == 0 {
                            store.add(claim, player, PermissionCategory::Trade).expect("add");
                        } else {
                            store.remove(claim, player, PermissionCategory::Trade).expect("remove");
                        }
                    }
                });
            }
        });
        let holders = store.get_players_with_permission(claim).expect("holders");
        assert!(holders.len() <= 1);
        let granted = store.has_permission(claim, player, PermissionCategory::Trade).expect("has");
        assert_eq!(granted, holders.len() == 1);
    }
}
