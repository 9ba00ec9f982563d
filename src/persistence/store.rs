use crate::entities::claim::Claim;
use crate::entities::ids::{ClaimId, PlayerId};
use crate::error::StorageError;
use crate::persistence::repository::ClaimRepository;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory claim table. Lookups by owner scan the table, which matches how
/// claims are preloaded and served from memory in production.
#[derive(Debug, Default)]
pub struct ClaimStore {
    claims: RwLock<HashMap<ClaimId, Claim>>,
}

impl ClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.claims.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.read().is_empty()
    }
}

impl ClaimRepository for ClaimStore {
    fn get_by_id(&self, id: ClaimId) -> Result<Option<Claim>, StorageError> {
        Ok(self.claims.read().get(&id).cloned())
    }

    fn get_by_player(&self, player_id: PlayerId) -> Result<Vec<Claim>, StorageError> {
        Ok(self
            .claims
            .read()
            .values()
            .filter(|claim| claim.owner_id == player_id)
            .cloned()
            .collect())
    }

    fn get_by_name(&self, player_id: PlayerId, name: &str) -> Result<Option<Claim>, StorageError> {
        Ok(self
            .claims
            .read()
            .values()
            .find(|claim| claim.owner_id == player_id && claim.name == name)
            .cloned())
    }

    fn add(&self, claim: Claim) -> Result<(), StorageError> {
        claim.validate().map_err(StorageError::rejected)?;
        let mut claims = self.claims.write();
        if claims.contains_key(&claim.id) {
            return Err(StorageError::rejected(format!("claim {} already exists", claim.id)));
        }
        if claims
            .values()
            .any(|existing| existing.owner_id == claim.owner_id && existing.name == claim.name)
        {
            return Err(StorageError::rejected(format!(
                "claim name '{}' already used by player {}",
                claim.name, claim.owner_id
            )));
        }
        claims.insert(claim.id, claim);
        Ok(())
    }

    fn update(&self, claim: Claim) -> Result<bool, StorageError> {
        claim.validate().map_err(StorageError::rejected)?;
        let mut claims = self.claims.write();
        match claims.get_mut(&claim.id) {
            Some(existing) => {
                *existing = claim;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: ClaimId) -> Result<bool, StorageError> {
        Ok(self.claims.write().remove(&id).is_some())
    }
}
