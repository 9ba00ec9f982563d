use crate::entities::claim::Partition;
use crate::entities::ids::{ClaimId, PartitionId};
use crate::error::StorageError;
use crate::persistence::repository::PartitionRepository;
use crate::world::position::{ChunkCoord, Position2D};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct IndexInner {
    partitions: HashMap<PartitionId, Partition>,
    chunks: HashMap<ChunkCoord, Vec<PartitionId>>,
}

/// Spatial index from chunk buckets to the partitions overlapping them.
///
/// A point query reads a single bucket and tests each candidate rectangle, so
/// its cost is bounded by how many partitions share one 16x16 chunk rather
/// than by the total number of claims. The index is not world-scoped; callers
/// filter results by the owning claim's world.
#[derive(Debug, Default)]
pub struct PartitionIndex {
    inner: RwLock<IndexInner>,
}

impl PartitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, partition: Partition) -> Result<(), StorageError> {
        if !partition.area.is_valid() {
            return Err(StorageError::rejected(format!(
                "partition {} has inverted corners",
                partition.id
            )));
        }
        let mut inner = self.inner.write();
        if inner.partitions.contains_key(&partition.id) {
            return Err(StorageError::rejected(format!(
                "partition {} already indexed",
                partition.id
            )));
        }
        for chunk in partition.area.chunks() {
            inner.chunks.entry(chunk).or_default().push(partition.id);
        }
        inner.partitions.insert(partition.id, partition);
        Ok(())
    }

    pub fn delete(&self, id: PartitionId) -> Option<Partition> {
        let mut inner = self.inner.write();
        let partition = inner.partitions.remove(&id)?;
        for chunk in partition.area.chunks() {
            if let Some(bucket) = inner.chunks.get_mut(&chunk) {
                bucket.retain(|candidate| *candidate != id);
                if bucket.is_empty() {
                    inner.chunks.remove(&chunk);
                }
            }
        }
        Some(partition)
    }

    /// Every partition containing `position`, bounds inclusive.
    pub fn query(&self, position: Position2D) -> Vec<Partition> {
        let inner = self.inner.read();
        let Some(bucket) = inner.chunks.get(&position.chunk()) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter_map(|id| inner.partitions.get(id))
            .filter(|partition| partition.area.contains(position))
            .copied()
            .collect()
    }

    pub fn for_claim(&self, claim_id: ClaimId) -> Vec<Partition> {
        self.inner
            .read()
            .partitions
            .values()
            .filter(|partition| partition.claim_id == claim_id)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().partitions.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.read().chunks.len()
    }
}

impl PartitionRepository for PartitionIndex {
    fn add(&self, partition: Partition) -> Result<(), StorageError> {
        self.insert(partition)
    }

    fn remove(&self, id: PartitionId) -> Result<bool, StorageError> {
        Ok(self.delete(id).is_some())
    }

    fn get_by_position(&self, position: Position2D) -> Result<Vec<Partition>, StorageError> {
        Ok(self.query(position))
    }

    fn get_by_claim(&self, claim_id: ClaimId) -> Result<Vec<Partition>, StorageError> {
        Ok(self.for_claim(claim_id))
    }
}
