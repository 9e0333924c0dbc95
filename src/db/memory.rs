use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{ImageId, ImageRecord, NewImage, RecordStore};
use crate::digest::Digest;
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
    records: BTreeMap<ImageId, ImageRecord>,
    /// 上一次分配的 ID，只增不减
    last_id: ImageId,
}

/// 进程内存储，没有原生事务，批量删除走补偿事务
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::store("memory store lock poisoned"))
    }
}

impl RecordStore for MemoryStore {
    async fn insert(&self, image: &NewImage<'_>) -> Result<ImageId> {
        let mut state = self.lock()?;
        state.last_id += 1;
        let id = state.last_id;
        state.records.insert(
            id,
            ImageRecord {
                id,
                name: image.name.to_owned(),
                data: image.data.to_vec(),
                digest: image.digest.as_bytes().to_vec(),
                embedding: image.embedding.clone(),
            },
        );
        Ok(id)
    }

    async fn find_by_digest(&self, digest: &Digest) -> Result<Option<ImageRecord>> {
        let state = self.lock()?;
        Ok(state.records.values().find(|r| r.digest == digest.as_bytes()).cloned())
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.lock()?.records.values().cloned().collect())
    }

    async fn list_ids(&self) -> Result<Vec<ImageId>> {
        Ok(self.lock()?.records.keys().copied().collect())
    }

    async fn remove_all(&self) -> Result<u64> {
        let mut state = self.lock()?;
        let removed = state.records.len() as u64;
        state.records.clear();
        Ok(removed)
    }

    async fn restore(&self, records: &[ImageRecord]) -> Result<()> {
        let mut state = self.lock()?;
        for record in records {
            state.last_id = state.last_id.max(record.id);
            state.records.insert(record.id, record.clone());
        }
        Ok(())
    }
}
