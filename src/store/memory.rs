use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::PaintingStore;
use crate::error::SyncResult;
use crate::serializer::Painting;

/// In-process store, mostly for tests and previews
#[derive(Debug, Default)]
pub struct MemoryPaintingStore {
    paintings: RwLock<BTreeMap<String, Painting>>,
}

impl MemoryPaintingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paintings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paintings.read().is_empty()
    }
}

impl PaintingStore for MemoryPaintingStore {
    fn upsert(&self, painting: &Painting) -> SyncResult<()> {
        self.paintings.write().insert(painting.id.clone(), painting.clone());
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> SyncResult<Option<Painting>> {
        Ok(self.paintings.read().get(id).cloned())
    }

    fn get_all(&self) -> SyncResult<Vec<Painting>> {
        Ok(self.paintings.read().values().cloned().collect())
    }

    fn delete(&self, painting: &Painting) -> SyncResult<()> {
        self.paintings.write().remove(&painting.id);
        Ok(())
    }
}
