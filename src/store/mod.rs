//! Persistence and remote sync collaborators.

mod json_dir;
mod memory;
mod remote;

pub use json_dir::JsonDirStore;
pub use memory::MemoryPaintingStore;
pub use remote::{MemoryRemoteStore, RemoteStore};

use crate::error::SyncResult;
use crate::serializer::Painting;

/// Local storage for finished paintings, keyed by painting id
pub trait PaintingStore: Send + Sync {
    /// Insert or replace the painting with the same id
    fn upsert(&self, painting: &Painting) -> SyncResult<()>;

    fn get_by_id(&self, id: &str) -> SyncResult<Option<Painting>>;

    fn get_all(&self) -> SyncResult<Vec<Painting>>;

    /// Deleting a painting that is not stored is not an error.
    fn delete(&self, painting: &Painting) -> SyncResult<()>;
}
