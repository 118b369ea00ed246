use std::collections::BTreeMap;

use futures::future::{self, BoxFuture};
use parking_lot::Mutex;

use crate::error::{SyncError, SyncResult};
use crate::serializer::RemotePainting;

/// Server-side document store, pushed and pulled one painting at a time.
///
/// Failures come back as values; retrying is up to the implementation.
pub trait RemoteStore: Send + Sync {
    fn push(&self, painting: RemotePainting) -> BoxFuture<'_, SyncResult<()>>;

    fn pull(&self, id: &str) -> BoxFuture<'_, SyncResult<RemotePainting>>;
}

/// Remote store kept in memory
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<BTreeMap<String, RemotePainting>>,
    /// While set, every push fails with this message
    fail_pushes: Mutex<Option<String>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make pushes fail until cleared with `None`
    pub fn set_failure(&self, message: Option<String>) {
        *self.fail_pushes.lock() = message;
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.documents.lock().keys().cloned().collect()
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn push(&self, painting: RemotePainting) -> BoxFuture<'_, SyncResult<()>> {
        let result = match self.fail_pushes.lock().clone() {
            Some(message) => Err(SyncError::Remote(message)),
            None => {
                self.documents.lock().insert(painting.id.clone(), painting);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn pull(&self, id: &str) -> BoxFuture<'_, SyncResult<RemotePainting>> {
        let result = self
            .documents
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()));
        Box::pin(future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn document(id: &str) -> RemotePainting {
        RemotePainting {
            id: id.to_string(),
            layers: Vec::new(),
            created_at: 0,
            mode: "none".into(),
            size: 128,
            height: None,
            theme: "none".into(),
            time_taken: 0,
            user_id: "user".into(),
        }
    }

    #[test]
    fn pushed_documents_can_be_pulled() {
        let remote = MemoryRemoteStore::new();
        block_on(remote.push(document("p1"))).unwrap();
        assert_eq!(block_on(remote.pull("p1")).unwrap(), document("p1"));
        assert!(matches!(block_on(remote.pull("p2")), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn failures_are_reported_not_retried() {
        let remote = MemoryRemoteStore::new();
        remote.set_failure(Some("offline".into()));
        assert!(matches!(block_on(remote.push(document("p1"))), Err(SyncError::Remote(_))));
        assert!(remote.document_ids().is_empty());
    }
}
