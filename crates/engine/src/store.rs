//! Batched, order-preserving media group store.
//!
//! `upsert_batch` touches each group key at most once for reading and once
//! for writing, however many fragments of that group arrive in the batch.
//!
//! Two concurrent batches hitting the same group are a read-modify-write
//! race: the later write wins and can drop fragments the other batch added.
//! Callers that need stronger guarantees must serialize per group key or use
//! a backend that does.

use std::sync::Arc;

use {
    futures::future::try_join_all,
    tracing::{debug, trace},
};

use crate::{
    Result,
    backend::GroupBackend,
    fragment::{Fragment, FragmentId},
};

/// Accumulates fragments into groups on top of a [`GroupBackend`].
#[derive(Clone)]
pub struct FragmentStore {
    backend: Arc<dyn GroupBackend>,
    key_prefix: String,
}

impl FragmentStore {
    pub fn new(backend: Arc<dyn GroupBackend>) -> Self {
        Self {
            backend,
            key_prefix: String::new(),
        }
    }

    /// Prefix every backend key, so several stores can share one backend.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn backend_key(&self, group_key: &str) -> String {
        format!("{}{group_key}", self.key_prefix)
    }

    /// Store a batch of fragments.
    ///
    /// Fragments without a group key are dropped. Within a group a fragment
    /// already present (same message id and chat) is replaced at its
    /// position; new ones are appended in arrival order.
    pub async fn upsert_batch(&self, fragments: &[Fragment]) -> Result<()> {
        let batches = partition_by_group(fragments);
        if batches.is_empty() {
            trace!(count = fragments.len(), "no grouped fragments in batch");
            return Ok(());
        }

        try_join_all(
            batches
                .into_iter()
                .map(|(group_key, incoming)| self.merge_group(group_key, incoming)),
        )
        .await?;
        Ok(())
    }

    async fn merge_group(&self, group_key: &str, incoming: Vec<&Fragment>) -> Result<()> {
        let key = self.backend_key(group_key);
        let mut group = self.backend.read(&key).await?.unwrap_or_default();
        let before = group.len();

        for fragment in incoming {
            merge_fragment(&mut group, fragment);
        }

        debug!(
            group_key,
            added = group.len() - before,
            total = group.len(),
            "storing media group"
        );
        self.backend.write(&key, &group).await
    }

    /// Fetch a stored group. `None` means nothing was ever stored under the
    /// key (or it was deleted), never an empty group.
    pub async fn get(&self, group_key: &str) -> Result<Option<Vec<Fragment>>> {
        self.backend.read(&self.backend_key(group_key)).await
    }

    /// Remove a group. Removing an unknown group is a no-op.
    pub async fn delete(&self, group_key: &str) -> Result<()> {
        debug!(group_key, "deleting media group");
        self.backend.delete(&self.backend_key(group_key)).await
    }
}

/// Split fragments by group key, keeping arrival order inside each group.
fn partition_by_group(fragments: &[Fragment]) -> Vec<(&str, Vec<&Fragment>)> {
    let mut batches: Vec<(&str, Vec<&Fragment>)> = Vec::new();
    for fragment in fragments {
        let Some(group_key) = fragment.group_key() else {
            continue;
        };
        match batches.iter_mut().find(|(key, _)| *key == group_key) {
            Some((_, members)) => members.push(fragment),
            None => batches.push((group_key, vec![fragment])),
        }
    }
    batches
}

fn merge_fragment(group: &mut Vec<Fragment>, fragment: &Fragment) {
    let id: FragmentId = fragment.id();
    match group.iter_mut().find(|existing| existing.id() == id) {
        Some(slot) => *slot = fragment.clone(),
        None => group.push(fragment.clone()),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use {
        super::*,
        crate::{Error, memory::MemoryBackend},
    };

    fn grouped(message_id: i32, chat_id: i64, group: &str) -> Fragment {
        let mut fragment = Fragment::new(message_id, chat_id);
        fragment.media_group_id = Some(group.to_string());
        fragment
    }

    fn captioned(message_id: i32, chat_id: i64, group: &str, caption: &str) -> Fragment {
        let mut fragment = grouped(message_id, chat_id, group);
        fragment.caption = Some(caption.to_string());
        fragment
    }

    fn memory_store() -> FragmentStore {
        FragmentStore::new(Arc::new(MemoryBackend::new()))
    }

    /// Memory backend that counts calls per operation.
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        reads: AtomicUsize,
        writes: AtomicUsize,
        deletes: AtomicUsize,
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GroupBackend for CountingBackend {
        async fn read(&self, key: &str) -> Result<Option<Vec<Fragment>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key.to_string());
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, fragments: &[Fragment]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(key, fragments).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    struct FailingReads {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl GroupBackend for FailingReads {
        async fn read(&self, _key: &str) -> Result<Option<Vec<Fragment>>> {
            Err(Error::backend("read", std::io::Error::other("connection reset")))
        }

        async fn write(&self, _key: &str, _fragments: &[Fragment]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn groupless_fragments_are_never_stored() {
        let backend = Arc::new(CountingBackend::default());
        let store = FragmentStore::new(backend.clone());

        store
            .upsert_batch(&[Fragment::new(1, 10), Fragment::new(2, 10)])
            .await
            .unwrap();

        assert_eq!(backend.reads.load(Ordering::SeqCst), 0);
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
        assert!(backend.inner.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let backend = Arc::new(CountingBackend::default());
        let store = FragmentStore::new(backend.clone());

        store.upsert_batch(&[]).await.unwrap();
        assert_eq!(backend.reads.load(Ordering::SeqCst), 0);
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_read_and_write_per_group() {
        let backend = Arc::new(CountingBackend::default());
        let store = FragmentStore::new(backend.clone());

        store
            .upsert_batch(&[
                grouped(1, 10, "g1"),
                grouped(2, 10, "g1"),
                grouped(3, 10, "g2"),
                grouped(4, 10, "g1"),
                Fragment::new(5, 10),
            ])
            .await
            .unwrap();

        assert_eq!(backend.reads.load(Ordering::SeqCst), 2);
        assert_eq!(backend.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_splits_by_group() {
        let store = memory_store();
        let a = grouped(1, 10, "g1");
        let b = grouped(2, 10, "g1");
        let c = grouped(3, 10, "g2");

        store
            .upsert_batch(&[a.clone(), b.clone(), c.clone()])
            .await
            .unwrap();

        assert_eq!(store.get("g1").await.unwrap(), Some(vec![a, b]));
        assert_eq!(store.get("g2").await.unwrap(), Some(vec![c]));
    }

    #[tokio::test]
    async fn repeating_a_batch_is_idempotent() {
        let store = memory_store();
        let batch = vec![grouped(1, 10, "g"), grouped(2, 10, "g")];

        store.upsert_batch(&batch).await.unwrap();
        let first = store.get("g").await.unwrap().unwrap();
        store.upsert_batch(&batch).await.unwrap();
        let second = store.get("g").await.unwrap().unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn edit_keeps_position() {
        let store = memory_store();
        store
            .upsert_batch(&[captioned(1, 10, "g", "a"), captioned(2, 10, "g", "b")])
            .await
            .unwrap();

        let edited = captioned(1, 10, "g", "a edited");
        store.upsert_batch(&[edited.clone()]).await.unwrap();

        let group = store.get("g").await.unwrap().unwrap();
        assert_eq!(group, vec![edited, captioned(2, 10, "g", "b")]);
    }

    #[tokio::test]
    async fn same_message_id_in_different_chats_is_distinct() {
        let store = memory_store();
        store.upsert_batch(&[grouped(1, 100, "g")]).await.unwrap();
        store.upsert_batch(&[grouped(1, 200, "g")]).await.unwrap();

        let group = store.get("g").await.unwrap().unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].chat.id, 100);
        assert_eq!(group[1].chat.id, 200);
    }

    #[tokio::test]
    async fn later_duplicate_in_batch_wins() {
        let store = memory_store();
        store
            .upsert_batch(&[
                captioned(1, 10, "g", "first"),
                captioned(2, 10, "g", "other"),
                captioned(1, 10, "g", "second"),
            ])
            .await
            .unwrap();

        let group = store.get("g").await.unwrap().unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].caption.as_deref(), Some("second"));
        assert_eq!(group[1].caption.as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = memory_store();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_group_and_tolerates_missing() {
        let store = memory_store();
        store.upsert_batch(&[grouped(1, 10, "g")]).await.unwrap();

        store.delete("g").await.unwrap();
        assert!(store.get("g").await.unwrap().is_none());
        store.delete("g").await.unwrap();
    }

    #[tokio::test]
    async fn read_failure_propagates_without_write() {
        let backend = Arc::new(FailingReads {
            writes: AtomicUsize::new(0),
        });
        let store = FragmentStore::new(backend.clone());

        let err = store
            .upsert_batch(&[grouped(1, 10, "g")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Backend { .. }));
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn key_prefix_applies_to_backend_keys() {
        let backend = Arc::new(CountingBackend::default());
        let store = FragmentStore::new(backend.clone()).with_key_prefix("bot1:");

        store.upsert_batch(&[grouped(1, 10, "g")]).await.unwrap();

        assert_eq!(*backend.keys.lock().unwrap(), vec!["bot1:g".to_string()]);
        assert!(backend.inner.read("g").await.unwrap().is_none());
        assert_eq!(store.get("g").await.unwrap().unwrap().len(), 1);

        store.delete("g").await.unwrap();
        assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
        assert!(backend.inner.is_empty());
    }
}
