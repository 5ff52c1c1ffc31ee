//! Debounced persistence of admin edits.
//!
//! `AutoSaveBridge` keeps at most one pending write per screen id. Every
//! schedule for a key restarts that key's quiet window; only the newest
//! write of a window reaches the store. Renames carry the ids whose remote
//! documents must disappear, and those deletes always run before the upsert.
//!
//! Failures are logged and counted, never returned: the in-memory edit has
//! already been applied and stays applied.

use scriptflow_core::admin::PersistenceScheduler;
use scriptflow_core::config::AutoSaveConfig;
use scriptflow_core::screen::{ScreenDefinition, ScreenDocumentStore};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

/// Tracing target of every auto-save outcome.
pub const AUTOSAVE_TARGET: &str = "scriptflow::autosave";

/// Counters of what reached the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoSaveStats {
    pub upserts: u64,
    pub deletes: u64,
    pub failures: u64,
    /// Writes replaced by a newer write for the same key before firing.
    pub coalesced: u64,
}

#[derive(Debug, Clone)]
enum PendingOp {
    Upsert(ScreenDefinition),
    Delete,
}

#[derive(Debug, Clone)]
struct PendingWrite {
    op: PendingOp,
    stale_ids: BTreeSet<String>,
    generation: u64,
}

#[derive(Default)]
struct PendingMap {
    entries: HashMap<String, PendingWrite>,
    next_generation: u64,
}

impl PendingMap {
    fn oldest_key(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, w)| w.generation)
            .map(|(k, _)| k.clone())
    }
}

struct Inner {
    store: Arc<dyn ScreenDocumentStore>,
    debounce: Duration,
    max_pending: usize,
    pending: Mutex<PendingMap>,
    stats: Mutex<AutoSaveStats>,
    /// Serializes store writes so a key's writes land in schedule order.
    lane: tokio::sync::Mutex<()>,
}

/// Per-key debounced scheduler in front of a `ScreenDocumentStore`.
///
/// Timers run on the ambient tokio runtime. Scheduled outside a runtime,
/// writes stay pending until [`AutoSaveBridge::flush`].
#[derive(Clone)]
pub struct AutoSaveBridge {
    inner: Arc<Inner>,
}

impl AutoSaveBridge {
    pub fn new(store: Arc<dyn ScreenDocumentStore>, debounce: Duration, max_pending: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                debounce,
                max_pending: max_pending.max(1),
                pending: Mutex::new(PendingMap::default()),
                stats: Mutex::new(AutoSaveStats::default()),
                lane: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn from_config(store: Arc<dyn ScreenDocumentStore>, config: &AutoSaveConfig) -> Self {
        Self::new(
            store,
            Duration::from_millis(config.debounce_ms),
            config.max_pending,
        )
    }

    pub fn stats(&self) -> AutoSaveStats {
        *self.inner.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    /// Fires every pending write now, oldest first.
    ///
    /// Returns the number of writes executed.
    pub async fn flush(&self) -> usize {
        let mut drained: Vec<(String, PendingWrite)> = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.entries.drain().collect()
        };
        drained.sort_by_key(|(_, w)| w.generation);

        let count = drained.len();
        for (key, write) in drained {
            self.inner.execute(&key, write).await;
        }
        if count > 0 {
            tracing::debug!(target: AUTOSAVE_TARGET, "[AutoSave] Flushed {} pending write(s)", count);
        }
        count
    }

    fn enqueue(&self, key: String, op: PendingOp, mut stale_ids: BTreeSet<String>, delay: Duration) {
        let (generation, evicted) = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());

            if let Some(previous) = pending.entries.remove(&key) {
                stale_ids.extend(previous.stale_ids);
                self.inner.bump(|s| s.coalesced += 1);
            }
            stale_ids.remove(&key);
            // A key that is upserted again is live; no older rename may delete it.
            if matches!(op, PendingOp::Upsert(_)) {
                for write in pending.entries.values_mut() {
                    write.stale_ids.remove(&key);
                }
            }

            let mut evicted = None;
            if pending.entries.len() >= self.inner.max_pending
                && Handle::try_current().is_ok()
                && let Some(oldest) = pending.oldest_key()
                && let Some(write) = pending.entries.remove(&oldest)
            {
                evicted = Some((oldest, write));
            }

            pending.next_generation += 1;
            let generation = pending.next_generation;
            pending.entries.insert(
                key.clone(),
                PendingWrite {
                    op,
                    stale_ids,
                    generation,
                },
            );
            (generation, evicted)
        };

        let Ok(handle) = Handle::try_current() else {
            tracing::debug!(
                target: AUTOSAVE_TARGET,
                "[AutoSave] No runtime, '{}' waits for flush",
                key
            );
            return;
        };

        if let Some((oldest, write)) = evicted {
            tracing::debug!(
                target: AUTOSAVE_TARGET,
                "[AutoSave] Pending limit reached, firing '{}' early",
                oldest
            );
            let inner = Arc::clone(&self.inner);
            handle.spawn(async move { inner.execute(&oldest, write).await });
        }

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            inner.fire_if_current(&key, generation).await;
        });
    }
}

impl Inner {
    fn bump(&self, f: impl FnOnce(&mut AutoSaveStats)) {
        f(&mut self.stats.lock().unwrap_or_else(|e| e.into_inner()));
    }

    async fn fire_if_current(&self, key: &str, generation: u64) {
        let write = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.entries.get(key) {
                Some(w) if w.generation == generation => pending.entries.remove(key),
                _ => None,
            }
        };
        if let Some(write) = write {
            self.execute(key, write).await;
        }
    }

    async fn execute(&self, key: &str, write: PendingWrite) {
        let _lane = self.lane.lock().await;

        for stale in &write.stale_ids {
            match self.store.delete(stale).await {
                Ok(()) => {
                    self.bump(|s| s.deletes += 1);
                    tracing::info!(
                        target: AUTOSAVE_TARGET,
                        id = %stale,
                        op = "delete",
                        "[AutoSave] Removed stale document '{}'",
                        stale
                    );
                }
                Err(e) => {
                    self.bump(|s| s.failures += 1);
                    tracing::error!(
                        target: AUTOSAVE_TARGET,
                        id = %stale,
                        op = "delete",
                        "[AutoSave] Failed to remove stale document '{}': {}",
                        stale,
                        e
                    );
                }
            }
        }

        match write.op {
            PendingOp::Upsert(screen) => match self.store.upsert(&screen).await {
                Ok(()) => {
                    self.bump(|s| s.upserts += 1);
                    tracing::info!(
                        target: AUTOSAVE_TARGET,
                        id = %key,
                        op = "upsert",
                        "[AutoSave] Saved '{}'",
                        key
                    );
                }
                Err(e) => {
                    self.bump(|s| s.failures += 1);
                    tracing::error!(
                        target: AUTOSAVE_TARGET,
                        id = %key,
                        op = "upsert",
                        "[AutoSave] Failed to save '{}': {}",
                        key,
                        e
                    );
                }
            },
            PendingOp::Delete => match self.store.delete(key).await {
                Ok(()) => {
                    self.bump(|s| s.deletes += 1);
                    tracing::info!(
                        target: AUTOSAVE_TARGET,
                        id = %key,
                        op = "delete",
                        "[AutoSave] Deleted '{}'",
                        key
                    );
                }
                Err(e) => {
                    self.bump(|s| s.failures += 1);
                    tracing::error!(
                        target: AUTOSAVE_TARGET,
                        id = %key,
                        op = "delete",
                        "[AutoSave] Failed to delete '{}': {}",
                        key,
                        e
                    );
                }
            },
        }
    }
}

impl PersistenceScheduler for AutoSaveBridge {
    fn schedule_upsert(&self, screen: ScreenDefinition, previous_id: &str) {
        let key = screen.id.clone();
        let mut stale_ids = BTreeSet::new();

        if !previous_id.is_empty() && previous_id != key {
            let cancelled = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entries
                .remove(previous_id);
            if let Some(cancelled) = cancelled {
                stale_ids.extend(cancelled.stale_ids);
                self.inner.bump(|s| s.coalesced += 1);
            }
            stale_ids.insert(previous_id.to_string());
        }

        self.enqueue(key, PendingOp::Upsert(screen), stale_ids, self.inner.debounce);
    }

    /// Deletes are not debounced; they fire as soon as the runtime runs.
    fn schedule_delete(&self, id: &str) {
        self.enqueue(id.to_string(), PendingOp::Delete, BTreeSet::new(), Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scriptflow_core::ScriptflowError;
    use scriptflow_core::error::Result;
    use scriptflow_infrastructure::InMemoryDocumentStore;

    /// Records every store call in order, then delegates.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryDocumentStore,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScreenDocumentStore for RecordingStore {
        async fn list_all(&self) -> Result<Vec<ScreenDefinition>> {
            self.inner.list_all().await
        }

        async fn upsert(&self, screen: &ScreenDefinition) -> Result<()> {
            self.calls.lock().unwrap().push(format!("upsert:{}", screen.id));
            if self.fail {
                return Err(ScriptflowError::persistence("store offline"));
            }
            self.inner.upsert(screen).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete:{}", id));
            if self.fail {
                return Err(ScriptflowError::persistence("store offline"));
            }
            self.inner.delete(id).await
        }
    }

    fn screen(id: &str, title: &str) -> ScreenDefinition {
        ScreenDefinition::new(id, title, "Texto").with_product("X")
    }

    fn bridge(store: &Arc<RecordingStore>) -> AutoSaveBridge {
        AutoSaveBridge::new(store.clone(), Duration::from_millis(800), 64)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_edits_in_window_write_once_with_latest_values() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("x1", "First"), "x1");
        tokio::time::sleep(Duration::from_millis(300)).await;
        bridge.schedule_upsert(screen("x1", "Second"), "x1");

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(store.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.calls(), vec!["upsert:x1".to_string()]);
        assert_eq!(store.inner.get("x1").unwrap()["title"], "Second");
        assert_eq!(bridge.stats().coalesced, 1);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_debounced_independently() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("x1", "A"), "x1");
        tokio::time::sleep(Duration::from_millis(400)).await;
        bridge.schedule_upsert(screen("x2", "B"), "x2");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.calls(), vec!["upsert:x1".to_string()]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_deletes_old_id_before_upsert() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("x1", "Old"), "x1");
        bridge.schedule_upsert(screen("x1b", "Renamed"), "x1");
        assert_eq!(bridge.pending_count(), 1);

        assert_eq!(bridge.flush().await, 1);

        assert_eq!(
            store.calls(),
            vec!["delete:x1".to_string(), "upsert:x1b".to_string()]
        );
        assert_eq!(store.inner.ids(), vec!["x1b".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_chain_back_to_original_id() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("b", "B"), "a");
        bridge.schedule_upsert(screen("a", "A again"), "b");
        bridge.flush().await;

        assert_eq!(store.calls(), vec!["delete:b".to_string(), "upsert:a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reused_id_is_not_deleted_by_older_rename() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("b", "B"), "a");
        bridge.schedule_upsert(screen("a", "Was c"), "c");
        tokio::time::sleep(Duration::from_millis(400)).await;
        bridge.schedule_upsert(screen("b", "B again"), "b");

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(store.inner.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(!store.calls().contains(&"delete:a".to_string()));
        assert_eq!(store.inner.get("a").unwrap()["title"], "Was c");
    }

    #[tokio::test]
    async fn test_delete_replaces_pending_upsert_but_keeps_stale_ids() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("new", "N"), "old");
        bridge.schedule_delete("new");
        bridge.flush().await;

        assert_eq!(
            store.calls(),
            vec!["delete:old".to_string(), "delete:new".to_string()]
        );
        assert_eq!(bridge.stats().upserts, 0);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_returned() {
        let store = Arc::new(RecordingStore::failing());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("x2", "B"), "x1");
        bridge.flush().await;

        let stats = bridge.stats();
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.upserts, 0);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_limit_fires_oldest_early() {
        let store = Arc::new(RecordingStore::default());
        let bridge = AutoSaveBridge::new(store.clone(), Duration::from_millis(800), 2);

        bridge.schedule_upsert(screen("a", "A"), "a");
        bridge.schedule_upsert(screen("b", "B"), "b");
        bridge.schedule_upsert(screen("c", "C"), "c");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.calls(), vec!["upsert:a".to_string()]);
        assert_eq!(bridge.pending_count(), 2);
    }

    #[test]
    fn test_without_runtime_writes_wait_for_flush() {
        let store = Arc::new(RecordingStore::default());
        let bridge = bridge(&store);

        bridge.schedule_upsert(screen("x1", "A"), "x1");
        bridge.schedule_delete("x2");
        assert_eq!(bridge.pending_count(), 2);
        assert!(store.calls().is_empty());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        assert_eq!(runtime.block_on(bridge.flush()), 2);
        assert_eq!(store.calls(), vec!["upsert:x1".to_string(), "delete:x2".to_string()]);
    }
}
