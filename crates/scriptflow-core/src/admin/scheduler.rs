//! Seam between the edit path and remote persistence.

use crate::screen::ScreenDefinition;

/// Accepts persistence work without blocking the caller.
///
/// Implementations own failure handling entirely: nothing they do may fail
/// the edit that scheduled the work.
pub trait PersistenceScheduler: Send + Sync {
    /// Schedules an upsert of `screen`. When `previous_id` differs from
    /// `screen.id` the document at `previous_id` must be gone once the write
    /// lands.
    fn schedule_upsert(&self, screen: ScreenDefinition, previous_id: &str);

    /// Schedules the deletion of the document stored under `id`.
    fn schedule_delete(&self, id: &str);
}

/// Scheduler for sessions without a remote store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl PersistenceScheduler for NoopScheduler {
    fn schedule_upsert(&self, screen: ScreenDefinition, _previous_id: &str) {
        tracing::trace!("[AdminEdit] No store attached, '{}' kept local", screen.id);
    }

    fn schedule_delete(&self, id: &str) {
        tracing::trace!("[AdminEdit] No store attached, delete of '{}' kept local", id);
    }
}
