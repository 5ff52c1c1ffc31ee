use super::buffer::EditBuffer;
use super::scheduler::PersistenceScheduler;
use crate::error::{Result, ScriptflowError};
use crate::screen::{ScreenDefinition, is_reserved};
use crate::session::SessionContext;
use std::sync::Arc;

/// What `apply_edit` changed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEdit {
    /// The screen as stored after the edit.
    pub screen: ScreenDefinition,
    /// Id the screen had before the edit.
    pub previous_id: String,
}

impl AppliedEdit {
    pub fn renamed(&self) -> bool {
        self.previous_id != self.screen.id
    }
}

/// Binds an edit form to one screen and writes it back.
///
/// Edits apply to the in-memory graph immediately; remote persistence is
/// handed to the scheduler and never awaited.
pub struct AdminEditSession {
    scheduler: Arc<dyn PersistenceScheduler>,
    current_id: Option<String>,
    buffer: Option<EditBuffer>,
}

impl AdminEditSession {
    pub fn new(scheduler: Arc<dyn PersistenceScheduler>) -> Self {
        Self {
            scheduler,
            current_id: None,
            buffer: None,
        }
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        self.buffer.as_mut()
    }

    /// Loads screen `id` into the buffer, discarding any unsaved buffer.
    ///
    /// Returns `None` (and keeps the previous binding) if `id` is unknown.
    pub fn begin_edit(&mut self, ctx: &SessionContext, id: &str) -> Option<&EditBuffer> {
        let screen = ctx.graph().get(id)?;
        self.current_id = Some(id.to_string());
        self.buffer = Some(EditBuffer::from_screen(screen));
        self.buffer.as_ref()
    }

    /// Drops the buffer and the binding.
    pub fn discard(&mut self) {
        self.current_id = None;
        self.buffer = None;
    }

    /// Applies the session's own buffer.
    pub fn apply_pending(&mut self, ctx: &mut SessionContext) -> Result<AppliedEdit> {
        let buffer = self
            .buffer
            .clone()
            .ok_or_else(|| ScriptflowError::validation("Nenhuma tela em edição."))?;
        self.apply_edit(ctx, buffer)
    }

    /// Writes `buffer` onto the bound screen.
    ///
    /// A changed id re-keys the screen before any field is merged, so a
    /// rejected rename leaves the screen untouched. The active view is
    /// rebuilt, then an upsert carrying the previous id is scheduled.
    ///
    /// # Errors
    ///
    /// - `Validation` when nothing is bound, or the rename touches a reserved
    ///   id or collides with another screen
    /// - `NotFound` when the bound screen was deleted meanwhile
    pub fn apply_edit(&mut self, ctx: &mut SessionContext, mut buffer: EditBuffer) -> Result<AppliedEdit> {
        let previous_id = self
            .current_id
            .clone()
            .ok_or_else(|| ScriptflowError::validation("Nenhuma tela em edição."))?;
        if !ctx.graph().contains(&previous_id) {
            return Err(ScriptflowError::not_found("screen", previous_id));
        }

        let new_id = buffer
            .requested_id()
            .map(str::to_string)
            .unwrap_or_else(|| previous_id.clone());

        if new_id != previous_id {
            if is_reserved(&previous_id) || is_reserved(&new_id) {
                return Err(ScriptflowError::validation(
                    "Telas do sistema não podem ser renomeadas.",
                ));
            }
            ctx.rename_screen(&previous_id, &new_id)?;
            tracing::info!("[AdminEdit] Renamed screen '{}' -> '{}'", previous_id, new_id);
        }

        let screen = {
            let screen = ctx
                .graph_mut()
                .get_mut(&new_id)
                .ok_or_else(|| ScriptflowError::internal(format!("screen '{new_id}' vanished")))?;
            buffer.merge_into(screen);
            screen.clone()
        };

        buffer.id = new_id.clone();
        self.current_id = Some(new_id.clone());
        self.buffer = Some(buffer);

        ctx.refresh_screen(&new_id);
        self.scheduler.schedule_upsert(screen.clone(), &previous_id);

        Ok(AppliedEdit {
            screen,
            previous_id,
        })
    }

    /// Removes screen `id` from the graph and schedules its remote deletion.
    ///
    /// Buttons elsewhere that target `id` are left dangling.
    ///
    /// # Errors
    ///
    /// - `Validation` for system screens
    /// - `NotFound` when `id` is unknown
    pub fn delete_screen(&mut self, ctx: &mut SessionContext, id: &str) -> Result<ScreenDefinition> {
        if is_reserved(id) {
            return Err(ScriptflowError::validation("Telas do sistema não podem ser removidas."));
        }
        let removed = ctx
            .remove_screen(id)
            .ok_or_else(|| ScriptflowError::not_found("screen", id))?;

        if self.current_id.as_deref() == Some(id) {
            self.discard();
        }
        self.scheduler.schedule_delete(id);
        tracing::info!("[AdminEdit] Deleted screen '{}'", id);

        Ok(removed)
    }
}
