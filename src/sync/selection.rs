use serde_json::json;

use crate::engine::{CommandBatch, EngineCommand};
use crate::host::Collaborators;
use crate::model::config::SyncConfig;
use crate::model::cursor::SelectionChange;
use crate::model::position::{EnginePosition, Position, PositionTranslator};
use crate::model::{DocumentId, WindowId};

use super::SyncError;

/// Why a selection change produced no engine commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The engine owns the caret while composing text.
    InsertMode,
    EditorClosed,
    NoSelection,
    UnboundEditor,
    /// A range selection that was not made with the pointer, or forwarding is off.
    NotForwardable,
    NoGrid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sent(CommandBatch),
    Dropped(DropReason),
}

/// Mirrors local GUI selection changes into the engine.
///
/// Separate invocations are not serialized against each other: two quick
/// changes may reach the engine in either order when their lock waits differ.
pub struct SelectionChangeHandler {
    host: Collaborators,
    config: SyncConfig,
}

impl SelectionChangeHandler {
    pub fn new(host: Collaborators, config: SyncConfig) -> Self {
        Self { host, config }
    }

    pub async fn handle(&self, change: SelectionChange) -> Result<Outcome, SyncError> {
        if self.host.modes.is_insert_mode() {
            return Ok(dropped(DropReason::InsertMode));
        }

        self.host.bindings.await_layout_sync().await;

        let Some(doc) = self.host.surface.document_of(change.editor) else {
            return Ok(dropped(DropReason::EditorClosed));
        };
        let permit = self.host.mutations.await_mutation_completion(doc).await;

        let Some(window) = self.host.bindings.window_for_editor(change.editor) else {
            return Ok(dropped(DropReason::UnboundEditor));
        };
        if change.selections.is_empty() {
            return Ok(dropped(DropReason::NoSelection));
        }

        let composed = if change.is_ranged() {
            self.compose_range(&change, doc, window)
        } else {
            Ok(self.compose_caret(&change, doc, window))
        };
        // Positions are translated; release the document before talking to the engine.
        drop(permit);

        let batch = match composed {
            Ok(batch) => batch,
            Err(reason) => return Ok(dropped(reason)),
        };
        tracing::trace!("{window}: sending {} commands", batch.len());
        self.host.transport.send_batch(batch.clone()).await?;
        Ok(Outcome::Sent(batch))
    }

    fn compose_range(
        &self,
        change: &SelectionChange,
        doc: DocumentId,
        window: WindowId,
    ) -> Result<CommandBatch, DropReason> {
        if !(change.is_from_pointer() && self.config.mouse_selection_forwarding) {
            return Err(DropReason::NotForwardable);
        }
        let (Some(first), Some(last)) = (change.selections.first(), change.selections.last())
        else {
            return Err(DropReason::NoSelection);
        };

        let mut batch = CommandBatch::new();
        if !self.host.modes.is_visual_mode() {
            let Some(grid) = self.host.bindings.grid_for_window(window) else {
                tracing::warn!("{window} has no grid, cannot start a visual selection");
                return Err(DropReason::NoGrid);
            };
            let anchor = self.translate(doc, first.anchor);
            batch.push(EngineCommand::mouse_press(
                self.config.mouse_button.clone(),
                grid,
                anchor,
            ));
            batch.push(EngineCommand::input(self.config.visual_key.clone()));
        }
        batch.push(EngineCommand::set_cursor(window, self.translate(doc, last.active)));
        Ok(batch)
    }

    fn compose_caret(
        &self,
        change: &SelectionChange,
        doc: DocumentId,
        window: WindowId,
    ) -> CommandBatch {
        let mut batch = CommandBatch::new();
        if let Some(primary) = change.primary() {
            batch.push(EngineCommand::set_cursor(
                window,
                self.translate(doc, primary.active),
            ));
        }
        if change.is_navigation() && self.host.surface.active_editor() == Some(change.editor) {
            batch.push(EngineCommand::call(
                self.config.jump_function.clone(),
                vec![json!(window.0)],
            ));
        }
        batch
    }

    fn translate(&self, doc: DocumentId, pos: Position) -> EnginePosition {
        let line_text = self.host.surface.line_text(doc, pos.line);
        PositionTranslator::to_engine(pos, line_text.as_deref())
    }
}

fn dropped(reason: DropReason) -> Outcome {
    tracing::debug!("selection change dropped: {reason:?}");
    Outcome::Dropped(reason)
}
