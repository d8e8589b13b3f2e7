use std::collections::BTreeMap;

use crate::engine::event::{RawEvent, RedrawEvent, decode_batch};
use crate::host::Collaborators;
use crate::model::mode::ModeCursorStyleMap;
use crate::model::position::{EnginePosition, PositionTranslator};
use crate::model::{DocumentId, WindowId};

use super::renderer::CursorRenderer;
use super::tasks::CursorTasks;

/// What one batch did, for callers that want to report on it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Distinct windows with a cursor update in the batch.
    pub staged: usize,
    /// Updates handed to a gated task.
    pub scheduled: usize,
    /// Updates dropped because their window has no editor.
    pub unbound: usize,
}

/// Consumes engine redraw batches and turns them into GUI cursor state.
///
/// Mode changes apply inline, in batch order. Cursor positions are staged per
/// window (the last one in a batch wins) and applied by a task per window that
/// first waits for the window's document to finish pending edits. Tasks of one
/// document run one after another in the order they were scheduled.
pub struct RedrawEventDispatcher {
    host: Collaborators,
    styles: ModeCursorStyleMap,
    tasks: CursorTasks,
}

impl RedrawEventDispatcher {
    pub fn new(host: Collaborators) -> Self {
        Self {
            host,
            styles: ModeCursorStyleMap::new(),
            tasks: CursorTasks::new(),
        }
    }

    pub fn styles(&self) -> &ModeCursorStyleMap {
        &self.styles
    }

    /// Validate and process a raw batch. Malformed records are logged and skipped.
    pub fn handle_batch(&mut self, batch: &[RawEvent]) -> BatchReport {
        let events = decode_batch(batch);
        self.handle_events(&events)
    }

    pub fn handle_events(&mut self, events: &[RedrawEvent]) -> BatchReport {
        let mut staged: BTreeMap<WindowId, EnginePosition> = BTreeMap::new();

        for event in events {
            match event {
                RedrawEvent::ViewportUpdate {
                    window,
                    cursor_line,
                    cursor_col,
                    ..
                } => {
                    staged.insert(
                        *window,
                        EnginePosition::from_zero_based(*cursor_line, *cursor_col),
                    );
                }
                RedrawEvent::ModeDefinitions { modes, .. } => {
                    for mode in modes {
                        self.styles.define(mode.name.clone(), mode.cursor_shape);
                    }
                    tracing::debug!("{} cursor styles defined", self.styles.len());
                }
                RedrawEvent::ModeChange { mode, .. } => {
                    if self.styles.apply(mode, &*self.host.surface).is_none() {
                        tracing::trace!("no cursor style for mode {mode}");
                    }
                }
            }
        }

        let mut report = BatchReport {
            staged: staged.len(),
            ..Default::default()
        };
        for (window, pos) in staged {
            if self.schedule(window, pos) {
                report.scheduled += 1;
            } else {
                report.unbound += 1;
            }
        }
        report
    }

    fn schedule(&mut self, window: WindowId, pos: EnginePosition) -> bool {
        let Some(editor) = self.host.bindings.editor_for_window(window) else {
            tracing::warn!("cursor update for {window} with no bound editor, dropping");
            return false;
        };
        let Some(doc) = self.host.surface.document_of(editor) else {
            tracing::warn!("cursor update for {window}: editor is closed, dropping");
            return false;
        };

        let host = self.host.clone();
        self.tasks.spawn(doc, async move {
            let _permit = host.mutations.await_mutation_completion(doc).await;

            // Translate against the settled text, not the text at staging time.
            let line_text = host.surface.line_text(doc, pos.row());
            let target = PositionTranslator::to_editor(pos, line_text.as_deref());
            match CursorRenderer::apply(&*host.surface, editor, target.line, target.character) {
                Ok(reveal) => {
                    tracing::trace!(
                        "{window}: cursor at {}:{} ({reveal:?})",
                        target.line,
                        target.character
                    );
                }
                Err(err) => tracing::debug!("{window}: cursor update skipped: {err}"),
            }
        });
        true
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    pub fn pending_for(&self, doc: DocumentId) -> usize {
        self.tasks.pending_for(doc)
    }

    /// Wait for every scheduled cursor update to finish.
    pub async fn settle(&mut self) {
        self.tasks.join_all().await;
    }

    pub async fn settle_document(&mut self, doc: DocumentId) {
        self.tasks.join_document(doc).await;
    }

    /// Abandon pending updates and forget all cursor styles.
    pub fn dispose(&mut self) {
        let pending = self.tasks.pending();
        if pending > 0 {
            tracing::debug!("aborting {pending} pending cursor updates");
        }
        self.tasks.abort_all();
        self.styles.clear();
    }
}
