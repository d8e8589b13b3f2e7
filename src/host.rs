//! Interfaces of the collaborators the sync core relies on but does not own.
//!
//! The GUI runtime owns editors and their selections, the binding layer owns
//! window/grid mappings and layout sync, the change tracker owns the per-document
//! mutation lock, and the transport owns the RPC channel to the engine.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use crate::engine::CommandBatch;
use crate::model::buffer::LineRange;
use crate::model::cursor::Selections;
use crate::model::mode::CursorShape;
use crate::model::position::Position;
use crate::model::{DocumentId, EditorId, GridId, WindowId};
use crate::sync::renderer::Reveal;

/// Synchronous view of the GUI's editors.
pub trait EditorSurface: Send + Sync {
    fn visible_editors(&self) -> Vec<EditorId>;
    /// The focused editor, if any.
    fn active_editor(&self) -> Option<EditorId>;
    /// `None` once the editor is closed.
    fn document_of(&self, editor: EditorId) -> Option<DocumentId>;
    fn line_text(&self, doc: DocumentId, line: usize) -> Option<String>;
    /// Visible line spans, primary first. Empty if the editor is off screen.
    fn visible_ranges(&self, editor: EditorId) -> Vec<LineRange>;
    fn set_selections(&self, editor: EditorId, selections: Selections);
    fn reveal(&self, editor: EditorId, target: Position, reveal: Reveal);
    fn set_cursor_shape(&self, editor: EditorId, shape: CursorShape);
}

#[async_trait]
pub trait WindowBindings: Send + Sync {
    fn editor_for_window(&self, window: WindowId) -> Option<EditorId>;
    fn window_for_editor(&self, editor: EditorId) -> Option<WindowId>;
    fn grid_for_window(&self, window: WindowId) -> Option<GridId>;
    /// Resolves once pending window-layout operations have settled.
    async fn await_layout_sync(&self);
}

/// Proof that a document's pending edits have been applied.
///
/// While the permit is alive no new edit can start on the document.
pub struct MutationPermit {
    _guard: OwnedMutexGuard<()>,
}

impl MutationPermit {
    pub fn held(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

#[async_trait]
pub trait MutationTracker: Send + Sync {
    /// Suspends until pending text edits for `doc` are flushed.
    ///
    /// Waiters are released in the order they started waiting.
    async fn await_mutation_completion(&self, doc: DocumentId) -> MutationPermit;
}

pub trait EngineModes: Send + Sync {
    fn is_insert_mode(&self) -> bool;
    fn is_visual_mode(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("engine channel closed")]
    Closed,
    #[error("engine rejected batch: {0}")]
    Rejected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// Send every command of `batch` in one atomic call.
    async fn send_batch(&self, batch: CommandBatch) -> Result<(), TransportError>;
}

/// Handles to every collaborator, cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct Collaborators {
    pub surface: Arc<dyn EditorSurface>,
    pub bindings: Arc<dyn WindowBindings>,
    pub mutations: Arc<dyn MutationTracker>,
    pub modes: Arc<dyn EngineModes>,
    pub transport: Arc<dyn EngineTransport>,
}
