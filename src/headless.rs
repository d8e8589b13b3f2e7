//! In-memory GUI, bindings and transport.
//!
//! Stands in for a real GUI runtime in the replay binary and in tests. Each
//! document gets a FIFO mutex acting as its mutation-completion lock; window
//! layout changes hold a write lock that layout-sync waiters queue behind.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use slotmap::SlotMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockWriteGuard, RwLock};

use crate::engine::CommandBatch;
use crate::host::{
    Collaborators, EditorSurface, EngineModes, EngineTransport, MutationPermit, MutationTracker,
    TransportError, WindowBindings,
};
use crate::model::buffer::{Document, LineRange};
use crate::model::cursor::{Selection, Selections, single};
use crate::model::mode::CursorShape;
use crate::model::position::Position;
use crate::model::{DocumentId, EditorId, GridId, WindowId};
use crate::sync::Reveal;

/// GUI-side state of one editor pane.
#[derive(Debug, Clone)]
pub struct EditorView {
    pub document: DocumentId,
    pub selections: Selections,
    pub visible: LineRange,
    pub on_screen: bool,
    pub last_reveal: Option<(Position, Reveal)>,
    pub cursor_shape: Option<CursorShape>,
}

#[derive(Default)]
struct GuiState {
    documents: SlotMap<DocumentId, Document>,
    editors: SlotMap<EditorId, EditorView>,
    active: Option<EditorId>,
    window_editors: HashMap<WindowId, EditorId>,
    editor_windows: HashMap<EditorId, WindowId>,
    grids: HashMap<WindowId, GridId>,
}

pub struct HeadlessGui {
    state: Mutex<GuiState>,
    doc_locks: Mutex<HashMap<DocumentId, Arc<AsyncMutex<()>>>>,
    layout: Arc<RwLock<()>>,
}

impl Default for HeadlessGui {
    fn default() -> Self {
        Self {
            state: Mutex::new(GuiState::default()),
            doc_locks: Mutex::new(HashMap::new()),
            layout: Arc::new(RwLock::new(())),
        }
    }
}

/// Holds a document's mutation lock; edits made through it apply immediately.
pub struct PendingEdit<'a> {
    gui: &'a HeadlessGui,
    doc: DocumentId,
    _guard: OwnedMutexGuard<()>,
}

impl PendingEdit<'_> {
    pub fn set_line(&self, line: usize, text: &str) {
        if let Some(doc) = self.gui.state.lock().documents.get_mut(self.doc) {
            doc.set_line(line, text);
        }
    }

    pub fn insert_line(&self, line: usize, text: &str) {
        if let Some(doc) = self.gui.state.lock().documents.get_mut(self.doc) {
            doc.insert_line(line, text);
        }
    }
}

impl HeadlessGui {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_document(&self, name: &str, text: &str) -> DocumentId {
        self.state.lock().documents.insert(Document::new(name, text))
    }

    pub fn document(&self, doc: DocumentId) -> Option<Document> {
        self.state.lock().documents.get(doc).cloned()
    }

    /// Open a visible editor on `doc`, caret at the start. `None` if `doc` is unknown.
    pub fn open_editor(&self, doc: DocumentId, visible: LineRange) -> Option<EditorId> {
        let mut state = self.state.lock();
        if !state.documents.contains_key(doc) {
            return None;
        }
        let editor = state.editors.insert(EditorView {
            document: doc,
            selections: single(Selection::collapsed(Position::default())),
            visible,
            on_screen: true,
            last_reveal: None,
            cursor_shape: None,
        });
        if state.active.is_none() {
            state.active = Some(editor);
        }
        Some(editor)
    }

    pub fn close_editor(&self, editor: EditorId) {
        let mut state = self.state.lock();
        state.editors.remove(editor);
        if let Some(window) = state.editor_windows.remove(&editor) {
            state.window_editors.remove(&window);
            state.grids.remove(&window);
        }
        if state.active == Some(editor) {
            state.active = None;
        }
    }

    pub fn focus(&self, editor: EditorId) {
        let mut state = self.state.lock();
        if state.editors.contains_key(editor) {
            state.active = Some(editor);
        }
    }

    pub fn set_on_screen(&self, editor: EditorId, on_screen: bool) {
        if let Some(view) = self.state.lock().editors.get_mut(editor) {
            view.on_screen = on_screen;
        }
    }

    pub fn scroll_to(&self, editor: EditorId, visible: LineRange) {
        if let Some(view) = self.state.lock().editors.get_mut(editor) {
            view.visible = visible;
        }
    }

    pub fn bind_window(&self, editor: EditorId, window: WindowId, grid: GridId) {
        let mut state = self.state.lock();
        state.window_editors.insert(window, editor);
        state.editor_windows.insert(editor, window);
        state.grids.insert(window, grid);
    }

    pub fn unbind_window(&self, window: WindowId) {
        let mut state = self.state.lock();
        if let Some(editor) = state.window_editors.remove(&window) {
            state.editor_windows.remove(&editor);
        }
        state.grids.remove(&window);
    }

    pub fn editor(&self, editor: EditorId) -> Option<EditorView> {
        self.state.lock().editors.get(editor).cloned()
    }

    pub fn editors(&self) -> Vec<(EditorId, EditorView)> {
        self.state
            .lock()
            .editors
            .iter()
            .map(|(id, view)| (id, view.clone()))
            .collect()
    }

    pub fn selections(&self, editor: EditorId) -> Option<Selections> {
        self.editor(editor).map(|view| view.selections)
    }

    /// Start an edit on `doc`, holding its mutation lock until the edit is dropped.
    ///
    /// `None` if another edit is already in progress.
    pub fn begin_edit(&self, doc: DocumentId) -> Option<PendingEdit<'_>> {
        let guard = self.doc_lock(doc).try_lock_owned().ok()?;
        Some(PendingEdit {
            gui: self,
            doc,
            _guard: guard,
        })
    }

    /// Wait for the document lock, then replace one line.
    pub async fn edit_line(&self, doc: DocumentId, line: usize, text: &str) {
        let _guard = self.doc_lock(doc).lock_owned().await;
        if let Some(doc) = self.state.lock().documents.get_mut(doc) {
            doc.set_line(line, text);
        }
    }

    /// Hold the layout lock; layout-sync waiters resume once it is dropped.
    pub fn begin_layout_change(&self) -> Option<OwnedRwLockWriteGuard<()>> {
        self.layout.clone().try_write_owned().ok()
    }

    fn doc_lock(&self, doc: DocumentId) -> Arc<AsyncMutex<()>> {
        self.doc_locks
            .lock()
            .entry(doc)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

impl EditorSurface for HeadlessGui {
    fn visible_editors(&self) -> Vec<EditorId> {
        self.state
            .lock()
            .editors
            .iter()
            .filter(|(_, view)| view.on_screen)
            .map(|(id, _)| id)
            .collect()
    }

    fn active_editor(&self) -> Option<EditorId> {
        self.state.lock().active
    }

    fn document_of(&self, editor: EditorId) -> Option<DocumentId> {
        self.state.lock().editors.get(editor).map(|view| view.document)
    }

    fn line_text(&self, doc: DocumentId, line: usize) -> Option<String> {
        self.state.lock().documents.get(doc)?.line_text(line)
    }

    fn visible_ranges(&self, editor: EditorId) -> Vec<LineRange> {
        self.state
            .lock()
            .editors
            .get(editor)
            .filter(|view| view.on_screen)
            .map(|view| vec![view.visible])
            .unwrap_or_default()
    }

    fn set_selections(&self, editor: EditorId, selections: Selections) {
        if let Some(view) = self.state.lock().editors.get_mut(editor) {
            view.selections = selections;
        }
    }

    fn reveal(&self, editor: EditorId, target: Position, reveal: Reveal) {
        if let Some(view) = self.state.lock().editors.get_mut(editor) {
            view.last_reveal = Some((target, reveal));
        }
    }

    fn set_cursor_shape(&self, editor: EditorId, shape: CursorShape) {
        if let Some(view) = self.state.lock().editors.get_mut(editor) {
            view.cursor_shape = Some(shape);
        }
    }
}

#[async_trait]
impl WindowBindings for HeadlessGui {
    fn editor_for_window(&self, window: WindowId) -> Option<EditorId> {
        self.state.lock().window_editors.get(&window).copied()
    }

    fn window_for_editor(&self, editor: EditorId) -> Option<WindowId> {
        self.state.lock().editor_windows.get(&editor).copied()
    }

    fn grid_for_window(&self, window: WindowId) -> Option<GridId> {
        self.state.lock().grids.get(&window).copied()
    }

    async fn await_layout_sync(&self) {
        let _settled = self.layout.read().await;
    }
}

#[async_trait]
impl MutationTracker for HeadlessGui {
    async fn await_mutation_completion(&self, doc: DocumentId) -> MutationPermit {
        let lock = self.doc_lock(doc);
        MutationPermit::held(lock.lock_owned().await)
    }
}

/// Keeps every batch it is given; can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<CommandBatch>>,
    fail_with: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<CommandBatch> {
        self.sent.lock().clone()
    }

    pub fn take(&self) -> Vec<CommandBatch> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Reject every following batch with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.fail_with.lock() = Some(reason.into());
    }

    /// Behave like an engine that went away.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EngineTransport for RecordingTransport {
    async fn send_batch(&self, batch: CommandBatch) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if let Some(reason) = self.fail_with.lock().clone() {
            return Err(TransportError::Rejected(reason));
        }
        self.sent.lock().push(batch);
        Ok(())
    }
}

/// Bundle a headless GUI with the given modes and transport.
pub fn collaborators(
    gui: Arc<HeadlessGui>,
    modes: Arc<dyn EngineModes>,
    transport: Arc<dyn EngineTransport>,
) -> Collaborators {
    Collaborators {
        surface: gui.clone(),
        bindings: gui.clone(),
        mutations: gui,
        modes,
        transport,
    }
}
