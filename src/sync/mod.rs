pub mod redraw;
pub mod renderer;
pub mod selection;
pub mod tasks;

use thiserror::Error;

use crate::host::TransportError;
use crate::model::EditorId;

pub use redraw::{BatchReport, RedrawEventDispatcher};
pub use renderer::{CursorRenderer, Reveal};
pub use selection::{DropReason, Outcome, SelectionChangeHandler};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("editor {0:?} was closed")]
    EditorClosed(EditorId),
    #[error("sending to engine failed: {0}")]
    Transport(#[from] TransportError),
}
