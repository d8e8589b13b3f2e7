use tokio::sync::oneshot;

use crate::engine::RawEvent;
use crate::model::cursor::SelectionChange;

/// All possible messages that drive the sync session.
#[derive(Debug)]
pub enum Msg {
    // -- From the engine
    Redraw(Vec<RawEvent>),
    /// Mode reported outside a redraw batch (e.g. on attach).
    SetMode(String),

    // -- From the GUI
    SelectionChanged(SelectionChange),

    // -- System
    /// Wait for every in-flight cursor update and selection batch.
    Settle,
    /// Settle, then acknowledge. Everything sent before it has been handled
    /// once the acknowledgement arrives.
    Flush(oneshot::Sender<()>),
    Quit,
}
