use crate::host::EditorSurface;
use crate::model::EditorId;
use crate::model::buffer::LineRange;
use crate::model::cursor::{Selection, single};
use crate::model::position::Position;

use super::SyncError;

/// How far the GUI should scroll to bring a cursor into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    /// Scroll as little as possible. Also fixes the horizontal offset.
    Minimal,
    /// Snap to the target without smooth scrolling.
    Jump,
    /// Put the target line at the top of the viewport.
    AtTop,
    /// Center the target line.
    Center,
}

impl Reveal {
    /// Pick a reveal for `line` given the editor's visible span.
    ///
    /// Distances of at least half the viewport height count as large jumps.
    pub fn for_target(line: usize, visible: LineRange) -> Self {
        let height = visible.height();
        if visible.contains(line) {
            Reveal::Minimal
        } else if line < visible.start {
            if (visible.start - line) * 2 >= height {
                Reveal::Jump
            } else {
                Reveal::AtTop
            }
        } else if (line - visible.end) * 2 >= height {
            Reveal::Center
        } else {
            Reveal::Minimal
        }
    }
}

/// Applies engine-resolved cursor positions to GUI editors.
pub struct CursorRenderer;

impl CursorRenderer {
    /// Collapse `editor`'s selections to (`line`, `character`) and scroll it into view.
    ///
    /// Any multi-selection the editor had is discarded.
    pub fn apply(
        surface: &dyn EditorSurface,
        editor: EditorId,
        line: usize,
        character: usize,
    ) -> Result<Reveal, SyncError> {
        if surface.document_of(editor).is_none() {
            return Err(SyncError::EditorClosed(editor));
        }

        let target = Position::new(line, character);
        let reveal = surface
            .visible_ranges(editor)
            .first()
            .map(|visible| Reveal::for_target(line, *visible))
            .unwrap_or(Reveal::Minimal);

        surface.set_selections(editor, single(Selection::collapsed(target)));
        surface.reveal(editor, target, reveal);
        Ok(reveal)
    }
}
