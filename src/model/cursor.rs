use serde::Deserialize;
use smallvec::{SmallVec, smallvec};

use super::position::Position;
use super::EditorId;

/// One selection range. `anchor` stays put while `active` follows the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// A caret with no extent.
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            active: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }
}

/// The ordered selection set of an editor. The first entry is the primary one.
pub type Selections = SmallVec<[Selection; 1]>;

pub fn single(selection: Selection) -> Selections {
    smallvec![selection]
}

/// What caused a GUI selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionChangeKind {
    /// Plain caret movement from the keyboard.
    Keyboard,
    /// Pointer click or drag.
    Mouse,
    /// Explicit navigation command (go to definition, search result, ...).
    Command,
}

/// A local selection-change notification from the GUI.
#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub editor: EditorId,
    pub selections: Selections,
    pub kind: Option<SelectionChangeKind>,
}

impl SelectionChange {
    pub fn primary(&self) -> Option<&Selection> {
        self.selections.first()
    }

    /// More than one range, or a primary range with extent.
    pub fn is_ranged(&self) -> bool {
        self.selections.len() > 1 || self.primary().is_some_and(|sel| !sel.is_empty())
    }

    pub fn is_from_pointer(&self) -> bool {
        self.kind == Some(SelectionChangeKind::Mouse)
    }

    /// Changes that should leave an entry in the engine's jump list.
    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, None | Some(SelectionChangeKind::Command))
    }
}
