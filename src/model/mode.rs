use std::collections::HashMap;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::host::{EditorSurface, EngineModes};

/// Cursor shape the engine assigns to an editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    Block,
    /// Underline.
    Horizontal,
    /// Thin bar.
    Vertical,
}

impl CursorShape {
    pub fn label(&self) -> &'static str {
        match self {
            CursorShape::Block => "block",
            CursorShape::Horizontal => "horizontal",
            CursorShape::Vertical => "vertical",
        }
    }
}

impl FromStr for CursorShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(CursorShape::Block),
            "horizontal" => Ok(CursorShape::Horizontal),
            "vertical" => Ok(CursorShape::Vertical),
            other => Err(other.to_string()),
        }
    }
}

/// Mode name → cursor shape, filled from mode definitions and read on every mode change.
#[derive(Debug, Default)]
pub struct ModeCursorStyleMap {
    shapes: HashMap<String, CursorShape>,
}

impl ModeCursorStyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the shape for `mode`.
    pub fn define(&mut self, mode: impl Into<String>, shape: CursorShape) {
        self.shapes.insert(mode.into(), shape);
    }

    pub fn shape_for(&self, mode: &str) -> Option<CursorShape> {
        self.shapes.get(mode).copied()
    }

    /// Set the cursor shape of every visible editor to the one defined for `mode`.
    ///
    /// Unknown modes are ignored; the GUI keeps whatever shape it had.
    pub fn apply(&self, mode: &str, surface: &dyn EditorSurface) -> Option<CursorShape> {
        let shape = self.shape_for(mode)?;
        for editor in surface.visible_editors() {
            surface.set_cursor_shape(editor, shape);
        }
        Some(shape)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

/// Tracks the engine's current mode name.
#[derive(Debug)]
pub struct ModeState {
    current: RwLock<String>,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            current: RwLock::new("normal".to_string()),
        }
    }
}

impl ModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, mode: impl Into<String>) {
        *self.current.write() = mode.into();
    }

    pub fn current(&self) -> String {
        self.current.read().clone()
    }
}

impl EngineModes for ModeState {
    fn is_insert_mode(&self) -> bool {
        *self.current.read() == "insert"
    }

    fn is_visual_mode(&self) -> bool {
        *self.current.read() == "visual"
    }
}
