/// A position in the GUI editor: zero-based line, zero-based character index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A position in the engine: one-based line, zero-based UTF-8 byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EnginePosition {
    pub line: usize,
    pub col: usize,
}

impl EnginePosition {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Build from the engine's zero-based grid coordinates (as found in viewport events).
    pub fn from_zero_based(line: usize, col: usize) -> Self {
        Self { line: line + 1, col }
    }

    /// Zero-based row, as used by synthesized pointer input.
    pub fn row(&self) -> usize {
        self.line.saturating_sub(1)
    }
}

/// Converts between the GUI's character columns and the engine's byte columns.
///
/// Both directions take the text of the line the position lives on. When the
/// line is unknown, columns pass through unchanged.
pub struct PositionTranslator;

impl PositionTranslator {
    pub fn to_engine(pos: Position, line_text: Option<&str>) -> EnginePosition {
        let col = match line_text {
            Some(text) => char_to_byte(text, pos.character),
            None => pos.character,
        };
        EnginePosition {
            line: pos.line + 1,
            col,
        }
    }

    pub fn to_editor(pos: EnginePosition, line_text: Option<&str>) -> Position {
        let character = match line_text {
            Some(text) => byte_to_char(text, pos.col),
            None => pos.col,
        };
        Position {
            line: pos.row(),
            character,
        }
    }
}

/// Byte offset of the `idx`-th character, clamped to the end of the line.
fn char_to_byte(text: &str, idx: usize) -> usize {
    text.char_indices()
        .nth(idx)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Index of the character containing byte `offset`, clamped to the end of the line.
fn byte_to_char(text: &str, offset: usize) -> usize {
    if offset >= text.len() {
        return text.chars().count();
    }
    text.char_indices()
        .take_while(|(byte, _)| *byte <= offset)
        .count()
        .saturating_sub(1)
}
