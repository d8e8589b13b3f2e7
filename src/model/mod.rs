pub mod buffer;
pub mod config;
pub mod cursor;
pub mod mode;
pub mod position;

slotmap::new_key_type! {
    /// A GUI editor instance (one visible text pane).
    pub struct EditorId;
    /// An open text document; several editors may show the same one.
    pub struct DocumentId;
}

/// Engine handle of a displayed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub i64);

/// Engine handle of the rendering grid behind a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub i64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win:{}", self.0)
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grid:{}", self.0)
    }
}
