//! Cursor and selection sync between a GUI editor and a headless modal editing engine.
//!
//! Engine → GUI: redraw batches go through [`sync::RedrawEventDispatcher`], which
//! applies mode cursor shapes inline and defers cursor moves until the target
//! document has no pending edits.
//!
//! GUI → engine: selection changes go through [`sync::SelectionChangeHandler`],
//! which sends one atomic command batch per change.

pub mod app;
pub mod engine;
pub mod headless;
pub mod host;
pub mod model;
pub mod msg;
pub mod replay;
pub mod sync;

pub use app::App;
pub use msg::Msg;
