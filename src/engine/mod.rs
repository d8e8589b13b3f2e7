pub mod command;
pub mod event;

pub use command::{CommandBatch, EngineCommand};
pub use event::{RawEvent, RedrawEvent};
