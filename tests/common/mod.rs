#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;

use cursorlink::engine::RawEvent;
use cursorlink::headless::{self, HeadlessGui, RecordingTransport};
use cursorlink::host::Collaborators;
use cursorlink::model::buffer::LineRange;
use cursorlink::model::config::SyncConfig;
use cursorlink::model::mode::ModeState;
use cursorlink::model::{DocumentId, EditorId, GridId, WindowId};

pub const TEXT: &str = "fn main() {\n    let answer = 42;\n    println!(\"{answer}\");\n}\n";

pub struct Harness {
    pub gui: Arc<HeadlessGui>,
    pub modes: Arc<ModeState>,
    pub transport: Arc<RecordingTransport>,
    pub host: Collaborators,
}

impl Harness {
    pub fn new() -> Self {
        let gui = Arc::new(HeadlessGui::new());
        let modes = Arc::new(ModeState::new());
        let transport = Arc::new(RecordingTransport::new());
        let host = headless::collaborators(gui.clone(), modes.clone(), transport.clone());
        Self {
            gui,
            modes,
            transport,
            host,
        }
    }

    pub fn document(&self, text: &str) -> DocumentId {
        self.gui.open_document("doc", text)
    }

    /// Open a bound editor showing lines 0..=40 of `doc`, grid id = window id.
    pub fn editor(&self, doc: DocumentId, window: i64) -> EditorId {
        let editor = self.gui.open_editor(doc, LineRange::new(0, 40)).unwrap();
        self.gui.bind_window(editor, WindowId(window), GridId(window));
        editor
    }
}

pub fn forwarding_config() -> SyncConfig {
    SyncConfig {
        mouse_selection_forwarding: true,
        jump_function: "StoreJump".to_string(),
        ..SyncConfig::default()
    }
}

pub fn viewport(window: i64, line: usize, col: usize) -> RawEvent {
    RawEvent::new(
        "win_viewport",
        vec![
            json!(window),
            json!(window),
            json!(0),
            json!(40),
            json!(line),
            json!(col),
            json!(100),
            json!(0),
        ],
    )
}

pub fn mode_info(modes: &[(&str, &str)]) -> RawEvent {
    let entries: Vec<_> = modes
        .iter()
        .map(|(name, shape)| json!({"name": name, "cursor_shape": shape, "cell_percentage": 25}))
        .collect();
    RawEvent::new("mode_info_set", vec![json!(true), json!(entries)])
}

pub fn mode_change(mode: &str) -> RawEvent {
    RawEvent::new("mode_change", vec![json!(mode), json!(0)])
}
