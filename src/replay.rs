//! Replay scripts: a scene of documents and editors plus an ordered list of steps.
//!
//! ```toml
//! [[document]]
//! name = "main.rs"
//! text = "fn main() {}\n"
//!
//! [[editor]]
//! document = "main.rs"
//! window = 1000
//! grid = 2
//! visible = [0, 40]
//!
//! [[step]]
//! redraw = [["win_viewport", [2, 1000, 0, 40, 0, 3]]]
//!
//! [[step]]
//! selection = { editor = 0, kind = "command", ranges = [[0, 1, 0, 1]] }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::engine::event::parse_batch;
use crate::headless::HeadlessGui;
use crate::model::buffer::LineRange;
use crate::model::cursor::{Selection, SelectionChange, SelectionChangeKind, Selections};
use crate::model::position::Position;
use crate::model::{DocumentId, EditorId, GridId, WindowId};
use crate::msg::Msg;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default, rename = "document")]
    pub documents: Vec<DocumentSpec>,
    #[serde(default, rename = "editor")]
    pub editors: Vec<EditorSpec>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentSpec {
    pub name: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditorSpec {
    pub document: String,
    pub window: Option<i64>,
    pub grid: Option<i64>,
    #[serde(default = "default_visible")]
    pub visible: [usize; 2],
    #[serde(default)]
    pub focus: bool,
}

fn default_visible() -> [usize; 2] {
    [0, 40]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A redraw batch in the engine's grouped record form.
    Redraw(toml::Value),
    Selection(SelectionStep),
    Mode(String),
    Edit(EditStep),
    /// `settle = true` waits for in-flight work; `false` is a no-op.
    Settle(bool),
}

#[derive(Debug, Deserialize)]
pub struct SelectionStep {
    /// Index into the script's editors.
    pub editor: usize,
    pub kind: Option<SelectionChangeKind>,
    /// `[anchor_line, anchor_char, active_line, active_char]` per range.
    pub ranges: Vec<[usize; 4]>,
}

#[derive(Debug, Deserialize)]
pub struct EditStep {
    pub document: String,
    pub line: usize,
    pub text: String,
}

/// Ids of everything a script opened.
#[derive(Debug, Default)]
pub struct Scene {
    pub documents: HashMap<String, DocumentId>,
    pub editors: Vec<EditorId>,
}

/// What the driver must do for one step.
#[derive(Debug)]
pub enum Action {
    Send(Msg),
    Edit {
        doc: DocumentId,
        line: usize,
        text: String,
    },
}

impl Script {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing script {}", path.display()))
    }

    /// Open the script's documents and editors in `gui`.
    pub fn build(&self, gui: &HeadlessGui) -> Result<Scene> {
        let mut scene = Scene::default();
        for doc in &self.documents {
            let id = gui.open_document(&doc.name, &doc.text);
            scene.documents.insert(doc.name.clone(), id);
        }

        for spec in &self.editors {
            let doc = scene.document(&spec.document)?;
            let visible = LineRange::new(spec.visible[0], spec.visible[1]);
            let editor = gui
                .open_editor(doc, visible)
                .ok_or_else(|| anyhow!("cannot open editor on {}", spec.document))?;
            if let Some(window) = spec.window {
                gui.bind_window(editor, WindowId(window), GridId(spec.grid.unwrap_or(window)));
            }
            if spec.focus {
                gui.focus(editor);
            }
            scene.editors.push(editor);
        }
        Ok(scene)
    }

    /// Resolve every step against `scene`.
    pub fn actions(&self, scene: &Scene) -> Result<Vec<Action>> {
        let mut actions = Vec::with_capacity(self.steps.len() + 1);
        for (index, step) in self.steps.iter().enumerate() {
            let action = scene
                .action(step)
                .with_context(|| format!("step {}", index + 1))?;
            actions.extend(action);
        }
        actions.push(Action::Send(Msg::Quit));
        Ok(actions)
    }
}

impl Scene {
    fn document(&self, name: &str) -> Result<DocumentId> {
        self.documents
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown document {name:?}"))
    }

    fn action(&self, step: &Step) -> Result<Option<Action>> {
        let action = match step {
            Step::Redraw(batch) => {
                let value = serde_json::to_value(batch)?;
                Action::Send(Msg::Redraw(parse_batch(value)?))
            }
            Step::Selection(sel) => {
                let editor = *self
                    .editors
                    .get(sel.editor)
                    .ok_or_else(|| anyhow!("unknown editor index {}", sel.editor))?;
                let selections: Selections = sel
                    .ranges
                    .iter()
                    .map(|[al, ac, l, c]| {
                        Selection::new(Position::new(*al, *ac), Position::new(*l, *c))
                    })
                    .collect();
                Action::Send(Msg::SelectionChanged(SelectionChange {
                    editor,
                    selections,
                    kind: sel.kind,
                }))
            }
            Step::Mode(mode) => Action::Send(Msg::SetMode(mode.clone())),
            Step::Edit(edit) => Action::Edit {
                doc: self.document(&edit.document)?,
                line: edit.line,
                text: edit.text.clone(),
            },
            Step::Settle(true) => Action::Send(Msg::Settle),
            Step::Settle(false) => return Ok(None),
        };
        Ok(Some(action))
    }
}

/// Feed `actions` to a session in order.
///
/// Before each edit the driver flushes the session, so the edit lands after
/// every earlier step has been handled.
pub fn spawn_driver(
    actions: Vec<Action>,
    gui: Arc<HeadlessGui>,
    tx: mpsc::UnboundedSender<Msg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for action in actions {
            match action {
                Action::Send(msg) => {
                    if tx.send(msg).is_err() {
                        return;
                    }
                }
                Action::Edit { doc, line, text } => {
                    let (done, flushed) = oneshot::channel();
                    if tx.send(Msg::Flush(done)).is_err() || flushed.await.is_err() {
                        return;
                    }
                    gui.edit_line(doc, line, &text).await;
                }
            }
        }
    })
}
