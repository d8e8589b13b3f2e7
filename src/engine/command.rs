use serde_json::{Value, json};

use crate::model::position::EnginePosition;
use crate::model::{GridId, WindowId};

/// One outgoing engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetWindowCursor {
        window: WindowId,
        pos: EnginePosition,
    },
    InputMouse {
        button: String,
        action: String,
        modifiers: String,
        grid: GridId,
        pos: EnginePosition,
    },
    Input {
        keys: String,
    },
    CallFunction {
        name: String,
        args: Vec<Value>,
    },
}

impl EngineCommand {
    pub fn set_cursor(window: WindowId, pos: EnginePosition) -> Self {
        EngineCommand::SetWindowCursor { window, pos }
    }

    pub fn mouse_press(button: impl Into<String>, grid: GridId, pos: EnginePosition) -> Self {
        EngineCommand::InputMouse {
            button: button.into(),
            action: "press".to_string(),
            modifiers: String::new(),
            grid,
            pos,
        }
    }

    pub fn input(keys: impl Into<String>) -> Self {
        EngineCommand::Input { keys: keys.into() }
    }

    pub fn call(name: impl Into<String>, args: Vec<Value>) -> Self {
        EngineCommand::CallFunction {
            name: name.into(),
            args,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            EngineCommand::SetWindowCursor { .. } => "nvim_win_set_cursor",
            EngineCommand::InputMouse { .. } => "nvim_input_mouse",
            EngineCommand::Input { .. } => "nvim_input",
            EngineCommand::CallFunction { .. } => "nvim_call_function",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            EngineCommand::SetWindowCursor { window, pos } => {
                json!([window.0, [pos.line, pos.col]])
            }
            EngineCommand::InputMouse {
                button,
                action,
                modifiers,
                grid,
                pos,
            } => json!([button, action, modifiers, grid.0, pos.row(), pos.col]),
            EngineCommand::Input { keys } => json!([keys]),
            EngineCommand::CallFunction { name, args } => json!([name, args]),
        }
    }

    /// `[method, params]`, one entry of an atomic call.
    pub fn to_wire(&self) -> Value {
        json!([self.method(), self.params()])
    }
}

/// Commands sent together in one atomic call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch {
    pub commands: Vec<EngineCommand>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: EngineCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Payload of the engine's atomic-call method.
    pub fn to_wire(&self) -> Value {
        Value::Array(self.commands.iter().map(EngineCommand::to_wire).collect())
    }
}

impl From<Vec<EngineCommand>> for CommandBatch {
    fn from(commands: Vec<EngineCommand>) -> Self {
        Self { commands }
    }
}
