//! Inbound redraw records and their validated, typed form.
//!
//! The engine sends each batch as a list of grouped records:
//! `[name, [args...], [args...], ...]`. Every argument tuple is one event.
//! Records are checked against a fixed schema per kind here, so the rest of
//! the crate never touches loosely typed values.

use serde_json::Value;
use thiserror::Error;

use crate::model::mode::CursorShape;
use crate::model::{GridId, WindowId};

pub const WIN_VIEWPORT: &str = "win_viewport";
pub const MODE_INFO_SET: &str = "mode_info_set";
pub const MODE_CHANGE: &str = "mode_change";

#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("redraw record is not a non-empty array")]
    NotARecord,
    #[error("redraw record name is not a string")]
    BadName,
    #[error("{kind}: argument tuple is not an array")]
    NotATuple { kind: &'static str },
    #[error("{kind}: expected {expected} arguments, got {got}")]
    Arity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{kind}: argument {index} should be {expected}")]
    BadArgument {
        kind: &'static str,
        index: usize,
        expected: &'static str,
    },
}

/// One record as received: a name and its argument tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub name: String,
    pub calls: Vec<Vec<Value>>,
}

impl RawEvent {
    /// Single-call record, the common case when building batches by hand.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            calls: vec![args],
        }
    }

    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let Value::Array(mut items) = value else {
            return Err(EventError::NotARecord);
        };
        if items.is_empty() {
            return Err(EventError::NotARecord);
        }
        let Value::String(name) = items.remove(0) else {
            return Err(EventError::BadName);
        };
        let kind = known_kind(&name);
        let calls = items
            .into_iter()
            .map(|call| match call {
                Value::Array(args) => Ok(args),
                _ => Err(EventError::NotATuple { kind }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, calls })
    }
}

/// Parse a whole batch value (`[[name, ...], [name, ...]]`).
pub fn parse_batch(value: Value) -> Result<Vec<RawEvent>, EventError> {
    let Value::Array(records) = value else {
        return Err(EventError::NotARecord);
    };
    records.into_iter().map(RawEvent::from_value).collect()
}

/// One entry of a mode definition list.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeInfo {
    pub name: String,
    pub cursor_shape: CursorShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedrawEvent {
    ViewportUpdate {
        grid: GridId,
        window: WindowId,
        top_line: usize,
        bottom_line: usize,
        /// Zero-based.
        cursor_line: usize,
        /// Zero-based byte column.
        cursor_col: usize,
    },
    ModeDefinitions {
        cursor_style_enabled: bool,
        modes: Vec<ModeInfo>,
    },
    ModeChange {
        mode: String,
        index: i64,
    },
}

impl RedrawEvent {
    /// Validate every call of `raw`. Unknown kinds yield nothing.
    ///
    /// Each call is validated on its own so a bad tuple does not hide its
    /// well-formed neighbours.
    pub fn parse(raw: &RawEvent) -> Vec<Result<RedrawEvent, EventError>> {
        let parse_one: fn(&[Value]) -> Result<RedrawEvent, EventError> = match raw.name.as_str() {
            WIN_VIEWPORT => parse_viewport,
            MODE_INFO_SET => parse_mode_info_set,
            MODE_CHANGE => parse_mode_change,
            _ => return Vec::new(),
        };
        raw.calls.iter().map(|args| parse_one(args)).collect()
    }
}

/// Validate a batch into typed events, logging and skipping malformed ones.
pub fn decode_batch(batch: &[RawEvent]) -> Vec<RedrawEvent> {
    let mut events = Vec::new();
    for raw in batch {
        for parsed in RedrawEvent::parse(raw) {
            match parsed {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!("dropping malformed redraw event: {err}"),
            }
        }
    }
    events
}

fn known_kind(name: &str) -> &'static str {
    match name {
        WIN_VIEWPORT => WIN_VIEWPORT,
        MODE_INFO_SET => MODE_INFO_SET,
        MODE_CHANGE => MODE_CHANGE,
        _ => "redraw",
    }
}

fn check_arity(kind: &'static str, args: &[Value], min: usize) -> Result<(), EventError> {
    if args.len() < min {
        return Err(EventError::Arity {
            kind,
            expected: min,
            got: args.len(),
        });
    }
    Ok(())
}

fn int_arg(kind: &'static str, args: &[Value], index: usize) -> Result<i64, EventError> {
    args[index].as_i64().ok_or(EventError::BadArgument {
        kind,
        index,
        expected: "an integer",
    })
}

fn index_arg(kind: &'static str, args: &[Value], index: usize) -> Result<usize, EventError> {
    args[index]
        .as_u64()
        .map(|n| n as usize)
        .ok_or(EventError::BadArgument {
            kind,
            index,
            expected: "a non-negative integer",
        })
}

fn parse_viewport(args: &[Value]) -> Result<RedrawEvent, EventError> {
    // grid, win, topline, botline, curline, curcol[, line_count, scroll_delta]
    check_arity(WIN_VIEWPORT, args, 6)?;
    Ok(RedrawEvent::ViewportUpdate {
        grid: GridId(int_arg(WIN_VIEWPORT, args, 0)?),
        window: WindowId(int_arg(WIN_VIEWPORT, args, 1)?),
        top_line: index_arg(WIN_VIEWPORT, args, 2)?,
        bottom_line: index_arg(WIN_VIEWPORT, args, 3)?,
        cursor_line: index_arg(WIN_VIEWPORT, args, 4)?,
        cursor_col: index_arg(WIN_VIEWPORT, args, 5)?,
    })
}

fn parse_mode_info_set(args: &[Value]) -> Result<RedrawEvent, EventError> {
    check_arity(MODE_INFO_SET, args, 2)?;
    let cursor_style_enabled = args[0].as_bool().ok_or(EventError::BadArgument {
        kind: MODE_INFO_SET,
        index: 0,
        expected: "a boolean",
    })?;
    let entries = args[1].as_array().ok_or(EventError::BadArgument {
        kind: MODE_INFO_SET,
        index: 1,
        expected: "a list of mode definitions",
    })?;

    let mut modes = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        let shape = entry.get("cursor_shape").and_then(Value::as_str);
        match (name, shape) {
            (Some(name), Some(shape)) => match shape.parse::<CursorShape>() {
                Ok(cursor_shape) => modes.push(ModeInfo {
                    name: name.to_string(),
                    cursor_shape,
                }),
                Err(unknown) => {
                    tracing::warn!("mode {name}: unknown cursor shape {unknown:?}");
                }
            },
            _ => tracing::warn!("skipping mode definition without name or cursor_shape: {entry}"),
        }
    }

    Ok(RedrawEvent::ModeDefinitions {
        cursor_style_enabled,
        modes,
    })
}

fn parse_mode_change(args: &[Value]) -> Result<RedrawEvent, EventError> {
    check_arity(MODE_CHANGE, args, 2)?;
    let mode = args[0].as_str().ok_or(EventError::BadArgument {
        kind: MODE_CHANGE,
        index: 0,
        expected: "a mode name",
    })?;
    Ok(RedrawEvent::ModeChange {
        mode: mode.to_string(),
        index: int_arg(MODE_CHANGE, args, 1)?,
    })
}
