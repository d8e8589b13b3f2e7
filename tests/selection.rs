mod common;

use std::time::Duration;

use serde_json::json;
use smallvec::smallvec;

use common::{Harness, TEXT, forwarding_config};
use cursorlink::engine::{CommandBatch, EngineCommand};
use cursorlink::host::TransportError;
use cursorlink::model::GridId;
use cursorlink::model::WindowId;
use cursorlink::model::config::SyncConfig;
use cursorlink::model::cursor::{Selection, SelectionChange, SelectionChangeKind, single};
use cursorlink::model::position::{EnginePosition, Position};
use cursorlink::sync::{DropReason, Outcome, SelectionChangeHandler, SyncError};

fn caret(line: usize, character: usize) -> Selection {
    Selection::collapsed(Position::new(line, character))
}

fn range(anchor: (usize, usize), active: (usize, usize)) -> Selection {
    Selection::new(
        Position::new(anchor.0, anchor.1),
        Position::new(active.0, active.1),
    )
}

#[tokio::test]
async fn navigation_on_focused_editor_records_a_jump() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.gui.focus(editor);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(2, 3)),
            kind: Some(SelectionChangeKind::Command),
        })
        .await
        .unwrap();

    let expected = CommandBatch::from(vec![
        EngineCommand::set_cursor(WindowId(1000), EnginePosition::new(3, 3)),
        EngineCommand::call("StoreJump", vec![json!(1000)]),
    ]);
    assert_eq!(outcome, Outcome::Sent(expected.clone()));
    assert_eq!(h.transport.sent(), vec![expected]);
}

#[tokio::test]
async fn unspecified_origin_also_records_a_jump() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(0, 0)),
            kind: None,
        })
        .await
        .unwrap();

    let sent = h.transport.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 2);
}

#[tokio::test]
async fn keyboard_moves_and_unfocused_editors_skip_the_jump() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let focused = h.editor(doc, 1000);
    let other = h.editor(doc, 1001);
    h.gui.focus(focused);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    handler
        .handle(SelectionChange {
            editor: focused,
            selections: single(caret(1, 2)),
            kind: Some(SelectionChangeKind::Keyboard),
        })
        .await
        .unwrap();
    handler
        .handle(SelectionChange {
            editor: other,
            selections: single(caret(1, 2)),
            kind: Some(SelectionChangeKind::Command),
        })
        .await
        .unwrap();

    assert_eq!(
        h.transport.take(),
        vec![
            CommandBatch::from(vec![EngineCommand::set_cursor(
                WindowId(1000),
                EnginePosition::new(2, 2)
            )]),
            CommandBatch::from(vec![EngineCommand::set_cursor(
                WindowId(1001),
                EnginePosition::new(2, 2)
            )]),
        ]
    );
}

#[tokio::test]
async fn mouse_range_starts_a_visual_selection() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: single(range((0, 0), (1, 5))),
            kind: Some(SelectionChangeKind::Mouse),
        })
        .await
        .unwrap();

    let expected = CommandBatch::from(vec![
        EngineCommand::mouse_press("left", GridId(1000), EnginePosition::new(1, 0)),
        EngineCommand::input("v"),
        EngineCommand::set_cursor(WindowId(1000), EnginePosition::new(2, 5)),
    ]);
    assert_eq!(outcome, Outcome::Sent(expected.clone()));
    assert_eq!(
        expected.to_wire(),
        json!([
            ["nvim_input_mouse", ["left", "press", "", 1000, 0, 0]],
            ["nvim_input", ["v"]],
            ["nvim_win_set_cursor", [1000, [2, 5]]]
        ])
    );
    assert_eq!(h.transport.sent(), vec![expected]);
}

#[tokio::test]
async fn mouse_range_in_visual_mode_only_moves_the_cursor() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.modes.set("visual");
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    handler
        .handle(SelectionChange {
            editor,
            selections: smallvec![range((0, 0), (0, 4)), range((1, 0), (2, 7))],
            kind: Some(SelectionChangeKind::Mouse),
        })
        .await
        .unwrap();

    assert_eq!(
        h.transport.take(),
        vec![CommandBatch::from(vec![EngineCommand::set_cursor(
            WindowId(1000),
            EnginePosition::new(3, 7)
        )])]
    );
}

#[tokio::test]
async fn keyboard_range_is_not_forwarded() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: smallvec![caret(0, 1), caret(1, 1)],
            kind: Some(SelectionChangeKind::Keyboard),
        })
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dropped(DropReason::NotForwardable));
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn mouse_range_is_dropped_when_forwarding_is_off() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), SyncConfig::default());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: single(range((0, 0), (1, 5))),
            kind: Some(SelectionChangeKind::Mouse),
        })
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dropped(DropReason::NotForwardable));
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn insert_mode_drops_without_waiting_for_layout() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.modes.set("insert");
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());
    let _layout = h.gui.begin_layout_change().unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        handler.handle(SelectionChange {
            editor,
            selections: single(caret(1, 1)),
            kind: None,
        }),
    )
    .await
    .expect("insert mode should not wait")
    .unwrap();

    assert_eq!(outcome, Outcome::Dropped(DropReason::InsertMode));
}

#[tokio::test]
async fn waits_for_layout_and_pending_edits() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let layout = h.gui.begin_layout_change().unwrap();
    let edit = h.gui.begin_edit(doc).unwrap();

    let change = SelectionChange {
        editor,
        selections: single(caret(1, 2)),
        kind: Some(SelectionChangeKind::Keyboard),
    };
    let pending = handler.handle(change);
    tokio::pin!(pending);

    assert!(
        tokio::time::timeout(Duration::from_millis(20), &mut pending)
            .await
            .is_err()
    );
    drop(layout);
    assert!(
        tokio::time::timeout(Duration::from_millis(20), &mut pending)
            .await
            .is_err()
    );
    assert!(h.transport.sent().is_empty());

    // The caret is translated against the text the edit leaves behind.
    edit.set_line(1, "ééé");
    drop(edit);
    let outcome = pending.await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Sent(CommandBatch::from(vec![EngineCommand::set_cursor(
            WindowId(1000),
            EnginePosition::new(2, 4)
        )]))
    );
}

#[tokio::test]
async fn unbound_editor_is_dropped() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.gui.unbind_window(WindowId(1000));
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(0, 0)),
            kind: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dropped(DropReason::UnboundEditor));
}

#[tokio::test]
async fn closed_editor_is_dropped() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.gui.close_editor(editor);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let outcome = handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(0, 0)),
            kind: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Dropped(DropReason::EditorClosed));
}

#[tokio::test]
async fn transport_failure_is_returned() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.transport.fail_with("channel gone");
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let result = handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(0, 0)),
            kind: Some(SelectionChangeKind::Keyboard),
        })
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Transport(TransportError::Rejected(reason))) if reason == "channel gone"
    ));
}

#[tokio::test]
async fn closed_transport_is_reported() {
    let h = Harness::new();
    let doc = h.document(TEXT);
    let editor = h.editor(doc, 1000);
    h.transport.close();
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    let result = handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(1, 0)),
            kind: Some(SelectionChangeKind::Keyboard),
        })
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Transport(TransportError::Closed))
    ));
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn multibyte_caret_uses_byte_columns() {
    let h = Harness::new();
    let doc = h.document("naïve café\n");
    let editor = h.editor(doc, 1000);
    let handler = SelectionChangeHandler::new(h.host.clone(), forwarding_config());

    handler
        .handle(SelectionChange {
            editor,
            selections: single(caret(0, 9)),
            kind: Some(SelectionChangeKind::Keyboard),
        })
        .await
        .unwrap();

    assert_eq!(
        h.transport.take(),
        vec![CommandBatch::from(vec![EngineCommand::set_cursor(
            WindowId(1000),
            EnginePosition::new(1, 10)
        )])]
    );
}
