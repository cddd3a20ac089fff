//! Session behaviour end to end: pointer input → history → debounced host
//! deliveries, on tokio's paused clock.

mod common;

use std::sync::Arc;

use common::{
    assert_silent, down, drawing, move_to, next_payload, spawn_debouncer, up,
    CountingRasterizer,
};
use drawable_core::{CanvasError, PointerButton, ShapeKind, SurfaceEvent};
use drawable_sync::{CanvasSession, HostCommand, SessionConfig, SyncError, SyncPayload};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

fn config(mode: &str, realtime: bool) -> SessionConfig {
    SessionConfig {
        drawing_mode: mode.to_string(),
        realtime_update_streamlit: realtime,
        background_color: "#ffffff".to_string(),
        ..SessionConfig::default()
    }
}

fn mount(config: SessionConfig) -> (CanvasSession, UnboundedReceiver<SyncPayload>) {
    let (sync, rx) = spawn_debouncer(
        200,
        config.realtime_update_streamlit,
        Arc::new(CountingRasterizer::default()),
    );
    let session = CanvasSession::mount(config, sync).expect("mount");
    (session, rx)
}

fn draw_rect(session: &mut CanvasSession, from: (f64, f64), to: (f64, f64)) {
    for event in [down(from.0, from.1), move_to(to.0, to.1), up(to.0, to.1)] {
        session.handle_event(&event).expect("event");
    }
}

#[tokio::test(start_paused = true)]
async fn mount_delivers_initial_drawing_in_live_mode() {
    let (_session, mut rx) = mount(config("rect", true));
    let payload = next_payload(&mut rx).await;
    assert!(payload.raw.is_empty());
    assert_eq!(payload.raw.background.as_deref(), Some("#ffffff"));
}

#[tokio::test(start_paused = true)]
async fn committed_shapes_reach_history_and_host() {
    let (mut session, mut rx) = mount(config("rect", true));
    next_payload(&mut rx).await;

    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    assert_eq!(session.history().len(), 2);
    assert!(session.can_undo());

    let payload = next_payload(&mut rx).await;
    assert_eq!(payload.raw.len(), 1);
    let rect = &payload.raw.objects[0];
    assert_eq!(rect.kind, ShapeKind::Rect);
    assert_eq!(rect.number("width"), Some(40.0));
    assert_eq!(rect.number("height"), Some(30.0));
}

#[tokio::test(start_paused = true)]
async fn pointer_motion_without_commit_sends_nothing() {
    let (mut session, mut rx) = mount(config("rect", true));
    next_payload(&mut rx).await;

    session.handle_event(&down(5.0, 5.0)).expect("down");
    session.handle_event(&move_to(30.0, 30.0)).expect("move");
    assert_eq!(session.history().len(), 1);
    assert_silent(&mut rx).await;
}

#[tokio::test(start_paused = true)]
async fn live_updates_off_only_forced_sends_go_out() {
    let (mut session, mut rx) = mount(config("rect", false));

    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    assert_silent(&mut rx).await;

    session.apply(HostCommand::Download).expect("download");
    let payload = next_payload(&mut rx).await;
    assert_eq!(payload.raw.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn secondary_release_forces_send() {
    let (mut session, mut rx) = mount(config("rect", false));

    session.handle_event(&down(10.0, 10.0)).expect("down");
    session.handle_event(&move_to(40.0, 40.0)).expect("move");
    session
        .handle_event(&SurfaceEvent::PointerUp {
            x: 40.0,
            y: 40.0,
            button: PointerButton::Secondary,
        })
        .expect("up");

    let payload = next_payload(&mut rx).await;
    assert_eq!(payload.raw.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn undo_redo_reload_surface_and_force_send() {
    let (mut session, mut rx) = mount(config("rect", false));
    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    draw_rect(&mut session, (60.0, 60.0), (90.0, 90.0));
    assert_eq!(session.history().len(), 3);

    assert!(session.undo().expect("undo"));
    assert_eq!(session.surface().state().objects().len(), 1);
    assert!(session.can_redo());
    assert_eq!(next_payload(&mut rx).await.raw.len(), 1);

    assert!(session.redo().expect("redo"));
    assert_eq!(session.surface().state().objects().len(), 2);
    assert_eq!(next_payload(&mut rx).await.raw.len(), 2);

    assert!(!session.redo().expect("redo at end"));
    assert_silent(&mut rx).await;
}

#[tokio::test(start_paused = true)]
async fn gesture_in_progress_does_not_survive_history_reload() {
    let (mut session, _rx) = mount(config("rect", false));
    draw_rect(&mut session, (10.0, 10.0), (50.0, 50.0));
    let committed = session.surface().serialize();

    session.undo().expect("undo");
    session.handle_event(&down(100.0, 100.0)).expect("down");
    session.redo().expect("redo");
    assert_eq!(session.surface().serialize(), committed);

    session.handle_event(&move_to(300.0, 300.0)).expect("move");
    session.handle_event(&up(300.0, 300.0)).expect("up");

    assert_eq!(session.surface().serialize(), committed);
    assert_eq!(session.history().current(), &committed);
    assert_eq!(session.history().len(), 2);
    let rect = &committed.objects[0];
    assert_eq!(rect.number("left"), Some(10.0));
    assert_eq!(rect.number("width"), Some(40.0));
}

#[tokio::test(start_paused = true)]
async fn restored_open_polygon_is_not_extended() {
    let (mut session, _rx) = mount(config("polygon", false));
    for event in [
        down(0.0, 0.0),
        up(0.0, 0.0),
        down(50.0, 0.0),
        up(50.0, 0.0),
        down(50.0, 50.0),
        up(50.0, 50.0),
        SurfaceEvent::DoubleClick { x: 50.0, y: 50.0 },
        down(200.0, 200.0),
        up(200.0, 200.0),
    ] {
        session.handle_event(&event).expect("event");
    }

    session.undo().expect("undo");
    session.redo().expect("redo");
    let restored = session.surface().serialize();
    assert_eq!(restored.len(), 2);

    // The next click starts a new polygon instead of extending the restored one.
    session.handle_event(&down(300.0, 300.0)).expect("down");
    let objects = session.surface().state().objects();
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[..2], restored.objects[..]);
}

#[tokio::test(start_paused = true)]
async fn drawing_after_undo_discards_redo_branch() {
    let (mut session, _rx) = mount(config("rect", false));
    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    draw_rect(&mut session, (60.0, 60.0), (90.0, 90.0));

    session.undo().expect("undo");
    draw_rect(&mut session, (100.0, 100.0), (120.0, 130.0));

    assert!(!session.can_redo());
    assert_eq!(session.history().len(), 3);
    let objects = session.surface().state().objects();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].number("left"), Some(100.0));
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_initial_drawing() {
    let initial = drawing(2);
    let (mut session, mut rx) = mount(SessionConfig {
        initial_drawing: Some(serde_json::to_value(&initial).expect("json")),
        ..config("rect", false)
    });
    assert_eq!(session.surface().serialize(), initial);

    draw_rect(&mut session, (200.0, 200.0), (260.0, 240.0));
    session.apply(HostCommand::Reset).expect("reset");

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().current(), &initial);
    assert_eq!(session.surface().serialize(), initial);
    assert_eq!(next_payload(&mut rx).await.raw, initial);
}

#[tokio::test(start_paused = true)]
async fn malformed_initial_drawing_fails_mount() {
    let (sync, _rx) = spawn_debouncer(200, true, Arc::new(CountingRasterizer::default()));
    let config = SessionConfig {
        initial_drawing: Some(json!({"objects": [{"type": "circle", "left": 3}]})),
        ..SessionConfig::default()
    };
    let err = CanvasSession::mount(config, sync).expect_err("malformed");
    assert!(matches!(err, SyncError::Canvas(CanvasError::SnapshotLoad(_))));
}

#[tokio::test(start_paused = true)]
async fn unknown_mode_rejected_and_previous_tool_kept() {
    let (sync, _rx) = spawn_debouncer(200, true, Arc::new(CountingRasterizer::default()));
    let err = CanvasSession::mount(config("spray", true), sync).expect_err("unknown mode");
    assert!(matches!(err, SyncError::Canvas(CanvasError::UnknownTool(_))));

    let (mut session, _rx) = mount(config("line", true));
    let err = session
        .update_config(config("spray", true))
        .expect_err("unknown mode");
    assert!(matches!(err, SyncError::Canvas(CanvasError::UnknownTool(_))));
    assert_eq!(session.active_tool(), Some("line"));
    assert_eq!(session.config().drawing_mode, "line");
}

#[tokio::test(start_paused = true)]
async fn switching_tools_keeps_single_commit_listener() {
    let (mut session, _rx) = mount(config("rect", false));
    for mode in ["circle", "polygon", "freedraw", "rect", "rect"] {
        session
            .apply(HostCommand::Configure {
                config: Box::new(config(mode, false)),
            })
            .expect("configure");
    }

    // One rect gesture commits exactly one history entry.
    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    assert_eq!(session.history().len(), 2);

    let stats = session.surface().binding_stats();
    assert_eq!(stats.bound - stats.unbound, 5, "rect handlers + commit listener");
}

#[tokio::test(start_paused = true)]
async fn polygon_commits_on_double_click() {
    let (mut session, _rx) = mount(config("polygon", false));
    for event in [
        down(0.0, 0.0),
        up(0.0, 0.0),
        down(50.0, 0.0),
        up(50.0, 0.0),
        down(50.0, 50.0),
        up(50.0, 50.0),
        SurfaceEvent::DoubleClick { x: 50.0, y: 50.0 },
    ] {
        session.handle_event(&event).expect("event");
    }

    let history = session.history();
    let polygon = &history.current().objects[0];
    assert_eq!(polygon.kind, ShapeKind::Polygon);
    assert_eq!(polygon.get("points").and_then(|p| p.as_array()).map(Vec::len), Some(3));
}

#[tokio::test(start_paused = true)]
async fn new_initial_drawing_resets_history() {
    let (mut session, mut rx) = mount(config("rect", true));
    next_payload(&mut rx).await;
    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));

    let replacement = drawing(3);
    session
        .update_config(SessionConfig {
            initial_drawing: Some(serde_json::to_value(&replacement).expect("json")),
            ..config("rect", true)
        })
        .expect("configure");

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.surface().serialize(), replacement);
    assert_eq!(next_payload(&mut rx).await.raw, replacement);
}

#[tokio::test(start_paused = true)]
async fn toggling_live_mode_through_config() {
    let (mut session, mut rx) = mount(config("rect", false));
    session.update_config(config("rect", true)).expect("configure");

    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    assert_eq!(next_payload(&mut rx).await.raw.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_flushes_pending_delivery() {
    let (mut session, mut rx) = mount(config("rect", true));
    next_payload(&mut rx).await;

    draw_rect(&mut session, (10.0, 10.0), (50.0, 40.0));
    session.close().await;

    assert_eq!(rx.recv().await.map(|p| p.raw.len()), Some(1));
    assert!(rx.recv().await.is_none());
}
