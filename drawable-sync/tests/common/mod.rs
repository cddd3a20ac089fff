//! Shared fixtures for sync integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drawable_core::{DrawingSnapshot, PointerButton, ShapeKind, ShapeRecord, SurfaceEvent};
use drawable_renderer::{RenderError, RenderResult, Rasterizer, SnapshotExporter};
use drawable_sync::{ChannelSink, DebounceConfig, SyncDebouncer, SyncHandle, SyncPayload};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Longest a test waits for something that should happen.
pub const PATIENCE: Duration = Duration::from_secs(30);

/// A drawing with `n` distinct rectangles.
pub fn drawing(n: usize) -> DrawingSnapshot {
    (0..n).fold(DrawingSnapshot::empty(Some("#ffffff".into())), |snapshot, i| {
        #[allow(clippy::cast_precision_loss)]
        let left = i as f64 * 20.0;
        snapshot.with_object(
            ShapeRecord::new(ShapeKind::Rect)
                .with("left", left)
                .with("top", 5.0)
                .with("width", 10.0)
                .with("height", 10.0),
        )
    })
}

/// Counts calls and optionally fails the first `failures` of them.
#[derive(Debug, Default)]
pub struct CountingRasterizer {
    calls: AtomicUsize,
    failures: usize,
}

impl CountingRasterizer {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(
        &self,
        snapshot: &DrawingSnapshot,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(RenderError::Export("induced failure".into()));
        }
        SnapshotExporter::with_defaults().render_to_png(snapshot, width, height)
    }
}

/// Spawn a debouncer delivering into a channel.
pub fn spawn_debouncer(
    window_ms: u64,
    realtime: bool,
    rasterizer: Arc<dyn Rasterizer>,
) -> (SyncHandle, UnboundedReceiver<SyncPayload>) {
    let (sink, rx) = ChannelSink::new();
    let debouncer = SyncDebouncer::new(
        DebounceConfig {
            window: Duration::from_millis(window_ms),
            realtime,
            width: 600,
            height: 400,
        },
        rasterizer,
        Arc::new(sink),
    );
    (debouncer.spawn(), rx)
}

/// Wait for the next delivery.
pub async fn next_payload(rx: &mut UnboundedReceiver<SyncPayload>) -> SyncPayload {
    timeout(PATIENCE, rx.recv())
        .await
        .expect("no delivery in time")
        .expect("sink closed")
}

/// Assert nothing is delivered for a long while.
pub async fn assert_silent(rx: &mut UnboundedReceiver<SyncPayload>) {
    if let Ok(payload) = timeout(PATIENCE, rx.recv()).await {
        panic!("unexpected delivery: {payload:?}");
    }
}

pub fn down(x: f64, y: f64) -> SurfaceEvent {
    SurfaceEvent::PointerDown {
        x,
        y,
        button: PointerButton::Primary,
    }
}

pub fn move_to(x: f64, y: f64) -> SurfaceEvent {
    SurfaceEvent::PointerMove { x, y }
}

pub fn up(x: f64, y: f64) -> SurfaceEvent {
    SurfaceEvent::PointerUp {
        x,
        y,
        button: PointerButton::Primary,
    }
}
