//! Debounced delivery of settled snapshots to the host.
//!
//! Every submitted snapshot (re)starts a quiet window. When the window closes
//! without a newer submission, the latest snapshot is rasterized and handed to
//! the [`HostSink`], provided live updates are on or a forced submission was
//! coalesced into the window:
//!
//! ```text
//!            submit(a)  submit(b)      submit(c)
//! time  ───────┼──────────┼──────────────┼────────────────────┼──▶
//! state  Idle  Pending(a) Pending(b)     Pending(c)           Idle
//!                                        └── quiet window ───┘ deliver(c)
//! ```
//!
//! The window logic lives in [`DebounceState`]; [`SyncDebouncer`] drives it
//! from a tokio task fed through a [`SyncHandle`].

use std::sync::Arc;
use std::time::Duration;

use drawable_core::DrawingSnapshot;
use drawable_renderer::{png_data_url, Rasterizer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use crate::config::DEFAULT_DEBOUNCE;
use crate::error::{SyncError, SyncResult};
use crate::sink::{HostSink, SyncPayload};

/// Quiet-window state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DebounceState<T> {
    /// No window open.
    Idle,
    /// A window is open and will close at `deadline`.
    Pending {
        /// When the window closes.
        deadline: Instant,
        /// Most recent submission.
        latest: T,
        /// Whether any submission in this window was forced.
        forced: bool,
    },
}

impl<T> Default for DebounceState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> DebounceState<T> {
    /// Open or restart the window with `value` as the latest submission.
    ///
    /// A forced flag raised earlier in the same window is kept.
    pub fn submit(&mut self, value: T, forced: bool, deadline: Instant) {
        let forced = forced || matches!(self, Self::Pending { forced: true, .. });
        *self = Self::Pending {
            deadline,
            latest: value,
            forced,
        };
    }

    /// When the open window closes.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Idle => None,
            Self::Pending { deadline, .. } => Some(*deadline),
        }
    }

    /// Check if a window is open.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Close the window, returning the value to send if sending is allowed.
    pub fn fire(&mut self, realtime: bool) -> Option<T> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Pending { latest, forced, .. } => (realtime || forced).then_some(latest),
        }
    }
}

/// Settings of one debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet window length.
    pub window: Duration,
    /// Initial live-update mode.
    pub realtime: bool,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_DEBOUNCE,
            realtime: true,
            width: 600,
            height: 400,
        }
    }
}

#[derive(Debug)]
enum Command {
    Submit {
        snapshot: DrawingSnapshot,
        force: bool,
        at: Instant,
    },
    SetRealtime(bool),
    Finish,
}

/// Coalesces snapshot submissions into one host delivery per quiet window.
pub struct SyncDebouncer {
    config: DebounceConfig,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn HostSink>,
}

impl std::fmt::Debug for SyncDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDebouncer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncDebouncer {
    /// Create a debouncer.
    #[must_use]
    pub fn new(
        config: DebounceConfig,
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn HostSink>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            sink,
        }
    }

    /// Start the debouncer task on the current runtime.
    ///
    /// The task stops when the returned handle is shut down or dropped, which
    /// discards an open window, or finished, which lets it close first.
    #[must_use]
    pub fn spawn(self) -> SyncHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        SyncHandle { tx, task }
    }

    /// Build the host payload for `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Render`] if rasterization fails.
    pub fn payload(&self, snapshot: DrawingSnapshot) -> SyncResult<SyncPayload> {
        let (width, height) = (self.config.width, self.config.height);
        let png = self.rasterizer.rasterize(&snapshot, width, height)?;
        Ok(SyncPayload {
            data: png_data_url(&png),
            width,
            height,
            raw: snapshot,
        })
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut state = DebounceState::Idle;
        let mut realtime = self.config.realtime;
        let mut finishing = false;

        loop {
            let deadline = state.deadline();
            tokio::select! {
                command = rx.recv(), if !finishing => match command {
                    Some(Command::Submit { snapshot, force, at }) => {
                        debug!(
                            "Snapshot submitted ({} objects, forced: {force})",
                            snapshot.len()
                        );
                        state.submit(snapshot, force, at + self.config.window);
                    }
                    Some(Command::SetRealtime(enabled)) => {
                        debug!("Live updates {}", if enabled { "on" } else { "off" });
                        realtime = enabled;
                    }
                    Some(Command::Finish) => {
                        if !state.is_pending() {
                            break;
                        }
                        finishing = true;
                    }
                    None => {
                        if state.is_pending() {
                            debug!("Sync handle closed, discarding pending snapshot");
                        }
                        break;
                    }
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    match state.fire(realtime) {
                        Some(snapshot) => {
                            if let Err(e) = self.deliver(snapshot).await {
                                error!("Failed to deliver snapshot to host: {e}");
                            }
                        }
                        None => debug!("Quiet window closed with live updates off"),
                    }
                    if finishing {
                        break;
                    }
                }
            }
        }
    }

    async fn deliver(&self, snapshot: DrawingSnapshot) -> SyncResult<()> {
        let payload = self.payload(snapshot)?;
        let objects = payload.raw.len();
        self.sink.set_value(payload).await?;
        info!("Delivered snapshot with {objects} objects to host");
        Ok(())
    }
}

/// Handle to a running [`SyncDebouncer`].
#[derive(Debug)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Submit a snapshot, timestamped now.
    ///
    /// `force` lets the window deliver even with live updates off.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub fn submit(&self, snapshot: DrawingSnapshot, force: bool) -> SyncResult<()> {
        self.send(Command::Submit {
            snapshot,
            force,
            at: Instant::now(),
        })
    }

    /// Switch live updates on or off. Applies to the window open at fire time.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub fn set_realtime(&self, realtime: bool) -> SyncResult<()> {
        self.send(Command::SetRealtime(realtime))
    }

    /// Stop the task and wait for it, discarding any open window.
    pub async fn shutdown(self) {
        let Self { tx, task } = self;
        drop(tx);
        Self::join(task).await;
    }

    /// Let an open window close (and deliver, if allowed), then stop.
    pub async fn finish(self) {
        let Self { tx, task } = self;
        if tx.send(Command::Finish).is_err() {
            debug!("Sync task already stopped");
        }
        drop(tx);
        Self::join(task).await;
    }

    async fn join(task: JoinHandle<()>) {
        if let Err(e) = task.await {
            error!("Sync task ended abnormally: {e}");
        }
    }

    fn send(&self, command: Command) -> SyncResult<()> {
        self.tx.send(command).map_err(|_| SyncError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_latest_submission_wins() {
        let t0 = Instant::now();
        let mut state = DebounceState::Idle;
        state.submit("a", false, t0 + ms(200));
        state.submit("b", false, t0 + ms(250));
        state.submit("c", false, t0 + ms(290));

        assert_eq!(state.deadline(), Some(t0 + ms(290)));
        assert_eq!(state.fire(true), Some("c"));
        assert_eq!(state, DebounceState::Idle);
        assert_eq!(state.fire(true), None);
    }

    #[test]
    fn test_live_updates_off_drops_window() {
        let mut state = DebounceState::Idle;
        state.submit(1, false, Instant::now() + ms(200));
        assert_eq!(state.fire(false), None);
        assert!(!state.is_pending());
    }

    #[test]
    fn test_forced_flag_is_sticky_within_window() {
        let t0 = Instant::now();
        let mut state = DebounceState::Idle;
        state.submit(1, true, t0 + ms(200));
        state.submit(2, false, t0 + ms(300));
        assert_eq!(state.fire(false), Some(2));

        // A new window starts unforced.
        state.submit(3, false, t0 + ms(600));
        assert_eq!(state.fire(false), None);
    }
}
