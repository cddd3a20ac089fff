//! # Drawable Canvas Sync
//!
//! Connects a drawable canvas session to its host.
//!
//! ```text
//!  host commands ──▶ CanvasSession ──▶ SyncDebouncer ──▶ Rasterizer ──▶ HostSink
//!  (stdin JSON)      surface, tools,   quiet window,     PNG data URL   stdout / HTTP
//!                    history           live/forced gate
//!
//!  BackgroundImageLoader ── fetch, retry with linear backoff ──▶ CanvasSession
//! ```
//!
//! This library is used by both the `drawable-canvas` binary and the
//! integration tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod command;
pub mod config;
pub mod debounce;
pub mod error;
pub mod session;
pub mod sink;

pub use background::{
    resolve_image_url, resolve_origin, BackgroundImageLoader, BackoffConfig, HttpImageFetcher,
    ImageFetcher, LoadOutcome,
};
pub use command::HostCommand;
pub use config::{SessionConfig, SyncSettings, DEFAULT_DEBOUNCE};
pub use debounce::{DebounceConfig, DebounceState, SyncDebouncer, SyncHandle};
pub use error::{FetchError, SyncError, SyncResult};
pub use session::CanvasSession;
pub use sink::{ChannelSink, HostSink, HttpHostSink, StdoutSink, SyncPayload};
