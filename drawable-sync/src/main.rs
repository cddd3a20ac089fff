//! # Drawable Canvas
//!
//! Runs one canvas session against a host. Commands arrive as JSON lines on
//! stdin; settled drawings are delivered to `--sink-url` or written to stdout
//! as JSON lines. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drawable_renderer::SnapshotExporter;
use drawable_sync::{
    BackgroundImageLoader, BackoffConfig, CanvasSession, DebounceConfig, HostCommand, HostSink,
    HttpHostSink, HttpImageFetcher, LoadOutcome, SessionConfig, StdoutSink, SyncDebouncer,
    SyncError, SyncSettings,
};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "drawable-canvas", version, about = "Drawable canvas session runtime")]
struct Cli {
    /// Session configuration (JSON).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// POST payloads to this URL instead of writing them to stdout.
    #[arg(long, env = "DRAWABLE_SINK_URL")]
    sink_url: Option<String>,

    /// Host base URL that relative background image paths resolve against.
    #[arg(long, env = "DRAWABLE_STREAMLIT_URL")]
    streamlit_url: Option<String>,

    /// Quiet window before a drawing is delivered, in milliseconds.
    #[arg(long, env = "DRAWABLE_DEBOUNCE_MS", default_value_t = 200)]
    debounce_ms: u64,
}

/// Initialize structured tracing on stderr with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,drawable_sync=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drawable_sync=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = SessionConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let settings = SyncSettings {
        debounce: Duration::from_millis(cli.debounce_ms),
        ..SyncSettings::default()
    };

    let sink: Arc<dyn HostSink> = match &cli.sink_url {
        Some(url) => {
            tracing::info!("Delivering payloads to {url}");
            Arc::new(HttpHostSink::new(url)?)
        }
        None => Arc::new(StdoutSink::new()),
    };
    let debouncer = SyncDebouncer::new(
        DebounceConfig {
            window: settings.debounce,
            realtime: config.realtime_update_streamlit,
            width: config.canvas_width,
            height: config.canvas_height,
        },
        Arc::new(SnapshotExporter::with_defaults()),
        sink,
    );

    let mut session =
        CanvasSession::mount(config, debouncer.spawn()).context("mounting canvas session")?;
    let mut background = spawn_background_load(
        cli.streamlit_url.clone(),
        session.config().background_image_url.clone(),
        &settings.backoff,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command: HostCommand = match serde_json::from_str(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed command: {e}");
                        continue;
                    }
                };

                let new_background = match &command {
                    HostCommand::Configure { config }
                        if config.background_image_url != session.config().background_image_url =>
                    {
                        Some(config.background_image_url.clone())
                    }
                    _ => None,
                };

                match session.apply(command) {
                    Ok(()) => {
                        if let Some(image) = new_background {
                            if let Some(previous) = background.take() {
                                previous.abort();
                            }
                            background = spawn_background_load(
                                cli.streamlit_url.clone(),
                                image,
                                &settings.backoff,
                            );
                        }
                    }
                    Err(SyncError::Closed) => anyhow::bail!("sync task stopped"),
                    Err(e) => tracing::warn!("Command rejected: {e}"),
                }
            }
            result = join_background(&mut background), if background.is_some() => {
                background = None;
                match result {
                    Ok(outcome) => {
                        if let Some(texture) = outcome.into_texture() {
                            session.set_background_image(texture);
                        }
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => tracing::error!("Background image task failed: {e}"),
                }
            }
        }
    }

    tracing::info!("Host closed stdin, shutting down");
    if let Some(task) = background {
        task.abort();
    }
    session.close().await;
    Ok(())
}

/// Start loading the background image, if one is configured.
fn spawn_background_load(
    base: Option<String>,
    image: Option<String>,
    backoff: &BackoffConfig,
) -> Option<JoinHandle<LoadOutcome>> {
    let image = image.filter(|image| !image.is_empty())?;
    let loader = BackgroundImageLoader::new(HttpImageFetcher::new(), backoff.clone());
    Some(tokio::spawn(async move {
        loader.load(base.as_deref(), &image).await
    }))
}

async fn join_background(
    task: &mut Option<JoinHandle<LoadOutcome>>,
) -> Result<LoadOutcome, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
