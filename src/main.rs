//! tutorial-listener: classified input events as a JSON-lines stream
//!
//! Runs the keyboard and mouse sources and prints every `single_click`,
//! `double_click`, `hotkey` and `typing` event to stdout, one JSON object
//! per line, for a recorder or player process to consume.
//!
//! Input comes from:
//! - the global platform hooks when built with the `native` feature
//! - otherwise raw input replayed from stdin, one JSON object per line
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tutorial_listener::lifecycle::ShutdownSignal;
use tutorial_listener::{
    BroadcastSubscriber, ChannelFeed, Config, EventKind, EventListener, InputEvent, InputFeed,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "tutorial-listener starting"
    );

    let config = Config::load().context("invalid configuration")?;
    info!(?config, "configuration loaded");

    let (feed, replay) = build_feed();
    let listener = Arc::new(EventListener::new(&config, feed));

    // Sources -> stdout printer
    let (event_tx, mut event_rx) = broadcast::channel::<InputEvent>(256);
    for kind in EventKind::MOUSE {
        listener.subscribe_mouse(kind, BroadcastSubscriber::new(event_tx.clone()));
    }
    for kind in EventKind::KEYBOARD {
        listener.subscribe_keyboard(kind, BroadcastSubscriber::new(event_tx.clone()));
    }

    listener
        .start_listening()
        .context("failed to start input listeners")?;

    if let Some(feed) = replay {
        // Plain thread: a blocked stdin read must not hold up runtime shutdown
        thread::Builder::new()
            .name("stdin-replay".to_string())
            .spawn(move || {
                match feed.pump_json_lines(io::stdin().lock()) {
                    Ok(count) => info!(count, "stdin replay finished"),
                    Err(e) => error!(%e, "stdin replay failed"),
                }
                feed.close();
            })
            .context("failed to spawn stdin replay thread")?;
    }

    let feed_ended = {
        let listener = Arc::clone(&listener);
        tokio::task::spawn_blocking(move || listener.wait())
    };
    let shutdown = ShutdownSignal::new();

    info!("listener initialized, entering main loop");

    tokio::select! {
        // Print events as they arrive
        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = print_event(&event) {
                            warn!(?e, "stdout closed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event printer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("event printer exited");
        }

        // Feed closed or platform hook died
        _ = feed_ended => {
            info!("input feed ended");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to install signal handlers"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    listener.stop_listening();

    // Events flushed by stop
    while let Ok(event) = event_rx.try_recv() {
        if print_event(&event).is_err() {
            break;
        }
    }

    info!("tutorial-listener stopped");

    Ok(())
}

fn print_event(event: &InputEvent) -> io::Result<()> {
    let line = serde_json::to_string(event)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()
}

#[cfg(feature = "native")]
fn build_feed() -> (Arc<dyn InputFeed>, Option<Arc<ChannelFeed>>) {
    info!("using native input hooks");
    (Arc::new(tutorial_listener::feed::NativeFeed::new()), None)
}

#[cfg(not(feature = "native"))]
fn build_feed() -> (Arc<dyn InputFeed>, Option<Arc<ChannelFeed>>) {
    info!("native hooks not compiled in, replaying raw input from stdin");
    let feed = Arc::new(ChannelFeed::new());
    (feed.clone(), Some(feed))
}
