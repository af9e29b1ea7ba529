//! In-process fan-out feed
//!
//! Raw input is pushed by the caller instead of a platform hook. Used to
//! replay recorded input and to drive the sources from tests.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, trace};

use super::{FeedError, InputFeed, RawInput, RawInputKind};

/// One line of a JSON-lines recording
#[derive(Debug, Deserialize)]
struct RecordedInput {
    /// Milliseconds after the replay started; arrival time when absent
    #[serde(default)]
    offset_ms: Option<u64>,
    #[serde(flatten)]
    kind: RawInputKind,
}

#[derive(Debug, Default)]
pub struct ChannelFeed {
    senders: Mutex<Vec<Sender<RawInput>>>,
    closed: AtomicBool,
}

impl ChannelFeed {
    /// Create an open feed with no receivers
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `input` to every connected receiver
    ///
    /// Receivers that were dropped are pruned. Returns how many receivers
    /// got the input.
    pub fn push(&self, input: RawInput) -> usize {
        let mut senders = self.senders();
        senders.retain(|tx| tx.send(input.clone()).is_ok());
        trace!(receivers = senders.len(), kind = ?input.kind, "raw input pushed");
        senders.len()
    }

    /// Disconnect every receiver and refuse new connections
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let dropped = {
            let mut senders = self.senders();
            let n = senders.len();
            senders.clear();
            n
        };
        info!(receivers = dropped, "input feed closed");
    }

    /// Check if [`close`](Self::close) was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of connected receivers, including ones dropped since the last push
    pub fn receiver_count(&self) -> usize {
        self.senders().len()
    }

    /// Replay raw input recorded as one JSON object per line
    ///
    /// Blank lines and lines starting with `#` are skipped. Returns the
    /// number of inputs pushed.
    pub fn pump_json_lines<R: BufRead>(&self, reader: R) -> Result<usize, FeedError> {
        let start = Instant::now();
        let mut pushed = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let recorded: RecordedInput =
                serde_json::from_str(line).map_err(|source| FeedError::Malformed {
                    line: index + 1,
                    source,
                })?;
            let at = recorded
                .offset_ms
                .map(|ms| start + Duration::from_millis(ms))
                .unwrap_or_else(Instant::now);

            self.push(RawInput::new(recorded.kind, at));
            pushed += 1;
        }

        debug!(pushed, "recording replayed");
        Ok(pushed)
    }

    fn senders(&self) -> MutexGuard<'_, Vec<Sender<RawInput>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputFeed for ChannelFeed {
    fn connect(&self) -> Result<Receiver<RawInput>, FeedError> {
        if self.is_closed() {
            return Err(FeedError::Closed);
        }
        let (tx, rx) = mpsc::channel();
        self.senders().push(tx);
        Ok(rx)
    }
}
