// src/engine/source.rs

//! JSON-lines event source.
//!
//! Each non-blank line is one [`HostEvent`]. Unreadable lines are logged and
//! skipped; end of input turns into a `Shutdown` event.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::hook::HostEvent;

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_event_line(line: &str) -> Result<Option<HostEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Read events from `reader` on a background task and forward them to `tx`.
pub fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<HostEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut line_no = 0usize;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(lines = line_no, "event input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read event input; stopping reader");
                    break;
                }
            };
            line_no += 1;

            match parse_event_line(&line) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        // Runtime is gone; nothing left to feed.
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(line = line_no, error = %e, "skipping unreadable event"),
            }
        }

        let _ = tx.send(HostEvent::Shutdown).await;
    })
}
