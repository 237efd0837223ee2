//! Advertising report sources.
//!
//! Scanning the radio is outside this crate. Reports arrive as hex-encoded
//! HCI LE advertising report events, one per line, e.g. piped from
//! `hcidump --raw` or a capture file.

use crate::report::{AdvertisingReport, ReportError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Convenience alias for parsed reports or framing errors.
pub type ReportResult = Result<AdvertisingReport, ReportError>;

/// Channel buffer size for report results.
pub const REPORT_CHANNEL_BUFFER_SIZE: usize = 100;

/// Source abstraction to enable deterministic unit tests without input streams.
pub trait Source: Send + Sync {
    /// Start producing reports. The channel closes when the source is exhausted.
    fn start(&self) -> mpsc::Receiver<ReportResult>;
}

/// Reads report lines from standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinSource;

impl Source for StdinSource {
    fn start(&self) -> mpsc::Receiver<ReportResult> {
        spawn_line_reader(BufReader::new(tokio::io::stdin()))
    }
}

/// Strip the `>` direction marker some dump tools print; skip blank lines and
/// `#` comments.
fn report_line(line: &str) -> Option<&str> {
    let line = line.trim();
    let line = line.strip_prefix('>').unwrap_or(line).trim_start();
    (!line.is_empty() && !line.starts_with('#')).then_some(line)
}

/// Parse every line of `reader` as a hex HCI event on a background task.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<ReportResult>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(REPORT_CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(line) = report_line(&line) else {
                        continue;
                    };
                    if tx.send(AdvertisingReport::from_hex(line)).await.is_err() {
                        debug!("Report receiver dropped, stopping reader");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read report input");
                    break;
                }
            }
        }
    });

    rx
}
