//! Line framing for the tsserver protocol.
//!
//! tsserver writes one JSON document per line on stdout. Each document is
//! preceded by a `Content-Length: N` header line and a blank line, which this
//! module treats as noise together with any banner text: only lines whose
//! first byte is `{` are handed to dispatch.
//!
//! Outbound messages are written as a single line terminated by the platform
//! line separator.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Lines longer than this (64 MiB) are dropped instead of dispatched.
pub const MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Whether a line carries a protocol message.
#[must_use]
pub fn is_protocol_line(line: &[u8]) -> bool {
    line.first() == Some(&b'{')
}

fn strip_line_ending(mut line: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = line {
        line = rest;
    }
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    line
}

/// Reads protocol lines from the server's stdout.
///
/// `read_frame` is cancellation safe: bytes of a partially read line stay in
/// the internal buffer and are completed by the next call, so it can be used
/// as a `tokio::select!` branch.
///
/// At most `max_line` bytes of a line are buffered. The rest of a longer line
/// is consumed and dropped as it arrives.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_line: usize,
    /// Bytes dropped so far from an oversized line; nonzero until its newline.
    discarded: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line_bytes(reader, MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(reader: R, max_line: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_line,
            discarded: 0,
        }
    }

    /// Read the next protocol line, skipping noise.
    ///
    /// Returns `Ok(None)` on EOF.
    pub async fn read_frame(&mut self) -> Result<Option<String>> {
        loop {
            let available = self
                .reader
                .fill_buf()
                .await
                .context("reading line from tsserver")?;

            if available.is_empty() {
                if self.discarded > 0 {
                    self.drop_oversized();
                }
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let raw = std::mem::take(&mut self.buf);
                if let Some(line) = protocol_line(&raw) {
                    return Ok(Some(line));
                }
                continue;
            }

            let (len, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            if self.discarded > 0 || self.buf.len() + len > self.max_line {
                self.discarded += self.buf.len() + len;
                self.buf.clear();
                self.reader.consume(len);
                if complete {
                    self.drop_oversized();
                }
                continue;
            }

            self.buf.extend_from_slice(&available[..len]);
            self.reader.consume(len);
            if !complete {
                continue;
            }

            let raw = std::mem::take(&mut self.buf);
            if let Some(line) = protocol_line(&raw) {
                return Ok(Some(line));
            }
        }
    }

    fn drop_oversized(&mut self) {
        tracing::warn!(
            "Dropping {} byte line from tsserver (max {})",
            self.discarded,
            self.max_line
        );
        self.discarded = 0;
    }
}

/// The message carried by a raw line, or `None` for noise.
fn protocol_line(raw: &[u8]) -> Option<String> {
    let line = strip_line_ending(raw);
    if !is_protocol_line(line) {
        if !line.is_empty() {
            tracing::trace!("Skipping non-protocol line: {}", String::from_utf8_lossy(line));
        }
        return None;
    }
    Some(String::from_utf8_lossy(line).into_owned())
}

/// Writes newline-terminated messages to the server's stdin.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one serialized message followed by the line separator.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .context("writing message")?;
        self.writer
            .write_all(LINE_SEPARATOR.as_bytes())
            .await
            .context("writing line separator")?;
        self.writer.flush().await.context("flushing message")?;
        Ok(())
    }
}
