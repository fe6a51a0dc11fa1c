//! Line-level Server-Sent-Events plumbing.
//!
//! The interceptor works one line at a time, so this module only splits the
//! upstream byte stream into lines and builds outbound `data:` frames. Event
//! assembly across lines is left to the client.

use futures_util::{Stream, StreamExt};
use serde_json::Value;

pub const DATA_MARKER: &str = "data:";

/// Splits a byte stream into lines, buffering only the current partial line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                lines.push(Self::take_line(&mut self.buf));
            } else {
                self.buf.push(byte);
            }
        }
        lines
    }

    /// Flush a trailing line that had no terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(Self::take_line(&mut self.buf))
        }
    }

    fn take_line(buf: &mut Vec<u8>) -> String {
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        let line = String::from_utf8_lossy(buf).into_owned();
        buf.clear();
        line
    }
}

/// Lazily turn an upstream chunk stream into a stream of lines.
///
/// The first upstream error is yielded and ends the stream.
pub fn lines<S, B, E>(upstream: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut decoder = LineDecoder::new();
        futures_util::pin_mut!(upstream);

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in decoder.push(bytes.as_ref()) {
                        yield Ok(line);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(line) = decoder.finish() {
            yield Ok(line);
        }
    }
}

/// Payload of a `data:` line, with one optional leading space removed.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_MARKER)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

/// A complete single-line event carrying `message`.
pub fn frame(message: &Value) -> String {
    format!("{} {}\n\n", DATA_MARKER, message)
}
