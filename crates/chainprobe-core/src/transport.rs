//! Event-stream framing.
//!
//! Producer side: every event becomes one `data: <json>\n\n` frame. Compact
//! JSON never contains a raw newline, so the blank line only ever appears as
//! a terminator. Consumer side: [`FrameDecoder`] keeps a carry-over buffer
//! across chunk boundaries and drops malformed frames without stopping.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::StreamExt as _;
use futures::stream;
use tracing::warn;

use crate::errors::TransportError;
use crate::event::Event;

/// Content type of the event stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

const DATA_PREFIX: &str = "data:";

/// Serializes one event into a complete frame.
pub fn encode_frame(event: &Event) -> Result<Bytes, TransportError> {
    let json = serde_json::to_string(event).map_err(|e| TransportError::Encode(e.to_string()))?;
    let mut frame = String::with_capacity(json.len() + 8);
    frame.push_str(DATA_PREFIX);
    frame.push(' ');
    frame.push_str(&json);
    frame.push_str("\n\n");
    Ok(Bytes::from(frame))
}

/// Incremental decoder tolerant of arbitrary chunking.
#[derive(Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already searched for a terminator.
    scanned: usize,
    dropped: usize,
}

impl FrameDecoder {
    /// Appends a chunk and returns every event completed by it.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf, self.scanned) {
            let frame: Vec<u8> = self.buf.drain(..idx + delim_len).take(idx).collect();
            self.scanned = 0;
            match parse_frame(&frame) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(reason) => {
                    self.dropped += 1;
                    warn!(%reason, "dropping malformed frame");
                }
            }
        }
        // A terminator may straddle the next chunk boundary.
        self.scanned = self.buf.len().saturating_sub(3);
        events
    }

    /// Number of frames discarded so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn find_frame_delimiter(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// `Ok(None)` for frames that carry no data (comments, keep-alives).
fn parse_frame(bytes: &[u8]) -> Result<Option<Event>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid utf-8: {e}"))?;
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        match line.strip_prefix(DATA_PREFIX) {
            Some(rest) => data_lines.push(rest.strip_prefix(' ').unwrap_or(rest)),
            None => return Err(format!("unexpected line: {line:?}")),
        }
    }
    if data_lines.is_empty() {
        return Ok(None);
    }
    let data = data_lines.join("\n");
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| format!("invalid event json: {e}"))
}

type ByteStream<E> = Pin<Box<dyn futures::Stream<Item = Result<Bytes, E>> + Send + 'static>>;

/// Turns a byte stream into a stream of decoded events.
///
/// Ends when the byte stream ends; a read error is yielded once and ends it.
pub fn decode_stream<S, E>(bytes: S) -> impl futures::Stream<Item = Result<Event, TransportError>> + Send
where
    S: futures::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    struct State<E> {
        bytes: ByteStream<E>,
        decoder: FrameDecoder,
        pending: VecDeque<Event>,
        done: bool,
    }

    stream::unfold(
        State {
            bytes: Box::pin(bytes),
            decoder: FrameDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Some((Ok(event), state));
                }
                if state.done {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.decoder.push_chunk(&chunk));
                    }
                    Some(Err(err)) => {
                        state.done = true;
                        return Some((Err(TransportError::Read(err.to_string())), state));
                    }
                    None => {
                        if state.decoder.pending() > 0 {
                            warn!(bytes = state.decoder.pending(), "stream ended mid-frame");
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}
