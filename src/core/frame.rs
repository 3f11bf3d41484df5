//! Reassembles a chunked `text/event-stream` body into discrete event records.
//!
//! Frames are delimited by a blank line (`"\n\n"`). Chunks can split a frame, or
//! a multi-byte character, at any byte; the decoder only looks at a frame once the
//! separator has arrived, so the output never depends on chunk boundaries.

use memchr::memmem;
use tracing::{debug, warn};

use crate::api::DeltaPayload;

pub const FRAME_SEPARATOR: &[u8] = b"\n\n";
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    Delta(String),
    Terminal,
}

/// Result of decoding one complete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Event(EventRecord),
    /// The frame carried a payload that was not a valid delta record.
    Malformed { payload: String, error: String },
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // Bytes before this index are known not to start a separator.
    scan_from: usize,
    terminated: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate the frames it completes. Frames are extracted
    /// as the iterator is driven; anything not pulled stays buffered for the next
    /// call.
    pub fn push(&mut self, chunk: &[u8]) -> Frames<'_> {
        if !self.terminated {
            self.buffer.extend_from_slice(chunk);
        }
        Frames { decoder: self }
    }

    /// End of input. A trailing fragment without a separator is dropped.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            debug!(
                bytes = self.buffer.len(),
                "discarding unterminated trailing frame"
            );
        }
        self.buffer.clear();
        self.scan_from = 0;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn next_frame(&mut self) -> Option<DecodedFrame> {
        while !self.terminated {
            let Some(relative) = memmem::find(&self.buffer[self.scan_from..], FRAME_SEPARATOR)
            else {
                self.scan_from = self.buffer.len().saturating_sub(FRAME_SEPARATOR.len() - 1);
                return None;
            };

            let end = self.scan_from + relative + FRAME_SEPARATOR.len();
            let frame: Vec<u8> = self.buffer.drain(..end).collect();
            self.scan_from = 0;

            let Some(decoded) = decode_frame(&String::from_utf8_lossy(&frame)) else {
                continue;
            };

            if decoded == DecodedFrame::Event(EventRecord::Terminal) {
                self.terminated = true;
                if !self.buffer.is_empty() {
                    debug!(
                        bytes = self.buffer.len(),
                        "terminal frame received; dropping buffered data"
                    );
                }
                self.buffer.clear();
            }
            return Some(decoded);
        }
        None
    }
}

pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_frame()
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest).trim())
}

/// Decode a single complete frame. Frames without a `data:` line, and delta
/// records with no text, produce nothing.
pub fn decode_frame(frame: &str) -> Option<DecodedFrame> {
    let payload = frame.trim().lines().find_map(extract_data_payload)?;

    if payload == DONE_SENTINEL {
        return Some(DecodedFrame::Event(EventRecord::Terminal));
    }

    match serde_json::from_str::<DeltaPayload>(payload) {
        Ok(DeltaPayload { text: Some(text) }) if !text.is_empty() => {
            Some(DecodedFrame::Event(EventRecord::Delta(text)))
        }
        Ok(_) => None,
        Err(err) => {
            warn!(payload, error = %err, "dropping frame with malformed payload");
            Some(DecodedFrame::Malformed {
                payload: payload.to_string(),
                error: err.to_string(),
            })
        }
    }
}
