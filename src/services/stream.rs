//! Streaming text generation
//!
//! Live chunk sequence for `stream: true` requests plus a server-sent events
//! decoder that turns `data: {"response": ...}` lines into text fragments.

use crate::services::transport::{BoxStream, ByteStream, RawResponse};
use crate::utils::error::ClientResult;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

/// End-of-stream marker sent by the server
const DONE_MARKER: &str = "[DONE]";

/// Incremental server-sent events decoder
///
/// Buffers partial lines across chunk boundaries, including UTF-8 sequences
/// split between chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end marker has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk, returning the text fragments completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(text) = self.decode_line(&line) {
                fragments.push(text);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        fragments
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        if self.done || line.is_empty() {
            return Vec::new();
        }
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);
        let data = line.strip_prefix("data:")?.trim_start();

        if data.trim() == DONE_MARKER {
            debug!("Received streaming response end marker");
            self.done = true;
            return None;
        }

        match serde_json::from_str::<serde_json::Value>(data) {
            Ok(event) => event["response"].as_str().map(str::to_string),
            Err(e) => {
                // Skip the event and keep decoding
                warn!("Failed to parse streaming response chunk: {} - data: {}", e, data);
                None
            }
        }
    }
}

/// Streamed text generation response
///
/// Yields raw body chunks as they arrive. Dropping it closes the connection.
pub struct TextGenerationStream {
    status: u16,
    headers: HeaderMap,
    inner: ByteStream,
}

impl TextGenerationStream {
    pub fn from_raw(raw: RawResponse) -> Self {
        let status = raw.status_code();
        let headers = raw.headers().clone();
        Self {
            status,
            headers,
            inner: raw.into_stream(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decode the chunk sequence into generated text fragments
    pub fn into_text_stream(self) -> BoxStream<'static, String> {
        struct State {
            inner: ByteStream,
            decoder: SseDecoder,
            pending: VecDeque<String>,
            exhausted: bool,
        }

        let state = State {
            inner: self.inner,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            exhausted: false,
        };

        Box::pin(futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(text) = state.pending.pop_front() {
                    return Some((Ok(text), state));
                }
                if state.exhausted || state.decoder.is_done() {
                    return None;
                }
                match state.inner.next().await {
                    Some(Ok(chunk)) => {
                        let fragments = state.decoder.push(&chunk);
                        state.pending.extend(fragments);
                    }
                    Some(Err(e)) => {
                        state.exhausted = true;
                        return Some((Err(e), state));
                    }
                    None => {
                        state.exhausted = true;
                        let fragments = state.decoder.finish();
                        state.pending.extend(fragments);
                    }
                }
            }
        }))
    }

    /// Drain the stream into the full generated text
    pub async fn collect_text(self) -> ClientResult<String> {
        let mut text = String::new();
        let mut fragments = self.into_text_stream();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for TextGenerationStream {
    type Item = ClientResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for TextGenerationStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextGenerationStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"respon").is_empty());
        assert_eq!(decoder.push(b"se\":\"Hel\"}\n\ndata: {\"response\":\"lo\"}\n"), vec!["Hel", "lo"]);
    }

    #[test]
    fn test_decoder_stops_at_done_marker() {
        let mut decoder = SseDecoder::new();
        let fragments = decoder.push(b"data: {\"response\":\"a\"}\ndata: [DONE]\ndata: {\"response\":\"b\"}\n");
        assert_eq!(fragments, vec!["a"]);
        assert!(decoder.is_done());
        assert!(decoder.push(b"data: {\"response\":\"c\"}\n").is_empty());
    }

    #[test]
    fn test_decoder_skips_malformed_events() {
        let mut decoder = SseDecoder::new();
        let fragments = decoder.push(b"data: {broken\n: keep-alive\ndata: {\"response\":\"ok\"}\n");
        assert_eq!(fragments, vec!["ok"]);
    }

    #[test]
    fn test_decoder_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"response\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
    }

    #[test]
    fn test_decoder_joins_split_utf8() {
        let bytes = "data: {\"response\":\"é\"}\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["é"]);
    }
}
