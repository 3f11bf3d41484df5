use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatRequest;
use crate::core::frame::FrameDecoder;
use crate::core::interpreter::{interpret, StreamAction};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// The endpoint accepted the request and the body is being read.
    Opened,
    Chunk(String),
    Error(String),
    End,
}

pub type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;
pub type StreamReceiver = mpsc::UnboundedReceiver<(StreamMessage, u64)>;

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("detail")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Render an error body as a markdown notice, pretty-printing JSON bodies.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

/// Sends messages for one stream and guarantees the receiver sees an `End`,
/// even if the task unwinds before reporting.
struct StreamReporter {
    tx: StreamSender,
    stream_id: u64,
    reported: bool,
}

impl StreamReporter {
    fn new(tx: StreamSender, stream_id: u64) -> Self {
        Self {
            tx,
            stream_id,
            reported: false,
        }
    }

    fn send(&self, message: StreamMessage) {
        if self.tx.send((message, self.stream_id)).is_err() {
            debug!(stream_id = self.stream_id, "stream receiver dropped");
        }
    }

    fn end(&mut self) {
        self.send(StreamMessage::End);
        self.reported = true;
    }

    fn fail(&mut self, error: String) {
        self.send(StreamMessage::Error(error));
        self.end();
    }

    /// The stream was cancelled by the UI, which has already cleaned up.
    fn disarm(&mut self) {
        self.reported = true;
    }
}

impl Drop for StreamReporter {
    fn drop(&mut self) {
        if !self.reported {
            warn!(stream_id = self.stream_id, "stream task ended without reporting");
            self.send(StreamMessage::Error(
                "Stream ended unexpectedly".to_string(),
            ));
            self.send(StreamMessage::End);
        }
    }
}

/// Feed a response body through the frame decoder and interpreter.
async fn pump_body<S, B, E>(mut body: S, reporter: &mut StreamReporter)
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut decoder = FrameDecoder::new();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(stream_id = reporter.stream_id, error = %e, "response body read failed");
                reporter.fail(format_api_error(&e.to_string()));
                return;
            }
        };

        for frame in decoder.push(bytes.as_ref()) {
            match interpret(frame) {
                StreamAction::Append(text) => reporter.send(StreamMessage::Chunk(text)),
                StreamAction::Stop => {
                    reporter.end();
                    return;
                }
                StreamAction::Ignore => {}
            }
        }
    }

    decoder.finish();
    reporter.end();
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub request: ChatRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, StreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                endpoint,
                request,
                cancel_token,
                stream_id,
            } = params;
            let mut reporter = StreamReporter::new(tx_clone, stream_id);
            debug!(stream_id, endpoint = %endpoint, "starting stream");

            tokio::select! {
                _ = run_stream(&client, &endpoint, &request, &mut reporter) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
            if cancel_token.is_cancelled() {
                reporter.disarm();
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_stream(
    client: &reqwest::Client,
    endpoint: &str,
    request: &ChatRequest,
    reporter: &mut StreamReporter,
) {
    let response = match client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "chat request failed");
            reporter.fail(format_api_error(&e.to_string()));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        warn!(%status, "chat endpoint returned an error status");
        reporter.fail(format_api_error(&error_text));
        return;
    }

    reporter.send(StreamMessage::Opened);
    pump_body(response.bytes_stream(), reporter).await;
}
