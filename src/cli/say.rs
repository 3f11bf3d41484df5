//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use tokio_util::sync::CancellationToken;

use crate::api::ChatRequest;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams, StreamReceiver};
use crate::core::session::new_session_id;

/// Forward chunks of one stream to `out` until it ends. Returns the full reply.
pub(crate) async fn print_stream<W: Write>(
    rx: &mut StreamReceiver,
    stream_id: u64,
    out: &mut W,
) -> Result<String, Box<dyn Error>> {
    let mut full_response = String::new();
    while let Some((message, id)) = rx.recv().await {
        if id != stream_id {
            continue;
        }
        match message {
            StreamMessage::Opened => {}
            StreamMessage::Chunk(content) => {
                full_response.push_str(&content);
                write!(out, "{content}")?;
                out.flush()?;
            }
            StreamMessage::Error(err) => {
                writeln!(out)?;
                return Err(err.into());
            }
            StreamMessage::End => break,
        }
    }
    writeln!(out)?;
    Ok(full_response)
}

pub async fn run_say(prompt: Vec<String>, endpoint: String) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("Usage: parley say <prompt>".into());
    }

    let (stream_service, mut rx) = ChatStreamService::new();
    let stream_id = 1;
    stream_service.spawn_stream(StreamParams {
        client: reqwest::Client::new(),
        endpoint,
        request: ChatRequest::for_user_turn(prompt, new_session_id()),
        cancel_token: CancellationToken::new(),
        stream_id,
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_stream(&mut rx, stream_id, &mut out).await?;
    Ok(())
}
