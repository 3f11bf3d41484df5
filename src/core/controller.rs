//! One request/response cycle, from the user's send to the settled reply.
//!
//! The lifecycle is a small state machine held as an immutable snapshot:
//!
//! ```text
//! Idle -> Sending -> Streaming -> Completed -> Idle
//!            \           \
//!             `-----------`----> Failed ----> Idle
//! ```
//!
//! Messages from the stream task carry the id of the stream they belong to;
//! anything tagged with an id other than the active one is ignored.

use std::error::Error as StdError;
use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatRequest;
use crate::core::message::Message;
use crate::core::render::{IncrementalRenderer, RenderPipeline};
use crate::core::session::{SessionList, SessionStore, SessionStoreError};

pub const CANCELLED_NOTICE: &str = "Generation cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Send,
    Open,
    Complete,
    Fail,
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub phase: Phase,
    pub stream_id: u64,
}

impl Default for StreamSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            stream_id: 0,
        }
    }
}

impl StreamSnapshot {
    /// Next snapshot, or `None` if the transition is not valid from here.
    pub fn apply(self, transition: Transition) -> Option<Self> {
        use Phase::*;

        let phase = match (self.phase, transition) {
            (Idle, Transition::Send) => Sending,
            (Sending, Transition::Open) => Streaming,
            (Sending | Streaming, Transition::Complete) => Completed,
            (Sending | Streaming, Transition::Fail) => Failed,
            (Completed | Failed, Transition::Settle) => Idle,
            _ => return None,
        };
        let stream_id = match transition {
            Transition::Send => self.stream_id.wrapping_add(1),
            _ => self.stream_id,
        };
        Some(Self { phase, stream_id })
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Sending | Phase::Streaming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    Busy,
    EmptyInput,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejected::Busy => write!(f, "A reply is still being generated"),
            SendRejected::EmptyInput => write!(f, "Nothing to send"),
        }
    }
}

impl StdError for SendRejected {}

/// Everything the caller needs to start the stream task for an accepted send.
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub stream_id: u64,
    pub session_id: String,
    pub request: ChatRequest,
    pub cancel_token: CancellationToken,
}

/// A reply that ended in an error. Its partial text stays in the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedReply {
    pub session_id: String,
    pub error: String,
}

#[derive(Debug)]
struct ActiveStream {
    session_id: String,
    cancel_token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct StreamSessionController {
    snapshot: StreamSnapshot,
    active: Option<ActiveStream>,
    renderer: IncrementalRenderer,
    failure: Option<FailedReply>,
}

impl StreamSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.snapshot
    }

    pub fn phase(&self) -> Phase {
        self.snapshot.phase
    }

    pub fn is_generating(&self) -> bool {
        self.snapshot.is_generating()
    }

    pub fn renderer(&self) -> &IncrementalRenderer {
        &self.renderer
    }

    pub fn failure(&self) -> Option<&FailedReply> {
        self.failure.as_ref()
    }

    /// Session the in-flight reply belongs to.
    pub fn active_session(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.session_id.as_str())
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.active.is_some() && self.snapshot.stream_id == stream_id
    }

    /// Forget a failed reply, e.g. when the user moves to another session.
    pub fn dismiss_failure(&mut self) {
        if self.failure.take().is_some() && !self.is_generating() {
            self.renderer = IncrementalRenderer::new();
        }
    }

    /// Re-render the visible reply with a new pipeline, e.g. after a theme change.
    pub fn rerender(&mut self, pipeline: &RenderPipeline) {
        if self.active.is_some() || self.failure.is_some() {
            self.renderer.refresh(pipeline);
        }
    }

    /// Accept a send: record the user message and open a new stream slot.
    pub fn begin_send(
        &mut self,
        sessions: &mut SessionList,
        input: &str,
    ) -> Result<SendTicket, SendRejected> {
        if self.active.is_some() {
            return Err(SendRejected::Busy);
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        let next = self
            .snapshot
            .apply(Transition::Send)
            .ok_or(SendRejected::Busy)?;

        sessions.append_to_current(Message::user(text));
        let session_id = sessions.current_id().to_string();
        let cancel_token = CancellationToken::new();

        self.snapshot = next;
        self.failure = None;
        self.renderer.begin();
        self.active = Some(ActiveStream {
            session_id: session_id.clone(),
            cancel_token: cancel_token.clone(),
        });
        debug!(stream_id = next.stream_id, session = %session_id, "send accepted");

        Ok(SendTicket {
            stream_id: next.stream_id,
            request: ChatRequest::for_user_turn(text, session_id.clone()),
            session_id,
            cancel_token,
        })
    }

    pub fn stream_opened(&mut self, stream_id: u64) -> bool {
        if !self.is_current_stream(stream_id) {
            return false;
        }
        match self.snapshot.apply(Transition::Open) {
            Some(next) => {
                self.snapshot = next;
                true
            }
            None => false,
        }
    }

    /// Render one more delta. Returns false for stale streams.
    pub fn append_chunk(&mut self, stream_id: u64, text: &str, pipeline: &RenderPipeline) -> bool {
        if !self.is_current_stream(stream_id) {
            return false;
        }
        if self.snapshot.phase == Phase::Sending {
            self.stream_opened(stream_id);
        }
        self.renderer.push_delta(text, pipeline);
        true
    }

    /// Finish the reply and append it as an assistant message. Returns
    /// `Ok(false)` for stale streams; a store error is reported after cleanup.
    pub fn complete(
        &mut self,
        stream_id: u64,
        sessions: &mut SessionList,
        store: &dyn SessionStore,
        pipeline: &RenderPipeline,
    ) -> Result<bool, SessionStoreError> {
        let Some(active) = self.settle(stream_id, Transition::Complete, pipeline) else {
            return Ok(false);
        };

        let reply = self.renderer.accumulated().to_string();
        if let Err(err) = sessions.append_to(&active.session_id, Message::assistant(reply)) {
            warn!(error = %err, "reply finished for a session that no longer exists");
        }
        sessions.persist(store)?;
        Ok(true)
    }

    /// End the reply with an error. The partial text stays visible next to the
    /// notice, no assistant message is stored, and the user message is persisted.
    pub fn fail(
        &mut self,
        stream_id: u64,
        error: impl Into<String>,
        sessions: &SessionList,
        store: &dyn SessionStore,
        pipeline: &RenderPipeline,
    ) -> Result<bool, SessionStoreError> {
        let Some(active) = self.settle(stream_id, Transition::Fail, pipeline) else {
            return Ok(false);
        };

        self.failure = Some(FailedReply {
            session_id: active.session_id,
            error: error.into(),
        });
        sessions.persist(store)?;
        Ok(true)
    }

    /// Abort the in-flight stream, if any.
    pub fn cancel(
        &mut self,
        sessions: &SessionList,
        store: &dyn SessionStore,
        pipeline: &RenderPipeline,
    ) -> Result<bool, SessionStoreError> {
        let Some(active) = &self.active else {
            return Ok(false);
        };
        active.cancel_token.cancel();
        let stream_id = self.snapshot.stream_id;
        self.fail(stream_id, CANCELLED_NOTICE, sessions, store, pipeline)
    }

    /// Run the terminal transition and unconditional cleanup.
    fn settle(
        &mut self,
        stream_id: u64,
        transition: Transition,
        pipeline: &RenderPipeline,
    ) -> Option<ActiveStream> {
        if !self.is_current_stream(stream_id) {
            debug!(stream_id, "ignoring message for stale stream");
            return None;
        }
        let terminal = self.snapshot.apply(transition)?;
        let active = self.active.take()?;

        self.renderer.finish(pipeline);
        self.snapshot = terminal.apply(Transition::Settle).unwrap_or(terminal);
        debug!(stream_id, phase = ?terminal.phase, "stream settled");
        Some(active)
    }
}
