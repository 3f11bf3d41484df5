use crate::core::frame::{DecodedFrame, EventRecord};

/// What the stream pump should do with one decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAction {
    Append(String),
    Stop,
    Ignore,
}

pub fn interpret(frame: DecodedFrame) -> StreamAction {
    match frame {
        DecodedFrame::Event(EventRecord::Delta(text)) => StreamAction::Append(text),
        DecodedFrame::Event(EventRecord::Terminal) => StreamAction::Stop,
        DecodedFrame::Malformed { .. } => StreamAction::Ignore,
    }
}
