mod sessions;
mod streaming;
mod view;

use super::App;
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::scroll::ViewportEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SubmitInput,
    SubmitPrompt { text: String },
    StreamOpened { stream_id: u64 },
    AppendResponseChunk { content: String, stream_id: u64 },
    StreamErrored { message: String, stream_id: u64 },
    StreamCompleted { stream_id: u64 },
    CancelStreaming,

    NewChat,
    SwitchSession { step: isize },
    RequestDelete,
    ConfirmDelete,
    DismissDelete,

    InsertIntoInput { text: String },
    ToggleTheme,
    ToggleSidebar,
    Scroll(ViewportEvent),
    JumpToLastQuestion,
    SetStatus { message: String },
    ClearStatus,
    Quit,
}

impl AppAction {
    pub fn from_stream(message: StreamMessage, stream_id: u64) -> Self {
        match message {
            StreamMessage::Opened => AppAction::StreamOpened { stream_id },
            StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content, stream_id },
            StreamMessage::Error(message) => AppAction::StreamErrored { message, stream_id },
            StreamMessage::End => AppAction::StreamCompleted { stream_id },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

pub fn apply_actions(
    app: &mut App,
    actions: impl IntoIterator<Item = AppAction>,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(app, action, ctx) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    let command = match action {
        AppAction::SubmitInput
        | AppAction::SubmitPrompt { .. }
        | AppAction::StreamOpened { .. }
        | AppAction::AppendResponseChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::CancelStreaming => streaming::handle_streaming_action(app, action),

        AppAction::NewChat
        | AppAction::SwitchSession { .. }
        | AppAction::RequestDelete
        | AppAction::ConfirmDelete
        | AppAction::DismissDelete => sessions::handle_session_action(app, action),

        AppAction::InsertIntoInput { .. }
        | AppAction::ToggleTheme
        | AppAction::ToggleSidebar
        | AppAction::Scroll(_)
        | AppAction::JumpToLastQuestion
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus
        | AppAction::Quit => view::handle_view_action(app, action, ctx),
    };
    app.refresh_transcript(ctx);
    command
}
