use super::{App, AppAction, AppCommand};
use crate::core::controller::SendRejected;
use crate::core::session::SessionStoreError;
use tracing::{debug, warn};

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SubmitInput => {
            let text = app.ui.input_text();
            submit(app, &text)
        }
        AppAction::SubmitPrompt { text } => {
            app.ui.set_input_text(&text);
            submit(app, &text)
        }
        AppAction::StreamOpened { stream_id } => {
            app.controller.stream_opened(stream_id);
            None
        }
        AppAction::AppendResponseChunk { content, stream_id } => {
            app.controller
                .append_chunk(stream_id, &content, &app.pipeline);
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            let result = app.controller.fail(
                stream_id,
                message,
                &app.sessions,
                app.store.as_ref(),
                &app.pipeline,
            );
            report_store_result(app, result);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            let result = app.controller.complete(
                stream_id,
                &mut app.sessions,
                app.store.as_ref(),
                &app.pipeline,
            );
            report_store_result(app, result);
            None
        }
        AppAction::CancelStreaming => {
            let result = app
                .controller
                .cancel(&app.sessions, app.store.as_ref(), &app.pipeline);
            report_store_result(app, result);
            None
        }
        _ => None,
    }
}

fn submit(app: &mut App, text: &str) -> Option<AppCommand> {
    match app.controller.begin_send(&mut app.sessions, text) {
        Ok(ticket) => {
            app.ui.clear_input();
            app.ui.pending_delete = None;
            app.ui.status = None;
            app.scroll.reset();
            Some(AppCommand::SpawnStream(app.stream_params(ticket)))
        }
        Err(SendRejected::EmptyInput) => None,
        Err(reason @ SendRejected::Busy) => {
            debug!(%reason, "send ignored");
            None
        }
    }
}

fn report_store_result(app: &mut App, result: Result<bool, SessionStoreError>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to save sessions");
        app.ui.set_status(err.to_string());
    }
}
