//! Main chat event loop
//!
//! The loop owns the [`App`]. Terminal events and stream messages arrive on
//! separate channels and are turned into [`AppAction`]s, applied in arrival
//! order, and followed by a redraw.

mod keybindings;
mod lifecycle;

use self::keybindings::{build_mode_aware_registry, resolve_key, KeyResult, ModeAwareRegistry};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppCommand, AppInit,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamReceiver};
use crate::core::scroll::ViewportEvent;
use crate::ui::renderer::ui;
use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use std::{error::Error, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, info};

const WHEEL_LINES: u16 = 3;
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// One action per message, in arrival order, so every delta gets its own
/// re-render. Only the draw is batched.
fn stream_actions(messages: Vec<(StreamMessage, u64)>) -> Vec<AppAction> {
    messages
        .into_iter()
        .map(|(message, stream_id)| AppAction::from_stream(message, stream_id))
        .collect()
}

fn handle_terminal_event(
    app: &mut App,
    registry: &ModeAwareRegistry,
    event: Event,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    let actions = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            match resolve_key(registry, app, &key, ctx) {
                KeyResult::Dispatch(actions) => actions,
                KeyResult::Edit => {
                    app.ui.apply_textarea_edit(|ta| {
                        ta.input(tui_textarea::Input::from(key));
                    });
                    Vec::new()
                }
                KeyResult::Newline => {
                    app.ui.apply_textarea_edit(|ta| ta.insert_newline());
                    Vec::new()
                }
                KeyResult::NotHandled => Vec::new(),
            }
        }
        Event::Paste(text) => {
            let text = sanitize_pasted_text(&text);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![AppAction::InsertIntoInput { text }]
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => vec![AppAction::Scroll(ViewportEvent::WheelUp(WHEEL_LINES))],
            MouseEventKind::ScrollDown => {
                vec![AppAction::Scroll(ViewportEvent::WheelDown(WHEEL_LINES))]
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    apply_actions(app, actions, ctx)
}

fn run_commands(stream_service: &ChatStreamService, commands: Vec<AppCommand>) {
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => {
                debug!(stream_id = params.stream_id, "spawning stream");
                stream_service.spawn_stream(params);
            }
        }
    }
}

/// Terminal input is read on a blocking thread; it stops once the loop drops
/// the receiver.
fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        if event_tx.is_closed() {
            break;
        }
        match event::poll(EVENT_POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if event_tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => continue,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    })
}

async fn event_loop(
    app: &mut App,
    terminal: &mut ChatTerminal,
    registry: &ModeAwareRegistry,
    stream_service: &ChatStreamService,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    stream_rx: &mut StreamReceiver,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        let ctx = AppActionContext {
            term_width: size.width,
            term_height: size.height,
        };
        // Picks up resizes and input growth before drawing.
        app.refresh_transcript(ctx);
        terminal.draw(|f| ui(f, app))?;

        if app.ui.exit_requested {
            return Ok(());
        }

        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(first) = maybe_event else {
                    return Ok(());
                };
                let mut commands = handle_terminal_event(app, registry, first, ctx);
                while let Ok(ev) = event_rx.try_recv() {
                    commands.extend(handle_terminal_event(app, registry, ev, ctx));
                }
                run_commands(stream_service, commands);
            }
            Some(first) = stream_rx.recv() => {
                let mut messages = vec![first];
                while let Ok(message) = stream_rx.try_recv() {
                    messages.push(message);
                }
                let commands = apply_actions(app, stream_actions(messages), ctx);
                run_commands(stream_service, commands);
            }
        }
    }
}

pub async fn run_chat(init: AppInit) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(init);
    info!(endpoint = app.endpoint(), sessions = app.sessions.len(), "starting chat");

    let mut terminal = setup_terminal()?;
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let _event_reader = spawn_event_reader(event_tx);
    let registry = build_mode_aware_registry();

    let result = event_loop(
        &mut app,
        &mut terminal,
        &registry,
        &stream_service,
        &mut event_rx,
        &mut stream_rx,
    )
    .await;

    drop(event_rx);
    restore_terminal(&mut terminal)?;
    result
}
