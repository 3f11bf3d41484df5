use std::path::PathBuf;

use crate::core::chat_stream::StreamParams;
use crate::core::config::data::Config;
use crate::core::controller::{SendTicket, StreamSessionController};
use crate::core::render::RenderPipeline;
use crate::core::scroll::ScrollCoordinator;
use crate::core::session::{SessionList, SessionStore};
use crate::ui::layout::ChatLayout;
use crate::ui::markdown::TerminalMarkdown;
use crate::ui::theme::Theme;
use crate::ui::transcript::{build_transcript, MessageCache, Transcript};
use crate::utils::syntax::SyntectHighlighter;

pub mod actions;
pub mod ui_state;

pub use actions::{apply_action, apply_actions, AppAction, AppActionContext, AppCommand};
pub use ui_state::UiState;

/// Everything needed to build an [`App`] once config and history are loaded.
pub struct AppInit {
    pub sessions: SessionList,
    pub store: Box<dyn SessionStore + Send>,
    pub endpoint: String,
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

pub struct App {
    pub sessions: SessionList,
    pub controller: StreamSessionController,
    pub scroll: ScrollCoordinator,
    pub ui: UiState,
    pub pipeline: RenderPipeline,
    pub transcript: Transcript,
    message_cache: MessageCache,
    store: Box<dyn SessionStore + Send>,
    client: reqwest::Client,
    endpoint: String,
    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(init: AppInit) -> Self {
        let AppInit {
            sessions,
            store,
            endpoint,
            config,
            config_path,
        } = init;
        let theme = Theme::for_choice(config.theme_choice());
        let syntax_enabled = config.syntax_enabled();

        App {
            sessions,
            controller: StreamSessionController::new(),
            scroll: ScrollCoordinator::new(config.scroll_threshold()),
            pipeline: build_pipeline(&theme, syntax_enabled),
            ui: UiState::new(theme, syntax_enabled),
            transcript: Transcript::default(),
            message_cache: MessageCache::default(),
            store,
            client: reqwest::Client::new(),
            endpoint,
            config_path,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn layout(&self, ctx: AppActionContext) -> ChatLayout {
        ChatLayout::from_terminal_size(
            ctx.term_width,
            ctx.term_height,
            self.ui.sidebar_visible,
            self.ui.input_line_count(),
        )
    }

    /// Swap the theme and re-render everything that depends on it.
    pub fn apply_theme(&mut self, theme: Theme) {
        self.pipeline = build_pipeline(&theme, self.ui.syntax_enabled);
        self.ui.set_theme(theme);
        self.message_cache.invalidate();
        self.controller.rerender(&self.pipeline);
    }

    /// Rebuild the transcript for the current size and let the scroll
    /// coordinator pin or clamp the viewport.
    pub fn refresh_transcript(&mut self, ctx: AppActionContext) {
        let (width, height) = self.layout(ctx).transcript_viewport();
        self.transcript = build_transcript(
            &mut self.message_cache,
            self.sessions.current(),
            &self.controller,
            &self.pipeline,
            &self.ui.theme,
            width,
        );
        self.scroll
            .content_changed(self.transcript.height(), height);
    }

    pub fn stream_params(&self, ticket: SendTicket) -> StreamParams {
        StreamParams {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            request: ticket.request,
            cancel_token: ticket.cancel_token,
            stream_id: ticket.stream_id,
        }
    }
}

pub fn build_pipeline(theme: &Theme, syntax_enabled: bool) -> RenderPipeline {
    let highlighter = syntax_enabled.then(|| {
        Box::new(SyntectHighlighter::for_theme(theme))
            as Box<dyn crate::core::render::CodeHighlighter + Send>
    });
    RenderPipeline::new(Box::new(TerminalMarkdown::new(theme.clone())), highlighter)
}
