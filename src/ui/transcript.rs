//! Flattens the current session plus any live or failed reply into wrapped
//! display lines.

use crate::core::config::data::ThemeChoice;
use crate::core::controller::StreamSessionController;
use crate::core::message::{Message, Role};
use crate::core::render::RenderPipeline;
use crate::core::session::Session;
use crate::ui::theme::Theme;
use crate::utils::wrap::wrap_lines;
use ratatui::text::{Line, Span};

const USER_HEADER: &str = "You";
const ASSISTANT_HEADER: &str = "Assistant";
const ERROR_PREFIX: &str = "⚠ ";

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub lines: Vec<Line<'static>>,
    /// First line of the most recent user message.
    pub last_user_line: Option<usize>,
}

impl Transcript {
    pub fn height(&self) -> u16 {
        self.lines.len().min(u16::MAX as usize) as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    session_id: String,
    theme: ThemeChoice,
    width: u16,
}

/// Wrapped lines of stored messages. Messages are immutable once appended, so
/// only new ones need rendering.
#[derive(Debug, Default)]
pub struct MessageCache {
    key: Option<CacheKey>,
    rendered: Vec<Vec<Line<'static>>>,
}

impl MessageCache {
    pub fn invalidate(&mut self) {
        self.key = None;
        self.rendered.clear();
    }

    fn sync(&mut self, session: &Session, theme: &Theme, pipeline: &RenderPipeline, width: u16) {
        let key = CacheKey {
            session_id: session.id.clone(),
            theme: theme.choice,
            width,
        };
        if self.key.as_ref() != Some(&key) || self.rendered.len() > session.messages.len() {
            self.rendered.clear();
            self.key = Some(key);
        }
        for message in &session.messages[self.rendered.len()..] {
            let lines = render_message(message, theme, pipeline);
            self.rendered.push(wrap_lines(&lines, width));
        }
    }
}

fn header(role: Role, theme: &Theme) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(USER_HEADER, theme.user_prefix_style)),
        Role::Assistant => Line::from(Span::styled(
            ASSISTANT_HEADER,
            theme.assistant_prefix_style,
        )),
    }
}

fn render_message(message: &Message, theme: &Theme, pipeline: &RenderPipeline) -> Vec<Line<'static>> {
    let mut lines = vec![header(message.role, theme)];
    match message.role {
        Role::User => lines.extend(
            message
                .content
                .split('\n')
                .map(|l| Line::from(Span::styled(l.to_string(), theme.user_text_style))),
        ),
        Role::Assistant => lines.extend(pipeline.render(&message.content).lines()),
    }
    lines
}

fn error_lines(error: &str, theme: &Theme) -> Vec<Line<'static>> {
    error
        .split('\n')
        .enumerate()
        .map(|(i, text)| {
            let prefix = if i == 0 { ERROR_PREFIX } else { "  " };
            Line::from(Span::styled(format!("{prefix}{text}"), theme.error_text_style))
        })
        .collect()
}

pub fn build_transcript(
    cache: &mut MessageCache,
    session: &Session,
    controller: &StreamSessionController,
    pipeline: &RenderPipeline,
    theme: &Theme,
    width: u16,
) -> Transcript {
    cache.sync(session, theme, pipeline, width);

    let mut transcript = Transcript::default();
    for (message, rendered) in session.messages.iter().zip(&cache.rendered) {
        if !transcript.lines.is_empty() {
            transcript.lines.push(Line::default());
        }
        if message.is_user() {
            transcript.last_user_line = Some(transcript.lines.len());
        }
        transcript.lines.extend(rendered.iter().cloned());
    }

    let failure = controller
        .failure()
        .filter(|f| f.session_id == session.id);
    let live = controller.active_session() == Some(session.id.as_str());
    if live || failure.is_some() {
        if !transcript.lines.is_empty() {
            transcript.lines.push(Line::default());
        }
        let mut reply = vec![header(Role::Assistant, theme)];
        reply.extend(
            controller
                .renderer()
                .view_lines(theme.streaming_indicator_style),
        );
        if let Some(failure) = failure {
            reply.extend(error_lines(&failure.error, theme));
        }
        transcript.lines.extend(wrap_lines(&reply, width));
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionList;
    use crate::utils::test_utils::{plain_pipeline, MemoryStore};

    fn texts(t: &Transcript) -> Vec<String> {
        t.lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn stored_messages_render_with_headers() {
        let mut session = Session::with_id("s");
        session.push(Message::user("Hello"));
        session.push(Message::assistant("Hi **there**"));
        let mut cache = MessageCache::default();

        let transcript = build_transcript(
            &mut cache,
            &session,
            &StreamSessionController::new(),
            &plain_pipeline(),
            &Theme::dark_default(),
            80,
        );
        assert_eq!(
            texts(&transcript),
            vec!["You", "Hello", "", "Assistant", "Hi there"]
        );
        assert_eq!(transcript.last_user_line, Some(0));
    }

    #[test]
    fn live_reply_shows_marker_then_failure_notice() {
        let mut sessions = SessionList::from_sessions(vec![Session::with_id("s")]);
        let mut controller = StreamSessionController::new();
        let pipeline = plain_pipeline();
        let theme = Theme::dark_default();
        let mut cache = MessageCache::default();

        let ticket = controller.begin_send(&mut sessions, "Q").unwrap();
        controller.append_chunk(ticket.stream_id, "partial", &pipeline);
        let live = build_transcript(
            &mut cache,
            sessions.current(),
            &controller,
            &pipeline,
            &theme,
            80,
        );
        assert_eq!(live.lines.last().unwrap().to_string(), "partial▌");

        controller
            .fail(
                ticket.stream_id,
                "API Error: down",
                &sessions,
                &MemoryStore::default(),
                &pipeline,
            )
            .unwrap();
        let failed = build_transcript(
            &mut cache,
            sessions.current(),
            &controller,
            &pipeline,
            &theme,
            80,
        );
        assert_eq!(
            texts(&failed),
            vec!["You", "Q", "", "Assistant", "partial", "⚠ API Error: down"]
        );
    }

    #[test]
    fn failure_for_another_session_is_hidden() {
        let mut sessions = SessionList::from_sessions(vec![Session::with_id("a")]);
        let mut controller = StreamSessionController::new();
        let pipeline = plain_pipeline();
        let ticket = controller.begin_send(&mut sessions, "Q").unwrap();
        controller
            .fail(ticket.stream_id, "x", &sessions, &MemoryStore::default(), &pipeline)
            .unwrap();

        let other = Session::with_id("b");
        let transcript = build_transcript(
            &mut MessageCache::default(),
            &other,
            &controller,
            &pipeline,
            &Theme::dark_default(),
            80,
        );
        assert!(transcript.lines.is_empty());
    }
}
