use std::error::Error;

use crate::core::session::{Session, SessionStore};

fn describe(session: &Session) -> String {
    let count = session.messages.len();
    let noun = if count == 1 { "message" } else { "messages" };
    format!(
        "{}  {}  {} ({} {})",
        session.created_at.format("%Y-%m-%d %H:%M"),
        session.id,
        session.title,
        count,
        noun
    )
}

pub fn format_sessions(sessions: &[Session]) -> Vec<String> {
    sessions.iter().map(describe).collect()
}

pub fn list_sessions(store: &dyn SessionStore) -> Result<(), Box<dyn Error>> {
    let sessions = store.load()?;
    if sessions.is_empty() {
        println!("No stored chats yet.");
        return Ok(());
    }

    println!("Stored chats (most recent first):\n");
    for line in format_sessions(&sessions) {
        println!("  {line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;

    #[test]
    fn lines_show_title_and_message_count() {
        let mut session = Session::with_id("abc");
        session.push(Message::user("What is a frame?"));
        let lines = format_sessions(&[session, Session::with_id("def")]);
        assert!(lines[0].ends_with("abc  What is a frame? (1 message)"));
        assert!(lines[1].ends_with("def  New Chat (0 messages)"));
    }
}
