use chrono::{DateTime, Local};

use parlor_types::events::{ChatEvent, NoticeLevel};
use parlor_types::models::{ChatPartner, Message, MessageKind};

pub fn message_line(partner: &str, message: &Message) -> String {
    let time = DateTime::from_timestamp_millis(message.timestamp)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".into());
    let who = if message.is_mine() { "me" } else { partner };
    let body = match message.kind {
        MessageKind::Text => message.content.clone(),
        MessageKind::Image => format!("[image, {} bytes encoded]", message.content.len()),
    };
    format!("[{}] {}: {}", time, who, body)
}

/// Partners with saved history are starred.
pub fn user_list(users: &[ChatPartner], with_history: &[String]) -> String {
    if users.is_empty() {
        return "  (no users)".into();
    }
    users
        .iter()
        .map(|u| {
            let mark = if with_history.contains(&u.name) { "*" } else { " " };
            format!(" {}- {}", mark, u.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per event, or `None` for events the REPL draws itself.
pub fn event_line(event: &ChatEvent) -> Option<String> {
    let line = match event {
        ChatEvent::ConversationLoaded {
            partner,
            total,
            visible,
        } => format!("-- chat with {} ({} of {} messages) --", partner, visible, total),
        ChatEvent::MessageAppended { partner, message }
        | ChatEvent::ReplyDelivered { partner, message } => message_line(partner, message),
        ChatEvent::TypingStarted { partner } => format!("{} is typing...", partner),
        ChatEvent::OlderMessagesLoading { .. } => "loading older messages...".into(),
        ChatEvent::OlderMessagesLoaded {
            added, has_more, ..
        } => {
            if *has_more {
                format!("-- {} older messages --", added)
            } else {
                format!("-- {} older messages (start of history) --", added)
            }
        }
        ChatEvent::ActiveChatChanged { partner: None } => "-- chat closed --".into(),
        ChatEvent::ActiveChatChanged { .. } | ChatEvent::UsersChanged { .. } => return None,
        ChatEvent::Navigate { route } => format!("=> {}", route.path()),
        ChatEvent::Notice { level, text } => {
            let tag = match level {
                NoticeLevel::Success => "ok",
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            format!("({}) {}", tag, text)
        }
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use parlor_types::models::Sender;

    use super::*;

    #[test]
    fn history_is_starred() {
        let users = [ChatPartner::new("Alice"), ChatPartner::new("Bob")];
        let list = user_list(&users, &["Bob".to_string()]);
        assert_eq!(list, "  - Alice\n *- Bob");
    }

    #[test]
    fn partner_name_replaces_gemini() {
        let msg = Message::text(Sender::Gemini, "yo", 0);
        assert!(message_line("Alice", &msg).ends_with("Alice: yo"));
    }

    #[test]
    fn images_are_summarised() {
        let msg = Message {
            content: "data:image/png;base64,AAAA".into(),
            from: Sender::Me,
            timestamp: 0,
            kind: MessageKind::Image,
        };
        assert!(message_line("Bob", &msg).contains("[image, 26 bytes encoded]"));
    }

    #[test]
    fn notices_are_tagged() {
        let line = event_line(&ChatEvent::notice(NoticeLevel::Error, "User already exists"));
        assert_eq!(line.as_deref(), Some("(error) User already exists"));
        assert!(event_line(&ChatEvent::UsersChanged { visible: vec![] }).is_none());
    }
}
