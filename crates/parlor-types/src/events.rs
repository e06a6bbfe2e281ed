use serde::{Deserialize, Serialize};

use crate::api::Route;
use crate::models::Message;

/// Events published by the app for the front end to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// A conversation finished loading and is ready to render
    ConversationLoaded {
        partner: String,
        total: usize,
        visible: usize,
    },

    /// An outgoing message was appended optimistically
    MessageAppended { partner: String, message: Message },

    /// A simulated reply has been scheduled
    TypingStarted { partner: String },

    /// The simulated reply arrived
    ReplyDelivered { partner: String, message: Message },

    /// Scrolled to the top, older messages are being fetched
    OlderMessagesLoading { partner: String },

    /// Older messages were prepended
    OlderMessagesLoaded {
        partner: String,
        added: usize,
        total: usize,
        has_more: bool,
    },

    /// The active chat changed (`None` when closed)
    ActiveChatChanged { partner: Option<String> },

    /// The filtered user list changed
    UsersChanged { visible: Vec<String> },

    /// Navigation request after the session gate has been applied
    Navigate { route: Route },

    /// Transient notification (what a toast would show)
    Notice { level: NoticeLevel, text: String },
}

impl ChatEvent {
    pub fn notice(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self::Notice {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}
