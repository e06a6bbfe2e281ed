use serde::{Deserialize, Serialize};

/// Who wrote a message. The simulated partner is always `gemini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Gemini,
}

impl Sender {
    /// Alternating sender used by synthetic history: even slots are ours.
    pub fn alternating(index: usize) -> Self {
        if index % 2 == 0 { Self::Me } else { Self::Gemini }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    /// `content` holds a base64 `data:` URI.
    Image,
}

/// A single chat message as persisted under `chat_messages_<user>`.
///
/// Conversations are plain JSON arrays of these, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub from: Sender,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl Message {
    pub fn text(from: Sender, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            content: content.into(),
            from,
            timestamp,
            kind: MessageKind::Text,
        }
    }

    pub fn is_mine(&self) -> bool {
        self.from == Sender::Me
    }
}

/// A chat partner listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPartner {
    pub name: String,
}

impl ChatPartner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
