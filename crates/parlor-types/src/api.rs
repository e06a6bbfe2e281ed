use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};

use crate::models::MessageKind;

// -- Routes --

/// The two screens of the app. `Dashboard` sits behind the session gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Landing,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Dashboard => "/dashboard",
        }
    }
}

// -- Login --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhoneSubmission {
    pub country_code: String,
    pub phone_number: String,
}

impl PhoneSubmission {
    pub fn new(country_code: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            phone_number: phone_number.into(),
        }
    }
}

// -- Messages --

/// What the input bar hands to the chat window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub kind: MessageKind,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Text,
        }
    }

    /// Wrap raw file bytes as a `data:<mime>;base64,...` URI.
    pub fn image(mime: &str, bytes: &[u8]) -> Self {
        let content = if bytes.is_empty() {
            String::new()
        } else {
            format!("data:{};base64,{}", mime, B64.encode(bytes))
        };
        Self {
            content,
            kind: MessageKind::Image,
        }
    }
}

// -- Scrolling --

/// Scroll geometry of the message list, in whatever unit the front end uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
}

impl Viewport {
    pub fn at_top() -> Self {
        Self::default()
    }
}
