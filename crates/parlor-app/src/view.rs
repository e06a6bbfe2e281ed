use parlor_types::api::Viewport;

/// Scrolling closer than this to the top asks for older messages.
pub const NEAR_TOP: u32 = 50;
/// Closer than this to the bottom counts as "following" the conversation.
pub const NEAR_BOTTOM: u32 = 100;

/// Scroll-tracking state of the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatView {
    at_bottom: bool,
}

impl Default for ChatView {
    fn default() -> Self {
        Self { at_bottom: true }
    }
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll and report whether older messages should be loaded.
    pub fn handle_scroll(&mut self, viewport: Viewport, has_more: bool, loading_older: bool) -> bool {
        let below = viewport
            .scroll_height
            .saturating_sub(viewport.scroll_top)
            .saturating_sub(viewport.client_height);
        self.at_bottom = below < NEAR_BOTTOM;

        viewport.scroll_top < NEAR_TOP && has_more && !loading_older
    }

    /// New messages should pull the list down only while the user is following it.
    pub fn follows_tail(&self) -> bool {
        self.at_bottom
    }
}
