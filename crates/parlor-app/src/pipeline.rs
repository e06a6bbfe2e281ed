//! The per-conversation message pipeline.
//!
//! [`Conversation`] is the synchronous state machine behind a chat window:
//! optimistic appends, the reply throttle, and the visible window over the
//! stored history. It never sleeps and never touches storage. Callers pass in
//! the current time and [`crate::window::ChatWindow`] drives the timers.
//!
//! ```text
//! send:       Idle -> Sending -> Idle | AwaitingReply
//! reply:      AwaitingReply -> Idle
//! pagination: Idle -> LoadingOlder -> Idle
//! ```

use tokio::time::{Duration, Instant};
use tracing::debug;

use parlor_types::api::OutgoingMessage;
use parlor_types::models::{Message, MessageKind, Sender};

use crate::config::ChatLimits;
use crate::error::ChatError;

const IMAGE_REPLY: &str = "Nice image! 📷";
const SEED_SPACING_MS: i64 = 60_000;
const OLDER_SPACING_MS: i64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    AwaitingReply,
    LoadingOlder,
}

/// A reply that has been scheduled but not delivered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub content: String,
}

impl PendingReply {
    fn for_message(message: &Message) -> Self {
        let content = match message.kind {
            MessageKind::Image => IMAGE_REPLY.to_string(),
            MessageKind::Text => format!("Gemini echo: \"{}\"", message.content),
        };
        Self { content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub message: Message,
    /// `None` when the throttle window swallowed the reply.
    pub reply: Option<PendingReply>,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    partner: String,
    messages: Vec<Message>,
    visible: usize,
    limits: ChatLimits,
    reply_throttle: Duration,
    phase: Phase,
    loading_older: bool,
    last_reply_at: Option<Instant>,
}

impl Conversation {
    pub fn new(
        partner: impl Into<String>,
        messages: Vec<Message>,
        limits: ChatLimits,
        reply_throttle: Duration,
    ) -> Self {
        let visible = limits.page_size.min(messages.len());
        Self {
            partner: partner.into(),
            messages,
            visible,
            limits,
            reply_throttle,
            phase: Phase::Idle,
            loading_older: false,
            last_reply_at: None,
        }
    }

    pub fn partner(&self) -> &str {
        &self.partner
    }

    /// The full history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// The rendered suffix of the history.
    pub fn visible_messages(&self) -> &[Message] {
        &self.messages[self.messages.len() - self.visible..]
    }

    /// Whether another page of older messages may still be loaded.
    pub fn has_more(&self) -> bool {
        self.messages.len() < self.limits.max_messages
    }

    pub fn phase(&self) -> Phase {
        match self.phase {
            Phase::Idle if self.loading_older => Phase::LoadingOlder,
            phase => phase,
        }
    }

    pub fn is_loading_older(&self) -> bool {
        self.loading_older
    }

    pub fn is_typing(&self) -> bool {
        self.phase == Phase::AwaitingReply
    }

    pub fn input_disabled(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Append an outgoing message and decide whether it earns a reply.
    pub fn send(
        &mut self,
        outgoing: OutgoingMessage,
        now: Instant,
        timestamp: i64,
    ) -> Result<SendOutcome, ChatError> {
        if self.phase != Phase::Idle {
            return Err(ChatError::InputDisabled);
        }

        let content = match outgoing.kind {
            MessageKind::Text => outgoing.content.trim().to_string(),
            MessageKind::Image => outgoing.content,
        };
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.phase = Phase::Sending;
        let message = Message {
            content,
            from: Sender::Me,
            timestamp,
            kind: outgoing.kind,
        };
        self.push(message.clone());

        let reply = if self.throttle_elapsed(now) {
            self.phase = Phase::AwaitingReply;
            Some(PendingReply::for_message(&message))
        } else {
            debug!("Reply to {} throttled", self.partner);
            self.phase = Phase::Idle;
            None
        };

        Ok(SendOutcome { message, reply })
    }

    /// Append a scheduled reply to the history as it is now.
    pub fn deliver_reply(&mut self, reply: PendingReply, now: Instant, timestamp: i64) -> Message {
        let message = Message::text(Sender::Gemini, reply.content, timestamp);
        self.push(message.clone());
        self.last_reply_at = Some(now);
        self.phase = Phase::Idle;
        message
    }

    /// Claim the pagination slot. Returns false if a load is already running
    /// or the cap has been reached.
    pub fn begin_load_older(&mut self) -> bool {
        if self.loading_older || !self.has_more() {
            return false;
        }
        self.loading_older = true;
        true
    }

    /// Prepend a page of synthetic older messages and grow the visible window
    /// by the same amount. Returns how many were added.
    pub fn finish_load_older(&mut self, now_ms: i64) -> usize {
        self.loading_older = false;

        let remaining = self.limits.max_messages.saturating_sub(self.messages.len());
        let count = self.limits.page_size.min(remaining);
        if count == 0 {
            return 0;
        }

        let anchor = self.messages.first().map_or(now_ms, |m| m.timestamp);
        let page = older_page(count, self.messages.len(), anchor);
        self.messages.splice(0..0, page);
        self.visible += count;
        count
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.visible += 1;
    }

    fn throttle_elapsed(&self, now: Instant) -> bool {
        self.last_reply_at
            .is_none_or(|last| now.saturating_duration_since(last) > self.reply_throttle)
    }
}

/// Starter history for a partner that has never been opened.
pub fn seed_messages(count: usize, now_ms: i64) -> Vec<Message> {
    (0..count)
        .map(|i| {
            Message::text(
                Sender::alternating(i),
                format!("Initial dummy message #{}", i + 1),
                now_ms - (count - i) as i64 * SEED_SPACING_MS,
            )
        })
        .collect()
}

/// `count` messages that all predate `anchor`, oldest first.
fn older_page(count: usize, current_len: usize, anchor: i64) -> Vec<Message> {
    (0..count)
        .map(|j| {
            let back = count - j;
            let number = current_len + back;
            Message::text(
                Sender::alternating(number - 1),
                format!("Old dummy message #{}", number),
                anchor - back as i64 * OLDER_SPACING_MS,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const THROTTLE: Duration = Duration::from_millis(4000);
    const REPLY_DELAY: Duration = Duration::from_millis(2000);

    fn conversation(len: usize) -> Conversation {
        Conversation::new("Alice", seed_messages(len, 1_000_000_000), ChatLimits::default(), THROTTLE)
    }

    fn is_chronological(messages: &[Message]) -> bool {
        messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }

    #[test]
    fn opens_with_one_page_visible() {
        let conv = conversation(30);
        assert_eq!(conv.visible_count(), 20);
        assert_eq!(conv.visible_messages(), &conv.messages()[10..]);
        assert!(conv.has_more());

        let short = conversation(5);
        assert_eq!(short.visible_count(), 5);
    }

    #[test]
    fn empty_text_is_rejected_without_side_effects() {
        let mut conv = conversation(3);
        let now = Instant::now();

        for blank in ["", "   ", "\n\t"] {
            let err = conv.send(OutgoingMessage::text(blank), now, 1).unwrap_err();
            assert_eq!(err, ChatError::EmptyMessage);
        }
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.phase(), Phase::Idle);
        assert!(!conv.is_typing());
    }

    #[test]
    fn empty_image_is_rejected() {
        let mut conv = conversation(0);
        let err = conv
            .send(OutgoingMessage::image("image/png", &[]), Instant::now(), 1)
            .unwrap_err();
        assert_eq!(err, ChatError::EmptyMessage);
        assert!(conv.is_empty());
    }

    #[test]
    fn send_appends_trimmed_text_and_schedules_echo() {
        let mut conv = conversation(0);
        let outcome = conv.send(OutgoingMessage::text("  hello  "), Instant::now(), 42).unwrap();

        assert_eq!(outcome.message.content, "hello");
        assert_eq!(outcome.message.from, Sender::Me);
        assert_eq!(outcome.message.timestamp, 42);
        assert_eq!(
            outcome.reply,
            Some(PendingReply {
                content: "Gemini echo: \"hello\"".into()
            })
        );
        assert_eq!(conv.visible_messages(), &[outcome.message]);
        assert_eq!(conv.phase(), Phase::AwaitingReply);
        assert!(conv.input_disabled());
    }

    #[test]
    fn image_reply_is_fixed_text() {
        let mut conv = conversation(0);
        let outcome = conv
            .send(OutgoingMessage::image("image/gif", b"GIF89a"), Instant::now(), 1)
            .unwrap();
        assert_eq!(outcome.reply.unwrap().content, IMAGE_REPLY);
        assert_eq!(outcome.message.kind, MessageKind::Image);
    }

    #[test]
    fn input_disabled_while_reply_pending() {
        let mut conv = conversation(0);
        let now = Instant::now();
        conv.send(OutgoingMessage::text("one"), now, 1).unwrap();

        let err = conv.send(OutgoingMessage::text("two"), now, 2).unwrap_err();
        assert_eq!(err, ChatError::InputDisabled);
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn sends_spaced_beyond_throttle_each_get_a_reply() {
        let mut conv = conversation(0);
        let t0 = Instant::now();
        let mut at = t0;
        let mut replies = 0;

        for i in 0..4 {
            let outcome = conv.send(OutgoingMessage::text(format!("m{}", i)), at, 0).unwrap();
            let reply = outcome.reply.expect("reply scheduled");
            conv.deliver_reply(reply, at + REPLY_DELAY, 0);
            replies += 1;
            // next send lands 4001ms after this reply
            at = at + REPLY_DELAY + THROTTLE + Duration::from_millis(1);
        }

        assert_eq!(replies, 4);
        assert_eq!(conv.len(), 8);
        assert!(conv.messages().iter().skip(1).step_by(2).all(|m| m.from == Sender::Gemini));
    }

    #[test]
    fn sends_inside_throttle_window_are_not_answered() {
        let mut conv = conversation(0);
        let t0 = Instant::now();

        let first = conv.send(OutgoingMessage::text("a"), t0, 0).unwrap();
        conv.deliver_reply(first.reply.unwrap(), t0 + REPLY_DELAY, 0);

        let replied_at = t0 + REPLY_DELAY;
        for offset in [1_u64, 1000, 3999, 4000] {
            let outcome = conv
                .send(OutgoingMessage::text("b"), replied_at + Duration::from_millis(offset), 0)
                .unwrap();
            assert!(outcome.reply.is_none(), "offset {}ms should be throttled", offset);
            assert_eq!(conv.phase(), Phase::Idle);
        }

        let late = conv
            .send(OutgoingMessage::text("c"), replied_at + Duration::from_millis(4001), 0)
            .unwrap();
        assert!(late.reply.is_some());
    }

    #[test]
    fn reply_lands_after_messages_sent_meanwhile() {
        let mut conv = conversation(0);
        let t0 = Instant::now();
        let outcome = conv.send(OutgoingMessage::text("a"), t0, 1).unwrap();
        let reply = conv.deliver_reply(outcome.reply.unwrap(), t0 + REPLY_DELAY, 2);

        assert_eq!(conv.messages().last(), Some(&reply));
        assert_eq!(conv.visible_count(), 2);
        assert_eq!(conv.phase(), Phase::Idle);
    }

    #[test]
    fn load_older_prepends_a_page() {
        let mut conv = conversation(30);
        let before: Vec<Message> = conv.messages().to_vec();

        assert!(conv.begin_load_older());
        assert_eq!(conv.phase(), Phase::LoadingOlder);
        let added = conv.finish_load_older(2_000_000_000);

        assert_eq!(added, 20);
        assert_eq!(conv.len(), 50);
        assert_eq!(conv.visible_count(), 40);
        assert_eq!(&conv.messages()[20..], &before[..]);
        assert!(is_chronological(conv.messages()));
        assert_eq!(conv.messages()[0].content, "Old dummy message #50");
        assert_eq!(conv.messages()[19].content, "Old dummy message #31");
        assert_eq!(conv.phase(), Phase::Idle);
    }

    #[test]
    fn concurrent_load_is_ignored() {
        let mut conv = conversation(30);
        assert!(conv.begin_load_older());
        assert!(!conv.begin_load_older());
        conv.finish_load_older(0);
        assert!(conv.begin_load_older());
    }

    #[test]
    fn pagination_stops_at_cap() {
        let mut conv = conversation(30);
        let mut added = Vec::new();

        while conv.begin_load_older() {
            let before_len = conv.len();
            let before_visible = conv.visible_count();
            let n = conv.finish_load_older(0);
            assert_eq!(n, 20.min(100 - before_len));
            assert_eq!(conv.visible_count(), before_visible + n);
            assert!(conv.visible_count() <= conv.len());
            added.push(n);
        }

        assert_eq!(added, vec![20, 20, 20, 10]);
        assert_eq!(conv.len(), 100);
        assert!(!conv.has_more());
        assert!(is_chronological(conv.messages()));
    }

    #[test]
    fn load_finishing_past_cap_adds_nothing() {
        let mut conv = conversation(95);
        assert!(conv.begin_load_older());
        // sends land while the page is loading
        let t0 = Instant::now();
        for i in 0..6 {
            let _ = conv.send(OutgoingMessage::text("x"), t0, i);
            conv.phase = Phase::Idle;
        }
        assert_eq!(conv.finish_load_older(0), 0);
        assert_eq!(conv.len(), 101);
        assert!(!conv.is_loading_older());
    }

    #[test]
    fn empty_conversation_pages_from_now() {
        let mut conv = conversation(0);
        assert!(conv.begin_load_older());
        assert_eq!(conv.finish_load_older(10_000_000), 20);
        assert!(conv.messages().iter().all(|m| m.timestamp < 10_000_000));
        assert_eq!(conv.visible_count(), 20);
    }

    #[test]
    fn seed_is_chronological_and_alternating() {
        let seed = seed_messages(30, 5_000_000);
        assert_eq!(seed.len(), 30);
        assert!(is_chronological(&seed));
        assert_eq!(seed[0].content, "Initial dummy message #1");
        assert_eq!(seed[0].from, Sender::Me);
        assert_eq!(seed[1].from, Sender::Gemini);
        assert_eq!(seed[29].timestamp, 5_000_000 - 60_000);
    }
}
