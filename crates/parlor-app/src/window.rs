use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parlor_db::{MessageStore, Record};
use parlor_types::api::{OutgoingMessage, Viewport};
use parlor_types::events::{ChatEvent, NoticeLevel};
use parlor_types::models::{Message, MessageKind};

use crate::config::{ChatTimings, Config};
use crate::dispatcher::Dispatcher;
use crate::error::ChatError;
use crate::pipeline::{Conversation, PendingReply, Phase, seed_messages};
use crate::view::ChatView;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An open chat with one partner.
///
/// Owns the timers behind the pipeline: the simulated reply and the
/// older-page fetch. Cloning shares the window; [`ChatWindow::close`] cancels
/// whatever is still pending on every clone.
#[derive(Clone)]
pub struct ChatWindow {
    inner: Arc<WindowInner>,
}

impl std::fmt::Debug for ChatWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWindow")
            .field("partner", &self.inner.partner)
            .finish_non_exhaustive()
    }
}

struct WindowInner {
    partner: String,
    state: Mutex<WindowState>,
    store: MessageStore,
    timings: ChatTimings,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
}

struct WindowState {
    conversation: Conversation,
    view: ChatView,
}

/// Everything a renderer needs to draw the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub partner: String,
    pub visible: Vec<Message>,
    pub total: usize,
    pub has_more: bool,
    pub typing: bool,
    pub input_disabled: bool,
    pub phase: Phase,
}

impl ChatWindow {
    /// Load (or seed) the partner's conversation after the load delay.
    pub async fn open(
        partner: &str,
        store: MessageStore,
        config: &Config,
        dispatcher: Dispatcher,
    ) -> Self {
        sleep(config.timings.load_delay).await;

        // only a confirmed-missing record is seeded; an unreadable one opens
        // empty and stays on disk until the next save
        let messages = match store.fetch(partner) {
            Record::Loaded(messages) => messages,
            Record::Unreadable => Vec::new(),
            Record::Absent => {
                let seed = seed_messages(config.limits.seed_count, now_ms());
                if let Err(e) = store.save(partner, &seed) {
                    warn!("Failed to persist seed for {}: {:#}", partner, e);
                }
                info!("Seeded conversation with {} ({} messages)", partner, seed.len());
                seed
            }
        };

        let conversation = Conversation::new(
            partner,
            messages,
            config.limits,
            config.timings.reply_throttle,
        );

        dispatcher.broadcast(ChatEvent::ConversationLoaded {
            partner: partner.to_string(),
            total: conversation.len(),
            visible: conversation.visible_count(),
        });

        Self {
            inner: Arc::new(WindowInner {
                partner: partner.to_string(),
                state: Mutex::new(WindowState {
                    conversation,
                    view: ChatView::new(),
                }),
                store,
                timings: config.timings,
                dispatcher,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn partner(&self) -> &str {
        &self.inner.partner
    }

    /// Append a message, persist it, and schedule a reply if the throttle allows.
    pub fn send(&self, outgoing: OutgoingMessage) -> Result<Message, ChatError> {
        if self.is_closed() {
            return Err(ChatError::NoActiveChat);
        }

        let outcome = {
            let mut state = self.lock();
            let outcome = state.conversation.send(outgoing, Instant::now(), now_ms())?;
            self.persist(&state);
            outcome
        };

        let partner = self.inner.partner.clone();
        self.inner.dispatcher.broadcast(ChatEvent::MessageAppended {
            partner: partner.clone(),
            message: outcome.message.clone(),
        });
        let notice = match outcome.message.kind {
            MessageKind::Text => "Message sent!",
            MessageKind::Image => "Image sent!",
        };
        self.inner.dispatcher.notify(NoticeLevel::Success, notice);

        if let Some(reply) = outcome.reply {
            self.inner
                .dispatcher
                .broadcast(ChatEvent::TypingStarted { partner });
            self.schedule_reply(reply);
        }

        Ok(outcome.message)
    }

    /// Feed a scroll event from the message list. Loads an older page when the
    /// list is near the top; returns how many messages were prepended.
    pub async fn handle_scroll(&self, viewport: Viewport) -> usize {
        let wants_older = {
            let mut state = self.lock();
            let has_more = state.conversation.has_more();
            let loading = state.conversation.is_loading_older();
            state.view.handle_scroll(viewport, has_more, loading)
        };

        if wants_older { self.load_older().await } else { 0 }
    }

    /// Fetch one page of older messages after the page delay.
    pub async fn load_older(&self) -> usize {
        let claimed = self.lock().conversation.begin_load_older();
        if !claimed {
            return 0;
        }

        let partner = self.inner.partner.clone();
        self.inner
            .dispatcher
            .broadcast(ChatEvent::OlderMessagesLoading {
                partner: partner.clone(),
            });

        tokio::select! {
            _ = self.inner.cancel.cancelled() => {
                debug!("Older-page load for {} cancelled", partner);
                return 0;
            }
            _ = sleep(self.inner.timings.page_delay) => {}
        }

        let (added, total, has_more) = {
            let mut state = self.lock();
            let added = state.conversation.finish_load_older(now_ms());
            if added > 0 {
                self.persist(&state);
            }
            (added, state.conversation.len(), state.conversation.has_more())
        };

        debug!("Loaded {} older messages for {}", added, partner);
        self.inner.dispatcher.broadcast(ChatEvent::OlderMessagesLoaded {
            partner,
            added,
            total,
            has_more,
        });
        added
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.lock();
        let conv = &state.conversation;
        ChatSnapshot {
            partner: self.inner.partner.clone(),
            visible: conv.visible_messages().to_vec(),
            total: conv.len(),
            has_more: conv.has_more(),
            typing: conv.is_typing(),
            input_disabled: conv.input_disabled(),
            phase: conv.phase(),
        }
    }

    /// Whether the renderer should keep the list pinned to the newest message.
    pub fn follows_tail(&self) -> bool {
        self.lock().view.follows_tail()
    }

    /// Stop all pending timers. A cancelled reply is never delivered.
    pub fn close(&self) {
        if !self.inner.cancel.is_cancelled() {
            debug!("Closing chat with {}", self.inner.partner);
            self.inner.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn schedule_reply(&self, reply: PendingReply) {
        let window = self.clone();
        let delay = self.inner.timings.reply_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = window.inner.cancel.cancelled() => {
                    debug!("Pending reply for {} dropped", window.inner.partner);
                }
                _ = sleep(delay) => window.deliver_reply(reply),
            }
        });
    }

    fn deliver_reply(&self, reply: PendingReply) {
        let message = {
            let mut state = self.lock();
            let message = state
                .conversation
                .deliver_reply(reply, Instant::now(), now_ms());
            self.persist(&state);
            message
        };

        self.inner.dispatcher.broadcast(ChatEvent::ReplyDelivered {
            partner: self.inner.partner.clone(),
            message,
        });
    }

    /// Write the conversation through. Called with the state guard held so
    /// saves land in the same order as the changes they capture.
    fn persist(&self, state: &WindowState) {
        let messages = state.conversation.messages();
        if let Err(e) = self.inner.store.save(&self.inner.partner, messages) {
            warn!("Failed to persist chat with {}: {:#}", self.inner.partner, e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
