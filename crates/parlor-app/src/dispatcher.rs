use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;

use parlor_types::events::{ChatEvent, NoticeLevel};

/// Fans app events out to every renderer that subscribed.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<ChatEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to app events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Publish an event. Dropped silently when nobody is listening.
    pub fn broadcast(&self, event: ChatEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    pub fn notify(&self, level: NoticeLevel, text: impl Into<String>) {
        self.broadcast(ChatEvent::notice(level, text));
    }

    /// Pass a result through, raising an error notice if it failed.
    pub fn report<T, E: fmt::Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.notify(NoticeLevel::Error, e.to_string());
        }
        result
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let dispatcher = Dispatcher::new();
        let mut rx = dispatcher.subscribe();

        dispatcher.notify(NoticeLevel::Success, "first");
        dispatcher.broadcast(ChatEvent::ActiveChatChanged { partner: None });

        assert_eq!(
            rx.recv().await.unwrap(),
            ChatEvent::notice(NoticeLevel::Success, "first")
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ChatEvent::ActiveChatChanged { partner: None }
        );
    }

    #[test]
    fn report_raises_error_notice() {
        let dispatcher = Dispatcher::new();
        let mut rx = dispatcher.subscribe();

        let ok: Result<u8, String> = dispatcher.report(Ok(1));
        assert_eq!(ok, Ok(1));
        let err: Result<u8, String> = dispatcher.report(Err("User already exists".into()));
        assert!(err.is_err());

        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::notice(NoticeLevel::Error, "User already exists")
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_without_subscribers_is_fine() {
        Dispatcher::new().notify(NoticeLevel::Info, "nobody home");
    }
}
