use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use parlor_db::MessageStore;
use parlor_types::api::{OutgoingMessage, Route, Viewport};
use parlor_types::events::{ChatEvent, NoticeLevel};
use parlor_types::models::{ChatPartner, Message};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{ChatError, RegistryError, Result};
use crate::registry::{UserRegistry, filter};
use crate::search::DebouncedSearch;
use crate::session::SessionGate;
use crate::window::ChatWindow;

type SharedRegistry = Arc<Mutex<UserRegistry>>;

/// The signed-in screen: partner list, search box and at most one open chat.
pub struct Dashboard {
    registry: SharedRegistry,
    active: Option<ChatWindow>,
    search: DebouncedSearch,
    publisher: JoinHandle<()>,
    store: MessageStore,
    config: Config,
    dispatcher: Dispatcher,
}

impl Dashboard {
    /// Must be called inside a tokio runtime: the search debouncer and the
    /// list publisher run as tasks.
    pub fn mount(store: MessageStore, config: Config, dispatcher: Dispatcher) -> Self {
        let registry: SharedRegistry = Arc::new(Mutex::new(UserRegistry::seeded()));
        let search = DebouncedSearch::spawn(config.timings.search_debounce);

        // re-filter the list every time the search term settles
        let mut settled = search.subscribe();
        let publisher = tokio::spawn({
            let registry = registry.clone();
            let dispatcher = dispatcher.clone();
            async move {
                while settled.changed().await.is_ok() {
                    let term = settled.borrow_and_update().clone();
                    publish(&registry, &term, &dispatcher);
                }
            }
        });

        Self {
            registry,
            active: None,
            search,
            publisher,
            store,
            config,
            dispatcher,
        }
    }

    /// A copy of the current partner list.
    pub fn registry(&self) -> UserRegistry {
        lock(&self.registry).clone()
    }

    pub fn active_chat(&self) -> Option<&ChatWindow> {
        self.active.as_ref()
    }

    pub fn create_user(&mut self, name: &str) -> Result<ChatPartner> {
        let created = self
            .dispatcher
            .report(lock(&self.registry).create(name).cloned())?;

        info!("Created user {}", created.name);
        self.dispatcher
            .notify(NoticeLevel::Success, format!("New user {} created", created.name));
        self.publish_users();
        Ok(created)
    }

    /// Remove a partner. Their stored conversation is kept unless
    /// `purge_on_delete` is configured. A failed purge leaves the partner listed.
    pub fn delete_user(&mut self, name: &str) -> Result<()> {
        if !lock(&self.registry).contains(name) {
            let err = RegistryError::NotFound(name.to_string());
            self.dispatcher.notify(NoticeLevel::Error, err.to_string());
            return Err(err.into());
        }

        if self.active.as_ref().is_some_and(|w| w.partner() == name) {
            self.close_chat();
        }
        if self.config.purge_on_delete {
            self.dispatcher.report(self.store.remove(name))?;
            info!("Purged conversation with {}", name);
        }

        let removed = lock(&self.registry).delete(name)?;
        self.dispatcher
            .notify(NoticeLevel::Error, format!("User {} deleted", removed.name));
        self.publish_users();
        Ok(())
    }

    /// Open a chat with a listed partner, closing whatever was open.
    pub async fn open_chat(&mut self, name: &str) -> Result<ChatWindow> {
        if !lock(&self.registry).contains(name) {
            let err = RegistryError::NotFound(name.to_string());
            self.dispatcher.notify(NoticeLevel::Error, err.to_string());
            return Err(err.into());
        }

        self.close_chat();
        let window = ChatWindow::open(
            name,
            self.store.clone(),
            &self.config,
            self.dispatcher.clone(),
        )
        .await;

        self.active = Some(window.clone());
        self.dispatcher.broadcast(ChatEvent::ActiveChatChanged {
            partner: Some(name.to_string()),
        });
        Ok(window)
    }

    pub fn close_chat(&mut self) {
        if let Some(window) = self.active.take() {
            window.close();
            self.dispatcher
                .broadcast(ChatEvent::ActiveChatChanged { partner: None });
        }
    }

    pub fn send(&self, outgoing: OutgoingMessage) -> Result<Message> {
        let result = match &self.active {
            Some(window) => window.send(outgoing),
            None => Err(ChatError::NoActiveChat),
        };
        Ok(self.dispatcher.report(result)?)
    }

    /// Forward a scroll of the message list to the open chat.
    pub async fn scroll(&self, viewport: Viewport) -> Result<usize> {
        let window = self
            .dispatcher
            .report(self.active.as_ref().ok_or(ChatError::NoActiveChat))?;
        Ok(window.handle_scroll(viewport).await)
    }

    /// Feed raw search input; the list filters once typing settles.
    pub fn set_search(&self, term: impl Into<String>) {
        self.search.set_term(term);
    }

    /// Settled search terms as they change.
    pub fn search_updates(&self) -> watch::Receiver<String> {
        self.search.subscribe()
    }

    /// The partner list filtered by the settled search term.
    pub fn visible_users(&self) -> Vec<ChatPartner> {
        visible(&self.registry, &self.search.term())
    }

    /// Partners with a stored conversation, listed or not.
    pub fn partners_with_history(&self) -> Result<Vec<String>> {
        Ok(self.store.partners()?)
    }

    pub fn publish_users(&self) {
        publish(&self.registry, &self.search.term(), &self.dispatcher);
    }

    /// Clear the session flag and tear the screen down.
    pub fn logout(&mut self, session: &SessionGate) -> Result<Route> {
        self.close_chat();
        if let Err(e) = session.sign_out() {
            warn!("Failed to clear session: {}", e);
            return Err(e);
        }
        self.dispatcher
            .notify(NoticeLevel::Info, "Logged out successfully");
        Ok(Route::Landing)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.publisher.abort();
        if let Some(window) = self.active.take() {
            window.close();
        }
    }
}

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, UserRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn visible(registry: &SharedRegistry, term: &str) -> Vec<ChatPartner> {
    filter(lock(registry).users(), term)
        .into_iter()
        .cloned()
        .collect()
}

fn publish(registry: &SharedRegistry, term: &str, dispatcher: &Dispatcher) {
    let visible = visible(registry, term).into_iter().map(|u| u.name).collect();
    dispatcher.broadcast(ChatEvent::UsersChanged { visible });
}
