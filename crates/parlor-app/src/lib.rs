//! Parlor application layer.
//!
//! Everything the chat client does, minus the pixels:
//! - the message pipeline with its simulated, throttled replies
//! - scroll-driven pagination over a capped history
//! - the partner registry with debounced search
//! - the mock OTP login and the session gate in front of the dashboard
//!
//! State changes are published as [`parlor_types::events::ChatEvent`]s on a
//! [`Dispatcher`] so any front end can render them.

pub mod app;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod login;
pub mod pipeline;
pub mod registry;
pub mod search;
pub mod session;
pub mod view;
pub mod window;

pub use app::App;
pub use config::{ChatLimits, ChatTimings, Config, StorageLocation};
pub use dashboard::Dashboard;
pub use dispatcher::Dispatcher;
pub use error::{ChatError, Error, LoginError, RegistryError, Result};
pub use session::SessionGate;
pub use window::{ChatSnapshot, ChatWindow};
