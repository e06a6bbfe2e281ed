//! Shared data types for Parlor: persisted messages, front-end inputs and
//! the events the app publishes to whatever is rendering it.

pub mod api;
pub mod events;
pub mod models;
