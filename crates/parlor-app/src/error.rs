//! Error types for the app layer.
//!
//! Every variant here is locally recoverable: the display text is what the
//! user would see in a toast, and the user can just try again.

use thiserror::Error;

/// Result type alias using the app's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Wait for the reply before sending again")]
    InputDisabled,

    #[error("No chat is open")]
    NoActiveChat,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Username cannot be empty")]
    EmptyName,

    #[error("User already exists")]
    Duplicate(String),

    #[error("No user named {0}")]
    NotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Select a country code")]
    MissingCountryCode,

    #[error("Too short")]
    PhoneTooShort,

    #[error("Too long")]
    PhoneTooLong,

    #[error("Only numbers allowed")]
    NotNumeric,

    #[error("OTP must be 6 digits")]
    OtpLength,

    #[error("Request a code first")]
    NoCodeIssued,

    #[error("Invalid OTP. Try again.")]
    OtpMismatch,
}
