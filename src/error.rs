//! Error types for the seek lock

use thiserror::Error;

/// Result type alias for seek lock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locking a video
///
/// None of these is fatal to the reconciliation loop: configuration and
/// resolution failures surface as a single developer alert. Access denials
/// are [`crate::platform::SecurityError`]s and are absorbed by
/// [`crate::access::attempt`] before they reach the core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The host supplied an empty target identifier
    #[error("video lock: target id is empty:\n(empty)")]
    ConfigurationMissing,

    /// No video matched the target identifier within the grace window
    #[error("video lock: no video found for target id:\n{0}")]
    ResolutionFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Misuse of the in-memory page host
    #[error("Page error: {0}")]
    PageError(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_messages_name_the_target() {
        let msg = Error::ResolutionFailed("vid1".into()).to_string();
        assert!(msg.ends_with("\nvid1"));
        assert!(Error::ConfigurationMissing.to_string().contains("(empty)"));
    }
}
