use std::sync::Arc;

use crate::InstallType;

/// Result type for fallible operations of the Segment consumer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or starting the Segment consumer.
///
/// Tracking calls never return errors. Delivery failures are reported through the `log` crate
/// instead.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The consumer is not enabled for the current install type.
    #[error("consumer is not enabled for install type {0}")]
    InvalidInstallType(InstallType),

    /// No write key was provided.
    #[error("write_key is missing")]
    MissingWriteKey,

    /// An install type name could not be parsed.
    #[error("unknown install type: {0:?}")]
    UnknownInstallType(String),

    /// A boolean configuration flag had an unexpected value.
    #[error("invalid value {value:?} for {name}")]
    InvalidFlag {
        /// Name of the configuration flag.
        name: String,
        /// The value that failed to parse.
        value: String,
    },

    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),

    /// Indicates that the delivery thread panicked. This should normally never happen.
    #[error("delivery thread panicked")]
    DeliveryThreadPanicked,
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}
