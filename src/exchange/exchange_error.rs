use std::{path::PathBuf, time::Duration};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way an exchange operation can fail.
///
/// "No message available right now" is not part of this enum, `receive_now` reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// A session or channel could not be established.
    #[error("error during the creation of the connection")]
    Connection(#[source] BoxError),

    /// The settings file could not be read.
    #[error("error while reading the settings file '{}'", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error while sending the message")]
    Forwarding(#[source] BoxError),

    #[error("error while receiving the message")]
    Reception(#[source] BoxError),

    /// The bounded wait ran out. Carries the wait actually spent.
    #[error("no message has been received in the last {} milliseconds", .0.as_millis())]
    Timeout(Duration),

    #[error("wait for message was cancelled")]
    Cancelled,

    #[error("the exchanger is closed")]
    Closed,
}

impl ExchangeError {
    pub fn connection(error: impl Into<BoxError>) -> Self {
        ExchangeError::Connection(error.into())
    }

    pub fn forwarding(error: impl Into<BoxError>) -> Self {
        ExchangeError::Forwarding(error.into())
    }

    pub fn reception(error: impl Into<BoxError>) -> Self {
        ExchangeError::Reception(error.into())
    }
}
