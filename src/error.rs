use config::ConfigError;
use nostr_sdk::client::Error as NostrSdkError;
use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The event source could not complete a query. Never cached.
    #[snafu(display("Transport error: {message}"))]
    Transport {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid event: {message}"))]
    InvalidEvent {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Configuration error: {message}"))]
    Config {
        message: String,
        backtrace: Backtrace,
    },
}

impl Error {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn invalid_event<S: Into<String>>(message: S) -> Self {
        Error::InvalidEvent {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

impl From<NostrSdkError> for Error {
    fn from(error: NostrSdkError) -> Self {
        Error::transport(format!("Nostr SDK error: {error}"))
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::config(error.to_string())
    }
}
