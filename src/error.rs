//! Error types for the effect engine and connectivity layer

/// Error type for engine and connectivity operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed or unusable configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed control message payload
    #[error("Control message error: {0}")]
    ControlMessage(String),

    /// Rejected effect parameter value
    #[error("Parameter error: {0}")]
    Params(String),

    /// Failure inside a concrete effect
    #[error("Effect error: {0}")]
    Effect(String),

    /// WiFi radio failure
    #[error("WiFi error: {0}")]
    Wifi(String),

    /// MQTT session failure
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// An operation that needs a live MQTT session was called without one
    #[error("MQTT client not connected")]
    NotConnected,

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Result type for engine and connectivity operations
pub type Result<T> = std::result::Result<T, Error>;
