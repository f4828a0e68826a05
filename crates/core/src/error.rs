/// Result alias that carries the custom [`CueVizError`] type.
pub type Result<T> = std::result::Result<T, CueVizError>;

/// Common error type for the core crate.
///
/// Nothing on the per-frame or per-cue path returns an error: a missing track
/// or an unplaceable shape degrades to "nothing drawn". Errors only surface at
/// the loading boundary (config and timeline documents).
#[derive(Debug, thiserror::Error)]
pub enum CueVizError {
    /// Free-form message for failures that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A config or timeline document could not be decoded.
    #[error("invalid json document: {0}")]
    Json(#[from] serde_json::Error),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CueVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for CueVizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CueVizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
