use thiserror::Error;

/// Result type for section operations
pub type Result<T> = std::result::Result<T, SectionsError>;

/// Errors that can occur while parsing or annotating sections
#[derive(Error, Debug)]
pub enum SectionsError {
    /// The markdown backend could not produce a syntax tree
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid engine configuration, rejected before any provider call
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `generate` or `aggregate` call failed; the provider's error is kept as-is
    #[error(transparent)]
    Callback(anyhow::Error),
}

impl SectionsError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Recover the provider error of a failed callback
    #[must_use]
    pub fn into_callback_error(self) -> Option<anyhow::Error> {
        match self {
            Self::Callback(err) => Some(err),
            _ => None,
        }
    }
}
