//! Error types for prettify

use thiserror::Error;

/// Result type alias for prettify operations
pub type Result<T> = std::result::Result<T, PrettifyError>;

/// Prettifier error types
#[derive(Error, Debug)]
pub enum PrettifyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rule pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Rule pattern is not prefix-anchored: {0}")]
    Unanchored(String),

    #[error("Backreferences are not supported: {0}")]
    Backreference(String),

    #[error("Cannot combine an empty pattern list")]
    EmptyPatternList,

    #[error("Malformed language table: {0}")]
    LanguageTable(#[from] toml::de::Error),

    #[error("Unknown keyword set: {0}")]
    UnknownKeywordSet(String),

    #[error("No handler registered for {0}")]
    NoHandler(String),

    #[error("Offset {offset} is outside the {len}-byte source or splits a character")]
    BadOffset { offset: usize, len: usize },

    #[error("{0}")]
    Message(String),
}
