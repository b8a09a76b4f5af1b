//! Error types for tpch-mysql.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for tpch-mysql operations.
#[derive(Error, Debug)]
pub enum TpchError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax errors, server-side timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (bad arguments, invalid config file, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data generator failures (program missing, non-zero exit).
    #[error("Generator error: {0}")]
    Generator(String),

    /// Local file system errors (writing reports, reading files).
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TpchError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a generator error with the given message.
    pub fn generator(msg: impl Into<String>) -> Self {
        Self::Generator(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Generator(_) => "Generator Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    ///
    /// The harness records this text verbatim in the report.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m)
            | Self::Query(m)
            | Self::Config(m)
            | Self::Generator(m)
            | Self::Io(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result type alias using TpchError.
pub type Result<T> = std::result::Result<T, TpchError>;
