/*!
 * Error types for the recordgate data-access layer.
 *
 * This module contains custom error types for the different layers of the crate,
 * using the thiserror crate for ergonomic error definitions:
 * - `ConnectionError`: transport and handshake failures, retried by the retry policy
 * - `QueryError`: statement failures and exhausted retries surfaced to callers
 * - `ValidationError`: caller input rejected before any query is sent
 * - `DomainError`: failures of the higher-level domain helpers
 */

use std::fmt;

use thiserror::Error;

/// Errors that can occur while talking to the database engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The engine could not be reached
    #[error("Database unreachable: {0}")]
    Unreachable(String),

    /// The engine answered the handshake with a failure
    #[error("Handshake rejected: {status_code} - {message}")]
    HandshakeRejected {
        /// HTTP status code
        status_code: u16,
        /// Error message from the engine
        message: String,
    },

    /// The handle was closed, usually by a reconnect from another task
    #[error("Connection handle is closed")]
    Closed,

    /// No connection has been established yet
    #[error("Not connected to the database")]
    NotConnected,

    /// Connections are disabled while the process is in its build phase
    #[error("Connections are disabled during the build phase")]
    Dormant,

    /// The engine rejected the whole request
    #[error("Engine responded with error: {code} - {message}")]
    Rpc {
        /// RPC error code
        code: i64,
        /// Error message from the engine
        message: String,
    },

    /// The engine response could not be understood
    #[error("Malformed engine response: {0}")]
    Protocol(String),
}

/// Errors surfaced by the query executor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A statement in the batch failed for a substantive reason
    #[error("Statement {index} failed: {message}")]
    Statement {
        /// Position of the failing statement in the batch
        index: usize,
        /// Error message reported by the engine
        message: String,
    },

    /// Every attempt failed and the engine is considered unavailable
    #[error("Database unavailable after {attempts} attempts: {last_error}")]
    Unavailable {
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: ConnectionError,
    },

    /// A binding name is malformed or reserved
    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    /// A statement payload did not match the requested type
    #[error("Failed to decode statement {index}: {message}")]
    Decode {
        /// Position of the statement in the batch
        index: usize,
        /// Decoder error message
        message: String,
    },
}

impl QueryError {
    /// Engine message of a failed statement, if this is a statement failure
    pub fn statement_message(&self) -> Option<&str> {
        match self {
            Self::Statement { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human readable reason
    pub message: String,
}

/// Structured validation failure for caller-supplied input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// All rejected fields, in the order they were checked
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Create an empty validation result
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validation error for a single field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.push(field, message);
        error
    }

    /// Record a rejected field
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether no field was rejected
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Message recorded for a field, if any
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.message.as_str())
    }

    /// Turn the collected failures into a result
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in the domain helpers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input was rejected before reaching the database
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The database reported a failure
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// A referenced account does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The sender cannot cover the amount
    #[error("Insufficient funds for transfer of {amount}")]
    InsufficientFunds {
        /// Requested amount
        amount: u64,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the connection layer
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Error from query execution
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Error from a domain helper
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
