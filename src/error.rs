//! Error types for the Teradata MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Teradata MCP Server
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid database URI: {message}")]
    InvalidDatabaseUri { message: String },

    #[error("Unknown transport: {value} (expected 'stdio' or 'streamable-http')")]
    UnknownTransport { value: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid tool definition file {path}: {message}")]
    InvalidToolFile { path: String, message: String },
}

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Query failed ({status}): {message}")]
    QueryFailed { status: u16, message: String },

    #[error("Session could not be established: {message}")]
    SessionFailed { message: String },

    #[error("Session expired and reconnect failed: {message}")]
    ReconnectFailed { message: String },

    #[error("Object not found: {name}")]
    ObjectNotFound { name: String },

    #[error("Empty result where rows were expected")]
    EmptyResult,
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Unknown prompt: {name}")]
    UnknownPrompt { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Missing prompt argument: {name}")]
    MissingPromptArgument { name: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingEnvVar {
            var: "DATABASE_URI".to_string(),
        };
        assert!(err.to_string().contains("DATABASE_URI"));
    }

    #[test]
    fn test_error_conversion() {
        let db_err = DatabaseError::EmptyResult;
        let err: ServerError = db_err.into();
        assert!(matches!(err, ServerError::Database(_)));
    }

    #[test]
    fn test_transport_error_message() {
        let err = ConfigError::UnknownTransport {
            value: "sse".to_string(),
        };
        assert!(err.to_string().contains("sse"));
        assert!(err.to_string().contains("streamable-http"));
    }
}
