//! Teradata MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Teradata.
//! Exposes database, DBA, data quality, security, and RAG tools over
//! stdio and streamable HTTP transports.

pub mod config;
pub mod error;
pub mod mcp;
pub mod td;

pub use config::Config;
pub use error::{Result, ServerError};
