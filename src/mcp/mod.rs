//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol: JSON-RPC types, the dispatch core,
//! the stdio and streamable HTTP transports, and the tool and prompt
//! registries.

pub mod http;
pub mod prompts;
pub mod server;
pub mod tools;
pub mod types;
