//! Teradata access layer
//!
//! Contains the Query Service client, result types, and the tool
//! implementations grouped by area.

pub mod base;
pub mod client;
pub mod custom;
pub mod dba;
pub mod quality;
pub mod rag;
pub mod security;
pub mod types;
