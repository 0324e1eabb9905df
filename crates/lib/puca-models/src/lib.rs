//! Data model and schema helpers for puca-mcp.
//!
//! This crate defines the value types shared by the query pipeline, the
//! upstream clients, and the MCP tool surface.

pub mod models;
pub mod schema;

pub use models::*;
