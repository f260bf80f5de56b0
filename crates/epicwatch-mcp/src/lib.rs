//! MCP (Model Context Protocol) server for epicwatch.
//!
//! Exposes EPIC update collection, parsing and reporting as MCP tools over
//! newline-delimited JSON-RPC on stdio.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::ToolHandler;
pub use server::McpServer;
