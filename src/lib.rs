// Fat Zebra MCP Library
//
// Gateway normalisation layer, tools and the stdio MCP server. The binary in
// main.rs only wires configuration and logging around these.

pub mod config;
pub mod docs;
pub mod gateway;
pub mod mcp;
pub mod tools;

#[cfg(feature = "service")]
pub mod interfaces;

pub use config::GatewayConfig;
pub use gateway::{Envelope, GatewayClient};
pub use mcp::MCPServer;
pub use tools::{Tool, ToolContext, ToolRegistry};
