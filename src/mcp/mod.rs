// MCP (Model Context Protocol) server
//
// Hand-rolled JSON-RPC 2.0 over stdio: one request per line, one response
// per line.

pub mod protocol;
pub mod server;

pub use server::MCPServer;
