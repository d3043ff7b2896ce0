// Service interfaces besides the stdio MCP server

pub mod http;
