// MCP Server Implementation
//
// Newline-delimited JSON-RPC over stdio. Requests are handled one at a time
// in arrival order; every response is written as a single line.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::docs::DocsLibrary;
use crate::mcp::protocol::*;
use crate::tools::{ToolContext, ToolRegistry};

/// MCP Server for handling Model Context Protocol requests
pub struct MCPServer {
    registry: ToolRegistry,
    ctx: Arc<ToolContext>,
    docs: DocsLibrary,
}

impl MCPServer {
    pub fn new(registry: ToolRegistry, ctx: Arc<ToolContext>, docs: DocsLibrary) -> Self {
        Self { registry, ctx, docs }
    }

    /// Run the MCP server with stdio transport
    pub async fn run(&self) -> Result<()> {
        info!("Starting MCP server with stdio transport ({} tools)", self.registry.len());
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some(response) = self.handle_message(trimmed).await {
                        let response_str = serde_json::to_string(&response)?;
                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                    }
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        info!("MCP server input closed");
        Ok(())
    }

    /// Handle one raw JSON-RPC message; notifications produce no response
    pub async fn handle_message(&self, line: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON request: {}", e);
                return Some(error_response(&Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        let method = request["method"].as_str().unwrap_or("");
        let id = request.get("id").cloned().unwrap_or(Value::Null);

        let response = match method {
            "initialize" => handle_initialize(&request),
            "ping" => handle_ping(&request),
            "tools/list" => handle_tools_list(&self.registry, &request),
            "tools/call" => handle_tools_call(&self.registry, &self.ctx, &request).await,
            "resources/list" => handle_resources_list(&self.docs, &request),
            "resources/read" => handle_resources_read(&self.docs, &request),
            _ => {
                // Check if this is a notification (no id field) or a request
                if id.is_null() {
                    info!("Received notification: {}", method);
                    return None;
                }
                error!("Unknown method: {}", method);
                error_response(&id, METHOD_NOT_FOUND, "Method not found")
            }
        };

        Some(response)
    }
}
