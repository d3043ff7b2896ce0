// MCP Protocol Implementation
//
// JSON-RPC 2.0 handlers for the Model Context Protocol methods the server
// answers. Each handler takes the decoded request and returns the full
// response object.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::docs::{DocsLibrary, MARKDOWN_MIME};
use crate::tools::{ToolContext, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "fatzebra-mcp";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

fn result_response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Handle MCP initialization request
pub fn handle_initialize(request: &Value) -> Value {
    result_response(
        &request["id"],
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Fat Zebra payment gateway tools. Read the resource:docs/markdown resources before calling a tool. Amounts are in cents."
        }),
    )
}

pub fn handle_ping(request: &Value) -> Value {
    result_response(&request["id"], json!({}))
}

/// Handle MCP tools/list request
pub fn handle_tools_list(registry: &ToolRegistry, request: &Value) -> Value {
    result_response(&request["id"], json!({ "tools": registry.definitions() }))
}

/// Handle MCP tools/call request
pub async fn handle_tools_call(registry: &ToolRegistry, ctx: &ToolContext, request: &Value) -> Value {
    let id = &request["id"];
    let params = &request["params"];
    let Some(tool_name) = params["name"].as_str() else {
        return error_response(id, INVALID_PARAMS, "Missing tool name");
    };
    let Some(tool) = registry.get(tool_name) else {
        error!("Unknown tool: {}", tool_name);
        return error_response(id, METHOD_NOT_FOUND, "Tool not found");
    };

    info!(tool = tool_name, "Calling tool");
    let envelope = tool.execute(ctx, params["arguments"].clone()).await;
    info!(tool = tool_name, successful = envelope.successful, status = envelope.status, "Tool finished");

    let text = match serde_json::to_string_pretty(&envelope) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize tool result: {}", e);
            return error_response(id, INTERNAL_ERROR, "Failed to serialize tool result");
        }
    };

    result_response(
        id,
        json!({
            "content": [
                {
                    "type": "text",
                    "text": text
                }
            ],
            "isError": !envelope.successful
        }),
    )
}

/// Handle MCP resources/list request
pub fn handle_resources_list(docs: &DocsLibrary, request: &Value) -> Value {
    match docs.list() {
        Ok(resources) => result_response(&request["id"], json!({ "resources": resources })),
        Err(e) => {
            error!("Failed to list documentation: {}", e);
            error_response(&request["id"], INTERNAL_ERROR, "Failed to list documentation")
        }
    }
}

/// Handle MCP resources/read request
pub fn handle_resources_read(docs: &DocsLibrary, request: &Value) -> Value {
    let id = &request["id"];
    let Some(uri) = request["params"]["uri"].as_str() else {
        return error_response(id, INVALID_PARAMS, "Missing resource uri");
    };

    match docs.read(uri) {
        Ok(Some(text)) => result_response(
            id,
            json!({
                "contents": [
                    {
                        "uri": uri,
                        "mimeType": MARKDOWN_MIME,
                        "text": text
                    }
                ]
            }),
        ),
        Ok(None) => error_response(id, INVALID_PARAMS, &format!("Resource not found: {}", uri)),
        Err(e) => {
            error!("Failed to read {}: {}", uri, e);
            error_response(id, INTERNAL_ERROR, "Failed to read resource")
        }
    }
}
