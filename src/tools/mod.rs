// Tool framework
//
// Every MCP tool implements `Tool` and is registered in a `ToolRegistry`.
// `execute` is the final error boundary: whatever happens, the caller gets an
// `Envelope` back.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::config::GatewayConfig;
use crate::gateway::request::PaymentFlow;
use crate::gateway::{handle_response, validate_request, Envelope, GatewayClient, ResponseShape, Transport};

pub mod batch;
pub mod card;
pub mod customer;
pub mod passthrough;
pub mod payment;
pub mod transaction;
pub mod webhook;

/// Shared, immutable state handed to every tool invocation
pub struct ToolContext {
    pub client: GatewayClient,
    pub config: GatewayConfig,
}

impl ToolContext {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = GatewayClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        let client = GatewayClient::with_transport(&config, transport);
        Self { client, config }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the accepted arguments
    fn input_schema(&self) -> Value;

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope;
}

/// Ordered set of tools exposed over MCP
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every Fat Zebra tool
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();

        registry.register(payment::PaymentTool);
        registry.register(payment::TokenPaymentTool);
        registry.register(payment::ThreeDSecureTool);
        registry.register(payment::RefundTool);
        registry.register(payment::DirectDebitTool);
        registry.register(payment::TokenizeTool);

        registry.register(card::StoreCardTool);
        registry.register(card::ListStoredCardsTool);
        registry.register(card::DeleteStoredCardTool);

        registry.register(customer::CreateCustomerTool);
        registry.register(customer::UpdateCustomerTool);

        registry.register(batch::CreateBatchTool);
        registry.register(batch::ListBatchesTool);
        registry.register(batch::BatchDetailsTool);
        registry.register(batch::ReconciliationReportTool);

        registry.register(transaction::ListTransactionsTool);
        registry.register(transaction::SearchRefundsTool);
        registry.register(transaction::TransactionStatusTool);
        registry.register(transaction::TransactionHistoryTool);

        registry.register(webhook::ListWebhooksTool);
        registry.register(webhook::CreateWebhookTool);
        registry.register(webhook::DeleteWebhookTool);
        registry.register(webhook::TestWebhookTool);
        registry.register(webhook::WebhookHandlerTool);

        registry.register(passthrough::PassthroughTool);

        registry
    }

    /// Add a tool; a later tool with the same name replaces the earlier one
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool descriptors in the shape `tools/list` returns
    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect()
    }
}

/// Decode tool arguments. A missing argument object counts as `{}`; decode
/// failures become 400 envelopes.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, Envelope> {
    let arguments = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| Envelope::validation_error(vec![format!("Invalid arguments: {}", e)]))
}

/// Build an object schema from a property map and the required names
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Send one request and normalise whatever comes back
pub async fn send_and_handle(
    ctx: &ToolContext,
    endpoint: &str,
    method: Method,
    body: Option<&Value>,
    shape: ResponseShape,
) -> Envelope {
    match ctx.client.send(endpoint, method, body).await {
        Ok(reply) => handle_response(&reply, shape),
        Err(e) => Envelope::internal_error(&e),
    }
}

/// validate -> build -> send -> handle for the purchase-style flows
pub async fn submit_flow(ctx: &ToolContext, flow: PaymentFlow, shape: ResponseShape) -> Envelope {
    let endpoint = flow.endpoint();
    let required = flow.required_fields();
    let amount = flow.amount();
    let body = flow.into_body();

    let validation = validate_request(&body, required);
    if !validation.is_valid {
        return Envelope::validation_error(validation.errors);
    }
    if amount == Some(0) {
        return Envelope::validation_error(vec!["amount must be greater than 0".to_string()]);
    }

    send_and_handle(ctx, endpoint, Method::POST, Some(&Value::Object(body)), shape).await
}

/// Check required string arguments together, one message per missing field
/// in declaration order, and hand back the trimmed values
pub fn required_strings<const N: usize>(
    fields: [(&'static str, Option<String>); N],
) -> Result<[String; N], Envelope> {
    let mut body = Map::new();
    for (name, value) in &fields {
        if let Some(value) = value {
            body.insert((*name).to_string(), Value::String(value.trim().to_string()));
        }
    }
    let names = fields.each_ref().map(|(name, _)| *name);

    let validation = validate_request(&body, &names);
    if !validation.is_valid {
        return Err(Envelope::validation_error(validation.errors));
    }
    Ok(fields.map(|(_, value)| value.map(|v| v.trim().to_string()).unwrap_or_default()))
}
