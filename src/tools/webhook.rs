// Webhook tools
//
// The gateway's webhook API is missing from some environments (notably the
// sandbox). Every networked webhook tool first negotiates capability with a
// GET on the collection; a 404 there is reported as a dedicated error rather
// than a raw not-found.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sha2::Sha256;
use tracing::{info, warn};

use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::client::encode_path_segment;
use crate::gateway::constants::endpoints;
use crate::gateway::{handle_response, Envelope, GatewayClient, GatewayReply, ResponseShape};

type HmacSha256 = Hmac<Sha256>;

pub const WEBHOOKS_UNAVAILABLE: &str = "Webhook functionality is not available in the current Fat Zebra environment (404 Not Found). \
The webhooks endpoint is not accessible in this environment, either because webhooks are not supported in the sandbox \
or because additional configuration is required. \
See https://docs.fatzebra.com/reference/webhooks for more information.";

/// Outcome of the availability check on the webhook collection
#[derive(Debug)]
pub enum WebhookCapability {
    /// Endpoint answered; carries the listing reply for reuse
    Available(GatewayReply),
    Unavailable,
}

/// GET the webhook collection; only a 404 marks the feature as missing
pub async fn check_webhooks(client: &GatewayClient) -> Result<WebhookCapability> {
    info!("Checking webhooks API availability");
    let reply = client.send(endpoints::WEB_HOOKS, Method::GET, None).await?;
    if reply.status == 404 {
        warn!("Webhooks API is not available (404 Not Found)");
        return Ok(WebhookCapability::Unavailable);
    }
    Ok(WebhookCapability::Available(reply))
}

pub fn webhooks_unavailable() -> Envelope {
    Envelope::failure(404, vec![WEBHOOKS_UNAVAILABLE.to_string()])
}

/// Availability check first; an `Err` is already the final envelope
async fn ensure_webhooks(ctx: &ToolContext) -> Result<GatewayReply, Envelope> {
    match check_webhooks(&ctx.client).await {
        Ok(WebhookCapability::Available(reply)) => Ok(reply),
        Ok(WebhookCapability::Unavailable) => Err(webhooks_unavailable()),
        Err(e) => Err(Envelope::internal_error(&e)),
    }
}

fn webhook_path(id: &str) -> String {
    format!("{}/{}", endpoints::WEB_HOOKS, encode_path_segment(id))
}

pub struct ListWebhooksTool;

#[async_trait]
impl Tool for ListWebhooksTool {
    fn name(&self) -> &'static str {
        "fat_zebra_list_webhooks"
    }

    fn description(&self) -> &'static str {
        "List all webhooks configured in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: Value) -> Envelope {
        match ensure_webhooks(ctx).await {
            Ok(reply) => handle_response(&reply, ResponseShape::Raw),
            Err(envelope) => envelope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum WebhookMode {
    Live,
    Test,
}

impl WebhookMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Test => "Test",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateWebhookArgs {
    address: Option<String>,
    name: Option<String>,
    mode: Option<WebhookMode>,
    #[serde(default)]
    events: Vec<String>,
}

pub struct CreateWebhookTool;

#[async_trait]
impl Tool for CreateWebhookTool {
    fn name(&self) -> &'static str {
        "fat_zebra_create_webhook"
    }

    fn description(&self) -> &'static str {
        "Create a webhook in Fat Zebra to receive event notifications."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "address": {"type": "string", "format": "uri", "description": "URL that the webhook payload will be sent to."},
                "name": {"type": "string", "description": "A name for the webhook."},
                "mode": {"type": "string", "enum": ["Live", "Test"], "description": "The webhook mode - Live or Test."},
                "events": {"type": "array", "items": {"type": "string"}, "description": "The events a webhook target should receive."}
            }),
            &["address", "name", "mode", "events"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: CreateWebhookArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [address, name, mode] = match required_strings([
            ("address", args.address),
            ("name", args.name),
            ("mode", args.mode.map(|m| m.as_str().to_string())),
        ]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };
        if let Err(e) = url::Url::parse(&address) {
            return Envelope::validation_error(vec![format!("address must be a valid URL: {}", e)]);
        }
        if args.events.is_empty() {
            return Envelope::validation_error(vec!["events is required".to_string()]);
        }

        if let Err(envelope) = ensure_webhooks(ctx).await {
            return envelope;
        }

        let body = json!({
            "address": address,
            "name": name,
            "mode": mode,
            "events": args.events,
        });
        send_and_handle(ctx, endpoints::WEB_HOOKS, Method::POST, Some(&body), ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct WebhookIdArgs {
    id: Option<String>,
}

pub struct DeleteWebhookTool;

#[async_trait]
impl Tool for DeleteWebhookTool {
    fn name(&self) -> &'static str {
        "fat_zebra_delete_webhook"
    }

    fn description(&self) -> &'static str {
        "Delete a webhook from Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({"id": {"type": "string", "description": "The ID of the webhook to delete."}}),
            &["id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: WebhookIdArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [id] = match required_strings([("id", args.id)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };
        if let Err(envelope) = ensure_webhooks(ctx).await {
            return envelope;
        }

        send_and_handle(ctx, &webhook_path(&id), Method::DELETE, None, ResponseShape::Raw).await
    }
}

pub struct TestWebhookTool;

#[async_trait]
impl Tool for TestWebhookTool {
    fn name(&self) -> &'static str {
        "fat_zebra_test_webhook"
    }

    fn description(&self) -> &'static str {
        "Send a test event to a webhook configured in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({"id": {"type": "string", "description": "The ID of the webhook to test."}}),
            &["id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: WebhookIdArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [id] = match required_strings([("id", args.id)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };
        if let Err(envelope) = ensure_webhooks(ctx).await {
            return envelope;
        }

        let path = format!("{}/test", webhook_path(&id));
        send_and_handle(ctx, &path, Method::POST, None, ResponseShape::Raw).await
    }
}

/// Hex HMAC-SHA256 of `payload`, as the gateway signs webhook deliveries
pub fn sign_payload(payload: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| anyhow!("Invalid webhook secret: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature
pub fn verify_signature(payload: &str, signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Deserialize)]
struct WebhookHandlerArgs {
    payload: Option<String>,
    #[serde(default)]
    signature: String,
    verify_signature: Option<bool>,
    secret_key: Option<String>,
    event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: Map<String, Value>,
    #[serde(default)]
    test: Option<bool>,
}

/// Summarise a verified event by family
fn summarise_event(event: &WebhookEvent) -> Value {
    let (family, outcome) = event.event.split_once('.').unwrap_or((event.event.as_str(), ""));
    let field = |key: &str| event.payload.get(key).cloned().unwrap_or(Value::Null);
    let message = |default: String| {
        event
            .payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(default)
    };

    let mut summary = json!({
        "verified": true,
        "processed": true,
        "event": event.event,
        "test": event.test.unwrap_or(false),
    });

    match family {
        "purchase" | "refund" => {
            let label = if family == "purchase" { "Transaction" } else { "Refund" };
            summary["transaction_id"] = field("transaction_id");
            summary["reference"] = field("reference");
            summary["amount"] = field("amount");
            summary["status"] = event
                .payload
                .get("status")
                .cloned()
                .unwrap_or_else(|| Value::String(outcome.to_string()));
            summary["message"] = Value::String(message(format!("{} {}", label, outcome)));
        }
        "tokenization" => {
            summary["card_token"] = field("card_token");
            summary["message"] = Value::String(message(format!("Card tokenization {}", outcome)));
        }
        _ => {
            summary["data"] = Value::Object(event.payload.clone());
            summary["message"] = Value::String(format!("Processed webhook event: {}", event.event));
        }
    }
    summary
}

/// Verifies and summarises an inbound webhook delivery; makes no API call
pub struct WebhookHandlerTool;

#[async_trait]
impl Tool for WebhookHandlerTool {
    fn name(&self) -> &'static str {
        "fat_zebra_webhook_handler"
    }

    fn description(&self) -> &'static str {
        "Handle and verify Fat Zebra payment gateway webhooks"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "payload": {"type": "string", "description": "The JSON payload received from Fat Zebra webhook"},
                "signature": {"type": "string", "description": "The signature header received with the webhook"},
                "verify_signature": {"type": "boolean", "default": true, "description": "Whether to verify the webhook signature (default: true)"},
                "secret_key": {"type": "string", "description": "The secret key used to verify the webhook signature (optional, uses the configured secret by default)"},
                "event_type": {"type": "string", "description": "Filter processing to a specific event type only (optional)"}
            }),
            &["payload", "signature"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: WebhookHandlerArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        // Signed bytes must reach verification untouched, so only the check trims
        if let Err(envelope) = required_strings([("payload", args.payload.clone())]) {
            return envelope;
        }
        let payload = args.payload.unwrap_or_default();

        if args.verify_signature.unwrap_or(true) {
            let secret = args
                .secret_key
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(ctx.config.webhook_secret.as_deref());
            let Some(secret) = secret else {
                return Envelope::validation_error(vec!["No webhook secret configured".to_string()]);
            };
            if !verify_signature(&payload, &args.signature, secret) {
                warn!("Rejected webhook with invalid signature");
                return Envelope::failure(401, vec!["Invalid webhook signature".to_string()]);
            }
        }

        let event: WebhookEvent = match serde_json::from_str(&payload) {
            Ok(event) => event,
            Err(e) => return Envelope::validation_error(vec![format!("Invalid webhook payload: {}", e)]),
        };

        if let Some(wanted) = args.event_type.filter(|t| !t.is_empty()) {
            if event.event != wanted {
                return Envelope::success(
                    200,
                    json!({
                        "verified": true,
                        "processed": false,
                        "event": event.event,
                        "message": format!("Event type {} does not match requested type {}", event.event, wanted),
                    }),
                );
            }
        }

        info!(event = %event.event, "Processed webhook event");
        Envelope::success(200, summarise_event(&event))
    }
}
