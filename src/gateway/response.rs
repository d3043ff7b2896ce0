// Response normalisation
//
// Maps raw gateway replies onto the one envelope shape every tool returns:
// `{successful, status, response, errors}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use super::client::{GatewayPayload, GatewayReply};
use super::constants::{fields, UNKNOWN_GATEWAY_ERROR};
use super::redact::mask_account_number;

/// Normalised result of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub successful: bool,
    pub status: u16,
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl Envelope {
    pub fn success(status: u16, response: Value) -> Self {
        Self {
            successful: true,
            status,
            response: Some(response),
            errors: None,
        }
    }

    /// Failure envelope; an empty error list is replaced by the generic message
    pub fn failure(status: u16, errors: Vec<String>) -> Self {
        let errors = if errors.is_empty() {
            vec![UNKNOWN_GATEWAY_ERROR.to_string()]
        } else {
            errors
        };
        Self {
            successful: false,
            status,
            response: None,
            errors: Some(errors),
        }
    }

    /// Required fields missing or arguments malformed; nothing was sent
    pub fn validation_error(errors: Vec<String>) -> Self {
        Self::failure(400, errors)
    }

    /// Transport, parse or any other unexpected failure
    pub fn internal_error(err: &anyhow::Error) -> Self {
        error!("Error processing Fat Zebra API request: {}", err);
        Self::failure(500, vec![err.to_string()])
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            json!({
                "successful": false,
                "status": 500,
                "response": null,
                "errors": ["Failed to serialize result"]
            })
        })
    }
}

/// Which fields of the gateway `response` object a tool returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Payment,
    TokenPayment,
    ThreeDSecure,
    Refund,
    DirectDebit,
    Tokenization,
    /// Gateway `response` object passed through as-is
    Raw,
    /// Whole body passed through, including CSV text
    Document,
}

/// Convert a gateway reply into an envelope
pub fn handle_response(reply: &GatewayReply, shape: ResponseShape) -> Envelope {
    let http_ok = (200..300).contains(&reply.status);

    match &reply.payload {
        GatewayPayload::Text(text) => {
            if http_ok && shape == ResponseShape::Document && !text.is_empty() {
                return Envelope::success(reply.status, Value::String(text.clone()));
            }
            let message = if text.trim().is_empty() {
                UNKNOWN_GATEWAY_ERROR.to_string()
            } else {
                text.clone()
            };
            warn!(status = reply.status, "Fat Zebra API returned a non-JSON error");
            Envelope::failure(reply.status, vec![message])
        }
        GatewayPayload::Json(data) => {
            let flagged = data.get(fields::SUCCESSFUL).and_then(Value::as_bool);
            if !http_ok || flagged == Some(false) {
                let errors = extract_errors(data);
                warn!(status = reply.status, errors = ?errors, "Fat Zebra API returned an error");
                return Envelope::failure(reply.status, errors);
            }

            let projected = match shape {
                ResponseShape::Document => data.clone(),
                _ => {
                    let inner = data.get("response").cloned().unwrap_or(Value::Null);
                    project(shape, &inner, data)
                }
            };

            let transaction_id = projected.get(fields::TRANSACTION_ID).and_then(Value::as_str);
            let reference = projected.get(fields::REFERENCE).and_then(Value::as_str);
            info!(
                status = reply.status,
                transaction_id = ?transaction_id,
                reference = ?reference,
                "Successfully processed Fat Zebra API response"
            );
            Envelope::success(reply.status, projected)
        }
    }
}

/// Gateway errors arrive as a list, a single string, or a keyed object
pub fn extract_errors(data: &Value) -> Vec<String> {
    match data.get(fields::ERRORS) {
        Some(Value::Array(items)) => items.iter().map(value_to_message).collect(),
        Some(Value::String(message)) if !message.is_empty() => vec![message.clone()],
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value_to_message(value)))
            .collect(),
        _ => Vec::new(),
    }
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_to_message).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Copy `source[from]` into `target[to]` when present and not null
fn copy_field(target: &mut Map<String, Value>, source: &Value, from: &str, to: &str) {
    if let Some(value) = source.get(from).filter(|v| !v.is_null()) {
        target.insert(to.to_string(), value.clone());
    }
}

fn str_or_empty(source: &Value, key: &str) -> Value {
    Value::String(source.get(key).and_then(Value::as_str).unwrap_or_default().to_string())
}

fn project(shape: ResponseShape, inner: &Value, envelope: &Value) -> Value {
    let mut out = Map::new();
    match shape {
        ResponseShape::Payment | ResponseShape::TokenPayment => {
            copy_field(&mut out, inner, fields::TRANSACTION_ID, "transaction_id");
            if shape == ResponseShape::Payment {
                copy_field(&mut out, inner, fields::CARD_TOKEN, "card_token");
            }
            copy_field(&mut out, inner, fields::AMOUNT, "amount");
            copy_field(&mut out, inner, fields::REFERENCE, "reference");
            copy_field(&mut out, inner, fields::MESSAGE, "message");
            copy_field(&mut out, inner, fields::AUTHORIZATION, "authorization");
            copy_field(&mut out, inner, fields::CURRENCY, "currency");
            copy_field(&mut out, inner, fields::TIMESTAMP, "timestamp");
        }
        ResponseShape::ThreeDSecure => {
            let three_ds = inner.get("three_ds").filter(|v| !v.is_null());
            out.insert("transaction_id".into(), str_or_empty(inner, fields::TRANSACTION_ID));
            out.insert("three_ds".into(), three_ds.cloned().unwrap_or(Value::Null));
            out.insert("amount".into(), inner.get(fields::AMOUNT).cloned().unwrap_or(json!(0)));
            out.insert("reference".into(), str_or_empty(inner, fields::REFERENCE));
            out.insert("message".into(), str_or_empty(inner, fields::MESSAGE));
            out.insert("currency".into(), str_or_empty(inner, fields::CURRENCY));
            out.insert("requires_action".into(), Value::Bool(three_ds.is_some()));
            let empty = Value::Null;
            let three_ds = three_ds.unwrap_or(&empty);
            out.insert("action_url".into(), str_or_empty(three_ds, "authority_url"));
            out.insert("action_method".into(), str_or_empty(three_ds, "authority_method"));
            out.insert(
                "action_params".into(),
                three_ds.get("params").cloned().unwrap_or_else(|| json!({})),
            );
        }
        ResponseShape::Refund => {
            copy_field(&mut out, inner, "id", "refund_id");
            copy_field(&mut out, inner, fields::AMOUNT, "amount");
            copy_field(&mut out, inner, fields::REFERENCE, "reference");
            copy_field(&mut out, inner, fields::TRANSACTION_ID, "transaction_id");
            copy_field(&mut out, inner, fields::MESSAGE, "message");
            copy_field(&mut out, inner, fields::CURRENCY, "currency");
            copy_field(&mut out, inner, "created_at", "timestamp");
        }
        ResponseShape::DirectDebit => {
            out.insert("transaction_id".into(), str_or_empty(inner, "id"));
            out.insert("amount".into(), inner.get(fields::AMOUNT).cloned().unwrap_or(json!(0)));
            for key in [
                fields::REFERENCE,
                fields::MESSAGE,
                "status",
                "settlement_date",
                "transaction_date",
                "account_name",
            ] {
                out.insert(key.into(), str_or_empty(inner, key));
            }
            let account_number = inner
                .get("account_number")
                .and_then(Value::as_str)
                .map(mask_account_number)
                .unwrap_or_default();
            out.insert("account_number".into(), Value::String(account_number));
            out.insert("account_routing".into(), str_or_empty(inner, "account_routing"));
            copy_field(&mut out, envelope, "test", "test");
        }
        ResponseShape::Tokenization => {
            for key in [
                fields::CARD_TOKEN,
                "card_type",
                "card_category",
                fields::CARD_EXPIRY,
                // already masked by the gateway
                fields::CARD_NUMBER,
            ] {
                copy_field(&mut out, inner, key, key);
            }
            // the vault endpoint names the token `token`
            if !out.contains_key(fields::CARD_TOKEN) {
                copy_field(&mut out, inner, "token", fields::CARD_TOKEN);
            }
        }
        ResponseShape::Raw | ResponseShape::Document => return inner.clone(),
    }
    Value::Object(out)
}
