// Payment tools
//
// Card, tokenized, 3-D Secure and direct debit purchases, refunds and card
// tokenization. All of them go through `submit_flow` or the same
// validate/send/handle steps.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{object_schema, parse_arguments, send_and_handle, submit_flow, Tool, ToolContext};
use crate::gateway::constants::{endpoints, test_data};
use crate::gateway::request::{
    build_tokenization_request, CardDetails, DirectDebitDetails, PaymentDetails, PaymentFlow, RefundDetails,
    TokenDetails,
};
use crate::gateway::{validate_request, Envelope, ResponseShape};

fn amount_property() -> Value {
    json!({"type": "integer", "minimum": 1, "description": "The amount in cents (e.g., 1000 for $10.00)"})
}

fn currency_property() -> Value {
    json!({"type": "string", "default": "AUD", "description": "The three-letter ISO currency code (default: AUD)"})
}

fn reference_property() -> Value {
    json!({"type": "string", "description": "A unique reference for this transaction. Generated when omitted."})
}

fn card_properties() -> [(&'static str, Value); 3] {
    [
        ("card_number", json!({"type": "string", "description": "The customer's credit card number"})),
        ("card_expiry", json!({"type": "string", "description": "The card expiry date in the format MM/YYYY (e.g., 05/2026)"})),
        ("card_cvv", json!({"type": "string", "description": "The card verification value (CVV/CVC) code"})),
    ]
}

#[derive(Debug, Deserialize)]
struct CardPaymentArgs {
    #[serde(flatten)]
    details: PaymentDetails,
    #[serde(flatten)]
    card: CardDetails,
}

/// Card-present purchase
pub struct PaymentTool;

#[async_trait]
impl Tool for PaymentTool {
    fn name(&self) -> &'static str {
        "fat_zebra_payment"
    }

    fn description(&self) -> &'static str {
        "Process a credit card payment using the Fat Zebra payment gateway"
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "amount": amount_property(),
            "currency": currency_property(),
            "reference": reference_property(),
            "card_holder": {"type": "string", "description": "The cardholder's name (optional)"},
            "customer_email": {"type": "string", "format": "email", "description": "The customer's email address (optional)"},
            "customer_ip": {"type": "string", "description": "The customer's IP address (optional)"},
            "capture": {"type": "boolean", "description": "Whether to capture the payment immediately (default: true)"}
        });
        for (key, schema) in card_properties() {
            properties[key] = schema;
        }
        object_schema(properties, &["amount", "card_number", "card_expiry", "card_cvv"])
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: CardPaymentArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let flow = PaymentFlow::CardPresent {
            details: args.details,
            card: args.card.with_sandbox_fallback(ctx.client.is_test_mode()),
        };
        submit_flow(ctx, flow, ResponseShape::Payment).await
    }
}

#[derive(Debug, Deserialize)]
struct TokenPaymentArgs {
    #[serde(flatten)]
    details: PaymentDetails,
    card_token: Option<String>,
    card_cvv: Option<String>,
    /// Legacy spelling of `card_cvv`
    cvv: Option<String>,
}

/// Purchase against a stored card token
pub struct TokenPaymentTool;

#[async_trait]
impl Tool for TokenPaymentTool {
    fn name(&self) -> &'static str {
        "fat_zebra_token_payment"
    }

    fn description(&self) -> &'static str {
        "Process a payment using a tokenized card with the Fat Zebra payment gateway"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "amount": amount_property(),
                "currency": currency_property(),
                "card_token": {"type": "string", "description": "The tokenized card to charge"},
                "reference": reference_property(),
                "card_cvv": {"type": "string", "description": "The card verification value (CVV/CVC) code"},
                "cvv": {"type": "string", "description": "Alias of card_cvv, kept for older callers"},
                "card_holder": {"type": "string", "description": "The cardholder's name"},
                "customer_email": {"type": "string", "format": "email", "description": "The customer's email address (optional)"},
                "customer_ip": {"type": "string", "description": "The customer's IP address (optional)"},
                "capture": {"type": "boolean", "description": "Whether to capture the payment immediately (default: true)"}
            }),
            &["amount", "card_token"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: TokenPaymentArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let flow = PaymentFlow::Tokenized {
            details: args.details,
            token: TokenDetails::from_aliases(args.card_token, args.card_cvv, args.cvv),
        };
        submit_flow(ctx, flow, ResponseShape::TokenPayment).await
    }
}

#[derive(Debug, Deserialize)]
struct ThreeDSecureArgs {
    #[serde(flatten)]
    details: PaymentDetails,
    #[serde(flatten)]
    card: CardDetails,
    return_url: Option<String>,
    fraud_detection_enabled: Option<bool>,
}

/// Purchase with 3-D Secure authentication
pub struct ThreeDSecureTool;

#[async_trait]
impl Tool for ThreeDSecureTool {
    fn name(&self) -> &'static str {
        "fat_zebra_3d_secure"
    }

    fn description(&self) -> &'static str {
        "Process a payment with 3D Secure authentication using the Fat Zebra payment gateway"
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "amount": amount_property(),
            "currency": currency_property(),
            "reference": reference_property(),
            "card_holder": {"type": "string", "description": "The name of the cardholder"},
            "customer_ip": {"type": "string", "description": "The customer's IP address"},
            "customer_email": {"type": "string", "format": "email", "description": "The customer's email address (optional)"},
            "return_url": {"type": "string", "format": "uri", "description": "The URL to return to after 3D Secure authentication"},
            "fraud_detection_enabled": {"type": "boolean", "description": "Whether to enable fraud detection (default: false)"}
        });
        for (key, schema) in card_properties() {
            properties[key] = schema;
        }
        object_schema(
            properties,
            &["amount", "card_number", "card_expiry", "card_cvv", "card_holder", "customer_ip", "return_url"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: ThreeDSecureArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let test_mode = ctx.client.is_test_mode();
        let mut details = args.details;
        if test_mode {
            details.card_holder.get_or_insert_with(|| test_data::CARD_HOLDER.to_string());
            details.customer_ip.get_or_insert_with(|| test_data::CUSTOMER_IP.to_string());
        }

        let flow = PaymentFlow::ThreeDSecure {
            details,
            card: args.card.with_sandbox_fallback(test_mode),
            return_url: args.return_url,
            fraud_detection_enabled: args.fraud_detection_enabled,
        };
        submit_flow(ctx, flow, ResponseShape::ThreeDSecure).await
    }
}

/// Refund a previous purchase
pub struct RefundTool;

#[async_trait]
impl Tool for RefundTool {
    fn name(&self) -> &'static str {
        "fat_zebra_refund"
    }

    fn description(&self) -> &'static str {
        "Process a refund for a previous transaction using the Fat Zebra payment gateway"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "transaction_id": {"type": "string", "description": "The ID of the original transaction to refund"},
                "amount": amount_property(),
                "reference": {"type": "string", "description": "A unique reference for this refund. Generated when omitted."}
            }),
            &["transaction_id", "amount"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let refund: RefundDetails = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        submit_flow(ctx, PaymentFlow::Refund(refund), ResponseShape::Refund).await
    }
}

/// Direct debit from an Australian bank account
pub struct DirectDebitTool;

#[async_trait]
impl Tool for DirectDebitTool {
    fn name(&self) -> &'static str {
        "fat_zebra_direct_debit"
    }

    fn description(&self) -> &'static str {
        "Create a direct debit transaction using the Fat Zebra payment gateway"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "amount": amount_property(),
                "description": {"type": "string", "maxLength": 18, "description": "Description of the debit (truncated to 18 characters)"},
                "reference": reference_property(),
                "account_name": {"type": "string", "description": "The name on the bank account"},
                "bsb": {"type": "string", "description": "The BSB, as 123-456 or 123456"},
                "account_number": {"type": "string", "description": "The bank account number"},
                "customer_name": {"type": "string", "description": "The customer's name (optional)"},
                "customer_email": {"type": "string", "format": "email", "description": "The customer's email address (optional)"},
                "customer_ip": {"type": "string", "description": "The customer's IP address (optional)"},
                "metadata": {"type": "object", "additionalProperties": {"type": "string"}, "description": "Additional metadata (optional)"}
            }),
            &["amount", "description", "account_name", "bsb", "account_number"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let details: DirectDebitDetails = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let details = details.with_sandbox_fallback(ctx.client.is_test_mode());
        submit_flow(ctx, PaymentFlow::DirectDebit(details), ResponseShape::DirectDebit).await
    }
}

#[derive(Debug, Deserialize)]
struct TokenizeArgs {
    #[serde(flatten)]
    card: CardDetails,
    card_holder: Option<String>,
}

/// Exchange raw card details for a reusable card token
pub struct TokenizeTool;

const TOKENIZE_REQUIRED: &[&str] = &["card_number", "card_expiry", "card_cvv"];

#[async_trait]
impl Tool for TokenizeTool {
    fn name(&self) -> &'static str {
        "fat_zebra_tokenize"
    }

    fn description(&self) -> &'static str {
        "Tokenize a credit card using the Fat Zebra payment gateway for future use"
    }

    fn input_schema(&self) -> Value {
        let mut properties = json!({
            "card_holder": {"type": "string", "description": "The name of the cardholder"}
        });
        for (key, schema) in card_properties() {
            properties[key] = schema;
        }
        object_schema(properties, TOKENIZE_REQUIRED)
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: TokenizeArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let test_mode = ctx.client.is_test_mode();
        let card = args.card.with_sandbox_fallback(test_mode);
        let card_holder = args
            .card_holder
            .or_else(|| test_mode.then(|| test_data::CARD_HOLDER.to_string()));

        let body = build_tokenization_request(&card, card_holder.as_deref());
        let validation = validate_request(&body, TOKENIZE_REQUIRED);
        if !validation.is_valid {
            return Envelope::validation_error(validation.errors);
        }

        send_and_handle(
            ctx,
            endpoints::CREDIT_CARDS,
            Method::POST,
            Some(&Value::Object(body)),
            ResponseShape::Tokenization,
        )
        .await
    }
}
