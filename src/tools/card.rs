// Stored card tools

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::client::encode_path_segment;
use crate::gateway::constants::endpoints;
use crate::gateway::request::{build_tokenization_request, insert_str, CardDetails};
use crate::gateway::{validate_request, Envelope, ResponseShape};

fn customer_cards_path(customer_id: &str) -> String {
    format!("{}/{}/cards", endpoints::CUSTOMERS, encode_path_segment(customer_id))
}

#[derive(Debug, Deserialize)]
struct StoreCardArgs {
    customer_id: Option<String>,
    #[serde(flatten)]
    card: CardDetails,
    card_holder: Option<String>,
}

const STORE_CARD_REQUIRED: &[&str] = &["customer_id", "card_holder", "card_number", "card_expiry", "card_cvv"];

/// Vault a card against an existing customer
pub struct StoreCardTool;

#[async_trait]
impl Tool for StoreCardTool {
    fn name(&self) -> &'static str {
        "fat_zebra_store_card"
    }

    fn description(&self) -> &'static str {
        "Store a card for future use against a customer using the Fat Zebra payment gateway."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "customer_id": {"type": "string", "description": "The customer to store the card against."},
                "card_number": {"type": "string", "description": "The card number to store."},
                "card_expiry": {"type": "string", "description": "The card expiry date in the format MM/YYYY."},
                "card_cvv": {"type": "string", "description": "The card verification value (CVV/CVC) code."},
                "card_holder": {"type": "string", "description": "The name of the cardholder."}
            }),
            &["customer_id", "card_number", "card_expiry", "card_cvv", "card_holder"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: StoreCardArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let customer_id = args.customer_id.as_deref().map(str::trim).unwrap_or_default();

        let body = build_tokenization_request(&args.card, args.card_holder.as_deref());
        let mut checked = body.clone();
        insert_str(&mut checked, "customer_id", Some(customer_id));
        let validation = validate_request(&checked, STORE_CARD_REQUIRED);
        if !validation.is_valid {
            return Envelope::validation_error(validation.errors);
        }

        send_and_handle(
            ctx,
            &customer_cards_path(customer_id),
            Method::POST,
            Some(&Value::Object(body)),
            ResponseShape::Tokenization,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct CustomerArgs {
    customer_id: Option<String>,
}

pub struct ListStoredCardsTool;

#[async_trait]
impl Tool for ListStoredCardsTool {
    fn name(&self) -> &'static str {
        "fat_zebra_list_stored_cards"
    }

    fn description(&self) -> &'static str {
        "List all stored cards for a customer in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "customer_id": {"type": "string", "description": "The customer ID to list cards for."}
            }),
            &["customer_id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: CustomerArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [customer_id] = match required_strings([("customer_id", args.customer_id)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };

        send_and_handle(ctx, &customer_cards_path(&customer_id), Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct DeleteCardArgs {
    customer_id: Option<String>,
    card_token: Option<String>,
}

pub struct DeleteStoredCardTool;

#[async_trait]
impl Tool for DeleteStoredCardTool {
    fn name(&self) -> &'static str {
        "fat_zebra_delete_stored_card"
    }

    fn description(&self) -> &'static str {
        "Delete a stored card for a customer in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "customer_id": {"type": "string", "description": "The customer ID associated with the card."},
                "card_token": {"type": "string", "description": "The token of the card to delete."}
            }),
            &["customer_id", "card_token"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: DeleteCardArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [customer_id, card_token] =
            match required_strings([("customer_id", args.customer_id), ("card_token", args.card_token)]) {
                Ok(values) => values,
                Err(envelope) => return envelope,
            };

        let path = format!("{}/{}", customer_cards_path(&customer_id), encode_path_segment(&card_token));
        send_and_handle(ctx, &path, Method::DELETE, None, ResponseShape::Raw).await
    }
}
