// Customer tools

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::client::encode_path_segment;
use crate::gateway::constants::endpoints;
use crate::gateway::request::RequestBody;
use crate::gateway::{validate_request, Envelope, ResponseShape};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCard {
    pub card_holder: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CreateCustomerArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<CustomerCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<CustomerAddress>,
}

const CREATE_CUSTOMER_REQUIRED: &[&str] = &["first_name", "last_name", "reference", "email_address"];

pub struct CreateCustomerTool;

#[async_trait]
impl Tool for CreateCustomerTool {
    fn name(&self) -> &'static str {
        "fat_zebra_create_customer"
    }

    fn description(&self) -> &'static str {
        "Create a customer in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "first_name": {"type": "string", "description": "The customer's first name."},
                "last_name": {"type": "string", "description": "The customer's last name."},
                "reference": {"type": "string", "description": "A unique reference for the customer."},
                "email_address": {"type": "string", "format": "email", "description": "The customer's email address."},
                "ip_address": {"type": "string", "description": "The customer's IP address."},
                "card": {
                    "type": "object",
                    "description": "The customer's card details.",
                    "properties": {
                        "card_holder": {"type": "string"},
                        "card_number": {"type": "string"},
                        "expiry_date": {"type": "string"},
                        "cvv": {"type": "string"}
                    },
                    "required": ["card_holder", "card_number", "expiry_date", "cvv"]
                },
                "address": {
                    "type": "object",
                    "description": "The customer's address details.",
                    "properties": {
                        "address": {"type": "string"},
                        "city": {"type": "string"},
                        "state": {"type": "string"},
                        "postcode": {"type": "string"},
                        "country": {"type": "string"}
                    },
                    "required": ["address", "city", "state", "postcode", "country"]
                }
            }),
            CREATE_CUSTOMER_REQUIRED,
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: CreateCustomerArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let body = match serde_json::to_value(&args) {
            Ok(Value::Object(map)) => map,
            Ok(_) => RequestBody::new(),
            Err(e) => return Envelope::internal_error(&e.into()),
        };
        let validation = validate_request(&body, CREATE_CUSTOMER_REQUIRED);
        if !validation.is_valid {
            return Envelope::validation_error(validation.errors);
        }

        send_and_handle(
            ctx,
            endpoints::CUSTOMERS,
            Method::POST,
            Some(&Value::Object(body)),
            ResponseShape::Raw,
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct UpdateCustomerArgs {
    customer_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    metadata: Option<Map<String, Value>>,
}

impl UpdateCustomerArgs {
    fn into_body(self) -> RequestBody {
        let mut body = RequestBody::new();
        for (key, value) in [
            ("email", self.email),
            ("name", self.name),
            ("address", self.address),
            ("phone", self.phone),
        ] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                body.insert(key.to_string(), Value::String(value));
            }
        }
        if let Some(metadata) = self.metadata {
            body.insert("metadata".to_string(), Value::Object(metadata));
        }
        body
    }
}

pub struct UpdateCustomerTool;

#[async_trait]
impl Tool for UpdateCustomerTool {
    fn name(&self) -> &'static str {
        "fat_zebra_update_customer"
    }

    fn description(&self) -> &'static str {
        "Update a customer's details in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "customer_id": {"type": "string", "description": "The ID of the customer to update."},
                "email": {"type": "string", "format": "email", "description": "The customer's email address."},
                "name": {"type": "string", "description": "The customer's name."},
                "address": {"type": "string", "description": "The customer's address."},
                "phone": {"type": "string", "description": "The customer's phone number."},
                "metadata": {"type": "object", "additionalProperties": {"type": "string"}, "description": "Additional metadata for the customer."}
            }),
            &["customer_id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let mut args: UpdateCustomerArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [customer_id] = match required_strings([("customer_id", args.customer_id.take())]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };

        let path = format!("{}/{}", endpoints::CUSTOMERS, encode_path_segment(&customer_id));
        let body = args.into_body();
        if body.is_empty() {
            return Envelope::validation_error(vec!["At least one field to update is required".to_string()]);
        }

        send_and_handle(ctx, &path, Method::PUT, Some(&Value::Object(body)), ResponseShape::Raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_omits_absent_sections() {
        let args: CreateCustomerArgs = parse_arguments(json!({
            "first_name": "John",
            "last_name": "Doe",
            "reference": "cust-1",
            "email_address": "john@example.com"
        }))
        .unwrap();
        let body = serde_json::to_value(&args).unwrap();
        assert_eq!(body["first_name"], json!("John"));
        assert!(body.get("card").is_none());
        assert!(body.get("ip_address").is_none());
    }

    #[test]
    fn test_update_body_keeps_only_supplied_fields() {
        let args: UpdateCustomerArgs = parse_arguments(json!({
            "customer_id": "cust_1",
            "email": "new@example.com",
            "phone": ""
        }))
        .unwrap();
        let body = args.into_body();
        assert_eq!(body.len(), 1);
        assert_eq!(body["email"], json!("new@example.com"));
    }
}
