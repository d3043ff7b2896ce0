// Raw API access for endpoints no dedicated tool covers

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::{Envelope, ResponseShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum PassthroughMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl From<PassthroughMethod> for Method {
    fn from(method: PassthroughMethod) -> Self {
        match method {
            PassthroughMethod::Get => Method::GET,
            PassthroughMethod::Post => Method::POST,
            PassthroughMethod::Put => Method::PUT,
            PassthroughMethod::Delete => Method::DELETE,
            PassthroughMethod::Patch => Method::PATCH,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PassthroughArgs {
    method: Option<PassthroughMethod>,
    endpoint: Option<String>,
    body: Option<Value>,
}

/// Endpoints stay relative to the configured base URL
fn check_endpoint(endpoint: &str) -> Result<(), String> {
    if !endpoint.starts_with('/') {
        return Err("endpoint must start with a slash, e.g. /purchases".to_string());
    }
    if endpoint.contains("..") {
        return Err("endpoint must not contain '..'".to_string());
    }
    if endpoint.contains("://") || endpoint.starts_with("//") {
        return Err("endpoint must be a path, not a URL".to_string());
    }
    Ok(())
}

pub struct PassthroughTool;

#[async_trait]
impl Tool for PassthroughTool {
    fn name(&self) -> &'static str {
        "fat_zebra_passthrough"
    }

    fn description(&self) -> &'static str {
        "Send any supported Fat Zebra API request (method, endpoint, body) and receive the raw response."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "method": {"type": "string", "enum": ["GET", "POST", "PUT", "DELETE", "PATCH"], "description": "HTTP method"},
                "endpoint": {"type": "string", "pattern": "^/", "description": "Fat Zebra API endpoint (must start with a slash, e.g. /purchases)"},
                "body": {"description": "JSON body for POST, PUT or PATCH requests (optional)"}
            }),
            &["method", "endpoint"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: PassthroughArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [_, endpoint] = match required_strings([
            ("method", args.method.map(|m| Method::from(m).to_string())),
            ("endpoint", args.endpoint),
        ]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };
        let Some(method) = args.method.map(Method::from) else {
            return Envelope::validation_error(vec!["method is required".to_string()]);
        };
        if let Err(message) = check_endpoint(&endpoint) {
            return Envelope::validation_error(vec![message]);
        }

        info!(method = %method, "Passthrough request");
        let body = args.body.filter(|b| !b.is_null());
        send_and_handle(ctx, &endpoint, method, body.as_ref(), ResponseShape::Document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_rules() {
        assert!(check_endpoint("/purchases/abc").is_ok());
        assert!(check_endpoint("purchases").is_err());
        assert!(check_endpoint("/purchases/../admin").is_err());
        assert!(check_endpoint("//evil.example.com/x").is_err());
    }

    #[test]
    fn test_method_names_are_uppercase() {
        let args: PassthroughArgs = parse_arguments(json!({"method": "PATCH", "endpoint": "/customers/1"})).unwrap();
        assert_eq!(args.method.map(Method::from), Some(Method::PATCH));
        assert!(parse_arguments::<PassthroughArgs>(json!({"method": "get", "endpoint": "/x"})).is_err());
    }
}
