// Request validation
//
// Checks a built request body for required fields before anything is sent.

use serde_json::Value;

use super::request::RequestBody;

/// Outcome of checking a request body against its required fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// One message per missing field, in the order the fields were required
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { is_valid: false, errors }
    }
}

/// Absent, null and empty strings are missing. Numeric zero and `false` are not.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Validate that every required field is present in the request body
pub fn validate_request(body: &RequestBody, required_fields: &[&str]) -> ValidationResult {
    let errors: Vec<String> = required_fields
        .iter()
        .filter(|field| is_missing(body.get(**field)))
        .map(|field| format!("{} is required", field))
        .collect();

    if errors.is_empty() {
        ValidationResult::ok()
    } else {
        ValidationResult::failed(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> RequestBody {
        match value {
            Value::Object(map) => map,
            _ => panic!("test body must be an object"),
        }
    }

    #[test]
    fn test_zero_and_false_are_present() {
        let body = body(json!({"amount": 0, "capture": false}));
        let result = validate_request(&body, &["amount", "capture"]);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_fields_reported_in_required_order() {
        let body = body(json!({"card_number": "", "currency": null, "amount": 100}));
        let result = validate_request(&body, &["reference", "amount", "card_number", "currency"]);
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                "reference is required".to_string(),
                "card_number is required".to_string(),
                "currency is required".to_string(),
            ]
        );
    }
}
