// Log redaction
//
// Every request and response body passes through `Redactor::redact` before it
// reaches a log line.

use std::collections::HashSet;

use serde_json::Value;

use super::constants::fields;

const MASKED_CVV: &str = "***";
const MASKED_SHORT_CARD: &str = "******";
const REPLACEMENT: &str = "[REDACTED]";

/// Key names blanked when no explicit list is configured
pub const DEFAULT_REDACT_KEYS: &[&str] = &[
    "token",
    "password",
    "secret",
    "authorization",
    "account_number",
    "bsb",
    "card_token",
    "customer_email",
];

#[derive(Debug, Clone)]
pub struct Redactor {
    redact_key_names: HashSet<String>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(DEFAULT_REDACT_KEYS.iter().copied())
    }
}

impl Redactor {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let redact_key_names = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { redact_key_names }
    }

    /// Return a copy of `value` that is safe to log
    pub fn redact(&self, value: &Value) -> Value {
        let mut value = value.clone();
        self.redact_in_place(&mut value);
        value
    }

    fn redact_in_place(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, field) in map.iter_mut() {
                    let lower = key.to_ascii_lowercase();
                    if lower == fields::CARD_NUMBER {
                        *field = match field {
                            Value::String(number) => Value::String(mask_card_number(number)),
                            Value::Null => Value::Null,
                            _ => Value::String(MASKED_SHORT_CARD.to_string()),
                        };
                    } else if lower == fields::CARD_CVV || lower == "cvv" {
                        if !field.is_null() {
                            *field = Value::String(MASKED_CVV.to_string());
                        }
                    } else if self.redact_key_names.contains(&lower) {
                        if !field.is_null() {
                            *field = Value::String(REPLACEMENT.to_string());
                        }
                    } else {
                        self.redact_in_place(field);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.redact_in_place(item);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

/// Keep the first six and last four digits of a card number
pub fn mask_card_number(card_number: &str) -> String {
    let chars: Vec<char> = card_number.chars().collect();
    if chars.len() < 8 {
        return MASKED_SHORT_CARD.to_string();
    }
    // Numbers of 8-10 chars would leak every digit through 6+4
    if chars.len() <= 10 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        return format!("...{}", tail);
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Mask all but the last four digits of a bank account number
pub fn mask_account_number(account_number: &str) -> String {
    let digits = account_number.chars().filter(|c| c.is_ascii_digit()).count();
    let mut remaining = digits;
    account_number
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                remaining -= 1;
                if remaining >= 4 {
                    return '*';
                }
            }
            c
        })
        .collect()
}
