// Request builder
//
// Turns typed tool inputs into the JSON bodies the Fat Zebra API expects.
// Every function here is pure: no I/O, no logging. Optional fields that were
// not supplied are left out of the body entirely.

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::constants::{endpoints, fields, test_data, DIRECT_DEBIT_DESCRIPTION_MAX};

/// A request body keyed by canonical field names
pub type RequestBody = Map<String, Value>;

const REFERENCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const REFERENCE_SUFFIX_LEN: usize = 6;

/// Generate a practically unique reference: `<prefix><unix millis>-<random base36>`
pub fn generate_reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("{}{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Insert a string field only when it carries a non-empty value
pub fn insert_str(body: &mut RequestBody, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Fields shared by every purchase-style request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentDetails {
    /// Smallest currency unit, e.g. 1000 for $10.00
    pub amount: Option<u64>,
    pub currency: Option<String>,
    pub reference: Option<String>,
    pub customer_ip: Option<String>,
    pub customer_email: Option<String>,
    pub capture: Option<bool>,
    pub card_holder: Option<String>,
}

/// Raw card details for card-present flows
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardDetails {
    pub card_number: Option<String>,
    /// MM/YYYY
    pub card_expiry: Option<String>,
    pub card_cvv: Option<String>,
}

impl CardDetails {
    pub fn is_empty(&self) -> bool {
        non_empty(&self.card_number).is_none()
    }

    /// In test mode, a request without a card number is charged against the
    /// sandbox test card. Supplied cards are never replaced.
    pub fn with_sandbox_fallback(self, test_mode: bool) -> Self {
        if !test_mode || !self.is_empty() {
            return self;
        }
        Self {
            card_number: Some(test_data::CARD_NUMBER.to_string()),
            card_expiry: Some(test_data::CARD_EXPIRY.to_string()),
            card_cvv: non_empty(&self.card_cvv)
                .map(str::to_string)
                .or_else(|| Some(test_data::CARD_CVV.to_string())),
        }
    }
}

/// Stored-card details for tokenized flows, after input normalisation
#[derive(Debug, Clone, Default)]
pub struct TokenDetails {
    pub card_token: Option<String>,
    pub card_cvv: Option<String>,
}

impl TokenDetails {
    /// Collapse the two accepted CVV spellings into the canonical one.
    /// `card_cvv` wins over the legacy `cvv` when both are supplied.
    pub fn from_aliases(card_token: Option<String>, card_cvv: Option<String>, cvv: Option<String>) -> Self {
        let card_cvv = card_cvv.filter(|v| !v.is_empty()).or(cvv.filter(|v| !v.is_empty()));
        Self { card_token, card_cvv }
    }
}

/// Bank account details for a direct debit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectDebitDetails {
    pub amount: Option<u64>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub account_name: Option<String>,
    pub bsb: Option<String>,
    pub account_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_ip: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl DirectDebitDetails {
    /// Fill missing account details with sandbox values in test mode
    pub fn with_sandbox_fallback(mut self, test_mode: bool) -> Self {
        if !test_mode {
            return self;
        }
        if non_empty(&self.account_name).is_none() {
            self.account_name = Some(test_data::ACCOUNT_NAME.to_string());
        }
        if non_empty(&self.bsb).is_none() {
            self.bsb = Some(test_data::BSB.to_string());
        }
        if non_empty(&self.account_number).is_none() {
            self.account_number = Some(test_data::ACCOUNT_NUMBER.to_string());
        }
        self
    }
}

/// Refund of a previous purchase
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundDetails {
    pub transaction_id: Option<String>,
    pub amount: Option<u64>,
    pub reference: Option<String>,
}

/// One variant per purchase-style flow. Each variant knows its endpoint, its
/// required fields and how to render itself into a request body.
#[derive(Debug, Clone)]
pub enum PaymentFlow {
    CardPresent {
        details: PaymentDetails,
        card: CardDetails,
    },
    Tokenized {
        details: PaymentDetails,
        token: TokenDetails,
    },
    ThreeDSecure {
        details: PaymentDetails,
        card: CardDetails,
        return_url: Option<String>,
        fraud_detection_enabled: Option<bool>,
    },
    DirectDebit(DirectDebitDetails),
    Refund(RefundDetails),
}

impl PaymentFlow {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::CardPresent { .. } | Self::Tokenized { .. } | Self::ThreeDSecure { .. } => endpoints::PURCHASES,
            Self::DirectDebit(_) => endpoints::DIRECT_DEBITS,
            Self::Refund(_) => endpoints::REFUNDS,
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::CardPresent { .. } => &[
                fields::AMOUNT,
                fields::CURRENCY,
                fields::REFERENCE,
                fields::CARD_NUMBER,
                fields::CARD_EXPIRY,
                fields::CARD_CVV,
            ],
            Self::Tokenized { .. } => &[
                fields::AMOUNT,
                fields::CURRENCY,
                fields::REFERENCE,
                fields::CARD_TOKEN,
            ],
            Self::ThreeDSecure { .. } => &[
                fields::AMOUNT,
                fields::CURRENCY,
                fields::REFERENCE,
                fields::CARD_NUMBER,
                fields::CARD_EXPIRY,
                fields::CARD_CVV,
                fields::CARD_HOLDER,
                fields::CUSTOMER_IP,
                "return_url",
            ],
            Self::DirectDebit(_) => &[
                fields::AMOUNT,
                "description",
                fields::REFERENCE,
                "account_name",
                "bsb",
                "account_number",
            ],
            Self::Refund(_) => &[fields::TRANSACTION_ID, fields::AMOUNT, fields::REFERENCE],
        }
    }

    pub fn reference_prefix(&self) -> &'static str {
        match self {
            Self::CardPresent { .. } => "ref-",
            Self::Tokenized { .. } => "token-",
            Self::ThreeDSecure { .. } => "3DS-",
            Self::DirectDebit(_) => "dd-",
            Self::Refund(_) => "refund-",
        }
    }

    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::CardPresent { details, .. }
            | Self::Tokenized { details, .. }
            | Self::ThreeDSecure { details, .. } => details.amount,
            Self::DirectDebit(dd) => dd.amount,
            Self::Refund(refund) => refund.amount,
        }
    }

    pub fn into_body(self) -> RequestBody {
        let prefix = self.reference_prefix();
        match self {
            Self::CardPresent { details, card } => {
                let mut body = build_base_payment_request(&details, prefix);
                add_card_details(&mut body, &card);
                body
            }
            Self::Tokenized { details, token } => {
                let mut body = build_base_payment_request(&details, prefix);
                add_token_details(&mut body, &token);
                body
            }
            Self::ThreeDSecure {
                details,
                card,
                return_url,
                fraud_detection_enabled,
            } => {
                let mut body = build_base_payment_request(&details, prefix);
                add_card_details(&mut body, &card);
                insert_str(&mut body, "return_url", return_url.as_deref());
                if let Some(enabled) = fraud_detection_enabled {
                    body.insert("fraud_detection_enabled".to_string(), Value::Bool(enabled));
                }
                body.insert("extra".to_string(), three_ds_extra());
                body
            }
            Self::DirectDebit(dd) => build_direct_debit_request(dd, prefix),
            Self::Refund(refund) => {
                let mut body = RequestBody::new();
                insert_str(&mut body, fields::TRANSACTION_ID, refund.transaction_id.as_deref());
                if let Some(amount) = refund.amount {
                    body.insert(fields::AMOUNT.to_string(), Value::from(amount));
                }
                let reference = non_empty(&refund.reference)
                    .map(str::to_string)
                    .unwrap_or_else(|| generate_reference(prefix));
                body.insert(fields::REFERENCE.to_string(), Value::String(reference));
                body
            }
        }
    }
}

/// Build the common purchase body: amount, reference, currency and any
/// supplied optional customer fields
pub fn build_base_payment_request(details: &PaymentDetails, reference_prefix: &str) -> RequestBody {
    let mut body = RequestBody::new();

    if let Some(amount) = details.amount {
        body.insert(fields::AMOUNT.to_string(), Value::from(amount));
    }

    let reference = non_empty(&details.reference)
        .map(str::to_string)
        .unwrap_or_else(|| generate_reference(reference_prefix));
    body.insert(fields::REFERENCE.to_string(), Value::String(reference));

    let currency = non_empty(&details.currency).unwrap_or(test_data::CURRENCY);
    body.insert(fields::CURRENCY.to_string(), Value::String(currency.to_string()));

    insert_str(&mut body, fields::CARD_HOLDER, details.card_holder.as_deref());
    insert_str(&mut body, fields::CUSTOMER_IP, details.customer_ip.as_deref());
    insert_str(&mut body, fields::CUSTOMER_EMAIL, details.customer_email.as_deref());

    if let Some(capture) = details.capture {
        body.insert(fields::CAPTURE.to_string(), Value::Bool(capture));
    }

    body
}

/// Merge raw card details into an existing body
pub fn add_card_details(body: &mut RequestBody, card: &CardDetails) {
    insert_str(body, fields::CARD_NUMBER, card.card_number.as_deref());
    insert_str(body, fields::CARD_EXPIRY, card.card_expiry.as_deref());
    insert_str(body, fields::CARD_CVV, card.card_cvv.as_deref());
}

/// Merge a stored card token into an existing body
pub fn add_token_details(body: &mut RequestBody, token: &TokenDetails) {
    insert_str(body, fields::CARD_TOKEN, token.card_token.as_deref());
    insert_str(body, fields::CARD_CVV, token.card_cvv.as_deref());
}

/// Body for registering a card with the gateway vault
pub fn build_tokenization_request(card: &CardDetails, card_holder: Option<&str>) -> RequestBody {
    let mut body = RequestBody::new();
    add_card_details(&mut body, card);
    insert_str(&mut body, fields::CARD_HOLDER, card_holder);
    body
}

fn build_direct_debit_request(dd: DirectDebitDetails, reference_prefix: &str) -> RequestBody {
    let mut body = RequestBody::new();

    if let Some(amount) = dd.amount {
        body.insert(fields::AMOUNT.to_string(), Value::from(amount));
    }

    let description = dd
        .description
        .as_deref()
        .map(|d| d.chars().take(DIRECT_DEBIT_DESCRIPTION_MAX).collect::<String>());
    insert_str(&mut body, "description", description.as_deref());

    let reference = non_empty(&dd.reference)
        .map(str::to_string)
        .unwrap_or_else(|| generate_reference(reference_prefix));
    body.insert(fields::REFERENCE.to_string(), Value::String(reference));

    insert_str(&mut body, "account_name", dd.account_name.as_deref());
    let bsb = dd.bsb.as_deref().map(normalize_bsb);
    insert_str(&mut body, "bsb", bsb.as_deref());
    insert_str(&mut body, "account_number", dd.account_number.as_deref());

    insert_str(&mut body, fields::CUSTOMER_IP, dd.customer_ip.as_deref());
    insert_str(&mut body, "customer_name", dd.customer_name.as_deref());
    insert_str(&mut body, fields::CUSTOMER_EMAIL, dd.customer_email.as_deref());
    if let Some(metadata) = dd.metadata {
        body.insert("metadata".to_string(), Value::Object(metadata));
    }

    body
}

/// Six bare digits become `XXX-XXX`; anything else passes through untouched
pub fn normalize_bsb(bsb: &str) -> String {
    if !bsb.contains('-') && bsb.len() == 6 && bsb.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}", &bsb[..3], &bsb[3..])
    } else {
        bsb.to_string()
    }
}

/// Sandbox 3-D Secure authentication values
fn three_ds_extra() -> Value {
    json!({
        "sli": "05",
        "cavv": "MzM2OGI2ZjkwYjYwY2FjODQ3ZWU=",
        "xid": "ZGUzNzgwYzQxM2ZlMWM0MzVkMjc=",
        "par": "Y",
        "ver": "Y",
        "directory_server_txn_id": "5ddb4c13-2e30-4901-9854-5f0305097a25",
        "threeds_version": "2.1.0"
    })
}
