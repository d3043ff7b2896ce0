// Fat Zebra API constants
//
// Canonical field names, sandbox test data and endpoint paths shared by the
// request builder, the response handler and every tool.

/// Canonical request and response field names
pub mod fields {
    // Card details
    pub const CARD_NUMBER: &str = "card_number";
    pub const CARD_EXPIRY: &str = "card_expiry";
    pub const CARD_CVV: &str = "card_cvv";
    pub const CARD_HOLDER: &str = "card_holder";
    pub const CARD_TOKEN: &str = "card_token";

    // Transaction details
    pub const AMOUNT: &str = "amount";
    pub const CURRENCY: &str = "currency";
    pub const REFERENCE: &str = "reference";
    pub const CUSTOMER_IP: &str = "customer_ip";
    pub const CUSTOMER_EMAIL: &str = "customer_email";
    pub const CAPTURE: &str = "capture";

    // Response fields
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const AUTHORIZATION: &str = "response_code";
    pub const MESSAGE: &str = "message";
    pub const TIMESTAMP: &str = "transaction_date";

    // Envelope fields
    pub const ERRORS: &str = "errors";
    pub const SUCCESSFUL: &str = "successful";
}

/// Known-good sandbox data, substituted only in test mode
pub mod test_data {
    /// Mastercard test card that returns APPROVED
    pub const CARD_NUMBER: &str = "5123456789012346";
    pub const CARD_EXPIRY: &str = "05/2026";
    pub const CARD_CVV: &str = "123";
    pub const CARD_HOLDER: &str = "Test User";
    pub const CURRENCY: &str = "AUD";
    pub const CUSTOMER_IP: &str = "127.0.0.1";

    pub const ACCOUNT_NAME: &str = "Test Account";
    pub const BSB: &str = "000-000";
    pub const ACCOUNT_NUMBER: &str = "12345678";
}

/// API endpoint paths, relative to the configured base URL
pub mod endpoints {
    pub const PURCHASES: &str = "/purchases";
    pub const REFUNDS: &str = "/refunds";
    pub const DIRECT_DEBITS: &str = "/direct_debits";
    pub const CREDIT_CARDS: &str = "/credit_cards";
    pub const CUSTOMERS: &str = "/customers";
    pub const BATCHES: &str = "/batches";
    pub const SETTLEMENTS: &str = "/settlements";
    pub const WEB_HOOKS: &str = "/web_hooks";
}

/// Username that marks sandbox credentials
pub const TEST_USERNAME: &str = "TEST";

pub const DEFAULT_BASE_URL: &str = "https://gateway.pmnts-sandbox.io/v1.0";

pub const UNKNOWN_GATEWAY_ERROR: &str = "Unknown error from Fat Zebra API";

/// Maximum length the gateway accepts for a direct debit description
pub const DIRECT_DEBIT_DESCRIPTION_MAX: usize = 18;
