// Fat Zebra request/response normalisation layer

pub mod client;
pub mod constants;
pub mod redact;
pub mod request;
pub mod response;
pub mod validate;

pub use client::{GatewayClient, GatewayPayload, GatewayReply, Transport};
pub use response::{handle_response, Envelope, ResponseShape};
pub use validate::{validate_request, ValidationResult};
