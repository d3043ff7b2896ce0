// Batch and settlement tools

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::client::{encode_path_segment, with_query};
use crate::gateway::constants::endpoints;
use crate::gateway::{handle_response, Envelope, ResponseShape};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

const BATCH_FILE_VERSION: &str = "v1";
const BATCH_REFERENCE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    Purchase,
    Refund,
    DirectDebit,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Refund => "refund",
            Self::DirectDebit => "direct_debit",
        }
    }

    /// Token used in batch file names
    pub fn file_token(&self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Refund => "REFUND",
            Self::DirectDebit => "DIRECTDEBIT",
        }
    }
}

/// `BATCH-v1-<TYPE>-<username>-<YYYYMMDD>-<reference>.csv`
pub fn batch_filename(batch_type: BatchType, username: &str, date: &str, reference: &str) -> String {
    format!(
        "BATCH-{}-{}-{}-{}-{}.csv",
        BATCH_FILE_VERSION,
        batch_type.file_token(),
        username,
        date,
        reference
    )
}

fn random_batch_reference() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..BATCH_REFERENCE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn is_compact_date(date: &str) -> bool {
    date.len() == 8 && date.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Deserialize)]
struct CreateBatchArgs {
    /// CSV document to upload
    content: Option<String>,
    batch_type: Option<BatchType>,
    reference: Option<String>,
    date: Option<String>,
    username: Option<String>,
}

pub struct CreateBatchTool;

#[async_trait]
impl Tool for CreateBatchTool {
    fn name(&self) -> &'static str {
        "fat_zebra_create_batch"
    }

    fn description(&self) -> &'static str {
        "Initiate a batch settlement by uploading CSV content to Fat Zebra. Accepts batch_type (purchase, refund, direct_debit)."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "content": {"type": "string", "description": "The CSV content to upload."},
                "batch_type": {"type": "string", "enum": ["purchase", "refund", "direct_debit"], "description": "The type of batch: purchase, refund, or direct_debit."},
                "reference": {"type": "string", "description": "Optional reference for the batch filename."},
                "date": {"type": "string", "description": "Optional date in YYYYMMDD format for the batch filename."},
                "username": {"type": "string", "description": "Optional override for merchant username in the batch filename."}
            }),
            &["content", "batch_type"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: CreateBatchArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [content, _] = match required_strings([
            ("content", args.content),
            ("batch_type", args.batch_type.map(|t| t.as_str().to_string())),
        ]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };
        let Some(batch_type) = args.batch_type else {
            return Envelope::validation_error(vec!["batch_type is required".to_string()]);
        };

        let date = match args.date.filter(|d| !d.is_empty()) {
            Some(date) if !is_compact_date(&date) => {
                return Envelope::validation_error(vec!["date must be in YYYYMMDD format".to_string()]);
            }
            Some(date) => date,
            None => Utc::now().format("%Y%m%d").to_string(),
        };
        let username = args
            .username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ctx.client.username().to_string());
        let reference = args
            .reference
            .filter(|r| !r.is_empty())
            .unwrap_or_else(random_batch_reference);

        let filename = batch_filename(batch_type, &username, &date, &reference);
        let endpoint = format!("{}/{}", endpoints::BATCHES, encode_path_segment(&filename));
        info!(batch_type = batch_type.as_str(), filename = %filename, "Creating batch");

        match ctx.client.upload_csv(&endpoint, &filename, content).await {
            Ok(reply) => handle_response(&reply, ResponseShape::Document),
            Err(e) => Envelope::internal_error(&e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListBatchesArgs {
    from_date: Option<String>,
    to_date: Option<String>,
    batch_type: Option<BatchType>,
    status: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub struct ListBatchesTool;

#[async_trait]
impl Tool for ListBatchesTool {
    fn name(&self) -> &'static str {
        "fat_zebra_list_batches"
    }

    fn description(&self) -> &'static str {
        "List batches in Fat Zebra, optionally filtered by date range, type or status."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "from_date": {"type": "string", "description": "Start date (YYYY-MM-DD)."},
                "to_date": {"type": "string", "description": "End date (YYYY-MM-DD)."},
                "batch_type": {"type": "string", "enum": ["purchase", "refund", "direct_debit"], "description": "Filter by batch type."},
                "status": {"type": "string", "description": "Filter by batch status."},
                "limit": {"type": "integer", "default": DEFAULT_PAGE_SIZE, "description": "Number of results to return (default: 20)."},
                "offset": {"type": "integer", "default": 0, "description": "Number of results to skip (default: 0)."}
            }),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: ListBatchesArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let path = with_query(
            endpoints::BATCHES,
            &[
                ("from", args.from_date),
                ("to", args.to_date),
                ("batch_type", args.batch_type.map(|t| t.as_str().to_string())),
                ("status", args.status),
                ("limit", Some(args.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string())),
                ("offset", args.offset.filter(|o| *o > 0).map(|o| o.to_string())),
            ],
        );
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct BatchDetailsArgs {
    batch_id: Option<String>,
}

pub struct BatchDetailsTool;

#[async_trait]
impl Tool for BatchDetailsTool {
    fn name(&self) -> &'static str {
        "fat_zebra_batch_details"
    }

    fn description(&self) -> &'static str {
        "Retrieve details of a specific batch in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "batch_id": {"type": "string", "description": "The ID of the batch to retrieve details for."}
            }),
            &["batch_id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: BatchDetailsArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [batch_id] = match required_strings([("batch_id", args.batch_id)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };

        let path = format!("{}/{}", endpoints::BATCHES, encode_path_segment(&batch_id));
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
struct ReconciliationArgs {
    date: Option<String>,
    format: Option<ReportFormat>,
}

/// Settlement report for one day, as JSON or raw CSV text
pub struct ReconciliationReportTool;

#[async_trait]
impl Tool for ReconciliationReportTool {
    fn name(&self) -> &'static str {
        "fat_zebra_reconciliation_report"
    }

    fn description(&self) -> &'static str {
        "Retrieve a settlement reconciliation report for a given date from Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "date": {"type": "string", "description": "The settlement date (YYYY-MM-DD)."},
                "format": {"type": "string", "enum": ["json", "csv"], "description": "The format of the report: json or csv (default: json)"}
            }),
            &["date"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: ReconciliationArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [date] = match required_strings([("date", args.date)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };

        let format = args.format.unwrap_or_default();
        let path = with_query(
            &format!("{}/{}", endpoints::SETTLEMENTS, encode_path_segment(&date)),
            &[(
                "format",
                args.format.map(|f| match f {
                    ReportFormat::Json => "json".to_string(),
                    ReportFormat::Csv => "csv".to_string(),
                }),
            )],
        );
        let shape = match format {
            ReportFormat::Csv => ResponseShape::Document,
            ReportFormat::Json => ResponseShape::Raw,
        };
        send_and_handle(ctx, &path, Method::GET, None, shape).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_filename_convention() {
        assert_eq!(
            batch_filename(BatchType::DirectDebit, "TEST", "20240101", "abc123"),
            "BATCH-v1-DIRECTDEBIT-TEST-20240101-abc123.csv"
        );
    }

    #[test]
    fn test_random_batch_reference_shape() {
        let reference = random_batch_reference();
        assert_eq!(reference.len(), BATCH_REFERENCE_LEN);
        assert!(reference.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_unknown_batch_type_rejected() {
        let err = parse_arguments::<CreateBatchArgs>(json!({"content": "a,b", "batch_type": "payout"})).unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_compact_date_check() {
        assert!(is_compact_date("20240131"));
        assert!(!is_compact_date("2024-01-31"));
    }
}
