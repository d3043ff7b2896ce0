// Transaction lookup tools

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::batch::DEFAULT_PAGE_SIZE;
use super::{object_schema, parse_arguments, required_strings, send_and_handle, Tool, ToolContext};
use crate::gateway::client::{encode_path_segment, with_query};
use crate::gateway::constants::endpoints;
use crate::gateway::{Envelope, ResponseShape};

fn paging_properties() -> Value {
    json!({
        "limit": {"type": "integer", "default": DEFAULT_PAGE_SIZE, "description": "Number of results to return (default: 20)."},
        "offset": {"type": "integer", "default": 0, "description": "Number of results to skip (default: 0)."}
    })
}

fn with_paging(mut properties: Value) -> Value {
    if let (Some(target), Value::Object(paging)) = (properties.as_object_mut(), paging_properties()) {
        target.extend(paging);
    }
    properties
}

fn limit_param(limit: Option<u32>) -> Option<String> {
    Some(limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string())
}

fn offset_param(offset: Option<u32>) -> Option<String> {
    offset.filter(|o| *o > 0).map(|o| o.to_string())
}

#[derive(Debug, Deserialize)]
struct ListTransactionsArgs {
    from_date: Option<String>,
    to_date: Option<String>,
    status: Option<String>,
    amount: Option<u64>,
    reference: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub struct ListTransactionsTool;

#[async_trait]
impl Tool for ListTransactionsTool {
    fn name(&self) -> &'static str {
        "fat_zebra_list_transactions"
    }

    fn description(&self) -> &'static str {
        "List transactions in Fat Zebra, optionally filtered by date range, status, amount or reference."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            with_paging(json!({
                "from_date": {"type": "string", "description": "Start date (YYYY-MM-DD)."},
                "to_date": {"type": "string", "description": "End date (YYYY-MM-DD)."},
                "status": {"type": "string", "description": "Filter by transaction status."},
                "amount": {"type": "integer", "description": "Filter by amount in cents."},
                "reference": {"type": "string", "description": "Filter by transaction reference."}
            })),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: ListTransactionsArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let path = with_query(
            endpoints::PURCHASES,
            &[
                ("from", args.from_date),
                ("to", args.to_date),
                ("status", args.status),
                ("amount", args.amount.filter(|a| *a > 0).map(|a| a.to_string())),
                ("reference", args.reference),
                ("limit", limit_param(args.limit)),
                ("offset", offset_param(args.offset)),
            ],
        );
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchRefundsArgs {
    transaction_id: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
    reference: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub struct SearchRefundsTool;

#[async_trait]
impl Tool for SearchRefundsTool {
    fn name(&self) -> &'static str {
        "fat_zebra_search_refunds"
    }

    fn description(&self) -> &'static str {
        "Search refunds in Fat Zebra by transaction, date range or reference."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            with_paging(json!({
                "transaction_id": {"type": "string", "description": "Filter by the original transaction ID."},
                "from_date": {"type": "string", "description": "Start date (YYYY-MM-DD)."},
                "to_date": {"type": "string", "description": "End date (YYYY-MM-DD)."},
                "reference": {"type": "string", "description": "Filter by refund reference."}
            })),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: SearchRefundsArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let path = with_query(
            endpoints::REFUNDS,
            &[
                ("transaction_id", args.transaction_id),
                ("from", args.from_date),
                ("to", args.to_date),
                ("reference", args.reference),
                ("limit", limit_param(args.limit)),
                ("offset", offset_param(args.offset)),
            ],
        );
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct TransactionStatusArgs {
    transaction_id: Option<String>,
    reference: Option<String>,
}

/// Look a purchase up by id, or by reference when no id is given
pub struct TransactionStatusTool;

#[async_trait]
impl Tool for TransactionStatusTool {
    fn name(&self) -> &'static str {
        "fat_zebra_transaction_status"
    }

    fn description(&self) -> &'static str {
        "Check the status of a transaction in Fat Zebra by transaction ID or reference."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "transaction_id": {"type": "string", "description": "The ID of the transaction to query."},
                "reference": {"type": "string", "description": "The reference of the transaction to query."}
            }),
            &[],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: TransactionStatusArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let transaction_id = args.transaction_id.filter(|id| !id.is_empty());
        let reference = args.reference.filter(|r| !r.is_empty());
        let path = match (transaction_id, reference) {
            (Some(id), _) => format!("{}/{}", endpoints::PURCHASES, encode_path_segment(&id)),
            (None, Some(reference)) => with_query(endpoints::PURCHASES, &[("reference", Some(reference))]),
            (None, None) => {
                return Envelope::validation_error(vec!["Either transaction_id or reference is required.".to_string()]);
            }
        };
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}

#[derive(Debug, Deserialize)]
struct TransactionHistoryArgs {
    transaction_id: Option<String>,
}

pub struct TransactionHistoryTool;

#[async_trait]
impl Tool for TransactionHistoryTool {
    fn name(&self) -> &'static str {
        "fat_zebra_transaction_history"
    }

    fn description(&self) -> &'static str {
        "Retrieve the event history of a transaction in Fat Zebra."
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "transaction_id": {"type": "string", "description": "The ID of the transaction."}
            }),
            &["transaction_id"],
        )
    }

    async fn execute(&self, ctx: &ToolContext, arguments: Value) -> Envelope {
        let args: TransactionHistoryArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let [transaction_id] = match required_strings([("transaction_id", args.transaction_id)]) {
            Ok(values) => values,
            Err(envelope) => return envelope,
        };

        let path = format!(
            "{}/{}/history",
            endpoints::PURCHASES,
            encode_path_segment(&transaction_id)
        );
        send_and_handle(ctx, &path, Method::GET, None, ResponseShape::Raw).await
    }
}
