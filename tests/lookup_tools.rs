mod common;

use common::{api_path, context, sandbox_config, should_skip_httpmock, FailingTransport};
use fatzebra_mcp::tools::batch::{CreateBatchTool, ListBatchesTool, ReconciliationReportTool};
use fatzebra_mcp::tools::card::{DeleteStoredCardTool, StoreCardTool};
use fatzebra_mcp::tools::customer::{CreateCustomerTool, UpdateCustomerTool};
use fatzebra_mcp::tools::passthrough::PassthroughTool;
use fatzebra_mcp::tools::transaction::{ListTransactionsTool, TransactionHistoryTool, TransactionStatusTool};
use fatzebra_mcp::{GatewayConfig, Tool, ToolContext};
use httpmock::Method::{DELETE, GET, POST, PUT};
use httpmock::MockServer;
use serde_json::json;

fn listing() -> String {
    json!({"successful": true, "response": [{"id": "txn_1"}], "errors": []}).to_string()
}

#[tokio::test]
async fn list_transactions_sends_filters_and_default_limit() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(api_path("/purchases"))
                .query_param("from", "2024-01-01")
                .query_param("status", "Approved")
                .query_param("limit", "20")
                .query_param_missing("offset")
                .query_param_missing("amount");
            then.status(200).header("content-type", "application/json").body(listing());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = ListTransactionsTool
        .execute(&ctx, json!({"from_date": "2024-01-01", "status": "Approved", "offset": 0}))
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap(), json!([{"id": "txn_1"}]));
}

#[tokio::test]
async fn transaction_status_by_reference_uses_query() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/purchases")).query_param("reference", "order-42");
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"id": "txn_42", "reference": "order-42"}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = TransactionStatusTool.execute(&ctx, json!({"reference": "order-42"})).await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap()["id"], json!("txn_42"));
}

#[tokio::test]
async fn transaction_status_needs_an_identifier() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let envelope = TransactionStatusTool.execute(&ctx, json!({})).await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.errors.unwrap(), vec!["Either transaction_id or reference is required."]);
}

#[tokio::test]
async fn transaction_history_hits_history_path() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/purchases/txn_1/history"));
            then.status(200).header("content-type", "application/json").body(listing());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = TransactionHistoryTool.execute(&ctx, json!({"transaction_id": "txn_1"})).await;

    mock.assert_calls(1);
    assert!(envelope.successful);
}

#[tokio::test]
async fn create_batch_uploads_csv_under_generated_filename() {
    if should_skip_httpmock() {
        return;
    }

    let filename = "BATCH-v1-PURCHASE-TEST-20240301-nightly1.csv";
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(api_path(&format!("/batches/{filename}")))
                .header("authorization", "Basic VEVTVDpURVNU")
                .body_includes(format!("filename=\"{filename}\""))
                .body_includes("amount,card_token\n1000,tok_1");
            then.status(201)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"id": "batch_1"}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = CreateBatchTool
        .execute(
            &ctx,
            json!({
                "content": "amount,card_token\n1000,tok_1",
                "batch_type": "purchase",
                "reference": "nightly1",
                "date": "20240301"
            }),
        )
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.status, 201);
    assert_eq!(envelope.response.unwrap()["response"]["id"], json!("batch_1"));
}

#[tokio::test]
async fn create_batch_rejects_malformed_date() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let envelope = CreateBatchTool
        .execute(&ctx, json!({"content": "a,b", "batch_type": "refund", "date": "2024-03-01"}))
        .await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(envelope.errors.unwrap(), vec!["date must be in YYYYMMDD format"]);
}

#[tokio::test]
async fn list_batches_passes_type_filter() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(api_path("/batches"))
                .query_param("batch_type", "direct_debit")
                .query_param("limit", "5")
                .query_param("offset", "10");
            then.status(200).header("content-type", "application/json").body(listing());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = ListBatchesTool
        .execute(&ctx, json!({"batch_type": "direct_debit", "limit": 5, "offset": 10}))
        .await;

    mock.assert_calls(1);
    assert!(envelope.successful);
}

#[tokio::test]
async fn reconciliation_csv_is_returned_as_text() {
    if should_skip_httpmock() {
        return;
    }

    let csv = "date,amount\n2024-03-01,1000\n";
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(api_path("/settlements/2024-03-01"))
                .query_param("format", "csv");
            then.status(200).header("content-type", "text/csv").body(csv);
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = ReconciliationReportTool
        .execute(&ctx, json!({"date": "2024-03-01", "format": "csv"}))
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap(), json!(csv));
}

#[tokio::test]
async fn passthrough_forwards_method_and_body() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(api_path("/purchases/txn_1/settle"))
                .json_body(json!({"note": "manual"}));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"id": "txn_1"}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = PassthroughTool
        .execute(
            &ctx,
            json!({"method": "PUT", "endpoint": "/purchases/txn_1/settle", "body": {"note": "manual"}}),
        )
        .await;

    mock.assert_calls(1);
    assert_eq!(
        envelope.response.unwrap(),
        json!({"successful": true, "response": {"id": "txn_1"}})
    );
}

#[tokio::test]
async fn passthrough_refuses_foreign_hosts() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    for endpoint in ["https://evil.example.com/x", "//evil.example.com", "/purchases/../admin", "purchases"] {
        let envelope = PassthroughTool
            .execute(&ctx, json!({"method": "GET", "endpoint": endpoint}))
            .await;
        assert_eq!(envelope.status, 400, "{endpoint} should be rejected");
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn create_customer_reports_missing_fields() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let envelope = CreateCustomerTool
        .execute(&ctx, json!({"first_name": "Jane", "reference": "cust-1"}))
        .await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(
        envelope.errors.unwrap(),
        vec!["last_name is required", "email_address is required"]
    );
}

#[tokio::test]
async fn update_customer_puts_changed_fields() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(api_path("/customers/cus_1"))
                .json_body(json!({"email": "jane@example.com"}));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"id": "cus_1"}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = UpdateCustomerTool
        .execute(&ctx, json!({"customer_id": "cus_1", "email": "jane@example.com"}))
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap()["id"], json!("cus_1"));
}

#[tokio::test]
async fn store_card_returns_token_projection() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(api_path("/customers/cus_1/cards"))
                .json_body_includes(json!({"card_holder": "Jane Doe", "card_expiry": "05/2026"}).to_string());
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!({
                        "successful": true,
                        "response": {"token": "card_tok_9", "card_type": "VISA", "card_number": "411111XXXXXX1111"}
                    })
                    .to_string(),
                );
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = StoreCardTool
        .execute(
            &ctx,
            json!({
                "customer_id": "cus_1",
                "card_holder": "Jane Doe",
                "card_number": "4111111111111111",
                "card_expiry": "05/2026",
                "card_cvv": "123"
            }),
        )
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap()["card_token"], json!("card_tok_9"));
}

#[tokio::test]
async fn delete_stored_card_targets_card_path() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path(api_path("/customers/cus_1/cards/card_tok_9"));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"deleted": true}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = DeleteStoredCardTool
        .execute(&ctx, json!({"customer_id": "cus_1", "card_token": "card_tok_9"}))
        .await;

    mock.assert_calls(1);
    assert_eq!(envelope.response.unwrap(), json!({"deleted": true}));
}

#[tokio::test]
async fn missing_identifiers_are_reported_together() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let delete = DeleteStoredCardTool.execute(&ctx, json!({})).await;
    assert_eq!(delete.status, 400);
    assert_eq!(
        delete.errors.unwrap(),
        vec!["customer_id is required", "card_token is required"]
    );

    let batch = CreateBatchTool.execute(&ctx, json!({"reference": "nightly1"})).await;
    assert_eq!(
        batch.errors.unwrap(),
        vec!["content is required", "batch_type is required"]
    );

    let history = TransactionHistoryTool.execute(&ctx, json!({"transaction_id": "   "})).await;
    assert_eq!(history.errors.unwrap(), vec!["transaction_id is required"]);

    let update = UpdateCustomerTool.execute(&ctx, json!({"email": "jane@example.com"})).await;
    assert_eq!(update.errors.unwrap(), vec!["customer_id is required"]);

    let passthrough = PassthroughTool.execute(&ctx, json!({"body": {"note": "manual"}})).await;
    assert_eq!(
        passthrough.errors.unwrap(),
        vec!["method is required", "endpoint is required"]
    );

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn delete_stored_card_trims_identifiers() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path(api_path("/customers/cus_1/cards/card_tok_9"));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"deleted": true}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = DeleteStoredCardTool
        .execute(&ctx, json!({"customer_id": " cus_1 ", "card_token": "card_tok_9\n"}))
        .await;

    mock.assert_calls(1);
    assert!(envelope.successful);
}
