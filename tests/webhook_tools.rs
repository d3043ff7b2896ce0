mod common;

use common::{api_path, context, sandbox_config, should_skip_httpmock, FailingTransport};
use fatzebra_mcp::tools::webhook::{
    CreateWebhookTool, DeleteWebhookTool, ListWebhooksTool, TestWebhookTool, WEBHOOKS_UNAVAILABLE,
};
use fatzebra_mcp::{GatewayConfig, Tool, ToolContext};
use httpmock::Method::{DELETE, GET, POST};
use httpmock::MockServer;
use serde_json::json;

#[tokio::test]
async fn list_webhooks_reports_unavailable_on_404() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let availability = server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/web_hooks"));
            then.status(404).header("content-type", "text/html").body("<h1>Not Found</h1>");
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = ListWebhooksTool.execute(&ctx, json!({})).await;

    availability.assert_calls(1);
    assert_eq!(
        envelope.to_json(),
        json!({
            "successful": false,
            "status": 404,
            "response": null,
            "errors": [WEBHOOKS_UNAVAILABLE]
        })
    );
}

#[tokio::test]
async fn list_webhooks_reuses_availability_reply() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let availability = server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/web_hooks"));
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!({
                        "successful": true,
                        "response": [{"id": "wh_1", "name": "orders", "address": "https://shop.example.com/hooks"}],
                        "errors": []
                    })
                    .to_string(),
                );
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = ListWebhooksTool.execute(&ctx, json!({})).await;

    availability.assert_calls(1);
    assert!(envelope.successful);
    assert_eq!(envelope.response.unwrap()[0]["id"], json!("wh_1"));
}

#[tokio::test]
async fn create_webhook_checks_availability_then_posts() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    let availability = server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/web_hooks"));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": []}).to_string());
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(api_path("/web_hooks")).json_body(json!({
                "address": "https://shop.example.com/hooks",
                "name": "orders",
                "mode": "Test",
                "events": ["purchase.success"]
            }));
            then.status(201)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"id": "wh_2", "name": "orders"}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = CreateWebhookTool
        .execute(
            &ctx,
            json!({
                "address": "https://shop.example.com/hooks",
                "name": "orders",
                "mode": "Test",
                "events": ["purchase.success"]
            }),
        )
        .await;

    availability.assert_calls(1);
    create.assert_calls(1);
    assert_eq!(envelope.status, 201);
    assert_eq!(envelope.response.unwrap()["id"], json!("wh_2"));
}

#[tokio::test]
async fn create_webhook_rejects_bad_address_before_network() {
    let transport = FailingTransport::new("unreachable");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let envelope = CreateWebhookTool
        .execute(
            &ctx,
            json!({"address": "not a url", "name": "orders", "mode": "Live", "events": ["purchase.success"]}),
        )
        .await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(envelope.status, 400);
    assert!(envelope.errors.unwrap()[0].starts_with("address must be a valid URL"));
}

#[tokio::test]
async fn delete_webhook_is_skipped_when_unavailable() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/web_hooks"));
            then.status(404);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path(api_path("/web_hooks/wh_1"));
            then.status(200);
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = DeleteWebhookTool.execute(&ctx, json!({"id": "wh_1"})).await;

    delete.assert_calls(0);
    assert_eq!(envelope.status, 404);
    assert_eq!(envelope.errors.unwrap(), vec![WEBHOOKS_UNAVAILABLE]);
}

#[tokio::test]
async fn test_webhook_posts_to_test_endpoint() {
    if should_skip_httpmock() {
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(api_path("/web_hooks"));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": []}).to_string());
        })
        .await;
    let fire = server
        .mock_async(|when, then| {
            when.method(POST).path(api_path("/web_hooks/wh_1/test"));
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"successful": true, "response": {"delivered": true}}).to_string());
        })
        .await;

    let ctx = context(sandbox_config(&server));
    let envelope = TestWebhookTool.execute(&ctx, json!({"id": "wh_1"})).await;

    fire.assert_calls(1);
    assert_eq!(envelope.response.unwrap(), json!({"delivered": true}));
}

#[tokio::test]
async fn availability_transport_failure_is_500() {
    let transport = FailingTransport::new("Network error");
    let ctx = ToolContext::with_transport(GatewayConfig::default(), transport.clone());

    let envelope = ListWebhooksTool.execute(&ctx, json!({})).await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(envelope.status, 500);
    assert_eq!(envelope.errors.unwrap(), vec!["Network error"]);
}
