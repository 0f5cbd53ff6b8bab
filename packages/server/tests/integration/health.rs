use crate::common::{TestApp, routes};

#[tokio::test]
async fn liveness_needs_no_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::LIVENESS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "alive");
}

#[tokio::test]
async fn readiness_reports_ready_with_a_live_database() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::READINESS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ready");
}

#[tokio::test]
async fn every_response_carries_a_trace_id() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::LIVENESS).await;
    let trace_id = res.trace_id.expect("X-Trace-ID header");
    assert!(uuid::Uuid::parse_str(&trace_id).is_ok());
}

#[tokio::test]
async fn incoming_trace_id_is_reused_in_header_and_error_body() {
    let app = TestApp::spawn().await;
    let trace_id = "6f1c2b9e-3d4a-4f5b-8c7d-9e0f1a2b3c4d";

    let res = app
        .client
        .get(format!("http://{}{}", app.addr, routes::ASSETS))
        .header("X-Trace-ID", trace_id)
        .send()
        .await
        .expect("Failed to send GET request");
    let res = crate::common::TestResponse::from_response(res).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.trace_id.as_deref(), Some(trace_id));
    assert_eq!(res.body["trace_id"], trace_id);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["status_code"], 401);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/assets/"].is_object());
    assert!(res.body["paths"]["/api/assets/bulk/"].is_object());
}
