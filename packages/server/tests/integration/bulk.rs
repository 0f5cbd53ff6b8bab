use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use hierarchy_server::entity::asset;

use crate::common::{TestApp, routes};

async fn asset_count(app: &TestApp) -> u64 {
    asset::Entity::find().count(&app.db).await.unwrap()
}

#[tokio::test]
async fn json_batch_builds_two_tiers() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    // Children listed before their organization still resolve.
    let res = app
        .post_with_token(
            routes::BULK,
            &json!({"assets": [
                {"asset_name": "Plant A", "asset_type": "plant", "parent": "Acme", "start_date": "2024-01-01"},
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Line 1", "asset_type": "line", "parent": "Plant A", "start_date": "2024-01-01", "hierarchy_level": 2},
            ]}),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["message"], "Bulk upload successful");
    assert_eq!(res.body["count"], 3);

    let orgs = app.get_with_token(routes::ASSETS, &token).await;
    assert_eq!(orgs.names(), vec!["Acme"]);
    let org_id = orgs.body["data"][0]["id"].as_i64().unwrap() as i32;
    let tree = app.get_with_token(&routes::children(org_id), &token).await;
    assert_eq!(tree.names(), vec!["Plant A", "Line 1"]);
}

#[tokio::test]
async fn bare_array_is_accepted() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!([{"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"}]),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["count"], 1);
}

#[tokio::test]
async fn child_before_its_non_root_parent_is_unresolved() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!({"assets": [
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Line 1", "asset_type": "line", "parent": "Plant A", "start_date": "2024-01-01"},
                {"asset_name": "Plant A", "asset_type": "plant", "parent": "Acme", "start_date": "2024-01-01"},
            ]}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "UNRESOLVED_PARENT");
    assert_eq!(res.body["error"]["row"], 2);
    assert_eq!(res.body["error"]["parent"], "Plant A");
    // Without atomic mode the organization stays.
    assert_eq!(asset_count(&app).await, 1);
}

#[tokio::test]
async fn atomic_mode_rolls_back_the_whole_batch() {
    let app = TestApp::spawn_with(|config| config.ingest.atomic = true).await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!({"assets": [
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Plant A", "asset_type": "plant", "parent": "Acme", "start_date": "2024-01-01"},
                {"asset_name": "Ghost", "asset_type": "line", "parent": "Nowhere", "start_date": "2024-01-01"},
            ]}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["row"], 3);
    assert_eq!(asset_count(&app).await, 0);
}

#[tokio::test]
async fn invalid_row_reports_position_and_field() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!([
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Plant A", "asset_type": "plant", "parent": "Acme", "start_date": "01/02/2024"},
            ]),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(res.body["error"]["row"], 2);
    assert_eq!(res.body["error"]["field"], "start_date");
    assert_eq!(asset_count(&app).await, 0);
}

#[tokio::test]
async fn csv_upload_is_normalized() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();
    let csv = "\u{feff}asset_name,asset_type,parent,start_date,is_active,hierarchy_level,location,building\n\
               Acme,organization,,2024-01-01,,,,\n\
               Plant A , PLANT ,Acme,2024-01-01,no,1,North,B2\n";

    let res = app
        .upload_with_token(routes::BULK, "assets.csv", csv.as_bytes().to_vec(), &token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["count"], 2);

    let plants = app
        .get_with_token(&format!("{}?asset_type=plant", routes::ASSETS), &token)
        .await;
    let plant = &plants.body["data"][0];
    assert_eq!(plant["asset_name"], "Plant A");
    assert_eq!(plant["is_active"], false);
    assert_eq!(plant["hierarchy_level"], 1);
    assert_eq!(plant["details"]["building"], "B2");
}

#[tokio::test]
async fn csv_without_required_header_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .upload_with_token(
            routes::BULK,
            "assets.csv",
            b"name,asset_type\nAcme,organization\n".to_vec(),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["field"], "asset_name");
}

#[tokio::test]
async fn referenced_duplicate_name_is_ambiguous() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!([
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Plant A", "asset_type": "plant", "parent": "Acme", "start_date": "2024-01-01"},
            ]),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "AMBIGUOUS_PARENT");
    assert_eq!(res.body["error"]["parent"], "Acme");
    assert_eq!(asset_count(&app).await, 0);
}

#[tokio::test]
async fn empty_and_unsupported_bodies_are_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let res = app
        .post_with_token(routes::BULK, &json!({"assets": []}), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["detail"], "No assets provided");

    let res = app
        .client
        .post(format!("http://{}{}", app.addr, routes::BULK))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "text/plain")
        .body("Acme,organization")
        .send()
        .await
        .expect("Failed to send POST request");
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn row_limit_is_enforced() {
    let app = TestApp::spawn_with(|config| config.ingest.max_rows = 1).await;
    let token = app.admin_token();

    let res = app
        .post_with_token(
            routes::BULK,
            &json!([
                {"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"},
                {"asset_name": "Globex", "asset_type": "organization", "start_date": "2024-01-01"},
            ]),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(asset_count(&app).await, 0);
}

#[tokio::test]
async fn bulk_requires_write_capability() {
    let app = TestApp::spawn().await;
    let reader = app.token("viewer", &["asset:read"]);

    let res = app
        .post_with_token(
            routes::BULK,
            &json!([{"asset_name": "Acme", "asset_type": "organization", "start_date": "2024-01-01"}]),
            &reader,
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let app = TestApp::spawn_with(|config| config.ingest.max_upload_bytes = 64).await;
    let token = app.admin_token();
    let rows: Vec<_> = (0..10)
        .map(|i| json!({"asset_name": format!("Org {i}"), "asset_type": "organization", "start_date": "2024-01-01"}))
        .collect();

    let res = app
        .post_with_token(routes::BULK, &json!({"assets": rows}), &token)
        .await;
    assert_eq!(res.status, 413, "{}", res.text);
    assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(asset_count(&app).await, 0);

    let csv = "asset_name,asset_type,start_date\n".to_string()
        + &"Acme,organization,2024-01-01\n".repeat(10);
    let res = app
        .upload_with_token(routes::BULK, "assets.csv", csv.into_bytes(), &token)
        .await;
    assert_eq!(res.status, 413, "{}", res.text);
}
