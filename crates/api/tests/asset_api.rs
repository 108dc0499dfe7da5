//! HTTP-level integration tests for the `/api/v1/assets` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, post_json, put_json, resident_token, staff_token};
use serde_json::json;
use sqlx::PgPool;

fn chair_payload() -> serde_json::Value {
    json!({
        "code": "AST-001",
        "name": "Folding chair",
        "description": "Stackable event chair",
        "asset_type": "item",
        "total_stock": 10,
        "location": "Warehouse B",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_asset_initializes_stock(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let response = post_json(app, "/api/v1/assets", chair_payload(), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Asset created successfully.");
    assert_eq!(body["data"]["available_stock"], 10);
    assert_eq!(body["data"]["borrowed_stock"], 0);
    assert_eq!(body["data"]["status"], "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_asset_requires_token_and_staff_role(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(app.clone(), "/api/v1/assets", chair_payload(), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = resident_token(9);
    let response = post_json(app, "/api/v1/assets", chair_payload(), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_asset_reports_field_errors(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let payload = json!({
        "code": "",
        "name": "Folding chair",
        "asset_type": "vehicle",
        "total_stock": 0,
    });
    let response = post_json(app, "/api/v1/assets", payload, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["errors"]["code"].is_array());
    assert!(body["errors"]["asset_type"].is_array());
    assert!(body["errors"]["total_stock"].is_array());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_code_is_a_validation_error(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let response = post_json(app.clone(), "/api/v1/assets", chair_payload(), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut payload = chair_payload();
    payload["name"] = json!("Another chair");
    let response = post_json(app, "/api/v1/assets", payload, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["errors"]["code"][0], "The code has already been taken.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_unknown_asset_is_404(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let response = get(app, "/api/v1/assets/999", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], serde_json::Value::Null);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_assets_filters_and_pages(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    post_json(app.clone(), "/api/v1/assets", chair_payload(), Some(&token)).await;
    let hall = json!({
        "code": "HALL-01",
        "name": "Community hall",
        "asset_type": "room",
        "total_stock": 1,
    });
    post_json(app.clone(), "/api/v1/assets", hall, Some(&token)).await;

    let response = get(app.clone(), "/api/v1/assets?asset_type=room", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Community hall");

    // Listing requires a token.
    let response = get(app, "/api/v1/assets", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn asset_report_is_public(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    post_json(app.clone(), "/api/v1/assets", chair_payload(), Some(&token)).await;

    let response = get(app, "/api/v1/assets/report", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["summary"]["total_assets"], 1);
    assert_eq!(body["data"]["summary"]["total_stock"], 10);
    assert_eq!(body["data"]["group_by_type"]["item"]["total_assets"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_cannot_shrink_below_borrowed(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let response = post_json(app.clone(), "/api/v1/assets", chair_payload(), Some(&token)).await;
    let asset_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Borrow 4 units.
    let loan = json!({
        "asset_id": asset_id,
        "resident_id": 1,
        "quantity": 4,
        "loan_date": "2026-03-02",
        "planned_return_date": "2026-03-09",
    });
    let response = post_json(app.clone(), "/api/v1/asset-loans", loan, Some(&token)).await;
    let loan_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    post_json(
        app.clone(),
        &format!("/api/v1/asset-loans/{loan_id}/approve"),
        json!({}),
        Some(&token),
    )
    .await;

    let response = put_json(
        app.clone(),
        &format!("/api/v1/assets/{asset_id}"),
        json!({ "total_stock": 3 }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Shrinking to exactly the borrowed amount recomputes available.
    let response = put_json(
        app,
        &format!("/api/v1/assets/{asset_id}"),
        json!({ "total_stock": 4 }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["available_stock"], 0);
    assert_eq!(body["data"]["borrowed_stock"], 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_blocked_by_outstanding_loans(pool: PgPool) {
    let app = build_test_app(pool);
    let token = staff_token(1);

    let response = post_json(app.clone(), "/api/v1/assets", chair_payload(), Some(&token)).await;
    let asset_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let loan = json!({
        "asset_id": asset_id,
        "resident_id": 1,
        "quantity": 1,
        "loan_date": "2026-03-02",
        "planned_return_date": "2026-03-09",
    });
    let response = post_json(app.clone(), "/api/v1/asset-loans", loan, Some(&token)).await;
    let loan_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = delete(app.clone(), &format!("/api/v1/assets/{asset_id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Resolve the loan, then deletion deactivates the asset.
    post_json(
        app.clone(),
        &format!("/api/v1/asset-loans/{loan_id}/reject"),
        json!({ "rejected_reason": "event cancelled" }),
        Some(&token),
    )
    .await;

    let response = delete(app.clone(), &format!("/api/v1/assets/{asset_id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "inactive");
}
