//! Integration tests for stock management and complaints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p ration-tds-api)
//!
//! Run with: cargo test -p ration-tds-integration-tests -- --ignored

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use ration_tds_core::Role;
use ration_tds_integration_tests::TestContext;

async fn seed_shop(ctx: &TestContext, id: &str) {
    sqlx::query("INSERT INTO shops (id, name) VALUES ($1, $1) ON CONFLICT (id) DO NOTHING")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .expect("failed to seed shop");
}

fn quantity(item: &Value) -> Decimal {
    item["quantity"]
        .as_str()
        .expect("quantity should be a string")
        .parse()
        .expect("quantity should be numeric")
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn stock_deltas_are_clamped_at_zero() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-STOCK").await;

    let admin = ctx
        .seed_user("stock-admin@test.example", Role::Admin, None, None, None)
        .await;
    let admin_token = ctx.token_for(&admin);

    // Government allocation creates the line with 50 kg
    let resp = ctx
        .client
        .post(ctx.url("/api/stocks/allocate"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "shopId": "SHOP-STOCK",
            "itemCode": "rice",
            "name": "Rice",
            "quantity": "50"
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let keeper = ctx
        .seed_user(
            "stock-keeper@test.example",
            Role::Shopkeeper,
            Some("SHOP-STOCK"),
            None,
            None,
        )
        .await;
    let keeper_token = ctx.token_for(&keeper);

    // Subtracting more than is there clamps to zero instead of going negative
    let resp = ctx
        .client
        .post(ctx.url("/api/stocks/update"))
        .bearer_auth(&keeper_token)
        .json(&json!({ "itemCode": "rice", "delta": "-1000" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let item: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(quantity(&item), Decimal::ZERO);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn admin_corrections_show_up_in_the_audit_trail() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-AUDIT").await;

    let admin = ctx
        .seed_user("audit-admin@test.example", Role::Admin, None, None, None)
        .await;
    let admin_token = ctx.token_for(&admin);

    let resp = ctx
        .client
        .post(ctx.url("/api/stocks/allocate"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "shopId": "SHOP-AUDIT",
            "itemCode": "wheat",
            "name": "Wheat",
            "quantity": "30"
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .patch(ctx.url("/api/stocks/wheat"))
        .bearer_auth(&admin_token)
        .json(&json!({ "shopId": "SHOP-AUDIT", "quantity": "25" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let audit: Vec<Value> = ctx
        .client
        .get(ctx.url("/api/stocks/audit/SHOP-AUDIT"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON body");

    assert!(
        audit
            .iter()
            .any(|e| e["changeType"] == json!("admin_correction")),
        "correction missing from audit trail"
    );
    assert!(
        audit
            .iter()
            .any(|e| e["changeType"] == json!("government_allocation")),
        "allocation missing from audit trail"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn complaints_move_through_their_lifecycle() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-COMPLAINT").await;

    let holder = ctx
        .seed_user(
            "complaint-holder@test.example",
            Role::Cardholder,
            Some("SHOP-COMPLAINT"),
            None,
            None,
        )
        .await;
    let holder_token = ctx.token_for(&holder);

    let resp = ctx
        .client
        .post(ctx.url("/api/complaints"))
        .bearer_auth(&holder_token)
        .json(&json!({
            "subject": "Short weighing",
            "description": "Received 9 kg against a 10 kg entitlement"
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let complaint: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(complaint["status"], json!("open"));
    // Defaults to the caller's shop
    assert_eq!(complaint["shopId"], json!("SHOP-COMPLAINT"));
    let id = complaint["id"].as_i64().expect("id");

    let keeper = ctx
        .seed_user(
            "complaint-keeper@test.example",
            Role::Shopkeeper,
            Some("SHOP-COMPLAINT"),
            None,
            None,
        )
        .await;
    let keeper_token = ctx.token_for(&keeper);

    let resp = ctx
        .client
        .patch(ctx.url(&format!("/api/complaints/{id}")))
        .bearer_auth(&keeper_token)
        .json(&json!({ "status": "resolved" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let mine: Vec<Value> = ctx
        .client
        .get(ctx.url("/api/complaints/my"))
        .bearer_auth(&holder_token)
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON body");

    let updated = mine
        .iter()
        .find(|c| c["id"].as_i64() == Some(id))
        .expect("complaint should be listed");
    assert_eq!(updated["status"], json!("resolved"));
}
