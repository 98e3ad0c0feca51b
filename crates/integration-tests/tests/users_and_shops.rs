//! Integration tests for admin user-profile edits and shop registration.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p ration-tds-api)
//!
//! Run with: cargo test -p ration-tds-integration-tests -- --ignored

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Value, json};

use ration_tds_core::{CardType, Role};
use ration_tds_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn admin_edits_cardholder_contact_and_card_details() {
    let ctx = TestContext::new().await;
    let admin = ctx
        .seed_user("users-admin@test.example", Role::Admin, None, None, None)
        .await;
    let cardholder = ctx
        .seed_user(
            "users-profile@test.example",
            Role::Cardholder,
            Some("SHOP001"),
            Some(CardType::PHH),
            Some(3),
        )
        .await;
    let admin_token = ctx.token_for(&admin);

    let resp = ctx
        .client
        .patch(ctx.url(&format!("/api/users/{}", cardholder.id)))
        .bearer_auth(&admin_token)
        .json(&json!({
            "mobile": "9876543210",
            "address": "12 Gandhi Road",
            "district": "Thanjavur",
            "pincode": "613001",
            "cardStatus": "active",
            "rationCardNumber": "TN-04-1234567",
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(body["mobile"], json!("9876543210"));
    assert_eq!(body["address"], json!("12 Gandhi Road"));
    assert_eq!(body["district"], json!("Thanjavur"));
    assert_eq!(body["pincode"], json!("613001"));
    assert_eq!(body["cardStatus"], json!("active"));
    assert_eq!(body["rationCardNumber"], json!("TN-04-1234567"));
    // Untouched fields survive a partial update.
    assert_eq!(body["cardType"], json!("PHH"));
    assert_eq!(body["familySize"], json!(3));

    // The detail view reflects the saved profile.
    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/users/{}", cardholder.id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(detail["district"], json!("Thanjavur"));
    assert_eq!(detail["rationCardNumber"], json!("TN-04-1234567"));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn admin_registers_shop_with_contact_details() {
    let ctx = TestContext::new().await;
    let admin = ctx
        .seed_user("shops-admin@test.example", Role::Admin, None, None, None)
        .await;
    let admin_token = ctx.token_for(&admin);

    // Caller-assigned shop codes are unique, so mint a fresh one per run.
    let shop_id = format!("SHOPIT{}", Utc::now().timestamp_millis());

    let resp = ctx
        .client
        .post(ctx.url("/api/shops"))
        .bearer_auth(&admin_token)
        .json(&json!({
            "id": shop_id,
            "name": "Ward 7 Fair Price Shop",
            "address": "Main Bazaar Street",
            "district": "Madurai",
            "contact": "0452-2345678",
            "hours": "9:00 AM - 5:00 PM",
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let shop: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(shop["id"], json!(shop_id));
    assert_eq!(shop["district"], json!("Madurai"));
    assert_eq!(shop["contact"], json!("0452-2345678"));
    assert_eq!(shop["hours"], json!("9:00 AM - 5:00 PM"));

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/shops/{shop_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let fetched: Value = resp.json().await.expect("invalid JSON body");
    assert_eq!(fetched["district"], json!("Madurai"));
    assert_eq!(fetched["hours"], json!("9:00 AM - 5:00 PM"));
}
