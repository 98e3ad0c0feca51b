//! Integration tests for token booking, broadcast scheduling and
//! notification visibility.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (with the
//!   default SHOP001 seed)
//! - The API server running (cargo run -p ration-tds-api)
//!
//! Run with: cargo test -p ration-tds-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use ration_tds_core::{CardType, Role};
use ration_tds_integration_tests::TestContext;

/// Seed a dedicated shop so queue positions are not shared with other tests.
async fn seed_shop(ctx: &TestContext, id: &str) {
    sqlx::query("INSERT INTO shops (id, name) VALUES ($1, $1) ON CONFLICT (id) DO NOTHING")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .expect("failed to seed shop");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn bookings_receive_sequential_queue_positions() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-QUEUE").await;

    let mut positions = Vec::new();
    for i in 1..=3 {
        let user = ctx
            .seed_user(
                &format!("token-queue-{i}@test.example"),
                Role::Cardholder,
                Some("SHOP-QUEUE"),
                Some(CardType::PHH),
                Some(2),
            )
            .await;
        let token = ctx.token_for(&user);

        let resp = ctx
            .client
            .post(ctx.url("/api/tokens"))
            .bearer_auth(&token)
            .json(&json!({}))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.expect("invalid JSON body");
        assert_eq!(body["timeSlot"], json!("10:00 AM"));
        positions.push(body["queuePosition"].as_i64().expect("queuePosition"));
    }

    let start = positions[0];
    assert_eq!(positions, vec![start, start + 1, start + 2]);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn broadcast_issues_tokens_and_notifications_per_cardholder() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-BCAST").await;

    for i in 1..=2 {
        ctx.seed_user(
            &format!("bcast-aay-{i}@test.example"),
            Role::Cardholder,
            Some("SHOP-BCAST"),
            Some(CardType::AAY),
            None,
        )
        .await;
    }
    let keeper = ctx
        .seed_user(
            "bcast-keeper@test.example",
            Role::Shopkeeper,
            Some("SHOP-BCAST"),
            None,
            None,
        )
        .await;
    let keeper_token = ctx.token_for(&keeper);

    let resp = ctx
        .client
        .post(ctx.url("/api/notifications/broadcast/card-type"))
        .bearer_auth(&keeper_token)
        .json(&json!({ "cardType": "AAY" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let tokens: Vec<Value> = resp.json().await.expect("invalid JSON body");
    assert_eq!(tokens.len(), 2);

    // Positions are consecutive and every token carries a time slot
    let positions: Vec<i64> = tokens
        .iter()
        .map(|t| t["queuePosition"].as_i64().expect("queuePosition"))
        .collect();
    assert_eq!(positions[1], positions[0] + 1);
    for t in &tokens {
        let slot = t["timeSlot"].as_str().expect("timeSlot");
        assert!(slot.ends_with("AM") || slot.ends_with("PM"), "slot: {slot}");
    }

    // Each recipient can see a token notification scoped to their shop
    let holder = ctx
        .seed_user(
            "bcast-aay-1@test.example",
            Role::Cardholder,
            Some("SHOP-BCAST"),
            Some(CardType::AAY),
            None,
        )
        .await;
    let holder_token = ctx.token_for(&holder);

    let notifications: Vec<Value> = ctx
        .client
        .get(ctx.url("/api/notifications"))
        .bearer_auth(&holder_token)
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON body");

    assert!(
        notifications.iter().any(|n| n["type"] == json!("token")),
        "expected a token notification for the shop"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn notifications_are_scoped_to_shop_or_global() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-NOTIF-A").await;
    seed_shop(&ctx, "SHOP-NOTIF-B").await;

    let keeper = ctx
        .seed_user(
            "notif-keeper@test.example",
            Role::Shopkeeper,
            Some("SHOP-NOTIF-A"),
            None,
            None,
        )
        .await;
    let keeper_token = ctx.token_for(&keeper);

    let resp = ctx
        .client
        .post(ctx.url("/api/notifications"))
        .bearer_auth(&keeper_token)
        .json(&json!({
            "shopId": "SHOP-NOTIF-A",
            "type": "announcement",
            "message": "Shop A only"
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let outsider = ctx
        .seed_user(
            "notif-outsider@test.example",
            Role::Cardholder,
            Some("SHOP-NOTIF-B"),
            Some(CardType::APL),
            Some(3),
        )
        .await;
    let outsider_token = ctx.token_for(&outsider);

    let notifications: Vec<Value> = ctx
        .client
        .get(ctx.url("/api/notifications"))
        .bearer_auth(&outsider_token)
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON body");

    assert!(
        notifications
            .iter()
            .all(|n| n["message"] != json!("Shop A only")),
        "another shop's notification leaked"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn shopkeepers_cannot_broadcast_for_other_shops() {
    let ctx = TestContext::new().await;
    seed_shop(&ctx, "SHOP-OWN").await;
    seed_shop(&ctx, "SHOP-OTHER").await;

    let keeper = ctx
        .seed_user(
            "bcast-own-keeper@test.example",
            Role::Shopkeeper,
            Some("SHOP-OWN"),
            None,
            None,
        )
        .await;
    let keeper_token = ctx.token_for(&keeper);

    let resp = ctx
        .client
        .post(ctx.url("/api/notifications/broadcast/card-type"))
        .bearer_auth(&keeper_token)
        .json(&json!({ "cardType": "PHH", "shopId": "SHOP-OTHER" }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
