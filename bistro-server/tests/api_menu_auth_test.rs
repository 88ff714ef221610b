//! Menu, auth, analytics and health routes

mod common;

use chrono::Utc;
use common::{PASSWORD, TestApp};
use http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::UserType;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_flow() {
    let app = TestApp::new().await;
    app.create_user("chef@bistro.test", UserType::Kitchen).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "chef@bistro.test", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_type"], "KITCHEN");
    assert_eq!(body["email"], "chef@bistro.test");
    assert!(body["auth_token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "chef@bistro.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required.");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "chef@bistro.test", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials.");
}

#[tokio::test]
async fn test_customers_cannot_log_in() {
    let app = TestApp::new().await;
    app.create_user("guest@bistro.test", UserType::Customer).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "guest@bistro.test", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Customers do not require authentication.");
}

#[tokio::test]
async fn test_register_is_admin_only() {
    let app = TestApp::new().await;
    let payload = json!({ "email": "new@bistro.test", "user_type": "KITCHEN" });

    let (status, _) = app
        .request(Method::POST, "/api/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let kitchen = app.kitchen_token().await;
    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&kitchen),
            Some(payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(&admin),
            Some(payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "new@bistro.test");
    assert_eq!(body["user_type"], "KITCHEN");
    assert!(body.get("hashed_password").is_none());

    let (status, body) = app
        .request(Method::POST, "/api/auth/register", Some(&admin), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8002);
}

#[tokio::test]
async fn test_menu_reads_are_public_and_writes_need_kitchen() {
    let app = TestApp::new().await;
    let ids = app.seed_menu(&["12.00"]).await;

    let (status, body) = app.request(Method::GET, "/api/menu/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["price"], "12.00");
    assert_eq!(body[0]["category"]["name"], "Mains");

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/menu/items/{}", ids[0]),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.kitchen_token().await;
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/menu/items/{}", ids[0]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request(Method::GET, &format!("/api/menu/items/{}", ids[0]), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);
}

#[tokio::test]
async fn test_menu_item_crud() {
    let app = TestApp::new().await;
    let token = app.kitchen_token().await;

    let (status, category) = app
        .request(
            Method::POST,
            "/api/menu/categories",
            Some(&token),
            Some(json!({ "name": "Drinks" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_i64().unwrap();

    let (status, item) = app
        .request(
            Method::POST,
            "/api/menu/items",
            Some(&token),
            Some(json!({
                "name": "Lemonade",
                "price": "3.5",
                "category_id": category_id,
                "order_count": 500
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["price"], "3.50");
    assert_eq!(item["is_available"], true);
    assert_eq!(item["order_count"], 0);
    let item_uri = format!("/api/menu/items/{}", item["id"]);

    let (status, item) = app
        .request(
            Method::PATCH,
            &item_uri,
            Some(&token),
            Some(json!({ "is_available": false, "description": "Fresh" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["is_available"], false);
    assert_eq!(item["description"], "Fresh");
    assert_eq!(item["name"], "Lemonade");

    let (status, body) = app
        .request(
            Method::PUT,
            &item_uri,
            Some(&token),
            Some(json!({ "name": "Lemonade", "category_id": category_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "price is required");

    let (status, body) = app
        .request(
            Method::PATCH,
            &item_uri,
            Some(&token),
            Some(json!({ "price": "-1.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6002);

    let (status, body) = app
        .request(
            Method::PATCH,
            &item_uri,
            Some(&token),
            Some(json!({ "category_id": 4040 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "category_id");

    // deleting the category removes its items
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/menu/categories/{category_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::GET, &item_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_validation() {
    let app = TestApp::new().await;
    let token = app.kitchen_token().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/menu/categories",
            Some(&token),
            Some(json!({ "name": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7);

    let (status, body) = app
        .request(Method::GET, "/api/menu/categories/abc", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6101);
}

#[tokio::test]
async fn test_menu_analytics_is_admin_only() {
    let app = TestApp::new().await;
    let ids = app.seed_menu(&["1.00", "2.00"]).await;
    app.create_order(&[ids[1], ids[1], ids[0]]).await;

    let kitchen = app.kitchen_token().await;
    let (status, _) = app
        .request(Method::GET, "/api/menu/analytics", Some(&kitchen), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(Method::GET, "/api/menu/analytics?period=week", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let item = &body["most_purchased_item"];
    assert_eq!(item["id"], ids[1]);
    assert_eq!(item["name"], "Dish 1");
    assert_eq!(item["price"], "2.00");
    assert_eq!(item["is_available"], true);
    assert_eq!(item["category"]["name"], "Mains");
    assert!(item["description"].is_null());
    assert!(item["image"].is_null());
    assert_eq!(item["order_count"], 2);
    assert_eq!(item["cancelled_order_count"], 0);
    assert_eq!(body["total_cancelled_orders"], 0);

    let (status, body) = app
        .request(Method::GET, "/api/menu/analytics?period=day", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["most_purchased_item"]["category"]["name"], "Mains");
}

#[tokio::test]
async fn test_dashboard_analytics() {
    let app = TestApp::new().await;
    let ids = app.seed_menu(&["1.00", "2.00"]).await;

    let (status, _) = app.request(Method::GET, "/api/analytics", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.kitchen_token().await;
    let (_, body) = app
        .request(Method::GET, "/api/analytics/menu-popularity", Some(&token), None)
        .await;
    assert_eq!(body["total_items_ordered"], 0);
    assert_eq!(body["popular_items"], json!([]));
    assert!(body["message"].is_string());

    app.create_order(&[ids[0], ids[0], ids[1]]).await;
    app.create_order(&[ids[1]]).await;

    let (status, body) = app
        .request(Method::GET, "/api/analytics", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_orders"], 2);
    assert_eq!(body["active_orders"], 2);
    assert_eq!(body["menu_items"], 2);

    let before = Utc::now().date_naive().to_string();
    let (status, body) = app
        .request(Method::GET, "/api/analytics/weekly-sales", Some(&token), None)
        .await;
    let after = Utc::now().date_naive().to_string();
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    assert!(body.get("sales").is_none());
    let sales = body["weekly_sales"].as_object().unwrap();
    assert_eq!(sales.len(), 7);
    assert_eq!(sales.values().filter_map(|v| v.as_i64()).sum::<i64>(), 2);
    let week_end = body["week_end"].as_str().unwrap();
    assert!(week_end == before || week_end == after);
    assert!(body["week_start"].as_str().unwrap() <= week_end);

    let (_, body) = app
        .request(Method::GET, "/api/analytics/menu-popularity", Some(&token), None)
        .await;
    assert_eq!(body["total_items_ordered"], 4);
    let percentage: Decimal = body["popular_items"][0]["percentage"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(percentage, Decimal::from(50));
}
