//! HTTP-level tests against the router with an in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use comic_store::{
    api::{self, auth::{USER_ID_HEADER, USER_ROLE_HEADER}, AppState},
    domain::{ComicEdition, Role, User},
    store::MemoryStore,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    store: MemoryStore,
    router: Router,
    buyer: User,
    admin: User,
    edition: ComicEdition,
}

async fn app(stock: i32) -> TestApp {
    let store = MemoryStore::new();
    let buyer = store.seed_user("buyer", Role::User).await;
    let admin = store.seed_user("admin", Role::Admin).await;
    let comic = store.seed_comic("One Piece").await;
    let edition = store.seed_edition(comic.id, "Vol. 100", Decimal::new(1099, 2), stock).await;
    let router = api::router(AppState::new(store.clone()));
    TestApp { store, router, buyer, admin, edition }
}

async fn send(router: &Router, method: &str, uri: &str, user: Option<&User>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.to_string()).header(USER_ROLE_HEADER, user.role.as_str());
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let t = app(1).await;
    let (status, body) = send(&t.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_identity_required() {
    let t = app(1).await;
    let (status, body) = send(&t.router, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_order_then_overdraw() {
    let t = app(5).await;
    let order = json!({"editionId": t.edition.id, "quantity": 3, "paymentMethod": "COD"});

    let (status, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(order.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(body["data"]["edition"]["stockAvailable"], 2);

    let (status, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["available"], 2);
    assert_eq!(t.store.orders().await.len(), 1);
}

#[tokio::test]
async fn test_create_order_validation() {
    let t = app(5).await;
    let (status, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "editionId is required");

    let (status, _) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": Uuid::now_v7(), "quantity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_and_return() {
    let t = app(5).await;
    let (_, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 2}))).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{id}/status");

    let (status, body) = send(&t.router, "PUT", &uri, Some(&t.buyer), Some(json!({"status": "LOST"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validStatuses"].as_array().map(Vec::len), Some(5));

    let stranger = User { id: Uuid::now_v7(), ..t.buyer.clone() };
    let (status, _) = send(&t.router, "PUT", &uri, Some(&stranger), Some(json!({"status": "SHIPPING"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for next in ["SHIPPING", "BACK"] {
        let (status, body) = send(&t.router, "PUT", &uri, Some(&t.admin), Some(json!({"status": next}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], next);
    }
    assert_eq!(t.store.edition(t.edition.id).await.unwrap().stock_available, 5);

    let (status, _) = send(&t.router, "PUT", &format!("/api/orders/{}/status", Uuid::now_v7()), Some(&t.admin), Some(json!({"status": "BACK"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_listing_pagination() {
    let t = app(50).await;
    for _ in 0..12 {
        send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 1}))).await;
    }

    let (status, body) = send(&t.router, "GET", "/api/orders?page=2&limit=5", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["totalCount"], 12);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["hasNext"], true);
    assert_eq!(body["hasPrev"], true);

    let (_, body) = send(&t.router, "GET", "/api/orders?page=abc&limit=0", Some(&t.buyer), None).await;
    assert_eq!((body["currentPage"].clone(), body["count"].clone()), (json!(1), json!(10)));

    let (_, body) = send(&t.router, "GET", "/api/orders/pending", Some(&t.admin), None).await;
    assert_eq!(body["totalCount"], 12);
    let (_, body) = send(&t.router, "GET", "/api/orders/returned", Some(&t.admin), None).await;
    assert_eq!(body["totalCount"], 0);

    let (status, _) = send(&t.router, "GET", "/api/orders?status=WHATEVER", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_listing_extreme_page() {
    let t = app(5).await;
    send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 1}))).await;

    let (status, body) = send(&t.router, "GET", "/api/orders?page=9223372036854775807&limit=9223372036854775807", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["currentPage"], i64::MAX);
    assert_eq!(body["hasNext"], false);
    assert_eq!(body["hasPrev"], true);
}

#[tokio::test]
async fn test_cancellation_flow() {
    let t = app(5).await;
    let (_, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 1}))).await;
    let order_id = body["data"]["id"].clone();

    let (status, _) = send(&t.router, "POST", "/api/cancellation-requests", Some(&t.buyer), Some(json!({"orderId": order_id}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&t.router, "POST", "/api/cancellation-requests", Some(&t.buyer), Some(json!({"orderId": order_id, "reason": "wrong volume"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["decision"], 0);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/cancellation-requests/{id}");

    let (status, _) = send(&t.router, "PUT", &uri, Some(&t.buyer), Some(json!({"decision": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&t.router, "PUT", &uri, Some(&t.admin), Some(json!({"decision": 1, "replyContent": "ok"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["decision"], 1);
    assert!(body["data"]["replyAt"].is_string());
    assert_eq!(body["data"]["order"]["status"], "PENDING");
    assert_eq!(body["data"]["order"]["comic"]["title"], "One Piece");
    assert_eq!(body["data"]["user"]["username"], "buyer");

    let (_, body) = send(&t.router, "GET", "/api/cancellation-requests/user", Some(&t.buyer), None).await;
    assert_eq!(body["totalCount"], 1);
    let (status, _) = send(&t.router, "GET", &format!("/api/cancellation-requests/user/{}", t.admin.id), Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = send(&t.router, "GET", &format!("/api/cancellation-requests/user/{}", t.buyer.id), Some(&t.admin), None).await;
    assert_eq!(body["totalCount"], 1);

    let (status, _) = send(&t.router, "DELETE", &uri, Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(t.store.cancellations().await.is_empty());
}

#[tokio::test]
async fn test_cart_endpoints() {
    let t = app(4).await;
    let add = json!({"editionId": t.edition.id, "quantity": 2});
    let (status, body) = send(&t.router, "POST", "/api/cart", Some(&t.buyer), Some(add.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&t.router, "POST", "/api/cart", Some(&t.buyer), Some(add.clone())).await;
    assert_eq!(body["data"]["quantity"], 4);
    let (status, body) = send(&t.router, "POST", "/api/cart", Some(&t.buyer), Some(add)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["available"], 4);

    let (_, body) = send(&t.router, "GET", "/api/cart", Some(&t.buyer), None).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["totalAmount"], json!(Decimal::new(4396, 2)));

    let (status, _) = send(&t.router, "PUT", &format!("/api/cart/{item_id}"), Some(&t.buyer), Some(json!({"quantity": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&t.router, "PUT", &format!("/api/cart/{item_id}"), Some(&t.buyer), Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&t.router, "DELETE", "/api/cart", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(t.store.cart_items().await.is_empty());
}

#[tokio::test]
async fn test_edition_lock_and_admin_routes() {
    let t = app(4).await;
    let uri = format!("/api/editions/{}", t.edition.id);

    let (status, _) = send(&t.router, "PUT", &uri, Some(&t.buyer), Some(json!({"name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.router, "PUT", &uri, Some(&t.admin), Some(json!({"name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");

    send(&t.router, "POST", "/api/cart", Some(&t.buyer), Some(json!({"editionId": t.edition.id}))).await;
    let (status, _) = send(&t.router, "DELETE", &uri, Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&t.router, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/editions",
        Some(&t.admin),
        Some(json!({"comicId": t.edition.comic_id, "name": "Vol. 101", "price": 11.5, "pageCount": 200, "stockAvailable": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["stockAvailable"], 3);
}

#[tokio::test]
async fn test_delete_user() {
    let t = app(4).await;
    send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 1}))).await;
    let uri = format!("/api/users/{}", t.buyer.id);

    let (status, _) = send(&t.router, "DELETE", &uri, Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&t.router, "DELETE", &uri, Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(t.store.user(t.buyer.id).await.is_none());
    assert_eq!(t.store.orders().await.len(), 1);

    let (status, _) = send(&t.router, "DELETE", &uri, Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statistics_routes() {
    let t = app(10).await;
    let (_, body) = send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 2}))).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let created_at = body["data"]["createdAt"].as_str().unwrap().to_string();
    send(&t.router, "PUT", &format!("/api/orders/{id}/status"), Some(&t.admin), Some(json!({"status": "SUCCESS"}))).await;
    send(&t.router, "POST", "/api/orders", Some(&t.buyer), Some(json!({"editionId": t.edition.id, "quantity": 1}))).await;

    let (status, _) = send(&t.router, "GET", "/api/statistics/overview", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.router, "GET", "/api/statistics/overview", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pendingOrders"], 1);
    assert_eq!(body["data"]["successOrders"], 1);
    assert_eq!(body["data"]["totalComics"], 1);
    assert_eq!(body["data"]["totalUsers"], 2);

    let day = &created_at[..10];
    let (status, body) = send(&t.router, "GET", &format!("/api/statistics/revenue/daily?date={day}"), Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let buckets = body["data"].as_array().unwrap();
    assert_eq!(buckets.len(), 24);
    let total: Decimal = buckets.iter().map(|b| b["value"].as_str().unwrap().parse::<Decimal>().unwrap()).sum();
    assert_eq!(total, Decimal::new(2198, 2));

    let (_, body) = send(&t.router, "GET", "/api/statistics/revenue/yearly?year=2001", Some(&t.admin), None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(12));
    let (_, body) = send(&t.router, "GET", "/api/statistics/revenue/weekly", Some(&t.admin), None).await;
    assert_eq!(body["data"][0]["label"], "Mon");
    let (_, body) = send(&t.router, "GET", "/api/statistics/revenue/all", Some(&t.admin), None).await;
    assert_eq!(body["data"]["yearly"].as_array().map(Vec::len), Some(12));

    let (status, _) = send(&t.router, "GET", "/api/statistics/revenue/monthly?month=13", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&t.router, "GET", "/api/statistics/revenue/daily?date=yesterday", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
