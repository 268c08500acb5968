//! Drives the router in-process against the in-memory store.

use agrigo_marketplace::{
    api::{self, AppState},
    identity::{JwtIdentity, Role},
    publisher::EventPublisher,
    store::{MemoryStore, UserProfile},
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct User {
    id: Uuid,
    token: String,
}

fn user(role: &str) -> User {
    let id = Uuid::now_v7();
    let claims = json!({"userID": id, "role": role, "name": role, "exp": chrono::Utc::now().timestamp() + 3600});
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    User { id, token }
}

async fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), Arc::new(JwtIdentity::new(SECRET)), EventPublisher::disabled());
    (api::router(state), store)
}

async fn call(app: &Router, method: Method, uri: &str, who: Option<&User>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(u) = who {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", u.token));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn list_product(app: &Router, farmer: &User, name: &str, price: f64, quantity: u32) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/products",
        Some(farmer),
        Some(json!({"name": name, "description": "fresh", "price": price, "quantity": quantity, "unit": "kg", "category": "vegetables"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["product"]["id"].as_str().unwrap().to_string()
}

fn order_body(lines: &[(&str, u32)]) -> Value {
    json!({
        "products": lines.iter().map(|(id, q)| json!({"productId": id, "quantity": q})).collect::<Vec<_>>(),
        "deliveryAddress": {"street": "22 Canal Road", "city": "Nagpur", "pincode": "440001"},
        "paymentMethod": "cash"
    })
}

async fn stock(app: &Router, product_id: &str) -> u64 {
    let (status, body) = call(app, Method::GET, &format!("/products/{product_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["quantity"].as_u64().unwrap()
}

#[tokio::test]
async fn order_lifecycle_over_http() {
    let (app, _) = app().await;
    let farmer = user("farmer");
    let consumer = user("consumer");
    let carrots = list_product(&app, &farmer, "Carrots", 20.0, 10).await;

    let (status, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&carrots, 4)]))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Order created successfully");
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["order"]["totalAmount"].as_f64(), Some(80.0));
    let order_id = body["order"]["id"].as_str().unwrap().to_string();
    assert_eq!(stock(&app, &carrots).await, 6);

    let (status, body) = call(&app, Method::GET, "/orders/consumer", Some(&consumer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::GET, "/orders/farmer", Some(&farmer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], order_id.as_str());

    let (status, _) = call(&app, Method::PUT, &format!("/orders/{order_id}/cancel"), Some(&consumer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock(&app, &carrots).await, 10);

    let (status, body) = call(&app, Method::PUT, &format!("/orders/{order_id}/cancel"), Some(&consumer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only pending orders can be cancelled");
    assert_eq!(stock(&app, &carrots).await, 10);
}

#[tokio::test]
async fn farmer_status_and_payment_updates() {
    let (app, _) = app().await;
    let farmer = user("farmer");
    let rival = user("farmer");
    let consumer = user("consumer");
    let beans = list_product(&app, &farmer, "Beans", 15.0, 5).await;
    let (_, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&beans, 1)]))).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/orders/{order_id}/status");

    let (status, body) = call(&app, Method::PUT, &status_uri, Some(&rival), Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found or unauthorized");

    let (status, _) = call(&app, Method::PUT, &status_uri, Some(&consumer), Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::PUT, &status_uri, Some(&farmer), Some(json!({"status": "delivered"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::PUT, &status_uri, Some(&farmer), Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "confirmed");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/orders/{order_id}/payment"),
        Some(&farmer),
        Some(json!({"paymentStatus": "paid"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["paymentStatus"], "paid");
    assert_eq!(body["order"]["status"], "confirmed");

    let (status, _) = call(&app, Method::PUT, &format!("/orders/{order_id}/cancel"), Some(&consumer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_reads_are_party_filtered() {
    let (app, store) = app().await;
    let farmer = user("farmer");
    let consumer = user("consumer");
    let stranger = user("consumer");
    store
        .insert_profile(UserProfile {
            id: farmer.id, name: "Lakshmi".into(), email: "lakshmi@example.com".into(), phone: "9800000000".into(),
            role: Role::Farmer, farm_name: Some("Sunrise Farm".into()),
        })
        .await;
    let okra = list_product(&app, &farmer, "Okra", 30.0, 8).await;
    let (_, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&okra, 2)]))).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/orders/{order_id}"), Some(&consumer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer"]["farmName"], "Sunrise Farm");
    assert_eq!(body["productDetails"][0]["name"], "Okra");

    let (status, _) = call(&app, Method::GET, &format!("/orders/{order_id}"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, &format!("/orders/{}", Uuid::now_v7()), Some(&consumer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/orders/farmer", Some(&consumer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_orders_leave_stock_alone() {
    let (app, _) = app().await;
    let farmer_a = user("farmer");
    let farmer_b = user("farmer");
    let consumer = user("consumer");
    let rice = list_product(&app, &farmer_a, "Rice", 50.0, 3).await;
    let millet = list_product(&app, &farmer_b, "Millet", 40.0, 3).await;

    let (status, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&rice, 1), (&millet, 1)]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All products must be from the same farmer");

    let (status, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&rice, 4)]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient quantity for product Rice");

    let missing = Uuid::now_v7().to_string();
    let (status, _) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[(&missing, 1)]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(stock(&app, &rice).await, 3);
    assert_eq!(stock(&app, &millet).await, 3);
}

#[tokio::test]
async fn authentication_and_malformed_bodies() {
    let (app, _) = app().await;
    let consumer = user("consumer");

    let (status, _) = call(&app, Method::GET, "/orders/consumer", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = User { id: consumer.id, token: "not-a-jwt".into() };
    let (status, _) = call(&app, Method::GET, "/orders/consumer", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::POST, "/products", Some(&consumer), Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::POST, "/orders", Some(&consumer), Some(json!({"products": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::POST, "/orders", Some(&consumer), Some(order_body(&[]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("products"));
}

#[tokio::test]
async fn product_update_and_delete_are_owner_only() {
    let (app, _) = app().await;
    let owner = user("farmer");
    let other = user("farmer");
    let apples = list_product(&app, &owner, "Apples", 120.0, 12).await;
    let uri = format!("/products/{apples}");

    let (status, _) = call(&app, Method::PUT, &uri, Some(&other), Some(json!({"price": 1}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::PUT, &uri, Some(&owner), Some(json!({"isAvailable": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["isAvailable"], false);
    assert_eq!(body["product"]["quantity"], 12);
    assert_eq!(body["product"]["name"], "Apples");

    let (status, body) = call(&app, Method::GET, "/products/farmer/products", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");
    let (status, _) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_and_out_of_range_listings_are_bad_requests() {
    let (app, _) = app().await;
    let farmer = user("farmer");
    let consumer = user("consumer");

    let (status, body) = call(&app, Method::GET, "/products/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let (status, body) = call(&app, Method::PUT, "/orders/42/cancel", Some(&consumer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let listing = |price: f64, quantity: u64| {
        json!({"name": "Rice", "description": "Sona masoori", "price": price, "quantity": quantity})
    };
    let (status, body) = call(&app, Method::POST, "/products", Some(&farmer), Some(listing(60.0, 3_000_000_000))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("quantity"));

    let (status, _) = call(&app, Method::POST, "/products", Some(&farmer), Some(listing(10.005, 5))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::POST, "/products", Some(&farmer), Some(listing(1e10, 5))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}
