use actix_web::{http::StatusCode, test::TestRequest};
use freshlink_engine::{FanoutService, MarketplaceDatabase};
use serde_json::json;

use super::helpers::{authed, json_body, seeded_db, send_request, tomorrow, SUPPLIER_TOKEN, VENDOR_TOKEN};

fn order_request() -> serde_json::Value {
    json!({
        "supplier_id": "s-1",
        "items": [{ "product_id": "P1", "quantity": 3 }],
        "delivery_address": "12 Harbour Rd",
        "delivery_date": tomorrow().to_string(),
    })
}

#[actix_web::test]
async fn create_order_commits_and_decrements_stock() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let req = authed(TestRequest::post().uri("/api/orders"), VENDOR_TOKEN).set_json(order_request());
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json_body(&body);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotal"], 12_000);
    assert_eq!(order["delivery_fee"], 5_000);
    assert_eq!(order["total"], 17_000);
    assert_eq!(order["payment_method"], "cash");
    assert_eq!(order["payment_status"], "pending");
    assert!(order["order_id"].as_str().unwrap().starts_with("FL-"));

    let product = db.fetch_product(&"P1".into()).await.unwrap().unwrap();
    assert_eq!(product.quantity, 7);
}

#[actix_web::test]
async fn requests_without_a_token_are_unauthorized() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let req = TestRequest::post().uri("/api/orders").set_json(order_request());
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn validation_failures_list_every_problem() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let bad = json!({
        "supplier_id": "nobody",
        "items": [],
        "delivery_address": "  ",
    });
    let req = authed(TestRequest::post().uri("/api/orders"), VENDOR_TOKEN).set_json(bad);
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = json_body(&body);
    assert_eq!(errors["errors"].as_array().unwrap().len(), 4);
}

#[actix_web::test]
async fn oversized_orders_conflict() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let big = json!({
        "supplier_id": "s-1",
        "items": [{ "product_id": "P1", "quantity": 99 }],
        "delivery_address": "12 Harbour Rd",
        "delivery_date": tomorrow().to_string(),
    });
    let req = authed(TestRequest::post().uri("/api/orders"), VENDOR_TOKEN).set_json(big);
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    // Nothing was reserved.
    assert_eq!(db.fetch_product(&"P1".into()).await.unwrap().unwrap().quantity, 10);
}

#[actix_web::test]
async fn the_supplier_drives_the_lifecycle_over_http() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let req = authed(TestRequest::post().uri("/api/orders"), VENDOR_TOKEN).set_json(order_request());
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = json_body(&body)["order_id"].as_str().unwrap().to_string();

    // The supplier sees the order on their side.
    let req = authed(TestRequest::get().uri("/api/orders"), SUPPLIER_TOKEN);
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);

    // Accepting stamps the estimated delivery time.
    let uri = format!("/api/orders/{order_id}/status");
    let req = authed(TestRequest::post().uri(&uri), SUPPLIER_TOKEN).set_json(json!({ "new_status": "accepted" }));
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let accepted = json_body(&body);
    assert_eq!(accepted["status"], "accepted");
    assert!(!accepted["estimated_delivery_at"].is_null());

    // A vendor may not accept, reject or progress an order.
    let req = authed(TestRequest::post().uri(&uri), VENDOR_TOKEN).set_json(json!({ "new_status": "preparing" }));
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for next in ["preparing", "in-transit"] {
        let req = authed(TestRequest::post().uri(&uri), SUPPLIER_TOKEN).set_json(json!({ "new_status": next }));
        let (status, _) = send_request(&db, &fanout, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    // Cancelling an in-transit order is off the table.
    let req = authed(TestRequest::post().uri(&uri), VENDOR_TOKEN)
        .set_json(json!({ "new_status": "cancelled", "reason": "too late" }));
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let req = authed(TestRequest::get().uri(&format!("/api/orders/{order_id}")), VENDOR_TOKEN);
    let (_, body) = send_request(&db, &fanout, req).await;
    assert_eq!(json_body(&body)["status"], "in-transit");

    // Deliver, then rate once.
    let req = authed(TestRequest::post().uri(&uri), SUPPLIER_TOKEN).set_json(json!({ "new_status": "delivered" }));
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!json_body(&body)["delivered_at"].is_null());

    let rating_uri = format!("/api/orders/{order_id}/rating");
    let req = authed(TestRequest::post().uri(&rating_uri), VENDOR_TOKEN)
        .set_json(json!({ "stars": 4, "review": "Great produce" }));
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["rating"]["stars"], 4);

    // The second rating attempt conflicts and the first stays.
    let req = authed(TestRequest::post().uri(&rating_uri), VENDOR_TOKEN).set_json(json!({ "stars": 1 }));
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let req = authed(TestRequest::get().uri(&format!("/api/orders/{order_id}")), VENDOR_TOKEN);
    let (_, body) = send_request(&db, &fanout, req).await;
    assert_eq!(json_body(&body)["rating"]["stars"], 4);
}

#[actix_web::test]
async fn checkout_reports_partial_success() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let cart = json!({
        "items": [
            { "product_id": "P1", "name": "heirloom tomatoes", "quantity": 3, "unit_price": 4_000, "supplier_id": "s-1" },
            { "product_id": "P2", "name": "line-caught snapper", "quantity": 99, "unit_price": 9_900, "supplier_id": "s-2" }
        ],
        "delivery_address": "12 Harbour Rd",
        "delivery_date": tomorrow().to_string(),
    });
    let req = authed(TestRequest::post().uri("/api/checkout"), VENDOR_TOKEN).set_json(cart);
    let (status, body) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json_body(&body);
    assert_eq!(result["orders"].as_array().unwrap().len(), 1);
    assert_eq!(result["orders"][0]["supplier_id"], "s-1");
    let failures = result["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["supplier_id"], "s-2");
    assert!(!failures[0]["reasons"].as_array().unwrap().is_empty());
    // The committed group stands; the failed group's stock is untouched.
    assert_eq!(db.fetch_product(&"P1".into()).await.unwrap().unwrap().quantity, 7);
    assert_eq!(db.fetch_product(&"P2".into()).await.unwrap().unwrap().quantity, 3);
}

#[actix_web::test]
async fn outsiders_cannot_read_someone_elses_order() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let req = authed(TestRequest::post().uri("/api/orders"), VENDOR_TOKEN).set_json(order_request());
    let (_, body) = send_request(&db, &fanout, req).await;
    let order_id = json_body(&body)["order_id"].as_str().unwrap().to_string();

    let req = authed(TestRequest::get().uri(&format!("/api/orders/{order_id}")), "s-2:supplier");
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn suppliers_manage_only_their_own_catalog() {
    let _ = env_logger::try_init();
    let db = seeded_db().await;
    let fanout = FanoutService::new(16);
    let product = json!({
        "id": "P9",
        "supplier_id": "s-1",
        "name": "wild rocket",
        "unit_price": 1_200,
        "quantity": 40,
        "is_available": true,
    });
    // A vendor has no catalog.
    let req = authed(TestRequest::post().uri("/api/products"), VENDOR_TOKEN).set_json(product.clone());
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The wrong supplier cannot touch s-1's catalog.
    let req = authed(TestRequest::post().uri("/api/products"), "s-2:supplier").set_json(product.clone());
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = authed(TestRequest::post().uri("/api/products"), SUPPLIER_TOKEN).set_json(product);
    let (status, _) = send_request(&db, &fanout, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(db.fetch_product(&"P9".into()).await.unwrap().is_some());
}
