use actix_web::{http::StatusCode, test, test::TestRequest, App};
use chrono::{Days, NaiveDate, Utc};
use fl_common::Money;
use freshlink_engine::{
    cart::PricingPolicy,
    db_types::{Product, Role, User},
    events::EventProducers,
    FanoutService,
    InMemoryDatabase,
    MarketplaceDatabase,
    OrderPolicy,
};

use crate::{auth::AUTH_HEADER, server::configure_api};

pub const VENDOR_TOKEN: &str = "v-1:vendor";
pub const SUPPLIER_TOKEN: &str = "s-1:supplier";

pub fn test_policy() -> OrderPolicy {
    OrderPolicy {
        pricing: PricingPolicy {
            flat_delivery_fee: Money::from_cents(5_000),
            free_delivery_threshold: Money::from_cents(50_000),
        },
        estimated_delivery_offset: chrono::Duration::hours(24),
    }
}

/// A marketplace with one vendor, two suppliers and a small catalog: plenty of P1, three P2 at supplier s-2.
pub async fn seeded_db() -> InMemoryDatabase {
    let db = InMemoryDatabase::new();
    db.upsert_user(User { id: "v-1".into(), name: "Harbour Bistro".into(), role: Role::Vendor }).await.unwrap();
    db.upsert_user(User { id: "s-1".into(), name: "Greenfields Produce".into(), role: Role::Supplier })
        .await
        .unwrap();
    db.upsert_user(User { id: "s-2".into(), name: "Bayside Seafood".into(), role: Role::Supplier }).await.unwrap();
    db.upsert_product(Product {
        id: "P1".into(),
        supplier_id: "s-1".into(),
        name: "heirloom tomatoes".into(),
        unit_price: Money::from_cents(4_000),
        quantity: 10,
        is_available: true,
    })
    .await
    .unwrap();
    db.upsert_product(Product {
        id: "P2".into(),
        supplier_id: "s-2".into(),
        name: "line-caught snapper".into(),
        unit_price: Money::from_cents(9_900),
        quantity: 3,
        is_available: true,
    })
    .await
    .unwrap();
    db
}

pub fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Days::new(1)
}

pub fn authed(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((AUTH_HEADER, token))
}

/// Stand up the full `/api` surface against the given backend and fan-out, run one request, and hand back the
/// status and body. The backend and fan-out are shared handles, so state persists across calls within a test.
pub async fn send_request(
    db: &InMemoryDatabase,
    fanout: &FanoutService,
    req: TestRequest,
) -> (StatusCode, String) {
    let db = db.clone();
    let fanout = fanout.clone();
    let app = test::init_service(
        App::new().configure(move |cfg| configure_api(cfg, db, test_policy(), EventProducers::default(), fanout)),
    )
    .await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("response was not JSON ({e}): {body}"))
}
