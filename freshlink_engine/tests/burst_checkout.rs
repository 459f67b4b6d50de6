//! Concurrency tests: many checkouts racing the same product.

use freshlink_engine::{
    db_types::{Actor, LineRequest, Money, NewOrder, Product, Role, User},
    events::EventProducers,
    mem_store::InMemoryDatabase,
    FanoutService,
    MarketplaceDatabase,
    OrderFlowApi,
    OrderFlowError,
    OrderPolicy,
};
use chrono::{Days, Utc};
use std::sync::Arc;

const STOCK: i64 = 10;
const NUM_VENDORS: u64 = 25;

async fn prepare_db() -> InMemoryDatabase {
    let db = InMemoryDatabase::new();
    db.upsert_user(User { id: "s-1".into(), name: "Greenfields Produce".into(), role: Role::Supplier })
        .await
        .expect("Error seeding supplier");
    db.upsert_product(Product {
        id: "P1".into(),
        supplier_id: "s-1".into(),
        name: "heirloom tomatoes".into(),
        unit_price: Money::from_cents(4_000),
        quantity: STOCK,
        is_available: true,
    })
    .await
    .expect("Error seeding product");
    for i in 0..NUM_VENDORS {
        db.upsert_user(User { id: format!("v-{i}").into(), name: format!("vendor {i}"), role: Role::Vendor })
            .await
            .expect("Error seeding vendor");
    }
    db
}

fn order_request(qty: i64) -> NewOrder {
    NewOrder {
        supplier_id: "s-1".into(),
        items: vec![LineRequest { product_id: "P1".into(), quantity: qty }],
        delivery_address: "12 Harbour Rd".into(),
        delivery_date: Some(Utc::now().date_naive() + Days::new(1)),
        delivery_time: None,
        payment_method: None,
        notes: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_checkouts_never_oversell() {
    let _ = env_logger::try_init();
    let db = prepare_db().await;
    let api = Arc::new(OrderFlowApi::new(
        db.clone(),
        OrderPolicy::default(),
        EventProducers::default(),
        FanoutService::new(16),
    ));

    // 25 vendors race for 10 units, one unit each. Exactly 10 may win.
    let mut handles = Vec::new();
    for i in 0..NUM_VENDORS {
        let api = Arc::clone(&api);
        handles.push(tokio::spawn(async move {
            let vendor = Actor::new(format!("v-{i}"), Role::Vendor);
            api.create_order(&vendor, order_request(1)).await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => wins += 1,
            Err(OrderFlowError::InsufficientStock { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error during burst: {e}"),
        }
    }
    assert_eq!(wins, 10);
    assert_eq!(conflicts, 15);

    let product = db.fetch_product(&"P1".into()).await.unwrap().unwrap();
    assert_eq!(product.quantity, 0);
    assert!(!product.is_available, "a product at zero stock must read unavailable");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_multi_line_orders_roll_back_cleanly() {
    let _ = env_logger::try_init();
    let db = prepare_db().await;
    // A second product with plenty of stock; the scarce product decides who wins.
    db.upsert_product(Product {
        id: "P2".into(),
        supplier_id: "s-1".into(),
        name: "basil".into(),
        unit_price: Money::from_cents(500),
        quantity: 1_000,
        is_available: true,
    })
    .await
    .unwrap();
    let api = Arc::new(OrderFlowApi::new(
        db.clone(),
        OrderPolicy::default(),
        EventProducers::default(),
        FanoutService::new(16),
    ));

    // Each order wants 10 units of P2 and 2 of the scarce P1: at most 5 can win.
    let mut handles = Vec::new();
    for i in 0..NUM_VENDORS {
        let api = Arc::clone(&api);
        handles.push(tokio::spawn(async move {
            let vendor = Actor::new(format!("v-{i}"), Role::Vendor);
            let mut request = order_request(2);
            request.items.insert(0, LineRequest { product_id: "P2".into(), quantity: 10 });
            api.create_order(&vendor, request).await
        }));
    }
    let mut wins = 0;
    for handle in handles {
        if handle.await.expect("task panicked").is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 5);

    // Every losing order released its P2 reservation: only the winners' units are gone.
    let p2 = db.fetch_product(&"P2".into()).await.unwrap().unwrap();
    assert_eq!(p2.quantity, 1_000 - 10 * wins);
    let p1 = db.fetch_product(&"P1".into()).await.unwrap().unwrap();
    assert_eq!(p1.quantity, 0);
    assert!(!p1.is_available);
}
