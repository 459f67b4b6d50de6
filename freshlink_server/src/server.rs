use std::{pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;

use freshlink_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    FanoutService,
    InMemoryDatabase,
    MarketplaceDatabase,
    OrderFlowApi,
    OrderPolicy,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        connect,
        health,
        CheckoutRoute,
        CreateOrderRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        RateOrderRoute,
        RegisterUserRoute,
        SendChatRoute,
        UpdateStatusRoute,
        UpsertProductRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = InMemoryDatabase::new();
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: InMemoryDatabase) -> Result<Server, ServerError> {
    let fanout = FanoutService::new(config.event_buffer_size);
    let handlers = EventHandlers::new(config.event_buffer_size, notifier_hooks(&config));
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());
    let policy = config.order_policy();
    let srv = HttpServer::new(move || {
        let app = App::new().wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fl::access_log"));
        let db = db.clone();
        let producers = producers.clone();
        let fanout = fanout.clone();
        app.configure(move |cfg| configure_api(cfg, db, policy, producers, fanout)).service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Register the `/api` surface against the given backend. Shared between the real server and the endpoint tests so
/// both exercise the same wiring.
pub fn configure_api<B: MarketplaceDatabase + 'static>(
    cfg: &mut web::ServiceConfig,
    db: B,
    policy: OrderPolicy,
    producers: EventProducers,
    fanout: FanoutService,
) {
    let orders_api = OrderFlowApi::new(db.clone(), policy, producers, fanout.clone());
    let chat_relay = freshlink_engine::ChatRelay::new(db, fanout.clone());
    cfg.app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(chat_relay))
        .app_data(web::Data::new(fanout))
        .service(
            web::scope("/api")
                .service(CheckoutRoute::<B>::new())
                .service(CreateOrderRoute::<B>::new())
                .service(MyOrdersRoute::<B>::new())
                .service(OrderByIdRoute::<B>::new())
                .service(UpdateStatusRoute::<B>::new())
                .service(RateOrderRoute::<B>::new())
                .service(SendChatRoute::<B>::new())
                .service(UpsertProductRoute::<B>::new())
                .service(RegisterUserRoute::<B>::new())
                .service(connect),
        );
}

/// The stand-in outbound notifiers. A real deployment would hang email/SMS/WhatsApp senders off these hooks; the
/// contract either way is fire-and-forget, so a notifier failure is logged by the hook machinery and never reaches
/// the order flow that triggered it.
fn notifier_hooks(config: &ServerConfig) -> EventHooks {
    let mut hooks = EventHooks::default();
    if !config.log_notifications {
        return hooks;
    }
    hooks.on_order_created(|ev: OrderCreatedEvent| {
        Box::pin(async move {
            info!(
                "📧️ [notifier] Order {} placed: confirmation to vendor {}, new-order alert to supplier {}",
                ev.order.order_id, ev.order.vendor_id, ev.order.supplier_id
            );
        }) as Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    });
    hooks.on_status_changed(|ev: OrderStatusChangedEvent| {
        Box::pin(async move {
            info!(
                "📧️ [notifier] Order {} moved {} -> {}: updates to vendor {} and supplier {}",
                ev.order.order_id, ev.old_status, ev.order.status, ev.order.vendor_id, ev.order.supplier_id
            );
        }) as Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    });
    hooks
}
