//! Request handler definitions
//!
//! Define each route and its handler here. Handlers are asynchronous: request handling is I/O bound end to end
//! (store access, fan-out publishes), so nothing here may block a worker thread.
//!
//! Handlers are generic over the storage backend, and actix cannot route generic handlers through its attribute
//! macros, so registration goes through the `route!` macro below instead.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use actix_web::{get, web, HttpResponse, Responder};
use futures::Stream;
use log::*;
use tokio::sync::mpsc;

use freshlink_engine::{
    cart,
    db_types::{NewOrder, OrderId, Product, User},
    fanout::{ConnectionId, NotificationEvent},
    ChatRelay,
    DeliveryDetails,
    FanoutService,
    MarketplaceDatabase,
    OrderFlowApi,
};

use crate::{
    auth::AuthenticatedUser,
    data_objects::{ChatSendRequest, CheckoutRequest, JsonResponse, RatingRequest, StatusUpdateRequest},
    errors::ServerError,
};

// Actix cannot route generic handlers via its attribute macros, so this macro generates a unit struct per route that
// registers the handler instantiated for a concrete backend.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl MarketplaceDatabase);
/// Create one order against one supplier. Responds 201 with the committed order; 400 with the complete list of
/// validation problems; 404 for an unknown product; 409 when stock or the order number was lost to a race.
pub async fn create_order<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST /orders for {}", user.actor().id);
    let order = api.create_order(user.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(checkout => Post "/checkout" impl MarketplaceDatabase);
/// Check out a whole client-held cart. The cart is split into supplier groups server-side and each group commits
/// independently; the response lists committed orders and failed groups, and partial success is a 200, not an error.
pub async fn checkout<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST /checkout for {}", user.actor().id);
    let request = body.into_inner();
    let groups = cart::split_items(request.items);
    let delivery = DeliveryDetails {
        address: request.delivery_address,
        date: request.delivery_date,
        time: request.delivery_time,
        payment_method: request.payment_method,
        notes: request.notes,
    };
    let result = api.checkout_cart(user.actor(), &groups, &delivery).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(my_orders => Get "/orders" impl MarketplaceDatabase);
/// The caller's orders: the buying side for vendors, the selling side for suppliers.
pub async fn my_orders<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET /orders for {}", user.actor().id);
    let orders = api.orders_for_actor(user.actor()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl MarketplaceDatabase);
pub async fn order_by_id<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET /orders/{order_id}");
    let order = api.order_for_actor(user.actor(), &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_status => Post "/orders/{order_id}/status" impl MarketplaceDatabase);
/// Drive the order state machine. Illegal transitions come back as 400 with the offending pair named; the caller
/// must re-derive a legal next status rather than retry.
pub async fn update_status<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let request = body.into_inner();
    debug!("💻️ POST /orders/{order_id}/status -> {}", request.new_status);
    let order =
        api.transition_order(user.actor(), &order_id, request.new_status, request.reason.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(rate_order => Post "/orders/{order_id}/rating" impl MarketplaceDatabase);
pub async fn rate_order<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<RatingRequest>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let request = body.into_inner();
    debug!("💻️ POST /orders/{order_id}/rating");
    let order = api.add_rating(user.actor(), &order_id, request.stars, request.review).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------    Chat   ----------------------------------------------------
route!(send_chat => Post "/orders/{order_id}/chat" impl MarketplaceDatabase);
/// Relay a chat message to the opposite party of the order. Broadcast-only: nothing is stored, and whether the
/// receiver was connected to see it is not part of the response.
pub async fn send_chat<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<ChatSendRequest>,
    relay: web::Data<ChatRelay<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST /orders/{order_id}/chat from {}", user.actor().id);
    let message = relay.send_message(user.actor(), &order_id, &body.body).await?;
    Ok(HttpResponse::Ok().json(message))
}

//----------------------------------------------  Catalog  ----------------------------------------------------
route!(upsert_product => Post "/products" impl MarketplaceDatabase);
/// Create or update a catalog entry. Suppliers only, and only for their own catalog.
pub async fn upsert_product<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    body: web::Json<Product>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner();
    if !user.is_supplier() {
        return Err(ServerError::InsufficientPermissions("Only suppliers may manage a catalog".to_string()));
    }
    if product.supplier_id != user.actor().id {
        return Err(ServerError::InsufficientPermissions(
            "Suppliers may only manage their own catalog".to_string(),
        ));
    }
    debug!("💻️ POST /products {} for supplier {}", product.id, product.supplier_id);
    api.db().upsert_product(product).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Product stored")))
}

route!(register_user => Post "/users" impl MarketplaceDatabase);
/// Mirror an upstream-registered user into the marketplace directory. Callers may only register themselves; the
/// registration system proper lives outside this service.
pub async fn register_user<TMarketplaceDatabase: MarketplaceDatabase + 'static>(
    user: AuthenticatedUser,
    body: web::Json<User>,
    api: web::Data<OrderFlowApi<TMarketplaceDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let record = body.into_inner();
    if record.id != user.actor().id || record.role != user.actor().role {
        return Err(ServerError::InsufficientPermissions(
            "Users may only register their own identity".to_string(),
        ));
    }
    debug!("💻️ POST /users {} ({})", record.id, record.role);
    api.db().upsert_user(record).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("User stored")))
}

//----------------------------------------------  Connect  ----------------------------------------------------
/// The long-lived fan-out connection: a newline-delimited JSON stream of [`NotificationEvent`]s.
///
/// On connect the caller joins their own user room and, when acting as a supplier, their supplier room. Membership
/// is session-scoped: it dies with this stream, nothing is replayed on reconnect, and a client that needs to catch
/// up must query the persisted orders instead.
#[get("/connect")]
pub async fn connect(user: AuthenticatedUser, fanout: web::Data<FanoutService>) -> impl Responder {
    let is_supplier = user.is_supplier();
    let actor = user.into_actor();
    let (conn, rx) = fanout.connect();
    fanout.join_user_room(conn, &actor.id);
    if is_supplier {
        fanout.join_supplier_room(conn, &actor.id);
    }
    info!("💻️ {} {} connected to the event stream (connection {conn})", actor.role, actor.id);
    let stream = EventStream { conn, rx, fanout: fanout.get_ref().clone() };
    HttpResponse::Ok().content_type("application/x-ndjson").streaming(stream)
}

/// Adapts a fan-out receiver into an HTTP body stream. Dropping the stream (client gone, server shutdown) tears the
/// connection's room memberships down without touching other members.
struct EventStream {
    conn: ConnectionId,
    rx: mpsc::Receiver<NotificationEvent>,
    fanout: FanoutService,
}

impl Stream for EventStream {
    type Item = Result<web::Bytes, std::convert::Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(event)) => match serde_json::to_vec(&event) {
                    Ok(mut line) => {
                        line.push(b'\n');
                        return Poll::Ready(Some(Ok(web::Bytes::from(line))));
                    },
                    // Delivery is best-effort; an unserializable event is dropped, not fatal.
                    Err(e) => {
                        error!("💻️ Could not serialize event for connection {}: {e}", this.conn);
                    },
                },
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        debug!("💻️ Event stream for connection {} closed", self.conn);
        self.fanout.disconnect(self.conn);
    }
}
