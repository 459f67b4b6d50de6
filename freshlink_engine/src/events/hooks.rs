use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderCreatedEvent, OrderStatusChangedEvent};

/// The producer ends of every installed hook. Cloned into each `OrderFlowApi` instance; publishing to a hook with no
/// subscribers is a no-op.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producers: Vec<EventProducer<OrderCreatedEvent>>,
    pub status_changed_producers: Vec<EventProducer<OrderStatusChangedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producers.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producers.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// The hook points exposed to the outbound notifier collaborators (email/SMS/WhatsApp-equivalents). Both are
/// best-effort: a handler failure is the handler's problem, never the order flow's.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_status_changed: Option<Handler<OrderStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }
}
