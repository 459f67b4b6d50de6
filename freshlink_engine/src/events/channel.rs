//! Stateless pub-sub plumbing for the outbound notifier collaborators.
//!
//! Email/SMS-style notifiers subscribe to order events through this module. Handlers receive nothing but the event
//! itself and run as spawned tasks, so a slow or failing notifier can never stall, or fail, the order flow that
//! produced the event.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Run the dispatch loop until every producer has been dropped, then wait for in-flight handler tasks to finish.
    pub async fn start_handler(mut self) {
        debug!("📮️ Starting event handler");
        // The handler keeps a sender only so that subscribe() can hand out producers; drop it here so the loop ends
        // once the last external producer goes away.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📮️ Dispatching event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move {
                (handler)(ev).await;
            });
            // Reap whatever has already finished so the set does not grow without bound.
            while let Some(res) = jobs.try_join_next() {
                if let Err(e) = res {
                    warn!("📮️ Notifier task panicked: {e}");
                }
            }
        }
        while let Some(res) = jobs.join_next().await {
            if let Err(e) = res {
                warn!("📮️ Notifier task panicked: {e}");
            }
        }
        debug!("📮️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Hand the event to the handler loop. Failures are logged and swallowed; event delivery is fire-and-forget by
    /// contract.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📮️ Failed to send event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn all_published_events_are_handled() {
        let _ = env_logger::try_init();
        let count = Arc::new(AtomicU64::new(0));
        let c2 = count.clone();
        let handler = Arc::new(move |v: u64| {
            let count = count.clone();
            Box::pin(async move {
                let _ = count.fetch_add(v, Ordering::SeqCst);
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(1, handler);
        let producer_1 = event_handler.subscribe();
        let producer_2 = event_handler.subscribe();
        tokio::spawn(async move {
            for i in 0..5u64 {
                producer_1.publish_event(i * 2 + 1).await;
            }
        });
        tokio::spawn(async move {
            for i in 0..5u64 {
                producer_2.publish_event(i * 2).await;
            }
        });

        event_handler.start_handler().await;
        assert_eq!(c2.load(Ordering::SeqCst), 45);
    }
}
