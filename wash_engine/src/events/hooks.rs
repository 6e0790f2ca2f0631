use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, LocationEvent, MessageEvent, NotificationEvent};

/// The producer half handed to the engine APIs. Cloneable; every clone publishes into the same
/// handlers.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub notification_producers: Vec<EventProducer<NotificationEvent>>,
    pub message_producers: Vec<EventProducer<MessageEvent>>,
    pub location_producers: Vec<EventProducer<LocationEvent>>,
}

pub struct EventHandlers {
    pub on_notification: Option<EventHandler<NotificationEvent>>,
    pub on_message: Option<EventHandler<MessageEvent>>,
    pub on_location: Option<EventHandler<LocationEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_notification = hooks.on_notification.map(|f| EventHandler::new(buffer_size, f));
        let on_message = hooks.on_message.map(|f| EventHandler::new(buffer_size, f));
        let on_location = hooks.on_location.map(|f| EventHandler::new(buffer_size, f));
        Self { on_notification, on_message, on_location }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_notification {
            result.notification_producers.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_message {
            result.message_producers.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_location {
            result.location_producers.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_notification {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_message {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_location {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// Hook registration. The server registers closures that forward events into the multicast
/// registry; tests register counters.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_notification: Option<Handler<NotificationEvent>>,
    pub on_message: Option<Handler<MessageEvent>>,
    pub on_location: Option<Handler<LocationEvent>>,
}

impl EventHooks {
    pub fn on_notification<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification = Some(Arc::new(f));
        self
    }

    pub fn on_message<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MessageEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_message = Some(Arc::new(f));
        self
    }

    pub fn on_location<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LocationEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_location = Some(Arc::new(f));
        self
    }
}
