use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::context::Context;
use crate::types::EventName;

/// Type-erased async event handler.
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One handler per event. Registering an event again replaces the old handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventName, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`, returning the registry for chaining.
    pub fn on<F, Fut>(mut self, event: EventName, handler: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx| handler(ctx).boxed());
        if self.handlers.insert(event, handler).is_some() {
            info!("Replaced handler for event: {}", event);
        } else {
            info!("Registered handler for event: {}", event);
        }
        self
    }

    pub fn resolve(&self, event: EventName) -> Option<Handler> {
        self.handlers.get(&event).cloned()
    }

    /// Registered events, in declaration order of [`EventName`].
    pub fn events(&self) -> Vec<EventName> {
        EventName::ALL
            .into_iter()
            .filter(|e| self.handlers.contains_key(e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
