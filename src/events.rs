//! Transaction lifecycle events
//!
//! The execution environment announces context switches and every transaction
//! it runs. Consumers subscribe per event kind through `EventDispatcher`;
//! `EventBus` is the in-process implementation.

use crate::types::{CallPayload, ExecutionReport, TransactionIntent};
use futures::future::BoxFuture;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContextChanged,
    TransactionInitiated,
    TransactionExecuted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// The active network or environment changed.
    ContextChanged,
    /// Fired before a transaction executes.
    TransactionInitiated {
        timestamp: u64,
        intent: TransactionIntent,
        payload: CallPayload,
    },
    /// Fired after a transaction executed.
    TransactionExecuted(ExecutionReport),
}

impl RecorderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RecorderEvent::ContextChanged => EventKind::ContextChanged,
            RecorderEvent::TransactionInitiated { .. } => EventKind::TransactionInitiated,
            RecorderEvent::TransactionExecuted(_) => EventKind::TransactionExecuted,
        }
    }
}

/// Handler invoked for each event of the kind it was registered for.
pub type EventHandler = Box<dyn Fn(RecorderEvent) -> BoxFuture<'static, ()> + Send + Sync>;

pub trait EventDispatcher {
    fn register(&mut self, kind: EventKind, handler: EventHandler);
}

/// In-process event dispatcher.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to its handlers in registration order, awaiting each
    /// one before moving on to the next.
    pub async fn emit(&self, event: RecorderEvent) {
        let kind = event.kind();
        let Some(handlers) = self.handlers.get(&kind) else {
            debug!("No handlers registered for {:?}", kind);
            return;
        };
        for handler in handlers {
            handler(event.clone()).await;
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl EventDispatcher for EventBus {
    fn register(&mut self, kind: EventKind, handler: EventHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }
}
