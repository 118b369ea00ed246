use std::cell::RefCell;

use crate::event::{CanvasEvent, EventHandler};

/// Broadcasts canvas events to registered handlers, in subscription order
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Emit an event to all registered handlers.
    ///
    /// Handlers must not emit on the same bus; the nested emit is dropped.
    pub fn emit(&self, event: CanvasEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("dropping nested event {:?}", event);
            return;
        };
        for handler in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;

    #[test]
    fn every_handler_sees_every_event() {
        let bus = EventBus::new();
        let first = EventLog::new();
        let second = EventLog::new();
        bus.subscribe(Box::new(first.clone()));
        bus.subscribe(Box::new(second.clone()));

        bus.emit(CanvasEvent::Invalidated);
        bus.emit(CanvasEvent::LayersChanged { count: 2, active: Some(1) });

        assert_eq!(first.take().len(), 2);
        assert_eq!(
            second.take(),
            vec![CanvasEvent::Invalidated, CanvasEvent::LayersChanged { count: 2, active: Some(1) }]
        );
    }

    #[test]
    fn closures_are_handlers() {
        let bus = EventBus::new();
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = seen.clone();
        bus.subscribe(Box::new(move |_: &CanvasEvent| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        bus.emit(CanvasEvent::Invalidated);
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
