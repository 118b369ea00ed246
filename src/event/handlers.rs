use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{CanvasEvent, EventHandler};

/// Handler that queues events for a consumer on another thread to drain.
///
/// Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<CanvasEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every queued event
    pub fn take(&self) -> Vec<CanvasEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Whether a redraw was requested since the last `take`
    pub fn needs_redraw(&self) -> bool {
        self.events.lock().iter().any(|e| *e == CanvasEvent::Invalidated)
    }
}

impl EventHandler for EventLog {
    fn handle_event(&mut self, event: &CanvasEvent) {
        self.events.lock().push(event.clone());
    }
}
