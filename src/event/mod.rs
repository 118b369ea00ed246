mod bus;
mod events;
mod handlers;

pub use bus::EventBus;
pub use events::*;
pub use handlers::EventLog;

/// Receives render-side notifications from a painting session
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &CanvasEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&CanvasEvent) + Send,
{
    fn handle_event(&mut self, event: &CanvasEvent) {
        self(event)
    }
}
