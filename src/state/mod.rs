mod session;

pub use session::{GestureState, PaintingSession, SessionHandle, TimeSource};
