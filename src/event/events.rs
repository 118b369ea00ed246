use egui::{Pos2, Vec2};

use crate::effect::SensorSample;

/// Notifications for the rendering surface
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Pixels or offsets changed; redraw
    Invalidated,
    LayersChanged {
        count: usize,
        active: Option<usize>,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One touch sample in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    /// Number of pointers currently on the surface
    pub pointer_count: usize,
    pub view_pos: Pos2,
    /// Size of the view the layer is stretched over
    pub view_size: Vec2,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, view_pos: Pos2, view_size: Vec2) -> Self {
        Self {
            phase,
            pointer_count: 1,
            view_pos,
            view_size,
        }
    }

    pub fn with_pointers(mut self, pointer_count: usize) -> Self {
        self.pointer_count = pointer_count;
        self
    }
}

/// Input posted to a painting session from any thread
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Touch(TouchEvent),
    Sensor(SensorSample),
}
