use std::collections::VecDeque;

use super::{Command, CommandError, CommandResult};
use crate::canvas::Canvas;
use crate::layer::{Layer, LayerId};
use crate::pixel_buffer::PixelBuffer;

/// Linear undo/redo history with a fixed capacity.
///
/// Commands before the cursor can be undone, commands at or after it can be
/// redone. Pushing a command drops everything after the cursor. When full,
/// the oldest command is dropped along with its snapshots.
#[derive(Debug, Clone)]
pub struct StrokeHistory {
    commands: VecDeque<Command>,
    cursor: usize,
    capacity: usize,
    /// Layer and "before" snapshot of the stroke in progress
    pending: Option<(LayerId, PixelBuffer)>,
}

impl StrokeHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity: capacity.max(1),
            pending: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    pub fn is_stroke_in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot `layer` as the "before" state of a new stroke.
    ///
    /// An unfinished stroke is discarded.
    pub fn begin_stroke(&mut self, layer: &Layer) {
        if let Some((previous, _)) = self.pending.take() {
            log::warn!("discarding unfinished stroke on layer {}", previous);
        }
        self.pending = Some((layer.id, layer.buffer().clone()));
    }

    /// Snapshot the stroke's layer again and record the stroke.
    ///
    /// Returns false when the stroke left the layer unchanged and nothing was
    /// recorded.
    pub fn end_stroke(&mut self, canvas: &Canvas) -> CommandResult<bool> {
        let (layer_id, before) = self.pending.take().ok_or(CommandError::NoStrokeInProgress)?;
        let layer = canvas
            .layer_by_id(layer_id)
            .ok_or(CommandError::LayerGone(layer_id))?;

        let command = Command::Stroke {
            layer_id,
            before,
            after: layer.buffer().clone(),
        };
        Ok(self.push(command))
    }

    pub fn cancel_stroke(&mut self) {
        self.pending = None;
    }

    /// Record a finished command. No-op commands are skipped.
    pub fn push(&mut self, command: Command) -> bool {
        if command.is_noop() {
            log::debug!("layer {} unchanged, nothing recorded", command.layer_id());
            return false;
        }

        self.commands.truncate(self.cursor);
        self.commands.push_back(command);
        while self.commands.len() > self.capacity {
            self.commands.pop_front();
        }
        self.cursor = self.commands.len();
        true
    }

    pub fn undo(&mut self, canvas: &mut Canvas) -> CommandResult<LayerId> {
        if self.cursor == 0 {
            return Err(CommandError::NothingToUndo);
        }
        let command = &self.commands[self.cursor - 1];
        let layer_id = command.undo(canvas)?;
        self.cursor -= 1;
        log::debug!("undo on layer {}, cursor={}", layer_id, self.cursor);
        Ok(layer_id)
    }

    pub fn redo(&mut self, canvas: &mut Canvas) -> CommandResult<LayerId> {
        let command = self
            .commands
            .get(self.cursor)
            .ok_or(CommandError::NothingToRedo)?;
        let layer_id = command.redo(canvas)?;
        self.cursor += 1;
        log::debug!("redo on layer {}, cursor={}", layer_id, self.cursor);
        Ok(layer_id)
    }

    /// Drop every command that targets a deleted layer.
    pub fn forget_layer(&mut self, layer_id: LayerId) {
        let before_cursor = self
            .commands
            .iter()
            .take(self.cursor)
            .filter(|c| c.layer_id() == layer_id)
            .count();
        self.commands.retain(|c| c.layer_id() != layer_id);
        self.cursor -= before_cursor;

        if matches!(&self.pending, Some((pending, _)) if *pending == layer_id) {
            self.pending = None;
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
        self.pending = None;
    }
}
