use super::{CommandError, CommandResult};
use crate::canvas::Canvas;
use crate::layer::LayerId;
use crate::pixel_buffer::PixelBuffer;

/// A recorded change to one layer's pixels.
///
/// Each command owns full copies of the buffer before and after the change.
/// Undo and redo overwrite the layer wholesale, no diffing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// One touch-down to touch-up stroke
    Stroke {
        layer_id: LayerId,
        before: PixelBuffer,
        after: PixelBuffer,
    },

    /// A flood fill
    Fill {
        layer_id: LayerId,
        before: PixelBuffer,
        after: PixelBuffer,
    },
}

impl Command {
    pub fn layer_id(&self) -> LayerId {
        match self {
            Command::Stroke { layer_id, .. } | Command::Fill { layer_id, .. } => *layer_id,
        }
    }

    fn snapshots(&self) -> (&PixelBuffer, &PixelBuffer) {
        match self {
            Command::Stroke { before, after, .. } | Command::Fill { before, after, .. } => (before, after),
        }
    }

    /// Whether the command changed anything worth recording
    pub fn is_noop(&self) -> bool {
        let (before, after) = self.snapshots();
        before == after
    }

    /// Restore the "before" buffer into the layer.
    pub fn undo(&self, canvas: &mut Canvas) -> CommandResult<LayerId> {
        let (before, _) = self.snapshots();
        self.restore(canvas, before)
    }

    /// Restore the "after" buffer into the layer.
    pub fn redo(&self, canvas: &mut Canvas) -> CommandResult<LayerId> {
        let (_, after) = self.snapshots();
        self.restore(canvas, after)
    }

    fn restore(&self, canvas: &mut Canvas, snapshot: &PixelBuffer) -> CommandResult<LayerId> {
        let layer_id = self.layer_id();
        let layer = canvas
            .layer_by_id_mut(layer_id)
            .ok_or(CommandError::LayerGone(layer_id))?;
        layer.buffer_mut().copy_from(snapshot)?;
        Ok(layer_id)
    }
}
