use thiserror::Error;

use crate::effect::SensorType;
use crate::layer::LayerId;

/// Errors raised by direct pixel access. These indicate a caller that did not
/// clamp its coordinates first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PixelError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("expected {expected} bytes for the buffer, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

/// Errors from canvas and layer operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("no active layer")]
    NoActiveLayer,

    #[error("layer index {index} out of range ({count} layers)")]
    LayerIndexOutOfRange { index: usize, count: usize },

    #[error("layer {0} not found")]
    LayerNotFound(LayerId),

    /// The layer has no binding list for this effect type.
    #[error("effect type {0} is not bound to the layer")]
    UnboundEffect(SensorType),

    #[error("brush size {size} outside 1..={max}")]
    InvalidBrushSize { size: u32, max: u32 },

    #[error(transparent)]
    Pixel(#[from] PixelError),
}

/// Errors from effect translation and channel reads
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("channel {index} out of range for {effect} ({channels} channels)")]
    IndexOutOfRange {
        effect: String,
        index: usize,
        channels: usize,
    },

    #[error("{effect} needs {expected} sample values, got {actual}")]
    MissingSampleValues {
        effect: String,
        expected: usize,
        actual: usize,
    },

    #[error("no effect registered for sensor type {0}")]
    UnknownEffect(SensorType),
}

/// Failure reported by a single sensor listener. Isolated per listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("listener failed: {0}")]
    Failed(String),
}

/// Errors from replaying undo/redo commands
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("no stroke in progress")]
    NoStrokeInProgress,

    #[error("target layer {0} no longer exists")]
    LayerGone(LayerId),

    #[error(transparent)]
    Pixel(#[from] PixelError),
}

/// Errors converting between a canvas and its stored form
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("invalid base64 pixel data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Pixel(#[from] PixelError),

    #[error("unknown layer transform input: {0}")]
    UnknownTransformInput(String),

    #[error("invalid effect type key: {0}")]
    InvalidEffectType(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("painting has no pixels ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
}

/// Failures from the persistence and remote collaborators
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode painting: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("painting {0} not found")]
    NotFound(String),

    #[error("remote store rejected the request: {0}")]
    Remote(String),
}

/// Result type for store operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors loading a [`crate::config::CanvasConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors producing a preview image
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot export a {width}x{height} image")]
    EmptyImage { width: usize, height: usize },
}

/// Errors from session-level editing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}
