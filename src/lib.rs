#![warn(clippy::all, rust_2018_idioms)]

pub mod canvas;
pub mod command;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod layer;
pub mod pixel_buffer;
pub mod renderer;
pub mod serializer;
pub mod state;
pub mod store;
pub mod stroke;
pub mod util {
    pub mod time;
}

pub use canvas::{Canvas, PaintTool};
pub use command::{Command, StrokeHistory};
pub use config::CanvasConfig;
pub use effect::{Effect, EffectRegistry, EffectRoutingContext, SensorSample, SensorType};
pub use event::{CanvasEvent, EventBus, SessionEvent, TouchEvent, TouchPhase};
pub use layer::{EffectBinding, Layer, LayerId, LayerTransformInput};
pub use pixel_buffer::{Argb, PixelBuffer, PixelPos};
pub use renderer::Compositor;
pub use serializer::{Painting, PaintingMetadata, RemotePainting};
pub use state::{GestureState, PaintingSession, SessionHandle};
