use std::collections::{BTreeSet, HashSet, VecDeque};

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::effect::{Effect, SensorType};
use crate::error::CanvasError;
use crate::layer::{Layer, LayerId, LayerTransformInput};
use crate::pixel_buffer::{Argb, PixelPos, TRANSPARENT};
use crate::stroke;

/// The tool applied by touch input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintTool {
    #[default]
    Pen,
    Brush,
    Fill,
    Eraser,
}

/// Ordered layer stack plus the current tool settings.
///
/// Later layers draw on top. At most one layer is active; the active index and
/// each layer's `is_active` flag always agree.
#[derive(Debug, Clone)]
pub struct Canvas {
    layers: Vec<Layer>,
    active_layer_index: Option<usize>,
    current_tool: PaintTool,
    current_color: Argb,
    brush_size: u32,
    max_brush_size: u32,
    layer_size: (u32, u32),
    /// Last pixel painted by the stroke in progress
    last_draw_point: Option<PixelPos>,
}

impl Canvas {
    /// A canvas with one active layer named `Layer1`.
    pub fn new(config: &CanvasConfig) -> Self {
        let mut canvas = Self::empty(config);
        canvas.new_layer_action();
        canvas
    }

    /// A canvas with no layers, used when rebuilding from storage
    pub fn empty(config: &CanvasConfig) -> Self {
        Self {
            layers: Vec::new(),
            active_layer_index: None,
            current_tool: PaintTool::default(),
            current_color: config.default_color,
            brush_size: 1,
            max_brush_size: config.max_brush_size,
            layer_size: (config.layer_width, config.layer_height),
            last_draw_point: None,
        }
    }

    /// Rebuild a canvas around existing layers of `size` pixels. No layer is
    /// active afterwards.
    pub fn from_layers(config: &CanvasConfig, size: (u32, u32), mut layers: Vec<Layer>) -> Self {
        for layer in &mut layers {
            layer.is_active = false;
        }
        Self {
            layers,
            layer_size: size,
            ..Self::empty(config)
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn layer_by_id(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_by_id_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn layer_size(&self) -> (u32, u32) {
        self.layer_size
    }

    pub fn active_layer_index(&self) -> Option<usize> {
        self.active_layer_index
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active_layer_index.and_then(|i| self.layers.get(i))
    }

    /// Select the active layer, or deactivate every layer with `None`.
    ///
    /// An out-of-range index is rejected and leaves the selection untouched.
    pub fn set_active_layer(&mut self, index: Option<usize>) -> Result<(), CanvasError> {
        if let Some(index) = index {
            if index >= self.layers.len() {
                log::warn!("cannot activate layer {}: only {} layers", index, self.layers.len());
                return Err(CanvasError::LayerIndexOutOfRange {
                    index,
                    count: self.layers.len(),
                });
            }
        }

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.is_active = Some(i) == index;
        }
        self.active_layer_index = index;
        Ok(())
    }

    /// Append a layer on top of the stack and make it active.
    pub fn add_layer(&mut self, name: &str) -> LayerId {
        let (width, height) = self.layer_size;
        self.push_layer(Layer::new(name, width, height))
    }

    /// Append an existing layer and make it active.
    pub fn push_layer(&mut self, mut layer: Layer) -> LayerId {
        let id = layer.id;
        layer.is_active = false;
        self.layers.push(layer);
        let index = self.layers.len() - 1;
        // index is in range, the layer was just pushed
        let _ = self.set_active_layer(Some(index));
        log::debug!("added layer {}, total={}", id, self.layers.len());
        id
    }

    /// Add a layer named after its position in the stack (`Layer1`, `Layer2`, ...)
    pub fn new_layer_action(&mut self) -> LayerId {
        let name = format!("Layer{}", self.layers.len() + 1);
        self.add_layer(&name)
    }

    /// Remove a layer by id.
    ///
    /// Removing the active layer leaves no layer active.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        let removed = self.layers.remove(index);

        self.active_layer_index = match self.active_layer_index {
            Some(active) if active == index => None,
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        if self.active_layer_index.is_none() {
            self.last_draw_point = None;
        }
        log::debug!("removed layer {}, total={}", id, self.layers.len());
        Some(removed)
    }

    pub fn current_tool(&self) -> PaintTool {
        self.current_tool
    }

    pub fn set_tool(&mut self, tool: PaintTool) {
        self.current_tool = tool;
    }

    pub fn color(&self) -> Argb {
        self.current_color
    }

    pub fn set_color(&mut self, color: Argb) {
        self.current_color = color;
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn max_brush_size(&self) -> u32 {
        self.max_brush_size
    }

    pub fn set_brush_size(&mut self, size: u32) -> Result<(), CanvasError> {
        if size == 0 || size > self.max_brush_size {
            return Err(CanvasError::InvalidBrushSize {
                size,
                max: self.max_brush_size,
            });
        }
        self.brush_size = size;
        Ok(())
    }

    pub fn last_draw_point(&self) -> Option<PixelPos> {
        self.last_draw_point
    }

    /// Set the point the next continuing `paint_at` interpolates from.
    pub fn set_last_draw_point(&mut self, pos: Option<PixelPos>) {
        self.last_draw_point = pos;
    }

    /// Map a point in view space onto the pixel grid of a layer.
    ///
    /// The layer is shown stretched over the whole view. The result is clamped
    /// to the buffer; an unknown layer maps to the origin.
    pub fn map_view_to_layer(&self, layer_index: usize, view_size: Vec2, view_pos: Pos2) -> PixelPos {
        let Some(layer) = self.layers.get(layer_index) else {
            return PixelPos::default();
        };
        let view_w = view_size.x.max(1.0);
        let view_h = view_size.y.max(1.0);
        let buffer = layer.buffer();

        let x = ((view_pos.x / view_w) * buffer.width() as f32) as i32;
        let y = ((view_pos.y / view_h) * buffer.height() as f32) as i32;
        buffer.clamp(PixelPos::new(x, y))
    }

    /// Colour the current tool writes
    fn stroke_color(&self) -> Argb {
        match self.current_tool {
            PaintTool::Eraser => TRANSPARENT,
            _ => self.current_color,
        }
    }

    fn stroke_width(&self) -> u32 {
        match self.current_tool {
            PaintTool::Brush | PaintTool::Eraser => self.brush_size,
            PaintTool::Pen | PaintTool::Fill => 1,
        }
    }

    /// Paint at `pos` on the layer at `layer_index`.
    ///
    /// When `stroke_continuing` and the stroke has a previous point, the gap to
    /// it is filled by interpolation. `pos` itself is always painted last. The
    /// position is clamped into the buffer first. Returns the number of pixel
    /// writes.
    pub fn paint_at(&mut self, layer_index: usize, pos: PixelPos, stroke_continuing: bool) -> Result<usize, CanvasError> {
        let color = self.stroke_color();
        let width = self.stroke_width();
        let previous = if stroke_continuing { self.last_draw_point } else { None };

        let Some(layer) = self.layers.get_mut(layer_index) else {
            log::debug!("paint_at: no layer at index {}", layer_index);
            return Err(CanvasError::NoActiveLayer);
        };
        let buffer = layer.buffer_mut();
        let pos = buffer.clamp(pos);

        let mut written = 0;
        if let Some(previous) = previous {
            for point in stroke::interpolate(previous, pos) {
                written += stroke::paint_stamp(buffer, point, width, color);
            }
        }
        written += stroke::paint_stamp(buffer, pos, width, color);

        self.last_draw_point = Some(pos);
        log::debug!("painted at ({}, {}) on layer {}", pos.x, pos.y, layer_index);
        Ok(written)
    }

    /// Flood fill the active layer from `(x, y)` with the current colour.
    ///
    /// Four-connected, breadth first. A seed outside the buffer, or a seed that
    /// already has the fill colour, changes nothing. Returns the number of
    /// recoloured pixels.
    pub fn fill(&mut self, x: i32, y: i32) -> Result<usize, CanvasError> {
        let fill_color = self.current_color;
        let index = self.active_layer_index.ok_or(CanvasError::NoActiveLayer)?;
        let layer = self.layers.get_mut(index).ok_or(CanvasError::NoActiveLayer)?;
        let buffer = layer.buffer_mut();

        if !buffer.contains(x, y) {
            return Ok(0);
        }
        let target_color = buffer.get(x, y)?;
        if target_color == fill_color {
            return Ok(0);
        }

        // Pixels are recoloured before their neighbours are queued, so a pixel
        // can never be queued twice.
        let mut queue = VecDeque::new();
        buffer.set(x, y, fill_color)?;
        queue.push_back((x, y));
        let mut filled = 1;

        while let Some((px, py)) = queue.pop_front() {
            for (nx, ny) in [(px + 1, py), (px - 1, py), (px, py + 1), (px, py - 1)] {
                if !buffer.contains(nx, ny) {
                    continue;
                }
                if buffer.get(nx, ny)? == target_color {
                    buffer.set(nx, ny, fill_color)?;
                    queue.push_back((nx, ny));
                    filled += 1;
                }
            }
        }

        log::debug!("filled {} pixels from ({}, {}) on layer {}", filled, x, y, index);
        Ok(filled)
    }

    /// Every effect type bound by any layer
    pub fn bound_effect_types(&self) -> BTreeSet<SensorType> {
        self.layers.iter().flat_map(|l| l.bound_effect_types()).collect()
    }

    /// Push the current channel values of `effect` through every layer binding
    /// on its sensor type.
    ///
    /// Within one call, the first binding per transform input on a layer
    /// overwrites and later ones add on top. Returns the number of layers that
    /// had bindings for the effect.
    pub fn apply_effect(&mut self, effect: &dyn Effect) -> Result<usize, CanvasError> {
        let effect_type = effect.sensor_type();
        let mut touched_layers = 0;

        for layer in self.layers.iter_mut().filter(|l| l.has_effect(effect_type)) {
            let bindings = layer.effect_bindings(effect_type)?.to_vec();
            let mut applied: HashSet<LayerTransformInput> = HashSet::new();

            for binding in bindings {
                let value = match effect.transform_input(binding.effect_output_index) {
                    Ok(value) => value,
                    Err(err) => {
                        log::warn!("layer {}: skipping binding {}: {}", layer.id, binding.id, err);
                        continue;
                    }
                };
                let accumulate = !applied.insert(binding.layer_transform_input);
                layer.apply_effect_translation(value, binding.layer_transform_input, accumulate);
            }
            touched_layers += 1;
        }
        Ok(touched_layers)
    }
}
