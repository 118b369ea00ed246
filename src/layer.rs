use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::effect::SensorType;
use crate::error::CanvasError;
use crate::pixel_buffer::PixelBuffer;

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The layer property an effect channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerTransformInput {
    XPos,
    YPos,
    Rotation,
    Scale,
    Alpha,
}

impl LayerTransformInput {
    pub const ALL: [LayerTransformInput; 5] = [
        LayerTransformInput::XPos,
        LayerTransformInput::YPos,
        LayerTransformInput::Rotation,
        LayerTransformInput::Scale,
        LayerTransformInput::Alpha,
    ];

    /// Stable name used in stored paintings
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerTransformInput::XPos => "X_POS",
            LayerTransformInput::YPos => "Y_POS",
            LayerTransformInput::Rotation => "ROTATION",
            LayerTransformInput::Scale => "SCALE",
            LayerTransformInput::Alpha => "ALPHA",
        }
    }
}

impl fmt::Display for LayerTransformInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerTransformInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|input| input.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Maps one output channel of an effect onto one layer property.
///
/// Pure data: all behaviour lives in [`Layer::apply_effect_translation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectBinding {
    pub id: Uuid,
    pub effect_output_index: usize,
    pub layer_transform_input: LayerTransformInput,
}

impl EffectBinding {
    pub fn new(effect_output_index: usize, layer_transform_input: LayerTransformInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            effect_output_index,
            layer_transform_input,
        }
    }
}

/// One paintable surface in the canvas stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    buffer: PixelBuffer,
    /// Kept in step with the canvas' active index; only the canvas writes it.
    pub(crate) is_active: bool,
    pub offset: (i32, i32),
    effect_bindings: BTreeMap<SensorType, Vec<EffectBinding>>,
    pub last_updated_timestamp: u64,
}

impl Layer {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self::from_parts(LayerId::new(), name, PixelBuffer::new(width, height))
    }

    /// Rebuild a layer from stored parts. The layer starts inactive.
    pub fn from_parts(id: LayerId, name: &str, buffer: PixelBuffer) -> Self {
        Self {
            id,
            name: name.to_string(),
            buffer,
            is_active: false,
            offset: (0, 0),
            effect_bindings: BTreeMap::new(),
            last_updated_timestamp: 0,
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.offset = (x, y);
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Mark the layer as changed at `timestamp_ms`, used by previews.
    pub fn touch(&mut self, timestamp_ms: u64) {
        self.last_updated_timestamp = timestamp_ms;
    }

    /// Ensure a (possibly empty) binding list exists for `effect_type`.
    pub fn add_effect_binding(&mut self, effect_type: SensorType) {
        self.effect_bindings.entry(effect_type).or_default();
    }

    pub fn bind(&mut self, effect_type: SensorType, binding: EffectBinding) {
        self.effect_bindings.entry(effect_type).or_default().push(binding);
    }

    pub fn effect_bindings(&self, effect_type: SensorType) -> Result<&[EffectBinding], CanvasError> {
        self.effect_bindings
            .get(&effect_type)
            .map(Vec::as_slice)
            .ok_or(CanvasError::UnboundEffect(effect_type))
    }

    pub fn all_effect_bindings(&self) -> &BTreeMap<SensorType, Vec<EffectBinding>> {
        &self.effect_bindings
    }

    pub fn has_effect(&self, effect_type: SensorType) -> bool {
        self.effect_bindings.contains_key(&effect_type)
    }

    pub fn bound_effect_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.effect_bindings.keys().copied()
    }

    pub fn remove_effect_binding(&mut self, effect_type: SensorType) -> Option<Vec<EffectBinding>> {
        self.effect_bindings.remove(&effect_type)
    }

    /// Remove a single binding. The effect entry goes away with its last binding.
    pub fn remove_binding(&mut self, effect_type: SensorType, binding_id: Uuid) -> Option<EffectBinding> {
        let bindings = self.effect_bindings.get_mut(&effect_type)?;
        let position = bindings.iter().position(|b| b.id == binding_id)?;
        let removed = bindings.remove(position);
        if bindings.is_empty() {
            self.effect_bindings.remove(&effect_type);
        }
        Some(removed)
    }

    /// Apply one effect channel value to a layer property.
    ///
    /// With `accumulate` the value is added to the current offset, otherwise it
    /// replaces it. Values are truncated toward zero. `Rotation`, `Scale` and
    /// `Alpha` are accepted but have no transform yet.
    pub fn apply_effect_translation(&mut self, value: f32, input: LayerTransformInput, accumulate: bool) {
        let transformed = value as i32;
        match input {
            LayerTransformInput::XPos => {
                if accumulate {
                    self.offset.0 = self.offset.0.saturating_add(transformed);
                } else {
                    self.offset.0 = transformed;
                }
            }
            LayerTransformInput::YPos => {
                if accumulate {
                    self.offset.1 = self.offset.1.saturating_add(transformed);
                } else {
                    self.offset.1 = transformed;
                }
            }
            LayerTransformInput::Rotation | LayerTransformInput::Scale | LayerTransformInput::Alpha => {
                log::trace!("layer {}: {} has no transform, ignoring {}", self.id, input, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GYRO: SensorType = SensorType::GYROSCOPE;

    #[test]
    fn transform_input_names_round_trip() {
        for input in LayerTransformInput::ALL {
            assert_eq!(input.as_str().parse::<LayerTransformInput>(), Ok(input));
        }
        assert!("SKEW".parse::<LayerTransformInput>().is_err());
        assert_eq!(
            serde_json::to_string(&LayerTransformInput::XPos).unwrap(),
            "\"X_POS\""
        );
    }

    #[test]
    fn reading_unbound_effect_fails() {
        let layer = Layer::new("Layer1", 4, 4);
        assert_eq!(layer.effect_bindings(GYRO), Err(CanvasError::UnboundEffect(GYRO)));
    }

    #[test]
    fn add_effect_binding_keeps_existing_list() {
        let mut layer = Layer::new("Layer1", 4, 4);
        layer.bind(GYRO, EffectBinding::new(0, LayerTransformInput::XPos));
        layer.add_effect_binding(GYRO);
        assert_eq!(layer.effect_bindings(GYRO).unwrap().len(), 1);
    }

    #[test]
    fn removing_last_binding_drops_effect() {
        let mut layer = Layer::new("Layer1", 4, 4);
        let binding = EffectBinding::new(1, LayerTransformInput::YPos);
        layer.bind(GYRO, binding);

        assert_eq!(layer.remove_binding(GYRO, binding.id), Some(binding));
        assert!(!layer.has_effect(GYRO));
    }

    #[test]
    fn translation_sets_then_accumulates() {
        let mut layer = Layer::new("Layer1", 4, 4);
        layer.set_pos(40, 40);

        layer.apply_effect_translation(5.9, LayerTransformInput::XPos, false);
        layer.apply_effect_translation(-2.5, LayerTransformInput::XPos, true);
        layer.apply_effect_translation(3.0, LayerTransformInput::YPos, false);
        assert_eq!(layer.offset, (3, 3));

        layer.apply_effect_translation(100.0, LayerTransformInput::Rotation, false);
        assert_eq!(layer.offset, (3, 3));
    }
}
