//! Conversion between a live [`Canvas`] and its stored and remote forms.
//!
//! Layer pixels travel as base64 of the row-major A, R, G, B byte encoding.
//! Bindings are flattened to records carrying their effect type, and grouped
//! back by type on load.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::effect::SensorType;
use crate::error::SerializeError;
use crate::layer::{EffectBinding, Layer, LayerId, LayerTransformInput};
use crate::pixel_buffer::PixelBuffer;

/// Descriptive fields stored alongside the layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintingMetadata {
    pub id: String,
    pub time_taken_seconds: u64,
    pub theme: String,
    pub mode: String,
}

impl Default for PaintingMetadata {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            time_taken_seconds: 0,
            theme: "none".to_string(),
            mode: "none".to_string(),
        }
    }
}

/// The persisted unit handed to stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Painting {
    pub id: String,
    /// Layer width in pixels
    pub width: u32,
    /// Layer height in pixels
    pub height: u32,
    /// Bottom to top
    pub layers: Vec<PersistedLayer>,
    pub time_taken_seconds: u64,
    pub theme: String,
    pub mode: String,
}

impl Painting {
    pub fn metadata(&self) -> PaintingMetadata {
        PaintingMetadata {
            id: self.id.clone(),
            time_taken_seconds: self.time_taken_seconds,
            theme: self.theme.clone(),
            mode: self.mode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLayer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// base64 pixel bytes
    pub bitmap: String,
    #[serde(default)]
    pub bindings: Vec<BindingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
    #[serde(default)]
    pub id: String,
    pub effect_type: SensorType,
    pub effect_output_index: usize,
    /// Transform input name, e.g. `X_POS`
    pub layer_transform_input: String,
}

pub fn encode_pixels(buffer: &PixelBuffer) -> String {
    STANDARD.encode(buffer.encode())
}

pub fn decode_pixels(encoded: &str, width: u32, height: u32) -> Result<PixelBuffer, SerializeError> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(PixelBuffer::decode(&bytes, width, height)?)
}

/// Empty ids get a fresh one; anything else must be a valid uuid.
fn parse_id(id: &str) -> Result<Uuid, SerializeError> {
    if id.is_empty() {
        return Ok(Uuid::new_v4());
    }
    Uuid::parse_str(id).map_err(|_| SerializeError::InvalidId(id.to_string()))
}

/// Snapshot a canvas into its persisted form, keeping layer order.
pub fn to_persisted(canvas: &Canvas, metadata: &PaintingMetadata) -> Painting {
    let (width, height) = canvas.layer_size();
    let layers = canvas
        .layers()
        .iter()
        .map(|layer| PersistedLayer {
            id: layer.id.to_string(),
            name: layer.name.clone(),
            bitmap: encode_pixels(layer.buffer()),
            bindings: layer
                .all_effect_bindings()
                .iter()
                .flat_map(|(effect_type, bindings)| {
                    bindings.iter().map(move |binding| BindingRecord {
                        id: binding.id.to_string(),
                        effect_type: *effect_type,
                        effect_output_index: binding.effect_output_index,
                        layer_transform_input: binding.layer_transform_input.as_str().to_string(),
                    })
                })
                .collect(),
        })
        .collect();

    Painting {
        id: metadata.id.clone(),
        width,
        height,
        layers,
        time_taken_seconds: metadata.time_taken_seconds,
        theme: metadata.theme.clone(),
        mode: metadata.mode.clone(),
    }
}

/// Rebuild a canvas from its persisted form. No layer is active afterwards.
pub fn from_persisted(painting: &Painting, config: &CanvasConfig) -> Result<Canvas, SerializeError> {
    check_dimensions(painting.width, painting.height)?;
    let mut layers = Vec::with_capacity(painting.layers.len());

    for (index, stored) in painting.layers.iter().enumerate() {
        let buffer = decode_pixels(&stored.bitmap, painting.width, painting.height)?;
        let name = if stored.name.is_empty() {
            format!("Layer{}", index + 1)
        } else {
            stored.name.clone()
        };
        let mut layer = Layer::from_parts(LayerId(parse_id(&stored.id)?), &name, buffer);

        for record in &stored.bindings {
            let input: LayerTransformInput = record
                .layer_transform_input
                .parse()
                .map_err(SerializeError::UnknownTransformInput)?;
            layer.bind(
                record.effect_type,
                EffectBinding {
                    id: parse_id(&record.id)?,
                    effect_output_index: record.effect_output_index,
                    layer_transform_input: input,
                },
            );
        }
        layers.push(layer);
    }

    log::debug!("restored painting {} with {} layers", painting.id, layers.len());
    Ok(Canvas::from_layers(config, (painting.width, painting.height), layers))
}

fn check_dimensions(width: u32, height: u32) -> Result<(), SerializeError> {
    if width == 0 || height == 0 {
        return Err(SerializeError::EmptyCanvas { width, height });
    }
    Ok(())
}

/// Document shape used by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePainting {
    pub id: String,
    pub layers: Vec<RemoteLayer>,
    /// Milliseconds since the UNIX epoch
    pub created_at: u64,
    pub mode: String,
    /// Layer width; also the height unless `height` is set
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub theme: String,
    pub time_taken: u64,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLayer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Keyed by effect type, as a decimal string
    #[serde(default)]
    pub bindings: BTreeMap<String, Vec<RemoteBinding>>,
    pub bitmap: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBinding {
    pub id: String,
    pub effect_input_index: usize,
    pub layer_transform_input: String,
}

impl RemotePainting {
    pub fn from_painting(painting: &Painting, user_id: &str, created_at_ms: u64) -> Self {
        let layers = painting
            .layers
            .iter()
            .map(|layer| {
                let mut bindings: BTreeMap<String, Vec<RemoteBinding>> = BTreeMap::new();
                for record in &layer.bindings {
                    bindings
                        .entry(record.effect_type.to_string())
                        .or_default()
                        .push(RemoteBinding {
                            id: record.id.clone(),
                            effect_input_index: record.effect_output_index,
                            layer_transform_input: record.layer_transform_input.clone(),
                        });
                }
                RemoteLayer {
                    id: layer.id.clone(),
                    name: layer.name.clone(),
                    bindings,
                    bitmap: layer.bitmap.clone(),
                }
            })
            .collect();

        Self {
            id: painting.id.clone(),
            layers,
            created_at: created_at_ms,
            mode: painting.mode.clone(),
            size: painting.width,
            height: (painting.height != painting.width).then_some(painting.height),
            theme: painting.theme.clone(),
            time_taken: painting.time_taken_seconds,
            user_id: user_id.to_string(),
        }
    }

    pub fn to_painting(&self) -> Result<Painting, SerializeError> {
        let height = self.height.unwrap_or(self.size);
        check_dimensions(self.size, height)?;
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut bindings = Vec::new();
            for (key, remote_bindings) in &layer.bindings {
                let effect_type: SensorType = key
                    .parse()
                    .map_err(|_| SerializeError::InvalidEffectType(key.clone()))?;
                bindings.extend(remote_bindings.iter().map(|binding| BindingRecord {
                    id: binding.id.clone(),
                    effect_type,
                    effect_output_index: binding.effect_input_index,
                    layer_transform_input: binding.layer_transform_input.clone(),
                }));
            }
            layers.push(PersistedLayer {
                id: layer.id.clone(),
                name: layer.name.clone(),
                bitmap: layer.bitmap.clone(),
                bindings,
            });
        }

        Ok(Painting {
            id: self.id.clone(),
            width: self.size,
            height,
            layers,
            time_taken_seconds: self.time_taken,
            theme: self.theme.clone(),
            mode: self.mode.clone(),
        })
    }
}
