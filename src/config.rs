use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pixel_buffer::Argb;

/// Tunables for a painting session.
///
/// Missing fields fall back to their defaults, so a config file only needs to
/// name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Width of every drawing layer in pixels
    pub layer_width: u32,
    /// Height of every drawing layer in pixels
    pub layer_height: u32,
    /// Largest accepted brush size
    pub max_brush_size: u32,
    /// Opacity (0-255) for layers that are not active while one layer is
    pub inactive_layer_alpha: u8,
    /// Number of undo commands kept before the oldest is dropped
    pub history_capacity: usize,
    /// Factor applied to raw lux readings by the light effect
    pub light_calibration: f32,
    /// Paint colour a new canvas starts with
    pub default_color: Argb,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            layer_width: 128,
            layer_height: 128,
            max_brush_size: 64,
            inactive_layer_alpha: 55,
            history_capacity: 32,
            light_calibration: 0.02,
            default_color: 0xFF00_0000,
        }
    }
}

impl CanvasConfig {
    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded canvas config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layer_width == 0 || self.layer_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "layer size {}x{} must be non-zero",
                self.layer_width, self.layer_height
            )));
        }
        if self.max_brush_size == 0 {
            return Err(ConfigError::Invalid("max_brush_size must be at least 1".into()));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        if !self.light_calibration.is_finite() {
            return Err(ConfigError::Invalid("light_calibration must be finite".into()));
        }
        Ok(())
    }
}
