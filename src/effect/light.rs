use super::{Effect, SensorSample, SensorType, check_channel, check_sample};
use crate::error::EffectError;

const CHANNELS: [&str; 1] = ["Illuminance (lux)"];

/// Latest ambient light level, scaled by a calibration factor.
///
/// Sample layout: `values[0]` = illuminance in lux. Each sample replaces the
/// previous value.
#[derive(Debug, Clone)]
pub struct LightEffect {
    calibration: f32,
    illuminance: f32,
}

impl LightEffect {
    pub const DEFAULT_CALIBRATION: f32 = 0.02;

    pub fn new(calibration: f32) -> Self {
        Self {
            calibration,
            illuminance: 0.0,
        }
    }
}

impl Default for LightEffect {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CALIBRATION)
    }
}

impl Effect for LightEffect {
    fn sensor_type(&self) -> SensorType {
        SensorType::LIGHT
    }

    fn name(&self) -> &str {
        "Light"
    }

    fn description(&self) -> &str {
        "Reacts to the ambient light level."
    }

    fn output_channels(&self) -> &[&'static str] {
        &CHANNELS
    }

    fn translate(&mut self, sample: &SensorSample) -> Result<Vec<f32>, EffectError> {
        check_sample(self, sample, CHANNELS.len())?;
        self.illuminance = sample.values[0] * self.calibration;
        Ok(vec![self.illuminance])
    }

    fn transform_input(&self, index: usize) -> Result<f32, EffectError> {
        check_channel(self, index)?;
        Ok(self.illuminance)
    }

    fn reset(&mut self) {
        self.illuminance = 0.0;
    }
}
