use super::{Effect, SensorSample, SensorType, check_channel, check_sample};
use crate::error::EffectError;

const CHANNELS: [&str; 3] = ["Pitch", "Yaw", "Roll"];

/// Running total of angular velocity on three axes.
///
/// Sample layout: `values[0..3]` = rotation rate around x, y, z. Each sample is
/// added to the totals, which never decay on their own; only
/// [`Effect::reset`] clears them.
#[derive(Debug, Clone, Default)]
pub struct GyroscopeEffect {
    totals: [f32; 3],
}

impl GyroscopeEffect {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for GyroscopeEffect {
    fn sensor_type(&self) -> SensorType {
        SensorType::GYROSCOPE
    }

    fn name(&self) -> &str {
        "Gyroscope"
    }

    fn description(&self) -> &str {
        "Apply your device's rotation to layers"
    }

    fn output_channels(&self) -> &[&'static str] {
        &CHANNELS
    }

    fn translate(&mut self, sample: &SensorSample) -> Result<Vec<f32>, EffectError> {
        check_sample(self, sample, CHANNELS.len())?;
        for (total, velocity) in self.totals.iter_mut().zip(&sample.values) {
            *total += velocity;
        }
        Ok(self.totals.to_vec())
    }

    fn transform_input(&self, index: usize) -> Result<f32, EffectError> {
        check_channel(self, index)?;
        Ok(self.totals[index])
    }

    fn reset(&mut self) {
        self.totals = [0.0; 3];
    }
}
