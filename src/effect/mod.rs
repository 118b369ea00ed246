//! Sensor-driven effects and the plumbing that routes samples to them.
//!
//! One [`Effect`] instance exists per sensor type for the whole session. Layers
//! never own effects; they only hold [`crate::layer::EffectBinding`]s that name
//! an effect's output channel by index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EffectError;

mod gyroscope;
mod light;
mod registry;
mod routing;

pub use gyroscope::GyroscopeEffect;
pub use light::LightEffect;
pub use registry::{EffectRegistry, SensorInfo};
pub use routing::{EffectListener, EffectRoutingContext, ListenerId, SensorSource};

/// Stable identifier of a physical sensor kind. Doubles as the effect type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorType(pub i32);

impl SensorType {
    pub const ACCELEROMETER: SensorType = SensorType(1);
    pub const MAGNETIC_FIELD: SensorType = SensorType(2);
    pub const GYROSCOPE: SensorType = SensorType(4);
    pub const LIGHT: SensorType = SensorType(5);
    pub const PROXIMITY: SensorType = SensorType(8);
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SensorType {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SensorType)
    }
}

/// One reading delivered by the sensor source.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub sensor_type: SensorType,
    /// Effect-specific channel layout, see each effect's docs
    pub values: Vec<f32>,
    /// Source timestamp in nanoseconds
    pub timestamp: u64,
}

impl SensorSample {
    pub fn new(sensor_type: SensorType, values: Vec<f32>, timestamp: u64) -> Self {
        Self {
            sensor_type,
            values,
            timestamp,
        }
    }
}

/// Translates raw sensor samples into named numeric output channels.
///
/// Every effect exposes its outputs as `f32` channels; the channel count comes
/// from [`Effect::output_channels`]. How samples combine (accumulate or replace)
/// is up to each effect.
pub trait Effect: Send {
    /// The sensor type this effect listens to
    fn sensor_type(&self) -> SensorType;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Names of the output channels, in index order
    fn output_channels(&self) -> &[&'static str];

    /// Fold a sample into the effect state and return the updated channels.
    ///
    /// Must run once per sample before channels are read, otherwise reads are
    /// stale.
    fn translate(&mut self, sample: &SensorSample) -> Result<Vec<f32>, EffectError>;

    /// Current value of channel `index`. Does not change state.
    fn transform_input(&self, index: usize) -> Result<f32, EffectError>;

    /// Return to the default (zero) state
    fn reset(&mut self);

    fn channel_count(&self) -> usize {
        self.output_channels().len()
    }
}

impl fmt::Debug for dyn Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("sensor_type", &self.sensor_type())
            .field("name", &self.name())
            .field("channels", &self.output_channels())
            .finish()
    }
}

/// Shared bounds check for channel reads
pub(crate) fn check_channel(effect: &dyn Effect, index: usize) -> Result<(), EffectError> {
    let channels = effect.channel_count();
    if index >= channels {
        return Err(EffectError::IndexOutOfRange {
            effect: effect.name().to_string(),
            index,
            channels,
        });
    }
    Ok(())
}

/// Shared sample-length check for translations
pub(crate) fn check_sample(effect: &dyn Effect, sample: &SensorSample, expected: usize) -> Result<(), EffectError> {
    if sample.values.len() < expected {
        return Err(EffectError::MissingSampleValues {
            effect: effect.name().to_string(),
            expected,
            actual: sample.values.len(),
        });
    }
    Ok(())
}
