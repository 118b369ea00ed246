use std::collections::BTreeMap;

use super::{Effect, GyroscopeEffect, LightEffect, SensorType};
use crate::config::CanvasConfig;

/// A sensor reported by the device
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    pub sensor_type: SensorType,
    pub name: String,
}

impl SensorInfo {
    pub fn new(sensor_type: SensorType, name: &str) -> Self {
        Self {
            sensor_type,
            name: name.to_string(),
        }
    }
}

/// Holds the single live effect for each sensor type the device supports.
#[derive(Default)]
pub struct EffectRegistry {
    effects: BTreeMap<SensorType, Box<dyn Effect>>,
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.effects.values().map(|e| e.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the sensors the device reports.
    ///
    /// Sensors without an effect implementation are skipped, and only the first
    /// sensor of each type gets an effect.
    pub fn discover(sensors: &[SensorInfo], config: &CanvasConfig) -> Self {
        let mut registry = Self::new();
        for sensor in sensors {
            if registry.contains(sensor.sensor_type) {
                continue;
            }
            match Self::create_effect(sensor.sensor_type, config) {
                Some(effect) => {
                    log::debug!("effect {} bound to sensor {:?}", effect.name(), sensor.name);
                    registry.insert(effect);
                }
                None => {
                    log::info!(
                        "no effect mapped for sensor {:?} of type {}",
                        sensor.name,
                        sensor.sensor_type
                    );
                }
            }
        }
        registry
    }

    fn create_effect(sensor_type: SensorType, config: &CanvasConfig) -> Option<Box<dyn Effect>> {
        match sensor_type {
            SensorType::GYROSCOPE => Some(Box::new(GyroscopeEffect::new())),
            SensorType::LIGHT => Some(Box::new(LightEffect::new(config.light_calibration))),
            _ => None,
        }
    }

    /// Add or replace the effect for its sensor type
    pub fn insert(&mut self, effect: Box<dyn Effect>) -> Option<Box<dyn Effect>> {
        self.effects.insert(effect.sensor_type(), effect)
    }

    pub fn contains(&self, sensor_type: SensorType) -> bool {
        self.effects.contains_key(&sensor_type)
    }

    pub fn get(&self, sensor_type: SensorType) -> Option<&dyn Effect> {
        self.effects.get(&sensor_type).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, sensor_type: SensorType) -> Option<&mut (dyn Effect + 'static)> {
        self.effects.get_mut(&sensor_type).map(|e| e.as_mut())
    }

    pub fn effects(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.values().map(|e| e.as_ref())
    }

    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.effects.keys().copied()
    }

    pub fn reset_all(&mut self) {
        for effect in self.effects.values_mut() {
            effect.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SensorSample;

    fn device_sensors() -> Vec<SensorInfo> {
        vec![
            SensorInfo::new(SensorType::ACCELEROMETER, "accel"),
            SensorInfo::new(SensorType::GYROSCOPE, "gyro-main"),
            SensorInfo::new(SensorType::GYROSCOPE, "gyro-uncalibrated"),
            SensorInfo::new(SensorType::LIGHT, "ambient"),
            SensorInfo::new(SensorType::PROXIMITY, "prox"),
        ]
    }

    #[test]
    fn discovers_only_mapped_sensors() {
        let registry = EffectRegistry::discover(&device_sensors(), &CanvasConfig::default());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(SensorType::GYROSCOPE));
        assert!(registry.contains(SensorType::LIGHT));
        assert!(!registry.contains(SensorType::ACCELEROMETER));
    }

    #[test]
    fn light_uses_configured_calibration() {
        let config = CanvasConfig {
            light_calibration: 1.0,
            ..CanvasConfig::default()
        };
        let mut registry = EffectRegistry::discover(&device_sensors(), &config);
        let light = registry.get_mut(SensorType::LIGHT).unwrap();
        light.translate(&SensorSample::new(SensorType::LIGHT, vec![42.0], 0)).unwrap();
        assert_eq!(light.transform_input(0).unwrap(), 42.0);
    }

    #[test]
    fn reset_all_clears_every_effect() {
        let mut registry = EffectRegistry::discover(&device_sensors(), &CanvasConfig::default());
        registry
            .get_mut(SensorType::GYROSCOPE)
            .unwrap()
            .translate(&SensorSample::new(SensorType::GYROSCOPE, vec![1.0, 2.0, 3.0], 0))
            .unwrap();

        registry.reset_all();
        let gyro = registry.get(SensorType::GYROSCOPE).unwrap();
        assert_eq!(gyro.transform_input(2).unwrap(), 0.0);
    }
}
