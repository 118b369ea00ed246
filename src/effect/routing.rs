use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};

use super::{Effect, EffectRegistry, SensorSample, SensorType};
use crate::error::ListenerError;

/// Callback run for every sample of the sensor type it was registered for.
///
/// The effect has already folded the sample in when the listener runs. `T` is
/// whatever state the owner lets listeners mutate (usually the canvas).
pub type EffectListener<T> =
    Box<dyn FnMut(&dyn Effect, &SensorSample, &mut T) -> Result<(), ListenerError> + Send>;

/// Handle for removing a single listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// The device's sensor delivery service
pub trait SensorSource {
    /// Start delivering samples for `sensor_type`. Returns false if the
    /// device has no such sensor.
    fn register(&mut self, sensor_type: SensorType) -> bool;

    fn unregister(&mut self, sensor_type: SensorType);
}

/// Per-screen routing table from sensor types to listeners.
///
/// Owns the effect registry, so every sample is translated by the one shared
/// effect before any listener reads it.
pub struct EffectRoutingContext<T> {
    registry: EffectRegistry,
    listeners: BTreeMap<SensorType, Vec<(ListenerId, EffectListener<T>)>>,
    next_listener_id: u64,
    registered: BTreeSet<SensorType>,
}

impl<T> std::fmt::Debug for EffectRoutingContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRoutingContext")
            .field("registry", &self.registry)
            .field(
                "listeners",
                &self.listeners.iter().map(|(t, l)| (*t, l.len())).collect::<Vec<_>>(),
            )
            .field("registered", &self.registered)
            .finish()
    }
}

impl<T> EffectRoutingContext<T> {
    pub fn new(registry: EffectRegistry) -> Self {
        Self {
            registry,
            listeners: BTreeMap::new(),
            next_listener_id: 0,
            registered: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    /// Register interest in `sensor_type`. Listeners run in registration order.
    pub fn add_listener(&mut self, sensor_type: SensorType, listener: EffectListener<T>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.entry(sensor_type).or_default().push((id, listener));
        log::debug!("listener {:?} registered for sensor type {}", id, sensor_type);
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, listeners| {
            let before = listeners.len();
            listeners.retain(|(listener_id, _)| *listener_id != id);
            removed |= listeners.len() != before;
            !listeners.is_empty()
        });
        removed
    }

    pub fn remove_listeners(&mut self, sensor_type: SensorType) {
        self.listeners.remove(&sensor_type);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Sensor types with at least one listener
    pub fn listened_types(&self) -> BTreeSet<SensorType> {
        self.listeners.keys().copied().collect()
    }

    pub fn listener_count(&self, sensor_type: SensorType) -> usize {
        self.listeners.get(&sensor_type).map_or(0, Vec::len)
    }

    /// Route one sample: translate it with the matching effect, then run every
    /// listener for its type.
    ///
    /// A listener that errors or panics is logged and skipped; the rest still
    /// run. Returns the number of listeners that completed.
    pub fn on_sample(&mut self, sample: &SensorSample, target: &mut T) -> usize {
        let Some(effect) = self.registry.get_mut(sample.sensor_type) else {
            return 0;
        };
        let Some(listeners) = self.listeners.get_mut(&sample.sensor_type) else {
            return 0;
        };

        if let Err(err) = effect.translate(sample) {
            log::warn!("dropping sample for sensor type {}: {}", sample.sensor_type, err);
            return 0;
        }
        let effect: &dyn Effect = effect;

        let mut completed = 0;
        for (id, listener) in listeners.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(effect, sample, target)));
            match outcome {
                Ok(Ok(())) => completed += 1,
                Ok(Err(err)) => {
                    log::error!("listener {:?} for {} failed: {}", id, effect.name(), err);
                }
                Err(_) => {
                    log::error!("listener {:?} for {} panicked", id, effect.name());
                }
            }
        }
        completed
    }

    pub fn reset_all(&mut self) {
        self.registry.reset_all();
    }

    /// Bring source registrations in line with the listened types.
    ///
    /// Idempotent: types already registered are not registered again, and
    /// types nobody listens to any more are unregistered.
    pub fn register_sensors(&mut self, source: &mut dyn SensorSource) {
        let wanted = self.listened_types();

        let stale: Vec<SensorType> = self.registered.difference(&wanted).copied().collect();
        for sensor_type in stale {
            source.unregister(sensor_type);
            self.registered.remove(&sensor_type);
        }

        for sensor_type in wanted {
            if self.registered.contains(&sensor_type) {
                continue;
            }
            if source.register(sensor_type) {
                log::debug!("registered sensor type {}", sensor_type);
                self.registered.insert(sensor_type);
            } else {
                log::warn!("no sensor found for type {}", sensor_type);
            }
        }
    }

    pub fn unregister_sensors(&mut self, source: &mut dyn SensorSource) {
        for sensor_type in std::mem::take(&mut self.registered) {
            source.unregister(sensor_type);
        }
        log::debug!("unregistered all sensors");
    }

    pub fn is_registered(&self, sensor_type: SensorType) -> bool {
        self.registered.contains(&sensor_type)
    }
}
