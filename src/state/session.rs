use futures::FutureExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::canvas::{Canvas, PaintTool};
use crate::command::{Command, CommandError, StrokeHistory};
use crate::config::CanvasConfig;
use crate::effect::{
    Effect, EffectListener, EffectRegistry, EffectRoutingContext, SensorSample, SensorSource, SensorType,
};
use crate::error::{CanvasError, EffectError, ListenerError, SerializeError, SessionError, SyncResult};
use crate::event::{CanvasEvent, EventBus, EventHandler, SessionEvent, TouchEvent, TouchPhase};
use crate::layer::{EffectBinding, LayerId, LayerTransformInput};
use crate::pixel_buffer::{Argb, PixelPos};
use crate::renderer::Compositor;
use crate::serializer::{self, Painting, PaintingMetadata, RemotePainting};
use crate::store::{PaintingStore, RemoteStore};
use crate::util::time::{self, SessionClock};

/// Millisecond clock used for the painting timer and layer timestamps
pub type TimeSource = Box<dyn Fn() -> u64 + Send>;

/// What the current touch sequence is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// A stroke is in progress on the active layer
    Painting,
    /// Several pointers are down; nothing is painted until all lift
    Gesture,
}

/// Cloneable sender for touch and sensor producers on any thread.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Queue an event. Returns false once the session is gone.
    pub fn post(&self, event: SessionEvent) -> bool {
        self.sender.unbounded_send(event).is_ok()
    }

    pub fn touch(&self, touch: TouchEvent) -> bool {
        self.post(SessionEvent::Touch(touch))
    }

    pub fn sensor(&self, sample: SensorSample) -> bool {
        self.post(SessionEvent::Sensor(sample))
    }
}

/// The single owner of a painting in progress.
///
/// Touch input and sensor samples both mutate layers, so neither touches the
/// canvas directly. Producers post [`SessionEvent`]s through a
/// [`SessionHandle`] and the owner thread applies them in arrival order with
/// [`PaintingSession::pump`].
///
/// Effect listeners depend on the active layer. While a layer is being edited
/// no effect moves anything; with no active layer every bound effect drives
/// its layers. Every change of the active layer resets all effects so no
/// accumulated motion carries over.
///
/// # Example
///
/// ```rust,no_run
/// use drawit_canvas::config::CanvasConfig;
/// use drawit_canvas::effect::EffectRegistry;
/// use drawit_canvas::state::PaintingSession;
///
/// let mut session = PaintingSession::new(CanvasConfig::default(), EffectRegistry::new());
/// let handle = session.handle();
/// // hand `handle` to the input threads, then on the owner thread:
/// session.pump();
/// ```
pub struct PaintingSession {
    config: CanvasConfig,
    canvas: Canvas,
    history: StrokeHistory,
    routing: EffectRoutingContext<Canvas>,
    events: EventBus,
    compositor: Compositor,
    gesture: GestureState,
    clock: SessionClock,
    now: TimeSource,
    metadata: PaintingMetadata,
    sensors: Option<Box<dyn SensorSource + Send>>,
    paused: bool,
    inbox: UnboundedReceiver<SessionEvent>,
    sender: UnboundedSender<SessionEvent>,
}

impl std::fmt::Debug for PaintingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintingSession")
            .field("painting", &self.metadata.id)
            .field("layers", &self.canvas.layers().len())
            .field("active", &self.canvas.active_layer_index())
            .field("gesture", &self.gesture)
            .field("paused", &self.paused)
            .field("routing", &self.routing)
            .finish()
    }
}

fn apply_bindings_listener() -> EffectListener<Canvas> {
    Box::new(
        |effect: &dyn Effect, _: &SensorSample, canvas: &mut Canvas| -> Result<(), ListenerError> {
            canvas.apply_effect(effect)?;
            Ok(())
        },
    )
}

impl PaintingSession {
    pub fn new(config: CanvasConfig, registry: EffectRegistry) -> Self {
        Self::with_time_source(config, registry, Box::new(time::timestamp_millis))
    }

    pub fn with_time_source(config: CanvasConfig, registry: EffectRegistry, now: TimeSource) -> Self {
        let canvas = Canvas::new(&config);
        Self::assemble(config, canvas, registry, now, PaintingMetadata::default(), 0)
    }

    /// Continue a stored painting. The timer resumes from its stored value.
    pub fn from_painting(
        painting: &Painting,
        config: CanvasConfig,
        registry: EffectRegistry,
        now: TimeSource,
    ) -> Result<Self, SerializeError> {
        let canvas = serializer::from_persisted(painting, &config)?;
        let elapsed_ms = painting.time_taken_seconds.saturating_mul(1000);
        Ok(Self::assemble(config, canvas, registry, now, painting.metadata(), elapsed_ms))
    }

    fn assemble(
        config: CanvasConfig,
        canvas: Canvas,
        registry: EffectRegistry,
        now: TimeSource,
        metadata: PaintingMetadata,
        elapsed_ms: u64,
    ) -> Self {
        let (sender, inbox) = mpsc::unbounded();
        let clock = SessionClock::start(now().saturating_sub(elapsed_ms));
        let mut session = Self {
            history: StrokeHistory::new(config.history_capacity),
            compositor: Compositor::new(&config),
            config,
            canvas,
            routing: EffectRoutingContext::new(registry),
            events: EventBus::new(),
            gesture: GestureState::Idle,
            clock,
            now,
            metadata,
            sensors: None,
            paused: false,
            inbox,
            sender,
        };
        session.rewire_effects();
        log::info!(
            "painting session {} started with {} layers",
            session.metadata.id,
            session.canvas.layers().len()
        );
        session
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    pub fn routing(&self) -> &EffectRoutingContext<Canvas> {
        &self.routing
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn metadata(&self) -> &PaintingMetadata {
        &self.metadata
    }

    /// Theme, mode and id. The time taken is filled in by the session clock.
    pub fn metadata_mut(&mut self) -> &mut PaintingMetadata {
        &mut self.metadata
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.events.subscribe(handler);
    }

    pub fn render(&self, view_size: [usize; 2]) -> egui::ColorImage {
        self.compositor.composite(self.canvas.layers(), view_size)
    }

    fn now_ms(&self) -> u64 {
        (self.now)()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.clock.elapsed_secs(self.now_ms())
    }

    /// Apply every queued event, in arrival order. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(Some(event)) = self.inbox.try_next() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Touch(touch) => {
                if let Err(err) = self.handle_touch(&touch) {
                    log::info!("touch {:?} ignored: {}", touch.phase, err);
                }
            }
            SessionEvent::Sensor(sample) => self.handle_sensor(&sample),
        }
    }

    fn handle_sensor(&mut self, sample: &SensorSample) {
        if self.paused {
            log::trace!("paused, dropping sample for sensor type {}", sample.sensor_type);
            return;
        }
        if self.routing.on_sample(sample, &mut self.canvas) > 0 {
            self.events.emit(CanvasEvent::Invalidated);
        }
    }

    /// Drive the gesture state machine with one touch sample.
    pub fn handle_touch(&mut self, touch: &TouchEvent) -> Result<(), CanvasError> {
        if touch.pointer_count > 1 {
            if self.gesture == GestureState::Painting {
                self.finish_stroke();
            }
            if self.gesture != GestureState::Gesture {
                log::debug!("multi-touch gesture with {} pointers", touch.pointer_count);
            }
            self.gesture = GestureState::Gesture;
            return Ok(());
        }

        match (self.gesture, touch.phase) {
            (GestureState::Gesture, TouchPhase::Up | TouchPhase::Cancel) => {
                self.gesture = GestureState::Idle;
                Ok(())
            }
            (GestureState::Gesture, _) => Ok(()),
            (_, TouchPhase::Down) => self.begin_touch(touch),
            (GestureState::Painting, TouchPhase::Move) => {
                let (index, pos) = self.touch_target(touch)?;
                self.canvas.paint_at(index, pos, true)?;
                self.events.emit(CanvasEvent::Invalidated);
                Ok(())
            }
            (GestureState::Painting, TouchPhase::Up) => {
                let painted = self
                    .touch_target(touch)
                    .and_then(|(index, pos)| self.canvas.paint_at(index, pos, true));
                self.finish_stroke();
                painted.map(|_| ())
            }
            (GestureState::Painting, TouchPhase::Cancel) => {
                self.finish_stroke();
                Ok(())
            }
            (GestureState::Idle, _) => Ok(()),
        }
    }

    fn touch_target(&self, touch: &TouchEvent) -> Result<(usize, PixelPos), CanvasError> {
        let index = self.canvas.active_layer_index().ok_or(CanvasError::NoActiveLayer)?;
        Ok((index, self.canvas.map_view_to_layer(index, touch.view_size, touch.view_pos)))
    }

    fn begin_touch(&mut self, touch: &TouchEvent) -> Result<(), CanvasError> {
        if self.gesture == GestureState::Painting {
            self.finish_stroke();
        }
        self.gesture = GestureState::Idle;
        let (index, pos) = self.touch_target(touch)?;

        if self.canvas.current_tool() == PaintTool::Fill {
            self.fill_at(index, pos)?;
            return Ok(());
        }

        let layer = self.canvas.layer(index).ok_or(CanvasError::NoActiveLayer)?;
        self.history.begin_stroke(layer);
        self.canvas.set_last_draw_point(None);
        if let Err(err) = self.canvas.paint_at(index, pos, false) {
            self.history.cancel_stroke();
            return Err(err);
        }
        self.gesture = GestureState::Painting;
        self.events.emit(CanvasEvent::Invalidated);
        Ok(())
    }

    /// Flood fill on the layer at `index`, recorded for undo.
    fn fill_at(&mut self, index: usize, pos: PixelPos) -> Result<usize, CanvasError> {
        let now = self.now_ms();
        let layer = self.canvas.layer(index).ok_or(CanvasError::NoActiveLayer)?;
        let (layer_id, before) = (layer.id, layer.buffer().clone());

        let filled = self.canvas.fill(pos.x, pos.y)?;
        if filled == 0 {
            return Ok(0);
        }
        if let Some(layer) = self.canvas.layer_mut(index) {
            layer.touch(now);
            self.history.push(Command::Fill {
                layer_id,
                before,
                after: layer.buffer().clone(),
            });
        }
        self.emit_history_changed();
        self.events.emit(CanvasEvent::Invalidated);
        Ok(filled)
    }

    /// Close the stroke in progress and record it.
    fn finish_stroke(&mut self) {
        self.gesture = GestureState::Idle;
        self.canvas.set_last_draw_point(None);

        match self.history.end_stroke(&self.canvas) {
            Ok(true) => {
                let now = self.now_ms();
                if let Some(index) = self.canvas.active_layer_index() {
                    if let Some(layer) = self.canvas.layer_mut(index) {
                        layer.touch(now);
                    }
                }
                self.emit_history_changed();
            }
            Ok(false) => {}
            Err(err) => log::warn!("stroke was not recorded: {}", err),
        }
        self.events.emit(CanvasEvent::Invalidated);
    }

    fn finish_pending_stroke(&mut self) {
        if self.gesture == GestureState::Painting {
            self.finish_stroke();
        }
    }

    fn emit_history_changed(&self) {
        self.events.emit(CanvasEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn emit_layers_changed(&self) {
        self.events.emit(CanvasEvent::LayersChanged {
            count: self.canvas.layers().len(),
            active: self.canvas.active_layer_index(),
        });
        self.events.emit(CanvasEvent::Invalidated);
    }

    /// Rebuild effect listeners for the current active-layer state and bring
    /// sensor registrations in line.
    fn rewire_effects(&mut self) {
        self.routing.clear_listeners();

        if self.canvas.active_layer_index().is_none() {
            for effect_type in self.canvas.bound_effect_types() {
                if self.routing.registry().contains(effect_type) {
                    self.routing.add_listener(effect_type, apply_bindings_listener());
                } else {
                    log::warn!("a layer binds sensor type {} but no effect exists for it", effect_type);
                }
            }
        }
        self.sync_sensors();
    }

    fn sync_sensors(&mut self) {
        if self.paused {
            return;
        }
        if let Some(source) = self.sensors.as_deref_mut() {
            self.routing.register_sensors(source);
        }
    }

    fn after_active_layer_change(&mut self) {
        self.routing.reset_all();
        self.rewire_effects();
        self.emit_layers_changed();
    }

    /// Select the layer to edit, or `None` to preview effects.
    pub fn set_active_layer(&mut self, index: Option<usize>) -> Result<(), CanvasError> {
        self.finish_pending_stroke();
        self.canvas.set_active_layer(index)?;
        self.after_active_layer_change();
        Ok(())
    }

    /// Add a layer named `Layer{n}` on top and start editing it.
    pub fn new_layer(&mut self) -> LayerId {
        self.finish_pending_stroke();
        let id = self.canvas.new_layer_action();
        self.after_active_layer_change();
        id
    }

    pub fn add_layer(&mut self, name: &str) -> LayerId {
        self.finish_pending_stroke();
        let id = self.canvas.add_layer(name);
        self.after_active_layer_change();
        id
    }

    /// Delete a layer along with its bindings and history.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), CanvasError> {
        self.finish_pending_stroke();
        let was_active = self.canvas.active_layer().is_some_and(|l| l.id == id);
        self.canvas.remove_layer(id).ok_or(CanvasError::LayerNotFound(id))?;
        self.history.forget_layer(id);

        if was_active {
            self.routing.reset_all();
        }
        self.rewire_effects();
        self.emit_layers_changed();
        self.emit_history_changed();
        Ok(())
    }

    /// Bind channel `output_index` of the effect for `effect_type` to a layer
    /// property. Returns the new binding's id.
    pub fn bind_effect(
        &mut self,
        layer_id: LayerId,
        effect_type: SensorType,
        output_index: usize,
        input: LayerTransformInput,
    ) -> Result<Uuid, SessionError> {
        let effect = self
            .routing
            .registry()
            .get(effect_type)
            .ok_or(EffectError::UnknownEffect(effect_type))?;
        effect.transform_input(output_index)?;

        let layer = self
            .canvas
            .layer_by_id_mut(layer_id)
            .ok_or(CanvasError::LayerNotFound(layer_id))?;
        let binding = EffectBinding::new(output_index, input);
        layer.bind(effect_type, binding);
        log::debug!(
            "layer {}: {} channel {} drives {}",
            layer_id,
            effect_type,
            output_index,
            input
        );

        self.rewire_effects();
        Ok(binding.id)
    }

    /// Remove one binding. Returns false if it did not exist.
    pub fn unbind(&mut self, layer_id: LayerId, effect_type: SensorType, binding_id: Uuid) -> Result<bool, CanvasError> {
        let layer = self
            .canvas
            .layer_by_id_mut(layer_id)
            .ok_or(CanvasError::LayerNotFound(layer_id))?;
        let removed = layer.remove_binding(effect_type, binding_id).is_some();
        self.rewire_effects();
        Ok(removed)
    }

    /// Remove every binding of `effect_type` from a layer.
    pub fn unbind_effect(&mut self, layer_id: LayerId, effect_type: SensorType) -> Result<usize, CanvasError> {
        let layer = self
            .canvas
            .layer_by_id_mut(layer_id)
            .ok_or(CanvasError::LayerNotFound(layer_id))?;
        let removed = layer.remove_effect_binding(effect_type).map_or(0, |b| b.len());
        self.rewire_effects();
        Ok(removed)
    }

    pub fn set_tool(&mut self, tool: PaintTool) {
        if tool != self.canvas.current_tool() {
            self.finish_pending_stroke();
        }
        self.canvas.set_tool(tool);
    }

    pub fn set_color(&mut self, color: Argb) {
        self.canvas.set_color(color);
    }

    pub fn set_brush_size(&mut self, size: u32) -> Result<(), CanvasError> {
        self.canvas.set_brush_size(size)
    }

    pub fn undo(&mut self) -> Result<LayerId, CommandError> {
        self.finish_pending_stroke();
        let layer_id = self.history.undo(&mut self.canvas)?;
        self.after_history_step(layer_id);
        Ok(layer_id)
    }

    pub fn redo(&mut self) -> Result<LayerId, CommandError> {
        self.finish_pending_stroke();
        let layer_id = self.history.redo(&mut self.canvas)?;
        self.after_history_step(layer_id);
        Ok(layer_id)
    }

    fn after_history_step(&mut self, layer_id: LayerId) {
        let now = self.now_ms();
        if let Some(layer) = self.canvas.layer_by_id_mut(layer_id) {
            layer.touch(now);
        }
        self.emit_history_changed();
        self.events.emit(CanvasEvent::Invalidated);
    }

    /// Use `source` for sensor delivery, replacing any previous source.
    pub fn attach_sensor_source(&mut self, source: Box<dyn SensorSource + Send>) {
        if let Some(mut previous) = self.sensors.take() {
            self.routing.unregister_sensors(previous.as_mut());
        }
        self.sensors = Some(source);
        self.sync_sensors();
    }

    /// Stop the timer and sensor delivery. A stroke in progress is closed.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.finish_pending_stroke();
        self.gesture = GestureState::Idle;
        self.clock.pause(self.now_ms());
        if let Some(source) = self.sensors.as_deref_mut() {
            self.routing.unregister_sensors(source);
        }
        self.paused = true;
        log::debug!("session {} paused", self.metadata.id);
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.clock.resume(self.now_ms());
        self.paused = false;
        self.sync_sensors();
        log::debug!("session {} resumed", self.metadata.id);
    }

    /// The canvas in persisted form, with the time taken so far.
    pub fn snapshot_painting(&self) -> Painting {
        let metadata = PaintingMetadata {
            time_taken_seconds: self.elapsed_secs(),
            ..self.metadata.clone()
        };
        serializer::to_persisted(&self.canvas, &metadata)
    }

    /// Save the painting locally, then push it to the remote store.
    ///
    /// Best effort: the first failure is returned and nothing is retried.
    pub fn submit<'a>(
        &self,
        store: &'a dyn PaintingStore,
        remote: &'a dyn RemoteStore,
        user_id: &str,
    ) -> BoxFuture<'a, SyncResult<Painting>> {
        let painting = self.snapshot_painting();
        let document = RemotePainting::from_painting(&painting, user_id, self.now_ms());

        async move {
            if let Err(err) = store.upsert(&painting) {
                log::error!("failed to save painting {}: {}", painting.id, err);
                return Err(err);
            }
            if let Err(err) = remote.push(document).await {
                log::error!("failed to push painting {}: {}", painting.id, err);
                return Err(err);
            }
            log::info!("submitted painting {}", painting.id);
            Ok(painting)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use egui::{Pos2, Vec2};
    use parking_lot::Mutex;

    use super::*;
    use crate::effect::SensorInfo;
    use crate::event::EventLog;
    use crate::pixel_buffer::TRANSPARENT;
    use crate::store::{MemoryPaintingStore, MemoryRemoteStore};

    const VIEW: Vec2 = Vec2::new(160.0, 160.0);

    #[derive(Default, Clone)]
    struct RecordingSource {
        registered: Arc<Mutex<BTreeSet<SensorType>>>,
        register_calls: Arc<AtomicU64>,
    }

    impl SensorSource for RecordingSource {
        fn register(&mut self, sensor_type: SensorType) -> bool {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            self.registered.lock().insert(sensor_type);
            true
        }

        fn unregister(&mut self, sensor_type: SensorType) {
            self.registered.lock().remove(&sensor_type);
        }
    }

    fn session_with_clock() -> (PaintingSession, Arc<AtomicU64>) {
        let clock = Arc::new(AtomicU64::new(10_000));
        let source = clock.clone();
        let config = CanvasConfig {
            layer_width: 16,
            layer_height: 16,
            ..CanvasConfig::default()
        };
        let registry = EffectRegistry::discover(
            &[
                SensorInfo::new(SensorType::GYROSCOPE, "gyro"),
                SensorInfo::new(SensorType::LIGHT, "light"),
            ],
            &config,
        );
        let session =
            PaintingSession::with_time_source(config, registry, Box::new(move || source.load(Ordering::SeqCst)));
        (session, clock)
    }

    fn touch(phase: TouchPhase, x: f32, y: f32) -> TouchEvent {
        TouchEvent::new(phase, Pos2::new(x, y), VIEW)
    }

    #[test]
    fn stroke_runs_through_the_queue() {
        let (mut session, _) = session_with_clock();
        let handle = session.handle();
        handle.touch(touch(TouchPhase::Down, 0.0, 0.0));
        handle.touch(touch(TouchPhase::Move, 50.0, 0.0));
        handle.touch(touch(TouchPhase::Up, 100.0, 0.0));

        assert_eq!(session.pump(), 3);
        assert_eq!(session.gesture_state(), GestureState::Idle);
        let buffer = session.canvas().layers()[0].buffer();
        for x in 0..=10 {
            assert_ne!(buffer.get(x, 0).unwrap(), TRANSPARENT, "gap at x={}", x);
        }
        assert!(session.history().can_undo());

        session.undo().unwrap();
        assert!(session.canvas().layers()[0].buffer().pixels().iter().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn multi_touch_never_paints() {
        let (mut session, _) = session_with_clock();
        session.handle_touch(&touch(TouchPhase::Down, 10.0, 10.0).with_pointers(2)).unwrap();
        assert_eq!(session.gesture_state(), GestureState::Gesture);

        session.handle_touch(&touch(TouchPhase::Move, 40.0, 40.0)).unwrap();
        session.handle_touch(&touch(TouchPhase::Up, 40.0, 40.0)).unwrap();
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert!(!session.history().can_undo());
    }

    #[test]
    fn touch_without_active_layer_is_reported() {
        let (mut session, _) = session_with_clock();
        session.set_active_layer(None).unwrap();
        assert_eq!(
            session.handle_touch(&touch(TouchPhase::Down, 1.0, 1.0)),
            Err(CanvasError::NoActiveLayer)
        );
        assert_eq!(session.gesture_state(), GestureState::Idle);
    }

    #[test]
    fn fill_tool_fills_on_down_only() {
        let (mut session, _) = session_with_clock();
        let log = EventLog::new();
        session.subscribe(Box::new(log.clone()));
        session.set_tool(PaintTool::Fill);
        session.set_color(0xFF00_FF00);

        session.handle_touch(&touch(TouchPhase::Down, 5.0, 5.0)).unwrap();
        session.handle_touch(&touch(TouchPhase::Move, 50.0, 50.0)).unwrap();
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert!(session.canvas().layers()[0].buffer().pixels().iter().all(|p| *p == 0xFF00_FF00));
        assert!(log.take().contains(&CanvasEvent::HistoryChanged { can_undo: true, can_redo: false }));
    }

    #[test]
    fn effects_only_drive_layers_in_preview() {
        let (mut session, _) = session_with_clock();
        let layer_id = session.canvas().layers()[0].id;
        session
            .bind_effect(layer_id, SensorType::GYROSCOPE, 0, LayerTransformInput::XPos)
            .unwrap();
        let sample = SensorSample::new(SensorType::GYROSCOPE, vec![2.0, 0.0, 0.0], 0);

        // editing: the layer holds still
        session.handle_event(SessionEvent::Sensor(sample.clone()));
        assert_eq!(session.canvas().layers()[0].offset, (0, 0));

        session.set_active_layer(None).unwrap();
        session.handle_event(SessionEvent::Sensor(sample.clone()));
        session.handle_event(SessionEvent::Sensor(sample));
        assert_eq!(session.canvas().layers()[0].offset, (4, 0));
    }

    #[test]
    fn activating_a_layer_resets_effects() {
        let (mut session, _) = session_with_clock();
        let layer_id = session.canvas().layers()[0].id;
        session
            .bind_effect(layer_id, SensorType::GYROSCOPE, 0, LayerTransformInput::XPos)
            .unwrap();
        session.set_active_layer(None).unwrap();
        session.handle_event(SessionEvent::Sensor(SensorSample::new(SensorType::GYROSCOPE, vec![3.0, 0.0, 0.0], 0)));

        session.set_active_layer(Some(0)).unwrap();
        let gyro = session.routing().registry().get(SensorType::GYROSCOPE).unwrap();
        assert_eq!(gyro.transform_input(0), Ok(0.0));
    }

    #[test]
    fn binding_requires_a_known_channel() {
        let (mut session, _) = session_with_clock();
        let layer_id = session.canvas().layers()[0].id;

        assert!(matches!(
            session.bind_effect(layer_id, SensorType::LIGHT, 1, LayerTransformInput::XPos),
            Err(SessionError::Effect(EffectError::IndexOutOfRange { .. }))
        ));
        assert_eq!(
            session.bind_effect(layer_id, SensorType::PROXIMITY, 0, LayerTransformInput::XPos),
            Err(SessionError::Effect(EffectError::UnknownEffect(SensorType::PROXIMITY)))
        );
        assert!(!session.canvas().layers()[0].has_effect(SensorType::LIGHT));
    }

    #[test]
    fn pause_excludes_time_and_sensors() {
        let (mut session, clock) = session_with_clock();
        let source = RecordingSource::default();
        session.attach_sensor_source(Box::new(source.clone()));
        let layer_id = session.canvas().layers()[0].id;
        session
            .bind_effect(layer_id, SensorType::LIGHT, 0, LayerTransformInput::YPos)
            .unwrap();
        session.set_active_layer(None).unwrap();
        assert!(source.registered.lock().contains(&SensorType::LIGHT));

        clock.store(15_000, Ordering::SeqCst);
        session.pause();
        assert!(source.registered.lock().is_empty());
        clock.store(60_000, Ordering::SeqCst);
        session.resume();
        clock.store(62_000, Ordering::SeqCst);

        assert_eq!(session.elapsed_secs(), 7);
        assert!(source.registered.lock().contains(&SensorType::LIGHT));

        // registering again without a pause changes nothing
        let calls = source.register_calls.load(Ordering::SeqCst);
        session.resume();
        session.set_active_layer(None).unwrap();
        assert_eq!(source.register_calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn removing_a_layer_drops_its_history() {
        let (mut session, _) = session_with_clock();
        session.handle_touch(&touch(TouchPhase::Down, 1.0, 1.0)).unwrap();
        session.handle_touch(&touch(TouchPhase::Up, 1.0, 1.0)).unwrap();
        let first = session.canvas().layers()[0].id;

        let second = session.new_layer();
        assert_eq!(session.canvas().layers()[1].name, "Layer2");
        assert_eq!(session.canvas().active_layer().map(|l| l.id), Some(second));

        session.remove_layer(first).unwrap();
        assert!(!session.history().can_undo());
        assert_eq!(session.canvas().active_layer_index(), Some(0));
        assert_eq!(session.remove_layer(first), Err(CanvasError::LayerNotFound(first)));
    }

    #[test]
    fn removing_a_bound_layer_drops_its_listener() {
        let (mut session, _) = session_with_clock();
        let source = RecordingSource::default();
        session.attach_sensor_source(Box::new(source.clone()));
        let bound = session.canvas().layers()[0].id;
        session
            .bind_effect(bound, SensorType::GYROSCOPE, 0, LayerTransformInput::XPos)
            .unwrap();
        session.add_layer("plain");
        session.set_active_layer(None).unwrap();

        assert_eq!(session.routing().listener_count(SensorType::GYROSCOPE), 1);
        assert!(session.routing().is_registered(SensorType::GYROSCOPE));
        assert!(source.registered.lock().contains(&SensorType::GYROSCOPE));

        session.remove_layer(bound).unwrap();
        assert_eq!(session.canvas().layers().len(), 1);
        assert_eq!(session.routing().listener_count(SensorType::GYROSCOPE), 0);
        assert!(!session.routing().is_registered(SensorType::GYROSCOPE));
        assert!(source.registered.lock().is_empty());

        // samples for the dropped binding no longer move anything
        session.handle_event(SessionEvent::Sensor(SensorSample::new(SensorType::GYROSCOPE, vec![4.0, 0.0, 0.0], 0)));
        assert_eq!(session.canvas().layers()[0].offset, (0, 0));
    }

    #[test]
    fn submit_stamps_the_document_with_the_session_clock() {
        let (session, clock) = session_with_clock();
        clock.store(1_700_000_000_000, Ordering::SeqCst);
        let store = MemoryPaintingStore::new();
        let remote = MemoryRemoteStore::new();

        let painting = futures::executor::block_on(session.submit(&store, &remote, "artist")).unwrap();
        let document = futures::executor::block_on(remote.pull(&painting.id)).unwrap();
        assert_eq!(document.created_at, 1_700_000_000_000);
    }

    #[test]
    fn snapshot_records_time_taken() {
        let (mut session, clock) = session_with_clock();
        session.metadata_mut().theme = "ocean".into();
        clock.store(25_500, Ordering::SeqCst);

        let painting = session.snapshot_painting();
        assert_eq!(painting.time_taken_seconds, 15);
        assert_eq!(painting.theme, "ocean");
        assert_eq!(painting.layers.len(), 1);
    }
}
