use std::thread;

use drawit_canvas::config::CanvasConfig;
use drawit_canvas::effect::{EffectRegistry, SensorInfo, SensorSample, SensorType};
use drawit_canvas::error::SyncError;
use drawit_canvas::event::{CanvasEvent, EventLog, TouchEvent, TouchPhase};
use drawit_canvas::layer::LayerTransformInput;
use drawit_canvas::state::PaintingSession;
use drawit_canvas::store::{MemoryPaintingStore, MemoryRemoteStore, PaintingStore};
use egui::{Pos2, Vec2};
use futures::executor::block_on;

fn session() -> PaintingSession {
    let config = CanvasConfig {
        layer_width: 32,
        layer_height: 32,
        ..CanvasConfig::default()
    };
    let registry = EffectRegistry::discover(&[SensorInfo::new(SensorType::GYROSCOPE, "gyro")], &config);
    PaintingSession::new(config, registry)
}

fn touch(phase: TouchPhase, x: f32, y: f32) -> TouchEvent {
    TouchEvent::new(phase, Pos2::new(x, y), Vec2::new(320.0, 320.0))
}

#[test]
fn test_producers_on_other_threads_are_serialized() {
    let mut session = session();
    let layer_id = session.canvas().layers()[0].id;
    session
        .bind_effect(layer_id, SensorType::GYROSCOPE, 1, LayerTransformInput::YPos)
        .unwrap();
    session.set_active_layer(None).unwrap();

    let sensor_handle = session.handle();
    let sensors = thread::spawn(move || {
        for i in 0..10 {
            sensor_handle.sensor(SensorSample::new(SensorType::GYROSCOPE, vec![0.0, 1.0, 0.0], i));
        }
    });
    sensors.join().unwrap();

    assert_eq!(session.pump(), 10);
    assert_eq!(session.canvas().layers()[0].offset, (0, 10));
}

#[test]
fn test_render_events_follow_edits() {
    let mut session = session();
    let log = EventLog::new();
    session.subscribe(Box::new(log.clone()));

    session.new_layer();
    let events = log.take();
    assert!(events.contains(&CanvasEvent::LayersChanged { count: 2, active: Some(1) }));

    session.handle_touch(&touch(TouchPhase::Down, 10.0, 10.0)).unwrap();
    assert!(log.needs_redraw());
    session.handle_touch(&touch(TouchPhase::Up, 100.0, 10.0)).unwrap();
    assert!(log.take().contains(&CanvasEvent::HistoryChanged { can_undo: true, can_redo: false }));

    session.undo().unwrap();
    assert!(log.take().contains(&CanvasEvent::HistoryChanged { can_undo: false, can_redo: true }));
}

#[test]
fn test_submit_saves_locally_then_pushes() {
    let mut session = session();
    session.handle_touch(&touch(TouchPhase::Down, 50.0, 50.0)).unwrap();
    session.handle_touch(&touch(TouchPhase::Up, 50.0, 50.0)).unwrap();
    session.metadata_mut().theme = "sunset".into();

    let store = MemoryPaintingStore::new();
    let remote = MemoryRemoteStore::new();
    let painting = block_on(session.submit(&store, &remote, "artist")).unwrap();

    assert_eq!(store.get_by_id(&painting.id).unwrap(), Some(painting.clone()));
    assert_eq!(remote.document_ids(), vec![painting.id.clone()]);
    let document = block_on(drawit_canvas::store::RemoteStore::pull(&remote, &painting.id)).unwrap();
    assert_eq!(document.theme, "sunset");
    assert_eq!(document.user_id, "artist");
}

#[test]
fn test_remote_failure_is_returned() {
    let session = session();
    let store = MemoryPaintingStore::new();
    let remote = MemoryRemoteStore::new();
    remote.set_failure(Some("offline".into()));

    let result = block_on(session.submit(&store, &remote, "artist"));
    assert!(matches!(result, Err(SyncError::Remote(message)) if message == "offline"));
    // the local copy was still written
    assert_eq!(store.len(), 1);
}

#[test]
fn test_reopened_painting_starts_in_preview() {
    let mut session = session();
    let layer_id = session.canvas().layers()[0].id;
    session
        .bind_effect(layer_id, SensorType::GYROSCOPE, 0, LayerTransformInput::XPos)
        .unwrap();
    let painting = session.snapshot_painting();

    let config = session.config().clone();
    let registry = EffectRegistry::discover(&[SensorInfo::new(SensorType::GYROSCOPE, "gyro")], &config);
    let mut reopened = PaintingSession::from_painting(&painting, config, registry, Box::new(|| 0u64)).unwrap();
    assert_eq!(reopened.canvas().active_layer_index(), None);
    assert_eq!(reopened.routing().listener_count(SensorType::GYROSCOPE), 1);

    reopened.handle().sensor(SensorSample::new(SensorType::GYROSCOPE, vec![6.0, 0.0, 0.0], 0));
    reopened.pump();
    assert_eq!(reopened.canvas().layers()[0].offset, (6, 0));
}
