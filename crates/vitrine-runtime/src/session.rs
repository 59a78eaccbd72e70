use crate::overlay::Overlay;
use crate::tween::{ENTRANCE_START_Y, Entrance};
use vitrine_gltf::{LoadEvent, LoadHandle};
use vitrine_scene::Scene;
use vitrine_scene::showcase::prepare_loaded;

/// Seconds the overlay lingers after the entrance animation completes.
pub const READY_HIDE_DELAY: f32 = 1.0;
/// Seconds the failure message stays up before the overlay hides.
pub const FAILURE_HIDE_DELAY: f32 = 2.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Pending,
    Entering,
    Settling,
    Done,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Fallback,
}

enum Phase {
    Idle,
    Pending(LoadHandle),
    Entering(Entrance),
    Settling { remaining: f32 },
    Done,
}

/// Drives one asset load from the first progress event to the overlay
/// disappearing. Advanced once per frame on the thread that owns the scene.
pub struct LoadSession {
    phase: Phase,
    model_ready: bool,
    outcome: Option<LoadOutcome>,
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            model_ready: false,
            outcome: None,
        }
    }

    /// Only one load per session. Returns `false` if a load was already
    /// started.
    pub fn start(&mut self, handle: LoadHandle, overlay: &mut Overlay) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            log::warn!("model load already started, ignoring new request");
            return false;
        }
        overlay.show_loading();
        self.phase = Phase::Pending(handle);
        true
    }

    pub fn advance(&mut self, scene: &mut Scene, overlay: &mut Overlay, dt: f32) {
        let next = match &mut self.phase {
            Phase::Idle | Phase::Done => None,
            Phase::Pending(handle) => {
                let outcome = poll_handle(handle, scene, overlay);
                match outcome {
                    Some(Ok(entrance)) => {
                        self.outcome = Some(LoadOutcome::Loaded);
                        Some(Phase::Entering(entrance))
                    }
                    Some(Err(())) => {
                        self.outcome = Some(LoadOutcome::Fallback);
                        Some(Phase::Settling {
                            remaining: FAILURE_HIDE_DELAY,
                        })
                    }
                    None => None,
                }
            }
            Phase::Entering(entrance) => {
                entrance.advance(dt);
                let transform = scene.active_transform_mut();
                transform.scale = entrance.scale.value();
                transform.translation.y = entrance.rise.value();

                if entrance.is_finished() {
                    log::info!("model ready");
                    self.model_ready = true;
                    Some(Phase::Settling {
                        remaining: READY_HIDE_DELAY,
                    })
                } else {
                    None
                }
            }
            Phase::Settling { remaining } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    overlay.hide();
                    Some(Phase::Done)
                } else {
                    None
                }
            }
        };

        if let Some(phase) = next {
            self.phase = phase;
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            Phase::Idle => SessionPhase::Idle,
            Phase::Pending(_) => SessionPhase::Pending,
            Phase::Entering(_) => SessionPhase::Entering,
            Phase::Settling { .. } => SessionPhase::Settling,
            Phase::Done => SessionPhase::Done,
        }
    }

    /// Set once the entrance animation of a loaded model has completed.
    pub fn model_ready(&self) -> bool {
        self.model_ready
    }

    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.outcome
    }
}

/// Drains pending events. `Some` once the load settled: the entrance to play
/// on success, `Err` when the fallback stays.
fn poll_handle(
    handle: &mut LoadHandle,
    scene: &mut Scene,
    overlay: &mut Overlay,
) -> Option<Result<Entrance, ()>> {
    while let Some(event) = handle.try_next() {
        match event {
            LoadEvent::Progress(progress) => overlay.set_progress(&progress),
            LoadEvent::Loaded(data) => {
                let Some(mut model) = prepare_loaded(data) else {
                    log::warn!("loaded model has no vertices, keeping fallback");
                    overlay.show_fallback();
                    return Some(Err(()));
                };

                let target = model.transform;
                model.transform.scale = 0.0;
                model.transform.translation.y = ENTRANCE_START_Y;
                let previous = scene.replace_active(model);
                log::info!(
                    "model loaded, replaced {:?} model (scale {:.3})",
                    previous.kind,
                    target.scale
                );

                overlay.show_loaded();
                return Some(Ok(Entrance::new(target.scale, target.translation.y)));
            }
            LoadEvent::Failed(err) => {
                log::warn!("failed to load model, keeping fallback: {err:#}");
                overlay.show_fallback();
                return Some(Err(()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vitrine_3d::{MaterialData, MeshData, ModelData, Vertex};
    use vitrine_gltf::{LoadProgress, channel};
    use vitrine_scene::showcase::{LIFT, TARGET_SIZE};
    use vitrine_scene::{ModelKind, SceneModel};

    const DT: f32 = 1.0 / 60.0;

    fn triangle() -> ModelData {
        ModelData {
            meshes: vec![MeshData {
                vertices: [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)]
                    .map(|p| Vertex::new(p, Vec3::Z))
                    .to_vec(),
                indices: vec![0, 1, 2],
                material: 0,
                cast_shadow: false,
                receive_shadow: false,
            }],
            materials: vec![MaterialData::default()],
        }
    }

    fn run(session: &mut LoadSession, scene: &mut Scene, overlay: &mut Overlay, secs: f32) {
        let frames = (secs / DT).ceil() as usize;
        for _ in 0..frames {
            session.advance(scene, overlay, DT);
        }
    }

    #[test]
    fn test_successful_load_plays_entrance() {
        let mut scene = Scene::new(SceneModel::fallback());
        let mut overlay = Overlay::default();
        let mut session = LoadSession::new();
        let (sender, handle) = channel();

        assert!(session.start(handle, &mut overlay));
        assert_eq!(overlay.text, "Loading 3D model...");

        sender.progress(LoadProgress {
            loaded: 512,
            total: Some(1024),
        });
        sender.finish(Ok(triangle()));

        session.advance(&mut scene, &mut overlay, DT);
        assert_eq!(session.phase(), SessionPhase::Entering);
        assert_eq!(scene.active().kind, ModelKind::Loaded);
        assert_eq!(scene.active().transform.scale, 0.0);
        assert_eq!(scene.active().transform.translation.y, ENTRANCE_START_Y);
        assert_eq!(overlay.text, "Model loaded!");
        assert!(!session.model_ready());

        run(&mut session, &mut scene, &mut overlay, 1.9);
        assert_eq!(session.phase(), SessionPhase::Settling);
        assert!(session.model_ready());
        assert!(overlay.visible);

        let transform = scene.active().transform;
        assert!((transform.scale - TARGET_SIZE / 4.0).abs() < 1e-5);
        assert_eq!(transform.translation.y, LIFT);

        run(&mut session, &mut scene, &mut overlay, READY_HIDE_DELAY + DT);
        assert_eq!(session.phase(), SessionPhase::Done);
        assert!(!overlay.visible);
        assert_eq!(session.outcome(), Some(LoadOutcome::Loaded));
    }

    #[test]
    fn test_failure_keeps_fallback() {
        let mut scene = Scene::new(SceneModel::fallback());
        let mut overlay = Overlay::default();
        let mut session = LoadSession::new();
        let (sender, handle) = channel();

        session.start(handle, &mut overlay);
        sender.finish(Err(anyhow::anyhow!("404")));

        session.advance(&mut scene, &mut overlay, DT);
        assert_eq!(overlay.text, "Failed to load model");
        assert_eq!(overlay.details, "Using fallback model");
        assert_eq!(scene.active().kind, ModelKind::Fallback);
        assert_eq!(scene.revision(), 0);

        run(&mut session, &mut scene, &mut overlay, FAILURE_HIDE_DELAY + DT);
        assert!(!overlay.visible);
        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(session.outcome(), Some(LoadOutcome::Fallback));
        assert!(!session.model_ready());
    }

    #[test]
    fn test_empty_asset_counts_as_failure() {
        let mut scene = Scene::new(SceneModel::fallback());
        let mut overlay = Overlay::default();
        let mut session = LoadSession::new();
        let (sender, handle) = channel();

        session.start(handle, &mut overlay);
        sender.finish(Ok(ModelData::default()));
        session.advance(&mut scene, &mut overlay, DT);

        assert_eq!(scene.active().kind, ModelKind::Fallback);
        assert_eq!(session.outcome(), Some(LoadOutcome::Fallback));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut overlay = Overlay::default();
        let mut session = LoadSession::new();
        let (_first_tx, first) = channel();
        let (_second_tx, second) = channel();

        assert!(session.start(first, &mut overlay));
        assert!(!session.start(second, &mut overlay));
        assert_eq!(session.phase(), SessionPhase::Pending);
    }

    #[test]
    fn test_pending_without_events_waits() {
        let mut scene = Scene::new(SceneModel::fallback());
        let mut overlay = Overlay::default();
        let mut session = LoadSession::new();
        let (_sender, handle) = channel();

        session.start(handle, &mut overlay);
        run(&mut session, &mut scene, &mut overlay, 5.0);
        assert_eq!(session.phase(), SessionPhase::Pending);
        assert!(overlay.visible);
    }
}
