//! Application state and the per-frame update.
//!
//! Browser callbacks never touch scene state directly: they push [`AppEvent`]s
//! into an [`EventQueue`]. The animation-frame callback drains the queue through
//! [`App::handle`], applies the returned [`Effect`]s to the page, calls
//! [`App::tick`] and draws.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use crate::camera::OrthoCamera;
use crate::config::{Rgb, SceneConfig};
use crate::drag::DragController;
use crate::mesh::MeshData;
use crate::panel::{ControlPanel, PanelState};
use crate::scene::{FallbackMaterial, Model, ModelId, ModelRegistry, SharedMaterial, Transform};
use crate::scroll::ScrollOffset;
use crate::video::{VideoCommand, VideoMode, VideoSelector};

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ModelLoaded { id: u32, meshes: Vec<MeshData> },
    PointerDown { ndc: Vec2 },
    PointerMove { ndc: Vec2 },
    PointerUp,
    Resize { width: u32, height: u32 },
    SelectVideo(usize),
    NextVideo,
    ToggleVideo,
    Tint(Rgb),
    Thickness(f32),
    Twist(f32),
    Bloom(f32),
    Reset,
    RandomizeScale,
    TogglePanel,
}

/// Page-side consequence of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Video(VideoCommand),
    /// Move the twist slider to this value.
    TwistControl(f32),
    /// Move the video selector to this index.
    VideoIndex(usize),
    /// Show the video selector (`On`) or the tint picker (`Off`).
    VideoControls(VideoMode),
    Panel(PanelState),
    Viewport { width: u32, height: u32 },
}

/// Single-consumer FIFO shared between DOM callbacks and the frame loop.
#[derive(Debug, Clone, Default)]
pub struct EventQueue(Rc<RefCell<VecDeque<AppEvent>>>);

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: AppEvent) {
        self.0.borrow_mut().push_back(event);
    }

    /// Take everything queued so far. Events pushed while the batch is being
    /// handled land in the next frame.
    pub fn drain(&self) -> Vec<AppEvent> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

pub struct App {
    config: SceneConfig,
    camera: OrthoCamera,
    models: ModelRegistry,
    material: SharedMaterial,
    fallback: FallbackMaterial,
    drag: DragController,
    video: VideoSelector,
    panel: ControlPanel,
    scroll: ScrollOffset,
    rng: fastrand::Rng,
}

impl App {
    pub fn new(config: SceneConfig, width: u32, height: u32, seed: u64) -> Self {
        let mut camera = OrthoCamera::new(&config.camera, 1.0);
        camera.set_viewport(width, height);
        let panel = ControlPanel::new(&config);
        Self {
            camera,
            models: ModelRegistry::new(),
            material: SharedMaterial::new(&config.video),
            fallback: FallbackMaterial::new(&config.material),
            drag: DragController::new(&config.drag),
            video: VideoSelector::new(&config.video),
            scroll: ScrollOffset::new(config.video.scroll_start, config.video.scroll_increment),
            panel,
            rng: fastrand::Rng::with_seed(seed),
            config,
        }
    }

    /// Effects to apply once at startup, before any event.
    pub fn startup_effects(&self) -> Vec<Effect> {
        vec![
            Effect::Video(self.video.play_current()),
            Effect::VideoControls(self.video.mode()),
            Effect::Panel(self.panel.state),
        ]
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &OrthoCamera {
        &self.camera
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn material(&self) -> &SharedMaterial {
        &self.material
    }

    pub fn fallback(&self) -> &FallbackMaterial {
        &self.fallback
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn video(&self) -> &VideoSelector {
        &self.video
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn bloom_strength(&self) -> f32 {
        self.panel.bloom
    }

    /// One render-loop tick: advance the scroll and publish it to the shader.
    pub fn tick(&mut self) -> f32 {
        let offset = self.scroll.advance();
        self.material.uv_offset = Vec2::new(offset, 0.0);
        offset
    }

    pub fn handle(&mut self, event: AppEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            AppEvent::ModelLoaded { id, meshes } => {
                let model_id = self.add_model(id, meshes);
                log::info!("model {} loaded as #{}", id, model_id.0);
            }
            AppEvent::PointerDown { ndc } => {
                let ray = self.camera.ray_from_ndc(ndc);
                self.drag.pointer_down(&ray, self.camera.forward(), &self.models);
            }
            AppEvent::PointerMove { ndc } => {
                if self.drag.is_dragging() {
                    let ray = self.camera.ray_from_ndc(ndc);
                    self.drag.pointer_move(&ray, &mut self.models);
                }
            }
            AppEvent::PointerUp => {
                self.drag.pointer_up(&mut self.models);
            }
            AppEvent::Resize { width, height } => {
                self.camera.set_viewport(width, height);
                effects.push(Effect::Viewport { width, height });
            }
            AppEvent::SelectVideo(index) => {
                let before = self.video.current();
                effects.extend(self.video.select(index).map(Effect::Video));
                if self.video.current() != before {
                    effects.push(Effect::VideoIndex(self.video.current()));
                }
            }
            AppEvent::NextVideo => {
                let before = self.video.current();
                effects.extend(self.video.select_next().map(Effect::Video));
                if self.video.current() != before {
                    effects.push(Effect::VideoIndex(self.video.current()));
                }
            }
            AppEvent::ToggleVideo => {
                let command = self.video.toggle();
                let mode = self.video.mode();
                self.models.assign_material(mode.material());
                log::info!("video {:?}", mode);
                effects.push(Effect::Video(command));
                effects.push(Effect::VideoControls(mode));
            }
            AppEvent::Tint(color) => {
                let intensity = self.config.material.tint_intensity;
                self.panel.tint = color;
                self.material.emissive = color;
                self.material.emissive_intensity = intensity;
                self.fallback.emissive = color;
                self.fallback.emissive_intensity = intensity;
                log::info!("updated emission color to: {}", color.to_hex());
            }
            AppEvent::Thickness(v) => {
                let thickness = self.panel.set_thickness(v);
                self.models.set_thickness(thickness, self.drag.bounds());
                self.camera.position.x = self.panel.camera_x();
                log::info!(
                    "updated thickness to: {} camera x: {}",
                    thickness,
                    self.camera.position.x
                );
            }
            AppEvent::Twist(v) => {
                let twist = self.panel.set_twist(v);
                self.models.set_twist(twist);
                log::info!("updated twist to: {}", twist);
            }
            AppEvent::Bloom(v) => {
                let strength = self.panel.set_bloom(v);
                log::info!("updated bloom strength to: {}", strength);
            }
            AppEvent::Reset => {
                self.models.reset_positions();
                self.models.set_twist(0.0);
                effects.push(Effect::TwistControl(self.panel.reset_twist()));
                log::info!("models and twist have been reset");
            }
            AppEvent::RandomizeScale => {
                let z = self.randomize_scale();
                log::info!("all model scales randomized to z-scale: {}", z);
            }
            AppEvent::TogglePanel => {
                effects.push(Effect::Panel(self.panel.toggle()));
            }
        }
        effects
    }

    fn add_model(&mut self, id: u32, meshes: Vec<MeshData>) -> ModelId {
        let transform = Transform::from(&self.config.models);
        let model = Model::new(id, transform, meshes, self.video.mode().material());
        self.models.insert(model)
    }

    /// One integer Z scale from the configured inclusive range, applied to all.
    fn randomize_scale(&mut self) -> u32 {
        let [lo, hi] = self.config.random_scale;
        let z = self.rng.u32(lo..=hi);
        self.models.set_scale_z(z as f32);
        z
    }

    pub fn model_position(&self, id: ModelId) -> Option<Vec3> {
        self.models.get(id).map(|m| m.transform.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo_and_drains_fully() {
        let q = EventQueue::new();
        q.push(AppEvent::Reset);
        q.clone().push(AppEvent::PointerUp);
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain(), vec![AppEvent::Reset, AppEvent::PointerUp]);
        assert!(q.is_empty());
    }

    #[test]
    fn tick_publishes_offset() {
        let mut app = App::new(SceneConfig::default(), 800, 600, 1);
        let offset = app.tick();
        assert_eq!(app.material().uv_offset, Vec2::new(offset, 0.0));
        assert!((offset - 0.0009).abs() < 1e-7);
    }

    #[test]
    fn startup_plays_first_video() {
        let app = App::new(SceneConfig::default(), 800, 600, 1);
        let effects = app.startup_effects();
        assert!(matches!(
            &effects[0],
            Effect::Video(VideoCommand::Play { index: 0, .. })
        ));
        assert_eq!(app.camera().position.x, -4.0);
    }

    #[test]
    fn resize_keeps_camera_position() {
        let mut app = App::new(SceneConfig::default(), 800, 600, 1);
        let before = app.camera().position;
        let effects = app.handle(AppEvent::Resize { width: 400, height: 800 });
        assert_eq!(effects, vec![Effect::Viewport { width: 400, height: 800 }]);
        assert_eq!(app.camera().position, before);
        assert!((app.camera().aspect - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tint_reaches_both_materials() {
        let mut app = App::new(SceneConfig::default(), 800, 600, 1);
        let red = Rgb([1.0, 0.0, 0.0]);
        app.handle(AppEvent::Tint(red));
        assert_eq!(app.material().emissive, red);
        assert_eq!(app.fallback().emissive, red);
        assert_eq!(app.fallback().emissive_intensity, 1.5);
    }
}
