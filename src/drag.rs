//! Pointer drag controller.
//!
//! `Idle` until a pointer-down ray hits a model, then `Dragging` until
//! pointer-up. Moves are projected onto the session's drag plane, offset so the
//! model does not jump to the pointer, and clamped into the configured bounds.

use glam::Vec3;

use crate::config::{Bounds, DragConfig, DragMode, ReleasePolicy};
use crate::geometry::{Plane, Ray};
use crate::scene::{ModelId, ModelRegistry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub model: ModelId,
    /// Pointer point minus model position, fixed at drag start.
    pub offset: Vec3,
    pub plane: Plane,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    mode: DragMode,
    release: ReleasePolicy,
    bounds: Bounds,
    plane_z: f32,
}

impl DragController {
    pub fn new(config: &DragConfig) -> Self {
        Self {
            state: DragState::Idle,
            mode: config.mode,
            release: config.release,
            bounds: config.bounds,
            plane_z: config.plane_z,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Start a session if `ray` hits a model. `view_dir` is the camera forward
    /// vector, used by [`DragMode::HitPoint`].
    pub fn pointer_down(&mut self, ray: &Ray, view_dir: Vec3, models: &ModelRegistry) -> Option<ModelId> {
        let hit = models.pick(ray)?;
        let position = models.get(hit.model)?.transform.position;

        let (plane, anchor) = match self.mode {
            DragMode::Plane => {
                let plane = Plane::z(self.plane_z);
                match ray.intersect_plane(&plane) {
                    Some(t) => (plane, ray.at(t)),
                    // Ray parallel to the drag plane: fall back to a camera-facing one.
                    None => (Plane::from_point_normal(hit.point, -view_dir), hit.point),
                }
            }
            DragMode::HitPoint => (Plane::from_point_normal(hit.point, -view_dir), hit.point),
        };

        self.state = DragState::Dragging(DragSession {
            model: hit.model,
            offset: anchor - position,
            plane,
        });
        log::debug!("drag start on model #{} at {:?}", hit.model.0, hit.point);
        Some(hit.model)
    }

    /// Move the dragged model; returns its new position.
    pub fn pointer_move(&mut self, ray: &Ray, models: &mut ModelRegistry) -> Option<Vec3> {
        let DragState::Dragging(session) = self.state else {
            return None;
        };
        let t = ray.intersect_plane(&session.plane)?;
        let target = self.bounds.clamp(ray.at(t) - session.offset);
        let model = models.get_mut(session.model)?;
        model.transform.position = target;
        Some(target)
    }

    /// End the session, applying the release policy.
    pub fn pointer_up(&mut self, models: &mut ModelRegistry) -> Option<ModelId> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        if self.release == ReleasePolicy::SnapBack {
            if let Some(model) = models.get_mut(session.model) {
                model.transform.position = model.initial_position();
            }
        }
        log::debug!("drag end on model #{}", session.model.0);
        Some(session.model)
    }
}
