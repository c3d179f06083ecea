//! Models, their registry, and the material state shared between them.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::config::{Bounds, MaterialConfig, ModelConfig, Rgb, VideoConfig};
use crate::geometry::Ray;
use crate::mesh::MeshData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.position,
        )
    }
}

impl From<&ModelConfig> for Transform {
    fn from(config: &ModelConfig) -> Self {
        Self {
            position: Vec3::from(config.position),
            rotation: Vec3::from(config.rotation),
            scale: Vec3::from(config.scale),
        }
    }
}

/// Which material a model is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialRef {
    /// The shared video shader.
    Video,
    /// Flat lit color used while video is off.
    Fallback,
}

/// The single video shader instance every model shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedMaterial {
    pub brightness: f32,
    pub uv_offset: Vec2,
    pub video_size: Vec2,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
}

impl SharedMaterial {
    pub fn new(video: &VideoConfig) -> Self {
        Self {
            brightness: video.brightness,
            uv_offset: Vec2::ZERO,
            video_size: Vec2::from(video.video_size),
            emissive: Rgb::BLACK,
            emissive_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackMaterial {
    pub color: Rgb,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
}

impl FallbackMaterial {
    pub fn new(config: &MaterialConfig) -> Self {
        Self {
            color: config.fallback_color,
            emissive: Rgb::BLACK,
            emissive_intensity: 1.0,
        }
    }
}

/// One sub-mesh of a model. Twist rotates it about its own Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub data: MeshData,
    pub rotation_z: f32,
}

impl ModelMesh {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_z(self.rotation_z)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub asset_id: u32,
    pub transform: Transform,
    pub meshes: Vec<ModelMesh>,
    pub material: MaterialRef,
    initial_position: Vec3,
}

impl Model {
    pub fn new(asset_id: u32, transform: Transform, meshes: Vec<MeshData>, material: MaterialRef) -> Self {
        Self {
            asset_id,
            initial_position: transform.position,
            transform,
            meshes: meshes
                .into_iter()
                .map(|data| ModelMesh { data, rotation_z: 0.0 })
                .collect(),
            material,
        }
    }

    /// Position recorded when the model was added; never changes afterwards.
    pub fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    /// World matrix of every mesh, in mesh order.
    pub fn mesh_matrices(&self) -> impl Iterator<Item = Mat4> + '_ {
        let model = self.transform.matrix();
        self.meshes.iter().map(move |m| model * m.local_matrix())
    }

    /// Nearest hit of a world-space ray against any mesh.
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        self.meshes
            .iter()
            .zip(self.mesh_matrices())
            .filter_map(|(mesh, world)| {
                let inv = world.inverse();
                if !inv.is_finite() {
                    return None;
                }
                mesh.data.raycast(&ray.transformed(&inv))
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Index of a model in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub model: ModelId,
    pub t: f32,
    pub point: Vec3,
}

/// Loaded models in load-completion order.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: Vec<Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    /// Nearest model under `ray`; ties go to the earlier model.
    pub fn pick(&self, ray: &Ray) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for (i, model) in self.models.iter().enumerate() {
            let Some(t) = model.raycast(ray) else { continue };
            if best.map_or(true, |b| t < b.t) {
                best = Some(Hit {
                    model: ModelId(i),
                    t,
                    point: ray.at(t),
                });
            }
        }
        best
    }

    pub fn reset_positions(&mut self) {
        for model in &mut self.models {
            model.transform.position = model.initial_position;
        }
    }

    /// Even-indexed models turn by `+twist`, odd ones by `-twist`.
    pub fn set_twist(&mut self, twist: f32) {
        for (i, model) in self.models.iter_mut().enumerate() {
            let angle = if i % 2 == 0 { twist } else { -twist };
            for mesh in &mut model.meshes {
                mesh.rotation_z = angle;
            }
        }
    }

    pub fn set_scale_z(&mut self, z: f32) {
        for model in &mut self.models {
            model.transform.scale.z = z;
        }
    }

    /// Thickness: Z scale on every model, then pull Z positions back into bounds.
    pub fn set_thickness(&mut self, thickness: f32, bounds: &Bounds) {
        for model in &mut self.models {
            model.transform.scale.z = thickness;
            model.transform.position.z = bounds.clamp_z(model.transform.position.z);
        }
    }

    pub fn assign_material(&mut self, material: MaterialRef) {
        for model in &mut self.models {
            model.material = material;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::parse_obj;

    fn square(id: u32, position: Vec3) -> Model {
        let mesh = parse_obj("v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3 4\n").unwrap();
        let transform = Transform {
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        };
        Model::new(id, transform, mesh, MaterialRef::Video)
    }

    #[test]
    fn pick_prefers_nearest_model() {
        let mut reg = ModelRegistry::new();
        reg.insert(square(1, Vec3::new(0.0, 0.0, -2.0)));
        let front = reg.insert(square(2, Vec3::new(0.0, 0.0, 1.0)));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let hit = reg.pick(&ray).unwrap();
        assert_eq!(hit.model, front);
        assert!((hit.t - 9.0).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn pick_respects_model_transform() {
        let mut reg = ModelRegistry::new();
        reg.insert(square(1, Vec3::new(10.0, 0.0, 0.0)));
        let miss = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(reg.pick(&miss).is_none());
        let hit = Ray::new(Vec3::new(10.5, 0.5, 10.0), Vec3::NEG_Z);
        assert!(reg.pick(&hit).is_some());
    }

    #[test]
    fn reset_restores_snapshot_exactly() {
        let mut reg = ModelRegistry::new();
        let start = Vec3::new(0.1, -0.2, 0.3);
        let id = reg.insert(square(1, start));
        reg.get_mut(id).unwrap().transform.position = Vec3::new(7.0, 7.0, 7.0);
        reg.reset_positions();
        let model = reg.get(id).unwrap();
        assert_eq!(model.transform.position.to_array(), start.to_array());
        assert_eq!(model.initial_position(), start);
    }

    #[test]
    fn twist_alternates_by_parity() {
        let mut reg = ModelRegistry::new();
        for i in 0..3 {
            reg.insert(square(i, Vec3::ZERO));
        }
        reg.set_twist(0.5);
        let angles: Vec<f32> = reg.iter().map(|m| m.meshes[0].rotation_z).collect();
        assert_eq!(angles, vec![0.5, -0.5, 0.5]);
    }

    #[test]
    fn thickness_clamps_depth() {
        let mut reg = ModelRegistry::new();
        let id = reg.insert(square(1, Vec3::new(0.0, 0.0, 9.0)));
        reg.set_thickness(3.0, &Bounds::default());
        let model = reg.get(id).unwrap();
        assert_eq!(model.transform.scale.z, 3.0);
        assert_eq!(model.transform.position.z, 5.0);
    }
}
