//! Scene configuration.
//!
//! Every field has a default, so an empty `{}` (or a missing `scene.json`) yields the
//! stock scene. Unknown fields are ignored to keep older configs loadable.

use glam::Vec3;
use serde::Deserialize;

use crate::error::{NeonError, Result};

/// Linear RGB color parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const BLACK: Self = Self([0.0, 0.0, 0.0]);

    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(NeonError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| NeonError::InvalidColor(s.to_string()))
        };
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = NeonError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

/// Axis-aligned bounds a dragged model is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: [-20.0, -20.0, -5.0],
            max: [30.0, 10.0, 5.0],
        }
    }
}

impl Bounds {
    /// Clamp each axis independently.
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        p.clamp(Vec3::from(self.min), Vec3::from(self.max))
    }

    pub fn clamp_z(&self, z: f32) -> f32 {
        z.clamp(self.min[2], self.max[2])
    }
}

/// Range slider description shared by the DOM widget and the core clamp.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SliderSpec {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl SliderSpec {
    pub const fn new(min: f32, max: f32, step: f32, default: f32) -> Self {
        Self { min, max, step, default }
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    /// Position of `v` in the range, 0 at `min` and 1 at `max`.
    pub fn normalize(&self, v: f32) -> f32 {
        (self.clamp(v) - self.min) / (self.max - self.min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    /// Drag along the fixed plane `z = plane_z`.
    Plane,
    /// Drag along a camera-facing plane through the picked point.
    HitPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Leave the model where it was dropped.
    Stay,
    /// Copy the initial position back on release.
    SnapBack,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub mode: DragMode,
    pub release: ReleasePolicy,
    pub bounds: Bounds,
    pub plane_z: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            mode: DragMode::Plane,
            release: ReleasePolicy::Stay,
            bounds: Bounds::default(),
            plane_z: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub sources: Vec<String>,
    /// Negative rates ask the browser for reverse playback.
    pub playback_rate: f64,
    pub brightness: f32,
    pub video_size: [f32; 2],
    pub scroll_start: f32,
    pub scroll_increment: f32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            sources: (1..=5).map(|i| format!("./videos/video{}.mp4", i)).collect(),
            playback_rate: -10.0,
            brightness: 30.0,
            video_size: [1.0, 1.0],
            scroll_start: 0.0,
            scroll_increment: 0.0009,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `{id}` is replaced by the model id.
    pub path_template: String,
    pub first_id: u32,
    pub last_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path_template: "./models/letter/{id}.obj".to_string(),
            first_id: 14,
            last_id: 39,
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.1, 0.0],
            scale: [0.09, 0.09, 1.0],
        }
    }
}

impl ModelConfig {
    pub fn path_for(&self, id: u32) -> String {
        self.path_template.replace("{id}", &id.to_string())
    }

    pub fn ids(&self) -> std::ops::RangeInclusive<u32> {
        self.first_id..=self.last_id
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub frustum_size: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frustum_size: 30.0,
            near: 1.0,
            far: 20000.0,
            position: [-4.0, 27.0, 200.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThicknessConfig {
    pub slider: SliderSpec,
    /// Camera X at the minimum thickness.
    pub min_offset: f32,
    /// Camera X at the maximum thickness.
    pub max_offset: f32,
}

impl Default for ThicknessConfig {
    fn default() -> Self {
        Self {
            slider: SliderSpec::new(1.0, 9.0, 0.05, 1.0),
            min_offset: -4.0,
            max_offset: -40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub slider: SliderSpec,
    pub threshold: f32,
    pub radius: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            slider: SliderSpec::new(0.0, 1.5, 0.1, 0.0),
            threshold: 0.1,
            radius: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub tint: Rgb,
    pub tint_intensity: f32,
    pub fallback_color: Rgb,
    pub ambient: f32,
    pub light_position: [f32; 3],
    pub light_color: Rgb,
    pub light_intensity: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            tint: Rgb([192.0 / 255.0; 3]),
            tint_intensity: 1.5,
            fallback_color: Rgb([0.0, 0.0, 1.0 / 255.0]),
            ambient: 0.2,
            light_position: [10.0, 10.0, 2.0],
            light_color: Rgb([1.0, 1.0, 1.0]),
            light_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub open_height: String,
    pub transition_secs: f32,
    pub start_open: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            open_height: "70%".to_string(),
            transition_secs: 0.9,
            start_open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub canvas_id: String,
    pub video: VideoConfig,
    pub models: ModelConfig,
    pub camera: CameraConfig,
    pub drag: DragConfig,
    pub thickness: ThicknessConfig,
    pub twist: SliderSpec,
    pub bloom: BloomConfig,
    pub material: MaterialConfig,
    /// Inclusive range for "Randomize scale".
    pub random_scale: [u32; 2],
    pub panel: PanelConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_id: "c".to_string(),
            video: VideoConfig::default(),
            models: ModelConfig::default(),
            camera: CameraConfig::default(),
            drag: DragConfig::default(),
            thickness: ThicknessConfig::default(),
            twist: SliderSpec::new(-1.0, 1.0, 0.05, 0.0),
            bloom: BloomConfig::default(),
            material: MaterialConfig::default(),
            random_scale: [1, 20],
            panel: PanelConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NeonError::InvalidConfig(msg));

        if self.video.sources.is_empty() {
            return invalid("video.sources must not be empty".into());
        }
        if !(self.video.scroll_increment > 0.0 && self.video.scroll_increment < 1.0) {
            return invalid(format!(
                "video.scroll_increment must be in (0, 1), got {}",
                self.video.scroll_increment
            ));
        }
        if !(0.0..1.0).contains(&self.video.scroll_start) {
            return invalid(format!(
                "video.scroll_start must be in [0, 1), got {}",
                self.video.scroll_start
            ));
        }
        if self.models.first_id > self.models.last_id {
            return invalid(format!(
                "models.first_id ({}) is greater than models.last_id ({})",
                self.models.first_id, self.models.last_id
            ));
        }
        let b = &self.drag.bounds;
        if (0..3).any(|i| b.min[i] > b.max[i]) {
            return invalid(format!("drag.bounds min {:?} exceeds max {:?}", b.min, b.max));
        }
        for (name, s) in [
            ("thickness.slider", &self.thickness.slider),
            ("twist", &self.twist),
            ("bloom.slider", &self.bloom.slider),
        ] {
            if s.min >= s.max {
                return invalid(format!("{}: min {} must be below max {}", name, s.min, s.max));
            }
        }
        if self.random_scale[0] > self.random_scale[1] {
            return invalid(format!("random_scale {:?} is not ordered", self.random_scale));
        }
        if self.camera.frustum_size <= 0.0 || self.camera.near >= self.camera.far {
            return invalid("camera frustum is empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SceneConfig::from_json("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.video.sources.len(), 5);
        assert_eq!(config.models.ids().count(), 26);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = SceneConfig::from_json(
            r##"{ "drag": { "release": "snap_back" }, "material": { "tint": "#ff0000" } }"##,
        )
        .unwrap();
        assert_eq!(config.drag.release, ReleasePolicy::SnapBack);
        assert_eq!(config.drag.mode, DragMode::Plane);
        assert_eq!(config.material.tint, Rgb([1.0, 0.0, 0.0]));
        assert_eq!(config.material.tint_intensity, 1.5);
    }

    #[test]
    fn rejects_empty_video_list() {
        let err = SceneConfig::from_json(r#"{ "video": { "sources": [] } }"#).unwrap_err();
        assert!(matches!(err, NeonError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = SceneConfig::from_json(
            r#"{ "drag": { "bounds": { "min": [0, 0, 6], "max": [1, 1, 5] } } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("drag.bounds"));
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let err = SceneConfig::from_json(r#"{ "material": { "tint": "silver" } }"#).unwrap_err();
        assert!(matches!(err, NeonError::ConfigParse(_)));
    }

    #[test]
    fn hex_colors_round_trip_through_text() {
        let c = Rgb::from_hex("#C0C0C0").unwrap();
        assert!((c.0[0] - 192.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.to_hex(), "#c0c0c0");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#zz0000").is_err());
    }

    #[test]
    fn model_paths_follow_template() {
        let models = ModelConfig::default();
        assert_eq!(models.path_for(14), "./models/letter/14.obj");
    }

    #[test]
    fn slider_normalization_hits_both_ends() {
        let s = SliderSpec::new(1.0, 9.0, 0.05, 1.0);
        assert_eq!(s.normalize(1.0), 0.0);
        assert_eq!(s.normalize(9.0), 1.0);
        assert_eq!(s.normalize(42.0), 1.0);
    }
}
