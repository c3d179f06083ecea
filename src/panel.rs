//! Control panel parameters. Each value is owned by exactly one widget; the
//! core clamps whatever arrives to the widget's domain.

use crate::config::{Rgb, SceneConfig, SliderSpec, ThicknessConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Collapsed,
    Expanded,
}

impl PanelState {
    pub fn toggled(self) -> Self {
        match self {
            PanelState::Collapsed => PanelState::Expanded,
            PanelState::Expanded => PanelState::Collapsed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub thickness: f32,
    pub twist: f32,
    pub bloom: f32,
    pub tint: Rgb,
    pub state: PanelState,
    thickness_spec: ThicknessConfig,
    twist_spec: SliderSpec,
    bloom_spec: SliderSpec,
}

impl ControlPanel {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            thickness: config.thickness.slider.default,
            twist: config.twist.default,
            bloom: config.bloom.slider.default,
            tint: config.material.tint,
            state: if config.panel.start_open {
                PanelState::Expanded
            } else {
                PanelState::Collapsed
            },
            thickness_spec: config.thickness.clone(),
            twist_spec: config.twist,
            bloom_spec: config.bloom.slider,
        }
    }

    pub fn set_thickness(&mut self, v: f32) -> f32 {
        self.thickness = self.thickness_spec.slider.clamp(v);
        self.thickness
    }

    pub fn set_twist(&mut self, v: f32) -> f32 {
        self.twist = self.twist_spec.clamp(v);
        self.twist
    }

    pub fn reset_twist(&mut self) -> f32 {
        self.twist = self.twist_spec.default;
        self.twist
    }

    pub fn set_bloom(&mut self, v: f32) -> f32 {
        self.bloom = self.bloom_spec.clamp(v);
        self.bloom
    }

    pub fn toggle(&mut self) -> PanelState {
        self.state = self.state.toggled();
        self.state
    }

    /// Camera X for the current thickness: `min_offset` at the thinnest
    /// setting, `max_offset` at the thickest, linear in between.
    pub fn camera_x(&self) -> f32 {
        let spec = &self.thickness_spec;
        let n = spec.slider.normalize(self.thickness);
        spec.min_offset + n * (spec.max_offset - spec.min_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_follows_thickness_linearly() {
        let mut panel = ControlPanel::new(&SceneConfig::default());
        panel.set_thickness(1.0);
        assert_eq!(panel.camera_x(), -4.0);
        panel.set_thickness(9.0);
        assert_eq!(panel.camera_x(), -40.0);
        panel.set_thickness(5.0);
        assert_eq!(panel.camera_x(), -22.0);
    }

    #[test]
    fn values_are_clamped_to_widget_domain() {
        let mut panel = ControlPanel::new(&SceneConfig::default());
        assert_eq!(panel.set_twist(3.0), 1.0);
        assert_eq!(panel.set_bloom(-1.0), 0.0);
        assert_eq!(panel.set_thickness(0.0), 1.0);
        assert_eq!(panel.reset_twist(), 0.0);
    }

    #[test]
    fn panel_starts_collapsed_and_toggles() {
        let mut panel = ControlPanel::new(&SceneConfig::default());
        assert_eq!(panel.state, PanelState::Collapsed);
        assert_eq!(panel.toggle(), PanelState::Expanded);
        assert_eq!(panel.toggle(), PanelState::Collapsed);
    }
}
