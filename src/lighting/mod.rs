//! # Lighting/Material Model
//!
//! Pure functions from the current parameter snapshot to renderer-native light
//! and material descriptions. No state lives here; the scene assembler owns it.

pub mod background;
pub mod helpers;
pub mod material;

pub use background::{backgrounds, BackgroundId, BackgroundSpec, StarField};
pub use helpers::{light_helper, LightHelper};
pub use material::{
    rendering_modes, resolve_material, LightingModel, MaterialDescription, RenderingModeOption,
    ShadingMode,
};

use crate::color::Rgb;
use glam::Vec3;

/// Number of user-positionable point lights.
pub const CUSTOM_LIGHT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

impl LightKind {
    pub fn has_position(self) -> bool {
        !matches!(self, LightKind::Ambient)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// User-editable light. Updates return a new value; nothing is mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpec {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f32,
    /// Ignored for ambient lights.
    pub position: Vec3,
    pub enabled: bool,
    pub helper_visible: bool,
}

impl LightSpec {
    pub fn new(kind: LightKind, color: Rgb, intensity: f32, position: Vec3) -> Self {
        Self {
            kind,
            color,
            intensity: intensity.max(0.0),
            position,
            enabled: true,
            helper_visible: false,
        }
    }

    pub fn with_color(self, color: Rgb) -> Self {
        Self { color, ..self }
    }

    pub fn with_intensity(self, intensity: f32) -> Self {
        Self {
            intensity: intensity.max(0.0),
            ..self
        }
    }

    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    pub fn with_axis(self, axis: Axis, value: f32) -> Self {
        let mut position = self.position;
        position[axis.index()] = value;
        Self { position, ..self }
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_helper_visible(self, helper_visible: bool) -> Self {
        Self {
            helper_visible,
            ..self
        }
    }
}

/// What the renderer instantiates for one enabled light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescription {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f32,
    pub position: Option<Vec3>,
}

/// `None` for a disabled light. The helper flag has no say here.
pub fn resolve_light(spec: &LightSpec) -> Option<LightDescription> {
    if !spec.enabled {
        return None;
    }
    Some(LightDescription {
        kind: spec.kind,
        color: spec.color,
        intensity: spec.intensity,
        position: spec.kind.has_position().then_some(spec.position),
    })
}

/// The three fixed lights of the classic ambient + diffuse + specular setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseLights {
    pub ambient: LightSpec,
    pub diffuse: LightSpec,
    pub specular: LightSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLight {
    Ambient,
    Diffuse,
    Specular,
}

impl BaseLight {
    pub const ALL: [BaseLight; 3] = [BaseLight::Ambient, BaseLight::Diffuse, BaseLight::Specular];

    pub fn label(self) -> &'static str {
        match self {
            BaseLight::Ambient => "Ambient",
            BaseLight::Diffuse => "Diffuse",
            BaseLight::Specular => "Specular",
        }
    }
}

impl Default for BaseLights {
    fn default() -> Self {
        Self {
            ambient: LightSpec::new(LightKind::Ambient, Rgb::from_hex(0x404040), 0.5, Vec3::ZERO),
            diffuse: LightSpec::new(
                LightKind::Directional,
                Rgb::WHITE,
                0.5,
                Vec3::new(1.0, 1.0, 1.0),
            ),
            specular: LightSpec::new(
                LightKind::Point,
                Rgb::WHITE,
                0.3,
                Vec3::new(-1.0, -1.0, -1.0),
            ),
        }
    }
}

impl BaseLights {
    pub fn get(&self, which: BaseLight) -> &LightSpec {
        match which {
            BaseLight::Ambient => &self.ambient,
            BaseLight::Diffuse => &self.diffuse,
            BaseLight::Specular => &self.specular,
        }
    }

    pub fn with(self, which: BaseLight, spec: LightSpec) -> Self {
        match which {
            BaseLight::Ambient => Self {
                ambient: spec,
                ..self
            },
            BaseLight::Diffuse => Self {
                diffuse: spec,
                ..self
            },
            BaseLight::Specular => Self {
                specular: spec,
                ..self
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightSpec> {
        [&self.ambient, &self.diffuse, &self.specular].into_iter()
    }

    pub fn with_preset(self, preset: &LightingPreset) -> Self {
        Self {
            ambient: self.ambient.with_color(preset.ambient),
            diffuse: self.diffuse.with_color(preset.diffuse),
            specular: self.specular.with_color(preset.specular),
        }
    }
}

/// Default adjustable point lights: red, green and blue around the subject, all off.
pub fn default_custom_lights() -> [LightSpec; CUSTOM_LIGHT_COUNT] {
    [
        (Rgb::from_hex(0xff4040), Vec3::new(2.0, 2.0, 2.0)),
        (Rgb::from_hex(0x40ff40), Vec3::new(-2.0, 2.0, -2.0)),
        (Rgb::from_hex(0x4040ff), Vec3::new(0.0, -2.0, 2.0)),
    ]
    .map(|(color, position)| {
        LightSpec::new(LightKind::Point, color, 1.0, position).with_enabled(false)
    })
}

#[derive(Debug)]
pub struct LightingPreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub ambient: Rgb,
    pub diffuse: Rgb,
    pub specular: Rgb,
}

static LIGHTING_PRESETS: [LightingPreset; 4] = [
    LightingPreset {
        id: "default",
        display_name: "Default",
        description: "Standard lighting setup with ambient, diffuse, and specular lights.",
        ambient: Rgb::from_hex(0x404040),
        diffuse: Rgb::from_hex(0xffffff),
        specular: Rgb::from_hex(0xffffff),
    },
    LightingPreset {
        id: "soft",
        display_name: "Soft",
        description: "Subtle lighting with a focus on ambient and diffuse illumination.",
        ambient: Rgb::from_hex(0x505050),
        diffuse: Rgb::from_hex(0xa0a0a0),
        specular: Rgb::from_hex(0x303030),
    },
    LightingPreset {
        id: "vibrant",
        display_name: "Vibrant",
        description: "Bright and colorful lighting to enhance the shape's details.",
        ambient: Rgb::from_hex(0x606060),
        diffuse: Rgb::from_hex(0xf0f0f0),
        specular: Rgb::from_hex(0x707070),
    },
    LightingPreset {
        id: "dark",
        display_name: "Dark",
        description: "Dim lighting to create a moody and dramatic effect.",
        ambient: Rgb::from_hex(0x202020),
        diffuse: Rgb::from_hex(0x404040),
        specular: Rgb::from_hex(0x101010),
    },
];

pub fn lighting_presets() -> &'static [LightingPreset] {
    &LIGHTING_PRESETS
}

pub fn find_preset(id: &str) -> Option<&'static LightingPreset> {
    LIGHTING_PRESETS.iter().find(|preset| preset.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_light_emits_nothing() {
        let spec = BaseLights::default().diffuse;
        assert!(resolve_light(&spec).is_some());
        assert!(resolve_light(&spec.with_enabled(false)).is_none());
    }

    #[test]
    fn ambient_light_has_no_position() {
        let ambient = resolve_light(&BaseLights::default().ambient).unwrap();
        assert_eq!(ambient.position, None);
        let point = resolve_light(&BaseLights::default().specular).unwrap();
        assert_eq!(point.position, Some(Vec3::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn helper_flag_does_not_change_illumination() {
        for spec in BaseLights::default().iter().chain(default_custom_lights().iter()) {
            let spec = spec.with_enabled(true);
            let shown = resolve_light(&spec.with_helper_visible(true));
            let hidden = resolve_light(&spec.with_helper_visible(false));
            assert_eq!(shown, hidden);
        }
    }

    #[test]
    fn axis_updates_leave_the_original_untouched() {
        let defaults = default_custom_lights();
        let moved = defaults[0].with_axis(Axis::Y, -4.0);
        assert_eq!(moved.position, Vec3::new(2.0, -4.0, 2.0));
        assert_eq!(defaults[0].position, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(default_custom_lights()[0].position, Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn intensity_is_never_negative() {
        let spec = BaseLights::default().ambient.with_intensity(-3.0);
        assert_eq!(spec.intensity, 0.0);
    }

    #[test]
    fn presets_recolor_all_base_lights() {
        let dark = find_preset("dark").unwrap();
        let lights = BaseLights::default().with_preset(dark);
        assert_eq!(lights.ambient.color, Rgb::from_hex(0x202020));
        assert_eq!(lights.diffuse.color, Rgb::from_hex(0x404040));
        assert_eq!(lights.specular.color, Rgb::from_hex(0x101010));
        assert_eq!(lights.diffuse.position, BaseLights::default().diffuse.position);
        assert!(find_preset("neon").is_none());
        assert_eq!(lighting_presets().len(), 4);
    }
}
