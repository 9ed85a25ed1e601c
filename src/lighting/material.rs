//! Shading modes and their mapping onto renderer-native material descriptions.

use crate::color::Rgb;
use crate::textures::{Texture, TextureKey};
use std::sync::Arc;

pub const DEFAULT_SHININESS: f32 = 30.0;
pub const PHONG_SPECULAR: Rgb = Rgb::from_hex(0x444444);
pub const FAST_PHONG_SPECULAR: Rgb = Rgb::from_hex(0x111111);
pub const TOON_BANDS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingMode {
    Flat,
    Gouraud,
    #[default]
    Phong,
    FastPhong,
    Wireframe,
    Pbr,
    Toon,
}

impl ShadingMode {
    pub fn option(self) -> &'static RenderingModeOption {
        // one catalog entry per variant, in declaration order
        &RENDERING_MODES[self as usize]
    }
}

#[derive(Debug)]
pub struct RenderingModeOption {
    pub id: ShadingMode,
    pub display_name: &'static str,
    pub description: &'static str,
}

static RENDERING_MODES: [RenderingModeOption; 7] = [
    RenderingModeOption {
        id: ShadingMode::Flat,
        display_name: "Flat Shading",
        description: "Renders each polygon with a single color, creating a faceted look.",
    },
    RenderingModeOption {
        id: ShadingMode::Gouraud,
        display_name: "Gouraud Shading",
        description: "Calculates lighting at vertices only, showing mach bands at polygon edges.",
    },
    RenderingModeOption {
        id: ShadingMode::Phong,
        display_name: "Phong Shading",
        description: "Smooth shading with highlights, calculates lighting per pixel.",
    },
    RenderingModeOption {
        id: ShadingMode::FastPhong,
        display_name: "Fast Phong",
        description: "Simplified Phong shading for better performance with similar visual quality.",
    },
    RenderingModeOption {
        id: ShadingMode::Wireframe,
        display_name: "Wireframe",
        description: "Displays only the edges of each polygon.",
    },
    RenderingModeOption {
        id: ShadingMode::Pbr,
        display_name: "Physically Based",
        description: "Metalness/roughness workflow with energy-conserving highlights.",
    },
    RenderingModeOption {
        id: ShadingMode::Toon,
        display_name: "Toon Shading",
        description: "Quantizes diffuse light into a few hard-edged bands.",
    },
];

pub fn rendering_modes() -> &'static [RenderingModeOption] {
    &RENDERING_MODES
}

/// Lighting response of a material, the part that differs per shading mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightingModel {
    /// Ignores lights entirely.
    Unlit,
    /// Diffuse-only, evaluated per vertex and interpolated across the face.
    Lambert {
        emissive: Rgb,
        emissive_intensity: f32,
        reflectivity: f32,
    },
    /// Blinn-Phong evaluated per pixel.
    Phong { shininess: f32, specular: Rgb },
    /// Metalness/roughness PBR.
    Standard { metalness: f32, roughness: f32 },
    /// Diffuse quantized into `bands` steps.
    Toon { bands: u32 },
}

/// Renderer-facing material. Derived from the session, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescription {
    pub model: LightingModel,
    pub color: Rgb,
    /// Edges only; overrides texture and shading.
    pub wireframe: bool,
    /// Per-face normals for a faceted look.
    pub flat_shading: bool,
    /// Texture requested for this material but not yet bound.
    pub pending_texture: Option<TextureKey>,
    pub map: Option<Arc<Texture>>,
}

impl MaterialDescription {
    pub fn new(model: LightingModel, color: Rgb) -> Self {
        Self {
            model,
            color,
            wireframe: false,
            flat_shading: false,
            pending_texture: None,
            map: None,
        }
    }

    /// Neutral gray standard material used for geometry that arrives without one.
    pub fn neutral() -> Self {
        Self::new(
            LightingModel::Standard {
                metalness: 0.0,
                roughness: 1.0,
            },
            Rgb::from_hex(0xAAAAAA),
        )
    }

    pub fn is_lit(&self) -> bool {
        !matches!(self.model, LightingModel::Unlit)
    }

    pub fn supports_texture(&self) -> bool {
        !self.wireframe
    }

    /// Binds a loaded texture if it is the one this material asked for.
    ///
    /// Returns `false` and leaves the material untouched for any other texture.
    pub fn bind_texture(&mut self, texture: Arc<Texture>) -> bool {
        if !self.supports_texture() || self.pending_texture.as_ref() != Some(texture.key()) {
            return false;
        }
        self.pending_texture = None;
        self.map = Some(texture);
        true
    }
}

/// Maps a shading mode, base color and optional texture onto a material.
///
/// The result never carries a bound texture: a requested texture is recorded in
/// `pending_texture` and bound later through [`MaterialDescription::bind_texture`].
pub fn resolve_material(
    mode: ShadingMode,
    color: Rgb,
    texture: Option<&TextureKey>,
) -> MaterialDescription {
    resolve_material_with_shininess(mode, color, texture, DEFAULT_SHININESS)
}

pub fn resolve_material_with_shininess(
    mode: ShadingMode,
    color: Rgb,
    texture: Option<&TextureKey>,
    shininess: f32,
) -> MaterialDescription {
    let shininess = shininess.max(0.0);
    let mut material = match mode {
        ShadingMode::Wireframe => {
            let mut material = MaterialDescription::new(LightingModel::Unlit, color);
            material.wireframe = true;
            return material;
        }
        ShadingMode::Flat => {
            let mut material = MaterialDescription::new(
                LightingModel::Phong {
                    shininess,
                    specular: PHONG_SPECULAR,
                },
                color,
            );
            material.flat_shading = true;
            material
        }
        ShadingMode::Phong => MaterialDescription::new(
            LightingModel::Phong {
                shininess,
                specular: PHONG_SPECULAR,
            },
            color,
        ),
        ShadingMode::FastPhong => MaterialDescription::new(
            LightingModel::Phong {
                shininess: shininess / 2.0,
                specular: FAST_PHONG_SPECULAR,
            },
            color,
        ),
        // a little emissive floor keeps the vertex banding visible on the dark side
        ShadingMode::Gouraud => MaterialDescription::new(
            LightingModel::Lambert {
                emissive: Rgb::BLACK,
                emissive_intensity: 0.1,
                reflectivity: 1.0,
            },
            color,
        ),
        ShadingMode::Pbr => MaterialDescription::new(
            LightingModel::Standard {
                metalness: 0.0,
                roughness: 0.5,
            },
            color,
        ),
        ShadingMode::Toon => {
            MaterialDescription::new(LightingModel::Toon { bands: TOON_BANDS }, color)
        }
    };

    if material.supports_texture() {
        material.pending_texture = texture.cloned();
    }
    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::WrapMode;

    const ALL_MODES: [ShadingMode; 7] = [
        ShadingMode::Flat,
        ShadingMode::Gouraud,
        ShadingMode::Phong,
        ShadingMode::FastPhong,
        ShadingMode::Wireframe,
        ShadingMode::Pbr,
        ShadingMode::Toon,
    ];

    fn key(url: &str) -> TextureKey {
        TextureKey::new(url)
    }

    #[test]
    fn wireframe_ignores_texture_and_lighting() {
        let colors = [Rgb::WHITE, Rgb::BLACK, Rgb::from_hex(0x3366ff)];
        let textures = [None, Some(key("textures/brick.jpg")), Some(key("blob:7"))];
        for color in colors {
            for texture in &textures {
                let material = resolve_material(ShadingMode::Wireframe, color, texture.as_ref());
                assert!(material.wireframe);
                assert!(!material.is_lit());
                assert_eq!(material.pending_texture, None);
                assert!(material.map.is_none());
                assert_eq!(material.color, color);
            }
        }
    }

    #[test]
    fn shading_modes_map_to_distinct_responses() {
        let color = Rgb::WHITE;
        let flat = resolve_material(ShadingMode::Flat, color, None);
        let phong = resolve_material(ShadingMode::Phong, color, None);
        let fast = resolve_material(ShadingMode::FastPhong, color, None);
        let gouraud = resolve_material(ShadingMode::Gouraud, color, None);

        assert!(flat.flat_shading);
        assert!(!phong.flat_shading);
        assert!(matches!(gouraud.model, LightingModel::Lambert { .. }));

        let (
            LightingModel::Phong {
                shininess: phong_exp,
                specular: phong_spec,
            },
            LightingModel::Phong {
                shininess: fast_exp,
                specular: fast_spec,
            },
        ) = (phong.model, fast.model)
        else {
            panic!("phong modes should use the phong model");
        };
        assert!(phong_exp > fast_exp);
        assert!(phong_spec.0[0] > fast_spec.0[0]);

        for (i, a) in ALL_MODES.iter().enumerate() {
            for b in &ALL_MODES[i + 1..] {
                assert_ne!(
                    resolve_material(*a, color, None),
                    resolve_material(*b, color, None),
                    "{:?} and {:?} resolve identically",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn textured_material_starts_untextured() {
        let brick = key("textures/brick.jpg");
        let material = resolve_material(ShadingMode::Phong, Rgb::WHITE, Some(&brick));
        assert_eq!(material.pending_texture, Some(brick));
        assert!(material.map.is_none());
    }

    #[test]
    fn bind_texture_only_accepts_the_requested_key() {
        let brick = key("textures/brick.jpg");
        let mut material = resolve_material(ShadingMode::Pbr, Rgb::WHITE, Some(&brick));

        let wood = Arc::new(Texture::from_rgba(key("textures/wood.jpg"), 1, 1, vec![0; 4]));
        assert!(!material.bind_texture(wood));
        assert!(material.map.is_none());

        let texture = Arc::new(Texture::from_rgba(brick, 1, 1, vec![255; 4]));
        assert!(material.bind_texture(texture.clone()));
        let bound = material.map.as_ref().unwrap();
        assert!(Arc::ptr_eq(bound, &texture));
        assert_eq!(bound.wrap(), (WrapMode::Repeat, WrapMode::Repeat));
        assert_eq!(material.pending_texture, None);
    }

    #[test]
    fn catalog_follows_variant_order() {
        for (index, option) in rendering_modes().iter().enumerate() {
            assert_eq!(option.id as usize, index);
            assert_eq!(option.id.option().display_name, option.display_name);
        }
    }
}
