//! Per-vertex lighting for the preview rasterizer.

use glam::Vec3;
use shadelab::color::Rgb;
use shadelab::lighting::{LightDescription, LightKind, LightingModel, MaterialDescription};

/// Surface point being lit, in world space.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Direction from the surface toward the light, or `None` for ambient light.
fn light_direction(light: &LightDescription, position: Vec3) -> Option<Vec3> {
    let origin = light.position?;
    let direction = match light.kind {
        LightKind::Ambient => return None,
        // directional lights shine from their position toward the origin
        LightKind::Directional => origin,
        LightKind::Point => origin - position,
    };
    direction.try_normalize()
}

fn diffuse_term(model: &LightingModel, n_dot_l: f32) -> f32 {
    match model {
        LightingModel::Toon { bands } => {
            let bands = (*bands).max(1) as f32;
            (n_dot_l * bands).ceil() / bands
        }
        _ => n_dot_l,
    }
}

/// Shininess and specular color for models with a highlight.
fn highlight(model: &LightingModel, base: Vec3) -> Option<(f32, Vec3)> {
    match *model {
        LightingModel::Phong {
            shininess,
            specular,
        } => Some((shininess.max(1.0), Vec3::from(specular.0))),
        LightingModel::Standard {
            metalness,
            roughness,
        } => {
            let alpha = roughness.clamp(0.05, 1.0).powi(2);
            let shininess = (2.0 / (alpha * alpha) - 2.0).max(1.0);
            let f0 = Vec3::splat(0.04).lerp(base, metalness.clamp(0.0, 1.0));
            Some((shininess, f0))
        }
        _ => None,
    }
}

/// Color of `material` at `point` seen from `eye`.
pub fn shade(
    material: &MaterialDescription,
    point: SurfacePoint,
    eye: Vec3,
    lights: &[LightDescription],
) -> Rgb {
    let base = Vec3::from(material.color.0);
    if !material.is_lit() {
        return material.color;
    }

    let normal = point.normal.try_normalize().unwrap_or(Vec3::Z);
    let view = (eye - point.position).try_normalize().unwrap_or(Vec3::Z);
    let specular = highlight(&material.model, base);
    let diffuse_weight = match material.model {
        LightingModel::Standard { metalness, .. } => 1.0 - metalness.clamp(0.0, 1.0),
        LightingModel::Lambert { reflectivity, .. } => reflectivity.clamp(0.0, 1.0),
        _ => 1.0,
    };

    let mut diffuse = Vec3::ZERO;
    let mut highlights = Vec3::ZERO;
    for light in lights {
        let radiance = Vec3::from(light.color.0) * light.intensity;
        let Some(to_light) = light_direction(light, point.position) else {
            if light.kind == LightKind::Ambient {
                diffuse += radiance;
            }
            continue;
        };
        let n_dot_l = normal.dot(to_light).max(0.0);
        if n_dot_l <= 0.0 {
            continue;
        }
        diffuse += radiance * diffuse_term(&material.model, n_dot_l);
        if let Some((shininess, tint)) = specular {
            let half = (to_light + view).normalize_or_zero();
            let n_dot_h = normal.dot(half).max(0.0);
            highlights += radiance * tint * n_dot_h.powf(shininess);
        }
    }

    let mut color = base * diffuse * diffuse_weight + highlights;
    if let LightingModel::Lambert {
        emissive,
        emissive_intensity,
        ..
    } = material.model
    {
        color += Vec3::from(emissive.0) * emissive_intensity;
    }
    let color = color.clamp(Vec3::ZERO, Vec3::ONE);
    Rgb(color.to_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelab::lighting::{resolve_material, ShadingMode};

    fn point_up() -> SurfacePoint {
        SurfacePoint {
            position: Vec3::ZERO,
            normal: Vec3::Y,
        }
    }

    fn light(kind: LightKind, position: Option<Vec3>) -> LightDescription {
        LightDescription {
            kind,
            color: Rgb::WHITE,
            intensity: 1.0,
            position,
        }
    }

    #[test]
    fn unlit_materials_ignore_lights() {
        let material = resolve_material(ShadingMode::Wireframe, Rgb::from_hex(0x336699), None);
        let color = shade(&material, point_up(), Vec3::Z * 5.0, &[]);
        assert_eq!(color, Rgb::from_hex(0x336699));
    }

    #[test]
    fn no_lights_means_black() {
        let material = resolve_material(ShadingMode::Phong, Rgb::WHITE, None);
        assert_eq!(shade(&material, point_up(), Vec3::Z * 5.0, &[]), Rgb::BLACK);
    }

    #[test]
    fn light_behind_the_surface_adds_nothing() {
        let material = resolve_material(ShadingMode::Gouraud, Rgb::WHITE, None);
        let below = [light(LightKind::Point, Some(Vec3::new(0.0, -3.0, 0.0)))];
        let lit = shade(&material, point_up(), Vec3::Z * 5.0, &below);
        // only the emissive floor remains
        assert!(lit.0.iter().all(|c| *c < 0.01));
    }

    #[test]
    fn toon_diffuse_is_banded() {
        let material = resolve_material(ShadingMode::Toon, Rgb::WHITE, None);
        let slanted = [light(LightKind::Directional, Some(Vec3::new(1.0, 1.0, 0.0)))];
        let color = shade(&material, point_up(), Vec3::Y * 5.0, &slanted);
        // cos 45 deg = 0.707 rounds up to the top of its band
        assert!((color.0[0] - 1.0).abs() < 1e-5);

        let grazing = [light(LightKind::Directional, Some(Vec3::new(3.0, 1.0, 0.0)))];
        let color = shade(&material, point_up(), Vec3::Y * 5.0, &grazing);
        assert!((color.0[0] - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn ambient_light_lifts_everything_evenly() {
        let material = resolve_material(ShadingMode::Pbr, Rgb::from_hex(0x808080), None);
        let ambient = [light(LightKind::Ambient, None)];
        let color = shade(&material, point_up(), Vec3::Z * 5.0, &ambient);
        assert_eq!(color, Rgb::from_hex(0x808080));
    }
}
