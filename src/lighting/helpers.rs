//! Light helper markers: unlit debug geometry showing where a light sits and
//! which way it points. Helpers never take part in illumination.

use super::{LightKind, LightSpec};
use crate::color::Rgb;
use crate::geometry::Geometry;
use glam::{Mat4, Quat, Vec3};
use std::sync::{Arc, OnceLock};

pub const HELPER_SCALE: f32 = 0.3;

/// Marker mesh placed in the scene for one light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightHelper {
    pub kind: LightKind,
    pub geometry: Arc<Geometry>,
    pub transform: Mat4,
    pub tint: Rgb,
}

/// Marker for `spec`, or `None` when its helper is hidden or the light has no position.
pub fn light_helper(spec: &LightSpec) -> Option<LightHelper> {
    if !spec.helper_visible || !spec.kind.has_position() {
        return None;
    }

    let (geometry, orientation) = match spec.kind {
        LightKind::Directional => {
            // directional lights shine from their position toward the origin
            let direction = normalized_direction(-spec.position);
            (directional_marker(), Quat::from_rotation_arc(Vec3::Y, direction))
        }
        LightKind::Point => (point_marker(), Quat::IDENTITY),
        LightKind::Ambient => return None,
    };

    let transform = Mat4::from_translation(spec.position)
        * Mat4::from_quat(orientation)
        * Mat4::from_scale(Vec3::splat(HELPER_SCALE));

    Some(LightHelper {
        kind: spec.kind,
        geometry,
        transform,
        tint: spec.color,
    })
}

fn normalized_direction(direction: Vec3) -> Vec3 {
    if direction.length_squared() <= 1e-10 {
        Vec3::NEG_Y
    } else {
        direction.normalize()
    }
}

fn directional_marker() -> Arc<Geometry> {
    static MESH: OnceLock<Arc<Geometry>> = OnceLock::new();
    MESH.get_or_init(|| {
        let mut mesh = create_arrow_mesh();
        // three short rays around the arrow
        for i in 0..3 {
            let angle = i as f32 / 3.0 * std::f32::consts::TAU;
            let offset = Vec3::new(0.35 * angle.cos(), 0.0, 0.35 * angle.sin());
            let mut ray = create_cone_mesh(0.06, 0.5, 8);
            translate(&mut ray, offset + Vec3::new(0.0, 0.5, 0.0));
            mesh.append(&ray);
        }
        Arc::new(mesh)
    })
    .clone()
}

fn point_marker() -> Arc<Geometry> {
    static MESH: OnceLock<Arc<Geometry>> = OnceLock::new();
    MESH.get_or_init(|| {
        let mut mesh = create_octahedron_mesh(0.35);
        // spikes radiating along the axes and the cube diagonals
        let mut directions = vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for x in [-1.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for z in [-1.0f32, 1.0] {
                    directions.push(Vec3::new(x, y, z).normalize());
                }
            }
        }
        for direction in directions {
            let mut spike = create_cone_mesh(0.05, 0.6, 6);
            // cone tip sits at the origin and opens toward -Y; flip it outward
            let rotation = Quat::from_rotation_arc(Vec3::NEG_Y, -direction);
            let transform = Mat4::from_translation(direction * 1.0) * Mat4::from_quat(rotation);
            apply_transform(&mut spike, transform);
            mesh.append(&spike);
        }
        Arc::new(mesh)
    })
    .clone()
}

fn translate(mesh: &mut Geometry, offset: Vec3) {
    apply_transform(mesh, Mat4::from_translation(offset));
}

fn apply_transform(mesh: &mut Geometry, transform: Mat4) {
    for p in &mut mesh.positions {
        *p = transform.transform_point3(Vec3::from_array(*p)).to_array();
    }
    for n in &mut mesh.normals {
        *n = transform
            .transform_vector3(Vec3::from_array(*n))
            .normalize_or_zero()
            .to_array();
    }
}

fn create_mesh(positions: &[[f32; 3]], indices: &[u32]) -> Geometry {
    let mut mesh = Geometry {
        positions: positions.to_vec(),
        normals: Vec::new(),
        uvs: vec![[0.0, 0.0]; positions.len()],
        indices: indices.to_vec(),
    };
    mesh.compute_vertex_normals();
    mesh
}

fn create_octahedron_mesh(extent: f32) -> Geometry {
    let positions: [[f32; 3]; 6] = [
        [0.0, extent, 0.0],
        [0.0, -extent, 0.0],
        [extent, 0.0, 0.0],
        [-extent, 0.0, 0.0],
        [0.0, 0.0, extent],
        [0.0, 0.0, -extent],
    ];
    let indices: [u32; 24] = [
        0, 4, 2, 0, 3, 4, 0, 5, 3, 0, 2, 5, 1, 2, 4, 1, 4, 3, 1, 3, 5, 1, 5, 2,
    ];
    create_mesh(&positions, &indices)
}

fn create_cone_mesh(base_radius: f32, height: f32, segments: usize) -> Geometry {
    let n = segments.max(3);
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(n + 2);
    let mut indices: Vec<u32> = Vec::with_capacity(n * 6);

    // Tip at the origin so the helper transform origin matches the light position.
    let tip_index = 0u32;
    positions.push([0.0, 0.0, 0.0]);
    let base_center_index = 1u32;
    positions.push([0.0, -height, 0.0]);

    for i in 0..n {
        let t = (i as f32 / n as f32) * std::f32::consts::TAU;
        positions.push([base_radius * t.cos(), -height, base_radius * t.sin()]);
    }

    for i in 0..n {
        let next = (i + 1) % n;
        let a = (2 + i) as u32;
        let b = (2 + next) as u32;
        indices.extend_from_slice(&[tip_index, b, a]);
        indices.extend_from_slice(&[base_center_index, a, b]);
    }
    create_mesh(&positions, &indices)
}

fn create_arrow_mesh() -> Geometry {
    let shaft_half = 0.06f32;
    let shaft_height = 0.65f32;
    let head_radius = 0.18f32;
    let head_height = 0.35f32;

    let mut positions: Vec<[f32; 3]> = vec![
        [-shaft_half, 0.0, -shaft_half],
        [shaft_half, 0.0, -shaft_half],
        [shaft_half, shaft_height, -shaft_half],
        [-shaft_half, shaft_height, -shaft_half],
        [-shaft_half, 0.0, shaft_half],
        [shaft_half, 0.0, shaft_half],
        [shaft_half, shaft_height, shaft_half],
        [-shaft_half, shaft_height, shaft_half],
    ];
    let mut indices: Vec<u32> = vec![
        0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 1, 2, 6, 1, 6, 5, 2, 3, 7, 2, 7,
        6, 3, 0, 4, 3, 4, 7,
    ];

    let start_index = positions.len() as u32;
    positions.push([0.0, shaft_height + head_height, 0.0]);
    let tip = start_index;
    let base_center = start_index + 1;
    positions.push([0.0, shaft_height, 0.0]);
    let segments = 12u32;
    for i in 0..segments {
        let t = (i as f32 / segments as f32) * std::f32::consts::TAU;
        positions.push([head_radius * t.cos(), shaft_height, head_radius * t.sin()]);
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        let a = start_index + 2 + i;
        let b = start_index + 2 + next;
        indices.extend_from_slice(&[tip, b, a]);
        indices.extend_from_slice(&[base_center, a, b]);
    }
    create_mesh(&positions, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::{default_custom_lights, resolve_light, BaseLights};

    #[test]
    fn hidden_helper_adds_no_geometry() {
        let lights = BaseLights::default();
        assert!(light_helper(&lights.diffuse).is_none());
        assert!(light_helper(&lights.diffuse.with_helper_visible(true)).is_some());
    }

    #[test]
    fn ambient_light_never_gets_a_marker() {
        let ambient = BaseLights::default().ambient.with_helper_visible(true);
        assert!(light_helper(&ambient).is_none());
    }

    #[test]
    fn helper_sits_at_the_light_and_does_not_touch_illumination() {
        let spec = default_custom_lights()[1]
            .with_enabled(true)
            .with_helper_visible(true);
        let before = resolve_light(&spec);
        let helper = light_helper(&spec).unwrap();
        assert_eq!(helper.kind, LightKind::Point);
        let origin = helper.transform.transform_point3(Vec3::ZERO);
        assert!((origin - spec.position).length() < 1e-5);
        assert_eq!(resolve_light(&spec), before);
        assert_eq!(helper.tint, spec.color);
    }

    #[test]
    fn directional_marker_points_at_the_origin() {
        let spec = BaseLights::default().diffuse.with_helper_visible(true);
        let helper = light_helper(&spec).unwrap();
        let forward = helper.transform.transform_vector3(Vec3::Y).normalize();
        let expected = (-spec.position).normalize();
        assert!(forward.dot(expected) > 0.999);
    }

    #[test]
    fn marker_meshes_are_shared() {
        let spec = BaseLights::default().specular.with_helper_visible(true);
        let a = light_helper(&spec).unwrap();
        let b = light_helper(&spec.with_position(Vec3::ONE)).unwrap();
        assert!(Arc::ptr_eq(&a.geometry, &b.geometry));
        assert!(a.geometry.vertex_count() > 6);
    }
}
