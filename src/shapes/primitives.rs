//! # Primitive Shape Generation
//!
//! Closed-form generators for the built-in catalog. All shapes are Y-up, centered
//! at the origin and carry outward normals and texture coordinates.

use crate::geometry::Geometry;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Axis-aligned box centered at the origin with one quad (4 vertices) per face.
pub fn generate_box(width: f32, height: f32, depth: f32) -> Geometry {
    let mut data = Geometry::new();
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

    // (normal, u axis, v axis) per face
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let half = Vec3::new(hx, hy, hz);

    for (normal, u_axis, v_axis) in faces {
        let center = normal * half;
        let u = u_axis * half;
        let v = v_axis * half;
        let a = data.push_vertex(center - u - v, normal, [0.0, 0.0]);
        let b = data.push_vertex(center + u - v, normal, [1.0, 0.0]);
        let c = data.push_vertex(center + u + v, normal, [1.0, 1.0]);
        let d = data.push_vertex(center - u + v, normal, [0.0, 1.0]);
        data.push_triangle(a, b, c);
        data.push_triangle(c, d, a);
    }

    data
}

/// UV sphere of the given radius.
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let mut data = Geometry::new();
    let long_segs = width_segments.max(3);
    let lat_segs = height_segments.max(2);

    for lat in 0..=lat_segs {
        let v = lat as f32 / lat_segs as f32;
        let (sin_theta, cos_theta) = (v * PI).sin_cos();
        for long in 0..=long_segs {
            let u = long as f32 / long_segs as f32;
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let normal = Vec3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            data.push_vertex(normal * radius, normal, [u, 1.0 - v]);
        }
    }

    let row = long_segs + 1;
    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * row + long;
            let second = first + row;
            // pole rows collapse to a point, so they only get one triangle
            if lat != 0 {
                data.push_triangle(first + 1, first, second + 1);
            }
            if lat != lat_segs - 1 {
                data.push_triangle(first, second, second + 1);
            }
        }
    }

    data
}

/// Open-ended frustum along Y with caps; `radius_top = 0` produces a cone.
pub fn generate_cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> Geometry {
    let mut data = Geometry::new();
    let segs = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);

    // side rings: row 0 at the top, row 1 at the bottom
    for row in 0..=1u32 {
        let radius = if row == 0 { radius_top } else { radius_bottom };
        let y = if row == 0 { half_height } else { -half_height };
        for i in 0..=segs {
            let u = i as f32 / segs as f32;
            let (sin_t, cos_t) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_t, slope, cos_t).normalize();
            data.push_vertex(
                Vec3::new(radius * sin_t, y, radius * cos_t),
                normal,
                [u, 1.0 - row as f32],
            );
        }
    }
    let row = segs + 1;
    for i in 0..segs {
        let a = i;
        let b = row + i;
        let c = row + i + 1;
        let d = i + 1;
        data.push_triangle(a, b, d);
        data.push_triangle(b, c, d);
    }

    if radius_top > 0.0 {
        push_cap(&mut data, radius_top, half_height, segs, true);
    }
    if radius_bottom > 0.0 {
        push_cap(&mut data, radius_bottom, -half_height, segs, false);
    }

    data
}

fn push_cap(data: &mut Geometry, radius: f32, y: f32, segs: u32, top: bool) {
    let normal = if top { Vec3::Y } else { Vec3::NEG_Y };
    let center = data.push_vertex(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]);
    let ring_start = data.positions.len() as u32;
    for i in 0..=segs {
        let (sin_t, cos_t) = (i as f32 / segs as f32 * TAU).sin_cos();
        data.push_vertex(
            Vec3::new(radius * sin_t, y, radius * cos_t),
            normal,
            [0.5 + 0.5 * sin_t, 0.5 + 0.5 * cos_t],
        );
    }
    for i in 0..segs {
        let current = ring_start + i;
        if top {
            data.push_triangle(center, current, current + 1);
        } else {
            data.push_triangle(center, current + 1, current);
        }
    }
}

pub fn generate_cone(radius: f32, height: f32, radial_segments: u32) -> Geometry {
    generate_cylinder(0.0, radius, height, radial_segments)
}

/// Ring torus in the XY plane.
pub fn generate_torus(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> Geometry {
    let mut data = Geometry::new();
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            data.push_vertex(
                position,
                (position - center).normalize_or_zero(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            );
        }
    }

    push_grid_indices(&mut data, radial, tubular);
    data
}

/// (p, q) torus knot; the catalog uses the classic (2, 3) trefoil winding.
pub fn generate_torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> Geometry {
    let mut data = Geometry::new();
    let tubular = tubular_segments.max(3);
    let radial = radial_segments.max(3);

    let curve = |u: f32| -> Vec3 {
        let qu_over_p = q as f32 / p as f32 * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * 0.5 * u.sin(),
            radius * qu_over_p.sin() * 0.5,
        )
    };

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p as f32 * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);
        let tangent = p2 - p1;
        let mut normal = p2 + p1;
        let binormal = tangent.cross(normal).normalize_or_zero();
        normal = binormal.cross(tangent).normalize_or_zero();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let position = p1 + normal * cx + binormal * cy;
            data.push_vertex(
                position,
                (position - p1).normalize_or_zero(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            );
        }
    }

    push_tube_indices(&mut data, tubular, radial);
    data
}

/// Indices for an `(outer + 1) x (inner + 1)` vertex grid laid out row by row.
pub(crate) fn push_grid_indices(data: &mut Geometry, outer: u32, inner: u32) {
    let row = inner + 1;
    for j in 1..=outer {
        for i in 1..=inner {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            data.push_triangle(a, b, d);
            data.push_triangle(b, c, d);
        }
    }
}

/// Indices for a swept tube: `segments + 1` rings of `radial + 1` vertices.
pub(crate) fn push_tube_indices(data: &mut Geometry, segments: u32, radial: u32) {
    let row = radial + 1;
    for j in 1..=segments {
        for i in 1..=radial {
            let a = row * (j - 1) + i - 1;
            let b = row * j + i - 1;
            let c = row * j + i;
            let d = row * (j - 1) + i;
            data.push_triangle(a, b, d);
            data.push_triangle(b, c, d);
        }
    }
}

/// Platonic solids, emitted flat-shaded: three vertices and one face normal per triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polyhedron {
    Tetrahedron,
    Octahedron,
    Dodecahedron,
    Icosahedron,
}

pub fn generate_polyhedron(kind: Polyhedron, radius: f32) -> Geometry {
    let (vertices, indices) = polyhedron_tables(kind);
    let mut data = Geometry::new();

    for tri in indices.chunks_exact(3) {
        let mut corners = [
            vertices[tri[0]].normalize() * radius,
            vertices[tri[1]].normalize() * radius,
            vertices[tri[2]].normalize() * radius,
        ];
        let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
        let mut normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        // convex and centered: every face normal must point away from the origin
        if normal.dot(centroid) < 0.0 {
            corners.swap(1, 2);
            normal = -normal;
        }
        let a = data.push_vertex(corners[0], normal, spherical_uv(corners[0]));
        let b = data.push_vertex(corners[1], normal, spherical_uv(corners[1]));
        let c = data.push_vertex(corners[2], normal, spherical_uv(corners[2]));
        data.push_triangle(a, b, c);
    }

    data
}

fn spherical_uv(p: Vec3) -> [f32; 2] {
    let n = p.normalize_or_zero();
    [
        n.z.atan2(-n.x) / TAU + 0.5,
        n.y.clamp(-1.0, 1.0).asin() / PI + 0.5,
    ]
}

fn polyhedron_tables(kind: Polyhedron) -> (Vec<Vec3>, &'static [usize]) {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    let r = 1.0 / t;
    match kind {
        Polyhedron::Tetrahedron => (
            vec![
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
            ],
            &[2, 1, 0, 0, 3, 2, 1, 3, 0, 2, 3, 1],
        ),
        Polyhedron::Octahedron => (
            vec![
                Vec3::X,
                Vec3::NEG_X,
                Vec3::Y,
                Vec3::NEG_Y,
                Vec3::Z,
                Vec3::NEG_Z,
            ],
            &[
                0, 2, 4, 0, 4, 3, 0, 3, 5, 0, 5, 2, 1, 2, 5, 1, 5, 3, 1, 3, 4, 1, 4, 2,
            ],
        ),
        Polyhedron::Icosahedron => (
            vec![
                Vec3::new(-1.0, t, 0.0),
                Vec3::new(1.0, t, 0.0),
                Vec3::new(-1.0, -t, 0.0),
                Vec3::new(1.0, -t, 0.0),
                Vec3::new(0.0, -1.0, t),
                Vec3::new(0.0, 1.0, t),
                Vec3::new(0.0, -1.0, -t),
                Vec3::new(0.0, 1.0, -t),
                Vec3::new(t, 0.0, -1.0),
                Vec3::new(t, 0.0, 1.0),
                Vec3::new(-t, 0.0, -1.0),
                Vec3::new(-t, 0.0, 1.0),
            ],
            &[
                0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10,
                7, 6, 7, 1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6,
                2, 10, 8, 6, 7, 9, 8, 1,
            ],
        ),
        Polyhedron::Dodecahedron => (
            vec![
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(-1.0, 1.0, 1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(1.0, 1.0, -1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.0, -r, -t),
                Vec3::new(0.0, -r, t),
                Vec3::new(0.0, r, -t),
                Vec3::new(0.0, r, t),
                Vec3::new(-r, -t, 0.0),
                Vec3::new(-r, t, 0.0),
                Vec3::new(r, -t, 0.0),
                Vec3::new(r, t, 0.0),
                Vec3::new(-t, 0.0, -r),
                Vec3::new(t, 0.0, -r),
                Vec3::new(-t, 0.0, r),
                Vec3::new(t, 0.0, r),
            ],
            &[
                3, 11, 7, 3, 7, 15, 3, 15, 13, 7, 19, 17, 7, 17, 6, 7, 6, 15, 17, 4, 8, 17, 8, 10,
                17, 10, 6, 8, 0, 16, 8, 16, 2, 8, 2, 10, 0, 12, 1, 0, 1, 18, 0, 18, 16, 6, 10, 2,
                6, 2, 13, 6, 13, 15, 2, 16, 18, 2, 18, 3, 2, 3, 13, 18, 1, 9, 18, 9, 11, 18, 11, 3,
                4, 14, 12, 4, 12, 0, 4, 0, 8, 11, 9, 5, 11, 5, 19, 11, 19, 7, 19, 5, 14, 19, 14, 4,
                19, 4, 17, 1, 12, 14, 1, 14, 5, 1, 5, 9,
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(geometry: &Geometry) {
        assert!(geometry.vertex_count() > 0);
        assert_eq!(geometry.normals.len(), geometry.vertex_count());
        assert_eq!(geometry.uvs.len(), geometry.vertex_count());
        assert_eq!(geometry.indices.len() % 3, 0);
        let count = geometry.vertex_count() as u32;
        assert!(geometry.indices.iter().all(|i| *i < count));
    }

    #[test]
    fn box_has_four_vertices_per_face() {
        let cube = generate_box(1.0, 1.0, 1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.size(), Vec3::ONE);
        assert_well_formed(&cube);
    }

    #[test]
    fn box_faces_wind_outward() {
        let cube = generate_box(2.0, 2.0, 2.0);
        for tri in cube.indices.chunks_exact(3) {
            let a = Vec3::from_array(cube.positions[tri[0] as usize]);
            let b = Vec3::from_array(cube.positions[tri[1] as usize]);
            let c = Vec3::from_array(cube.positions[tri[2] as usize]);
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = generate_sphere(0.7, 16, 8);
        assert_well_formed(&sphere);
        for p in &sphere.positions {
            assert!((Vec3::from_array(*p).length() - 0.7).abs() < 1e-4);
        }
    }

    #[test]
    fn cone_has_a_single_cap() {
        let cone = generate_cone(0.7, 1.5, 32);
        let cylinder = generate_cylinder(0.5, 0.5, 1.0, 32);
        assert_well_formed(&cone);
        assert_well_formed(&cylinder);
        assert!(cylinder.vertex_count() > cone.vertex_count());
        let bounds = cone.bounds().unwrap();
        assert!((bounds.size().y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn torus_and_knot_are_closed_grids() {
        let torus = generate_torus(0.5, 0.2, 16, 100);
        assert_eq!(torus.vertex_count(), 17 * 101);
        assert_eq!(torus.triangle_count(), 2 * 16 * 100);
        assert_well_formed(&torus);

        let knot = generate_torus_knot(0.5, 0.15, 100, 16, 2, 3);
        assert_eq!(knot.vertex_count(), 101 * 17);
        assert_well_formed(&knot);
    }

    #[test]
    fn polyhedra_face_counts() {
        let cases = [
            (Polyhedron::Tetrahedron, 4),
            (Polyhedron::Octahedron, 8),
            (Polyhedron::Icosahedron, 20),
            (Polyhedron::Dodecahedron, 36),
        ];
        for (kind, triangles) in cases {
            let solid = generate_polyhedron(kind, 0.8);
            assert_eq!(solid.triangle_count(), triangles, "{:?}", kind);
            assert_well_formed(&solid);
            for p in &solid.positions {
                assert!((Vec3::from_array(*p).length() - 0.8).abs() < 1e-4);
            }
        }
    }
}
