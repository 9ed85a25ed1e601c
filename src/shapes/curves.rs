//! Curve-driven shapes: tubes swept along Catmull-Rom splines and an extruded
//! bezier outline.

use super::primitives::push_tube_indices;
use crate::geometry::Geometry;
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Uniform Catmull-Rom spline through a list of control points.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
    closed: bool,
    tension: f32,
}

impl CatmullRomCurve {
    pub fn new(points: Vec<Vec3>, closed: bool) -> Self {
        Self {
            points,
            closed,
            tension: 0.5,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Point at parameter `t` in `0.0..=1.0`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let len = self.points.len();
        match len {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }

        let span = if self.closed { len } else { len - 1 };
        let p = span as f32 * t.clamp(0.0, 1.0);
        let mut segment = p.floor() as usize;
        let mut weight = p - segment as f32;

        if self.closed {
            segment %= len;
        } else if segment >= len - 1 {
            segment = len - 2;
            weight = 1.0;
        }

        let (p0, p1, p2, p3) = if self.closed {
            (
                self.points[(segment + len - 1) % len],
                self.points[segment % len],
                self.points[(segment + 1) % len],
                self.points[(segment + 2) % len],
            )
        } else {
            let p1 = self.points[segment];
            let p2 = self.points[segment + 1];
            let p0 = if segment > 0 {
                self.points[segment - 1]
            } else {
                p1 * 2.0 - p2
            };
            let p3 = if segment + 2 < len {
                self.points[segment + 2]
            } else {
                p2 * 2.0 - p1
            };
            (p0, p1, p2, p3)
        };

        let t0 = (p2 - p0) * self.tension;
        let t1 = (p3 - p1) * self.tension;
        let c2 = p1 * -3.0 + p2 * 3.0 - t0 * 2.0 - t1;
        let c3 = p1 * 2.0 - p2 * 2.0 + t0 + t1;
        p1 + t0 * weight + c2 * weight * weight + c3 * weight * weight * weight
    }

    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let delta = 1e-4;
        let (t1, t2) = if self.closed {
            (t - delta, t + delta)
        } else {
            ((t - delta).max(0.0), (t + delta).min(1.0))
        };
        let wrap = |v: f32| if self.closed { v.rem_euclid(1.0) } else { v };
        (self.point_at(wrap(t2)) - self.point_at(wrap(t1))).normalize_or_zero()
    }
}

/// Sweeps a circle of `radius` along `curve` using parallel-transported frames.
pub fn generate_tube(
    curve: &CatmullRomCurve,
    tubular_segments: u32,
    radius: f32,
    radial_segments: u32,
) -> Geometry {
    let mut data = Geometry::new();
    let segments = tubular_segments.max(2);
    let radial = radial_segments.max(3);

    let tangents: Vec<Vec3> = (0..=segments)
        .map(|i| curve.tangent_at(i as f32 / segments as f32))
        .collect();

    let first = tangents[0];
    let seed = if first.x.abs() <= first.y.abs() && first.x.abs() <= first.z.abs() {
        Vec3::X
    } else if first.y.abs() <= first.z.abs() {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let mut normal = first.cross(seed).normalize_or_zero();

    for (i, tangent) in tangents.iter().enumerate() {
        let projected = normal - *tangent * normal.dot(*tangent);
        normal = projected.try_normalize().unwrap_or(normal);
        let binormal = tangent.cross(normal);

        let t = i as f32 / segments as f32;
        // the closing ring of a closed curve sits exactly on the first one
        let center = if curve.is_closed() && i as u32 == segments {
            curve.point_at(0.0)
        } else {
            curve.point_at(t)
        };

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let direction = (normal * -v.cos() + binormal * v.sin()).normalize_or_zero();
            data.push_vertex(
                center + direction * radius,
                direction,
                [t, j as f32 / radial as f32],
            );
        }
    }

    push_tube_indices(&mut data, segments, radial);
    data
}

/// Control points of the closed eight-point trefoil loop.
pub fn trefoil_curve() -> CatmullRomCurve {
    CatmullRomCurve::new(
        vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.5, -0.5, -0.5),
        ],
        true,
    )
}

/// Open helix of three turns whose radius widens from 0.1 to 0.5 over a unit height.
pub fn spiral_curve() -> CatmullRomCurve {
    let count = 100;
    let (radius_start, radius_end, height) = (0.1f32, 0.5f32, 1.0f32);
    let points = (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            let angle = t * std::f32::consts::PI * 6.0;
            let radius = radius_start + (radius_end - radius_start) * t;
            Vec3::new(
                radius * angle.cos(),
                height * t - height / 2.0,
                radius * angle.sin(),
            )
        })
        .collect();
    CatmullRomCurve::new(points, false)
}

fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    p0 * (k * k * k) + p1 * (3.0 * k * k * t) + p2 * (3.0 * k * t * t) + p3 * (t * t * t)
}

/// Counter-clockwise heart outline built from four cubic bezier segments.
pub fn heart_outline(samples_per_segment: u32) -> Vec<Vec2> {
    let segments = [
        [
            Vec2::new(0.0, 0.25),
            Vec2::new(0.0, 0.25),
            Vec2::new(-0.25, 0.0),
            Vec2::new(-0.25, 0.0),
        ],
        [
            Vec2::new(-0.25, 0.0),
            Vec2::new(-0.25, -0.25),
            Vec2::new(0.0, -0.25),
            Vec2::new(0.0, -0.25),
        ],
        [
            Vec2::new(0.0, -0.25),
            Vec2::new(0.25, -0.25),
            Vec2::new(0.25, 0.0),
            Vec2::new(0.25, 0.0),
        ],
        [
            Vec2::new(0.25, 0.0),
            Vec2::new(0.25, 0.25),
            Vec2::new(0.0, 0.25),
            Vec2::new(0.0, 0.25),
        ],
    ];
    let samples = samples_per_segment.max(1);
    let mut outline = Vec::with_capacity(segments.len() * samples as usize);
    for [p0, p1, p2, p3] in segments {
        // last sample of each segment is the first of the next
        for s in 0..samples {
            outline.push(cubic_bezier(p0, p1, p2, p3, s as f32 / samples as f32));
        }
    }
    outline
}

/// Extrudes a counter-clockwise, star-shaped outline from `z = 0` to `z = depth`.
pub fn extrude_outline(outline: &[Vec2], depth: f32) -> Geometry {
    let mut data = Geometry::new();
    if outline.len() < 3 {
        return data;
    }
    let n = outline.len();
    let centroid = outline.iter().copied().sum::<Vec2>() / n as f32;
    let min = outline.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min);
    let max = outline.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max);
    let extent = (max - min).max(Vec2::splat(f32::EPSILON));
    let uv = |p: Vec2| -> [f32; 2] {
        let q = (p - min) / extent;
        [q.x, q.y]
    };

    for (z, normal, front) in [(depth, Vec3::Z, true), (0.0, Vec3::NEG_Z, false)] {
        let center = data.push_vertex(centroid.extend(z), normal, uv(centroid));
        let ring = data.positions.len() as u32;
        for p in outline {
            data.push_vertex(p.extend(z), normal, uv(*p));
        }
        for i in 0..n as u32 {
            let next = (i + 1) % n as u32;
            if front {
                data.push_triangle(center, ring + i, ring + next);
            } else {
                data.push_triangle(center, ring + next, ring + i);
            }
        }
    }

    let mut travelled = 0.0;
    let perimeter: f32 = (0..n)
        .map(|i| outline[i].distance(outline[(i + 1) % n]))
        .sum();
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        let edge = b - a;
        let normal = Vec3::new(edge.y, -edge.x, 0.0).normalize_or_zero();
        let u0 = travelled / perimeter.max(f32::EPSILON);
        travelled += edge.length();
        let u1 = travelled / perimeter.max(f32::EPSILON);

        let b0 = data.push_vertex(a.extend(0.0), normal, [u0, 0.0]);
        let b1 = data.push_vertex(b.extend(0.0), normal, [u1, 0.0]);
        let f1 = data.push_vertex(b.extend(depth), normal, [u1, 1.0]);
        let f0 = data.push_vertex(a.extend(depth), normal, [u0, 1.0]);
        data.push_triangle(b0, b1, f1);
        data.push_triangle(b0, f1, f0);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_curve_hits_its_endpoints() {
        let curve = spiral_curve();
        let start = curve.point_at(0.0);
        let end = curve.point_at(1.0);
        assert!((start - Vec3::new(0.1, -0.5, 0.0)).length() < 1e-5);
        assert!((end.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn closed_curve_wraps_around() {
        let curve = trefoil_curve();
        let start = curve.point_at(0.0);
        let end = curve.point_at(1.0);
        assert!((start - end).length() < 1e-4);
        assert!((start - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn tube_vertices_stay_at_radius_from_curve() {
        let curve = trefoil_curve();
        let tube = generate_tube(&curve, 40, 0.15, 8);
        assert_eq!(tube.vertex_count(), 41 * 9);
        assert_eq!(tube.triangle_count(), 2 * 40 * 8);
        let center = curve.point_at(0.0);
        for p in &tube.positions[..9] {
            assert!((Vec3::from_array(*p).distance(center) - 0.15).abs() < 1e-4);
        }
    }

    #[test]
    fn heart_outline_is_counter_clockwise() {
        let outline = heart_outline(12);
        assert_eq!(outline.len(), 48);
        let twice_area: f32 = (0..outline.len())
            .map(|i| {
                let a = outline[i];
                let b = outline[(i + 1) % outline.len()];
                a.x * b.y - b.x * a.y
            })
            .sum();
        assert!(twice_area > 0.0);
    }

    #[test]
    fn extrusion_spans_requested_depth() {
        let heart = extrude_outline(&heart_outline(12), 0.2);
        let bounds = heart.bounds().unwrap();
        assert!((bounds.size().z - 0.2).abs() < 1e-6);
        assert_eq!(heart.normals.len(), heart.vertex_count());
        assert!(heart.triangle_count() > 48 * 2);
    }
}
