//! Indexed triangle geometry shared by the shape catalog, the model loader and
//! the light helpers.

use glam::{Mat4, Vec3};

/// Triangle list ready to hand to a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Vertex positions (x, y, z)
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals, same length as `positions`
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (u, v), same length as `positions`
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push(uv);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Appends `other` with its indices rebased onto this geometry.
    pub fn append(&mut self, other: &Geometry) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Axis-aligned bounds of the untransformed positions.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    /// Bounds of the positions after applying `transform`.
    pub fn transformed_bounds(&self, transform: Mat4) -> Option<Aabb> {
        Aabb::from_points(
            self.positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from_array(*p))),
        )
    }

    /// Recomputes smooth normals by accumulating area-weighted face normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= accum.len() || b >= accum.len() || c >= accum.len() {
                continue;
            }
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let face = (pb - pa).cross(pc - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Pads missing texture coordinates with zeros so every attribute has one entry per vertex.
    pub fn fill_missing_uvs(&mut self) {
        if self.uvs.len() != self.positions.len() {
            self.uvs.resize(self.positions.len(), [0.0, 0.0]);
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_positions() {
        let mut geometry = Geometry::new();
        let a = geometry.push_vertex(Vec3::new(-1.0, 0.0, 2.0), Vec3::Z, [0.0, 0.0]);
        let b = geometry.push_vertex(Vec3::new(3.0, -2.0, 0.0), Vec3::Z, [1.0, 0.0]);
        let c = geometry.push_vertex(Vec3::new(0.0, 4.0, -1.0), Vec3::Z, [0.0, 1.0]);
        geometry.push_triangle(a, b, c);

        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 6.0, 3.0));
        assert!(Geometry::new().bounds().is_none());
    }

    #[test]
    fn vertex_normals_follow_winding() {
        let mut geometry = Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        geometry.compute_vertex_normals();
        for normal in &geometry.normals {
            assert_eq!(*normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn append_rebases_indices() {
        let tri = Geometry {
            positions: vec![[0.0; 3]; 3],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            uvs: vec![[0.0; 2]; 3],
            indices: vec![0, 1, 2],
        };
        let mut merged = tri.clone();
        merged.append(&tri);
        assert_eq!(merged.vertex_count(), 6);
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
