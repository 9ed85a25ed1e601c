//! # Shape Catalog
//!
//! Static registry of the built-in procedural shapes, in gallery order. Every
//! entry pairs an identifier with a pure geometry factory and the transform the
//! viewer starts from.

pub mod curves;
pub mod primitives;

use crate::geometry::Geometry;
use glam::Vec3;
use primitives::Polyhedron;
use std::f32::consts::FRAC_PI_2;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("shape with id '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    Cube,
    Sphere,
    Cone,
    Torus,
    Cylinder,
    Tetrahedron,
    Octahedron,
    Dodecahedron,
    Icosahedron,
    TorusKnot,
    Heart,
    Trefoil,
    Spiral,
}

impl ShapeId {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeId::Cube => "cube",
            ShapeId::Sphere => "sphere",
            ShapeId::Cone => "cone",
            ShapeId::Torus => "torus",
            ShapeId::Cylinder => "cylinder",
            ShapeId::Tetrahedron => "tetrahedron",
            ShapeId::Octahedron => "octahedron",
            ShapeId::Dodecahedron => "dodecahedron",
            ShapeId::Icosahedron => "icosahedron",
            ShapeId::TorusKnot => "torusKnot",
            ShapeId::Heart => "heart",
            ShapeId::Trefoil => "trefoil",
            ShapeId::Spiral => "spiral",
        }
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeId {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SHAPES
            .iter()
            .map(|shape| shape.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ShapeError::NotFound(s.to_string()))
    }
}

/// Immutable catalog entry.
#[derive(Debug)]
pub struct ShapeDefinition {
    pub id: ShapeId,
    pub display_name: &'static str,
    pub geometry_factory: fn() -> Geometry,
    pub default_position: Vec3,
    pub default_rotation: Vec3,
    pub default_scale: Vec3,
}

impl ShapeDefinition {
    const fn new(id: ShapeId, display_name: &'static str, geometry_factory: fn() -> Geometry) -> Self {
        Self {
            id,
            display_name,
            geometry_factory,
            default_position: Vec3::ZERO,
            default_rotation: Vec3::ZERO,
            default_scale: Vec3::ONE,
        }
    }

    const fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.default_rotation = rotation;
        self
    }

    pub fn geometry(&self) -> Geometry {
        (self.geometry_factory)()
    }
}

static SHAPES: [ShapeDefinition; 13] = [
    ShapeDefinition::new(ShapeId::Cube, "Cube", cube)
        .with_rotation(Vec3::new(0.5, 0.5, 0.0)),
    ShapeDefinition::new(ShapeId::Sphere, "Sphere", sphere),
    ShapeDefinition::new(ShapeId::Cone, "Cone", cone),
    ShapeDefinition::new(ShapeId::Torus, "Torus", torus)
        .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
    ShapeDefinition::new(ShapeId::Cylinder, "Cylinder", cylinder),
    ShapeDefinition::new(ShapeId::Tetrahedron, "Tetrahedron", tetrahedron),
    ShapeDefinition::new(ShapeId::Octahedron, "Octahedron", octahedron),
    ShapeDefinition::new(ShapeId::Dodecahedron, "Dodecahedron", dodecahedron),
    ShapeDefinition::new(ShapeId::Icosahedron, "Icosahedron", icosahedron),
    ShapeDefinition::new(ShapeId::TorusKnot, "Torus Knot", torus_knot),
    ShapeDefinition::new(ShapeId::Heart, "Heart", heart),
    ShapeDefinition::new(ShapeId::Trefoil, "Trefoil Knot", trefoil),
    ShapeDefinition::new(ShapeId::Spiral, "Spiral", spiral),
];

fn cube() -> Geometry {
    primitives::generate_box(1.0, 1.0, 1.0)
}

fn sphere() -> Geometry {
    primitives::generate_sphere(0.7, 32, 32)
}

fn cone() -> Geometry {
    primitives::generate_cone(0.7, 1.5, 32)
}

fn torus() -> Geometry {
    primitives::generate_torus(0.5, 0.2, 16, 100)
}

fn cylinder() -> Geometry {
    primitives::generate_cylinder(0.5, 0.5, 1.0, 32)
}

fn tetrahedron() -> Geometry {
    primitives::generate_polyhedron(Polyhedron::Tetrahedron, 0.8)
}

fn octahedron() -> Geometry {
    primitives::generate_polyhedron(Polyhedron::Octahedron, 0.8)
}

fn dodecahedron() -> Geometry {
    primitives::generate_polyhedron(Polyhedron::Dodecahedron, 0.8)
}

fn icosahedron() -> Geometry {
    primitives::generate_polyhedron(Polyhedron::Icosahedron, 0.8)
}

fn torus_knot() -> Geometry {
    primitives::generate_torus_knot(0.5, 0.15, 100, 16, 2, 3)
}

fn heart() -> Geometry {
    curves::extrude_outline(&curves::heart_outline(12), 0.2)
}

fn trefoil() -> Geometry {
    curves::generate_tube(&curves::trefoil_curve(), 100, 0.15, 8)
}

fn spiral() -> Geometry {
    curves::generate_tube(&curves::spiral_curve(), 100, 0.05, 8)
}

/// All built-in shapes in declaration order.
pub fn list_shapes() -> &'static [ShapeDefinition] {
    &SHAPES
}

pub fn get_shape(id: ShapeId) -> &'static ShapeDefinition {
    // the catalog holds exactly one entry per variant, in declaration order
    &SHAPES[id as usize]
}

/// Looks a shape up by its string identifier (route segment, config value).
pub fn find_shape(id: &str) -> Result<&'static ShapeDefinition, ShapeError> {
    id.parse::<ShapeId>().map(get_shape)
}

/// What the viewer shows: a catalog shape or the user's uploaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeSelection {
    Builtin(ShapeId),
    CustomModel,
}

impl ShapeSelection {
    pub const CUSTOM_MODEL_ID: &'static str = "customModel";

    pub fn from_route(segment: &str) -> Result<Self, ShapeError> {
        if segment == Self::CUSTOM_MODEL_ID {
            return Ok(ShapeSelection::CustomModel);
        }
        segment.parse().map(ShapeSelection::Builtin)
    }

    pub fn route(&self) -> &'static str {
        match self {
            ShapeSelection::Builtin(id) => id.as_str(),
            ShapeSelection::CustomModel => Self::CUSTOM_MODEL_ID,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeSelection::Builtin(id) => get_shape(*id).display_name,
            ShapeSelection::CustomModel => "Custom Model",
        }
    }
}

impl Default for ShapeSelection {
    fn default() -> Self {
        ShapeSelection::Builtin(ShapeId::Cube)
    }
}

/// Gallery entries: every catalog shape followed by the custom-model tile.
pub fn selection_surface() -> Vec<ShapeSelection> {
    list_shapes()
        .iter()
        .map(|shape| ShapeSelection::Builtin(shape.id))
        .chain(std::iter::once(ShapeSelection::CustomModel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_shape_produces_geometry() {
        for shape in list_shapes() {
            let geometry = shape.geometry();
            assert!(geometry.vertex_count() > 0, "{} is empty", shape.id);
            assert!(geometry.triangle_count() > 0, "{} has no faces", shape.id);
        }
    }

    #[test]
    fn catalog_ids_are_unique_and_indexed_by_variant() {
        let mut seen = HashSet::new();
        for (index, shape) in list_shapes().iter().enumerate() {
            assert!(seen.insert(shape.id));
            assert_eq!(shape.id as usize, index);
            assert_eq!(get_shape(shape.id).id, shape.id);
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn unknown_id_is_not_found() {
        assert_eq!(
            find_shape("nonexistent").unwrap_err(),
            ShapeError::NotFound("nonexistent".to_string())
        );
        assert_eq!(find_shape("torusKnot").unwrap().display_name, "Torus Knot");
    }

    #[test]
    fn factories_are_repeatable() {
        let shape = get_shape(ShapeId::Trefoil);
        assert_eq!(shape.geometry(), shape.geometry());
    }

    #[test]
    fn routes_include_custom_model() {
        assert_eq!(
            ShapeSelection::from_route("customModel").unwrap(),
            ShapeSelection::CustomModel
        );
        assert_eq!(
            ShapeSelection::from_route("sphere").unwrap(),
            ShapeSelection::Builtin(ShapeId::Sphere)
        );
        assert!(ShapeSelection::from_route("teapot").is_err());

        let surface = selection_surface();
        assert_eq!(surface.len(), 14);
        assert_eq!(surface.last(), Some(&ShapeSelection::CustomModel));
        assert_eq!(surface[0].route(), "cube");
    }

    #[test]
    fn ids_parse_in_camel_case() {
        assert_eq!("torusKnot".parse::<ShapeId>().unwrap(), ShapeId::TorusKnot);
        assert_eq!(ShapeId::TorusKnot.as_str(), "torusKnot");
    }
}
