//! # External Model Loader
//!
//! Format detection, parsing of uploaded OBJ/glTF/GLB/STL bytes into a
//! [`ModelNode`] tree, and the bounding-box normalization that makes any upload
//! fit the viewer.

mod parsers;

use crate::geometry::{Aabb, Geometry};
use crate::lighting::MaterialDescription;
use glam::{Mat4, Vec3};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Obj,
    Gltf,
    Glb,
    Stl,
}

impl ModelFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ModelFormat::Obj => "obj",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Glb => "glb",
            ModelFormat::Stl => "stl",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// Format from the file extension, case-insensitive.
pub fn detect_format(filename: &str) -> Option<ModelFormat> {
    let (_, extension) = filename.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "obj" => Some(ModelFormat::Obj),
        "gltf" => Some(ModelFormat::Gltf),
        "glb" => Some(ModelFormat::Glb),
        "stl" => Some(ModelFormat::Stl),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Obj(#[from] tobj::LoadError),
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    #[error(transparent)]
    Stl(#[from] std::io::Error),
    #[error("the file contains no renderable geometry")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file format: {name}")]
    UnsupportedFormat { name: String },
    #[error("failed to parse {format} model: {source}")]
    Parse {
        format: ModelFormat,
        #[source]
        source: ParseError,
    },
    #[error("parser crashed while reading {name}")]
    ParserCrashed { name: String },
}

/// One mesh of a loaded model plus the material it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub material: MaterialDescription,
    /// The loaded material while a substitute is applied.
    stashed: Option<MaterialDescription>,
}

impl MeshPart {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: MaterialDescription) -> Self {
        Self {
            name: name.into(),
            geometry: Arc::new(geometry),
            material,
            stashed: None,
        }
    }

    pub fn has_override(&self) -> bool {
        self.stashed.is_some()
    }

    /// Shows `material` instead of the loaded one. The loaded material is kept
    /// only once, however many overrides are stacked.
    pub fn override_material(&mut self, material: MaterialDescription) {
        let previous = std::mem::replace(&mut self.material, material);
        if self.stashed.is_none() {
            self.stashed = Some(previous);
        }
    }

    pub fn restore_material(&mut self) {
        if let Some(original) = self.stashed.take() {
            self.material = original;
        }
    }
}

/// Node of a loaded object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Mat4,
    pub meshes: Vec<MeshPart>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len() + self.children.iter().map(ModelNode::mesh_count).sum::<usize>()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.vertex_count())
            .sum::<usize>()
            + self.children.iter().map(ModelNode::vertex_count).sum::<usize>()
    }

    /// Bounds of every mesh with all node transforms applied.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds_under(Mat4::IDENTITY)
    }

    fn bounds_under(&self, parent: Mat4) -> Option<Aabb> {
        let world = parent * self.transform;
        let own = self
            .meshes
            .iter()
            .filter_map(|mesh| mesh.geometry.transformed_bounds(world));
        let nested = self.children.iter().filter_map(|child| child.bounds_under(world));
        own.chain(nested).reduce(Aabb::union)
    }

    /// Visits every mesh with its accumulated world transform.
    pub fn visit_meshes<'a>(&'a self, parent: Mat4, visit: &mut dyn FnMut(&'a MeshPart, Mat4)) {
        let world = parent * self.transform;
        for mesh in &self.meshes {
            visit(mesh, world);
        }
        for child in &self.children {
            child.visit_meshes(world, visit);
        }
    }

    pub fn for_each_mesh_mut(&mut self, visit: &mut dyn FnMut(&mut MeshPart)) {
        for mesh in &mut self.meshes {
            visit(mesh);
        }
        for child in &mut self.children {
            child.for_each_mesh_mut(visit);
        }
    }

    pub fn override_materials(&mut self, material: &MaterialDescription) {
        self.for_each_mesh_mut(&mut |mesh| mesh.override_material(material.clone()));
    }

    /// Puts every loaded material back.
    pub fn restore_materials(&mut self) {
        self.for_each_mesh_mut(&mut |mesh| mesh.restore_material());
    }

    pub fn has_overrides(&self) -> bool {
        self.meshes.iter().any(MeshPart::has_override)
            || self.children.iter().any(ModelNode::has_overrides)
    }

    pub fn apply_normalization(&mut self, normalization: Normalization) {
        self.transform = normalization.matrix() * self.transform;
    }
}

/// Uniform scale and translation that fits a model into a cube of the target size
/// centered on the origin. Applied as `p * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub scale: f32,
    pub translation: Vec3,
}

impl Normalization {
    pub const IDENTITY: Normalization = Normalization {
        scale: 1.0,
        translation: Vec3::ZERO,
    };

    pub fn from_bounds(bounds: Aabb, target_size: f32) -> Self {
        let max_dimension = bounds.size().max_element();
        let scale = if max_dimension > f32::EPSILON {
            target_size / max_dimension
        } else {
            1.0
        };
        Self {
            scale,
            translation: -bounds.center() * scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

pub fn normalize(model: &ModelNode, target_size: f32) -> Normalization {
    model
        .bounds()
        .map(|bounds| Normalization::from_bounds(bounds, target_size))
        .unwrap_or(Normalization::IDENTITY)
}

/// Parses an uploaded file. Fails fast on an unknown extension; never returns
/// a model without geometry.
pub fn load_model(name: &str, bytes: &[u8]) -> Result<ModelNode, LoadError> {
    let format = detect_format(name).ok_or_else(|| LoadError::UnsupportedFormat {
        name: name.to_string(),
    })?;

    let parsed = match format {
        ModelFormat::Obj => parsers::parse_obj(name, bytes),
        ModelFormat::Gltf | ModelFormat::Glb => parsers::parse_gltf(name, bytes),
        ModelFormat::Stl => parsers::parse_stl(name, bytes),
    };
    let model = parsed
        .and_then(|model| {
            if model.mesh_count() == 0 || model.vertex_count() == 0 {
                Err(ParseError::Empty)
            } else {
                Ok(model)
            }
        })
        .map_err(|source| LoadError::Parse { format, source })?;

    log::info!(
        "loaded {} model '{}' ({} meshes, {} vertices)",
        format,
        name,
        model.mesh_count(),
        model.vertex_count()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::lighting::{resolve_material, LightingModel, ShadingMode};

    const CUBE_OBJ: &str = "\
o box
v 0 0 0
v 10 0 0
v 10 2 0
v 0 2 0
v 0 0 4
v 10 0 4
v 10 2 4
v 0 2 4
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 5 1 4 8
";

    #[test]
    fn formats_come_from_the_extension() {
        assert_eq!(detect_format("bunny.obj"), Some(ModelFormat::Obj));
        assert_eq!(detect_format("Scene.GLTF"), Some(ModelFormat::Gltf));
        assert_eq!(detect_format("a.b.glb"), Some(ModelFormat::Glb));
        assert_eq!(detect_format("part.Stl"), Some(ModelFormat::Stl));
        assert_eq!(detect_format("scene.fbx"), None);
        assert_eq!(detect_format("noextension"), None);
    }

    #[test]
    fn unsupported_extension_fails_before_parsing() {
        let err = load_model("model.fbx", CUBE_OBJ.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { name } if name == "model.fbx"));
    }

    #[test]
    fn obj_parses_into_a_default_phong_mesh() {
        let model = load_model("box.obj", CUBE_OBJ.as_bytes()).unwrap();
        assert_eq!(model.mesh_count(), 1);
        assert_eq!(model.vertex_count(), 8);
        let mesh = &model.children[0].meshes[0];
        assert_eq!(mesh.geometry.triangle_count(), 12);
        assert_eq!(mesh.geometry.normals.len(), 8);
        assert!(matches!(mesh.material.model, LightingModel::Phong { .. }));
        assert_eq!(mesh.material.color, Rgb::WHITE);
    }

    #[test]
    fn broken_obj_is_a_parse_error() {
        for source in ["v 0 0 zero\nf 1 1 1\n", "this is not a model\n", ""] {
            let err = load_model("broken.obj", source.as_bytes()).unwrap_err();
            assert!(
                matches!(err, LoadError::Parse { format: ModelFormat::Obj, .. }),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn normalization_fits_the_largest_dimension() {
        let model = load_model("box.obj", CUBE_OBJ.as_bytes()).unwrap();
        let normalization = normalize(&model, 2.0);
        assert!((normalization.scale - 0.2).abs() < 1e-6);
        let center = Vec3::new(5.0, 1.0, 2.0);
        assert!((normalization.translation - (-center * 0.2)).length() < 1e-6);

        let mut normalized = model.clone();
        normalized.apply_normalization(normalization);
        let bounds = normalized.bounds().unwrap();
        assert!(bounds.center().length() < 1e-5);
        assert!((bounds.size() - Vec3::new(2.0, 0.4, 0.8)).length() < 1e-5);
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let bounds = Aabb::new(Vec3::splat(3.0), Vec3::splat(3.0));
        let normalization = Normalization::from_bounds(bounds, 2.0);
        assert_eq!(normalization.scale, 1.0);
        assert_eq!(normalization.translation, Vec3::splat(-3.0));
    }

    #[test]
    fn overrides_restore_the_loaded_materials() {
        let mut model = load_model("box.obj", CUBE_OBJ.as_bytes()).unwrap();
        let loaded = model.clone();

        model.override_materials(&resolve_material(ShadingMode::Toon, Rgb::BLACK, None));
        model.override_materials(&resolve_material(ShadingMode::Pbr, Rgb::WHITE, None));
        assert!(model.has_overrides());
        assert!(matches!(
            model.children[0].meshes[0].material.model,
            LightingModel::Standard { .. }
        ));

        model.restore_materials();
        assert!(!model.has_overrides());
        assert_eq!(model, loaded);
    }
}
