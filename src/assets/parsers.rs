//! Per-format parsers. Each returns a raw tree; emptiness is checked by the caller.

use super::{MeshPart, ModelNode, ParseError};
use crate::color::Rgb;
use crate::geometry::Geometry;
use crate::lighting::material::DEFAULT_SHININESS;
use crate::lighting::{LightingModel, MaterialDescription};
use glam::{Mat4, Vec3};
use std::io::{BufReader, Cursor};

/// Material for OBJ meshes; their MTL library never travels with a single upload.
fn default_obj_material() -> MaterialDescription {
    MaterialDescription::new(
        LightingModel::Phong {
            shininess: DEFAULT_SHININESS,
            specular: Rgb::from_hex(0x111111),
        },
        Rgb::WHITE,
    )
}

pub(super) fn parse_obj(name: &str, bytes: &[u8]) -> Result<ModelNode, ParseError> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl_path| {
            log::debug!("ignoring material library {}", mtl_path.display());
            Err(tobj::LoadError::OpenFileFailed)
        },
    )?;

    let mut root = ModelNode::new(name);
    for (index, model) in models.iter().enumerate() {
        let mesh = &model.mesh;
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            continue;
        }
        let mut geometry = Geometry {
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            normals: Vec::new(),
            uvs: mesh
                .texcoords
                .chunks_exact(2)
                .map(|t| [t[0], t[1]])
                .collect(),
            indices: mesh.indices.clone(),
        };
        // Use normals from OBJ if available, otherwise calculate them
        if mesh.normals.len() == mesh.positions.len() {
            geometry.normals = mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
        } else {
            geometry.compute_vertex_normals();
        }
        geometry.fill_missing_uvs();

        let mesh_name = if model.name.is_empty() {
            format!("mesh_{}", index)
        } else {
            model.name.clone()
        };
        let mut node = ModelNode::new(mesh_name.clone());
        node.meshes
            .push(MeshPart::new(mesh_name, geometry, default_obj_material()));
        root.children.push(node);
    }
    Ok(root)
}

/// Handles both `.gltf` (embedded buffers only) and `.glb`.
pub(super) fn parse_gltf(name: &str, bytes: &[u8]) -> Result<ModelNode, ParseError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let mut root = ModelNode::new(name);

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                root.children.push(convert_gltf_node(&node, &buffers));
            }
        }
        None => {
            // scene-less files: take every root-level node
            for node in document.nodes() {
                root.children.push(convert_gltf_node(&node, &buffers));
            }
        }
    }
    Ok(root)
}

fn convert_gltf_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> ModelNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mut converted = ModelNode::new(name);
    converted.transform = Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for (index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in mesh {}", mesh.index());
                continue;
            }
            let Some(geometry) = read_primitive(&primitive, buffers) else {
                continue;
            };
            let pbr = primitive.material().pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let material = MaterialDescription::new(
                LightingModel::Standard {
                    metalness: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                },
                Rgb([r, g, b]),
            );
            let part_name = match mesh.name() {
                Some(mesh_name) => format!("{}_{}", mesh_name, index),
                None => format!("mesh_{}_{}", mesh.index(), index),
            };
            converted
                .meshes
                .push(MeshPart::new(part_name, geometry, material));
        }
    }

    for child in node.children() {
        converted.children.push(convert_gltf_node(&child, buffers));
    }
    converted
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<Geometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let mut geometry = Geometry {
        positions,
        normals: Vec::new(),
        uvs: reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().collect())
            .unwrap_or_default(),
        indices,
    };
    match reader.read_normals() {
        Some(normals) => geometry.normals = normals.collect(),
        None => geometry.compute_vertex_normals(),
    }
    if geometry.normals.len() != geometry.positions.len() {
        geometry.compute_vertex_normals();
    }
    geometry.fill_missing_uvs();
    Some(geometry)
}

/// STL carries triangles only, so the mesh gets the neutral material.
pub(super) fn parse_stl(name: &str, bytes: &[u8]) -> Result<ModelNode, ParseError> {
    let mesh = stl_io::read_stl(&mut Cursor::new(bytes))?;

    let mut geometry = Geometry::new();
    for face in &mesh.faces {
        let corners = face.vertices.map(|index| {
            mesh.vertices
                .get(index)
                .map(|v| Vec3::new(v[0], v[1], v[2]))
                .unwrap_or(Vec3::ZERO)
        });
        let computed = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        let stored = Vec3::new(face.normal[0], face.normal[1], face.normal[2]);
        // faceted like the source data; fall back to winding when the stored normal is blank
        let normal = stored
            .try_normalize()
            .or_else(|| computed.try_normalize())
            .unwrap_or(Vec3::Z);
        let a = geometry.push_vertex(corners[0], normal, [0.0, 0.0]);
        let b = geometry.push_vertex(corners[1], normal, [1.0, 0.0]);
        let c = geometry.push_vertex(corners[2], normal, [0.0, 1.0]);
        geometry.push_triangle(a, b, c);
    }

    let mut root = ModelNode::new(name);
    root.meshes
        .push(MeshPart::new(name, geometry, MaterialDescription::neutral()));
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::super::{load_model, LoadError, ModelFormat};
    use super::*;

    const TRIANGLE_STL: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 0
    outer loop
      vertex 0 0 1
      vertex 0 1 1
      vertex 1 0 1
    endloop
  endfacet
endsolid tri
";

    fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
        while bytes.len() % 4 != 0 {
            bytes.push(fill);
        }
    }

    /// Single red triangle, translated one unit along X by its node.
    fn triangle_glb() -> Vec<u8> {
        let mut bin = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        let buffer_length = bin.len();
        pad_to_four(&mut bin, 0);

        let json = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "tri", "mesh": 0, "translation": [1.0, 0.0, 0.0] }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }],
            "materials": [{ "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.5,
                "roughnessFactor": 0.25
            } }],
            "buffers": [{ "byteLength": buffer_length }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        });
        let mut json = serde_json::to_vec(&json).unwrap();
        pad_to_four(&mut json, b' ');

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn stl_gets_the_neutral_material() {
        let model = load_model("part.stl", TRIANGLE_STL.as_bytes()).unwrap();
        assert_eq!(model.mesh_count(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.material, MaterialDescription::neutral());
        assert_eq!(mesh.material.color, Rgb::from_hex(0xAAAAAA));
        assert_eq!(mesh.geometry.triangle_count(), 2);
        assert_eq!(mesh.geometry.normals[0], [0.0, 0.0, 1.0]);
        // blank stored normal falls back to the winding
        assert_eq!(mesh.geometry.normals[3], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn truncated_stl_is_rejected() {
        let err = load_model("part.stl", b"\x00\x01\x02").unwrap_err();
        assert!(matches!(err, LoadError::Parse { format: ModelFormat::Stl, .. }));
    }

    #[test]
    fn glb_keeps_node_transforms_and_pbr_factors() {
        let model = load_model("tri.glb", &triangle_glb()).unwrap();
        assert_eq!(model.mesh_count(), 1);
        let node = &model.children[0];
        assert_eq!(node.name, "tri");
        assert_eq!(node.transform.w_axis.truncate(), Vec3::X);

        let mesh = &node.meshes[0];
        assert_eq!(mesh.geometry.vertex_count(), 3);
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        assert_eq!(mesh.material.color, Rgb([1.0, 0.0, 0.0]));
        assert_eq!(
            mesh.material.model,
            LightingModel::Standard {
                metalness: 0.5,
                roughness: 0.25
            }
        );

        let bounds = model.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn corrupt_glb_is_rejected() {
        let mut glb = triangle_glb();
        glb.truncate(30);
        let err = load_model("tri.glb", &glb).unwrap_err();
        assert!(matches!(err, LoadError::Parse { format: ModelFormat::Glb, .. }));
    }
}
