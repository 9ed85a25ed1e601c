//! CPU preview of a [`Frame`]: vertices are lit and projected here, then handed
//! to egui as depth-sorted meshes.

use super::camera::OrbitCamera;
use super::shading::{shade, SurfacePoint};
use egui::{Color32, Pos2, Rect, Stroke};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4Swizzles};
use shadelab::color::Rgb;
use shadelab::geometry::Geometry;
use shadelab::lighting::{resolve_material, MaterialDescription, ShadingMode, StarField};
use shadelab::scene::Frame;
use shadelab::textures::{Texture, TextureKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const NEAR_W: f32 = 0.1;
const STAR_SEED: u64 = 0x5eed;

/// Vertex in viewport space: `pos` spans `0..1` with y pointing down.
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex {
    pub pos: Vec2,
    pub uv: [f32; 2],
    pub color: Rgb,
}

#[derive(Debug, Clone)]
pub struct ScreenTriangle {
    pub vertices: [ScreenVertex; 3],
    pub depth: f32,
    pub texture: Option<Arc<Texture>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScreenLine {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Rgb,
}

#[derive(Debug, Default)]
pub struct ScreenScene {
    /// Back to front.
    pub triangles: Vec<ScreenTriangle>,
    pub lines: Vec<ScreenLine>,
}

struct Projected {
    pos: Vec2,
    ndc: Vec3,
}

fn project(view_projection: Mat4, world: Vec3) -> Option<Projected> {
    let clip = view_projection * world.extend(1.0);
    if clip.w <= NEAR_W {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(Projected {
        pos: Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5),
        ndc,
    })
}

/// Projects and lights every mesh and helper in `frame`.
pub fn rasterize(frame: &Frame, camera: &OrbitCamera, aspect: f32) -> ScreenScene {
    let view_projection = camera.view_projection(aspect);
    let eye = camera.eye();
    let mut scene = ScreenScene::default();

    for mesh in &frame.meshes {
        add_mesh(
            &mut scene,
            &mesh.geometry,
            mesh.transform,
            &mesh.material,
            view_projection,
            eye,
            frame,
        );
    }
    for helper in &frame.helpers {
        let material = resolve_material(ShadingMode::Wireframe, helper.tint, None);
        add_mesh(
            &mut scene,
            &helper.geometry,
            helper.transform,
            &material,
            view_projection,
            eye,
            frame,
        );
    }

    scene
        .triangles
        .sort_by(|a, b| b.depth.total_cmp(&a.depth));
    scene
}

fn add_mesh(
    scene: &mut ScreenScene,
    geometry: &Geometry,
    transform: Mat4,
    material: &MaterialDescription,
    view_projection: Mat4,
    eye: Vec3,
    frame: &Frame,
) {
    let world: Vec<Vec3> = geometry
        .positions
        .iter()
        .map(|p| transform.transform_point3(Vec3::from(*p)))
        .collect();
    let projected: Vec<Option<Projected>> =
        world.iter().map(|p| project(view_projection, *p)).collect();

    if material.wireframe {
        add_edges(scene, geometry, &projected, material.color);
        return;
    }

    let linear = Mat3::from_mat4(transform);
    let normal_matrix = if linear.determinant().abs() > 1e-8 {
        linear.inverse().transpose()
    } else {
        linear
    };
    let texture = material
        .map
        .clone()
        .filter(|_| material.supports_texture());

    for tri in geometry.indices.chunks_exact(3) {
        let ids = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(a), Some(b), Some(c)) = (
            projected.get(ids[0]).and_then(Option::as_ref),
            projected.get(ids[1]).and_then(Option::as_ref),
            projected.get(ids[2]).and_then(Option::as_ref),
        ) else {
            continue;
        };
        // counter-clockwise in NDC faces the camera
        let facing = (b.ndc.truncate() - a.ndc.truncate()).perp_dot(c.ndc.truncate() - a.ndc.truncate());
        if facing <= 0.0 {
            continue;
        }

        let face_normal = (world[ids[1]] - world[ids[0]])
            .cross(world[ids[2]] - world[ids[0]])
            .normalize_or_zero();
        let points = [a, b, c];
        let vertices = std::array::from_fn(|corner| {
            let index = ids[corner];
            let normal = if material.flat_shading {
                face_normal
            } else {
                geometry
                    .normals
                    .get(index)
                    .map(|n| normal_matrix * Vec3::from(*n))
                    .unwrap_or(face_normal)
            };
            let color = shade(
                material,
                SurfacePoint {
                    position: world[index],
                    normal,
                },
                eye,
                &frame.lights,
            );
            let [u, v] = geometry.uvs.get(index).copied().unwrap_or([0.0, 0.0]);
            ScreenVertex {
                pos: points[corner].pos,
                uv: [u, 1.0 - v],
                color,
            }
        });
        scene.triangles.push(ScreenTriangle {
            vertices,
            depth: (a.ndc.z + b.ndc.z + c.ndc.z) / 3.0,
            texture: texture.clone(),
        });
    }
}

fn add_edges(scene: &mut ScreenScene, geometry: &Geometry, projected: &[Option<Projected>], color: Rgb) {
    let mut seen = HashSet::new();
    for tri in geometry.indices.chunks_exact(3) {
        for (from, to) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if !seen.insert((from.min(to), from.max(to))) {
                continue;
            }
            let (Some(a), Some(b)) = (
                projected.get(from as usize).and_then(Option::as_ref),
                projected.get(to as usize).and_then(Option::as_ref),
            ) else {
                continue;
            };
            scene.lines.push(ScreenLine {
                from: a.pos,
                to: b.pos,
                color,
            });
        }
    }
}

pub fn color32(color: Rgb) -> Color32 {
    let [r, g, b] = color.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgb(r, g, b)
}

/// Paints frames into an egui rect and keeps their textures registered.
pub struct ViewportPainter {
    textures: HashMap<TextureKey, egui::TextureHandle>,
    star_field: StarField,
    stars: Option<Vec<Vec3>>,
}

impl ViewportPainter {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            star_field: StarField::default(),
            stars: None,
        }
    }

    fn texture_id(&mut self, ctx: &egui::Context, texture: &Texture) -> egui::TextureId {
        self.textures
            .entry(texture.key().clone())
            .or_insert_with(|| {
                log::debug!("registering texture {} with the UI", texture.key());
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [texture.width() as usize, texture.height() as usize],
                    texture.pixels(),
                );
                ctx.load_texture(
                    texture.key().as_str(),
                    image,
                    egui::TextureOptions::LINEAR_REPEAT,
                )
            })
            .id()
    }

    pub fn paint(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        rect: Rect,
        frame: &Frame,
        camera: &OrbitCamera,
    ) {
        painter.rect_filled(rect, 0.0, color32(frame.background.color));
        let aspect = rect.width() / rect.height().max(1.0);
        let to_screen = |p: Vec2| Pos2::new(rect.left() + p.x * rect.width(), rect.top() + p.y * rect.height());

        if frame.background.stars_enabled {
            let view_projection = camera.view_projection(aspect);
            let field = self.star_field;
            let radius = 0.25 * field.factor;
            let stars = self
                .stars
                .get_or_insert_with(|| field.positions(STAR_SEED));
            for star in stars.iter() {
                if let Some(projected) = project(view_projection, *star) {
                    if (0.0..=1.0).contains(&projected.pos.x) && (0.0..=1.0).contains(&projected.pos.y) {
                        painter.circle_filled(to_screen(projected.pos), radius, Color32::WHITE);
                    }
                }
            }
        }

        let scene = rasterize(frame, camera, aspect);

        // consecutive triangles sharing a texture become one egui mesh
        let mut mesh = egui::Mesh::default();
        for triangle in &scene.triangles {
            let texture_id = match &triangle.texture {
                Some(texture) => self.texture_id(ctx, texture),
                None => egui::TextureId::default(),
            };
            if mesh.texture_id != texture_id && !mesh.is_empty() {
                painter.add(egui::Shape::mesh(std::mem::take(&mut mesh)));
            }
            mesh.texture_id = texture_id;
            let base = mesh.vertices.len() as u32;
            for vertex in &triangle.vertices {
                let uv = if triangle.texture.is_some() {
                    Pos2::new(vertex.uv[0], vertex.uv[1])
                } else {
                    egui::epaint::WHITE_UV
                };
                mesh.vertices.push(egui::epaint::Vertex {
                    pos: to_screen(vertex.pos),
                    uv,
                    color: color32(vertex.color),
                });
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
        if !mesh.is_empty() {
            painter.add(egui::Shape::mesh(mesh));
        }

        for line in &scene.lines {
            painter.line_segment(
                [to_screen(line.from), to_screen(line.to)],
                Stroke::new(1.0, color32(line.color)),
            );
        }
    }
}
