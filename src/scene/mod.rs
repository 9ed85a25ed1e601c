//! # Scene Assembler
//!
//! Owns the session state and everything derived from it: the bound material,
//! the loaded custom model, memoized shape geometry and the rotation. Texture and
//! model loads complete through [`SceneAssembler::poll`]; results that no longer
//! match the session are dropped there.

pub mod state;

pub use state::{LightEdit, LightSlot, SceneUpdate, SessionState};

use crate::assets::{load_model, normalize, LoadError, MeshPart, ModelNode};
use crate::blobs::{BlobHandle, BlobStore};
use crate::config::ViewerConfig;
use crate::geometry::Geometry;
use crate::jobs::{Dispatch, JobQueue};
use crate::lighting::{
    light_helper, resolve_light, BackgroundSpec, LightDescription, LightHelper,
    MaterialDescription,
};
use crate::session::{SessionStore, UploadedModel};
use crate::shapes::{get_shape, ShapeError, ShapeId, ShapeSelection};
use crate::textures::{
    Resolution, TextureError, TextureEvent, TextureResolver, TextureSelection,
};
use crate::upload::{validate_model_upload, validate_texture_upload, UploadedFile, ValidationError};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("no custom model has been loaded")]
    NoCustomModel,
    #[error("upload {0} is no longer available")]
    MissingUpload(BlobHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One mesh ready to draw.
#[derive(Debug, Clone)]
pub struct FrameMesh {
    pub geometry: Arc<Geometry>,
    pub transform: Mat4,
    pub material: MaterialDescription,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub background: &'static BackgroundSpec,
    pub meshes: Vec<FrameMesh>,
    pub lights: Vec<LightDescription>,
    pub helpers: Vec<LightHelper>,
}

struct ModelCompletion {
    generation: u64,
    upload: UploadedModel,
    result: Result<ModelNode, LoadError>,
}

struct CustomModel {
    name: String,
    root: ModelNode,
}

pub struct SceneAssembler {
    config: ViewerConfig,
    state: SessionState,
    blobs: BlobStore,
    textures: TextureResolver,
    model_jobs: JobQueue<ModelCompletion>,
    material: MaterialDescription,
    /// Texture to fall back to if the pending one fails to load.
    texture_fallback: Option<TextureSelection>,
    model_generation: u64,
    loading_model: Option<String>,
    custom_model: Option<CustomModel>,
    geometry_cache: HashMap<ShapeId, Arc<Geometry>>,
    rotation: Vec3,
    notices: Vec<Notice>,
}

impl SceneAssembler {
    pub fn new(config: ViewerConfig, dispatch: Arc<dyn Dispatch>) -> Self {
        let state = SessionState::default();
        let material = state.material(None);
        Self {
            textures: TextureResolver::new(config.asset_root.clone(), Arc::clone(&dispatch)),
            model_jobs: JobQueue::new(dispatch),
            config,
            state,
            blobs: BlobStore::new(),
            material,
            texture_fallback: None,
            model_generation: 0,
            loading_model: None,
            custom_model: None,
            geometry_cache: HashMap::new(),
            rotation: Vec3::ZERO,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn material(&self) -> &MaterialDescription {
        &self.material
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn custom_model(&self) -> Option<&ModelNode> {
        self.custom_model.as_ref().map(|model| &model.root)
    }

    pub fn custom_model_name(&self) -> Option<&str> {
        self.custom_model.as_ref().map(|model| model.name.as_str())
    }

    /// Name of the model currently being parsed, if any.
    pub fn loading_model(&self) -> Option<&str> {
        self.loading_model.as_deref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Warning | NoticeLevel::Error => log::warn!("{}", message),
        }
        self.notices.push(Notice { level, message });
    }

    fn fail<E: Into<SceneError>>(&mut self, err: E) -> SceneError {
        let err = err.into();
        self.notify(NoticeLevel::Error, err.to_string());
        err
    }

    /// Applies a parameter change. A rejected change leaves every part of the
    /// scene as it was and queues a notice.
    pub fn update(&mut self, update: SceneUpdate) -> Result<(), SceneError> {
        // picking a catalog shape supersedes any model still parsing
        if matches!(update, SceneUpdate::SelectShape(ShapeSelection::Builtin(_))) {
            self.abandon_model_load();
        }
        let next = self.state.apply(update);
        if next == self.state {
            return Ok(());
        }

        if next.selection == ShapeSelection::CustomModel && self.custom_model.is_none() {
            return Err(self.fail(SceneError::NoCustomModel));
        }
        if next.texture != self.state.texture {
            if let Err(err) = self.textures.key_for(&next.texture) {
                return Err(self.fail(err));
            }
        }

        let previous = std::mem::replace(&mut self.state, next);

        if previous.selection != self.state.selection {
            log::info!("showing {}", self.state.selection.display_name());
            if previous.selection == ShapeSelection::CustomModel {
                self.release_custom_model();
            }
        }
        if previous.texture != self.state.texture {
            if let Some(blob) = previous.texture.custom_blob() {
                self.blobs.revoke(blob);
            }
            // only a texture that made it onto the material is worth going back to
            if self.material.pending_texture.is_none() {
                self.texture_fallback = Some(previous.texture.clone());
            }
        }
        if previous.material_inputs_differ(&self.state) {
            self.rebuild_material();
        } else if previous.keep_model_materials != self.state.keep_model_materials {
            self.dress_custom_model();
        }
        Ok(())
    }

    fn rebuild_material(&mut self) {
        let key = match self.textures.resolve(&self.state.texture, &self.blobs) {
            Ok(resolution) => resolution,
            Err(err) => {
                // the blob vanished after validation; show the material untextured
                self.notify(NoticeLevel::Warning, err.to_string());
                Resolution::Empty
            }
        };
        match key {
            Resolution::Empty => {
                self.material = self.state.material(None);
                self.texture_fallback = None;
            }
            Resolution::Loading(key) => {
                self.material = self.state.material(Some(&key));
            }
            Resolution::Ready(texture) => {
                self.material = self.state.material(Some(texture.key()));
                self.material.bind_texture(texture);
                self.texture_fallback = None;
            }
        }
        self.dress_custom_model();
    }

    /// Puts the session material on the custom model, or its own materials back.
    fn dress_custom_model(&mut self) {
        let Some(model) = self.custom_model.as_mut() else {
            return;
        };
        if self.state.keep_model_materials {
            model.root.restore_materials();
        } else {
            model.root.override_materials(&self.material);
        }
    }

    /// Drops the custom model after restoring its loaded materials.
    pub fn release_custom_model(&mut self) -> Option<ModelNode> {
        let mut model = self.custom_model.take()?;
        model.root.restore_materials();
        log::info!("released custom model '{}'", model.name);
        Some(model.root)
    }

    pub fn upload_texture(&mut self, file: UploadedFile) -> Result<(), SceneError> {
        if let Err(err) = validate_texture_upload(&file, self.config.texture_upload_limit) {
            return Err(self.fail(err));
        }
        log::info!("texture upload '{}' ({} bytes)", file.name, file.size());
        let handle = self.blobs.create(file.mime, file.bytes);
        let result = self.update(SceneUpdate::SetTexture(TextureSelection::Custom(handle)));
        if result.is_err() {
            self.blobs.revoke(handle);
        }
        result
    }

    /// Validates a model file and parks it in the session store for the viewer.
    pub fn stage_model_upload(
        &mut self,
        file: UploadedFile,
        session: &mut SessionStore,
    ) -> Result<UploadedModel, SceneError> {
        let format = match validate_model_upload(&file, self.config.model_upload_limit) {
            Ok(format) => format,
            Err(err) => return Err(self.fail(err)),
        };
        let blob = self.blobs.create(file.mime, file.bytes);
        let model = UploadedModel {
            name: file.name,
            format,
            blob,
        };
        if let Some(previous) = session.put_uploaded_model(model.clone()) {
            self.blobs.revoke(previous.blob);
        }
        log::info!("staged {} model '{}'", format, model.name);
        Ok(model)
    }

    /// Starts parsing an uploaded model. The scene keeps showing what it shows
    /// now until the parse succeeds.
    pub fn open_custom_model(&mut self, upload: UploadedModel) -> Result<(), SceneError> {
        let Some(bytes) = self.blobs.bytes(upload.blob) else {
            return Err(self.fail(SceneError::MissingUpload(upload.blob)));
        };
        self.model_generation += 1;
        let generation = self.model_generation;
        self.loading_model = Some(upload.name.clone());
        log::info!("loading model '{}'", upload.name);
        let crashed = upload.clone();
        self.model_jobs.spawn(
            move || {
                let result = load_model(&upload.name, &bytes);
                ModelCompletion {
                    generation,
                    upload,
                    result,
                }
            },
            move || ModelCompletion {
                generation,
                result: Err(LoadError::ParserCrashed {
                    name: crashed.name.clone(),
                }),
                upload: crashed,
            },
        );
        Ok(())
    }

    fn abandon_model_load(&mut self) {
        if let Some(name) = self.loading_model.take() {
            self.model_generation += 1;
            log::info!("abandoning load of '{}'", name);
        }
    }

    /// Releases blobs of session entries that will never be opened.
    pub fn discard_uploads(&mut self, uploads: impl IntoIterator<Item = BlobHandle>) {
        for blob in uploads {
            self.blobs.revoke(blob);
        }
    }

    /// Applies finished loads. Returns whether anything visible changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for event in self.textures.poll() {
            changed |= self.on_texture_event(event);
        }
        for completion in self.model_jobs.drain() {
            changed |= self.on_model_completion(completion);
        }
        changed
    }

    fn on_texture_event(&mut self, event: TextureEvent) -> bool {
        match event {
            TextureEvent::Loaded(texture) => {
                if !self.material.bind_texture(texture) {
                    log::debug!("ignoring superseded texture load");
                    return false;
                }
                self.texture_fallback = None;
                self.dress_custom_model();
                true
            }
            TextureEvent::Failed(key, err) => {
                if self.material.pending_texture.as_ref() != Some(&key) {
                    log::debug!("ignoring superseded texture failure for {}", key);
                    return false;
                }
                self.notify(NoticeLevel::Error, err.to_string());
                let fallback = self.texture_fallback.take().unwrap_or_default();
                if let Some(blob) = self.state.texture.custom_blob() {
                    self.blobs.revoke(blob);
                }
                self.state = self.state.apply(SceneUpdate::SetTexture(fallback));
                self.rebuild_material();
                true
            }
        }
    }

    fn on_model_completion(&mut self, completion: ModelCompletion) -> bool {
        let ModelCompletion {
            generation,
            upload,
            result,
        } = completion;
        // the parser is done with the bytes either way
        self.blobs.revoke(upload.blob);

        if generation != self.model_generation {
            log::debug!("discarding stale load of '{}'", upload.name);
            return false;
        }
        self.loading_model = None;

        let mut root = match result {
            Ok(root) => root,
            Err(err) => {
                let err = SceneError::from(err);
                self.notify(NoticeLevel::Error, err.to_string());
                return false;
            }
        };
        let normalization = normalize(&root, self.config.model_target_size);
        root.apply_normalization(normalization);
        log::debug!(
            "normalized '{}' by {:.4} around {:?}",
            upload.name,
            normalization.scale,
            normalization.translation
        );

        self.release_custom_model();
        self.custom_model = Some(CustomModel {
            name: upload.name.clone(),
            root,
        });
        self.dress_custom_model();
        self.state = self
            .state
            .apply(SceneUpdate::SelectShape(ShapeSelection::CustomModel));
        self.notify(NoticeLevel::Info, format!("Loaded {}", upload.name));
        true
    }

    /// Advances the continuous rotation by one frame unless paused.
    pub fn tick(&mut self) {
        if self.state.rotation_paused {
            return;
        }
        let step = self.config.rotation_step;
        self.rotation.x += step;
        self.rotation.y += step;
    }

    fn shape_geometry(&mut self, id: ShapeId) -> Arc<Geometry> {
        self.geometry_cache
            .entry(id)
            .or_insert_with(|| Arc::new(get_shape(id).geometry()))
            .clone()
    }

    pub fn frame(&mut self) -> Frame {
        let spin = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        let mut meshes = Vec::new();
        match self.state.selection {
            ShapeSelection::Builtin(id) => {
                let shape = get_shape(id);
                let base = Quat::from_euler(
                    EulerRot::XYZ,
                    shape.default_rotation.x,
                    shape.default_rotation.y,
                    shape.default_rotation.z,
                );
                let transform = Mat4::from_scale_rotation_translation(
                    shape.default_scale,
                    spin * base,
                    shape.default_position,
                );
                meshes.push(FrameMesh {
                    geometry: self.shape_geometry(id),
                    transform,
                    material: self.material.clone(),
                });
            }
            ShapeSelection::CustomModel => {
                if let Some(model) = &self.custom_model {
                    model
                        .root
                        .visit_meshes(Mat4::from_quat(spin), &mut |mesh: &MeshPart, world| {
                            meshes.push(FrameMesh {
                                geometry: Arc::clone(&mesh.geometry),
                                transform: world,
                                material: mesh.material.clone(),
                            });
                        });
                }
            }
        }

        Frame {
            background: self.state.background.spec(),
            meshes,
            lights: self.state.lights().filter_map(resolve_light).collect(),
            helpers: self.state.lights().filter_map(light_helper).collect(),
        }
    }
}
