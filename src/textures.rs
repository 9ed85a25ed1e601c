//! # Texture Resolver
//!
//! Turns a [`TextureSelection`] into a decoded [`Texture`]. Decoding runs on the
//! job queue; the resolver answers `Loading` until [`TextureResolver::poll`]
//! picks up the result. Loaded textures are cached by resolved URL for the life
//! of the resolver and never evicted.

use crate::blobs::{BlobHandle, BlobStore};
use crate::jobs::{Dispatch, JobQueue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved URL of a texture: the asset-relative path of a built-in, or a blob URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureKey(String);

impl TextureKey {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq)]
pub struct Texture {
    key: TextureKey,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
    repeat: [f32; 2],
}

impl Texture {
    pub fn from_rgba(key: TextureKey, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            key,
            width,
            height,
            pixels,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            repeat: [1.0, 1.0],
        }
    }

    pub fn decode(key: TextureKey, bytes: &[u8]) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| TextureError::Decode {
                key: key.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self::from_rgba(key, width, height, image.into_raw()))
    }

    pub fn key(&self) -> &TextureKey {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn wrap(&self) -> (WrapMode, WrapMode) {
        (self.wrap_s, self.wrap_t)
    }

    pub fn repeat(&self) -> [f32; 2] {
        self.repeat
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("wrap", &(self.wrap_s, self.wrap_t))
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct BuiltinTexture {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Relative to the asset root; `None` for the "no texture" entry.
    pub path: Option<&'static str>,
}

static BUILTIN_TEXTURES: [BuiltinTexture; 5] = [
    BuiltinTexture {
        id: "none",
        display_name: "No Texture",
        path: None,
    },
    BuiltinTexture {
        id: "checkerboard",
        display_name: "Checkerboard Pattern",
        path: Some("textures/checkerboard.png"),
    },
    BuiltinTexture {
        id: "brick",
        display_name: "Brick Wall",
        path: Some("textures/brick.jpg"),
    },
    BuiltinTexture {
        id: "wood",
        display_name: "Wood Grain",
        path: Some("textures/wood.jpg"),
    },
    BuiltinTexture {
        id: "metal",
        display_name: "Metal Surface",
        path: Some("textures/metal.jpg"),
    },
];

pub fn builtin_textures() -> &'static [BuiltinTexture] {
    &BUILTIN_TEXTURES
}

pub fn find_builtin(id: &str) -> Option<&'static BuiltinTexture> {
    BUILTIN_TEXTURES.iter().find(|texture| texture.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextureSelection {
    #[default]
    None,
    Builtin(String),
    Custom(BlobHandle),
}

impl TextureSelection {
    pub fn builtin(id: impl Into<String>) -> Self {
        TextureSelection::Builtin(id.into())
    }

    pub fn is_none(&self) -> bool {
        match self {
            TextureSelection::None => true,
            TextureSelection::Builtin(id) => find_builtin(id).is_some_and(|t| t.path.is_none()),
            TextureSelection::Custom(_) => false,
        }
    }

    pub fn custom_blob(&self) -> Option<BlobHandle> {
        match self {
            TextureSelection::Custom(handle) => Some(*handle),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("unknown texture '{0}'")]
    UnknownTexture(String),
    #[error("uploaded texture {0} is no longer available")]
    MissingBlob(BlobHandle),
    #[error("failed to read texture at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {key}: {source}")]
    Decode {
        key: TextureKey,
        #[source]
        source: image::ImageError,
    },
    #[error("decoder crashed on texture {0}")]
    DecoderCrashed(TextureKey),
}

#[derive(Debug, Clone)]
pub enum Resolution {
    /// The selection asks for no texture.
    Empty,
    Ready(Arc<Texture>),
    /// A decode is in flight; watch [`TextureResolver::poll`] for this key.
    Loading(TextureKey),
}

#[derive(Debug)]
pub enum TextureEvent {
    Loaded(Arc<Texture>),
    Failed(TextureKey, TextureError),
}

enum Source {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

type Completion = (TextureKey, Result<Texture, TextureError>);

pub struct TextureResolver {
    asset_root: PathBuf,
    cache: HashMap<TextureKey, Arc<Texture>>,
    in_flight: HashSet<TextureKey>,
    jobs: JobQueue<Completion>,
}

impl TextureResolver {
    pub fn new(asset_root: impl Into<PathBuf>, dispatch: Arc<dyn Dispatch>) -> Self {
        Self {
            asset_root: asset_root.into(),
            cache: HashMap::new(),
            in_flight: HashSet::new(),
            jobs: JobQueue::new(dispatch),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// The cache key a selection resolves to, without loading anything.
    pub fn key_for(&self, selection: &TextureSelection) -> Result<Option<TextureKey>, TextureError> {
        match selection {
            TextureSelection::None => Ok(None),
            TextureSelection::Builtin(id) => {
                let builtin =
                    find_builtin(id).ok_or_else(|| TextureError::UnknownTexture(id.clone()))?;
                Ok(builtin.path.map(TextureKey::new))
            }
            TextureSelection::Custom(handle) => Ok(Some(TextureKey::new(handle.url()))),
        }
    }

    pub fn resolve(
        &mut self,
        selection: &TextureSelection,
        blobs: &BlobStore,
    ) -> Result<Resolution, TextureError> {
        let Some(key) = self.key_for(selection)? else {
            return Ok(Resolution::Empty);
        };
        if let Some(texture) = self.cache.get(&key) {
            log::debug!("texture cache hit: {}", key);
            return Ok(Resolution::Ready(texture.clone()));
        }
        if self.in_flight.contains(&key) {
            return Ok(Resolution::Loading(key));
        }

        let source = match selection {
            TextureSelection::Custom(handle) => {
                Source::Memory(blobs.bytes(*handle).ok_or(TextureError::MissingBlob(*handle))?)
            }
            _ => Source::File(self.asset_root.join(key.as_str())),
        };

        log::info!("loading texture {}", key);
        self.in_flight.insert(key.clone());
        let job_key = key.clone();
        let crash_key = key.clone();
        self.jobs.spawn(
            move || {
                let result = load_source(&job_key, source);
                (job_key, result)
            },
            move || (crash_key.clone(), Err(TextureError::DecoderCrashed(crash_key))),
        );
        Ok(Resolution::Loading(key))
    }

    /// Drains finished decodes into the cache.
    pub fn poll(&mut self) -> Vec<TextureEvent> {
        self.jobs
            .drain()
            .into_iter()
            .map(|(key, result)| {
                self.in_flight.remove(&key);
                match result {
                    Ok(texture) => {
                        let texture = self
                            .cache
                            .entry(key)
                            .or_insert_with(|| Arc::new(texture))
                            .clone();
                        log::debug!(
                            "texture {} ready ({}x{})",
                            texture.key(),
                            texture.width(),
                            texture.height()
                        );
                        TextureEvent::Loaded(texture)
                    }
                    Err(err) => {
                        log::warn!("texture {} failed: {}", key, err);
                        TextureEvent::Failed(key, err)
                    }
                }
            })
            .collect()
    }

    pub fn cached(&self, key: &TextureKey) -> Option<Arc<Texture>> {
        self.cache.get(key).cloned()
    }

    pub fn is_loading(&self, key: &TextureKey) -> bool {
        self.in_flight.contains(key)
    }
}

fn load_source(key: &TextureKey, source: Source) -> Result<Texture, TextureError> {
    match source {
        Source::File(path) => {
            let bytes = std::fs::read(&path).map_err(|source| TextureError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Texture::decode(key.clone(), &bytes)
        }
        Source::Memory(bytes) => Texture::decode(key.clone(), &bytes),
    }
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
