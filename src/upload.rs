//! Validation of user-supplied files before anything touches the scene.

use crate::assets::{detect_format, ModelFormat};
use std::fmt;
use std::path::Path;

pub const MIB: u64 = 1024 * 1024;
pub const DEFAULT_TEXTURE_LIMIT: u64 = 5 * MIB;
pub const DEFAULT_MODEL_LIMIT: u64 = 50 * MIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Texture,
    Model,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Texture => f.write_str("texture"),
            UploadKind::Model => f.write_str("model"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} file is {} but the limit is {}", format_size(*.size), format_size(*.limit))]
    TooLarge {
        kind: UploadKind,
        size: u64,
        limit: u64,
    },
    #[error("unsupported file format '{mime}'; please upload an image file")]
    NotAnImage { mime: String },
    #[error("unsupported model format for '{name}'; expected .obj, .gltf, .glb or .stl")]
    UnsupportedExtension { name: String },
}

/// A file picked by the user, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime = guess_mime(&name).to_string();
        Ok(Self { name, mime, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn guess_mime(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tga" => "image/x-tga",
        "tif" | "tiff" => "image/tiff",
        "obj" => "model/obj",
        "gltf" => "model/gltf+json",
        "glb" => "model/gltf-binary",
        "stl" => "model/stl",
        _ => "application/octet-stream",
    }
}

pub fn validate_texture_upload(file: &UploadedFile, limit: u64) -> Result<(), ValidationError> {
    if !file.mime.starts_with("image/") {
        return Err(ValidationError::NotAnImage {
            mime: file.mime.clone(),
        });
    }
    check_size(UploadKind::Texture, file.size(), limit)
}

/// Extension is checked first so an unsupported file never gets read further.
pub fn validate_model_upload(file: &UploadedFile, limit: u64) -> Result<ModelFormat, ValidationError> {
    let format = detect_format(&file.name).ok_or_else(|| ValidationError::UnsupportedExtension {
        name: file.name.clone(),
    })?;
    check_size(UploadKind::Model, file.size(), limit)?;
    Ok(format)
}

fn check_size(kind: UploadKind, size: u64, limit: u64) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::TooLarge { kind, size, limit });
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(size: u64) -> UploadedFile {
        UploadedFile::new("photo.jpg", "image/jpeg", vec![0; size as usize])
    }

    #[test]
    fn texture_limit_is_five_megabytes() {
        assert!(validate_texture_upload(&image_of(4 * MIB), DEFAULT_TEXTURE_LIMIT).is_ok());
        assert_eq!(
            validate_texture_upload(&image_of(6 * MIB), DEFAULT_TEXTURE_LIMIT),
            Err(ValidationError::TooLarge {
                kind: UploadKind::Texture,
                size: 6 * MIB,
                limit: DEFAULT_TEXTURE_LIMIT,
            })
        );
    }

    #[test]
    fn non_images_are_rejected() {
        let file = UploadedFile::new("notes.txt", "text/plain", b"hello".to_vec());
        assert!(matches!(
            validate_texture_upload(&file, DEFAULT_TEXTURE_LIMIT),
            Err(ValidationError::NotAnImage { .. })
        ));
    }

    #[test]
    fn model_uploads_check_extension_then_size() {
        let ok = UploadedFile::new("Teapot.OBJ", "model/obj", vec![0; 1024]);
        assert_eq!(
            validate_model_upload(&ok, DEFAULT_MODEL_LIMIT),
            Ok(ModelFormat::Obj)
        );

        // a 6 MB model is fine; only textures have the small ceiling
        let mid = UploadedFile::new("scan.stl", "model/stl", vec![0; (6 * MIB) as usize]);
        assert_eq!(validate_model_upload(&mid, DEFAULT_MODEL_LIMIT), Ok(ModelFormat::Stl));

        let bad = UploadedFile::new("scene.fbx", "application/octet-stream", vec![0; 10]);
        assert_eq!(
            validate_model_upload(&bad, DEFAULT_MODEL_LIMIT),
            Err(ValidationError::UnsupportedExtension {
                name: "scene.fbx".to_string()
            })
        );

        let huge = UploadedFile::new("huge.glb", "model/gltf-binary", vec![0; 11]);
        assert!(matches!(
            validate_model_upload(&huge, 10),
            Err(ValidationError::TooLarge {
                kind: UploadKind::Model,
                ..
            })
        ));
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(guess_mime("a.PNG"), "image/png");
        assert_eq!(guess_mime("b.jpeg"), "image/jpeg");
        assert_eq!(guess_mime("model.glb"), "model/gltf-binary");
        assert_eq!(guess_mime("README"), "application/octet-stream");
    }

    #[test]
    fn from_path_reads_name_and_bytes() {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("shadelab_upload_{}_{}.png", std::process::id(), nonce));
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.bytes, vec![1, 2, 3]);
        assert!(file.name.ends_with(".png"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn size_errors_are_readable() {
        let err = validate_texture_upload(&image_of(6 * MIB), DEFAULT_TEXTURE_LIMIT).unwrap_err();
        assert_eq!(err.to_string(), "texture file is 6.0 MB but the limit is 5.0 MB");
    }
}
