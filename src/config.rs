use crate::upload::{DEFAULT_MODEL_LIMIT, DEFAULT_TEXTURE_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "SHADELAB_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory holding `textures/`.
    pub asset_root: PathBuf,
    pub texture_upload_limit: u64,
    pub model_upload_limit: u64,
    /// Radians added to the x and y rotation every frame.
    pub rotation_step: f32,
    /// Largest dimension of a normalized custom model.
    pub model_target_size: f32,
    pub window_title: String,
    pub window_size: [u32; 2],
    pub log_filter: String,
    pub loader_threads: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            texture_upload_limit: DEFAULT_TEXTURE_LIMIT,
            model_upload_limit: DEFAULT_MODEL_LIMIT,
            rotation_step: 0.002,
            model_target_size: 2.0,
            window_title: "Shadelab".to_string(),
            window_size: [1280, 720],
            log_filter: "info".to_string(),
            loader_threads: 1,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Config named by [`CONFIG_ENV`], or the defaults when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "shadelab_config_{}_{}_{}.json",
            tag,
            std::process::id(),
            nonce
        ));
        path
    }

    #[test]
    fn missing_fields_take_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, r#"{ "rotation_step": 0.01, "asset_root": "/srv/assets" }"#).unwrap();

        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.rotation_step, 0.01);
        assert_eq!(config.asset_root, PathBuf::from("/srv/assets"));
        assert_eq!(config.texture_upload_limit, 5 * 1024 * 1024);
        assert_eq!(config.model_upload_limit, 50 * 1024 * 1024);
        assert_eq!(config.model_target_size, 2.0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_then_load_via_file() {
        let path = temp_path("save");
        let config = ViewerConfig {
            window_size: [800, 600],
            loader_threads: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn bad_files_report_errors() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Json(_))));
        let _ = std::fs::remove_file(&path);
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
