//! Application configuration
//!
//! Loaded from a JSON file in the platform config directory. Any load
//! failure falls back to defaults; the visualization must come up even with
//! no config present.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when persisting configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Generate-content endpoint the gesture frames are posted to
    pub endpoint: String,
    /// API key; falls back to ARBORGLOW_API_KEY / GEMINI_API_KEY env vars
    pub api_key: Option<String>,
    /// Seconds between frame submissions
    pub poll_interval_secs: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// JPEG payload width
    pub frame_width: u32,
    /// JPEG payload height
    pub frame_height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
                .to_string(),
            api_key: None,
            poll_interval_secs: 1.5,
            timeout_secs: 10,
            frame_width: 320,
            frame_height: 240,
            jpeg_quality: 60,
        }
    }
}

impl ClassifierConfig {
    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("ARBORGLOW_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty())
    }
}

/// Tree geometry and particle counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub foliage_count: usize,
    pub ornament_count: usize,
    pub card_count: usize,
    pub tree_height: f32,
    pub base_radius: f32,
    pub chaos_radius: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            foliage_count: 8000,
            ornament_count: 300,
            card_count: 8,
            tree_height: 12.0,
            base_radius: 4.5,
            chaos_radius: 25.0,
        }
    }
}

impl TreeConfig {
    /// Clamp to sane minimums so a hand-edited config cannot produce an
    /// empty or degenerate tree
    pub fn sanitized(mut self) -> Self {
        self.foliage_count = self.foliage_count.max(1);
        self.ornament_count = self.ornament_count.max(1);
        self.card_count = self.card_count.clamp(1, 64);
        self.tree_height = self.tree_height.max(1.0);
        self.base_radius = self.base_radius.max(0.5);
        self.chaos_radius = self.chaos_radius.max(self.base_radius);
        self
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub tree: TreeConfig,
    /// Directory of images shown on the floating photo cards
    pub photos_dir: Option<PathBuf>,
    /// Connect camera 0 at startup
    pub auto_connect_camera: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            tree: TreeConfig::default(),
            photos_dir: None,
            auto_connect_camera: true,
        }
    }
}

impl AppConfig {
    /// Config file location
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("arborglow");
            p.push("config.json");
            p
        })
    }

    /// Load from the config directory, defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(mut cfg) => {
                    cfg.tree = cfg.tree.sanitized();
                    cfg
                }
                Err(e) => {
                    log::warn!("Ignoring malformed config {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save to the config directory
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(self.classifier.poll_interval_secs.max(0.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.tree.foliage_count, 8000);
        assert_eq!(cfg.tree.ornament_count, 300);
        assert_eq!(cfg.tree.card_count, 8);
        assert_eq!(cfg.classifier.poll_interval_secs, 1.5);
        assert_eq!(cfg.classifier.frame_width, 320);
        assert_eq!(cfg.classifier.frame_height, 240);
    }

    #[test]
    fn test_tree_config_sanitized() {
        let cfg = TreeConfig {
            foliage_count: 0,
            ornament_count: 0,
            card_count: 1000,
            tree_height: -2.0,
            base_radius: 0.0,
            chaos_radius: 0.0,
        }
        .sanitized();
        assert!(cfg.foliage_count >= 1);
        assert!(cfg.ornament_count >= 1);
        assert_eq!(cfg.card_count, 64);
        assert!(cfg.tree_height >= 1.0);
        assert!(cfg.chaos_radius >= cfg.base_radius);
    }

    #[test]
    fn test_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.classifier.poll_interval_secs = 2.0;
        cfg.photos_dir = Some(PathBuf::from("/tmp/photos"));
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.classifier.poll_interval_secs, 2.0);
        assert_eq!(back.photos_dir, Some(PathBuf::from("/tmp/photos")));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"tree":{"foliage_count":100}}"#).unwrap();
        assert_eq!(cfg.tree.foliage_count, 100);
        assert_eq!(cfg.tree.ornament_count, 300);
        assert_eq!(cfg.classifier.jpeg_quality, 60);
    }

    #[test]
    fn test_poll_interval_floor() {
        let mut cfg = AppConfig::default();
        cfg.classifier.poll_interval_secs = 0.0;
        assert!(cfg.poll_interval() >= std::time::Duration::from_millis(100));
    }
}
