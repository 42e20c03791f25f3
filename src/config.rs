//! Application configuration.
//!
//! Loaded from config.json at startup and passed explicitly to the session
//! runner. Every field has a default, so a partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::params::OcrParams;
use crate::session::input::Hotkey;

/// Image format used for the OCR upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFormat {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl UploadFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            UploadFormat::Jpeg => "image/jpeg",
            UploadFormat::Png => "image/png",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            UploadFormat::Jpeg => "sel.jpg",
            UploadFormat::Png => "sel.png",
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR service base URL, without trailing path.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Path of the recognition endpoint under `api_base`.
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// MIME type of the uploaded crop. The screenshot itself is always JPEG.
    #[serde(default)]
    pub upload_format: UploadFormat,
    /// Quality (0.0-1.0) for both the screenshot and a JPEG upload.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f64,
    /// Key combination that starts a selection.
    #[serde(default)]
    pub hotkey: Hotkey,
    /// Timeout for OCR and health check requests (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Parameters forwarded to the OCR backend.
    #[serde(default)]
    pub ocr: OcrParams,
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_path() -> String {
    "/v1/ocr".to_string()
}

fn default_jpeg_quality() -> f64 {
    0.92
}

fn default_request_timeout_ms() -> u64 {
    20000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_path: default_api_path(),
            upload_format: UploadFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            hotkey: Hotkey::default(),
            request_timeout_ms: default_request_timeout_ms(),
            ocr: OcrParams::default(),
        }
    }
}

impl AppConfig {
    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Full URL of the recognition endpoint (without query string).
    pub fn ocr_url(&self) -> String {
        format!("{}/{}", self.base(), self.api_path.trim_start_matches('/'))
    }

    /// Full URL of the health check endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/healthz", self.base())
    }

    /// Upload quality as a JPEG level (1-100).
    pub fn upload_quality(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Reads and parses a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Places config.json is looked for, in order: next to the executable, then
/// the per-user config directory.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut paths = vec![crate::paths::get_exe_dir().join("config.json")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("region-ocr").join("config.json"));
    }
    paths
}

/// Loads configuration from `explicit`, or the first existing candidate, or
/// returns defaults.
///
/// An explicitly given path that cannot be loaded is an error; a broken
/// file found by searching is logged and skipped.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = AppConfig::from_file(path)?;
        crate::log(&format!("Config loaded from {}", path.display()));
        return Ok(config);
    }

    for path in config_candidates() {
        crate::log(&format!("Looking for config at: {}", path.display()));
        if !path.exists() {
            continue;
        }
        match AppConfig::from_file(&path) {
            Ok(config) => {
                crate::log(&format!("Config loaded from {}", path.display()));
                return Ok(config);
            }
            Err(e) => {
                crate::log(&format!("{:#}. Using defaults.", e));
                return Ok(AppConfig::default());
            }
        }
    }

    crate::log("config.json not found. Using default config.");
    Ok(AppConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::params::OcrLang;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ocr_url(), "http://localhost:8000/v1/ocr");
        assert_eq!(config.health_url(), "http://localhost:8000/healthz");
        assert_eq!(config.upload_format, UploadFormat::Jpeg);
        assert_eq!(config.upload_quality(), 92);
        assert_eq!(config.hotkey.to_string(), "Alt+0");
        assert_eq!(config.ocr.lang, OcrLang::ChEn);
    }

    #[test]
    fn test_urls_tolerate_slashes() {
        let config = AppConfig {
            api_base: "http://ocr.local:9000/".to_string(),
            api_path: "v2/ocr".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.ocr_url(), "http://ocr.local:9000/v2/ocr");
        assert_eq!(config.health_url(), "http://ocr.local:9000/healthz");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_base": "http://10.0.0.2:8000", "upload_format": "image/png",
                "hotkey": "Ctrl+Shift+O", "ocr": {"lang": "en"}}"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api_base, "http://10.0.0.2:8000");
        assert_eq!(config.api_path, "/v1/ocr");
        assert_eq!(config.upload_format, UploadFormat::Png);
        assert_eq!(config.upload_format.file_name(), "sel.png");
        assert!(config.hotkey.ctrl && config.hotkey.shift);
        assert_eq!(config.ocr.lang, OcrLang::En);
        assert_eq!(config.ocr.box_thresh, 0.45);
    }

    #[test]
    fn test_explicit_bad_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(Some(&path)).is_err());
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_default_serializes_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, serde_json::to_string_pretty(&AppConfig::default()).unwrap()).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped: AppConfig = serde_json::from_str(include_str!("../config.json")).unwrap();
        assert_eq!(shipped, AppConfig::default());
    }
}
