use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Size limit for uploaded documents
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Raster scale for secure export
pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;

/// A text offered by the template picker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextTemplate {
    pub title: String,
    pub text: String,
}

impl TextTemplate {
    fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

fn default_templates() -> Vec<TextTemplate> {
    vec![
        TextTemplate::new("Redacted", "REDACTED"),
        TextTemplate::new("Confidential", "CONFIDENTIAL"),
        TextTemplate::new(
            "Privacy notice",
            "Personal information removed\nunder applicable privacy law",
        ),
    ]
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    // ============ Export ============
    /// Pixels per document unit when flattening pages
    pub export_scale: f32,
    /// Re-check flattened output before handing it out
    pub verify_output: bool,

    // ============ Input ============
    pub max_upload_bytes: u64,

    // ============ Libraries and fonts ============
    /// Extra directory searched first for the pdfium shared library
    pub pdfium_library_dir: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,

    // ============ Editor ============
    pub templates: Vec<TextTemplate>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export_scale: DEFAULT_EXPORT_SCALE,
            verify_output: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pdfium_library_dir: None,
            font_path: None,
            bold_font_path: None,
            templates: default_templates(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config dir unavailable")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// `<config_dir>/veil/config.json`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("veil").join("config.json"))
}

/// Load from `path`, or from the default location. A missing file yields the
/// defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    if !path.exists() {
        log::debug!("[Config] {:?} not found, using defaults", path);
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    let config: AppConfig = serde_json::from_str(&raw)?;
    if !(config.export_scale.is_finite() && config.export_scale > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "exportScale must be positive, got {}",
            config.export_scale
        )));
    }
    log::info!("[Config] loaded {:?}", path);
    Ok(config)
}

pub fn save_config(path: Option<&Path>, config: &AppConfig) -> Result<(), ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}
