//! Annotation job files for headless export.
//!
//! ```json
//! {
//!   "redactions": [{ "page": 2, "x": 100, "y": 100, "width": 200, "height": 50 }],
//!   "texts": [{ "page": 2, "x": 110, "y": 110, "text": "REDACTED", "fontSize": 14 }],
//!   "images": [{ "page": 1, "x": 40, "y": 40, "width": 120, "height": 60, "path": "sig.png" }]
//! }
//! ```
//!
//! Coordinates are document units with a top-left origin. Image paths are
//! resolved against the job file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use veil_core::annotation::DEFAULT_FONT_SIZE;
use veil_core::{
    AnnotationStore, FillColor, ImageAnnotation, Point, Rect, RedactionBox, Rgb, TextAnnotation,
};

use crate::{Result, VeilError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportJob {
    pub redactions: Vec<RedactionEntry>,
    pub texts: Vec<TextEntry>,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionEntry {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub fill: FillColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEntry {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub color: Rgb,
    #[serde(default)]
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub path: PathBuf,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

impl ExportJob {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| VeilError::Validation(format!("cannot read job {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| VeilError::Validation(format!("invalid job {}: {e}", path.display())))
    }

    /// Add every entry to `store`. Image files are read relative to `base_dir`.
    pub fn apply(&self, store: &mut AnnotationStore, base_dir: &Path) -> Result<()> {
        for entry in &self.redactions {
            let rect = Rect::new(entry.x, entry.y, entry.width, entry.height);
            if rect.width <= 0.0 || rect.height <= 0.0 {
                return Err(VeilError::Validation(format!(
                    "redaction on page {} has an empty area",
                    entry.page
                )));
            }
            store.add_redaction(RedactionBox::new(entry.page, rect, entry.fill));
        }

        for entry in &self.texts {
            let text = TextAnnotation::new(entry.page, Point::new(entry.x, entry.y), entry.text.clone())
                .with_style(entry.font_size, entry.color, entry.bold)?;
            store.add_text(text);
        }

        for entry in &self.images {
            let path = base_dir.join(&entry.path);
            let data = fs::read(&path)
                .map_err(|e| VeilError::Validation(format!("cannot read image {}: {e}", path.display())))?;
            let rect = Rect::new(entry.x, entry.y, entry.width, entry.height);
            store.add_image(ImageAnnotation::new(entry.page, rect, data)?);
        }

        log::debug!(
            "[Job] applied {} redactions, {} texts, {} images",
            self.redactions.len(),
            self.texts.len(),
            self.images.len()
        );
        Ok(())
    }
}
