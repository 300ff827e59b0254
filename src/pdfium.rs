//! `PageRenderer` backed by the pdfium shared library.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use pdfium_render::prelude::*;
use veil_core::{PageRenderer, RenderError, Size};

use crate::{Result, VeilError};

/// Where to look for the pdfium library, most specific first
fn pdfium_search_paths(extra_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = extra_dir {
        paths.push(dir.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());

            // .app/Contents/MacOS/veil -> .app/Contents/Resources
            #[cfg(target_os = "macos")]
            {
                if let Some(contents_dir) = exe_dir.parent() {
                    paths.push(contents_dir.join("Resources").join("libs"));
                    paths.push(contents_dir.join("Resources"));
                }
            }

            #[cfg(target_os = "linux")]
            {
                if let Ok(appdir) = std::env::var("APPDIR") {
                    let appdir_path = PathBuf::from(appdir);
                    paths.push(appdir_path.join("usr").join("lib").join("libs"));
                    paths.push(appdir_path.join("usr").join("lib"));
                }
            }
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

fn bind_pdfium(extra_dir: Option<&Path>) -> Result<Pdfium> {
    for path in pdfium_search_paths(extra_dir) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(&path);
        log::debug!("[Pdfium] trying {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::info!("[Pdfium] bound library in {:?}", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Pdfium] trying system library");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| {
            VeilError::Load(format!(
                "pdfium library unavailable: {e}; set pdfiumLibraryDir in the config"
            ))
        })
}

/// Rasterizes pages with pdfium.
///
/// pdfium documents borrow their bytes, so the renderer keeps the loaded
/// bytes and reopens the document for each page.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    bytes: Option<Vec<u8>>,
    /// Page sizes in points, as displayed
    page_sizes: Vec<Size>,
}

impl PdfiumRenderer {
    pub fn bind(extra_dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            pdfium: bind_pdfium(extra_dir)?,
            bytes: None,
            page_sizes: Vec::new(),
        })
    }

    fn open(&self, page_number: u32) -> std::result::Result<(PdfDocument<'_>, u16), RenderError> {
        let bytes = self
            .bytes
            .as_deref()
            .ok_or_else(|| RenderError::new(page_number, "no document loaded"))?;
        let index = page_number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .filter(|i| (*i as usize) < self.page_sizes.len())
            .ok_or_else(|| RenderError::new(page_number, "page out of range"))?;
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| RenderError::new(page_number, format!("cannot open document: {e}")))?;
        Ok((document, index))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn load(&mut self, bytes: &[u8]) -> Result<u32> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| VeilError::Load(format!("pdfium cannot open document: {e}")))?;
        let page_sizes: Vec<Size> = document
            .pages()
            .iter()
            .map(|page| Size::new(page.width().value, page.height().value))
            .collect();
        drop(document);

        log::info!("[Pdfium] loaded document with {} pages", page_sizes.len());
        self.bytes = Some(bytes.to_vec());
        self.page_sizes = page_sizes;
        Ok(self.page_sizes.len() as u32)
    }

    fn render_page(&self, page_number: u32, scale: f32) -> std::result::Result<RgbaImage, RenderError> {
        let size = self.page_dimensions(page_number, scale)?;
        let (document, index) = self.open(page_number)?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| RenderError::new(page_number, format!("cannot get page: {e}")))?;

        let target_width = size.width.round().max(1.0) as i32;
        let target_height = size.height.round().max(1.0) as i32;
        log::debug!(
            "[Pdfium] page {}: {}x{} px at scale {}",
            page_number,
            target_width,
            target_height,
            scale
        );

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RenderError::new(page_number, format!("render failed: {e}")))?;

        Ok(bitmap.as_image().to_rgba8())
    }

    fn page_dimensions(&self, page_number: u32, scale: f32) -> std::result::Result<Size, RenderError> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.page_sizes.get(i as usize))
            .map(|size| size.scaled(scale))
            .ok_or_else(|| RenderError::new(page_number, "page out of range"))
    }
}
