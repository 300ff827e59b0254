//! Capabilities the pipeline needs from the outside world.
//!
//! Page rasterization and document reading/writing are both provided by
//! external libraries; the core only talks to them through these traits so
//! that the export pipeline can be driven by test doubles.

use image::RgbaImage;

use crate::annotation::{ImageEncoding, Rgb};
use crate::geometry::{CodecRect, Point, Size};
use crate::Result;

/// A page that could not be rasterized
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("page {page_number}: {reason}")]
pub struct RenderError {
    pub page_number: u32,
    pub reason: String,
}

impl RenderError {
    pub fn new(page_number: u32, reason: impl Into<String>) -> Self {
        Self {
            page_number,
            reason: reason.into(),
        }
    }
}

/// Failures reported by a [`DocumentCodec`]
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot parse document: {0}")]
    Parse(String),
    #[error("page {0} does not exist")]
    NoSuchPage(u32),
    #[error("cannot embed image: {0}")]
    Image(String),
    #[error("cannot write document: {0}")]
    Write(String),
}

/// Rasterizes pages of a loaded document.
///
/// Page numbers are 1-based. `scale` 1.0 maps one document unit to one pixel.
pub trait PageRenderer {
    /// Load a document and return its page count
    fn load(&mut self, bytes: &[u8]) -> Result<u32>;

    fn render_page(&self, page_number: u32, scale: f32) -> std::result::Result<RgbaImage, RenderError>;

    fn page_dimensions(&self, page_number: u32, scale: f32) -> std::result::Result<Size, RenderError>;
}

/// Font selection for natively drawn text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Rgb,
    pub bold: bool,
}

/// Opens and creates documents.
pub trait DocumentCodec {
    type Document: CodecDocument;

    fn load(&self, bytes: &[u8]) -> std::result::Result<Self::Document, CodecError>;

    fn create_empty(&self) -> Self::Document;
}

/// An open document. All geometry is in codec space (bottom-left origin).
pub trait CodecDocument {
    /// Handle returned by [`CodecDocument::embed_raster_image`]
    type ImageRef: Clone;

    fn page_count(&self) -> u32;

    fn page_size(&self, page_number: u32) -> std::result::Result<Size, CodecError>;

    /// Append a blank page and return its page number
    fn add_page(&mut self, size: Size) -> std::result::Result<u32, CodecError>;

    fn draw_rectangle(
        &mut self,
        page_number: u32,
        rect: CodecRect,
        fill: Rgb,
    ) -> std::result::Result<(), CodecError>;

    /// Draw one line of text with its baseline starting at `origin`
    fn draw_text(
        &mut self,
        page_number: u32,
        origin: Point,
        text: &str,
        style: &TextStyle,
    ) -> std::result::Result<(), CodecError>;

    fn embed_raster_image(
        &mut self,
        bytes: &[u8],
        format: ImageEncoding,
    ) -> std::result::Result<Self::ImageRef, CodecError>;

    fn draw_image(
        &mut self,
        page_number: u32,
        image: &Self::ImageRef,
        rect: CodecRect,
    ) -> std::result::Result<(), CodecError>;

    fn serialize(&mut self) -> std::result::Result<Vec<u8>, CodecError>;
}
