//! Export pipeline: quick overlay or secure flatten.
//!
//! Secure mode never copies anything from the source document into the
//! output. Each page is rasterized with its annotations, encoded as a
//! lossless PNG and becomes the only content of a new page of the same size.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use veil_core::text_layout::visible_lines;
use veil_core::{
    AnnotationKind, AnnotationStore, CodecDocument, CodecRect, DocumentCodec, ImageEncoding,
    PageRenderer, Point, TextStyle,
};
use veil_render::{CompositeOptions, Compositor, SkippedAnnotation};
use veil_verify::{verify_flattened_with, VerifyOptions};

use crate::validation::strip_pdf_extension;
use crate::{Result, VeilError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Draw over the original content; nothing is removed
    Overlay,
    /// Rebuild every page from a raster
    #[default]
    Secure,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPage {
    pub page_number: u32,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAnnotationInfo {
    pub id: String,
    pub kind: AnnotationKind,
    pub page_number: u32,
    pub reason: String,
}

impl From<SkippedAnnotation> for SkippedAnnotationInfo {
    fn from(skipped: SkippedAnnotation) -> Self {
        Self {
            id: skipped.target.id.to_string(),
            kind: skipped.target.kind,
            page_number: skipped.page_number,
            reason: skipped.reason,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub mode: ExportMode,
    /// Pages in the source document
    pub page_count: u32,
    pub pages_written: u32,
    pub skipped_pages: Vec<SkippedPage>,
    pub skipped_annotations: Vec<SkippedAnnotationInfo>,
    /// Annotations whose page does not exist in the source
    pub out_of_range_annotations: usize,
    /// `None` when verification was not run
    pub verified: Option<bool>,
    /// Hex SHA-256 of the output bytes
    pub sha256: String,
}

/// A finished export, ready to be saved or downloaded
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    /// Raster scale for secure mode
    pub scale: f32,
    /// Re-check secure output and fail if it is not flat
    pub verify: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: crate::config::DEFAULT_EXPORT_SCALE,
            verify: true,
        }
    }
}

/// `contract.pdf` -> `contract_edited.pdf`
pub fn output_file_name(input: &str) -> String {
    format!("{}_edited.pdf", strip_pdf_extension(input))
}

pub struct ExportPipeline<'a, R: PageRenderer + ?Sized, C: DocumentCodec> {
    renderer: &'a R,
    codec: &'a C,
    compositor: &'a Compositor,
    options: ExportOptions,
}

impl<'a, R: PageRenderer + ?Sized, C: DocumentCodec> ExportPipeline<'a, R, C> {
    pub fn new(renderer: &'a R, codec: &'a C, compositor: &'a Compositor, options: ExportOptions) -> Self {
        Self {
            renderer,
            codec,
            compositor,
            options,
        }
    }

    /// Export `source` with the annotations in `store`.
    ///
    /// The renderer must already hold the same document. Either the whole
    /// output is produced or an error is returned.
    pub fn run(
        &self,
        source: &[u8],
        source_name: &str,
        store: &AnnotationStore,
        mode: ExportMode,
    ) -> Result<ExportArtifact> {
        log::info!("[Export] {} in {:?} mode", source_name, mode);
        let (bytes, mut report) = match mode {
            ExportMode::Secure => self.export_secure(source, store)?,
            ExportMode::Overlay => self.export_overlay(source, store)?,
        };
        report.sha256 = hex::encode(Sha256::digest(&bytes));

        let file_name = output_file_name(source_name);
        log::info!(
            "[Export] {}: {} of {} pages, {} bytes",
            file_name,
            report.pages_written,
            report.page_count,
            bytes.len()
        );
        Ok(ExportArtifact {
            file_name,
            bytes,
            report,
        })
    }

    fn load_source(&self, source: &[u8]) -> Result<C::Document> {
        self.codec
            .load(source)
            .map_err(|e| VeilError::Load(e.to_string()))
    }

    fn new_report(&self, mode: ExportMode, page_count: u32, store: &AnnotationStore) -> ExportReport {
        let out_of_range = store.count_out_of_range(page_count);
        if out_of_range > 0 {
            log::debug!("[Export] {} annotations lie outside pages 1..={}", out_of_range, page_count);
        }
        ExportReport {
            mode,
            page_count,
            out_of_range_annotations: out_of_range,
            ..Default::default()
        }
    }

    fn export_secure(&self, source: &[u8], store: &AnnotationStore) -> Result<(Vec<u8>, ExportReport)> {
        let source_doc = self.load_source(source)?;
        let page_count = source_doc.page_count();
        let mut report = self.new_report(ExportMode::Secure, page_count, store);
        let mut output = self.codec.create_empty();
        let options = CompositeOptions::export(self.options.scale);

        for page_number in 1..=page_count {
            let size = source_doc.page_size(page_number)?;
            let annotations = store.on_page(page_number);

            let composite = match self
                .compositor
                .compose_page(self.renderer, page_number, &annotations, &options)
            {
                Ok(composite) => composite,
                Err(err) => {
                    log::warn!("[Export] skipping page {}: {}", page_number, err.reason);
                    report.skipped_pages.push(SkippedPage {
                        page_number,
                        reason: err.reason,
                    });
                    continue;
                }
            };
            report
                .skipped_annotations
                .extend(composite.skipped.into_iter().map(SkippedAnnotationInfo::from));

            let png = encode_png(&composite.image)?;
            let out_page = output.add_page(size)?;
            let image = output.embed_raster_image(&png, ImageEncoding::Png)?;
            output.draw_image(
                out_page,
                &image,
                CodecRect {
                    x: 0.0,
                    y: 0.0,
                    width: size.width,
                    height: size.height,
                },
            )?;
            report.pages_written += 1;
            log::debug!(
                "[Export] page {} flattened at {}x{} px",
                page_number,
                composite.image.width(),
                composite.image.height()
            );
        }

        if page_count > 0 && report.pages_written == 0 {
            return Err(VeilError::Export("no page could be rendered".to_string()));
        }

        let bytes = output.serialize()?;

        if self.options.verify {
            let result = verify_flattened_with(
                &bytes,
                &VerifyOptions {
                    expected_pages: Some(report.pages_written),
                },
            );
            if !result.ok {
                return Err(VeilError::Export(format!(
                    "output failed verification: {}",
                    result.summary()
                )));
            }
            report.verified = Some(true);
        }

        Ok((bytes, report))
    }

    fn export_overlay(&self, source: &[u8], store: &AnnotationStore) -> Result<(Vec<u8>, ExportReport)> {
        let mut doc = self.load_source(source)?;
        let page_count = doc.page_count();
        let mut report = self.new_report(ExportMode::Overlay, page_count, store);

        for page_number in 1..=page_count {
            let page_height = doc.page_size(page_number)?.height;
            let annotations = store.on_page(page_number);

            for redaction in &annotations.redactions {
                doc.draw_rectangle(
                    page_number,
                    redaction.rect.to_codec(page_height),
                    redaction.fill.resolve(),
                )?;
            }

            for text in &annotations.texts {
                let style = TextStyle {
                    font_size: text.font_size,
                    color: text.color,
                    bold: text.bold,
                };
                for line in visible_lines(text) {
                    let origin = Point::new(text.position.x, page_height - line.baseline);
                    doc.draw_text(page_number, origin, line.text, &style)?;
                }
            }

            for placed in &annotations.images {
                match doc.embed_raster_image(&placed.data, placed.encoding) {
                    Ok(image) => {
                        doc.draw_image(page_number, &image, placed.rect.to_codec(page_height))?
                    }
                    Err(err) => {
                        log::warn!("[Export] skipping image {}: {}", placed.id, err);
                        report.skipped_annotations.push(SkippedAnnotationInfo {
                            id: placed.id.to_string(),
                            kind: AnnotationKind::Image,
                            page_number,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            report.pages_written += 1;
        }

        let bytes = doc.serialize()?;
        Ok((bytes, report))
    }
}

/// Composite onto white and drop alpha; flattened pages are opaque
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    flatten_on_white(image)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| VeilError::Export(format!("cannot encode page raster: {e}")))?;
    Ok(out.into_inner())
}
