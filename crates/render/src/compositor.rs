//! Page compositing for preview and secure export.
//!
//! Annotations are painted over the rendered page in a fixed order:
//! redactions, then text, then images. Geometry is multiplied by the
//! composite scale before drawing.

use ab_glyph::{Font, ScaleFont};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, Blend};
use imageproc::rect::Rect as PixelRect;

use veil_core::annotation::{AnnotationKind, AnnotationRef, ImageAnnotation, RedactionBox, TextAnnotation};
use veil_core::store::PageAnnotations;
use veil_core::text_layout::{text_bounds, visible_lines, TextMeasure};
use veil_core::{PageRenderer, Rect, RenderError};

use crate::fonts::{em_scale, FontSet};

const STROKE_RED: Rgba<u8> = Rgba([220, 38, 38, 255]);
const STROKE_ORANGE: Rgba<u8> = Rgba([249, 115, 22, 255]);
const STROKE_BLUE: Rgba<u8> = Rgba([37, 99, 235, 255]);
const HANDLE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Preview redactions are 80% opaque so the content underneath stays visible
const PREVIEW_ALPHA: u8 = 204;
const HANDLE_SIZE: u32 = 8;

/// Editor state drawn on top of a preview
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decoration {
    pub selected: Option<AnnotationRef>,
    /// Redaction being dragged out, in document space
    pub pending_redaction: Option<Rect>,
    pub resizing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositeOptions {
    pub scale: f32,
    /// `None` for export output
    pub decoration: Option<Decoration>,
}

impl CompositeOptions {
    pub fn export(scale: f32) -> Self {
        Self {
            scale,
            decoration: None,
        }
    }

    pub fn preview(scale: f32, decoration: Decoration) -> Self {
        Self {
            scale,
            decoration: Some(decoration),
        }
    }
}

/// An annotation that could not be painted
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedAnnotation {
    pub target: AnnotationRef,
    pub page_number: u32,
    pub reason: String,
}

#[derive(Debug)]
pub struct Composite {
    pub image: RgbaImage,
    pub skipped: Vec<SkippedAnnotation>,
}

pub struct Compositor {
    fonts: FontSet,
}

impl Compositor {
    pub fn new(fonts: FontSet) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Render `page_number` and paint its annotations on top
    pub fn compose_page<R: PageRenderer + ?Sized>(
        &self,
        renderer: &R,
        page_number: u32,
        annotations: &PageAnnotations<'_>,
        options: &CompositeOptions,
    ) -> Result<Composite, RenderError> {
        let base = renderer.render_page(page_number, options.scale)?;
        Ok(self.compose(base, annotations, options))
    }

    /// Paint annotations over an already rendered page.
    ///
    /// Per-annotation failures are collected and never abort the page.
    pub fn compose(
        &self,
        base: RgbaImage,
        annotations: &PageAnnotations<'_>,
        options: &CompositeOptions,
    ) -> Composite {
        let scale = options.scale;
        let decoration = options.decoration.as_ref();
        let mut image = base;
        let mut skipped = Vec::new();

        for redaction in &annotations.redactions {
            match decoration {
                Some(decoration) => self.preview_redaction(&mut image, redaction, scale, decoration),
                None => fill_redaction(&mut image, redaction, scale),
            }
        }

        for text in &annotations.texts {
            if let Err(reason) = self.draw_text(&mut image, text, scale) {
                log::warn!("[Compositor] skipped text {}: {}", text.id, reason);
                skipped.push(SkippedAnnotation {
                    target: AnnotationRef::new(AnnotationKind::Text, text.id.clone()),
                    page_number: text.page_number,
                    reason,
                });
            }
        }

        for placed in &annotations.images {
            if let Err(reason) = draw_image(&mut image, placed, scale) {
                log::warn!("[Compositor] skipped image {}: {}", placed.id, reason);
                skipped.push(SkippedAnnotation {
                    target: AnnotationRef::new(AnnotationKind::Image, placed.id.clone()),
                    page_number: placed.page_number,
                    reason,
                });
            }
        }

        if let Some(decoration) = decoration {
            self.decorate(&mut image, annotations, scale, decoration);
        }

        Composite { image, skipped }
    }

    fn preview_redaction(
        &self,
        image: &mut RgbaImage,
        redaction: &RedactionBox,
        scale: f32,
        decoration: &Decoration,
    ) {
        let Some(rect) = pixel_rect(&redaction.rect, scale, image.width(), image.height()) else {
            return;
        };
        let fill = Rgba(redaction.fill.resolve().to_rgba_u8(PREVIEW_ALPHA));
        let mut canvas = Blend(std::mem::take(image));
        draw_filled_rect_mut(&mut canvas, rect, fill);
        *image = canvas.0;

        let selected = decoration
            .selected
            .as_ref()
            .is_some_and(|s| s.kind == AnnotationKind::Redaction && s.id == redaction.id);
        if selected {
            stroke(image, rect, STROKE_ORANGE, 3);
        } else {
            stroke(image, rect, STROKE_RED, 1);
        }
    }

    fn draw_text(&self, image: &mut RgbaImage, text: &TextAnnotation, scale: f32) -> Result<(), String> {
        let lines = visible_lines(text);
        if lines.is_empty() {
            return Ok(());
        }
        let font = self
            .fonts
            .font_for(text.bold)
            .ok_or_else(|| "no font available".to_string())?;
        let px = em_scale(font, text.font_size * scale);
        let ascent = font.as_scaled(px).ascent();
        let color = Rgba(text.color.to_rgba_u8(255));

        for line in lines {
            let x = (text.position.x * scale).round() as i32;
            // draw_text_mut positions the top of the line box, not the baseline
            let top = (line.baseline * scale - ascent).round() as i32;
            draw_text_mut(image, color, x, top, px, font, line.text);
        }
        Ok(())
    }

    fn decorate(
        &self,
        image: &mut RgbaImage,
        annotations: &PageAnnotations<'_>,
        scale: f32,
        decoration: &Decoration,
    ) {
        let (width, height) = image.dimensions();

        if let Some(selected) = &decoration.selected {
            match selected.kind {
                AnnotationKind::Text => {
                    let bounds = annotations
                        .texts
                        .iter()
                        .find(|t| t.id == selected.id)
                        .map(|t| text_bounds(t, &self.fonts as &dyn TextMeasure));
                    if let Some(rect) = bounds.and_then(|b| pixel_rect(&b, scale, width, height)) {
                        stroke(image, rect, STROKE_BLUE, 1);
                    }
                }
                AnnotationKind::Image => {
                    if let Some(placed) = annotations.images.iter().find(|i| i.id == selected.id) {
                        outline_with_handles(image, &placed.rect, scale);
                    }
                }
                AnnotationKind::Redaction => {}
            }
        }

        if let Some(pending) = decoration.pending_redaction {
            if let Some(rect) = pixel_rect(&pending, scale, width, height) {
                stroke(image, rect, STROKE_BLUE, 2);
            }
        }
    }
}

impl TextMeasure for Compositor {
    fn line_width(&self, line: &str, font_size: f32, bold: bool) -> f32 {
        self.fonts.line_width(line, font_size, bold)
    }
}

/// Solid export fill, no stroke
fn fill_redaction(image: &mut RgbaImage, redaction: &RedactionBox, scale: f32) {
    if let Some(rect) = pixel_rect(&redaction.rect, scale, image.width(), image.height()) {
        let fill = Rgba(redaction.fill.resolve().to_rgba_u8(255));
        draw_filled_rect_mut(image, rect, fill);
        log::debug!(
            "[Compositor] redaction {} filled at ({}, {}, {}, {})",
            redaction.id,
            rect.left(),
            rect.top(),
            rect.width(),
            rect.height()
        );
    }
}

/// Decode the annotation bytes and stretch them over the scaled rectangle
fn draw_image(image: &mut RgbaImage, placed: &ImageAnnotation, scale: f32) -> Result<(), String> {
    let target = placed.rect.scaled(scale);
    let width = target.width.round() as u32;
    let height = target.height.round() as u32;
    if width == 0 || height == 0 {
        return Ok(());
    }
    let decoded = image::load_from_memory_with_format(&placed.data, placed.encoding.image_format())
        .map_err(|e| format!("cannot decode {:?} data: {}", placed.encoding, e))?;
    let stretched = imageops::resize(
        &decoded.to_rgba8(),
        width,
        height,
        imageops::FilterType::Triangle,
    );
    imageops::overlay(
        image,
        &stretched,
        target.x.round() as i64,
        target.y.round() as i64,
    );
    Ok(())
}

fn outline_with_handles(image: &mut RgbaImage, rect: &Rect, scale: f32) {
    let (width, height) = image.dimensions();
    if let Some(outline) = pixel_rect(rect, scale, width, height) {
        stroke(image, outline, STROKE_BLUE, 1);
    }
    let scaled = rect.scaled(scale);
    for handle in veil_core::ResizeHandle::ALL {
        let center = handle.position(&scaled);
        let x = center.x.round() as i32 - HANDLE_SIZE as i32 / 2;
        let y = center.y.round() as i32 - HANDLE_SIZE as i32 / 2;
        let square = PixelRect::at(x, y).of_size(HANDLE_SIZE, HANDLE_SIZE);
        draw_filled_rect_mut(image, square, HANDLE_FILL);
        draw_hollow_rect_mut(image, square, STROKE_BLUE);
    }
}

fn stroke(image: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>, thickness: u32) {
    for inset in 0..thickness {
        let (w, h) = (rect.width(), rect.height());
        if w <= 2 * inset || h <= 2 * inset {
            break;
        }
        let inner = PixelRect::at(rect.left() + inset as i32, rect.top() + inset as i32)
            .of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(image, inner, color);
    }
}

/// Scale a document rectangle to pixels, clipped to the image.
///
/// Returns `None` when nothing of it is visible.
pub fn pixel_rect(rect: &Rect, scale: f32, width: u32, height: u32) -> Option<PixelRect> {
    let scaled = rect.scaled(scale);
    let left = scaled.x.round().max(0.0) as i64;
    let top = scaled.y.round().max(0.0) as i64;
    let right = (scaled.right().round() as i64).min(width as i64);
    let bottom = (scaled.bottom().round() as i64).min(height as i64);
    if right <= left || bottom <= top {
        return None;
    }
    Some(PixelRect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32))
}
