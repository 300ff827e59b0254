//! The authoritative in-memory annotation model.
//!
//! Every mutation is looked up by identity. Unknown ids are a no-op and report
//! `false`, they are never an error.

use serde::{Deserialize, Serialize};

use crate::annotation::{
    AnnotationId, AnnotationKind, AnnotationRef, FillColor, ImageAnnotation, RedactionBox, Rgb,
    TextAnnotation,
};
use crate::geometry::{Point, Rect};

/// Partial update for a [`RedactionBox`]
#[derive(Clone, Debug, Default)]
pub struct RedactionPatch {
    pub page_number: Option<u32>,
    pub rect: Option<Rect>,
    pub fill: Option<FillColor>,
}

/// Partial update for a [`TextAnnotation`]
#[derive(Clone, Debug, Default)]
pub struct TextPatch {
    pub page_number: Option<u32>,
    pub position: Option<Point>,
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Rgb>,
    pub bold: Option<bool>,
}

/// Partial update for an [`ImageAnnotation`]
#[derive(Clone, Debug, Default)]
pub struct ImagePatch {
    pub page_number: Option<u32>,
    pub rect: Option<Rect>,
    pub lock_aspect_ratio: Option<bool>,
}

impl RedactionPatch {
    fn apply(self, target: &mut RedactionBox) {
        if let Some(page) = self.page_number {
            target.page_number = page;
        }
        if let Some(rect) = self.rect {
            target.rect = rect;
        }
        if let Some(fill) = self.fill {
            target.fill = fill;
        }
    }
}

impl TextPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn apply(self, target: &mut TextAnnotation) {
        if let Some(page) = self.page_number {
            target.page_number = page;
        }
        if let Some(position) = self.position {
            target.position = position;
        }
        if let Some(text) = self.text {
            target.text = text;
        }
        // Non-positive sizes are ignored, the model requires a positive size
        if let Some(size) = self.font_size.filter(|s| s.is_finite() && *s > 0.0) {
            target.font_size = size;
        }
        if let Some(color) = self.color {
            target.color = color;
        }
        if let Some(bold) = self.bold {
            target.bold = bold;
        }
    }
}

impl ImagePatch {
    pub fn rect(rect: Rect) -> Self {
        Self {
            rect: Some(rect),
            ..Default::default()
        }
    }

    fn apply(self, target: &mut ImageAnnotation) {
        if let Some(page) = self.page_number {
            target.page_number = page;
        }
        if let Some(rect) = self.rect {
            target.rect = rect;
        }
        if let Some(lock) = self.lock_aspect_ratio {
            target.lock_aspect_ratio = lock;
        }
    }
}

/// Borrowed view of everything placed on one page, in insertion order
#[derive(Debug, Default)]
pub struct PageAnnotations<'a> {
    pub redactions: Vec<&'a RedactionBox>,
    pub texts: Vec<&'a TextAnnotation>,
    pub images: Vec<&'a ImageAnnotation>,
}

impl PageAnnotations<'_> {
    pub fn is_empty(&self) -> bool {
        self.redactions.is_empty() && self.texts.is_empty() && self.images.is_empty()
    }
}

/// Per-kind totals, e.g. for a sidebar or an export summary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationCounts {
    pub redactions: usize,
    pub texts: usize,
    pub images: usize,
}

impl AnnotationCounts {
    pub fn total(&self) -> usize {
        self.redactions + self.texts + self.images
    }
}

/// Page-scoped collections of redactions, texts and images.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnnotationStore {
    redactions: Vec<RedactionBox>,
    texts: Vec<TextAnnotation>,
    images: Vec<ImageAnnotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Redactions ============

    pub fn add_redaction(&mut self, redaction: RedactionBox) -> AnnotationId {
        let id = redaction.id.clone();
        self.redactions.push(redaction);
        id
    }

    pub fn update_redaction(&mut self, id: &AnnotationId, patch: RedactionPatch) -> bool {
        match self.redactions.iter_mut().find(|r| &r.id == id) {
            Some(target) => {
                patch.apply(target);
                true
            }
            None => false,
        }
    }

    pub fn remove_redaction(&mut self, id: &AnnotationId) -> Option<RedactionBox> {
        let index = self.redactions.iter().position(|r| &r.id == id)?;
        Some(self.redactions.remove(index))
    }

    pub fn redaction(&self, id: &AnnotationId) -> Option<&RedactionBox> {
        self.redactions.iter().find(|r| &r.id == id)
    }

    pub fn redactions(&self) -> &[RedactionBox] {
        &self.redactions
    }

    // ============ Text ============

    pub fn add_text(&mut self, text: TextAnnotation) -> AnnotationId {
        let id = text.id.clone();
        self.texts.push(text);
        id
    }

    pub fn update_text(&mut self, id: &AnnotationId, patch: TextPatch) -> bool {
        match self.texts.iter_mut().find(|t| &t.id == id) {
            Some(target) => {
                patch.apply(target);
                true
            }
            None => false,
        }
    }

    pub fn remove_text(&mut self, id: &AnnotationId) -> Option<TextAnnotation> {
        let index = self.texts.iter().position(|t| &t.id == id)?;
        Some(self.texts.remove(index))
    }

    pub fn text(&self, id: &AnnotationId) -> Option<&TextAnnotation> {
        self.texts.iter().find(|t| &t.id == id)
    }

    pub fn texts(&self) -> &[TextAnnotation] {
        &self.texts
    }

    // ============ Images ============

    pub fn add_image(&mut self, image: ImageAnnotation) -> AnnotationId {
        let id = image.id.clone();
        self.images.push(image);
        id
    }

    pub fn update_image(&mut self, id: &AnnotationId, patch: ImagePatch) -> bool {
        match self.images.iter_mut().find(|i| &i.id == id) {
            Some(target) => {
                patch.apply(target);
                true
            }
            None => false,
        }
    }

    pub fn remove_image(&mut self, id: &AnnotationId) -> Option<ImageAnnotation> {
        let index = self.images.iter().position(|i| &i.id == id)?;
        Some(self.images.remove(index))
    }

    pub fn image(&self, id: &AnnotationId) -> Option<&ImageAnnotation> {
        self.images.iter().find(|i| &i.id == id)
    }

    pub fn images(&self) -> &[ImageAnnotation] {
        &self.images
    }

    // ============ Cross-kind ============

    /// Remove whichever annotation the reference points at
    pub fn remove(&mut self, target: &AnnotationRef) -> bool {
        match target.kind {
            AnnotationKind::Redaction => self.remove_redaction(&target.id).is_some(),
            AnnotationKind::Text => self.remove_text(&target.id).is_some(),
            AnnotationKind::Image => self.remove_image(&target.id).is_some(),
        }
    }

    pub fn contains(&self, target: &AnnotationRef) -> bool {
        match target.kind {
            AnnotationKind::Redaction => self.redaction(&target.id).is_some(),
            AnnotationKind::Text => self.text(&target.id).is_some(),
            AnnotationKind::Image => self.image(&target.id).is_some(),
        }
    }

    pub fn on_page(&self, page_number: u32) -> PageAnnotations<'_> {
        PageAnnotations {
            redactions: self
                .redactions
                .iter()
                .filter(|r| r.page_number == page_number)
                .collect(),
            texts: self
                .texts
                .iter()
                .filter(|t| t.page_number == page_number)
                .collect(),
            images: self
                .images
                .iter()
                .filter(|i| i.page_number == page_number)
                .collect(),
        }
    }

    /// Number of annotations whose page lies outside `[1, page_count]`
    pub fn count_out_of_range(&self, page_count: u32) -> usize {
        let out = |page: u32| page == 0 || page > page_count;
        self.redactions.iter().filter(|r| out(r.page_number)).count()
            + self.texts.iter().filter(|t| out(t.page_number)).count()
            + self.images.iter().filter(|i| out(i.page_number)).count()
    }

    pub fn counts(&self) -> AnnotationCounts {
        AnnotationCounts {
            redactions: self.redactions.len(),
            texts: self.texts.len(),
            images: self.images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    pub fn clear(&mut self) {
        self.redactions.clear();
        self.texts.clear();
        self.images.clear();
    }
}
