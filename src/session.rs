//! Editor session: the composition root that owns the document, the
//! annotation store, the interaction state machine and the export pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use veil_core::geometry::canvas_to_document;
use veil_core::interaction::{Interaction, Outcome, Tool};
use veil_core::store::{ImagePatch, RedactionPatch, TextPatch};
use veil_core::{
    AnnotationCounts, AnnotationId, AnnotationRef, AnnotationStore, CodecDocument, DocumentCodec,
    PageRenderer, Point, Zoom,
};
use veil_render::{CompositeOptions, Compositor, Decoration, FontSet};

use crate::config::{AppConfig, TextTemplate};
use crate::export::{ExportArtifact, ExportMode, ExportOptions, ExportPipeline};
use crate::validation::{check_signature, validate_upload};
use crate::{Result, VeilError};

/// Holds the process-wide processing flag for as long as it lives
pub struct ProcessingGuard {
    flag: Arc<AtomicBool>,
}

impl ProcessingGuard {
    /// `None` when another load or export already holds the flag
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
struct LoadedDocument {
    file_name: String,
    bytes: Arc<Vec<u8>>,
    page_count: u32,
}

pub struct EditorSession<R: PageRenderer, C: DocumentCodec> {
    renderer: R,
    codec: C,
    compositor: Compositor,
    config: AppConfig,
    document: Option<LoadedDocument>,
    current_page: u32,
    zoom: Zoom,
    store: Arc<Mutex<AnnotationStore>>,
    interaction: Interaction,
    processing: Arc<AtomicBool>,
}

impl<R: PageRenderer, C: DocumentCodec> EditorSession<R, C> {
    pub fn new(renderer: R, codec: C, config: AppConfig) -> Self {
        let fonts = FontSet::discover(config.font_path.as_deref(), config.bold_font_path.as_deref());
        Self::with_fonts(renderer, codec, config, fonts)
    }

    pub fn with_fonts(renderer: R, codec: C, config: AppConfig, fonts: FontSet) -> Self {
        Self {
            renderer,
            codec,
            compositor: Compositor::new(fonts),
            config,
            document: None,
            current_page: 1,
            zoom: Zoom::default(),
            store: Arc::new(Mutex::new(AnnotationStore::new())),
            interaction: Interaction::new(1),
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn templates(&self) -> &[TextTemplate] {
        &self.config.templates
    }

    /// Shared handle to the annotation store
    pub fn store(&self) -> Arc<Mutex<AnnotationStore>> {
        self.store.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub fn processing_flag(&self) -> Arc<AtomicBool> {
        self.processing.clone()
    }

    // ============ Document ============

    /// Validate and load a document, replacing the current one.
    ///
    /// On failure the session is left as it was.
    pub fn load_document(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<u32> {
        validate_upload(file_name, bytes.len() as u64, self.config.max_upload_bytes)?;
        check_signature(&bytes)?;
        let _guard = ProcessingGuard::acquire(&self.processing)
            .ok_or_else(|| VeilError::Load("busy".to_string()))?;

        // export rebuilds the file through the codec, so it must open it too
        let codec_pages = self
            .codec
            .load(&bytes)
            .map_err(|e| VeilError::Load(format!("cannot open {file_name}: {e}")))?
            .page_count();

        let page_count = self.renderer.load(&bytes)?;
        let rejection = if page_count == 0 {
            Some(format!("{file_name} has no pages"))
        } else if page_count != codec_pages {
            Some(format!(
                "{file_name}: renderer sees {page_count} pages, codec sees {codec_pages}"
            ))
        } else {
            None
        };
        if let Some(reason) = rejection {
            if let Some(previous) = &self.document {
                self.renderer.load(&previous.bytes)?;
            }
            return Err(VeilError::Load(reason));
        }
        log::info!("[Session] loaded {} ({} pages)", file_name, page_count);

        self.document = Some(LoadedDocument {
            file_name: file_name.to_string(),
            bytes: Arc::new(bytes),
            page_count,
        });
        self.store.lock().clear();
        self.current_page = 1;
        self.zoom.fit();
        self.interaction = Interaction::new(1);
        Ok(page_count)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.file_name.as_str())
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map(|d| d.page_count).unwrap_or(0)
    }

    pub fn has_changes(&self) -> bool {
        !self.store.lock().is_empty()
    }

    /// Per-kind annotation totals
    pub fn summary(&self) -> AnnotationCounts {
        self.store.lock().counts()
    }

    /// Drop the document and all annotations. With unsaved changes `confirm`
    /// decides; returns whether the session was reset.
    pub fn new_document(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if self.has_changes() && !confirm() {
            return false;
        }
        self.document = None;
        self.store.lock().clear();
        self.current_page = 1;
        self.zoom = Zoom::default();
        self.interaction = Interaction::new(1);
        true
    }

    // ============ Navigation ============

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Go to `page_number`, clamped to the document
    pub fn set_current_page(&mut self, page_number: u32) -> u32 {
        let page = page_number.clamp(1, self.page_count().max(1));
        if page != self.current_page {
            self.current_page = page;
            self.interaction.set_page(&mut self.store.lock(), page);
        }
        page
    }

    pub fn next_page(&mut self) -> u32 {
        self.set_current_page(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> u32 {
        self.set_current_page(self.current_page.saturating_sub(1))
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.value()
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.zoom.zoom_in();
        self.zoom.value()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.zoom.zoom_out();
        self.zoom.value()
    }

    pub fn zoom_fit(&mut self) -> f32 {
        self.zoom.fit();
        self.zoom.value()
    }

    // ============ Interaction ============

    pub fn tool(&self) -> Tool {
        self.interaction.tool()
    }

    pub fn set_tool(&mut self, tool: Tool) -> Outcome {
        self.interaction.set_tool(&mut self.store.lock(), tool)
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    fn to_document(&self, canvas: Point) -> Point {
        canvas_to_document(canvas, self.zoom.value())
    }

    /// Pointer events take canvas coordinates (zoom applied)
    pub fn pointer_down(&mut self, canvas: Point) -> Outcome {
        let p = self.to_document(canvas);
        self.interaction
            .pointer_down(&mut self.store.lock(), p, &self.compositor)
    }

    pub fn pointer_move(&mut self, canvas: Point) -> Outcome {
        let p = self.to_document(canvas);
        self.interaction.pointer_move(&mut self.store.lock(), p)
    }

    pub fn pointer_up(&mut self) -> Outcome {
        self.interaction.pointer_up(&mut self.store.lock())
    }

    pub fn click(&mut self, canvas: Point) -> Outcome {
        let p = self.to_document(canvas);
        self.interaction.click(&mut self.store.lock(), p, &self.compositor)
    }

    /// Use the template at `index` for the pending text placement
    pub fn choose_template(&mut self, index: usize) -> Result<AnnotationId> {
        let template = self
            .config
            .templates
            .get(index)
            .map(|t| t.text.clone())
            .ok_or_else(|| VeilError::Validation(format!("no template #{index}")))?;
        self.interaction
            .choose_template(&mut self.store.lock(), &template)
    }

    pub fn begin_text_entry(&mut self) -> Result<AnnotationId> {
        self.interaction.begin_text_entry(&mut self.store.lock())
    }

    pub fn update_editing_text(&mut self, text: &str) -> bool {
        self.interaction
            .update_editing_text(&mut self.store.lock(), text)
    }

    pub fn end_text_editing(&mut self) -> Outcome {
        self.interaction.end_text_editing(&mut self.store.lock())
    }

    pub fn cancel(&mut self) -> Outcome {
        self.interaction.cancel(&mut self.store.lock())
    }

    pub fn place_image(&mut self, data: Vec<u8>) -> Result<AnnotationId> {
        self.interaction.place_image(&mut self.store.lock(), data)
    }

    pub fn select(&mut self, target: AnnotationRef) -> Outcome {
        self.interaction.select(&mut self.store.lock(), target)
    }

    pub fn delete_selected(&mut self) -> Outcome {
        self.interaction.delete_selected(&mut self.store.lock())
    }

    // ============ Settings panels ============

    pub fn update_redaction(&mut self, id: &AnnotationId, patch: RedactionPatch) -> bool {
        self.store.lock().update_redaction(id, patch)
    }

    pub fn update_text(&mut self, id: &AnnotationId, patch: TextPatch) -> bool {
        self.store.lock().update_text(id, patch)
    }

    pub fn update_image(&mut self, id: &AnnotationId, patch: ImagePatch) -> bool {
        self.store.lock().update_image(id, patch)
    }

    pub fn delete(&mut self, target: &AnnotationRef) -> bool {
        if self.interaction.selection().as_ref() == Some(target) {
            return matches!(self.delete_selected(), Outcome::Deleted(_));
        }
        self.store.lock().remove(target)
    }

    // ============ Output ============

    /// Current page at the current zoom with selection decoration
    pub fn render_preview(&self) -> Result<RgbaImage> {
        if self.document.is_none() {
            return Err(VeilError::Load("no document loaded".to_string()));
        }
        let decoration = Decoration {
            selected: self.interaction.selection(),
            pending_redaction: self.interaction.pending_redaction(),
            resizing: self.interaction.is_resizing(),
        };
        let options = CompositeOptions::preview(self.zoom.value(), decoration);
        let store = self.store.lock();
        let composite = self.compositor.compose_page(
            &self.renderer,
            self.current_page,
            &store.on_page(self.current_page),
            &options,
        )?;
        Ok(composite.image)
    }

    /// Secure export of the loaded document
    pub fn export(&self) -> Result<ExportArtifact> {
        self.export_with_mode(ExportMode::Secure)
    }

    /// Export in an explicit mode. Overlay output keeps the original content
    /// and is not a redaction.
    pub fn export_with_mode(&self, mode: ExportMode) -> Result<ExportArtifact> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| VeilError::Export("no document loaded".to_string()))?;
        let _guard = ProcessingGuard::acquire(&self.processing)
            .ok_or_else(|| VeilError::Export("busy".to_string()))?;

        // Edits made while the export runs apply to the next export
        let snapshot = self.store.lock().clone();
        let options = ExportOptions {
            scale: self.config.export_scale,
            verify: self.config.verify_output,
        };
        ExportPipeline::new(&self.renderer, &self.codec, &self.compositor, options).run(
            &document.bytes,
            &document.file_name,
            &snapshot,
            mode,
        )
    }
}
