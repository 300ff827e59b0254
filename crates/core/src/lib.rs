//! Core model for redaction editing: coordinates, annotations, the annotation
//! store and the pointer-driven interaction state machine.

pub mod annotation;
pub mod document;
pub mod geometry;
pub mod interaction;
pub mod store;
pub mod text_layout;

pub use annotation::{
    AnnotationId, AnnotationKind, AnnotationRef, FillColor, ImageAnnotation, ImageEncoding,
    RedactionBox, Rgb, TextAnnotation,
};
pub use document::{
    CodecDocument, CodecError, DocumentCodec, PageRenderer, RenderError, TextStyle,
};
pub use geometry::{CodecRect, Point, Rect, Size, Zoom};
pub use interaction::{Interaction, InteractionState, Outcome, ResizeHandle, Tool};
pub use store::{AnnotationCounts, AnnotationStore, PageAnnotations};
pub use text_layout::{ApproxMeasure, TextMeasure};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Unreadable, invalid or oversized input document
    #[error("failed to load document: {0}")]
    Load(String),
    /// A page failed to rasterize
    #[error("failed to render {0}")]
    Render(#[from] RenderError),
    /// Codec load/save/embed failure or undecodable annotation data
    #[error("export failed: {0}")]
    Export(String),
    /// Input rejected before it reached the core
    #[error("invalid input: {0}")]
    Validation(String),
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        CoreError::Export(err.to_string())
    }
}
