//! Veil: mark up a PDF with redaction boxes, text and images, then export a
//! flattened copy in which nothing under a redaction survives.

pub mod config;
pub mod export;
pub mod job;
pub mod pdfium;
pub mod session;
pub mod validation;

pub use config::{load_config, save_config, AppConfig, ConfigError, TextTemplate};
pub use export::{
    output_file_name, ExportArtifact, ExportMode, ExportOptions, ExportPipeline, ExportReport,
    SkippedAnnotationInfo, SkippedPage,
};
pub use job::ExportJob;
pub use pdfium::PdfiumRenderer;
pub use session::{EditorSession, ProcessingGuard};

pub use veil_pdf::LopdfCodec;
pub use veil_render::{Compositor, FontSet};
pub use veil_verify::{verify_flattened, VerifyResult};

pub type VeilError = veil_core::CoreError;
pub type Result<T> = std::result::Result<T, VeilError>;
