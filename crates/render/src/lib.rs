//! Rasterizes pages with their annotations, for the live preview and for
//! the flattened export.

pub mod compositor;
pub mod fonts;

pub use compositor::{Composite, CompositeOptions, Compositor, Decoration, SkippedAnnotation};
pub use fonts::FontSet;
