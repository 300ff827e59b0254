//! TrueType font discovery and glyph-metric text measurement.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use veil_core::text_layout::{ApproxMeasure, TextMeasure};

/// Well-known system locations, regular then bold
fn system_font_paths() -> (Vec<PathBuf>, Vec<PathBuf>) {
    let regular = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/Carlito-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    let bold = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
        "/Library/Fonts/Arial Bold.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "C:\\Windows\\Fonts\\arialbd.ttf",
    ];
    (
        regular.iter().map(PathBuf::from).collect(),
        bold.iter().map(PathBuf::from).collect(),
    )
}

fn load_font(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(data) {
        Ok(font) => {
            log::debug!("[Fonts] loaded {:?}", path);
            Some(font)
        }
        Err(e) => {
            log::warn!("[Fonts] cannot parse {:?}: {}", path, e);
            None
        }
    }
}

/// DejaVu Sans, shipped so text renders on hosts without system fonts
static BUNDLED_REGULAR: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
static BUNDLED_BOLD: &[u8] = include_bytes!("../fonts/DejaVuSans-Bold.ttf");

fn bundled_font(data: &'static [u8]) -> Option<FontArc> {
    match FontArc::try_from_slice(data) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("[Fonts] cannot parse bundled font: {}", e);
            None
        }
    }
}

fn first_loadable(preferred: Option<&Path>, fallbacks: &[PathBuf]) -> Option<FontArc> {
    preferred
        .and_then(load_font)
        .or_else(|| fallbacks.iter().find_map(|p| load_font(p)))
}

/// Regular and bold faces used for text annotations.
///
/// Either face may be missing; bold falls back to regular, and with no face
/// at all text cannot be rasterized.
#[derive(Clone, Default)]
pub struct FontSet {
    regular: Option<FontArc>,
    bold: Option<FontArc>,
}

impl FontSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fonts(regular: Option<FontArc>, bold: Option<FontArc>) -> Self {
        Self { regular, bold }
    }

    /// The faces compiled into the binary
    pub fn bundled() -> Self {
        Self {
            regular: bundled_font(BUNDLED_REGULAR),
            bold: bundled_font(BUNDLED_BOLD),
        }
    }

    /// Try the configured paths first, then the usual system locations, then
    /// the bundled faces.
    pub fn discover(regular: Option<&Path>, bold: Option<&Path>) -> Self {
        let (regular_paths, bold_paths) = system_font_paths();
        let set = Self {
            regular: first_loadable(regular, &regular_paths).or_else(|| bundled_font(BUNDLED_REGULAR)),
            bold: first_loadable(bold, &bold_paths).or_else(|| bundled_font(BUNDLED_BOLD)),
        };
        if !set.is_available() {
            log::warn!("[Fonts] no usable font found, text annotations will not be rasterized");
        }
        set
    }

    pub fn is_available(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    pub fn font_for(&self, bold: bool) -> Option<&FontArc> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref().or(self.bold.as_ref())
        }
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

/// Pixel scale whose em square is `em_px` pixels tall.
///
/// `PxScale` measures ascent-to-descent height, while document font sizes
/// are em sizes.
pub fn em_scale(font: &FontArc, em_px: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(em_px * font.height_unscaled() / units),
        _ => PxScale::from(em_px),
    }
}

/// Advance width of `line` in pixels, kerning included
pub fn line_advance(font: &FontArc, scale: PxScale, line: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for c in line.chars() {
        let glyph = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph);
        }
        width += scaled.h_advance(glyph);
        previous = Some(glyph);
    }
    width
}

impl TextMeasure for FontSet {
    fn line_width(&self, line: &str, font_size: f32, bold: bool) -> f32 {
        match self.font_for(bold) {
            Some(font) => line_advance(font, em_scale(font, font_size), line),
            None => ApproxMeasure.line_width(line, font_size, bold),
        }
    }
}
