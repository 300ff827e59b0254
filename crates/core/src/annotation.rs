//! Annotation records: redaction boxes, text and images.
//!
//! All coordinates are document space (see [`crate::geometry`]). Page numbers
//! are 1-based and are only checked against the real page count at export.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::{CoreError, Result};

/// Redaction rectangles smaller than this on either axis are rejected as stray clicks
pub const MIN_REDACTION_SIZE: f32 = 10.0;
/// Default edge length of a freshly placed image
pub const DEFAULT_IMAGE_SIZE: f32 = 150.0;
/// Default font size for new text annotations
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// The three annotation kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Redaction,
    Text,
    Image,
}

impl AnnotationKind {
    fn prefix(self) -> &'static str {
        match self {
            AnnotationKind::Redaction => "redact",
            AnnotationKind::Text => "text",
            AnnotationKind::Image => "image",
        }
    }
}

/// Opaque annotation identity: kind prefix, millisecond timestamp and a random suffix
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn generate(kind: AnnotationKind) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("{}-{}-{:08x}", kind.prefix(), millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference to an annotation of any kind
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationRef {
    pub kind: AnnotationKind,
    pub id: AnnotationId,
}

impl AnnotationRef {
    pub fn new(kind: AnnotationKind, id: AnnotationId) -> Self {
        Self { kind, id }
    }
}

/// 24-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Components in the 0-1 range used by PDF color operators
    pub fn to_unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn to_rgba_u8(&self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgb::parse_hex(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {raw}")))
    }
}

/// Fill of a redaction box
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillColor {
    #[default]
    Black,
    White,
    Custom(Rgb),
}

impl FillColor {
    pub fn resolve(&self) -> Rgb {
        match self {
            FillColor::Black => Rgb::BLACK,
            FillColor::White => Rgb::WHITE,
            FillColor::Custom(rgb) => *rgb,
        }
    }
}

impl FromStr for FillColor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(FillColor::Black),
            "white" => Ok(FillColor::White),
            other => Rgb::parse_hex(other)
                .map(FillColor::Custom)
                .ok_or_else(|| CoreError::Validation(format!("invalid fill color: {s}"))),
        }
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillColor::Black => f.write_str("black"),
            FillColor::White => f.write_str("white"),
            FillColor::Custom(rgb) => f.write_str(&rgb.to_hex()),
        }
    }
}

impl Serialize for FillColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FillColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A user-drawn rectangle whose content is destroyed on secure export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionBox {
    pub id: AnnotationId,
    pub page_number: u32,
    pub rect: Rect,
    #[serde(default)]
    pub fill: FillColor,
}

impl RedactionBox {
    pub fn new(page_number: u32, rect: Rect, fill: FillColor) -> Self {
        Self {
            id: AnnotationId::generate(AnnotationKind::Redaction),
            page_number,
            rect,
            fill,
        }
    }

    /// Build from a completed drag, or `None` if either side is not larger
    /// than [`MIN_REDACTION_SIZE`].
    pub fn from_drag(page_number: u32, rect: Rect) -> Option<Self> {
        if rect.width > MIN_REDACTION_SIZE && rect.height > MIN_REDACTION_SIZE {
            Some(Self::new(page_number, rect, FillColor::Black))
        } else {
            None
        }
    }
}

/// Multi-line overlay text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    pub id: AnnotationId,
    pub page_number: u32,
    /// Top-left anchor
    pub position: Point,
    pub text: String,
    pub font_size: f32,
    pub color: Rgb,
    #[serde(default)]
    pub bold: bool,
}

impl TextAnnotation {
    pub fn new(page_number: u32, position: Point, text: impl Into<String>) -> Self {
        Self {
            id: AnnotationId::generate(AnnotationKind::Text),
            page_number,
            position,
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            color: Rgb::BLACK,
            bold: false,
        }
    }

    pub fn with_style(mut self, font_size: f32, color: Rgb, bold: bool) -> Result<Self> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(CoreError::Validation(format!("font size must be positive, got {font_size}")));
        }
        self.font_size = font_size;
        self.color = color;
        self.bold = bold;
        Ok(self)
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Empty or whitespace-only text is discarded when editing ends
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Encoding of the raw bytes carried by an [`ImageAnnotation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// Sniff PNG or JPEG from the leading magic bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(ImageEncoding::Png),
            image::ImageFormat::Jpeg => Some(ImageEncoding::Jpeg),
            _ => None,
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            ImageEncoding::Png => image::ImageFormat::Png,
            ImageEncoding::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// A placed raster image
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotation {
    pub id: AnnotationId,
    pub page_number: u32,
    pub rect: Rect,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
    pub lock_aspect_ratio: bool,
}

impl ImageAnnotation {
    /// Wrap encoded PNG/JPEG bytes; anything else is rejected.
    pub fn new(page_number: u32, rect: Rect, data: Vec<u8>) -> Result<Self> {
        let encoding = ImageEncoding::detect(&data)
            .ok_or_else(|| CoreError::Validation("image must be PNG or JPEG".to_string()))?;
        Ok(Self {
            id: AnnotationId::generate(AnnotationKind::Image),
            page_number,
            rect,
            encoding,
            data,
            lock_aspect_ratio: true,
        })
    }

    /// Place a default-sized image centered on `at`, clamped to the page's
    /// top-left quadrant.
    pub fn centered_at(page_number: u32, at: Point, data: Vec<u8>) -> Result<Self> {
        let half = DEFAULT_IMAGE_SIZE / 2.0;
        let rect = Rect::new(
            (at.x - half).max(0.0),
            (at.y - half).max(0.0),
            DEFAULT_IMAGE_SIZE,
            DEFAULT_IMAGE_SIZE,
        );
        Self::new(page_number, rect, data)
    }
}

impl fmt::Debug for ImageAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAnnotation")
            .field("id", &self.id)
            .field("page_number", &self.page_number)
            .field("rect", &self.rect)
            .field("encoding", &self.encoding)
            .field("data_len", &self.data.len())
            .field("lock_aspect_ratio", &self.lock_aspect_ratio)
            .finish()
    }
}
