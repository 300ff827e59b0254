//! `DocumentCodec` on top of `lopdf`.
//!
//! Geometry handed to a [`PdfDocument`] is in display space with a
//! bottom-left origin. Page rotation and box offsets are folded into a `cm`
//! prefix on every overlay, so callers never see them.

mod page;
mod raster;

use std::collections::{HashMap, HashSet};

use lopdf::{content::Operation, dictionary, Document, Object, ObjectId, StringFormat};
use veil_core::{
    CodecDocument, CodecError, CodecRect, DocumentCodec, ImageEncoding, Point, Rgb, Size, TextStyle,
};

pub use page::{get_number, page_box};

const FONT_REGULAR: &str = "VeilHelv";
const FONT_BOLD: &str = "VeilHelvB";

/// Loads and creates documents with `lopdf`
#[derive(Clone, Copy, Debug, Default)]
pub struct LopdfCodec;

impl DocumentCodec for LopdfCodec {
    type Document = PdfDocument;

    fn load(&self, bytes: &[u8]) -> Result<PdfDocument, CodecError> {
        let doc = Document::load_mem(bytes).map_err(|e| CodecError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(CodecError::Parse("document is encrypted".to_string()));
        }
        PdfDocument::from_document(doc)
    }

    fn create_empty(&self) -> PdfDocument {
        PdfDocument::new()
    }
}

/// Handle for an embedded image XObject
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfImage {
    id: ObjectId,
    name: String,
}

impl PdfImage {
    pub fn object_id(&self) -> ObjectId {
        self.id
    }
}

pub struct PdfDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    fonts: HashMap<bool, ObjectId>,
    image_count: usize,
    /// Pages whose original content is already wrapped in `q`/`Q`
    isolated: HashSet<ObjectId>,
}

impl PdfDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            fonts: HashMap::new(),
            image_count: 0,
            isolated: HashSet::new(),
        }
    }

    fn from_document(doc: Document) -> Result<Self, CodecError> {
        let pages_id = page::pages_root(&doc)?;
        let page_ids = doc.get_pages().into_values().collect();
        Ok(Self {
            doc,
            pages_id,
            page_ids,
            fonts: HashMap::new(),
            image_count: 0,
            isolated: HashSet::new(),
        })
    }

    /// Underlying `lopdf` document, for inspection
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId, CodecError> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.page_ids.get(index as usize))
            .copied()
            .ok_or(CodecError::NoSuchPage(page_number))
    }

    fn rotation(&self, page_id: ObjectId) -> i64 {
        let mut current = self.doc.get_dictionary(page_id).ok();
        while let Some(dict) = current {
            if let Ok(Object::Integer(rotate)) = dict.get(b"Rotate") {
                return rotate.rem_euclid(360);
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|parent| self.doc.get_dictionary(parent))
                .ok();
        }
        0
    }

    /// Displayed size and the matrix from display space to user space
    fn display_space(&self, page_id: ObjectId) -> (Size, [f32; 6]) {
        let (llx, lly, urx, ury) = page_box(&self.doc, page_id);
        let (w, h) = (urx - llx, ury - lly);
        match self.rotation(page_id) {
            90 => (Size::new(h, w), [0.0, 1.0, -1.0, 0.0, llx + w, lly]),
            180 => (Size::new(w, h), [-1.0, 0.0, 0.0, -1.0, llx + w, lly + h]),
            270 => (Size::new(h, w), [0.0, -1.0, 1.0, 0.0, llx, lly + h]),
            _ => (Size::new(w, h), [1.0, 0.0, 0.0, 1.0, llx, lly]),
        }
    }

    /// Wrap `body` in a saved graphics state mapped to display space and
    /// append it to the page.
    fn append(&mut self, page_id: ObjectId, body: Vec<Operation>) -> Result<(), CodecError> {
        let (_, matrix) = self.display_space(page_id);
        let mut operations = vec![Operation::new("q", vec![])];
        if matrix != [1.0, 0.0, 0.0, 1.0, 0.0, 0.0] {
            operations.push(Operation::new("cm", matrix.iter().map(|v| Object::Real(*v)).collect()));
        }
        operations.extend(body);
        operations.push(Operation::new("Q", vec![]));

        let isolate = self.isolated.insert(page_id);
        page::append_operations(&mut self.doc, page_id, operations, isolate)
    }

    fn font(&mut self, bold: bool) -> (ObjectId, &'static str) {
        let name = if bold { FONT_BOLD } else { FONT_REGULAR };
        let doc = &mut self.doc;
        let id = *self.fonts.entry(bold).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => if bold { "Helvetica-Bold" } else { "Helvetica" },
                "Encoding" => "WinAnsiEncoding",
            })
        });
        (id, name)
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn color_operation(operator: &str, color: Rgb) -> Operation {
    let (r, g, b) = color.to_unit();
    Operation::new(
        operator,
        vec![Object::Real(r), Object::Real(g), Object::Real(b)],
    )
}

/// Latin-1 subset of WinAnsi; anything else becomes `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

impl CodecDocument for PdfDocument {
    type ImageRef = PdfImage;

    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page_size(&self, page_number: u32) -> Result<Size, CodecError> {
        let page_id = self.page_id(page_number)?;
        Ok(self.display_space(page_id).0)
    }

    fn add_page(&mut self, size: Size) -> Result<u32, CodecError> {
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(CodecError::Write(format!(
                "invalid page size {}x{}",
                size.width, size.height
            )));
        }
        let page_id = page::append_page(&mut self.doc, self.pages_id, size.width, size.height)?;
        self.page_ids.push(page_id);
        Ok(self.page_count())
    }

    fn draw_rectangle(&mut self, page_number: u32, rect: CodecRect, fill: Rgb) -> Result<(), CodecError> {
        let page_id = self.page_id(page_number)?;
        log::debug!(
            "[Codec] rectangle on page {}: x={}, y={}, w={}, h={}",
            page_number,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        self.append(
            page_id,
            vec![
                color_operation("rg", fill),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(rect.x),
                        Object::Real(rect.y),
                        Object::Real(rect.width),
                        Object::Real(rect.height),
                    ],
                ),
                Operation::new("f", vec![]),
            ],
        )
    }

    fn draw_text(
        &mut self,
        page_number: u32,
        origin: Point,
        text: &str,
        style: &TextStyle,
    ) -> Result<(), CodecError> {
        let page_id = self.page_id(page_number)?;
        let (font_id, font_name) = self.font(style.bold);
        page::add_resource(&mut self.doc, page_id, b"Font", font_name, font_id)?;
        self.append(
            page_id,
            vec![
                color_operation("rg", style.color),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(font_name.as_bytes().to_vec()), Object::Real(style.font_size)],
                ),
                Operation::new("Td", vec![Object::Real(origin.x), Object::Real(origin.y)]),
                Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
                Operation::new("ET", vec![]),
            ],
        )
    }

    fn embed_raster_image(&mut self, bytes: &[u8], format: ImageEncoding) -> Result<PdfImage, CodecError> {
        let (id, _, _) = raster::embed_image(&mut self.doc, bytes, format)?;
        self.image_count += 1;
        Ok(PdfImage {
            id,
            name: format!("VeilIm{}", self.image_count),
        })
    }

    fn draw_image(&mut self, page_number: u32, image: &PdfImage, rect: CodecRect) -> Result<(), CodecError> {
        let page_id = self.page_id(page_number)?;
        page::add_resource(&mut self.doc, page_id, b"XObject", &image.name, image.id)?;
        self.append(
            page_id,
            vec![
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(rect.width),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(rect.height),
                        Object::Real(rect.x),
                        Object::Real(rect.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]),
            ],
        )
    }

    fn serialize(&mut self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| CodecError::Write(e.to_string()))?;
        log::info!("[Codec] serialized {} pages, {} bytes", self.page_count(), bytes.len());
        Ok(bytes)
    }
}
