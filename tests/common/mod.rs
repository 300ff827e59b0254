#![allow(dead_code)]

use std::io::Read;

use flate2::read::ZlibDecoder;
use image::{Rgba, RgbaImage, RgbImage};
use lopdf::{Document, Object};
use veil_core::{
    CodecDocument, CodecRect, DocumentCodec, PageRenderer, RenderError, Rgb, Size, TextStyle,
};
use veil::{LopdfCodec, Result};

/// Gray bar standing in for printed text, in document units
pub const INK: (f32, f32, f32, f32) = (120.0, 120.0, 100.0, 10.0);
pub const INK_COLOR: [u8; 4] = [64, 64, 64, 255];

/// Deterministic renderer: white pages with one gray bar each
#[derive(Default)]
pub struct FakeRenderer {
    pages: Vec<Size>,
    fail_page: Option<u32>,
    claimed_pages: Option<u32>,
}

impl FakeRenderer {
    pub fn failing_on(page_number: u32) -> Self {
        Self {
            fail_page: Some(page_number),
            ..Default::default()
        }
    }

    /// Opens any bytes and reports `page_count` pages, like pdfium on files
    /// lopdf cannot parse
    pub fn claiming(page_count: u32) -> Self {
        Self {
            claimed_pages: Some(page_count),
            ..Default::default()
        }
    }
}

impl PageRenderer for FakeRenderer {
    fn load(&mut self, bytes: &[u8]) -> Result<u32> {
        if let Some(page_count) = self.claimed_pages {
            self.pages = vec![Size::new(400.0, 300.0); page_count as usize];
            return Ok(page_count);
        }
        let document = LopdfCodec.load(bytes)?;
        self.pages = (1..=document.page_count())
            .map(|page| document.page_size(page))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self.pages.len() as u32)
    }

    fn render_page(&self, page_number: u32, scale: f32) -> std::result::Result<RgbaImage, RenderError> {
        if self.fail_page == Some(page_number) {
            return Err(RenderError::new(page_number, "renderer crashed"));
        }
        let size = self.page_dimensions(page_number, scale)?;
        let mut image = RgbaImage::from_pixel(
            size.width.round() as u32,
            size.height.round() as u32,
            Rgba([255, 255, 255, 255]),
        );
        let (x, y, w, h) = INK;
        for py in (y * scale) as u32..((y + h) * scale) as u32 {
            for px in (x * scale) as u32..((x + w) * scale) as u32 {
                if px < image.width() && py < image.height() {
                    image.put_pixel(px, py, Rgba(INK_COLOR));
                }
            }
        }
        Ok(image)
    }

    fn page_dimensions(&self, page_number: u32, scale: f32) -> std::result::Result<Size, RenderError> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .map(|size| size.scaled(scale))
            .ok_or_else(|| RenderError::new(page_number, "page out of range"))
    }
}

/// A PDF with real text on each page
pub fn sample_pdf(page_count: u32, size: Size) -> Vec<u8> {
    let mut doc = LopdfCodec.create_empty();
    let style = TextStyle {
        font_size: 12.0,
        color: Rgb::BLACK,
        bold: false,
    };
    for page in 1..=page_count {
        doc.add_page(size).unwrap();
        doc.draw_text(page, veil_core::Point::new(120.0, size.height - 130.0), "secret account 4711", &style)
            .unwrap();
        doc.draw_rectangle(
            page,
            CodecRect {
                x: 20.0,
                y: 20.0,
                width: 10.0,
                height: 10.0,
            },
            Rgb::new(200, 0, 0),
        )
        .unwrap();
    }
    doc.serialize().unwrap()
}

pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Drop alpha from an opaque raster, for comparison with decoded pages
pub fn opaque_rgb(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        image::Rgb([r, g, b])
    })
}

/// Decode the single image painted on `page_number` of a flattened output
pub fn page_raster(bytes: &[u8], page_number: u32) -> RgbImage {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page_number];
    let page = doc.get_dictionary(page_id).unwrap();
    let (_, resources) = doc.dereference(page.get(b"Resources").unwrap()).unwrap();
    let xobjects = resources.as_dict().unwrap().get(b"XObject").unwrap();
    let (_, xobjects) = doc.dereference(xobjects).unwrap();
    let (_, image) = xobjects.as_dict().unwrap().iter().next().unwrap();
    let (_, image) = doc.dereference(image).unwrap();
    let stream = image.as_stream().unwrap();

    let width = stream.dict.get(b"Width").and_then(Object::as_i64).unwrap() as u32;
    let height = stream.dict.get(b"Height").and_then(Object::as_i64).unwrap() as u32;
    // lopdf refuses to decompress image streams, so inflate the samples here
    let samples = if stream.dict.has(b"Filter") {
        let mut inflated = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut inflated)
            .unwrap();
        inflated
    } else {
        stream.content.clone()
    };
    RgbImage::from_raw(width, height, samples).unwrap()
}
