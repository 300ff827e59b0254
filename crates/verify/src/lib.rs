//! Post-export checks that a flattened document really is flat.
//!
//! A flattened page may only paint one image XObject: its content stream
//! holds nothing but `q`, `cm`, `Do` and `Q`, it carries no fonts, no form
//! XObjects and no annotations, and the catalog has no interactive form.

use lopdf::{content::Content, Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

const ALLOWED_OPERATORS: [&str; 4] = ["q", "Q", "cm", "Do"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOptions {
    /// Fail unless the output has exactly this many pages
    pub expected_pages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIssue {
    /// `None` for document-level problems
    pub page: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub ok: bool,
    pub page_count: u32,
    pub issues: Vec<VerifyIssue>,
}

impl VerifyResult {
    /// Issues joined into one line, for error messages
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|issue| match issue.page {
                Some(page) => format!("page {}: {}", page, issue.message),
                None => issue.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn verify_flattened(bytes: &[u8]) -> VerifyResult {
    verify_flattened_with(bytes, &VerifyOptions::default())
}

pub fn verify_flattened_with(bytes: &[u8], options: &VerifyOptions) -> VerifyResult {
    let mut issues = Vec::new();
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            return VerifyResult {
                ok: false,
                page_count: 0,
                issues: vec![VerifyIssue {
                    page: None,
                    message: format!("cannot parse output: {e}"),
                }],
            };
        }
    };

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    if let Some(expected) = options.expected_pages {
        if expected != page_count {
            issues.push(VerifyIssue {
                page: None,
                message: format!("expected {expected} pages, found {page_count}"),
            });
        }
    }
    if page_count == 0 {
        issues.push(VerifyIssue {
            page: None,
            message: "document has no pages".to_string(),
        });
    }
    if has_acro_form(&doc) {
        issues.push(VerifyIssue {
            page: None,
            message: "catalog carries an interactive form".to_string(),
        });
    }

    for (page_number, page_id) in pages {
        for message in check_page(&doc, page_id) {
            issues.push(VerifyIssue {
                page: Some(page_number),
                message,
            });
        }
    }

    let ok = issues.is_empty();
    if ok {
        log::info!("[Verify] {} pages are flat", page_count);
    } else {
        for issue in &issues {
            log::warn!("[Verify] {:?}: {}", issue.page, issue.message);
        }
    }
    VerifyResult {
        ok,
        page_count,
        issues,
    }
}

fn has_acro_form(doc: &Document) -> bool {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|root| doc.get_dictionary(root))
        .map(|catalog| catalog.has(b"AcroForm"))
        .unwrap_or(false)
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

fn check_page(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let mut problems = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return vec!["page object is not a dictionary".to_string()];
    };

    if page.has(b"Annots") {
        problems.push("page has annotations".to_string());
    }

    let resources = page.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r));
    let fonts = resources
        .and_then(|r| r.get(b"Font").ok())
        .and_then(|f| resolve_dict(doc, f))
        .map(|f| f.len())
        .unwrap_or(0);
    if fonts > 0 {
        problems.push(format!("page references {fonts} font(s)"));
    }

    let xobjects = resources
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| resolve_dict(doc, x));
    let mut images = 0;
    for (name, obj) in xobjects.into_iter().flat_map(|x| x.iter()) {
        let subtype = obj
            .as_reference()
            .and_then(|id| doc.get_object(id))
            .and_then(Object::as_stream)
            .and_then(|stream| stream.dict.get(b"Subtype"))
            .and_then(Object::as_name);
        match subtype {
            Ok(b"Image") => images += 1,
            _ => problems.push(format!(
                "XObject {} is not an image",
                String::from_utf8_lossy(name)
            )),
        }
    }
    if images != 1 {
        problems.push(format!("expected exactly one image, found {images}"));
    }

    match doc.get_page_content(page_id).map(|data| Content::decode(&data)) {
        Ok(Ok(content)) => {
            let foreign: Vec<&str> = content
                .operations
                .iter()
                .map(|op| op.operator.as_str())
                .filter(|op| !ALLOWED_OPERATORS.contains(op))
                .collect();
            if !foreign.is_empty() {
                problems.push(format!("content paints more than an image: {}", foreign.join(" ")));
            }
            let draws = content.operations.iter().filter(|op| op.operator == "Do").count();
            if draws != 1 {
                problems.push(format!("expected one image draw, found {draws}"));
            }
        }
        _ => problems.push("content stream cannot be decoded".to_string()),
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::{CodecDocument, CodecRect, DocumentCodec, ImageEncoding, Point, Rgb, Size, TextStyle};
    use veil_pdf::LopdfCodec;

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn flat_document(pages: u32) -> Vec<u8> {
        let mut doc = LopdfCodec.create_empty();
        for page in 1..=pages {
            doc.add_page(Size::new(100.0, 100.0)).unwrap();
            let image = doc.embed_raster_image(&png(), ImageEncoding::Png).unwrap();
            doc.draw_image(page, &image, CodecRect { x: 0.0, y: 0.0, width: 100.0, height: 100.0 })
                .unwrap();
        }
        doc.serialize().unwrap()
    }

    #[test]
    fn test_flattened_output_passes() {
        let result = verify_flattened_with(&flat_document(3), &VerifyOptions { expected_pages: Some(3) });
        assert!(result.ok, "{}", result.summary());
        assert_eq!(result.page_count, 3);
    }

    #[test]
    fn test_page_count_mismatch() {
        let result = verify_flattened_with(&flat_document(2), &VerifyOptions { expected_pages: Some(3) });
        assert!(!result.ok);
        assert_eq!(result.issues[0].page, None);
    }

    #[test]
    fn test_text_on_page_fails() {
        let mut doc = LopdfCodec.load(&flat_document(1)).unwrap();
        let style = TextStyle {
            font_size: 10.0,
            color: Rgb::BLACK,
            bold: false,
        };
        doc.draw_text(1, Point::new(10.0, 10.0), "leak", &style).unwrap();
        let result = verify_flattened(&doc.serialize().unwrap());
        assert!(!result.ok);
        let summary = result.summary();
        assert!(summary.contains("font"), "{summary}");
        assert!(summary.contains("Tj"), "{summary}");
    }

    #[test]
    fn test_missing_image_fails() {
        let mut doc = LopdfCodec.create_empty();
        doc.add_page(Size::new(50.0, 50.0)).unwrap();
        let result = verify_flattened(&doc.serialize().unwrap());
        assert!(!result.ok);
        assert!(result.summary().contains("exactly one image"));
    }

    #[test]
    fn test_garbage_fails() {
        let result = verify_flattened(b"%PDF-1.5 nonsense");
        assert!(!result.ok);
        assert_eq!(result.page_count, 0);
    }
}
