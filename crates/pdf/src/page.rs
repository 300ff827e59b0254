//! Page tree, page box and resource helpers on top of `lopdf`.

use lopdf::{content::Content, content::Operation, dictionary, Dictionary, Document, Object, ObjectId, Stream};
use veil_core::CodecError;

/// Letter, used when a page carries no usable box
const DEFAULT_BOX: (f32, f32, f32, f32) = (0.0, 0.0, 612.0, 792.0);

/// Nesting limit when walking `Parent` links
const MAX_INHERIT_DEPTH: usize = 32;

pub fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn extract_box_values(arr: &[Object]) -> Option<(f32, f32, f32, f32)> {
    let values: Vec<f32> = arr.iter().filter_map(get_number).collect();
    if values.len() == 4 {
        // boxes may list any two opposite corners
        Some((
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ))
    } else {
        None
    }
}

/// Look up `key` on the page or, failing that, on its ancestors
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Visible page box `(llx, lly, urx, ury)`: CropBox, else MediaBox, inherited
/// through the page tree.
pub fn page_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    for key in [&b"CropBox"[..], &b"MediaBox"[..]] {
        if let Some(Object::Array(arr)) = inherited(doc, page_id, key).map(|o| resolve(doc, o)) {
            if let Some(values) = extract_box_values(arr) {
                return values;
            }
        }
    }
    log::warn!("[Codec] page {:?} has no usable box, assuming Letter", page_id);
    DEFAULT_BOX
}

/// Id of the root `Pages` node
pub fn pages_root(doc: &Document) -> Result<ObjectId, CodecError> {
    let root = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| CodecError::Parse(format!("missing catalog: {e}")))?;
    doc.get_dictionary(root)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| CodecError::Parse(format!("missing page tree: {e}")))
}

/// Append a leaf page under the root `Pages` node
pub fn append_page(
    doc: &mut Document,
    pages_id: ObjectId,
    width: f32,
    height: f32,
) -> Result<ObjectId, CodecError> {
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => Dictionary::new(),
    });

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| CodecError::Write(format!("page tree: {e}")))?;
    let mut kids = match pages.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.clone(),
        _ => Vec::new(),
    };
    kids.push(Object::Reference(page_id));
    let count = pages.get(b"Count").ok().and_then(get_number).unwrap_or(0.0) as i64;
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(count + 1));
    Ok(page_id)
}

/// Copy of the page's effective resources with `Font` and `XObject`
/// resolved inline.
fn resolved_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut resources = match inherited(doc, page_id, b"Resources").map(|o| resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    for category in [&b"Font"[..], &b"XObject"[..]] {
        if let Ok(Object::Reference(id)) = resources.get(category) {
            let inline = doc
                .get_dictionary(*id)
                .cloned()
                .unwrap_or_else(|_| Dictionary::new());
            resources.set(category.to_vec(), Object::Dictionary(inline));
        }
    }
    resources
}

/// Register `target` under `/category/name` in the page's own resources
pub fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    target: ObjectId,
) -> Result<(), CodecError> {
    let mut resources = resolved_resources(doc, page_id);
    let mut entries = match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    entries.set(name.as_bytes().to_vec(), Object::Reference(target));
    resources.set(category.to_vec(), Object::Dictionary(entries));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| CodecError::Write(format!("page {:?}: {e}", page_id)))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Readers concatenate a page's content streams, so each one we write is
/// wrapped in newlines to keep tokens from fusing with a neighbour.
fn content_stream(doc: &mut Document, operations: Vec<Operation>) -> Result<ObjectId, CodecError> {
    let encoded = Content { operations }
        .encode()
        .map_err(|e| CodecError::Write(format!("content stream: {e}")))?;
    let mut data = Vec::with_capacity(encoded.len() + 2);
    data.push(b'\n');
    data.extend_from_slice(&encoded);
    data.push(b'\n');
    let mut stream = Stream::new(Dictionary::new(), data);
    stream.compress().ok();
    Ok(doc.add_object(stream))
}

fn page_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    match doc.get_dictionary(page_id).and_then(|page| page.get(b"Contents")) {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    }
}

/// Append operations after the page's existing content.
///
/// The first append to a page that already has content also puts a `q`
/// stream in front and starts ours with `Q`, so any state the original
/// content leaves behind (CTM, colors) does not leak into the overlay.
pub fn append_operations(
    doc: &mut Document,
    page_id: ObjectId,
    mut operations: Vec<Operation>,
    isolate_existing: bool,
) -> Result<(), CodecError> {
    let mut contents = page_contents(doc, page_id);
    if isolate_existing && !contents.is_empty() {
        let save = content_stream(doc, vec![Operation::new("q", vec![])])?;
        contents.insert(0, Object::Reference(save));
        operations.insert(0, Operation::new("Q", vec![]));
    }
    let stream_id = content_stream(doc, operations)?;
    contents.push(Object::Reference(stream_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| CodecError::Write(format!("page {:?}: {e}", page_id)))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_raw_content(raw: &[u8]) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), raw.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => content_id,
        });
        (doc, page_id)
    }

    fn operators(doc: &Document, page_id: ObjectId) -> Vec<String> {
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn test_appended_streams_do_not_fuse_with_existing_tokens() {
        // no whitespace at either end of the original stream
        let (mut doc, page_id) = page_with_raw_content(b"q 1 0 0 1 5 5 cm Q");
        let ops = vec![Operation::new("re", vec![0.into(), 0.into(), 10.into(), 10.into()]), Operation::new("f", vec![])];
        append_operations(&mut doc, page_id, ops, true).unwrap();

        assert_eq!(operators(&doc, page_id), vec!["q", "q", "cm", "Q", "Q", "re", "f"]);
    }

    #[test]
    fn test_box_corners_normalized() {
        let arr = vec![Object::Real(612.0), Object::Integer(792), Object::Integer(0), Object::Real(0.0)];
        assert_eq!(extract_box_values(&arr), Some((0.0, 0.0, 612.0, 792.0)));
        assert_eq!(extract_box_values(&arr[..3]), None);
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            }),
        );
        assert_eq!(page_box(&doc, page_id), (0.0, 0.0, 300.0, 400.0));
    }
}
