//! Raster image XObjects.
//!
//! PNG data is decoded and stored losslessly as Flate-compressed samples,
//! with the alpha channel split into a soft mask. JPEG data is passed
//! through untouched under `DCTDecode`.

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use veil_core::{CodecError, ImageEncoding};

fn decode(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, CodecError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CodecError::Image(format!("cannot decode {:?}: {e}", format)))
}

fn is_gray(color: ColorType) -> bool {
    matches!(color, ColorType::L8 | ColorType::L16)
}

fn flate_image(width: u32, height: u32, color_space: &str, samples: Vec<u8>) -> Stream {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        },
        samples,
    );
    stream.compress().ok();
    stream
}

fn png_stream(doc: &mut Document, bytes: &[u8]) -> Result<(Stream, u32, u32), CodecError> {
    let decoded = decode(bytes, ImageFormat::Png)?;
    let (width, height) = decoded.dimensions();

    if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        // fully opaque masks are dropped
        let mut stream = flate_image(width, height, "DeviceRGB", rgb);
        if alpha.iter().any(|a| *a != u8::MAX) {
            let mask_id = doc.add_object(flate_image(width, height, "DeviceGray", alpha));
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        return Ok((stream, width, height));
    }

    let stream = if is_gray(decoded.color()) {
        flate_image(width, height, "DeviceGray", decoded.to_luma8().into_raw())
    } else {
        flate_image(width, height, "DeviceRGB", decoded.to_rgb8().into_raw())
    };
    Ok((stream, width, height))
}

fn jpeg_stream(bytes: &[u8]) -> Result<(Stream, u32, u32), CodecError> {
    let decoded = decode(bytes, ImageFormat::Jpeg)?;
    let (width, height) = decoded.dimensions();
    let color_space = if is_gray(decoded.color()) {
        "DeviceGray"
    } else {
        "DeviceRGB"
    };
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes.to_vec(),
    );
    Ok((stream, width, height))
}

/// Add an image XObject to the document and return its id and pixel size
pub fn embed_image(
    doc: &mut Document,
    bytes: &[u8],
    encoding: ImageEncoding,
) -> Result<(ObjectId, u32, u32), CodecError> {
    let (stream, width, height) = match encoding {
        ImageEncoding::Png => png_stream(doc, bytes)?,
        ImageEncoding::Jpeg => jpeg_stream(bytes)?,
    };
    if width == 0 || height == 0 {
        return Err(CodecError::Image("image has no pixels".to_string()));
    }
    let id = doc.add_object(stream);
    log::debug!("[Codec] embedded {:?} image {}x{} as {:?}", encoding, width, height, id);
    Ok((id, width, height))
}
