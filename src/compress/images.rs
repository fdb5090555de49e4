//! Re-encoding of raster images embedded in PDF pages
//!
//! Images are decoded with the `image` crate, shrunk to the preset's pixel cap,
//! and written back as DCTDecode (opaque) or FlateDecode (transparent) streams.
//! Anything that cannot be decoded is left exactly as it was.

use std::collections::HashSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::model::QualityPreset;

/// Parent chains deeper than this are treated as broken
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Replacement data for one image stream
#[derive(Debug)]
struct ReencodedImage {
    width: u32,
    height: u32,
    filter: &'static str,
    data: Vec<u8>,
}

/// Recompress every image XObject referenced by a page.
///
/// `seen` carries image ids across pages so shared images are only re-encoded once.
/// Returns the number of images replaced.
pub fn optimize_page_images(
    doc: &mut Document,
    page_id: ObjectId,
    preset: &QualityPreset,
    seen: &mut HashSet<ObjectId>,
) -> usize {
    let mut replaced = 0;

    for image_id in page_image_ids(doc, page_id) {
        if !seen.insert(image_id) {
            continue;
        }

        let reencoded = match doc.get_object(image_id) {
            Ok(Object::Stream(stream)) => reencode_image(doc, stream, preset),
            _ => continue,
        };

        match reencoded {
            Ok(image) => {
                if let Ok(Object::Stream(stream)) = doc.get_object_mut(image_id) {
                    log::debug!(
                        "Image {:?}: {} -> {} bytes ({}x{}, {})",
                        image_id,
                        stream.content.len(),
                        image.data.len(),
                        image.width,
                        image.height,
                        image.filter
                    );
                    apply(stream, image);
                    replaced += 1;
                }
            }
            Err(e) => log::debug!("Leaving image {:?} unchanged: {}", image_id, e),
        }
    }

    replaced
}

fn apply(stream: &mut Stream, image: ReencodedImage) {
    stream.dict.set("Width", Object::Integer(image.width as i64));
    stream.dict.set("Height", Object::Integer(image.height as i64));
    stream.dict.set("BitsPerComponent", Object::Integer(8));
    stream.dict.set("Filter", Object::Name(image.filter.as_bytes().to_vec()));
    stream.dict.remove(b"DecodeParms");
    stream.set_content(image.data);
}

/// Image XObjects named in the page's (possibly inherited) resources
fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Some(resources) = page_resources(doc, page_id) else {
        return Vec::new();
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| resolve_dict(doc, o)) else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, value)| match value {
            Object::Reference(id) => Some(*id),
            _ => None,
        })
        .filter(|id| match doc.get_object(*id) {
            Ok(Object::Stream(stream)) => name_of(stream.dict.get(b"Subtype").ok()) == Some("Image"),
            _ => false,
        })
        .collect()
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_object(page_id).ok().and_then(|o| resolve_dict(doc, o))?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        node = match node.get(b"Parent") {
            Ok(parent) => resolve_dict(doc, parent)?,
            Err(_) => return None,
        };
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

fn name_of(obj: Option<&Object>) -> Option<&str> {
    match obj? {
        Object::Name(name) => std::str::from_utf8(name).ok(),
        _ => None,
    }
}

/// The stream's only filter, if any. Filter chains are not supported.
fn single_filter(stream: &Stream) -> Result<Option<String>, String> {
    match stream.dict.get(b"Filter") {
        Err(_) => Ok(None),
        Ok(Object::Name(name)) => Ok(Some(String::from_utf8_lossy(name).into_owned())),
        Ok(Object::Array(filters)) => match filters.as_slice() {
            [] => Ok(None),
            [Object::Name(name)] => Ok(Some(String::from_utf8_lossy(name).into_owned())),
            _ => Err("filter chain".to_string()),
        },
        Ok(_) => Err("malformed /Filter".to_string()),
    }
}

/// Number of colour components in an image's colour space
fn color_components(doc: &Document, stream: &Stream) -> Result<u8, String> {
    let obj = stream
        .dict
        .get(b"ColorSpace")
        .map_err(|_| "missing /ColorSpace".to_string())?;
    components_of(doc, obj)
}

fn components_of(doc: &Document, obj: &Object) -> Result<u8, String> {
    let obj = resolve(doc, obj).ok_or("dangling /ColorSpace reference")?;
    match obj {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(3),
            b"DeviceCMYK" | b"CMYK" => Ok(4),
            other => Err(format!("colour space {}", String::from_utf8_lossy(other))),
        },
        Object::Array(items) => match items.first() {
            Some(Object::Name(family)) if family == b"ICCBased" => {
                let profile = items
                    .get(1)
                    .and_then(|o| resolve_dict(doc, o))
                    .ok_or("ICCBased without profile")?;
                match profile.get(b"N") {
                    Ok(Object::Integer(n)) if (1..=4).contains(n) => Ok(*n as u8),
                    _ => Err("ICCBased profile without /N".to_string()),
                }
            }
            Some(Object::Name(family)) if family == b"CalGray" => Ok(1),
            Some(Object::Name(family)) if family == b"CalRGB" => Ok(3),
            Some(Object::Name(family)) => {
                Err(format!("colour space {}", String::from_utf8_lossy(family)))
            }
            _ => Err("malformed /ColorSpace".to_string()),
        },
        _ => Err("malformed /ColorSpace".to_string()),
    }
}

fn dimension(stream: &Stream, key: &[u8]) -> Result<u32, String> {
    match stream.dict.get(key) {
        Ok(Object::Integer(n)) if *n > 0 => u32::try_from(*n).map_err(|e| e.to_string()),
        _ => Err(format!("missing /{}", String::from_utf8_lossy(key))),
    }
}

/// Decode an image stream into pixels with one or three 8-bit channels
fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, String> {
    if matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err("stencil mask".to_string());
    }

    let components = color_components(doc, stream)?;
    if components != 1 && components != 3 {
        return Err(format!("{} colour components", components));
    }

    let filter = single_filter(stream)?;
    match filter.as_deref() {
        Some("DCTDecode") => {
            let img = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| format!("JPEG decode failed: {}", e))?;
            Ok(normalize(img, components))
        }
        None | Some("FlateDecode") => {
            let bits = match stream.dict.get(b"BitsPerComponent") {
                Ok(Object::Integer(bits)) => *bits,
                _ => return Err("missing /BitsPerComponent".to_string()),
            };
            if bits != 8 {
                return Err(format!("{} bits per component", bits));
            }

            let width = dimension(stream, b"Width")?;
            let height = dimension(stream, b"Height")?;
            let samples = if filter.is_some() {
                stream
                    .decompressed_content()
                    .map_err(|e| format!("Flate decode failed: {}", e))?
            } else {
                stream.content.clone()
            };

            let expected = (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(components as usize))
                .ok_or_else(|| "image too large".to_string())?;
            if samples.len() < expected {
                return Err(format!(
                    "{} sample bytes, expected {}",
                    samples.len(),
                    expected
                ));
            }
            let samples = samples[..expected].to_vec();

            if components == 1 {
                GrayImage::from_raw(width, height, samples)
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| "bad grayscale buffer".to_string())
            } else {
                RgbImage::from_raw(width, height, samples)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| "bad RGB buffer".to_string())
            }
        }
        Some(other) => Err(format!("unsupported filter {}", other)),
    }
}

/// Convert to 8-bit luma or RGB so the channel count matches the PDF colour space
fn normalize(img: DynamicImage, components: u8) -> DynamicImage {
    if components == 1 {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Soft masks and colour-key or stencil masks; decoded samples never carry alpha
fn is_transparent(stream: &Stream) -> bool {
    stream.dict.has(b"SMask") || stream.dict.has(b"Mask")
}

/// Shrink so the longest side is at most `max_dimension`, keeping the aspect ratio
pub fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_dimension {
        return img;
    }
    img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

fn reencode_image(
    doc: &Document,
    stream: &Stream,
    preset: &QualityPreset,
) -> Result<ReencodedImage, String> {
    let img = decode_image(doc, stream)?;
    let transparent = is_transparent(stream);
    let img = downscale(img, preset.max_image_dimension());
    let (width, height) = (img.width(), img.height());

    if transparent {
        Ok(ReencodedImage {
            width,
            height,
            filter: "FlateDecode",
            data: encode_flate(&img)?,
        })
    } else {
        Ok(ReencodedImage {
            width,
            height,
            filter: "DCTDecode",
            data: encode_jpeg(&img, preset.image_quality)?,
        })
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let quality = quality.clamp(1, 100);
    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);

    match img {
        DynamicImage::ImageLuma8(gray) => encoder.encode(
            gray.as_raw(),
            gray.width(),
            gray.height(),
            ExtendedColorType::L8,
        ),
        _ => {
            let rgb = img.to_rgb8();
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        }
    }
    .map_err(|e| format!("JPEG encoding error: {}", e))?;

    Ok(output)
}

fn encode_flate(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let samples = match img {
        DynamicImage::ImageLuma8(gray) => gray.as_raw().clone(),
        _ => img.to_rgb8().into_raw(),
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&samples)
        .map_err(|e| format!("Flate encoding error: {}", e))?;
    encoder
        .finish()
        .map_err(|e| format!("Flate encoding error: {}", e))
}
