use std::io::Read;

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::CodecError;
use crate::pdf::{
    color_model, color_space_name, dict_u32, filter_names, resolve, resolve_dict, ColorModel,
};

/// How the image was stored in the source PDF
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    /// `DCTDecode`
    Jpeg,
    /// `FlateDecode`
    Flate,
    /// No filter
    Raw,
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub source: SourceEncoding,
    /// Sample layout declared by the stream's color space
    pub color: ColorModel,
}

/// Decode an image XObject stream into pixels.
pub fn decode_image(doc: &Document, stream: &Stream) -> Result<DecodedImage, CodecError> {
    let dict = &stream.dict;

    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err(CodecError::Unsupported("stencil mask".to_string()));
    }
    if dict.has(b"Decode") {
        return Err(CodecError::Unsupported("custom /Decode array".to_string()));
    }

    let width = dict_u32(dict, b"Width").filter(|w| *w > 0);
    let height = dict_u32(dict, b"Height").filter(|h| *h > 0);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(CodecError::Decode("missing or zero Width/Height".to_string()));
    };

    let color = color_model(doc, dict).ok_or_else(|| {
        CodecError::Unsupported(format!("color space {}", color_space_name(doc, dict)))
    })?;

    let filters = filter_names(dict);
    let source = match filters.as_slice() {
        [] => SourceEncoding::Raw,
        [f] if f == "FlateDecode" || f == "Fl" => SourceEncoding::Flate,
        [f] if f == "DCTDecode" || f == "DCT" => SourceEncoding::Jpeg,
        [f] => return Err(CodecError::Unsupported(format!("{} filter", f))),
        chain => {
            return Err(CodecError::Unsupported(format!(
                "filter chain {}",
                chain.join(" + ")
            )))
        }
    };

    let image = match source {
        SourceEncoding::Jpeg => image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|e| CodecError::Decode(format!("JPEG: {}", e)))?,
        SourceEncoding::Flate | SourceEncoding::Raw => {
            if dict_u32(dict, b"BitsPerComponent") != Some(8) {
                return Err(CodecError::Unsupported(format!(
                    "{} bits per component",
                    dict_u32(dict, b"BitsPerComponent")
                        .map(|b| b.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                )));
            }

            let samples = if source == SourceEncoding::Flate {
                let inflated = inflate(&stream.content)?;
                apply_decode_parms(doc, dict, inflated)?
            } else {
                stream.content.clone()
            };

            samples_to_image(samples, width, height, color)?
        }
    };

    Ok(DecodedImage {
        image,
        source,
        color,
    })
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| CodecError::Decode(format!("Flate: {}", e)))?;
    Ok(decoded)
}

fn apply_decode_parms(
    doc: &Document,
    dict: &Dictionary,
    data: Vec<u8>,
) -> Result<Vec<u8>, CodecError> {
    let Some(parms) = decode_parms(doc, dict) else {
        return Ok(data);
    };

    match dict_u32(parms, b"Predictor").unwrap_or(1) {
        1 => Ok(data),
        2 => Err(CodecError::Unsupported("TIFF predictor".to_string())),
        10..=15 => undo_png_predictor(
            &data,
            dict_u32(parms, b"Colors").unwrap_or(1),
            dict_u32(parms, b"BitsPerComponent").unwrap_or(8),
            dict_u32(parms, b"Columns").unwrap_or(1),
        ),
        other => Err(CodecError::Unsupported(format!("predictor {}", other))),
    }
}

/// Parameters for the stream's single filter.
///
/// `/DecodeParms` is either a dictionary or an array with one entry per
/// filter; a `null` entry means the filter takes no parameters.
fn decode_parms<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    match resolve(doc, dict.get(b"DecodeParms").ok()?)? {
        Object::Array(entries) => entries.first().and_then(|entry| resolve_dict(doc, entry)),
        other => resolve_dict(doc, other),
    }
}

/// Reverse PNG row filtering (predictors 10-15).
///
/// Every row starts with a filter-type byte, so the filter may change row
/// by row regardless of which PNG predictor the dictionary names.
pub fn undo_png_predictor(
    data: &[u8],
    colors: u32,
    bits_per_component: u32,
    columns: u32,
) -> Result<Vec<u8>, CodecError> {
    let bits_per_pixel = (colors * bits_per_component) as usize;
    let bpp = bits_per_pixel.div_ceil(8).max(1);
    let row_len = (bits_per_pixel * columns as usize).div_ceil(8);
    if row_len == 0 {
        return Err(CodecError::Decode("predictor row length is zero".to_string()));
    }

    let mut output = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_len];
    let mut current = vec![0u8; row_len];

    for chunk in data.chunks(row_len + 1) {
        if chunk.len() < row_len + 1 {
            // Trailing partial row
            break;
        }
        let filter = chunk[0];
        current.copy_from_slice(&chunk[1..]);

        for i in 0..row_len {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            current[i] = match filter {
                0 => current[i],
                1 => current[i].wrapping_add(left),
                2 => current[i].wrapping_add(up),
                3 => current[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => current[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(CodecError::Decode(format!(
                        "unknown PNG filter type {}",
                        other
                    )))
                }
            };
        }

        output.extend_from_slice(&current);
        std::mem::swap(&mut previous, &mut current);
    }

    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn samples_to_image(
    samples: Vec<u8>,
    width: u32,
    height: u32,
    color: ColorModel,
) -> Result<DynamicImage, CodecError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(color.components()))
        .ok_or_else(|| CodecError::Decode("image dimensions overflow".to_string()))?;

    if samples.len() != expected {
        return Err(CodecError::Decode(format!(
            "sample data has {} bytes, expected {}",
            samples.len(),
            expected
        )));
    }

    let image = match color {
        ColorModel::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        ColorModel::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        ColorModel::Cmyk => {
            RgbImage::from_raw(width, height, cmyk_to_rgb(&samples)).map(DynamicImage::ImageRgb8)
        }
    };

    image.ok_or_else(|| CodecError::Decode("sample buffer does not match dimensions".to_string()))
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(samples.len() / 4 * 3);
    for px in samples.chunks_exact(4) {
        let k = 255 - px[3] as u16;
        for c in &px[..3] {
            rgb.push(((255 - *c as u16) * k / 255) as u8);
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lopdf::dictionary;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn image_dict(width: i64, height: i64, cs: &str) -> Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => cs,
            "BitsPerComponent" => 8,
        }
    }

    #[test]
    fn test_png_predictor_up_and_sub() {
        // Two rows of 3 gray pixels: row 0 uses Sub, row 1 uses Up
        let data = [1, 10, 5, 5, 2, 1, 1, 1];
        let out = undo_png_predictor(&data, 1, 8, 3).unwrap();
        assert_eq!(out, vec![10, 15, 20, 11, 16, 21]);
    }

    #[test]
    fn test_png_predictor_rejects_bad_filter() {
        let data = [9, 0, 0];
        assert!(matches!(
            undo_png_predictor(&data, 1, 8, 2),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_flate_rgb() {
        let doc = Document::with_version("1.5");
        let pixels: Vec<u8> = (0..2 * 2 * 3).map(|v| v as u8 * 10).collect();
        let mut dict = image_dict(2, 2, "DeviceRGB");
        dict.set("Filter", "FlateDecode");
        let stream = Stream::new(dict, deflate(&pixels));

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.source, SourceEncoding::Flate);
        assert_eq!(decoded.color, ColorModel::Rgb);
        assert_eq!(decoded.image.to_rgb8().into_raw(), pixels);
    }

    /// 2x2 gray, each row prefixed with PNG filter type 0
    fn predicted_gray_stream(parms: Object) -> Stream {
        let mut dict = image_dict(2, 2, "DeviceGray");
        dict.set("Filter", vec![Object::Name(b"FlateDecode".to_vec())]);
        dict.set("DecodeParms", parms);
        Stream::new(dict, deflate(&[0, 10, 20, 0, 30, 40]))
    }

    fn predictor_parms() -> Dictionary {
        dictionary! { "Predictor" => 15, "Columns" => 2 }
    }

    #[test]
    fn test_decode_parms_dictionary() {
        let doc = Document::with_version("1.5");
        let stream = predicted_gray_stream(Object::Dictionary(predictor_parms()));

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.image.to_luma8().into_raw(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_parms_array() {
        let doc = Document::with_version("1.5");
        let stream =
            predicted_gray_stream(Object::Array(vec![Object::Dictionary(predictor_parms())]));

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.image.to_luma8().into_raw(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_parms_array_of_references() {
        let mut doc = Document::with_version("1.5");
        let parms_id = doc.add_object(predictor_parms());
        let stream = predicted_gray_stream(Object::Array(vec![Object::Reference(parms_id)]));

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.image.to_luma8().into_raw(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_parms_null_entry_means_no_predictor() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(2, 2, "DeviceGray");
        dict.set("Filter", "FlateDecode");
        dict.set("DecodeParms", vec![Object::Null]);
        let stream = Stream::new(dict, deflate(&[1, 2, 3, 4]));

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.image.to_luma8().into_raw(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_long_data_is_error() {
        let doc = Document::with_version("1.5");
        // Predictor bytes left in place: 6 bytes for a 4-byte image
        let mut dict = image_dict(2, 2, "DeviceGray");
        dict.set("Filter", "FlateDecode");
        let stream = Stream::new(dict, deflate(&[0, 10, 20, 0, 30, 40]));

        assert!(matches!(
            decode_image(&doc, &stream),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_raw_cmyk_converts_to_rgb() {
        let doc = Document::with_version("1.5");
        // Pure cyan, then pure black
        let samples = vec![255, 0, 0, 0, 0, 0, 0, 255];
        let stream = Stream::new(image_dict(2, 1, "DeviceCMYK"), samples);

        let decoded = decode_image(&doc, &stream).unwrap();
        assert_eq!(decoded.source, SourceEncoding::Raw);
        assert_eq!(decoded.color, ColorModel::Cmyk);
        assert_eq!(decoded.image.to_rgb8().into_raw(), vec![0, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_decode_short_data_is_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(image_dict(4, 4, "DeviceGray"), vec![0; 10]);
        assert!(matches!(
            decode_image(&doc, &stream),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_unsupported_inputs() {
        let doc = Document::with_version("1.5");

        let mut jbig = image_dict(4, 4, "DeviceGray");
        jbig.set("Filter", "JBIG2Decode");
        let err = decode_image(&doc, &Stream::new(jbig, vec![0; 16])).unwrap_err();
        assert_eq!(err, CodecError::Unsupported("JBIG2Decode filter".to_string()));

        let mut mask = image_dict(4, 4, "DeviceGray");
        mask.set("ImageMask", true);
        assert!(matches!(
            decode_image(&doc, &Stream::new(mask, vec![0; 16])),
            Err(CodecError::Unsupported(_))
        ));

        let mut one_bit = image_dict(8, 1, "DeviceGray");
        one_bit.set("BitsPerComponent", 1);
        assert!(matches!(
            decode_image(&doc, &Stream::new(one_bit, vec![0])),
            Err(CodecError::Unsupported(_))
        ));
    }
}
