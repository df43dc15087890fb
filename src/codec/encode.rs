use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use lopdf::{Object, Stream};

use crate::config::defaults::FLATE_LEVEL;
use crate::error::CodecError;
use crate::pdf::ColorModel;

/// Output encoding for a recompressed image
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Lossy `DCTDecode` at the given quality (1-100)
    Jpeg { quality: u8 },
    /// Lossless `FlateDecode` over 8-bit samples
    Flate,
}

impl Encoding {
    pub fn filter_name(&self) -> &'static [u8] {
        match self {
            Encoding::Jpeg { .. } => b"DCTDecode",
            Encoding::Flate => b"FlateDecode",
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, Encoding::Flate)
    }
}

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub content: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Always `Gray` or `Rgb`
    pub color: ColorModel,
    pub encoding: Encoding,
}

fn is_gray(img: &DynamicImage) -> bool {
    matches!(
        img,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    )
}

/// Encode pixels for embedding in a PDF image stream.
///
/// Gray images stay single-channel; everything else becomes 8-bit RGB.
/// Alpha is dropped, since PDF carries transparency in a separate mask.
pub fn encode_image(img: &DynamicImage, encoding: Encoding) -> Result<EncodedImage, CodecError> {
    let (width, height) = (img.width(), img.height());
    let (samples, color) = if is_gray(img) {
        (img.to_luma8().into_raw(), ColorModel::Gray)
    } else {
        (img.to_rgb8().into_raw(), ColorModel::Rgb)
    };

    let content = match encoding {
        Encoding::Jpeg { quality } => {
            if width > u16::MAX as u32 || height > u16::MAX as u32 {
                return Err(CodecError::Encode(format!(
                    "{}x{} exceeds the JPEG size limit",
                    width, height
                )));
            }
            let color_type = match color {
                ColorModel::Gray => ExtendedColorType::L8,
                _ => ExtendedColorType::Rgb8,
            };
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
                .encode(&samples, width, height, color_type)
                .map_err(|e| CodecError::Encode(format!("JPEG: {}", e)))?;
            buf
        }
        Encoding::Flate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(FLATE_LEVEL));
            encoder
                .write_all(&samples)
                .map_err(|e| CodecError::Encode(format!("Flate: {}", e)))?;
            encoder
                .finish()
                .map_err(|e| CodecError::Encode(format!("Flate: {}", e)))?
        }
    };

    Ok(EncodedImage {
        content,
        width,
        height,
        color,
        encoding,
    })
}

/// Replace an image stream's data with re-encoded pixels.
///
/// `source` is the color model the stream declared before re-encoding; the
/// original `/ColorSpace` entry (ICC profile included) survives when the
/// sample layout is unchanged.
pub fn apply_encoded(stream: &mut Stream, encoded: EncodedImage, source: ColorModel) {
    let dict = &mut stream.dict;
    dict.set("Width", encoded.width as i64);
    dict.set("Height", encoded.height as i64);
    dict.set("BitsPerComponent", 8);
    dict.set(
        "Filter",
        Object::Name(encoded.encoding.filter_name().to_vec()),
    );
    dict.remove(b"DecodeParms");

    if encoded.color != source {
        dict.set(
            "ColorSpace",
            Object::Name(encoded.color.device_name().to_vec()),
        );
    }

    stream.set_content(encoded.content);
    stream.allows_compression = false;
}
