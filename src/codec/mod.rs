//! Image stream codec
//!
//! Turns PDF image streams into `image::DynamicImage` values, shrinks them,
//! and encodes them back into a form PDF readers can display.

mod decode;
mod encode;
mod resize;

pub use decode::{decode_image, undo_png_predictor, DecodedImage, SourceEncoding};
pub use encode::{apply_encoded, encode_image, EncodedImage, Encoding};
pub use resize::{downscale, fit_within};
