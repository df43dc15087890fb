use std::path::PathBuf;

use lopdf::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Not a PDF file: {0}")]
    NotPdf(PathBuf),

    #[error("Failed to read PDF: {0}")]
    InvalidPdf(String),

    #[error("Unsupported image in object {} {}: {reason}", .id.0, .id.1)]
    UnsupportedImage { id: ObjectId, reason: String },

    #[error("Failed to write PDF: {0}")]
    Write(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Compression resulted in a larger file. Original file preserved.")]
    NoSavings { original: u64, compressed: u64 },

    #[error("Compression cancelled")]
    Cancelled,

    #[error("Compression worker failed: {0}")]
    Worker(String),

    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Maximum image dimension must be at least {min} pixels, got {value}")]
    InvalidMaxDimension { value: u32, min: u32 },
}

/// Errors raised while turning a PDF image stream into pixels and back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),
}
