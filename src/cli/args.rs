use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::defaults::*;

#[derive(Parser, Debug)]
#[command(name = "pdf-compressor")]
#[command(
    author,
    version,
    about = "Shrink PDF files by downscaling and recompressing embedded images"
)]
pub struct Args {
    /// Input PDF file path
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output PDF file path (defaults to <input>_compressed.pdf)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compression level
    #[arg(short = 'l', long, value_enum, default_value = "medium")]
    pub level: Level,

    /// Target format for recompressed images
    #[arg(short = 'f', long, value_enum, default_value = "original")]
    pub format: TargetFormat,

    /// Keep the document information dictionary and XMP metadata
    #[arg(long)]
    pub keep_metadata: bool,

    /// Do not downscale large images
    #[arg(long)]
    pub no_downscale: bool,

    /// Largest allowed image width or height in pixels (overrides the level preset)
    #[arg(long, value_parser = clap::value_parser!(u32).range(MIN_MAX_DIMENSION as i64..))]
    pub max_dimension: Option<u32>,

    /// Write the output even if it is not smaller than the input
    #[arg(long)]
    pub allow_larger: bool,

    /// Fail on images that cannot be decoded instead of leaving them as they are
    #[arg(long)]
    pub strict: bool,

    /// Do not draw the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Named compression preset
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum Level {
    /// Near-original quality
    Low,
    /// Balanced quality and size
    #[default]
    Medium,
    /// Noticeably smaller, visible artifacts on photos
    High,
    /// Smallest output
    VeryHigh,
}

impl Level {
    /// JPEG quality used for lossy re-encoding
    pub fn quality(&self) -> u8 {
        match self {
            Level::Low => LOW_QUALITY,
            Level::Medium => MEDIUM_QUALITY,
            Level::High => HIGH_QUALITY,
            Level::VeryHigh => VERY_HIGH_QUALITY,
        }
    }

    /// Largest image width or height kept when downscaling
    pub fn max_dimension(&self) -> u32 {
        match self {
            Level::Low => LOW_MAX_DIMENSION,
            Level::Medium => MEDIUM_MAX_DIMENSION,
            Level::High => HIGH_MAX_DIMENSION,
            Level::VeryHigh => VERY_HIGH_MAX_DIMENSION,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
            Level::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Preferred encoding for recompressed images
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum TargetFormat {
    /// Keep each image's encoding family (JPEG stays JPEG, lossless stays lossless)
    #[default]
    Original,
    /// AVIF (falls back to JPEG, PDF has no AVIF filter)
    Avif,
    /// WebP (falls back to JPEG, PDF has no WebP filter)
    Webp,
}

impl TargetFormat {
    /// Whether PDF readers can decode this format natively
    pub fn is_pdf_native(&self) -> bool {
        matches!(self, TargetFormat::Original)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetFormat::Original => "original",
            TargetFormat::Avif => "AVIF",
            TargetFormat::Webp => "WebP",
        }
    }
}

impl Args {
    /// Get the output path, defaulting to `<stem>_compressed.pdf` next to the input
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => ensure_pdf_extension(path),
            None => default_output_path(&self.input),
        }
    }

    /// Check if metadata should be removed
    pub fn remove_metadata(&self) -> bool {
        !self.keep_metadata
    }

    /// Check if large images should be downscaled
    pub fn downscale(&self) -> bool {
        !self.no_downscale
    }
}

/// Suggested output path: same directory, `_compressed` appended to the stem
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());

    input.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
}

/// Append `.pdf` unless the path already ends with it (case-insensitive)
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    if has_pdf_extension(path) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".pdf");
    PathBuf::from(name)
}

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
