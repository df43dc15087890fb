pub mod cli;
pub mod codec;
pub mod compressor;
pub mod config;
pub mod error;
pub mod job;
pub mod pdf;
pub mod report;

pub use cli::{Level, TargetFormat};
pub use compressor::{Compressor, DocumentStats};
pub use config::Settings;
pub use error::{CodecError, CompressError, ConfigError};
pub use job::{spawn, CancelToken, CompressionRequest, JobEvent, JobHandle, Progress, Stage};
pub use report::{format_file_size, CompressionReport, ImageStats};

use std::path::Path;

use job::ProgressTracker;

/// High-level API for compressing a PDF file.
///
/// Runs the whole job on the calling thread. Use [`spawn`] instead to run it
/// in the background with progress events and cancellation.
///
/// # Arguments
///
/// * `input` - Existing PDF file to compress
/// * `output` - Destination path; only created if the job succeeds
/// * `settings` - Compression options
///
/// # Example
///
/// ```no_run
/// use pdf_compressor::{compress_file, Level, Settings};
/// use std::path::Path;
///
/// let settings = Settings::for_level(Level::High);
/// let report = compress_file(
///     Path::new("scan.pdf"),
///     Path::new("scan_compressed.pdf"),
///     &settings,
/// ).unwrap();
///
/// println!("{}", report.message());
/// ```
pub fn compress_file(
    input: &Path,
    output: &Path,
    settings: &Settings,
) -> Result<CompressionReport, CompressError> {
    let compressor = Compressor::new(settings.clone())?;
    compressor.compress_file(
        input,
        output,
        &mut ProgressTracker::silent(),
        &CancelToken::new(),
    )
}
