use std::path::PathBuf;

/// Per-image outcome counts for one job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStats {
    pub total: usize,
    /// Images whose stream was replaced
    pub recompressed: usize,
    /// Subset of `recompressed` that was also resized
    pub downscaled: usize,
    /// Decodable images kept as they were (nothing to gain)
    pub unchanged: usize,
    /// Images that could not be decoded and were left untouched
    pub skipped: usize,
}

/// Result of a finished compression job
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    pub page_count: usize,
    pub images: ImageStats,
    pub metadata_removed: bool,
}

impl CompressionReport {
    /// Size reduction in percent (negative if the file grew)
    pub fn savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.original_size as f64 - self.compressed_size as f64) / self.original_size as f64
            * 100.0
    }

    /// Status line shown when the job finishes
    pub fn message(&self) -> String {
        format!(
            "Compression complete! File size reduced by {:.1}%",
            self.savings_percent()
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "Original: {} \u{2192} Compressed: {}",
            format_file_size(self.original_size),
            format_file_size(self.compressed_size)
        )
    }
}

/// Format a byte count for display
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 bytes");
        assert_eq!(format_file_size(1023), "1023 bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 / 2), "2.50 MB");
    }

    #[test]
    fn test_report_text() {
        let report = CompressionReport {
            input: PathBuf::from("in.pdf"),
            output: PathBuf::from("in_compressed.pdf"),
            original_size: 2 * 1024 * 1024,
            compressed_size: 512 * 1024,
            page_count: 3,
            images: ImageStats::default(),
            metadata_removed: true,
        };
        assert!((report.savings_percent() - 75.0).abs() < 1e-9);
        assert_eq!(
            report.message(),
            "Compression complete! File size reduced by 75.0%"
        );
        assert_eq!(report.summary(), "Original: 2.00 MB \u{2192} Compressed: 512.0 KB");
    }
}
