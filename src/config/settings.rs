use crate::cli::{Args, Level, TargetFormat};
use crate::codec::{Encoding, SourceEncoding};
use crate::error::ConfigError;
use crate::pdf::ImageRole;

use super::defaults::*;

/// Compression options for one job.
///
/// Built once before the job starts and never mutated afterwards; the job
/// thread receives its own clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub level: Level,
    /// JPEG quality (1-100) for lossy re-encoding
    pub quality: u8,
    pub remove_metadata: bool,
    pub downscale: bool,
    /// Largest width or height an image may keep when downscaling
    pub max_dimension: u32,
    pub target_format: TargetFormat,
    /// Write the result even if it is not smaller than the input
    pub allow_larger: bool,
    /// Fail instead of skipping images that cannot be decoded
    pub strict_images: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_level(Level::default())
    }
}

impl Settings {
    /// Preset values for a compression level
    pub fn for_level(level: Level) -> Self {
        Self {
            level,
            quality: level.quality(),
            remove_metadata: true,
            downscale: true,
            max_dimension: level.max_dimension(),
            target_format: TargetFormat::Original,
            allow_larger: false,
            strict_images: false,
        }
    }

    /// Create settings from CLI arguments
    pub fn from_args(args: &Args) -> Self {
        let mut settings = Self::for_level(args.level)
            .with_target_format(args.format)
            .with_remove_metadata(args.remove_metadata())
            .with_downscale(args.downscale())
            .with_allow_larger(args.allow_larger)
            .with_strict_images(args.strict);

        if let Some(max) = args.max_dimension {
            settings.max_dimension = max;
        }

        settings
    }

    pub fn with_target_format(mut self, format: TargetFormat) -> Self {
        self.target_format = format;
        self
    }

    pub fn with_remove_metadata(mut self, remove: bool) -> Self {
        self.remove_metadata = remove;
        self
    }

    pub fn with_downscale(mut self, downscale: bool) -> Self {
        self.downscale = downscale;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_allow_larger(mut self, allow: bool) -> Self {
        self.allow_larger = allow;
        self
    }

    pub fn with_strict_images(mut self, strict: bool) -> Self {
        self.strict_images = strict;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        if self.max_dimension < MIN_MAX_DIMENSION {
            return Err(ConfigError::InvalidMaxDimension {
                value: self.max_dimension,
                min: MIN_MAX_DIMENSION,
            });
        }
        Ok(())
    }

    /// Pick the output encoding for an image.
    ///
    /// Soft masks stay lossless so transparency edges survive. AVIF and WebP
    /// have no PDF decode filter, so both land on JPEG.
    pub fn encoding_for(&self, role: ImageRole, source: SourceEncoding) -> Encoding {
        if role == ImageRole::SoftMask {
            return Encoding::Flate;
        }

        let lossy = Encoding::Jpeg {
            quality: self.quality,
        };

        match self.target_format {
            TargetFormat::Original => match source {
                SourceEncoding::Jpeg => lossy,
                SourceEncoding::Flate | SourceEncoding::Raw => Encoding::Flate,
            },
            TargetFormat::Avif | TargetFormat::Webp => lossy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_is_medium_with_cleanup() {
        let settings = Settings::default();
        assert_eq!(settings.level, Level::Medium);
        assert_eq!(settings.quality, 75);
        assert_eq!(settings.max_dimension, 2000);
        assert!(settings.remove_metadata);
        assert!(settings.downscale);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_args_overrides_preset() {
        let args = Args::parse_from([
            "pdf-compressor",
            "in.pdf",
            "--level",
            "high",
            "--no-downscale",
            "--max-dimension",
            "640",
            "--strict",
        ]);
        let settings = Settings::from_args(&args);
        assert_eq!(settings.quality, 50);
        assert_eq!(settings.max_dimension, 640);
        assert!(!settings.downscale);
        assert!(settings.remove_metadata);
        assert!(settings.strict_images);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings::default().with_quality(0);
        assert_eq!(settings.validate(), Err(ConfigError::InvalidQuality(0)));

        let settings = Settings::default().with_max_dimension(8);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidMaxDimension { value: 8, .. })
        ));
    }

    #[test]
    fn test_original_format_keeps_lossless_images_lossless() {
        let settings = Settings::for_level(Level::High);
        assert_eq!(
            settings.encoding_for(ImageRole::Picture, SourceEncoding::Flate),
            Encoding::Flate
        );
        assert_eq!(
            settings.encoding_for(ImageRole::Picture, SourceEncoding::Jpeg),
            Encoding::Jpeg { quality: 50 }
        );
    }

    #[test]
    fn test_avif_and_webp_fall_back_to_jpeg() {
        for format in [TargetFormat::Avif, TargetFormat::Webp] {
            let settings = Settings::default().with_target_format(format);
            assert_eq!(
                settings.encoding_for(ImageRole::Picture, SourceEncoding::Raw),
                Encoding::Jpeg { quality: 75 }
            );
            assert_eq!(
                settings.encoding_for(ImageRole::SoftMask, SourceEncoding::Flate),
                Encoding::Flate
            );
        }
    }
}
