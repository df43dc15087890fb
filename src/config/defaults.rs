/// JPEG quality for the Low preset
pub const LOW_QUALITY: u8 = 90;

/// JPEG quality for the Medium preset
pub const MEDIUM_QUALITY: u8 = 75;

/// JPEG quality for the High preset
pub const HIGH_QUALITY: u8 = 50;

/// JPEG quality for the Very High preset
pub const VERY_HIGH_QUALITY: u8 = 30;

/// Long-edge length in inches used to turn a preset DPI into a pixel bound
pub const REFERENCE_EDGE_INCHES: u32 = 10;

/// Max image dimension for Low (300 dpi)
pub const LOW_MAX_DIMENSION: u32 = 300 * REFERENCE_EDGE_INCHES;

/// Max image dimension for Medium (200 dpi)
pub const MEDIUM_MAX_DIMENSION: u32 = 200 * REFERENCE_EDGE_INCHES;

/// Max image dimension for High (150 dpi)
pub const HIGH_MAX_DIMENSION: u32 = 150 * REFERENCE_EDGE_INCHES;

/// Max image dimension for Very High (100 dpi)
pub const VERY_HIGH_MAX_DIMENSION: u32 = 100 * REFERENCE_EDGE_INCHES;

/// Smallest max dimension a user may configure
pub const MIN_MAX_DIMENSION: u32 = 16;

/// zlib level for lossless image streams
pub const FLATE_LEVEL: u32 = 9;

/// Appended to the input stem to build the suggested output name
pub const OUTPUT_SUFFIX: &str = "_compressed";
