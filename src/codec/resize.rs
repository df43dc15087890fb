use image::imageops::FilterType;
use image::DynamicImage;

/// Size that fits inside a `max` x `max` box, keeping the aspect ratio.
///
/// Returns `None` when the image already fits. Never enlarges, and never
/// shrinks a side below one pixel.
pub fn fit_within(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }
    let max = max.max(1);
    let longest = width.max(height) as u64;

    let scale = |side: u32| -> u32 {
        let scaled = (side as u64 * max as u64 + longest / 2) / longest;
        scaled.clamp(1, max as u64) as u32
    };

    Some((scale(width), scale(height)))
}

/// Downscale so neither side exceeds `max`, or `None` if no resize is needed.
pub fn downscale(img: &DynamicImage, max: u32) -> Option<DynamicImage> {
    let (width, height) = fit_within(img.width(), img.height(), max)?;
    Some(img.resize_exact(width, height, FilterType::Lanczos3))
}
