//! Compression pipeline
//!
//! Walks every image in the document, downscales and re-encodes what can be
//! decoded, strips metadata, and hands the result to the staged writer.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Document, Object};

use crate::codec::{apply_encoded, decode_image, downscale, encode_image, SourceEncoding};
use crate::config::Settings;
use crate::error::CompressError;
use crate::job::{
    CancelToken, Progress, ProgressTracker, Stage, LOADED_PERCENT, METADATA_PERCENT,
    SAVING_PERCENT,
};
use crate::pdf::{
    collect_images, load_document, mask_parents, serialize, strip_metadata, ImageRef, ImageRole,
    StagedOutput,
};
use crate::report::{CompressionReport, ImageStats};

/// Result of the in-memory pass over a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub images: ImageStats,
    pub metadata_removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageOutcome {
    Recompressed { downscaled: bool },
    Unchanged,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Compressor {
    settings: Settings,
}

impl Compressor {
    pub fn new(settings: Settings) -> Result<Self, CompressError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compress `input` into `output`.
    ///
    /// `output` is only created once the whole document has been rewritten,
    /// turned out smaller (unless `allow_larger`), and the job was not
    /// cancelled in the meantime.
    pub fn compress_file(
        &self,
        input: &Path,
        output: &Path,
        tracker: &mut ProgressTracker<'_>,
        cancel: &CancelToken,
    ) -> Result<CompressionReport, CompressError> {
        cancel.check()?;
        tracker.report(Progress::new(Stage::Loading, 0));

        let mut doc = load_document(input)?;
        let original_size = std::fs::metadata(input)?.len();
        let page_count = doc.get_pages().len();

        log::info!(
            "Compressing {} ({} pages, {} bytes) at level {}",
            input.display(),
            page_count,
            original_size,
            self.settings.level
        );
        tracker.report(Progress::new(Stage::Loading, LOADED_PERCENT));
        cancel.check()?;

        let stats = self.compress_document(&mut doc, tracker, cancel)?;

        cancel.check()?;
        let bytes = serialize(&mut doc)?;
        let compressed_size = bytes.len() as u64;
        tracker.report(Progress::new(Stage::Saving, SAVING_PERCENT));

        if compressed_size >= original_size && !self.settings.allow_larger {
            log::warn!(
                "Output would be {} bytes, input is {} bytes; nothing written",
                compressed_size,
                original_size
            );
            return Err(CompressError::NoSavings {
                original: original_size,
                compressed: compressed_size,
            });
        }

        let staged = StagedOutput::stage(output, &bytes)?;
        cancel.check()?;
        let output = staged.commit()?;

        tracker.report(Progress::new(Stage::Done, 100));
        log::info!(
            "Wrote {} ({} -> {} bytes)",
            output.display(),
            original_size,
            compressed_size
        );

        Ok(CompressionReport {
            input: input.to_path_buf(),
            output,
            original_size,
            compressed_size,
            page_count,
            images: stats.images,
            metadata_removed: stats.metadata_removed,
        })
    }

    /// Recompress images and strip metadata in place.
    pub fn compress_document(
        &self,
        doc: &mut Document,
        tracker: &mut ProgressTracker<'_>,
        cancel: &CancelToken,
    ) -> Result<DocumentStats, CompressError> {
        if !self.settings.target_format.is_pdf_native() {
            log::warn!(
                "PDF cannot embed {} images; using JPEG at quality {} instead",
                self.settings.target_format.label(),
                self.settings.quality
            );
        }

        let mut images = collect_images(doc);
        // Pictures before masks, so each mask knows how its parents fared
        images.sort_by_key(|image| image.role == ImageRole::SoftMask);
        let parents = mask_parents(doc);
        let mut skipped_ids = HashSet::new();

        let total = images.len();
        let mut stats = ImageStats {
            total,
            ..Default::default()
        };
        tracker.report(Progress::images(0, total));

        for (index, image) in images.iter().enumerate() {
            cancel.check()?;

            // A mask must keep its parent's size when the parent stays as it is
            let parent_skipped = parents
                .get(&image.id)
                .is_some_and(|ids| ids.iter().any(|id| skipped_ids.contains(id)));

            match self.process_image(doc, *image, !parent_skipped)? {
                ImageOutcome::Recompressed { downscaled } => {
                    stats.recompressed += 1;
                    if downscaled {
                        stats.downscaled += 1;
                    }
                }
                ImageOutcome::Unchanged => stats.unchanged += 1,
                ImageOutcome::Skipped => {
                    skipped_ids.insert(image.id);
                    stats.skipped += 1;
                }
            }
            tracker.report(Progress::images(index + 1, total));
        }

        log::info!(
            "Images: {} total, {} recompressed ({} downscaled), {} unchanged, {} skipped",
            stats.total,
            stats.recompressed,
            stats.downscaled,
            stats.unchanged,
            stats.skipped
        );

        cancel.check()?;
        let metadata_removed = if self.settings.remove_metadata {
            strip_metadata(doc).removed_anything()
        } else {
            false
        };
        tracker.report(Progress::new(Stage::Metadata, METADATA_PERCENT));

        Ok(DocumentStats {
            images: stats,
            metadata_removed,
        })
    }

    fn process_image(
        &self,
        doc: &mut Document,
        image: ImageRef,
        allow_resize: bool,
    ) -> Result<ImageOutcome, CompressError> {
        let (id, generation) = image.id;

        let Ok(stream) = doc.get_object(image.id).and_then(Object::as_stream) else {
            return Ok(ImageOutcome::Skipped);
        };
        let original_len = stream.content.len();

        let decoded = match decode_image(doc, stream) {
            Ok(decoded) => decoded,
            Err(err) if self.settings.strict_images => {
                return Err(CompressError::UnsupportedImage {
                    id: image.id,
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                log::warn!("Leaving image {} {} as is: {}", id, generation, err);
                return Ok(ImageOutcome::Skipped);
            }
        };

        let resized = if self.settings.downscale && allow_resize {
            downscale(&decoded.image, self.settings.max_dimension)
        } else {
            if self.settings.downscale {
                log::debug!(
                    "Image {} {}: parent image left as is, keeping mask size",
                    id,
                    generation
                );
            }
            None
        };
        let encoding = self.settings.encoding_for(image.role, decoded.source);

        // Same pixels, same lossless codec
        if resized.is_none() && encoding.is_lossless() && decoded.source == SourceEncoding::Flate
        {
            return Ok(ImageOutcome::Unchanged);
        }

        let pixels = resized.as_ref().unwrap_or(&decoded.image);
        let encoded = encode_image(pixels, encoding)
            .map_err(|e| CompressError::Encode(format!("object {} {}: {}", id, generation, e)))?;

        if resized.is_none() && encoded.content.len() >= original_len {
            log::debug!(
                "Image {} {}: re-encoding gave {} bytes (was {}), keeping original",
                id,
                generation,
                encoded.content.len(),
                original_len
            );
            return Ok(ImageOutcome::Unchanged);
        }

        log::debug!(
            "Image {} {}: {}x{} -> {}x{}, {} -> {} bytes",
            id,
            generation,
            decoded.image.width(),
            decoded.image.height(),
            encoded.width,
            encoded.height,
            original_len,
            encoded.content.len()
        );

        let stream = doc
            .get_object_mut(image.id)
            .and_then(Object::as_stream_mut)
            .map_err(|e| CompressError::InvalidPdf(e.to_string()))?;
        apply_encoded(stream, encoded, decoded.color);

        Ok(ImageOutcome::Recompressed {
            downscaled: resized.is_some(),
        })
    }
}
