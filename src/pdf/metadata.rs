//! Document metadata removal
//!
//! Strips the trailer's document-information dictionary and every XMP
//! `/Metadata` stream reference. The streams themselves become orphans and
//! are dropped when the document is pruned at save time.

use lopdf::{Document, Object};

/// What `strip_metadata` removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataRemoval {
    pub info_removed: bool,
    /// Number of `/Metadata` entries dropped (catalog, pages, images, ...)
    pub xmp_entries_removed: usize,
}

impl MetadataRemoval {
    pub fn removed_anything(&self) -> bool {
        self.info_removed || self.xmp_entries_removed > 0
    }
}

pub fn strip_metadata(doc: &mut Document) -> MetadataRemoval {
    let mut removal = MetadataRemoval {
        info_removed: doc.trailer.remove(b"Info").is_some(),
        ..Default::default()
    };

    for object in doc.objects.values_mut() {
        let dict = match object {
            Object::Dictionary(d) => d,
            Object::Stream(s) => &mut s.dict,
            _ => continue,
        };
        if dict.remove(b"Metadata").is_some() {
            removal.xmp_entries_removed += 1;
        }
    }

    log::debug!(
        "Metadata removal: info={}, xmp entries={}",
        removal.info_removed,
        removal.xmp_entries_removed
    );

    removal
}

/// Whether the document still carries an info dictionary with entries or any XMP reference
pub fn has_metadata(doc: &Document) -> bool {
    let has_info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(|d| d.len() > 0)
            .unwrap_or(false),
        Ok(Object::Dictionary(d)) => d.len() > 0,
        _ => false,
    };

    has_info
        || doc.objects.values().any(|object| match object {
            Object::Dictionary(d) => d.has(b"Metadata"),
            Object::Stream(s) => s.dict.has(b"Metadata"),
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn document_with_metadata() -> Document {
        let mut doc = Document::with_version("1.5");
        let xmp_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            b"<x:xmpmeta/>".to_vec(),
        ));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Metadata" => xmp_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Author" => Object::string_literal("Jane Doe"),
            "Producer" => Object::string_literal("Scanner 3000"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc
    }

    #[test]
    fn test_strip_removes_info_and_xmp() {
        let mut doc = document_with_metadata();
        assert!(has_metadata(&doc));

        let removal = strip_metadata(&mut doc);
        assert!(removal.info_removed);
        assert_eq!(removal.xmp_entries_removed, 1);
        assert!(removal.removed_anything());
        assert!(!has_metadata(&doc));
        assert!(doc.trailer.get(b"Root").is_ok());
    }

    #[test]
    fn test_strip_on_clean_document_is_noop() {
        let mut doc = Document::with_version("1.5");
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", catalog_id);

        let removal = strip_metadata(&mut doc);
        assert_eq!(removal, MetadataRemoval::default());
        assert!(!has_metadata(&doc));
    }

    #[test]
    fn test_empty_info_does_not_count() {
        let mut doc = Document::with_version("1.5");
        let info_id = doc.add_object(lopdf::Dictionary::new());
        doc.trailer.set("Info", info_id);
        assert!(!has_metadata(&doc));
    }
}
