//! PDF-side plumbing on top of lopdf
//!
//! Loading and serializing documents, finding image XObjects, stripping
//! metadata, and writing the result without exposing a partial file.

pub mod document;
pub mod images;
pub mod metadata;
pub mod writer;

use lopdf::{Dictionary, Document, Object};

pub use document::{load_document, serialize, validate_input};
pub use images::{
    collect_images, color_model, color_space_name, image_info, mask_parents, page_images,
    ColorModel, ImageInfo, ImageRef, ImageRole,
};
pub use metadata::{has_metadata, strip_metadata, MetadataRemoval};
pub use writer::StagedOutput;

/// Follow a reference to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        _ => Some(obj),
    }
}

/// Resolve a dictionary entry, following references
pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Filter names of a stream, in application order
pub(crate) fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|f| match f {
                Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Integer entry, accepting whole reals written by sloppy producers
pub(crate) fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok()? {
        Object::Integer(n) if *n >= 0 => u32::try_from(*n).ok(),
        Object::Real(r) if *r >= 0.0 && r.fract() == 0.0 => Some(*r as u32),
        _ => None,
    }
}
