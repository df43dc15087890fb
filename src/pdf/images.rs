//! Image XObject discovery
//!
//! Finds every raster image in a document, tells pictures apart from the
//! soft masks that carry their transparency, and resolves color spaces down
//! to the three sample layouts the codec understands.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::{dict_u32, filter_names, resolve, resolve_dict};

/// What an image stream is used for
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageRole {
    /// Drawn directly on a page or inside a form
    Picture,
    /// Referenced by another image as `/SMask` or `/Mask`
    SoftMask,
}

/// Sample layout of a decodable image
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorModel {
    pub fn components(&self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    /// The device color space name for this layout
    pub fn device_name(&self) -> &'static [u8] {
        match self {
            ColorModel::Gray => b"DeviceGray",
            ColorModel::Rgb => b"DeviceRGB",
            ColorModel::Cmyk => b"DeviceCMYK",
        }
    }

    fn from_components(n: u32) -> Option<Self> {
        match n {
            1 => Some(ColorModel::Gray),
            3 => Some(ColorModel::Rgb),
            4 => Some(ColorModel::Cmyk),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    pub id: ObjectId,
    pub role: ImageRole,
}

/// Summary of one image stream
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub id: ObjectId,
    pub role: ImageRole,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: Option<u32>,
    pub color_space: String,
    pub filters: Vec<String>,
    /// Encoded stream length in bytes
    pub size_bytes: usize,
}

fn is_image(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
}

/// Images referenced as `/SMask` or `/Mask`, mapped to the images using them
pub fn mask_parents(doc: &Document) -> HashMap<ObjectId, Vec<ObjectId>> {
    let mut parents: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();

    for (id, object) in doc.objects.iter() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_image(&stream.dict) {
            continue;
        }
        for key in [&b"SMask"[..], &b"Mask"[..]] {
            // An array /Mask is a color-key range, not a stream
            if let Ok(Object::Reference(mask_id)) = stream.dict.get(key) {
                parents.entry(*mask_id).or_default().push(*id);
            }
        }
    }

    parents
}

/// Every image XObject in the document, in object order
pub fn collect_images(doc: &Document) -> Vec<ImageRef> {
    let masks = mask_parents(doc);

    doc.objects
        .iter()
        .filter(|(_, object)| matches!(object, Object::Stream(s) if is_image(&s.dict)))
        .map(|(id, _)| ImageRef {
            id: *id,
            role: if masks.contains_key(id) {
                ImageRole::SoftMask
            } else {
                ImageRole::Picture
            },
        })
        .collect()
}

/// Describe a single image stream, or `None` if `id` is not an image
pub fn image_info(doc: &Document, id: ObjectId) -> Option<ImageInfo> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    if !is_image(&stream.dict) {
        return None;
    }

    let role = collect_images(doc)
        .into_iter()
        .find(|r| r.id == id)
        .map(|r| r.role)
        .unwrap_or(ImageRole::Picture);

    Some(ImageInfo {
        id,
        role,
        width: dict_u32(&stream.dict, b"Width").unwrap_or(0),
        height: dict_u32(&stream.dict, b"Height").unwrap_or(0),
        bits_per_component: dict_u32(&stream.dict, b"BitsPerComponent"),
        color_space: color_space_name(doc, &stream.dict),
        filters: filter_names(&stream.dict),
        size_bytes: stream.content.len(),
    })
}

/// Human-readable name of an image's color space
pub fn color_space_name(doc: &Document, dict: &Dictionary) -> String {
    let Ok(cs) = dict.get(b"ColorSpace") else {
        return if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
            "ImageMask".to_string()
        } else {
            "None".to_string()
        };
    };
    match resolve(doc, cs) {
        Some(Object::Name(n)) => String::from_utf8_lossy(n).into_owned(),
        Some(Object::Array(arr)) => match arr.first() {
            Some(Object::Name(n)) => String::from_utf8_lossy(n).into_owned(),
            _ => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

/// Resolve the color space of an image dictionary to a sample layout.
///
/// Returns `None` for spaces whose samples are not plain gray/RGB/CMYK
/// values (Indexed, Separation, DeviceN, Lab, Pattern) or when the entry
/// is missing.
pub fn color_model(doc: &Document, dict: &Dictionary) -> Option<ColorModel> {
    let cs = resolve(doc, dict.get(b"ColorSpace").ok()?)?;
    color_model_of(doc, cs)
}

fn color_model_of(doc: &Document, cs: &Object) -> Option<ColorModel> {
    match cs {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorModel::Cmyk),
            _ => None,
        },
        Object::Array(arr) => {
            let family = match arr.first()? {
                Object::Name(n) => n.as_slice(),
                _ => return None,
            };
            match family {
                b"CalGray" => Some(ColorModel::Gray),
                b"CalRGB" => Some(ColorModel::Rgb),
                b"ICCBased" => {
                    let profile = resolve_dict(doc, arr.get(1)?)?;
                    if let Some(model) = dict_u32(profile, b"N").and_then(ColorModel::from_components) {
                        return Some(model);
                    }
                    // Malformed profile: fall back to its alternate space
                    let alternate = resolve(doc, profile.get(b"Alternate").ok()?)?;
                    color_model_of(doc, alternate)
                }
                _ => None,
            }
        }
        Object::Reference(_) => color_model_of(doc, resolve(doc, cs)?),
        _ => None,
    }
}

/// Images reachable from a page's resources, including nested forms.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();

    if let Some(resources) = page_resources(doc, page_id) {
        collect_from_resources(doc, resources, &mut found, &mut visited);
    }

    found
}

/// Page resources, walking up the page tree for inherited entries
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Bounded walk guards against cyclic Parent chains
    for _ in 0..64 {
        if let Ok(resources) = current.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_from_resources(
    doc: &Document,
    resources: &Dictionary,
    found: &mut Vec<ObjectId>,
    visited: &mut HashSet<ObjectId>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(n)) if n == b"Image" => found.push(*id),
            Ok(Object::Name(n)) if n == b"Form" => {
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r))
                {
                    collect_from_resources(doc, form_resources, found, visited);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn image_stream(extra: Dictionary) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 4,
            "Height" => 2,
            "BitsPerComponent" => 8,
        };
        for (k, v) in extra.iter() {
            dict.set(k.clone(), v.clone());
        }
        Stream::new(dict, vec![0; 24])
    }

    #[test]
    fn test_soft_masks_are_tagged() {
        let mut doc = Document::with_version("1.5");
        let mask_id = doc.add_object(image_stream(dictionary! { "ColorSpace" => "DeviceGray" }));
        let picture_id = doc.add_object(image_stream(dictionary! {
            "ColorSpace" => "DeviceRGB",
            "SMask" => mask_id,
        }));
        doc.add_object(Stream::new(dictionary! { "Subtype" => "Form" }, Vec::new()));

        let images = collect_images(&doc);
        assert_eq!(images.len(), 2);
        assert!(images.contains(&ImageRef {
            id: mask_id,
            role: ImageRole::SoftMask
        }));
        assert!(images.contains(&ImageRef {
            id: picture_id,
            role: ImageRole::Picture
        }));
    }

    #[test]
    fn test_mask_parents_maps_shared_masks() {
        let mut doc = Document::with_version("1.5");
        let mask_id = doc.add_object(image_stream(dictionary! { "ColorSpace" => "DeviceGray" }));
        let first = doc.add_object(image_stream(dictionary! { "SMask" => mask_id }));
        let second = doc.add_object(image_stream(dictionary! { "Mask" => mask_id }));
        doc.add_object(image_stream(dictionary! {
            "Mask" => vec![0.into(), 10.into()],
        }));

        let parents = mask_parents(&doc);
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[&mask_id], vec![first, second]);
    }

    #[test]
    fn test_color_model_resolution() {
        let mut doc = Document::with_version("1.5");
        let icc_id = doc.add_object(Stream::new(dictionary! { "N" => 3 }, Vec::new()));

        let icc = dictionary! {
            "ColorSpace" => vec![Object::Name(b"ICCBased".to_vec()), icc_id.into()],
        };
        assert_eq!(color_model(&doc, &icc), Some(ColorModel::Rgb));

        let cmyk = dictionary! { "ColorSpace" => "DeviceCMYK" };
        assert_eq!(color_model(&doc, &cmyk), Some(ColorModel::Cmyk));

        let indexed = dictionary! {
            "ColorSpace" => vec![Object::Name(b"Indexed".to_vec()), "DeviceRGB".into(), 1.into()],
        };
        assert_eq!(color_model(&doc, &indexed), None);
        assert_eq!(color_space_name(&doc, &indexed), "Indexed");
    }

    #[test]
    fn test_page_images_follow_inherited_resources_and_forms() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(image_stream(dictionary! { "ColorSpace" => "DeviceGray" }));
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            },
            Vec::new(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Fm0" => form_id },
                },
            }),
        );

        assert_eq!(page_images(&doc, page_id), vec![image_id]);

        let info = image_info(&doc, image_id).unwrap();
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.color_space, "DeviceGray");
        assert_eq!(info.size_bytes, 24);
    }
}
