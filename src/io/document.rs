//! Assembly and disassembly of the single-image document wrapped around one
//! marshaled image.

use thiserror::Error;

use crate::image::bindata::{array_to_image_data, image_data_to_array, MarshalError};
use crate::image::calibration::{extract_calibrations, inject_calibrations};
use crate::image::Image;
use crate::tags::{TagMap, TagNode, TagValue};

use super::traits::CodecError;

/// Annotation type identifying an image display annotation.
const IMAGE_ANNOTATION_TYPE: i64 = 20;
/// Display behavior the desktop application expects for a plain image view.
const VIEW_DISPLAY_ID: i64 = 8;
const IMAGE_SOURCE_CLASS: &str = "ImageSource:Simple";

#[derive(Debug, Error)]
pub enum ImageDocumentError {
    #[error("The document root is not a tag mapping")]
    MalformedRoot,
    #[error("The document has no ImageList entries")]
    NoImages,
    #[error("The selected ImageList entry is missing {0:?}")]
    MissingEntry(&'static str),
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pull the primary image out of a normalized document tree.
///
/// The format convention places any thumbnails first and the full
/// resolution image last in `ImageList`, so the last entry is selected.
pub fn disassemble(root: &TagNode) -> Result<Image, ImageDocumentError> {
    let root = root.as_mapping().ok_or(ImageDocumentError::MalformedRoot)?;
    let entry = root
        .get("ImageList")
        .and_then(TagNode::as_sequence)
        .and_then(<[TagNode]>::last)
        .and_then(TagNode::as_mapping)
        .ok_or(ImageDocumentError::NoImages)?;
    let image_data = entry
        .get("ImageData")
        .and_then(TagNode::as_mapping)
        .ok_or(ImageDocumentError::MissingEntry("ImageData"))?;

    let data = image_data_to_array(image_data)?;
    let (dimensional_calibrations, intensity_calibration) = extract_calibrations(image_data);
    let title = entry
        .get("Name")
        .and_then(TagNode::as_scalar)
        .and_then(TagValue::as_str)
        .map(String::from);

    let mut properties = TagMap::new();
    if let Some(image_tags) = entry.get("ImageTags") {
        properties.insert("imported_properties".into(), image_tags.clone());
        let voltage = image_tags
            .get("ImageScanned")
            .and_then(|scanned| scanned.get("EHT"))
            .and_then(TagNode::as_scalar)
            .and_then(TagValue::as_f64);
        if let Some(voltage) = voltage.filter(|v| *v != 0.0) {
            let mut autostem = TagMap::new();
            autostem.insert("high_tension_v".into(), TagNode::from(voltage));
            properties.insert("autostem".into(), TagNode::Mapping(autostem));
            // TODO: drop extra_high_tension once nothing downstream reads it
            properties.insert("extra_high_tension".into(), TagNode::from(voltage));
        }
    }

    log::debug!(
        "Disassembled a rank {} {} image",
        data.ndim(),
        data.element_type()
    );
    Ok(Image {
        data,
        dimensional_calibrations,
        intensity_calibration,
        title,
        properties,
    })
}

/// Build the minimal single-image document around `image`: one `ImageList`
/// entry plus the source, annotation and display scaffolding the desktop
/// application requires before it will open the file.
///
/// `metadata` lands under the entry's `ImageTags` verbatim.
pub fn assemble(image: &Image, metadata: &TagMap) -> Result<TagNode, MarshalError> {
    let mut image_data = array_to_image_data(&image.data)?;
    inject_calibrations(
        &mut image_data,
        &image.dimensional_calibrations,
        &image.intensity_calibration,
        image.data.ndim(),
    );

    let mut entry = TagMap::new();
    entry.insert("ImageData".into(), TagNode::Mapping(image_data));
    if let Some(title) = &image.title {
        entry.insert("Name".into(), TagNode::from(title.as_str()));
    }
    entry.insert("ImageTags".into(), TagNode::Mapping(metadata.clone()));

    let mut source = TagMap::new();
    source.insert("ClassName".into(), TagNode::from(IMAGE_SOURCE_CLASS));
    source.insert("Id".into(), TagNode::Sequence(vec![TagNode::from(0_i64)]));
    source.insert("ImageRef".into(), TagNode::from(0_i64));

    let mut annotation = TagMap::new();
    annotation.insert("ImageSource".into(), TagNode::from(0_i64));
    annotation.insert(
        "AnnotationType".into(),
        TagNode::from(IMAGE_ANNOTATION_TYPE),
    );

    let mut behavior = TagMap::new();
    behavior.insert("ViewDisplayID".into(), TagNode::from(VIEW_DISPLAY_ID));

    let mut root = TagMap::new();
    root.insert(
        "ImageList".into(),
        TagNode::Sequence(vec![TagNode::Mapping(entry)]),
    );
    root.insert(
        "ImageSourceList".into(),
        TagNode::Sequence(vec![TagNode::Mapping(source)]),
    );
    root.insert(
        "DocumentObjectList".into(),
        TagNode::Sequence(vec![TagNode::Mapping(annotation)]),
    );
    root.insert("Image Behavior".into(), TagNode::Mapping(behavior));
    root.insert("InImageMode".into(), TagNode::from(1_i64));
    Ok(TagNode::Mapping(root))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::image::bindata::{to_bytes, ElementType, ImageArray};
    use crate::image::Calibration;
    use crate::tags::RawArrayTag;

    fn float_image(values: &[f32], shape: &[usize]) -> Image {
        let flat = ImageArray::from_flat_bytes(ElementType::Float32, &to_bytes(values)).unwrap();
        Image::new(flat.reshape(shape).unwrap())
    }

    fn entry_with_data(values: &[f32], shape_reversed: &[i64]) -> TagNode {
        let mut image_data = TagMap::new();
        image_data.insert("DataType".into(), TagNode::from(2_i64));
        image_data.insert("PixelDepth".into(), TagNode::from(4_i64));
        image_data.insert(
            "Dimensions".into(),
            TagNode::Sequence(shape_reversed.iter().map(|d| TagNode::from(*d)).collect()),
        );
        image_data.insert(
            "Data".into(),
            TagNode::RawArray(RawArrayTag {
                dtype: ElementType::Float32,
                data: to_bytes(values),
            }),
        );
        let mut entry = TagMap::new();
        entry.insert("ImageData".into(), TagNode::Mapping(image_data));
        TagNode::Mapping(entry)
    }

    #[test]
    fn test_round_trip() {
        let image = float_image(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).with_calibrations(
            vec![
                Calibration::new(0.0, 0.1, "nm"),
                Calibration::new(-1.0, 0.2, "nm"),
            ],
            Calibration::new(0.0, 2.0, "counts"),
        );
        let image = image.with_title("ronchigram");

        let mut metadata = TagMap::new();
        metadata.insert("Exposure".into(), TagNode::from(0.25));

        let document = assemble(&image, &metadata).unwrap();
        let restored = disassemble(&document).unwrap();

        assert_eq!(restored.data, image.data);
        assert_eq!(
            restored.dimensional_calibrations,
            image.dimensional_calibrations
        );
        assert_eq!(restored.intensity_calibration, image.intensity_calibration);
        assert_eq!(restored.title.as_deref(), Some("ronchigram"));
        assert_eq!(
            restored.properties.get("imported_properties"),
            Some(&TagNode::Mapping(metadata))
        );
    }

    #[test]
    fn test_selects_last_image_list_entry() {
        let thumbnail = entry_with_data(&[9.0; 4], &[2, 2]);
        let full = entry_with_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
        let mut root = TagMap::new();
        root.insert(
            "ImageList".into(),
            TagNode::Sequence(vec![thumbnail, full]),
        );

        let image = disassemble(&TagNode::Mapping(root)).unwrap();
        assert_eq!(image.data.shape(), &[2, 3]);
        match &image.data {
            ImageArray::Float32(arr) => assert_eq!(arr[[0, 0]], 1.0),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_empty_document_fails() {
        let root = TagNode::Mapping(TagMap::new());
        assert!(matches!(
            disassemble(&root).unwrap_err(),
            ImageDocumentError::NoImages
        ));

        let mut with_empty_list = TagMap::new();
        with_empty_list.insert("ImageList".into(), TagNode::Sequence(Vec::new()));
        assert!(matches!(
            disassemble(&TagNode::Mapping(with_empty_list)).unwrap_err(),
            ImageDocumentError::NoImages
        ));
    }

    #[test]
    fn test_missing_calibrations_read_as_defaults() {
        let entry = entry_with_data(&[1.0, 2.0], &[2]);
        let mut root = TagMap::new();
        root.insert("ImageList".into(), TagNode::Sequence(vec![entry]));

        let image = disassemble(&TagNode::Mapping(root)).unwrap();
        assert!(image.dimensional_calibrations.is_empty());
        assert_eq!(image.intensity_calibration, Calibration::default());
        assert!(image.title.is_none());
        assert!(image.properties.is_empty());
    }

    #[test]
    fn test_voltage_is_duplicated_under_legacy_keys() {
        let mut scanned = TagMap::new();
        scanned.insert("EHT".into(), TagNode::from(200000.0));
        let mut image_tags = TagMap::new();
        image_tags.insert("ImageScanned".into(), TagNode::Mapping(scanned));

        let entry = entry_with_data(&[1.0, 2.0], &[2]);
        let mut entry_map = match entry {
            TagNode::Mapping(map) => map,
            _ => unreachable!(),
        };
        entry_map.insert("ImageTags".into(), TagNode::Mapping(image_tags));
        let mut root = TagMap::new();
        root.insert(
            "ImageList".into(),
            TagNode::Sequence(vec![TagNode::Mapping(entry_map)]),
        );

        let image = disassemble(&TagNode::Mapping(root)).unwrap();
        assert_eq!(
            image
                .properties
                .get("autostem")
                .and_then(|n| n.get("high_tension_v"))
                .and_then(TagNode::as_scalar),
            Some(&TagValue::Float(200000.0))
        );
        assert_eq!(
            image
                .properties
                .get("extra_high_tension")
                .and_then(TagNode::as_scalar),
            Some(&TagValue::Float(200000.0))
        );
    }

    #[test]
    fn test_document_scaffolding() {
        let image = float_image(&[0.5; 4], &[4]);
        let document = assemble(&image, &TagMap::new()).unwrap();

        let source = document
            .get("ImageSourceList")
            .and_then(TagNode::as_sequence)
            .and_then(<[TagNode]>::first)
            .unwrap();
        assert_eq!(
            source.get("ClassName").and_then(TagNode::as_scalar),
            Some(&TagValue::String("ImageSource:Simple".into()))
        );

        let annotation = document
            .get("DocumentObjectList")
            .and_then(TagNode::as_sequence)
            .and_then(<[TagNode]>::first)
            .unwrap();
        assert_eq!(
            annotation.get("AnnotationType").and_then(TagNode::as_scalar),
            Some(&TagValue::Integer(20))
        );

        assert_eq!(
            document
                .get("Image Behavior")
                .and_then(|b| b.get("ViewDisplayID"))
                .and_then(TagNode::as_scalar),
            Some(&TagValue::Integer(8))
        );
        assert_eq!(
            document.get("InImageMode").and_then(TagNode::as_scalar),
            Some(&TagValue::Integer(1))
        );
        // no Name entry when the image carries no title
        let entry = document
            .get("ImageList")
            .and_then(TagNode::as_sequence)
            .and_then(<[TagNode]>::first)
            .unwrap();
        assert!(entry.get("Name").is_none());
    }
}
