use serde::Deserialize;

use crate::error::AnnotationError;
use crate::types::{AnnotationRecord, BndBox, ObjectAnnotation};

// The subset of a PASCAL VOC `<annotation>` document the converter reads.
// Everything else (folder, source, segmented, pose, ...) is ignored, and
// `<object>` elements are collected wherever they appear among the children.
#[derive(Debug, Deserialize)]
struct VocAnnotation {
    filename: Option<String>,
    size: Option<VocSize>,
    #[serde(default)]
    object: Vec<VocObject>,
}

#[derive(Debug, Deserialize)]
struct VocSize {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VocObject {
    name: Option<String>,
    bndbox: Option<VocBndBox>,
}

#[derive(Debug, Deserialize)]
struct VocBndBox {
    xmin: Option<f64>,
    ymin: Option<f64>,
    xmax: Option<f64>,
    ymax: Option<f64>,
}

impl VocObject {
    fn into_object(self, index: usize) -> Result<ObjectAnnotation, AnnotationError> {
        let incomplete = |field| AnnotationError::IncompleteObject { index, field };
        let class_name = self.name.ok_or_else(|| incomplete("name"))?;
        let bndbox = self.bndbox.ok_or_else(|| incomplete("bndbox"))?;
        Ok(ObjectAnnotation {
            class_name,
            bbox: BndBox {
                xmin: bndbox.xmin.ok_or_else(|| incomplete("bndbox.xmin"))?,
                ymin: bndbox.ymin.ok_or_else(|| incomplete("bndbox.ymin"))?,
                xmax: bndbox.xmax.ok_or_else(|| incomplete("bndbox.xmax"))?,
                ymax: bndbox.ymax.ok_or_else(|| incomplete("bndbox.ymax"))?,
            },
        })
    }
}

/// Parse one XML annotation document.
///
/// An `<object>` lacking its name or box coordinates yields
/// [`AnnotationError::IncompleteObject`], which the record writer treats as a
/// rejected example rather than a malformed file.
pub fn parse_annotation(xml_text: &str) -> Result<AnnotationRecord, AnnotationError> {
    let annotation: VocAnnotation = quick_xml::de::from_str(xml_text)?;

    let filename = annotation
        .filename
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(AnnotationError::MissingField("filename"))?;
    let size = annotation
        .size
        .ok_or(AnnotationError::MissingField("size"))?;
    let image_width = size.width.ok_or(AnnotationError::MissingField("size.width"))?;
    let image_height = size
        .height
        .ok_or(AnnotationError::MissingField("size.height"))?;
    if image_width == 0 || image_height == 0 {
        return Err(AnnotationError::InvalidSize {
            width: image_width,
            height: image_height,
        });
    }

    let objects = annotation
        .object
        .into_iter()
        .enumerate()
        .map(|(index, obj)| obj.into_object(index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnotationRecord {
        filename,
        image_width,
        image_height,
        objects,
    })
}
