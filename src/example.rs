use image::ImageFormat;
use log::warn;
use prost::Message;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ConvertError, ConvertResult};
use crate::label_map::LabelMap;
use crate::proto::{Example, Feature};
use crate::types::{
    AnnotationRecord, ExampleObject, RejectReason, IMAGE_FORMAT_JPEG, UNSPECIFIED_POSE,
};

/// One image and its labels, ready to be serialized into a record file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub width: u32,
    pub height: u32,
    pub filename: String,
    pub source_id: String,
    /// Hex SHA-256 of `encoded`
    pub key_sha256: String,
    pub encoded: Vec<u8>,
    pub format: &'static str,
    pub objects: Vec<ExampleObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Example(TrainingExample),
    /// The annotation must not produce a record
    Rejected(RejectReason),
}

/// Load the image of `record` and assemble its training example.
///
/// An object whose class is missing from `label_map` rejects the whole
/// example. Missing or non-JPEG images are returned as errors so the caller
/// decides whether to skip or abort.
pub fn build_example(
    record: &AnnotationRecord,
    label_map: &LabelMap,
    image_dir: &Path,
) -> ConvertResult<BuildOutcome> {
    let image_path = image_dir.join(&record.filename);
    let encoded = fs::read(&image_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::ImageNotFound {
            path: image_path.clone(),
        },
        _ => ConvertError::io(&image_path, e),
    })?;

    match image::guess_format(&encoded) {
        Ok(ImageFormat::Jpeg) => {}
        Ok(other) => {
            return Err(ConvertError::UnsupportedImageFormat {
                path: image_path,
                format: format!("{:?}", other),
            })
        }
        Err(_) => {
            return Err(ConvertError::UnsupportedImageFormat {
                path: image_path,
                format: "an unrecognized format".to_string(),
            })
        }
    }

    let key_sha256 = format!("{:x}", Sha256::digest(&encoded));

    let mut objects = Vec::with_capacity(record.objects.len());
    for object in &record.objects {
        let class_id = match label_map.get(&object.class_name) {
            Some(class_id) => class_id,
            None => {
                warn!(
                    "Unknown class '{}' in {}, rejecting example.",
                    object.class_name,
                    image_path.display()
                );
                return Ok(BuildOutcome::Rejected(RejectReason::UnknownClass {
                    class_name: object.class_name.clone(),
                }));
            }
        };
        objects.push(ExampleObject {
            bbox: object.bbox.normalize(record.image_width, record.image_height),
            class_text: object.class_name.clone(),
            class_id,
        });
    }

    Ok(BuildOutcome::Example(TrainingExample {
        width: record.image_width,
        height: record.image_height,
        filename: record.filename.clone(),
        source_id: record.filename.clone(),
        key_sha256,
        encoded,
        format: IMAGE_FORMAT_JPEG,
        objects,
    }))
}

impl TrainingExample {
    /// Convert into a `tensorflow.Example` using the object detection API keys.
    pub fn to_proto(&self) -> Example {
        let objects = &self.objects;
        let count = objects.len();

        let mut feature = BTreeMap::new();
        let mut insert = |key: &str, value: Feature| {
            feature.insert(key.to_string(), value);
        };

        insert("image/height", Feature::int64(self.height as i64));
        insert("image/width", Feature::int64(self.width as i64));
        insert("image/filename", Feature::bytes(self.filename.as_bytes()));
        insert("image/source_id", Feature::bytes(self.source_id.as_bytes()));
        insert("image/key/sha256", Feature::bytes(self.key_sha256.as_bytes()));
        insert("image/encoded", Feature::bytes(self.encoded.clone()));
        insert("image/format", Feature::bytes(self.format.as_bytes()));
        insert(
            "image/object/bbox/xmin",
            Feature::float_list(objects.iter().map(|o| o.bbox.xmin).collect()),
        );
        insert(
            "image/object/bbox/xmax",
            Feature::float_list(objects.iter().map(|o| o.bbox.xmax).collect()),
        );
        insert(
            "image/object/bbox/ymin",
            Feature::float_list(objects.iter().map(|o| o.bbox.ymin).collect()),
        );
        insert(
            "image/object/bbox/ymax",
            Feature::float_list(objects.iter().map(|o| o.bbox.ymax).collect()),
        );
        insert(
            "image/object/class/text",
            Feature::bytes_list(
                objects
                    .iter()
                    .map(|o| o.class_text.as_bytes().to_vec())
                    .collect(),
            ),
        );
        insert(
            "image/object/class/label",
            Feature::int64_list(objects.iter().map(|o| o.class_id).collect()),
        );
        insert("image/object/difficult", Feature::int64_list(vec![0; count]));
        insert("image/object/truncated", Feature::int64_list(vec![0; count]));
        insert(
            "image/object/view",
            Feature::bytes_list(vec![UNSPECIFIED_POSE.as_bytes().to_vec(); count]),
        );

        Example::from_features(feature)
    }

    /// Serialized protobuf bytes of [to_proto](Self::to_proto).
    pub fn encode(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }
}
