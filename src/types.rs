use std::fmt;

/// Format tag of every encoded image; JPEG is the only accepted encoding.
pub const IMAGE_FORMAT_JPEG: &str = "jpeg";

/// Pose written for every object; the annotation pose is not carried over.
pub const UNSPECIFIED_POSE: &str = "Unspecified";

/// A pixel-space bounding box as found in `<bndbox>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BndBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BndBox {
    /// Scale to fractional coordinates of a `width` x `height` image.
    pub fn normalize(&self, width: u32, height: u32) -> NormalizedBox {
        let width = width as f64;
        let height = height as f64;
        NormalizedBox {
            xmin: (self.xmin / width) as f32,
            ymin: (self.ymin / height) as f32,
            xmax: (self.xmax / width) as f32,
            ymax: (self.ymax / height) as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

// One labeled object instance of an annotation
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAnnotation {
    pub class_name: String,
    pub bbox: BndBox,
}

// The parsed ground truth of one image
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub filename: String,
    pub image_width: u32,
    pub image_height: u32,
    pub objects: Vec<ObjectAnnotation>,
}

/// One labeled object of a [TrainingExample](crate::example::TrainingExample).
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleObject {
    pub bbox: NormalizedBox,
    pub class_text: String,
    pub class_id: i64,
}

/// Why the example builder refused an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnknownClass { class_name: String },
    IncompleteObject { index: usize, field: &'static str },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownClass { class_name } => {
                write!(f, "class '{}' is not in the label map", class_name)
            }
            RejectReason::IncompleteObject { index, field } => {
                write!(f, "object {} has no `{}`", index, field)
            }
        }
    }
}

/// The two output partitions of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    Validation,
}

impl Partition {
    pub fn record_file_name(self) -> &'static str {
        match self {
            Partition::Train => "train.record",
            Partition::Validation => "val.record",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Partition::Train => "Train",
            Partition::Validation => "Val",
        }
    }
}

// Example ids assigned to the train and validation partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSplit {
    pub train: Vec<String>,
    pub val: Vec<String>,
}

impl CorpusSplit {
    pub fn ids(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.val,
        }
    }
}

// Counters for one record file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    pub total_examples: usize,
    pub written: usize,
    pub skipped_missing_annotation: usize,
    pub skipped_malformed_annotation: usize,
    pub skipped_missing_image: usize,
    pub skipped_unsupported_image: usize,
    pub rejected_unknown_class: usize,
    pub rejected_incomplete_object: usize,
}

impl WriteStats {
    pub fn new(total_examples: usize) -> Self {
        Self {
            total_examples,
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_missing_annotation
            + self.skipped_malformed_annotation
            + self.skipped_missing_image
            + self.skipped_unsupported_image
            + self.rejected_unknown_class
            + self.rejected_incomplete_object
    }

    pub fn print_summary(&self, partition: Partition) {
        log::info!("=== {} Record Summary ===", partition.label());
        log::info!("Examples listed: {}", self.total_examples);
        log::info!("Records written: {}", self.written);

        let skipped = self.skipped();
        if skipped > 0 {
            log::warn!(
                "Skipped {} examples (missing annotation: {}, malformed annotation: {}, missing image: {}, unsupported image: {}, unknown class: {}, incomplete object: {})",
                skipped,
                self.skipped_missing_annotation,
                self.skipped_malformed_annotation,
                self.skipped_missing_image,
                self.skipped_unsupported_image,
                self.rejected_unknown_class,
                self.rejected_incomplete_object
            );
        }
    }
}

/// Result of a full conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub train: WriteStats,
    pub val: WriteStats,
}
