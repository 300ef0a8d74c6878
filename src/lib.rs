//! PASCAL VOC to TFRecord converter
//!
//! This library provides functionality to convert PASCAL VOC XML annotations and
//! their JPEG images into TFRecord files of `tensorflow.Example` protos for
//! object detection training.

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod example;
pub mod label_map;
pub mod proto;
pub mod record;
pub mod record_dataset;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use annotation::parse_annotation;
pub use config::{Args, ConversionSettings, ConvertConfig, FailurePolicies, Policy};
pub use dataset::{read_examples_list, split_examples};
pub use error::{AnnotationError, ConvertError, ConvertResult, FailureKind, LabelMapError};
pub use example::{build_example, BuildOutcome, TrainingExample};
pub use label_map::LabelMap;
pub use record::{convert_example, write_records};
pub use record_dataset::process_dataset;
pub use types::{
    AnnotationRecord, BndBox, CorpusSplit, DatasetSummary, ObjectAnnotation, Partition,
    RejectReason, WriteStats,
};
