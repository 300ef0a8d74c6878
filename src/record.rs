use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::Path;
use tfrecord::RecordWriter;

use crate::annotation::parse_annotation;
use crate::config::{ConversionSettings, Policy};
use crate::error::{AnnotationError, ConvertError, ConvertResult, FailureKind};
use crate::example::{build_example, BuildOutcome};
use crate::label_map::LabelMap;
use crate::types::{RejectReason, WriteStats};
use crate::utils::create_progress_bar;

/// Resolve, parse and build the example with the given id.
pub fn convert_example(
    example_id: &str,
    label_map: &LabelMap,
    annotation_dir: &Path,
    image_dir: &Path,
) -> ConvertResult<BuildOutcome> {
    let annotation_path = annotation_dir.join(format!("{}.xml", example_id));
    let xml_text = fs::read_to_string(&annotation_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::AnnotationNotFound {
            path: annotation_path.clone(),
        },
        _ => ConvertError::io(&annotation_path, e),
    })?;
    let record = match parse_annotation(&xml_text) {
        Ok(record) => record,
        Err(AnnotationError::IncompleteObject { index, field }) => {
            return Ok(BuildOutcome::Rejected(RejectReason::IncompleteObject {
                index,
                field,
            }))
        }
        Err(source) => {
            return Err(ConvertError::MalformedAnnotation {
                path: annotation_path,
                source,
            })
        }
    };
    build_example(&record, label_map, image_dir)
}

/// Write the examples listed in `example_ids` to a TFRecord file at
/// `output_path`, in order.
///
/// Examples that fail are skipped or abort the run according to
/// `settings.policies`; rejected examples are always skipped.
pub fn write_records(
    output_path: &Path,
    label_map: &LabelMap,
    annotation_dir: &Path,
    image_dir: &Path,
    example_ids: &[String],
    settings: &ConversionSettings,
) -> ConvertResult<WriteStats> {
    let record_error = |source| ConvertError::Record {
        path: output_path.to_path_buf(),
        source,
    };
    let mut writer: RecordWriter<Vec<u8>, BufWriter<File>> =
        RecordWriter::create(output_path).map_err(record_error)?;

    let label = output_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Records".to_string());
    let pb = create_progress_bar(example_ids.len() as u64, &label);
    let progress_interval = settings.progress_interval.max(1);
    let mut stats = WriteStats::new(example_ids.len());

    for (idx, example_id) in example_ids.iter().enumerate() {
        if idx % progress_interval == 0 {
            info!("On image {} of {}", idx, example_ids.len());
        }
        pb.inc(1);

        match convert_example(example_id, label_map, annotation_dir, image_dir) {
            Ok(BuildOutcome::Example(example)) => {
                writer.send(example.encode()).map_err(record_error)?;
                stats.written += 1;
            }
            Ok(BuildOutcome::Rejected(reason)) => {
                warn!("Rejected example {}: {}", example_id, reason);
                match reason {
                    RejectReason::UnknownClass { .. } => stats.rejected_unknown_class += 1,
                    RejectReason::IncompleteObject { .. } => {
                        stats.rejected_incomplete_object += 1
                    }
                }
            }
            Err(e) => {
                let kind = match e.failure_kind() {
                    Some(kind) if settings.policies.policy_for(kind) == Policy::Skip => kind,
                    _ => {
                        pb.abandon();
                        return Err(e);
                    }
                };
                warn!("{}, ignoring example.", e);
                match kind {
                    FailureKind::MissingAnnotation => stats.skipped_missing_annotation += 1,
                    FailureKind::MalformedAnnotation => stats.skipped_malformed_annotation += 1,
                    FailureKind::MissingImage => stats.skipped_missing_image += 1,
                    FailureKind::UnsupportedImage => stats.skipped_unsupported_image += 1,
                }
            }
        }
    }

    writer.flush().map_err(record_error)?;
    pb.finish_with_message(format!("{} records complete", label));
    info!(
        "Wrote {} of {} examples to {}",
        stats.written,
        example_ids.len(),
        output_path.display()
    );

    Ok(stats)
}
