use log::{info, warn};

use crate::config::ConvertConfig;
use crate::dataset::{read_examples_list, split_examples};
use crate::error::ConvertResult;
use crate::label_map::LabelMap;
use crate::record::write_records;
use crate::types::{DatasetSummary, Partition, WriteStats};
use crate::utils::{copy_file, ensure_output_directory};

/// File name of the label map copy placed next to the record files
pub const LABEL_MAP_FILE_NAME: &str = "label_map.pbtxt";

/// Main conversion pipeline: split the listed examples and write one record
/// file per partition, then copy the label map into the output directory.
pub fn process_dataset(config: &ConvertConfig) -> ConvertResult<DatasetSummary> {
    let settings = &config.settings;
    match serde_json::to_string(settings) {
        Ok(json) => info!("Conversion settings: {}", json),
        Err(e) => warn!("Failed to serialize conversion settings: {}", e),
    }

    let label_map = LabelMap::load(&config.label_map_file)?;
    info!(
        "Loaded {} classes from {}: {}",
        label_map.len(),
        config.label_map_file.display(),
        label_map.class_names().collect::<Vec<_>>().join(", ")
    );

    info!("Reading from dataset.");
    let example_ids = read_examples_list(&config.trainval_file)?;
    let split = split_examples(&example_ids, settings.train_ratio, settings.seed);
    info!(
        "{} training and {} validation examples.",
        split.train.len(),
        split.val.len()
    );

    ensure_output_directory(&config.output_dir)?;

    let write_partition = |partition: Partition| -> ConvertResult<WriteStats> {
        let output_path = config.output_dir.join(partition.record_file_name());
        info!("Creating {}...", output_path.display());
        let stats = write_records(
            &output_path,
            &label_map,
            &config.annotation_dir,
            &config.image_dir,
            split.ids(partition),
            settings,
        )?;
        stats.print_summary(partition);
        Ok(stats)
    };
    let train = write_partition(Partition::Train)?;
    let val = write_partition(Partition::Validation)?;

    copy_file(
        &config.label_map_file,
        &config.output_dir.join(LABEL_MAP_FILE_NAME),
    )?;
    info!("Conversion process completed successfully.");

    Ok(DatasetSummary { train, val })
}
