use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, ConvertResult};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Create the output directory unless it already exists. Existing files in it
/// are left alone; record files are truncated when they are rewritten.
pub fn ensure_output_directory(path: &Path) -> ConvertResult<()> {
    if path.is_dir() {
        log::info!("Writing into existing directory {}", path.display());
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| ConvertError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy `from` to `to`, overwriting `to`.
pub fn copy_file(from: &Path, to: &Path) -> ConvertResult<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| ConvertError::io(to, e))
}
