use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConvertError, ConvertResult, FailureKind};

/// Default share of the corpus assigned to the training partition.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.95;
/// Default shuffle seed, fixed so re-runs reproduce the same split.
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Command-line arguments for converting VOC XML annotations to TFRecord files.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Path to the label_map.pbtxt file
    #[arg(long = "label_map_file")]
    pub label_map_file: PathBuf,

    /// Directory containing the JPEG images
    #[arg(long = "image_dir")]
    pub image_dir: PathBuf,

    /// Directory containing the XML annotation files
    #[arg(long = "annotation_dir")]
    pub annotation_dir: PathBuf,

    /// File listing one example id per line
    #[arg(long = "trainval_file")]
    pub trainval_file: PathBuf,

    /// Directory receiving train.record, val.record and label_map.pbtxt
    #[arg(long = "output_dir")]
    pub output_dir: PathBuf,

    /// Optional JSON file with conversion settings
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Proportion of the examples assigned to the training partition
    #[arg(long = "train_ratio", value_parser = validate_ratio)]
    pub train_ratio: Option<f64>,

    /// Seed for the train/validation shuffle
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// What to do when an example has no annotation file
    #[arg(long = "on_missing_annotation", value_enum)]
    pub on_missing_annotation: Option<Policy>,

    /// What to do when an annotation file cannot be parsed
    #[arg(long = "on_malformed_annotation", value_enum)]
    pub on_malformed_annotation: Option<Policy>,

    /// What to do when the image referenced by an annotation is missing
    #[arg(long = "on_missing_image", value_enum)]
    pub on_missing_image: Option<Policy>,

    /// What to do when an image is not a JPEG
    #[arg(long = "on_unsupported_image", value_enum)]
    pub on_unsupported_image: Option<Policy>,
}

/// Per-example failure handling
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Log a warning and continue with the next example
    Skip,
    /// Stop the run with a non-zero exit status
    Abort,
}

/// Failure policies of the record writer. The defaults follow the converter
/// this tool replaces: only missing annotation files are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailurePolicies {
    pub on_missing_annotation: Policy,
    pub on_malformed_annotation: Policy,
    pub on_missing_image: Policy,
    pub on_unsupported_image: Policy,
}

impl Default for FailurePolicies {
    fn default() -> Self {
        Self {
            on_missing_annotation: Policy::Skip,
            on_malformed_annotation: Policy::Abort,
            on_missing_image: Policy::Abort,
            on_unsupported_image: Policy::Abort,
        }
    }
}

impl FailurePolicies {
    /// Skip every recoverable failure instead of aborting.
    pub fn skip_all() -> Self {
        Self {
            on_missing_annotation: Policy::Skip,
            on_malformed_annotation: Policy::Skip,
            on_missing_image: Policy::Skip,
            on_unsupported_image: Policy::Skip,
        }
    }

    pub fn policy_for(&self, kind: FailureKind) -> Policy {
        match kind {
            FailureKind::MissingAnnotation => self.on_missing_annotation,
            FailureKind::MalformedAnnotation => self.on_malformed_annotation,
            FailureKind::MissingImage => self.on_missing_image,
            FailureKind::UnsupportedImage => self.on_unsupported_image,
        }
    }
}

/// Settings that may be supplied through the `--config` JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionSettings {
    pub train_ratio: f64,
    pub seed: u64,
    /// Log progress every this many examples
    pub progress_interval: usize,
    pub policies: FailurePolicies,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            train_ratio: DEFAULT_TRAIN_RATIO,
            seed: DEFAULT_SEED,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            policies: FailurePolicies::default(),
        }
    }
}

impl ConversionSettings {
    pub fn from_file(path: &Path) -> ConvertResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let config_error = |source| ConvertError::Config {
            path: path.to_path_buf(),
            source,
        };
        let settings: Self = serde_json::from_str(&content).map_err(config_error)?;
        if let Err(msg) = validate_ratio(&settings.train_ratio.to_string()) {
            return Err(config_error(serde::de::Error::custom(msg)));
        }
        Ok(settings)
    }
}

/// Everything the dataset driver needs for one run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub label_map_file: PathBuf,
    pub image_dir: PathBuf,
    pub annotation_dir: PathBuf,
    pub trainval_file: PathBuf,
    pub output_dir: PathBuf,
    pub settings: ConversionSettings,
}

impl ConvertConfig {
    /// Paths with default settings.
    pub fn new(
        label_map_file: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        annotation_dir: impl Into<PathBuf>,
        trainval_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label_map_file: label_map_file.into(),
            image_dir: image_dir.into(),
            annotation_dir: annotation_dir.into(),
            trainval_file: trainval_file.into(),
            output_dir: output_dir.into(),
            settings: ConversionSettings::default(),
        }
    }
}

impl Args {
    /// Merge defaults, the optional settings file and command-line flags,
    /// later sources taking precedence.
    pub fn into_config(self) -> ConvertResult<ConvertConfig> {
        let mut settings = match &self.config {
            Some(path) => ConversionSettings::from_file(path)?,
            None => ConversionSettings::default(),
        };

        if let Some(train_ratio) = self.train_ratio {
            settings.train_ratio = train_ratio;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        let policies = &mut settings.policies;
        if let Some(policy) = self.on_missing_annotation {
            policies.on_missing_annotation = policy;
        }
        if let Some(policy) = self.on_malformed_annotation {
            policies.on_malformed_annotation = policy;
        }
        if let Some(policy) = self.on_missing_image {
            policies.on_missing_image = policy;
        }
        if let Some(policy) = self.on_unsupported_image {
            policies.on_unsupported_image = policy;
        }

        Ok(ConvertConfig {
            label_map_file: self.label_map_file,
            image_dir: self.image_dir,
            annotation_dir: self.annotation_dir,
            trainval_file: self.trainval_file,
            output_dir: self.output_dir,
            settings,
        })
    }
}

// Validate that the ratio is in (0.0, 1.0]
pub fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val <= 1.0 => Ok(val),
        _ => Err("RATIO must be greater than 0.0 and at most 1.0".to_string()),
    }
}
