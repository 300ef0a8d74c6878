use std::path::PathBuf;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors raised while parsing a `.pbtxt` label map.
#[derive(Debug, Error)]
pub enum LabelMapError {
    #[error("syntax error on line {line}: {msg}")]
    Syntax { line: usize, msg: String },
    #[error("item ending on line {line} has no `{field}` field")]
    MissingField { line: usize, field: &'static str },
    #[error("class '{name}' has non-positive id {id}")]
    NonPositiveId { name: String, id: i64 },
    #[error("id {id} is assigned to both '{first}' and '{second}'")]
    DuplicateId {
        id: i64,
        first: String,
        second: String,
    },
    #[error("class '{0}' is declared more than once")]
    DuplicateName(String),
}

/// Errors raised while parsing one XML annotation document.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("invalid annotation xml: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("image size must be positive, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("object {index} has no `{field}`")]
    IncompleteObject { index: usize, field: &'static str },
}

/// Failure kinds the record writer can be configured to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingAnnotation,
    MalformedAnnotation,
    MissingImage,
    UnsupportedImage,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed label map {path}: {source}")]
    MalformedLabelMap {
        path: PathBuf,
        #[source]
        source: LabelMapError,
    },
    #[error("annotation file not found: {path}")]
    AnnotationNotFound { path: PathBuf },
    #[error("malformed annotation {path}: {source}")]
    MalformedAnnotation {
        path: PathBuf,
        #[source]
        source: AnnotationError,
    },
    #[error("image file not found: {path}")]
    ImageNotFound { path: PathBuf },
    #[error("image {path} is {format}, expected JPEG")]
    UnsupportedImageFormat { path: PathBuf, format: String },
    #[error("failed to write record file {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: tfrecord::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error for the per-example skip/abort policy.
    /// `None` means the error is always fatal.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ConvertError::AnnotationNotFound { .. } => Some(FailureKind::MissingAnnotation),
            ConvertError::MalformedAnnotation { .. } => Some(FailureKind::MalformedAnnotation),
            ConvertError::ImageNotFound { .. } => Some(FailureKind::MissingImage),
            ConvertError::UnsupportedImageFormat { .. } => Some(FailureKind::UnsupportedImage),
            _ => None,
        }
    }
}
