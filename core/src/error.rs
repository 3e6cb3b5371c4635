use std::path::PathBuf;
use thiserror::Error;

/// Result type for mammoprep operations
pub type Result<T> = std::result::Result<T, MammoprepError>;

/// Error types for mammoprep operations
#[derive(Error, Debug)]
pub enum MammoprepError {
    /// A path field could not be matched to exactly one location-index entry
    #[error(
        "Metadata resolution error: {matches} index rows for study {study_uid}, series {series_uid}"
    )]
    MetadataResolution {
        study_uid: String,
        series_uid: String,
        matches: usize,
    },

    /// A raw path does not have the `<root>/<study>/<series>/...` layout
    #[error("Malformed path field: {0}")]
    MalformedPath(String),

    /// A required column is absent from a table
    #[error("Schema error: column '{column}' missing from {}", table.display())]
    Schema { table: PathBuf, column: String },

    /// Invalid value in a table cell or DICOM tag
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// DICOM reading or decoding error
    #[error("DICOM decode error: {0}")]
    Decode(String),

    /// No candidate mask is pixel-aligned with the source image
    #[error("Ambiguous mask: {0}")]
    AmbiguousMask(String),

    /// Mask carries no positive pixel
    #[error("Mask contains no positive region")]
    EmptyMask,

    /// Degenerate numeric input (e.g. zero-width percentile range)
    #[error("Compute error: {0}")]
    Compute(String),

    /// Geometric failure (no tissue contour, invalid crop size)
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<dicom_object::ReadError> for MammoprepError {
    fn from(e: dicom_object::ReadError) -> Self {
        MammoprepError::Decode(format!("{}", e))
    }
}

impl From<dicom_pixeldata::Error> for MammoprepError {
    fn from(e: dicom_pixeldata::Error) -> Self {
        MammoprepError::Decode(format!("{}", e))
    }
}
