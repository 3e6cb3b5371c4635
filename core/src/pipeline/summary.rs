use crate::error::MammoprepError;
use crate::types::Split;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Why a row produced no output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
pub enum SkipReason {
    /// The table row itself could not be interpreted
    InvalidRecord,
    /// Image or mask file missing, unreadable or lacking required tags
    Decode,
    /// No mask candidate is aligned with the source image
    AmbiguousMask,
    /// The mask has no positive pixel
    EmptyMask,
    /// Degenerate intensity range during normalization
    Compute,
    /// No tissue contour, or a patch too small to crop
    Geometry,
    /// Output could not be written
    Io,
}

impl SkipReason {
    /// Classifies a row-level error
    pub fn from_error(error: &MammoprepError) -> Self {
        match error {
            MammoprepError::Decode(_) => SkipReason::Decode,
            MammoprepError::AmbiguousMask(_) => SkipReason::AmbiguousMask,
            MammoprepError::EmptyMask => SkipReason::EmptyMask,
            MammoprepError::Compute(_) => SkipReason::Compute,
            MammoprepError::Geometry(_) => SkipReason::Geometry,
            MammoprepError::IoError(_) | MammoprepError::Image(_) => SkipReason::Io,
            MammoprepError::InvalidValue(_)
            | MammoprepError::Csv(_)
            | MammoprepError::MalformedPath(_)
            | MammoprepError::Schema { .. }
            | MammoprepError::MetadataResolution { .. }
            | MammoprepError::ThreadPool(_) => SkipReason::InvalidRecord,
        }
    }

    pub fn simple_name(&self) -> &'static str {
        match self {
            SkipReason::InvalidRecord => "invalid-record",
            SkipReason::Decode => "decode",
            SkipReason::AmbiguousMask => "ambiguous-mask",
            SkipReason::EmptyMask => "empty-mask",
            SkipReason::Compute => "compute",
            SkipReason::Geometry => "geometry",
            SkipReason::Io => "io",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// A row excluded from the prepared dataset
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SkippedRow {
    /// Table the row belongs to
    pub table: String,

    /// Row identifier, or the 0-based record position when unreadable
    pub row_id: String,

    /// Image directory of the row, when known
    pub path: Option<String>,

    pub reason: SkipReason,

    /// Error message
    pub message: String,
}

/// Counts for one case-description table
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TableSummary {
    pub table: String,
    pub split: Split,
    /// Rows read from the table
    pub rows: usize,
    /// Rows that produced output
    pub processed: usize,
    /// Files written
    pub written: usize,
    pub skipped: usize,
}

impl TableSummary {
    pub fn new(table: impl Into<String>, split: Split) -> Self {
        Self {
            table: table.into(),
            split,
            rows: 0,
            processed: 0,
            written: 0,
            skipped: 0,
        }
    }
}

/// Counts for the augmentation pass over the training split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AugmentationSummary {
    /// Source images found
    pub images: usize,
    /// Augmented files written
    pub written: usize,
    /// Source images that could not be augmented
    pub failed: usize,
}

/// Outcome of a whole preparation run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RunSummary {
    /// Output directory name of the task
    pub task: String,

    /// Root the images were written under
    pub output_dir: PathBuf,

    pub tables: Vec<TableSummary>,

    pub skipped: Vec<SkippedRow>,

    /// Set when the training split was augmented
    pub augmentation: Option<AugmentationSummary>,
}

impl RunSummary {
    pub fn new(task: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            task: task.into(),
            output_dir: output_dir.into(),
            tables: Vec::new(),
            skipped: Vec::new(),
            augmentation: None,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn total_processed(&self) -> usize {
        self.tables.iter().map(|t| t.processed).sum()
    }

    pub fn total_written(&self) -> usize {
        self.tables.iter().map(|t| t.written).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }

    /// Number of skipped rows per reason
    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.skipped {
            *counts.entry(row.reason).or_insert(0) += 1;
        }
        counts
    }
}
