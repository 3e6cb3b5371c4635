//! Dataset preparation: per-row processing, worker pool, augmentation and
//! run summary

pub mod augment;
pub mod dataset;
pub mod row;
pub mod summary;

pub use augment::{augment_training_split, AUGMENTED_PREFIX};
pub use dataset::{class_dir, prepare_dataset, prepare_output_dirs};
pub use row::{RowOutcome, RowProcessor};
pub use summary::{AugmentationSummary, RunSummary, SkipReason, SkippedRow, TableSummary};
