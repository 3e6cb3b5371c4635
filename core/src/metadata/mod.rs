//! Case-description table handling
//!
//! Repairs the path columns of the raw tables against the series location
//! index, and loads the corrected tables as [`CaseRecord`](crate::CaseRecord)s.

pub mod corrector;
pub mod index;
pub mod path;
pub mod tables;

pub use corrector::{correct_metadata_files, correct_table};
pub use index::SeriesLocationIndex;
pub use path::{normalize_and_format_path, study_series_from_path};
pub use tables::{load_case_records, CaseTable};
