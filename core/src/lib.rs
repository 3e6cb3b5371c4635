pub mod api;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod metadata;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use api::DatasetPreparer;
pub use cli::report::TextReport;
pub use error::{MammoprepError, Result};
pub use pipeline::{RowOutcome, RunSummary, SkipReason};
pub use types::*;
