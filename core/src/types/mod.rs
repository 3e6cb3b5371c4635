//! Core type definitions for dataset preparation
//!
//! This module provides the fundamental types used throughout the mammoprep library:
//! - [`AbnormalityType`], [`Pathology`], [`Severity`]: lesion labelling
//! - [`Split`] and [`Task`]: how a run is organised on disk
//! - [`PhotometricInterpretation`]: DICOM display polarity
//! - [`BoundingBox`]: pixel-space boxes for crops and patches
//! - [`CaseRecord`]: one row of a corrected case-description table
//! - [`PrepConfig`]: configuration of a preparation run

mod bbox;
mod config;
mod enums;
pub mod record;

pub use bbox::BoundingBox;
pub use config::PrepConfig;
pub use enums::{AbnormalityType, Pathology, PhotometricInterpretation, Severity, Split, Task};
pub use record::CaseRecord;
