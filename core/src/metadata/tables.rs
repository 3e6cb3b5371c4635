use crate::error::{MammoprepError, Result};
use crate::types::record::{CaseRow, REQUIRED_COLUMNS};
use crate::types::{AbnormalityType, CaseRecord, Split};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One of the four case-description tables of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseTable {
    pub abnormality: AbnormalityType,
    pub split: Split,
}

impl CaseTable {
    pub fn new(abnormality: AbnormalityType, split: Split) -> Self {
        Self { abnormality, split }
    }

    /// All case-description tables, mass before calc, train before test
    pub fn all() -> Vec<CaseTable> {
        AbnormalityType::ALL
            .iter()
            .flat_map(|abnormality| {
                Split::ALL
                    .iter()
                    .map(move |split| CaseTable::new(*abnormality, *split))
            })
            .collect()
    }

    /// File stem shared by the raw and corrected variants
    pub fn stem(&self) -> String {
        format!(
            "{}_case_description_{}_set",
            self.abnormality.simple_name(),
            self.split.simple_name()
        )
    }

    pub fn raw_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.csv", self.stem()))
    }

    pub fn corrected_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}_corrected.csv", self.stem()))
    }

    /// Parses a table file name, returning the table and whether it is corrected
    pub fn parse_file_name(name: &str) -> Option<(CaseTable, bool)> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"^(mass|calc)_case_description_(train|test)_set(_corrected)?\.csv$")
                .expect("Failed to compile regex")
        });

        let caps = re.captures(name)?;
        let abnormality = AbnormalityType::from_str(&caps[1])?;
        let split = Split::from_str(&caps[2])?;
        Some((CaseTable::new(abnormality, split), caps.get(3).is_some()))
    }
}

impl fmt::Display for CaseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}

/// Reads a corrected case-description table
///
/// The header is validated up front; rows whose values cannot be interpreted
/// are returned as errors so callers can report them individually.
///
/// # Errors
///
/// Returns a schema error if a required column is missing, or a CSV error if
/// the file cannot be read.
pub fn load_case_records(path: &Path) -> Result<Vec<Result<CaseRecord>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(MammoprepError::Schema {
                table: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let records = reader
        .deserialize::<CaseRow>()
        .map(|row| row.map_err(MammoprepError::from).and_then(CaseRecord::try_from))
        .collect();
    Ok(records)
}
