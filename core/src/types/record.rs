use crate::error::{MammoprepError, Result};
use crate::types::{AbnormalityType, Pathology, Severity};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Column holding the stable row identifier in corrected tables
pub const ROW_ID: &str = "row_id";
/// Column holding the lesion category
pub const ABNORMALITY_TYPE: &str = "abnormality type";
/// Column holding the pathology verdict
pub const PATHOLOGY: &str = "pathology";
/// Column holding the full mammogram directory
pub const IMAGE_FILE_PATH: &str = "image_file_path";
/// Column holding the ROI mask directory
pub const ROI_MASK_FILE_PATH: &str = "roi_mask_file_path";
/// Column holding the cropped lesion image directory
pub const CROPPED_IMAGE_FILE_PATH: &str = "cropped_image_file_path";

/// Columns every corrected table must carry
pub const REQUIRED_COLUMNS: [&str; 4] = [ROW_ID, ABNORMALITY_TYPE, PATHOLOGY, IMAGE_FILE_PATH];

/// One row of a corrected case-description table, as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaseRow {
    row_id: String,
    #[serde(rename = "abnormality type")]
    abnormality_type: String,
    pathology: String,
    image_file_path: String,
    #[serde(default)]
    roi_mask_file_path: Option<String>,
    #[serde(default)]
    cropped_image_file_path: Option<String>,
}

/// One abnormality described in a corrected case-description table
///
/// Path fields are relative to the dataset root and point at the directory
/// holding the DICOM file(s), as written by the metadata corrector.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    /// Stable identifier, used as output file stem
    pub row_id: String,

    pub abnormality_type: AbnormalityType,

    pub pathology: Pathology,

    /// Directory of the full mammogram
    pub image_file_path: String,

    /// Directory of the ROI mask, when the table carries one
    pub roi_mask_file_path: Option<String>,

    /// Directory of the cropped lesion image, when the table carries one
    pub cropped_image_file_path: Option<String>,
}

impl CaseRecord {
    /// Returns the two-class severity of this abnormality
    pub fn severity(&self) -> Severity {
        self.pathology.severity()
    }

    /// Resolves the full mammogram directory against the dataset root
    pub fn image_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.image_file_path)
    }

    /// Resolves the directories that may hold the ROI mask
    ///
    /// The ROI mask directory comes first; the cropped image directory is
    /// appended when it differs, since either may contain the true mask.
    pub fn mask_dirs(&self, data_dir: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for rel in [&self.roi_mask_file_path, &self.cropped_image_file_path]
            .into_iter()
            .flatten()
        {
            let dir = data_dir.join(rel);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

impl TryFrom<CaseRow> for CaseRecord {
    type Error = MammoprepError;

    fn try_from(row: CaseRow) -> Result<Self> {
        let abnormality_type = AbnormalityType::from_str(&row.abnormality_type).ok_or_else(|| {
            MammoprepError::InvalidValue(format!(
                "row {}: unknown abnormality type '{}'",
                row.row_id, row.abnormality_type
            ))
        })?;
        let pathology = Pathology::from_str(&row.pathology).ok_or_else(|| {
            MammoprepError::InvalidValue(format!(
                "row {}: unknown pathology '{}'",
                row.row_id, row.pathology
            ))
        })?;

        Ok(Self {
            row_id: row.row_id,
            abnormality_type,
            pathology,
            image_file_path: row.image_file_path,
            roi_mask_file_path: non_empty(row.roi_mask_file_path),
            cropped_image_file_path: non_empty(row.cropped_image_file_path),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
