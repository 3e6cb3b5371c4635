use crate::error::Result;
use crate::extraction::ShapeMatchResolver;
use crate::metadata::{correct_metadata_files, CaseTable, SeriesLocationIndex};
use crate::pipeline::{prepare_dataset, RunSummary};
use crate::types::PrepConfig;
use log::{info, warn};
use std::path::PathBuf;

/// Name of the series location index at the dataset root
pub const METADATA_FILE: &str = "metadata.csv";

/// Main entry point for preparing a training dataset
///
/// Ties together table correction and dataset preparation for one
/// [`PrepConfig`].
///
/// # Example
///
/// ```
/// use mammoprep_core::{DatasetPreparer, PrepConfig, Task};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = PrepConfig::new(dir.path())
///     .with_out_dir(dir.path().join("out"))
///     .with_task(Task::Scan);
///
/// // No case-description table in the directory: nothing to prepare
/// let summary = DatasetPreparer::new(config).run().unwrap();
/// assert_eq!(summary.total_rows(), 0);
/// assert_eq!(summary.task, "scan");
/// ```
pub struct DatasetPreparer {
    config: PrepConfig,
}

impl DatasetPreparer {
    pub fn new(config: PrepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Loads the series location index from `metadata.csv`
    pub fn build_index(&self) -> Result<SeriesLocationIndex> {
        let path = self.config.data_dir().join(METADATA_FILE);
        info!("Loading series locations from {}", path.display());
        let index = SeriesLocationIndex::from_csv(&path, self.config.series_description.as_deref())?;
        info!("Indexed {} series", index.len());
        Ok(index)
    }

    /// Returns whether some raw table still needs a corrected copy
    pub fn needs_correction(&self) -> bool {
        let data_dir = self.config.data_dir();
        CaseTable::all().iter().any(|table| {
            table.raw_path(data_dir).is_file()
                && (self.config.force_correction || !table.corrected_path(data_dir).is_file())
        })
    }

    /// Writes the corrected tables and returns every corrected table available
    ///
    /// The location index is only loaded when a table has to be corrected.
    ///
    /// # Errors
    ///
    /// Any correction failure aborts the whole pass.
    pub fn correct_tables(&self) -> Result<Vec<(CaseTable, PathBuf)>> {
        let data_dir = self.config.data_dir();
        let paths = if self.needs_correction() {
            let index = self.build_index()?;
            correct_metadata_files(data_dir, &index, self.config.force_correction)?
        } else {
            CaseTable::all()
                .iter()
                .map(|table| table.corrected_path(data_dir))
                .filter(|path| path.is_file())
                .collect()
        };

        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            match name.as_deref().and_then(CaseTable::parse_file_name) {
                Some((table, true)) => tables.push((table, path)),
                _ => warn!("Ignoring unexpected table {}", path.display()),
            }
        }
        Ok(tables)
    }

    /// Corrects the tables if needed and prepares the dataset
    pub fn run(&self) -> Result<RunSummary> {
        let tables = self.correct_tables()?;
        if tables.is_empty() {
            warn!(
                "No case-description table found in {}",
                self.config.data_dir().display()
            );
        }
        prepare_dataset(&self.config, &tables, ShapeMatchResolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::loader::test_support::write_dicom;
    use crate::types::Task;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const METADATA: &str = "Series UID,Study UID,Series Description,File Location\n\
        1.1.1,1.1,full mammogram images,./CBIS-DDSM/Mass-Training_P_00001_LEFT_CC/07-20-2016/1-full mammogram images-24515\n\
        2.2.2,2.2,ROI mask images,./CBIS-DDSM/Mass-Training_P_00001_LEFT_CC_1/07-21-2016/1-ROI mask images-8848\n";

    const RAW_TABLE: &str = "patient_id,breast_density,left or right breast,image view,abnormality id,abnormality type,mass shape,mass margins,assessment,pathology,subtlety,image file path,cropped image file path,ROI mask file path\n\
        P_00001,3,LEFT,CC,1,mass,IRREGULAR,SPICULATED,4,MALIGNANT,5,Mass-Training_P_00001_LEFT_CC/1.1/1.1.1/000000.dcm,Mass-Training_P_00001_LEFT_CC_1/2.2/2.2.2/000000.dcm,Mass-Training_P_00001_LEFT_CC_1/2.2/2.2.2/000001.dcm\n";

    fn write_raw_dataset(root: &Path) {
        fs::write(root.join(METADATA_FILE), METADATA).unwrap();
        fs::write(root.join("mass_case_description_train_set.csv"), RAW_TABLE).unwrap();

        let image_dir = root.join("CBIS-DDSM/Mass-Training_P_00001_LEFT_CC/07-20-2016/01-full mammogram images-24515");
        fs::create_dir_all(&image_dir).unwrap();
        let pixels: Vec<u16> = (0..32u16 * 32).map(|i| i % 32 * 20).collect();
        write_dicom(&image_dir.join("1-1.dcm"), 32, 32, &pixels, "MONOCHROME2", None);

        let mask_dir = root.join("CBIS-DDSM/Mass-Training_P_00001_LEFT_CC_1/07-21-2016/01-ROI mask images-8848");
        fs::create_dir_all(&mask_dir).unwrap();
        let mask: Vec<u16> = (0..32u32 * 32)
            .map(|i| u16::from((10..20).contains(&(i % 32)) && (10..20).contains(&(i / 32))))
            .collect();
        write_dicom(&mask_dir.join("1-1.dcm"), 32, 32, &mask, "MONOCHROME2", None);
    }

    #[test]
    fn test_run_corrects_then_prepares() {
        let tmp = TempDir::new().unwrap();
        write_raw_dataset(tmp.path());
        let config = PrepConfig::new(tmp.path())
            .with_out_dir(tmp.path().join("out"))
            .with_task(Task::RoiMassSeverity)
            .with_img_size(8)
            .with_padding(2)
            .with_threads(Some(1))
            .with_seed(Some(0));
        let preparer = DatasetPreparer::new(config);
        assert!(preparer.needs_correction());

        let summary = preparer.run().unwrap();
        assert!(tmp
            .path()
            .join("mass_case_description_train_set_corrected.csv")
            .is_file());
        assert!(!preparer.needs_correction());
        assert_eq!(summary.total_processed(), 1, "{:?}", summary.skipped);
        assert_eq!(summary.total_written(), 3);
        assert!(tmp
            .path()
            .join("out/roi-mass-severity/train/mass_MALIGNANT/0_0.png")
            .is_file());
    }

    #[test]
    fn test_existing_corrected_tables_skip_index() {
        let tmp = TempDir::new().unwrap();
        // No metadata.csv: the index must not be needed
        fs::write(
            tmp.path().join("calc_case_description_test_set_corrected.csv"),
            "row_id,abnormality type,pathology,image_file_path\n",
        )
        .unwrap();
        let preparer = DatasetPreparer::new(PrepConfig::new(tmp.path()));

        let tables = preparer.correct_tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0.stem(), "calc_case_description_test_set");
    }

    #[test]
    fn test_missing_index_fails_correction() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mass_case_description_train_set.csv"), RAW_TABLE).unwrap();
        let preparer = DatasetPreparer::new(PrepConfig::new(tmp.path()));
        assert!(preparer.run().is_err());
    }
}
