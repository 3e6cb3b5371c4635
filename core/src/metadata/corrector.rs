use crate::error::{MammoprepError, Result};
use crate::metadata::index::SeriesLocationIndex;
use crate::metadata::tables::CaseTable;
use crate::types::record::{
    ABNORMALITY_TYPE, CROPPED_IMAGE_FILE_PATH, IMAGE_FILE_PATH, PATHOLOGY, ROI_MASK_FILE_PATH,
    ROW_ID,
};
use csv::StringRecord;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Raw column names and their canonical replacements
const COLUMN_RENAMES: [(&str, &str); 8] = [
    ("left or right breast", "left_or_right_breast"),
    ("image view", "image_view"),
    ("abnormality id", "abnormality_id"),
    ("mass shape", "mass_shape"),
    ("mass margins", "mass_margins"),
    ("image file path", IMAGE_FILE_PATH),
    ("cropped image file path", CROPPED_IMAGE_FILE_PATH),
    ("ROI mask file path", ROI_MASK_FILE_PATH),
];

/// Path-bearing columns corrected whenever present
const PATH_COLUMNS: [&str; 3] = [IMAGE_FILE_PATH, ROI_MASK_FILE_PATH, CROPPED_IMAGE_FILE_PATH];

/// Columns a raw table must carry (after renaming)
const RAW_REQUIRED_COLUMNS: [&str; 3] = [ABNORMALITY_TYPE, PATHOLOGY, IMAGE_FILE_PATH];

fn canonical_column(name: &str) -> &str {
    let name = name.trim();
    COLUMN_RENAMES
        .iter()
        .find(|(raw, _)| *raw == name)
        .map_or(name, |(_, canonical)| *canonical)
}

/// Writes a corrected copy of one case-description table
///
/// Column names are canonicalised, a leading `row_id` column is added and
/// every path column present is replaced by its resolved, normalized series
/// location. The output is written to a temporary file and moved into place
/// only once every row resolved, so a failed pass never leaves a partial
/// corrected table behind.
///
/// # Errors
///
/// Aborts on the first row whose path cannot be resolved to exactly one
/// index entry, or if a required column is missing.
pub fn correct_table(raw: &Path, corrected: &Path, index: &SeriesLocationIndex) -> Result<usize> {
    let mut reader = csv::Reader::from_path(raw)?;
    let headers: StringRecord = reader.headers()?.iter().map(canonical_column).collect();

    for column in RAW_REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(MammoprepError::Schema {
                table: raw.to_path_buf(),
                column: column.to_string(),
            });
        }
    }
    let path_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| PATH_COLUMNS.contains(h))
        .map(|(i, _)| i)
        .collect();

    let tmp = corrected.with_extension("csv.tmp");
    let written = write_corrected_rows(raw, &mut reader, &headers, &path_indices, &tmp, index)
        .and_then(|rows| {
            fs::rename(&tmp, corrected)?;
            Ok(rows)
        });
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

/// Streams the corrected rows of `reader` into `tmp`
fn write_corrected_rows(
    raw: &Path,
    reader: &mut csv::Reader<fs::File>,
    headers: &StringRecord,
    path_indices: &[usize],
    tmp: &Path,
    index: &SeriesLocationIndex,
) -> Result<usize> {
    let mut writer = csv::Writer::from_path(tmp)?;
    writer.write_record(std::iter::once(ROW_ID).chain(headers.iter()))?;

    let mut rows = 0;
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut fields: Vec<String> = Vec::with_capacity(record.len() + 1);
        fields.push(row_idx.to_string());

        for (col_idx, value) in record.iter().enumerate() {
            if path_indices.contains(&col_idx) && !value.trim().is_empty() {
                let path = index.resolve(value).map_err(|e| {
                    error!("{} row {}: {}", raw.display(), row_idx, e);
                    e
                })?;
                fields.push(path);
            } else {
                fields.push(value.to_string());
            }
        }

        writer.write_record(&fields)?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

/// Corrects every case-description table found under `data_dir`
///
/// Tables whose corrected variant already exists are left untouched unless
/// `force` is set. Missing raw tables are skipped with a warning.
///
/// Returns the paths of the corrected tables available afterwards.
pub fn correct_metadata_files(
    data_dir: &Path,
    index: &SeriesLocationIndex,
    force: bool,
) -> Result<Vec<PathBuf>> {
    let mut corrected_tables = Vec::new();

    for table in CaseTable::all() {
        let raw = table.raw_path(data_dir);
        let corrected = table.corrected_path(data_dir);

        if corrected.is_file() && !force {
            info!("Using existing corrected table {}", corrected.display());
            corrected_tables.push(corrected);
            continue;
        }
        if !raw.is_file() {
            warn!("Table {} not found, skipping", raw.display());
            continue;
        }

        info!("Correcting {}", raw.display());
        let rows = correct_table(&raw, &corrected, index)?;
        info!("Wrote {} rows to {}", rows, corrected.display());
        corrected_tables.push(corrected);
    }

    Ok(corrected_tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RAW_HEADER: &str = "patient_id,breast_density,left or right breast,image view,abnormality id,abnormality type,mass shape,mass margins,assessment,pathology,subtlety,image file path,cropped image file path,ROI mask file path";

    fn make_index() -> SeriesLocationIndex {
        SeriesLocationIndex::from_entries([
            ("st1", "se1", r".\CBIS-DDSM\Mass-Training_P_00001_LEFT_CC\07-20-2016-DDSM-74994\1-full mammogram images-24515"),
            ("st2", "se2", r".\CBIS-DDSM\Mass-Training_P_00001_LEFT_CC_1\07-21-2016-DDSM-85364\1-ROI mask images-90203"),
        ])
    }

    fn write_raw(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("mass_case_description_train_set.csv");
        let mut content = format!("{}\n", RAW_HEADER);
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_correct_table() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(
            dir.path(),
            &["P_00001,3,LEFT,CC,1,mass,IRREGULAR,SPICULATED,4,MALIGNANT,4,Mass-Training_P_00001_LEFT_CC/st1/se1/000000.dcm,Mass-Training_P_00001_LEFT_CC_1/st2/se2/000000.dcm,\"Mass-Training_P_00001_LEFT_CC_1/st2/se2/000001.dcm\n\""],
        );
        let corrected = dir.path().join("out.csv");

        let rows = correct_table(&raw, &corrected, &make_index()).unwrap();
        assert_eq!(rows, 1);

        let mut reader = csv::Reader::from_path(&corrected).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some(ROW_ID));
        assert!(headers.iter().any(|h| h == "left_or_right_breast"));
        assert!(headers.iter().any(|h| h == ABNORMALITY_TYPE));

        let record = reader.records().next().unwrap().unwrap();
        let column = |name: &str| {
            let idx = headers.iter().position(|h| h == name).unwrap();
            record.get(idx).unwrap().to_string()
        };
        assert_eq!(column(ROW_ID), "0");
        assert_eq!(
            column(IMAGE_FILE_PATH),
            "CBIS-DDSM/Mass-Training_P_00001_LEFT_CC/07-20-2016-DDSM-74994/01-full mammogram images-24515"
        );
        assert_eq!(
            column(ROI_MASK_FILE_PATH),
            "CBIS-DDSM/Mass-Training_P_00001_LEFT_CC_1/07-21-2016-DDSM-85364/01-ROI mask images-90203"
        );
        assert_eq!(column(CROPPED_IMAGE_FILE_PATH), column(ROI_MASK_FILE_PATH));
        assert_eq!(column("pathology"), "MALIGNANT");
    }

    #[test]
    fn test_correct_table_unresolved_row_aborts() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(
            dir.path(),
            &["P_00001,3,LEFT,CC,1,mass,IRREGULAR,SPICULATED,4,MALIGNANT,4,Mass-Training_P_00001_LEFT_CC/st9/se9/000000.dcm,,"],
        );
        let corrected = dir.path().join("out.csv");

        let err = correct_table(&raw, &corrected, &make_index()).unwrap_err();
        assert!(matches!(
            err,
            MammoprepError::MetadataResolution { matches: 0, .. }
        ));
        assert!(!corrected.exists());
        assert!(!corrected.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_correct_table_malformed_row_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(
            dir.path(),
            &[
                "P_00001,3,LEFT,CC,1,mass,IRREGULAR,SPICULATED,4,MALIGNANT,4,Mass-Training_P_00001_LEFT_CC/st1/se1/000000.dcm,,",
                "P_00002,3,LEFT,CC,1,mass,IRREGULAR",
            ],
        );
        let corrected = dir.path().join("out.csv");

        let err = correct_table(&raw, &corrected, &make_index()).unwrap_err();
        assert!(matches!(err, MammoprepError::Csv(_)));
        assert!(!corrected.exists());
        assert!(!corrected.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_correct_table_missing_column() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("mass_case_description_train_set.csv");
        fs::write(&raw, "patient_id,image file path\nP_1,a/b/c/d.dcm\n").unwrap();

        let err = correct_table(&raw, &dir.path().join("out.csv"), &make_index()).unwrap_err();
        assert!(matches!(err, MammoprepError::Schema { .. }));
    }

    #[test]
    fn test_correct_metadata_files_skips_existing() {
        let dir = TempDir::new().unwrap();
        write_raw(
            dir.path(),
            &["P_00001,3,LEFT,CC,1,mass,IRREGULAR,SPICULATED,4,MALIGNANT,4,Mass-Training_P_00001_LEFT_CC/st1/se1/000000.dcm,,"],
        );
        let existing = CaseTable::new(crate::types::AbnormalityType::Calc, crate::types::Split::Test)
            .corrected_path(dir.path());
        fs::write(&existing, "row_id\n").unwrap();

        let tables = correct_metadata_files(dir.path(), &make_index(), false).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.contains(&existing));
        assert!(dir
            .path()
            .join("mass_case_description_train_set_corrected.csv")
            .is_file());
        // Existing corrected table was not rewritten
        assert_eq!(fs::read_to_string(&existing).unwrap(), "row_id\n");
    }
}
