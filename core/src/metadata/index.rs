use crate::error::{MammoprepError, Result};
use crate::metadata::path::{normalize_and_format_path, study_series_from_path};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

pub const SERIES_UID: &str = "Series UID";
pub const STUDY_UID: &str = "Study UID";
pub const FILE_LOCATION: &str = "File Location";
pub const SERIES_DESCRIPTION: &str = "Series Description";

/// Lookup from (Study UID, Series UID) to the on-disk series directory
///
/// Built once from the flat `metadata.csv` table and read-only afterwards.
/// Duplicate keys are kept so that ambiguous lookups can be reported instead
/// of silently resolved.
#[derive(Debug, Clone, Default)]
pub struct SeriesLocationIndex {
    locations: HashMap<(String, String), Vec<String>>,
}

impl SeriesLocationIndex {
    /// Builds an index from (study UID, series UID, file location) triples
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let mut locations: HashMap<(String, String), Vec<String>> = HashMap::new();
        for (study, series, location) in entries {
            locations
                .entry((study.into(), series.into()))
                .or_default()
                .push(location.into());
        }
        Self { locations }
    }

    /// Reads the series location table
    ///
    /// When `description` is given, only series whose `Series Description`
    /// equals it are indexed.
    ///
    /// # Errors
    ///
    /// Returns a schema error if a required column is missing.
    pub fn from_csv(path: &Path, description: Option<&str>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| MammoprepError::Schema {
                    table: path.to_path_buf(),
                    column: name.to_string(),
                })
        };
        let series_idx = column(SERIES_UID)?;
        let study_idx = column(STUDY_UID)?;
        let location_idx = column(FILE_LOCATION)?;
        let description_idx = match description {
            Some(_) => Some(column(SERIES_DESCRIPTION)?),
            None => None,
        };

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let (Some(wanted), Some(idx)) = (description, description_idx) {
                if record.get(idx).map(str::trim) != Some(wanted) {
                    continue;
                }
            }
            let field = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();
            entries.push((field(study_idx), field(series_idx), field(location_idx)));
        }

        let index = Self::from_entries(entries);
        debug!(
            "Indexed {} series from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Number of distinct (study, series) keys
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns the raw location of a series
    ///
    /// # Errors
    ///
    /// Returns a metadata resolution error unless exactly one entry matches.
    pub fn lookup(&self, study_uid: &str, series_uid: &str) -> Result<&str> {
        let matches = self
            .locations
            .get(&(study_uid.to_string(), series_uid.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match matches {
            [location] => Ok(location.as_str()),
            _ => Err(MammoprepError::MetadataResolution {
                study_uid: study_uid.to_string(),
                series_uid: series_uid.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Resolves a raw table path to its normalized series location
    pub fn resolve(&self, raw_path: &str) -> Result<String> {
        let (study, series) = study_series_from_path(raw_path)?;
        let location = self.lookup(&study, &series)?;
        Ok(normalize_and_format_path(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_index() -> SeriesLocationIndex {
        SeriesLocationIndex::from_entries([
            ("1.2.1", "1.2.1.1", r".\CBIS-DDSM\Mass-Training_P_00001_LEFT_CC\07-20-2016\1-full mammogram images-24515"),
            ("1.2.2", "1.2.2.1", r".\CBIS-DDSM\Mass-Training_P_00001_LEFT_CC_1\08-01-2016\1-ROI mask images-1"),
            ("1.2.3", "1.2.3.1", "a"),
            ("1.2.3", "1.2.3.1", "b"),
        ])
    }

    #[test]
    fn test_lookup_single_match() {
        let index = make_index();
        assert_eq!(index.len(), 3);
        assert!(index.lookup("1.2.1", "1.2.1.1").unwrap().ends_with("24515"));
    }

    #[test]
    fn test_lookup_requires_exact_pair() {
        let index = make_index();
        // Series of another study
        let err = index.lookup("1.2.1", "1.2.2.1").unwrap_err();
        assert!(matches!(
            err,
            MammoprepError::MetadataResolution { matches: 0, .. }
        ));
    }

    #[test]
    fn test_lookup_ambiguous() {
        let index = make_index();
        let err = index.lookup("1.2.3", "1.2.3.1").unwrap_err();
        assert!(matches!(
            err,
            MammoprepError::MetadataResolution { matches: 2, .. }
        ));
    }

    #[test]
    fn test_resolve_normalizes() {
        let index = make_index();
        let resolved = index
            .resolve("Mass-Training_P_00001_LEFT_CC/1.2.1/1.2.1.1/000000.dcm")
            .unwrap();
        assert_eq!(
            resolved,
            "CBIS-DDSM/Mass-Training_P_00001_LEFT_CC/07-20-2016/01-full mammogram images-24515"
        );
    }

    #[test]
    fn test_from_csv_with_description_filter() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "Series UID,Collection,Study UID,Series Description,File Location"
        )
        .unwrap();
        writeln!(file, "s1,CBIS-DDSM,t1,full mammogram images,.\\x\\1-a").unwrap();
        writeln!(file, "s2,CBIS-DDSM,t2,ROI mask images,.\\y\\1-b").unwrap();
        file.flush().unwrap();

        let all = SeriesLocationIndex::from_csv(file.path(), None).unwrap();
        assert_eq!(all.len(), 2);

        let full = SeriesLocationIndex::from_csv(file.path(), Some("full mammogram images")).unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(full.lookup("t1", "s1").unwrap(), ".\\x\\1-a");
    }

    #[test]
    fn test_from_csv_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Series UID,Study UID").unwrap();
        writeln!(file, "s1,t1").unwrap();
        file.flush().unwrap();

        let err = SeriesLocationIndex::from_csv(file.path(), None).unwrap_err();
        match err {
            MammoprepError::Schema { column, .. } => assert_eq!(column, FILE_LOCATION),
            other => panic!("unexpected error: {other}"),
        }
    }
}
