use crate::error::Result;
use crate::extraction::MaskResolver;
use crate::metadata::{load_case_records, CaseTable};
use crate::pipeline::augment::augment_training_split;
use crate::pipeline::row::{RowOutcome, RowProcessor};
use crate::pipeline::summary::{RunSummary, SkipReason, SkippedRow, TableSummary};
use crate::processing::Augmenter;
use crate::types::{AbnormalityType, CaseRecord, PrepConfig, Split};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Creates the output tree of a task
///
/// The task directory is removed first when `clean_output` is set. One class
/// directory per split and label is created, so workers never create
/// directories themselves.
pub fn prepare_output_dirs(config: &PrepConfig, splits: &[Split]) -> Result<()> {
    let task_dir = config.task_dir();
    if config.clean_output && task_dir.exists() {
        info!("Removing previous output {}", task_dir.display());
        fs::remove_dir_all(&task_dir)?;
    }

    for split in splits {
        for abnormality in AbnormalityType::ALL {
            if !config.task.includes(abnormality) {
                continue;
            }
            for label in config.task.class_labels(abnormality) {
                fs::create_dir_all(task_dir.join(split.simple_name()).join(label))?;
            }
        }
    }
    Ok(())
}

/// Directory a record's images are written to
pub fn class_dir(config: &PrepConfig, split: Split, record: &CaseRecord) -> PathBuf {
    config
        .task_dir()
        .join(split.simple_name())
        .join(config.task.class_label(record.abnormality_type, record.severity()))
}

/// Prepares the dataset of the configured task from corrected tables
///
/// Tables whose lesion category is excluded by the task are ignored. Rows
/// are processed on a pool of `config.threads` workers (one per core by
/// default); a failing row is logged and recorded in the summary, never
/// aborting the run. With `config.aug_ratio > 0`, the training split is
/// augmented on the same pool once every table is done.
///
/// # Errors
///
/// Fails on output-tree creation, worker-pool creation, or a table that
/// cannot be read or lacks a required column.
pub fn prepare_dataset<R>(
    config: &PrepConfig,
    tables: &[(CaseTable, PathBuf)],
    resolver: R,
) -> Result<RunSummary>
where
    R: MaskResolver + Sync,
{
    let selected: Vec<&(CaseTable, PathBuf)> = tables
        .iter()
        .filter(|(table, _)| config.task.includes(table.abnormality))
        .collect();

    let mut splits: Vec<Split> = Vec::new();
    for (table, _) in &selected {
        if !splits.contains(&table.split) {
            splits.push(table.split);
        }
    }
    prepare_output_dirs(config, &splits)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()?;
    info!(
        "Preparing {} with {} worker(s)",
        config.task_name(),
        pool.current_num_threads()
    );

    let processor = RowProcessor::new(config, resolver);
    let mut summary = RunSummary::new(config.task_name(), config.task_dir());

    for (table_idx, (table, path)) in selected.into_iter().enumerate() {
        info!("Processing {}", path.display());
        let (table_summary, skipped) =
            pool.install(|| process_table(config, &processor, *table, table_idx, path))?;
        info!(
            "{}: {} of {} row(s) processed, {} file(s) written, {} skipped",
            table,
            table_summary.processed,
            table_summary.rows,
            table_summary.written,
            table_summary.skipped
        );
        summary.tables.push(table_summary);
        summary.skipped.extend(skipped);
    }

    if config.aug_ratio > 0 && splits.contains(&Split::Train) {
        let augmentation =
            pool.install(|| augment_training_split(config, &Augmenter::default()))?;
        info!(
            "Augmentation: {} file(s) written from {} image(s), {} failed",
            augmentation.written, augmentation.images, augmentation.failed
        );
        summary.augmentation = Some(augmentation);
    }

    Ok(summary)
}

fn process_table<R>(
    config: &PrepConfig,
    processor: &RowProcessor<'_, R>,
    table: CaseTable,
    table_idx: usize,
    path: &Path,
) -> Result<(TableSummary, Vec<SkippedRow>)>
where
    R: MaskResolver + Sync,
{
    let mut table_summary = TableSummary::new(table.stem(), table.split);
    let mut skipped: Vec<SkippedRow> = Vec::new();

    let mut records: Vec<(usize, CaseRecord)> = Vec::new();
    for (position, record) in load_case_records(path)?.into_iter().enumerate() {
        match record {
            Ok(record) if !config.task.includes(record.abnormality_type) => {
                debug!("Row {} excluded by task {}", record.row_id, config.task);
                continue;
            }
            Ok(record) => records.push((position, record)),
            Err(e) => {
                warn!("Skipping {} record {}: {}", table, position, e);
                skipped.push(SkippedRow {
                    table: table.stem(),
                    row_id: position.to_string(),
                    path: None,
                    reason: SkipReason::InvalidRecord,
                    message: e.to_string(),
                });
            }
        }
        table_summary.rows += 1;
    }

    let outcomes: Vec<(usize, RowOutcome)> = records
        .par_iter()
        .progress_with(progress_bar(records.len() as u64, table.stem()))
        .map(|(position, record)| {
            let mut rng = row_rng(config.seed, table_idx, *position);
            let outcome = processor.process(record, &class_dir(config, table.split, record), &mut rng);
            (*position, outcome)
        })
        .collect();

    for ((_, record), (_, outcome)) in records.iter().zip(outcomes) {
        match outcome {
            RowOutcome::Written(paths) => {
                debug!("Row {}: wrote {} file(s)", record.row_id, paths.len());
                table_summary.processed += 1;
                table_summary.written += paths.len();
            }
            RowOutcome::Skipped { reason, message } => {
                warn!(
                    "Skipping {} row {} ({}): {}",
                    table, record.row_id, record.image_file_path, message
                );
                skipped.push(SkippedRow {
                    table: table.stem(),
                    row_id: record.row_id.clone(),
                    path: Some(record.image_file_path.clone()),
                    reason,
                    message,
                });
            }
        }
    }
    table_summary.skipped = skipped.len();

    Ok((table_summary, skipped))
}

/// Random generator of one row
///
/// With a seed, each row gets its own deterministic stream, independent of
/// scheduling order.
pub(crate) fn row_rng(seed: Option<u64>, table_idx: usize, position: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(
            seed ^ ((table_idx as u64) << 48) ^ (position as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        ),
        None => StdRng::from_entropy(),
    }
}

pub(crate) fn progress_bar(len: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("{msg} [{elapsed_precise}] {wide_bar} {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len)
        .with_style(style)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::loader::test_support::write_dicom;
    use crate::extraction::ShapeMatchResolver;
    use crate::types::Task;
    use rand::Rng;
    use tempfile::TempDir;

    const HEADER: &str = "row_id,patient_id,abnormality type,pathology,image_file_path,roi_mask_file_path,cropped_image_file_path";

    fn write_image(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        let pixels: Vec<u16> = (0..64u16 * 48).map(|i| i % 64 * 10).collect();
        write_dicom(&dir.join("1-1.dcm"), 64, 48, &pixels, "MONOCHROME2", None);
    }

    fn write_mask(dir: &Path, positive: bool) {
        fs::create_dir_all(dir).unwrap();
        let pixels: Vec<u16> = (0..64u32 * 48)
            .map(|i| {
                let (x, y) = (i % 64, i / 64);
                if positive && (20..=30).contains(&x) && (10..=20).contains(&y) {
                    1
                } else {
                    0
                }
            })
            .collect();
        write_dicom(&dir.join("1-1.dcm"), 64, 48, &pixels, "MONOCHROME2", None);
    }

    /// Mass training table with one good row, one empty mask and one bad pathology
    fn write_dataset(root: &Path) -> PathBuf {
        write_image(&root.join("P_1/img"));
        write_mask(&root.join("P_1/roi"), true);
        write_image(&root.join("P_2/img"));
        write_mask(&root.join("P_2/roi"), false);

        let table = root.join("mass_case_description_train_set_corrected.csv");
        fs::write(
            &table,
            format!(
                "{}\n0,P_1,mass,MALIGNANT,P_1/img,P_1/roi,P_1/roi\n1,P_2,mass,BENIGN,P_2/img,P_2/roi,P_2/roi\n2,P_3,mass,UNKNOWN,P_3/img,,\n",
                HEADER
            ),
        )
        .unwrap();
        table
    }

    fn make_config(root: &Path) -> PrepConfig {
        PrepConfig::new(root)
            .with_out_dir(root.join("out"))
            .with_task(Task::RoiSeverity)
            .with_img_size(8)
            .with_padding(4)
            .with_threads(Some(2))
            .with_seed(Some(1))
    }

    #[test]
    fn test_prepare_output_dirs() {
        let tmp = TempDir::new().unwrap();
        let config = make_config(tmp.path()).with_task(Task::RoiMassSeverity);
        let stale = config.task_dir().join("stale.png");
        fs::create_dir_all(config.task_dir()).unwrap();
        fs::write(&stale, b"").unwrap();

        prepare_output_dirs(&config, &[Split::Train, Split::Test]).unwrap();

        assert!(!stale.exists());
        let task_dir = config.task_dir();
        assert!(task_dir.join("train/mass_BENIGN").is_dir());
        assert!(task_dir.join("test/mass_MALIGNANT").is_dir());
        assert!(!task_dir.join("train/calc_BENIGN").exists());
    }

    #[test]
    fn test_prepare_output_dirs_keeps_existing() {
        let tmp = TempDir::new().unwrap();
        let config = make_config(tmp.path()).clean_output(false);
        let kept = config.task_dir().join("train/kept.png");
        fs::create_dir_all(kept.parent().unwrap()).unwrap();
        fs::write(&kept, b"").unwrap();

        prepare_output_dirs(&config, &[Split::Train]).unwrap();
        assert!(kept.exists());
        assert!(config.task_dir().join("train/calc_MALIGNANT").is_dir());
    }

    #[test]
    fn test_prepare_dataset_partial_success() {
        let tmp = TempDir::new().unwrap();
        let table_path = write_dataset(tmp.path());
        let config = make_config(tmp.path());
        let tables = vec![(CaseTable::new(AbnormalityType::Mass, Split::Train), table_path)];

        let summary = prepare_dataset(&config, &tables, ShapeMatchResolver).unwrap();

        assert_eq!(summary.task, "roi-severity");
        assert_eq!(summary.total_rows(), 3);
        assert_eq!(summary.total_processed(), 1);
        assert_eq!(summary.total_written(), 3);
        assert_eq!(summary.total_skipped(), 2);

        let reasons: Vec<(String, SkipReason)> = summary
            .skipped
            .iter()
            .map(|s| (s.row_id.clone(), s.reason))
            .collect();
        assert!(reasons.contains(&("1".to_string(), SkipReason::EmptyMask)));
        assert!(reasons.contains(&("2".to_string(), SkipReason::InvalidRecord)));

        let class_dir = config.task_dir().join("train/mass_MALIGNANT");
        for idx in 0..3 {
            assert!(class_dir.join(format!("0_{}.png", idx)).is_file());
        }
        let benign = config.task_dir().join("train/mass_BENIGN");
        assert_eq!(fs::read_dir(benign).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_dataset_skips_excluded_tables() {
        let tmp = TempDir::new().unwrap();
        let table_path = write_dataset(tmp.path());
        let config = make_config(tmp.path()).with_task(Task::RoiCalcSeverity);
        let tables = vec![(CaseTable::new(AbnormalityType::Mass, Split::Train), table_path)];

        let summary = prepare_dataset(&config, &tables, ShapeMatchResolver).unwrap();
        assert!(summary.tables.is_empty());
        assert_eq!(summary.total_written(), 0);
    }

    #[test]
    fn test_prepare_dataset_scan_severity() {
        let tmp = TempDir::new().unwrap();
        let table_path = write_dataset(tmp.path());
        let config = make_config(tmp.path()).with_task(Task::ScanSeverity);
        let tables = vec![(CaseTable::new(AbnormalityType::Mass, Split::Train), table_path)];

        let summary = prepare_dataset(&config, &tables, ShapeMatchResolver).unwrap();
        assert_eq!(summary.total_written(), 2);
        assert!(config.task_dir().join("train/mass_MALIGNANT/0.png").is_file());
        assert!(config.task_dir().join("train/mass_BENIGN/1.png").is_file());
    }

    #[test]
    fn test_prepare_dataset_augments_training_split() {
        let tmp = TempDir::new().unwrap();
        let table_path = write_dataset(tmp.path());
        let config = make_config(tmp.path()).with_aug_ratio(2);
        let tables = vec![(CaseTable::new(AbnormalityType::Mass, Split::Train), table_path)];

        let summary = prepare_dataset(&config, &tables, ShapeMatchResolver).unwrap();
        let augmentation = summary.augmentation.unwrap();
        assert_eq!(augmentation.images, 3);
        assert_eq!(augmentation.written, 6);
        assert_eq!(augmentation.failed, 0);

        let class_dir = config.task_dir().join("train/mass_MALIGNANT");
        assert_eq!(fs::read_dir(&class_dir).unwrap().count(), 9);
        let img = image::open(class_dir.join("aug_2_1.png")).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn test_row_rng_seeded() {
        let a: u64 = row_rng(Some(5), 0, 3).gen();
        let b: u64 = row_rng(Some(5), 0, 3).gen();
        let c: u64 = row_rng(Some(5), 0, 4).gen();
        let d: u64 = row_rng(Some(5), 1, 3).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
