use crate::error::Result;
use crate::pipeline::dataset::{progress_bar, row_rng};
use crate::pipeline::summary::AugmentationSummary;
use crate::processing::Augmenter;
use crate::types::{PrepConfig, Split};
use indicatif::ParallelProgressIterator;
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix of augmented images
pub const AUGMENTED_PREFIX: &str = "aug_";

/// Writes `config.aug_ratio` augmented copies of every training image
///
/// Runs over each class directory of `<task_dir>/train`. The copies of the
/// `i`-th source image (in path order) are written next to it as
/// `aug_<i>_<j>.png`. Files already carrying the `aug_` prefix are never
/// used as sources. An image that cannot be read or written is logged and
/// counted as failed.
///
/// Must run inside the worker pool, after the class directories exist.
pub fn augment_training_split(
    config: &PrepConfig,
    augmenter: &Augmenter,
) -> Result<AugmentationSummary> {
    let train_dir = config.task_dir().join(Split::Train.simple_name());
    let mut summary = AugmentationSummary::default();
    if config.aug_ratio == 0 || !train_dir.is_dir() {
        return Ok(summary);
    }

    for (class_idx, class_dir) in class_dirs(&train_dir)?.into_iter().enumerate() {
        let sources = source_images(&class_dir)?;
        info!(
            "Augmenting {} image(s) in {}",
            sources.len(),
            class_dir.display()
        );
        let label = class_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let results: Vec<(usize, Result<usize>)> = sources
            .par_iter()
            .enumerate()
            .progress_with(progress_bar(sources.len() as u64, label))
            .map(|(idx, source)| {
                let mut rng = row_rng(config.seed.map(|seed| !seed), class_idx, idx);
                let result = augment_image(source, &class_dir, idx, config.aug_ratio, augmenter, &mut rng);
                (idx, result)
            })
            .collect();

        for (idx, result) in results {
            summary.images += 1;
            match result {
                Ok(written) => summary.written += written,
                Err(e) => {
                    warn!("Could not augment {}: {}", sources[idx].display(), e);
                    summary.failed += 1;
                }
            }
        }
    }

    Ok(summary)
}

fn augment_image<R: Rng + ?Sized>(
    source: &Path,
    class_dir: &Path,
    idx: usize,
    count: usize,
    augmenter: &Augmenter,
    rng: &mut R,
) -> Result<usize> {
    let image = image::open(source)?;
    for copy in 0..count {
        let path = class_dir.join(format!("{}{}_{}.png", AUGMENTED_PREFIX, idx, copy));
        augmenter.augment_dynamic(&image, rng).save(&path)?;
        debug!("Wrote {}", path.display());
    }
    Ok(count)
}

/// Class directories of a split, sorted by path
fn class_dirs(split_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(split_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Non-augmented PNG files of a class directory, sorted by path
fn source_images(class_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(class_dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        let is_augmented = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(AUGMENTED_PREFIX));
        if path.is_file() && is_png && !is_augmented {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    fn make_config(root: &Path, aug_ratio: usize) -> PrepConfig {
        PrepConfig::new(root)
            .with_out_dir(root.join("out"))
            .with_task(Task::RoiMassSeverity)
            .with_seed(Some(4))
            .with_aug_ratio(aug_ratio)
    }

    fn write_png(path: &Path) {
        GrayImage::from_fn(10, 10, |x, y| Luma([(x * 10 + y) as u8]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_augment_training_split() {
        let tmp = TempDir::new().unwrap();
        let config = make_config(tmp.path(), 2);
        let benign = config.task_dir().join("train/mass_BENIGN");
        let malignant = config.task_dir().join("train/mass_MALIGNANT");
        fs::create_dir_all(&benign).unwrap();
        fs::create_dir_all(&malignant).unwrap();
        write_png(&benign.join("0_0.png"));
        write_png(&benign.join("0_1.png"));
        write_png(&malignant.join("3.png"));
        // Left over from an earlier pass, not a source
        write_png(&malignant.join("aug_7_0.png"));

        let summary = augment_training_split(&config, &Augmenter::default()).unwrap();
        assert_eq!(summary.images, 3);
        assert_eq!(summary.written, 6);
        assert_eq!(summary.failed, 0);

        for name in ["aug_0_0.png", "aug_0_1.png", "aug_1_0.png", "aug_1_1.png"] {
            let img = image::open(benign.join(name)).unwrap();
            assert_eq!((img.width(), img.height()), (10, 10));
        }
        assert!(malignant.join("aug_0_1.png").is_file());
        assert!(!malignant.join("aug_0_2.png").exists());
    }

    #[test]
    fn test_unreadable_image_counts_as_failed() {
        let tmp = TempDir::new().unwrap();
        let config = make_config(tmp.path(), 1);
        let class_dir = config.task_dir().join("train/mass_BENIGN");
        fs::create_dir_all(&class_dir).unwrap();
        write_png(&class_dir.join("0.png"));
        fs::write(class_dir.join("1.png"), b"not a png").unwrap();

        let summary = augment_training_split(&config, &Augmenter::default()).unwrap();
        assert_eq!(summary.images, 2);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 1);
        assert!(class_dir.join("aug_0_0.png").is_file());
    }

    #[test]
    fn test_disabled_or_missing_split_is_noop() {
        let tmp = TempDir::new().unwrap();
        let summary = augment_training_split(&make_config(tmp.path(), 3), &Augmenter::default()).unwrap();
        assert_eq!(summary, AugmentationSummary::default());

        let config = make_config(tmp.path(), 0);
        let class_dir = config.task_dir().join("train/mass_BENIGN");
        fs::create_dir_all(&class_dir).unwrap();
        write_png(&class_dir.join("0.png"));
        let summary = augment_training_split(&config, &Augmenter::default()).unwrap();
        assert_eq!(summary.images, 0);
        assert_eq!(fs::read_dir(&class_dir).unwrap().count(), 1);
    }
}
