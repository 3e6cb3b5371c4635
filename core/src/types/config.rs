use crate::types::Task;
use std::path::{Path, PathBuf};

/// Configuration for a dataset preparation run
///
/// # Example
///
/// ```
/// use mammoprep_core::{PrepConfig, Task};
///
/// let config = PrepConfig::new("/data/cbis-ddsm")
///     .with_task(Task::RoiMassSeverity)
///     .with_img_size(224)
///     .with_padding(150)
///     .synthetized(true);
///
/// assert_eq!(config.img_size, 224);
/// assert!(config.synthetized);
/// assert_eq!(
///     config.task_dir(),
///     std::path::PathBuf::from("./data/roi-mass-severity_synthetized")
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PrepConfig {
    /// Root of the raw dataset (tables, `metadata.csv`, DICOM tree)
    pub data_dir: PathBuf,

    /// Root of the prepared dataset
    pub out_dir: PathBuf,

    pub task: Task,

    /// Export 3-channel synthetized images instead of grayscale
    pub synthetized: bool,

    /// Side of the square output images
    pub img_size: u32,

    /// Padding in pixels around the lesion mask
    pub padding: u32,

    /// Random sub-crops written per lesion
    pub random_patches: usize,

    /// Pixels subtracted from the smaller patch side to get the sub-crop size
    pub crop_margin: u32,

    /// Augmented copies written per training image; 0 disables augmentation
    pub aug_ratio: usize,

    /// Worker threads; `None` uses one per CPU core
    pub threads: Option<usize>,

    /// Seed for sub-crop placement; `None` draws from entropy
    pub seed: Option<u64>,

    /// Remove the task output tree before writing
    pub clean_output: bool,

    /// Rebuild corrected tables even when they already exist
    pub force_correction: bool,

    /// Only index series with this `Series Description`
    pub series_description: Option<String>,
}

impl PrepConfig {
    /// Creates a configuration with default settings for a dataset root
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            out_dir: PathBuf::from("./data"),
            task: Task::default(),
            synthetized: false,
            img_size: 128,
            padding: 100,
            random_patches: 3,
            crop_margin: 10,
            aug_ratio: 0,
            threads: None,
            seed: None,
            clean_output: true,
            force_correction: false,
            series_description: None,
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    pub fn synthetized(mut self, synthetized: bool) -> Self {
        self.synthetized = synthetized;
        self
    }

    pub fn with_img_size(mut self, img_size: u32) -> Self {
        self.img_size = img_size;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_random_patches(mut self, random_patches: usize) -> Self {
        self.random_patches = random_patches;
        self
    }

    pub fn with_crop_margin(mut self, crop_margin: u32) -> Self {
        self.crop_margin = crop_margin;
        self
    }

    pub fn with_aug_ratio(mut self, aug_ratio: usize) -> Self {
        self.aug_ratio = aug_ratio;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn clean_output(mut self, clean: bool) -> Self {
        self.clean_output = clean;
        self
    }

    pub fn force_correction(mut self, force: bool) -> Self {
        self.force_correction = force;
        self
    }

    /// Builder: restrict the location index to one series description
    ///
    /// # Example
    ///
    /// ```
    /// use mammoprep_core::PrepConfig;
    ///
    /// let config = PrepConfig::new("/data").with_series_description(Some("full mammogram images"));
    /// assert_eq!(config.series_description.as_deref(), Some("full mammogram images"));
    /// ```
    pub fn with_series_description(mut self, description: Option<&str>) -> Self {
        self.series_description = description.map(str::to_string);
        self
    }

    /// Returns the output directory name for the task
    pub fn task_name(&self) -> String {
        if self.synthetized {
            format!("{}_synthetized", self.task)
        } else {
            self.task.to_string()
        }
    }

    /// Returns the output root of this task
    pub fn task_dir(&self) -> PathBuf {
        self.out_dir.join(self.task_name())
    }

    /// Returns the dataset root
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
