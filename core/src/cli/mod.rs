pub mod report;

use crate::types::{PrepConfig, Task};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for mammoprep
#[derive(Parser, Debug)]
#[command(name = "mammoprep")]
#[command(about = "Prepare CBIS-DDSM training images from DICOM mammograms")]
#[command(version)]
pub struct Cli {
    /// Dataset root holding the case-description tables and metadata.csv
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Root of the prepared dataset
    #[arg(short, long, default_value = "./data")]
    pub out_dir: PathBuf,

    /// Dataset to build
    #[arg(short, long, default_value = "roi-severity")]
    pub task: TaskArg,

    /// Side of the square output images
    #[arg(long, default_value_t = 128)]
    pub img_size: u32,

    /// Write 3-channel images (normalized tissue + two CLAHE levels)
    #[arg(long)]
    pub synthetized: bool,

    /// Padding in pixels around the lesion mask
    #[arg(long, default_value_t = 100)]
    pub padding: u32,

    /// Random sub-crops written per lesion (0 writes the whole patch)
    #[arg(long, default_value_t = 3)]
    pub random_patches: usize,

    /// Pixels removed from the smaller patch side to size sub-crops
    #[arg(long, default_value_t = 10)]
    pub crop_margin: u32,

    /// Augmented copies written per training image (0 disables augmentation)
    #[arg(long, default_value_t = 0)]
    pub aug_ratio: usize,

    /// Worker threads (default: one per CPU core)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Seed for reproducible sub-crops
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only index series with this Series Description
    #[arg(long)]
    pub series_description: Option<String>,

    /// Keep existing files in the task output directory
    #[arg(long)]
    pub no_clean: bool,

    /// Rebuild corrected tables even if they exist
    #[arg(long)]
    pub force_correction: bool,

    /// Output format of the run summary
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the run configuration from the arguments
    pub fn to_config(&self) -> PrepConfig {
        PrepConfig::new(&self.data_dir)
            .with_out_dir(&self.out_dir)
            .with_task(self.task.clone().into())
            .synthetized(self.synthetized)
            .with_img_size(self.img_size)
            .with_padding(self.padding)
            .with_random_patches(self.random_patches)
            .with_crop_margin(self.crop_margin)
            .with_aug_ratio(self.aug_ratio)
            .with_threads(self.threads)
            .with_seed(self.seed)
            .with_series_description(self.series_description.as_deref())
            .clean_output(!self.no_clean)
            .force_correction(self.force_correction)
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Task selector
#[derive(Debug, Clone, ValueEnum)]
pub enum TaskArg {
    /// Whole mammogram, labelled by lesion type
    Scan,
    /// Whole mammogram, labelled by lesion type and severity
    ScanSeverity,
    /// Whole mammogram of masses, labelled by severity
    ScanMassSeverity,
    /// Whole mammogram of calcifications, labelled by severity
    ScanCalcSeverity,
    /// Lesion patches, labelled by lesion type and severity
    RoiSeverity,
    /// Mass patches, labelled by severity
    RoiMassSeverity,
    /// Calcification patches, labelled by severity
    RoiCalcSeverity,
}

impl From<TaskArg> for Task {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Scan => Task::Scan,
            TaskArg::ScanSeverity => Task::ScanSeverity,
            TaskArg::ScanMassSeverity => Task::ScanMassSeverity,
            TaskArg::ScanCalcSeverity => Task::ScanCalcSeverity,
            TaskArg::RoiSeverity => Task::RoiSeverity,
            TaskArg::RoiMassSeverity => Task::RoiMassSeverity,
            TaskArg::RoiCalcSeverity => Task::RoiCalcSeverity,
        }
    }
}
