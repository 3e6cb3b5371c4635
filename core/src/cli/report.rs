use crate::pipeline::RunSummary;
use std::fmt;

/// Text report formatter for a preparation run
pub struct TextReport<'a> {
    summary: &'a RunSummary,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset Preparation")?;
        writeln!(f, "===================")?;
        writeln!(f)?;
        writeln!(f, "Task:       {}", self.summary.task)?;
        writeln!(f, "Output:     {}", self.summary.output_dir.display())?;
        writeln!(f, "Rows:       {}", self.summary.total_rows())?;
        writeln!(f, "Processed:  {}", self.summary.total_processed())?;
        writeln!(f, "Written:    {}", self.summary.total_written())?;
        writeln!(f, "Skipped:    {}", self.summary.total_skipped())?;
        if let Some(augmentation) = &self.summary.augmentation {
            writeln!(
                f,
                "Augmented:  {} file(s) from {} image(s), {} failed",
                augmentation.written, augmentation.images, augmentation.failed
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Tables")?;
        writeln!(f, "------")?;
        if self.summary.tables.is_empty() {
            writeln!(f, "none")?;
        }
        for table in &self.summary.tables {
            writeln!(
                f,
                "{} ({}): {}/{} processed, {} written, {} skipped",
                table.table, table.split, table.processed, table.rows, table.written, table.skipped
            )?;
        }

        let counts = self.summary.skip_counts();
        if !counts.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skip Reasons")?;
            writeln!(f, "------------")?;
            for (reason, count) in counts {
                writeln!(f, "{:<15} {}", reason.simple_name(), count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AugmentationSummary, SkipReason, SkippedRow, TableSummary};
    use crate::types::Split;

    #[test]
    fn test_text_report_format() {
        let mut summary = RunSummary::new("roi-severity", "/out/roi-severity");
        let mut table = TableSummary::new("mass_case_description_train_set", Split::Train);
        table.rows = 4;
        table.processed = 3;
        table.written = 9;
        table.skipped = 1;
        summary.tables.push(table);
        summary.skipped.push(SkippedRow {
            table: "mass_case_description_train_set".to_string(),
            row_id: "2".to_string(),
            path: Some("P_2/img".to_string()),
            reason: SkipReason::AmbiguousMask,
            message: "no match".to_string(),
        });

        let output = format!("{}", TextReport::new(&summary));

        assert!(output.contains("Dataset Preparation"));
        assert!(output.contains("Task:       roi-severity"));
        assert!(output.contains("Rows:       4"));
        assert!(output.contains("Written:    9"));
        assert!(output.contains("mass_case_description_train_set (train): 3/4 processed, 9 written, 1 skipped"));
        assert!(output.contains("ambiguous-mask  1"));
        assert!(!output.contains("Augmented"));
    }

    #[test]
    fn test_text_report_augmentation() {
        let mut summary = RunSummary::new("roi-severity", "/out/roi-severity");
        summary.augmentation = Some(AugmentationSummary {
            images: 4,
            written: 11,
            failed: 1,
        });

        let output = format!("{}", TextReport::new(&summary));
        assert!(output.contains("Augmented:  11 file(s) from 4 image(s), 1 failed"));
    }

    #[test]
    fn test_text_report_empty() {
        let summary = RunSummary::new("scan", "/out/scan");
        let output = format!("{}", TextReport::new(&summary));
        assert!(output.contains("none"));
        assert!(!output.contains("Skip Reasons"));
    }
}
