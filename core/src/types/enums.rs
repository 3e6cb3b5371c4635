use std::fmt;

/// Lesion category of an abnormality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum AbnormalityType {
    Mass,
    Calc,
}

impl AbnormalityType {
    /// All lesion categories, in table order
    pub const ALL: [AbnormalityType; 2] = [AbnormalityType::Mass, AbnormalityType::Calc];

    /// Returns the short name used in file names and class labels
    pub fn simple_name(&self) -> &'static str {
        match self {
            AbnormalityType::Mass => "mass",
            AbnormalityType::Calc => "calc",
        }
    }

    /// Parses the `abnormality type` column
    ///
    /// Accepts both the short (`calc`) and long (`calcification`) spellings.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mass" => Some(AbnormalityType::Mass),
            "calc" | "calcification" => Some(AbnormalityType::Calc),
            _ => None,
        }
    }
}

impl fmt::Display for AbnormalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Pathology verdict as written in the case-description tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pathology {
    Benign,
    BenignWithoutCallback,
    Malignant,
}

impl Pathology {
    /// Collapses the pathology into a two-class severity
    pub fn severity(&self) -> Severity {
        match self {
            Pathology::Benign | Pathology::BenignWithoutCallback => Severity::Benign,
            Pathology::Malignant => Severity::Malignant,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BENIGN" => Some(Pathology::Benign),
            "BENIGN_WITHOUT_CALLBACK" => Some(Pathology::BenignWithoutCallback),
            "MALIGNANT" => Some(Pathology::Malignant),
            _ => None,
        }
    }
}

/// Two-class severity used in class labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Benign,
    Malignant,
}

impl Severity {
    pub const ALL: [Severity; 2] = [Severity::Benign, Severity::Malignant];

    pub fn simple_name(&self) -> &'static str {
        match self {
            Severity::Benign => "BENIGN",
            Severity::Malignant => "MALIGNANT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Dataset split a case-description table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    pub fn simple_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "train" | "training" => Some(Split::Train),
            "test" => Some(Split::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Dataset preparation task
///
/// Scan tasks export the whole mammogram, ROI tasks export lesion-centered
/// patches. The `mass`/`calc` variants restrict the run to one lesion category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
pub enum Task {
    Scan,
    ScanSeverity,
    ScanMassSeverity,
    ScanCalcSeverity,
    #[default]
    RoiSeverity,
    RoiMassSeverity,
    RoiCalcSeverity,
}

impl Task {
    /// Returns the task name used as output directory
    pub fn simple_name(&self) -> &'static str {
        match self {
            Task::Scan => "scan",
            Task::ScanSeverity => "scan-severity",
            Task::ScanMassSeverity => "scan-mass-severity",
            Task::ScanCalcSeverity => "scan-calc-severity",
            Task::RoiSeverity => "roi-severity",
            Task::RoiMassSeverity => "roi-mass-severity",
            Task::RoiCalcSeverity => "roi-calc-severity",
        }
    }

    /// Returns whether the task exports lesion patches instead of whole scans
    pub fn is_roi(&self) -> bool {
        matches!(
            self,
            Task::RoiSeverity | Task::RoiMassSeverity | Task::RoiCalcSeverity
        )
    }

    /// Returns whether class labels carry the severity
    pub fn labels_severity(&self) -> bool {
        !matches!(self, Task::Scan)
    }

    /// Returns the lesion category this task is restricted to, if any
    pub fn lesion_filter(&self) -> Option<AbnormalityType> {
        match self {
            Task::ScanMassSeverity | Task::RoiMassSeverity => Some(AbnormalityType::Mass),
            Task::ScanCalcSeverity | Task::RoiCalcSeverity => Some(AbnormalityType::Calc),
            _ => None,
        }
    }

    /// Returns whether rows of the given lesion category take part in this task
    pub fn includes(&self, abnormality: AbnormalityType) -> bool {
        self.lesion_filter().map_or(true, |only| only == abnormality)
    }

    /// Builds the class label for a lesion category and severity
    pub fn class_label(&self, abnormality: AbnormalityType, severity: Severity) -> String {
        if self.labels_severity() {
            format!("{}_{}", abnormality, severity)
        } else {
            abnormality.to_string()
        }
    }

    /// Returns every class label this task can produce for a lesion category
    pub fn class_labels(&self, abnormality: AbnormalityType) -> Vec<String> {
        if self.labels_severity() {
            Severity::ALL
                .iter()
                .map(|severity| self.class_label(abnormality, *severity))
                .collect()
        } else {
            vec![abnormality.to_string()]
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Photometric interpretation enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotometricInterpretation {
    Unknown,
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
}

impl PhotometricInterpretation {
    /// Returns whether this is a monochrome interpretation
    pub fn is_monochrome(&self) -> bool {
        matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    /// Returns whether low values render bright (MONOCHROME1)
    pub fn is_inverted(&self) -> bool {
        matches!(self, PhotometricInterpretation::Monochrome1)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MONOCHROME1" => PhotometricInterpretation::Monochrome1,
            "MONOCHROME2" => PhotometricInterpretation::Monochrome2,
            "PALETTE COLOR" => PhotometricInterpretation::PaletteColor,
            "RGB" => PhotometricInterpretation::Rgb,
            _ => PhotometricInterpretation::Unknown,
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhotometricInterpretation::Unknown => "UNKNOWN",
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
        };
        write!(f, "{}", name)
    }
}
