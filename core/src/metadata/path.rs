use crate::error::{MammoprepError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Normalizes a location path taken from the series index
///
/// - converts every `\` separator to `/` and collapses repeated separators
/// - strips leading `./` markers
/// - zero-pads the leading number of the final segment to two digits
///   (`1-123.dcm` → `01-123.dcm`), so lexical and numeric order agree
///
/// The function is idempotent.
///
/// # Example
///
/// ```
/// use mammoprep_core::metadata::normalize_and_format_path;
///
/// assert_eq!(
///     normalize_and_format_path(r".\Mass-Training_P_00001_LEFT_CC\1-123.dcm"),
///     "Mass-Training_P_00001_LEFT_CC/01-123.dcm"
/// );
/// ```
pub fn normalize_and_format_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }

    let mut segments: Vec<String> = rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(last) = segments.last_mut() {
        *last = pad_leading_number(last);
    }
    segments.join("/")
}

/// Zero-pads the numeric token before the first `-` of a path segment
fn pad_leading_number(segment: &str) -> String {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(r"^(\d+)(-.*)?$").expect("Failed to compile regex"));

    match re.captures(segment) {
        Some(caps) => {
            let number = &caps[1];
            let rest = caps.get(2).map_or("", |m| m.as_str());
            format!("{:0>2}{}", number, rest)
        }
        None => segment.to_string(),
    }
}

/// Extracts the (study UID, series UID) pair from a raw table path
///
/// Raw paths follow `<root>/<study_uid>/<series_uid>/...`.
pub fn study_series_from_path(path: &str) -> Result<(String, String)> {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match (segments.get(1), segments.get(2)) {
        (Some(study), Some(series)) => Ok((study.to_string(), series.to_string())),
        _ => Err(MammoprepError::MalformedPath(path.trim().to_string())),
    }
}
