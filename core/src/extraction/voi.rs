use dicom_object::InMemDicomObject;
use dicom_pixeldata::VoiLutOption;

use super::tags::{get_multi_int_value, LUT_DATA, LUT_DESCRIPTOR, VOI_LUT_SEQUENCE};

/// Explicit VOI lookup table from the VOI LUT Sequence
///
/// Window center/width is applied by `dicom-pixeldata` during conversion;
/// only the table form is handled here.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiLut {
    /// First stored value mapped by the table
    pub first_mapped: i32,
    pub data: Vec<f64>,
}

impl VoiLut {
    /// Reads the first item of the VOI LUT Sequence, if any
    pub fn from_dicom(dcm: &InMemDicomObject) -> Option<Self> {
        let item = dcm
            .element(VOI_LUT_SEQUENCE)
            .ok()
            .and_then(|seq| seq.items())
            .and_then(|items| items.first())?;

        let descriptor = get_multi_int_value(item, LUT_DESCRIPTOR)?;
        let data = get_multi_int_value(item, LUT_DATA)?;
        let first_mapped = *descriptor.get(1)?;
        if data.is_empty() {
            return None;
        }

        Some(VoiLut {
            first_mapped,
            data: data.into_iter().map(f64::from).collect(),
        })
    }

    /// Maps one value through the table, clamping to its first and last entries
    pub fn apply(&self, x: f64) -> f64 {
        let last = (self.data.len() - 1) as f64;
        let idx = (x - f64::from(self.first_mapped)).round().clamp(0.0, last);
        self.data[idx as usize]
    }
}

/// Conversion option for the decoder given the object's VOI information
///
/// A table takes precedence over the window, so the decoder must not window
/// the samples the table is about to index. Without either, samples pass
/// through unchanged.
pub fn voi_lut_option(lut: Option<&VoiLut>, has_window: bool) -> VoiLutOption {
    match (lut, has_window) {
        (None, true) => VoiLutOption::First,
        _ => VoiLutOption::Identity,
    }
}
