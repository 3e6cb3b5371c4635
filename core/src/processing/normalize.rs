use crate::error::{MammoprepError, Result};
use image::{GrayImage, Luma};

/// Lower percentile of the truncation range
pub const LOWER_PERCENTILE: f64 = 2.0;
/// Upper percentile of the truncation range
pub const UPPER_PERCENTILE: f64 = 99.0;

/// Percentile of sorted values with linear interpolation between ranks
///
/// `q` is in [0, 100]. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Rescales tissue intensities between robust percentiles
///
/// The 2nd and 99th percentiles are computed over pixels where `mask` is
/// non-zero. Every pixel is clipped to that range and mapped linearly to
/// [0, 255]; pixels outside the mask are set to 0.
///
/// # Errors
///
/// Returns a compute error when the mask is empty or both percentiles are
/// equal, and a geometry error when image and mask sizes differ.
pub fn truncate_normalization(image: &GrayImage, mask: &GrayImage) -> Result<GrayImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(MammoprepError::Geometry(format!(
            "image is {:?} but mask is {:?}",
            image.dimensions(),
            mask.dimensions()
        )));
    }

    let mut values: Vec<f64> = image
        .pixels()
        .zip(mask.pixels())
        .filter(|(_, m)| m.0[0] != 0)
        .map(|(p, _)| f64::from(p.0[0]))
        .collect();
    values.sort_by(f64::total_cmp);

    let (Some(p_min), Some(p_max)) = (
        percentile(&values, LOWER_PERCENTILE),
        percentile(&values, UPPER_PERCENTILE),
    ) else {
        return Err(MammoprepError::Compute(
            "tissue mask has no positive pixel".to_string(),
        ));
    };
    let range = p_max - p_min;
    if range <= 0.0 {
        return Err(MammoprepError::Compute(format!(
            "degenerate intensity range [{}, {}]",
            p_min, p_max
        )));
    }

    let mut out = GrayImage::new(image.width(), image.height());
    for ((dst, src), m) in out.pixels_mut().zip(image.pixels()).zip(mask.pixels()) {
        if m.0[0] != 0 {
            let v = f64::from(src.0[0]).clamp(p_min, p_max);
            *dst = Luma([((v - p_min) / range * 255.0) as u8]);
        }
    }
    Ok(out)
}
