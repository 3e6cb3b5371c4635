use crate::error::{MammoprepError, Result};
use crate::types::PhotometricInterpretation;
use dicom_object::{open_file, InMemDicomObject};
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use image::GrayImage;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::tags::{get_string_value, PHOTOMETRIC_INTERPRETATION};
use super::voi::{voi_lut_option, VoiLut};

/// Loads a DICOM image as an 8-bit grayscale image
///
/// Steps, in order:
/// 1. decode the first frame, applying the modality rescale and the first
///    window center/width through `dicom-pixeldata`
/// 2. apply the VOI LUT Sequence instead of the window when one is present
/// 3. invert MONOCHROME1 images so that bright means dense
/// 4. min-max rescale to [0, 255]
///
/// # Errors
///
/// Returns a decode error if the file cannot be parsed, has no decodable
/// pixel data, or lacks the PhotometricInterpretation tag.
pub fn load_dicom_image(path: &Path) -> Result<GrayImage> {
    let obj = open_file(path)?;
    let photometric = read_photometric_interpretation(&obj)?;
    let lut = VoiLut::from_dicom(&obj);

    let pixel = obj.decode_pixel_data()?;
    let width = pixel.columns();
    let height = pixel.rows();
    let samples = (pixel.samples_per_pixel() as usize).max(1);
    let has_window = matches!(pixel.window(), Ok(Some(_)));

    let options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::Default)
        .with_voi_lut(voi_lut_option(lut.as_ref(), has_window));
    let array = pixel.to_ndarray_with_options::<f32>(&options)?;
    let frame_len = width as usize * height as usize;
    let values: Vec<f32> = array
        .iter()
        .step_by(samples)
        .take(frame_len)
        .copied()
        .collect();

    debug!(
        "Loaded {} ({}x{}, {}, {})",
        path.display(),
        width,
        height,
        photometric,
        match (&lut, has_window) {
            (Some(_), _) => "VOI LUT",
            (None, true) => "window",
            (None, false) => "no VOI",
        }
    );
    to_display_image(&values, width, height, lut.as_ref(), photometric.is_inverted())
}

fn read_photometric_interpretation(dcm: &InMemDicomObject) -> Result<PhotometricInterpretation> {
    get_string_value(dcm, PHOTOMETRIC_INTERPRETATION)
        .map(|s| PhotometricInterpretation::from_str(&s))
        .ok_or_else(|| MammoprepError::Decode("missing PhotometricInterpretation".to_string()))
}

/// Converts decoded sample values into a display-ready 8-bit image
///
/// Applies `lut` when given, inverts when `inverted` is set and min-max
/// rescales the result to [0, 255]. A constant image maps to all zeros.
pub fn to_display_image(
    values: &[f32],
    width: u32,
    height: u32,
    lut: Option<&VoiLut>,
    inverted: bool,
) -> Result<GrayImage> {
    let expected = width as usize * height as usize;
    if values.len() != expected {
        return Err(MammoprepError::Decode(format!(
            "expected {} samples for {}x{}, found {}",
            expected,
            width,
            height,
            values.len()
        )));
    }

    let mut mapped: Vec<f64> = values
        .iter()
        .map(|v| {
            let v = f64::from(*v);
            lut.map_or(v, |lut| lut.apply(v))
        })
        .collect();
    let (mut min, mut max) = min_max(&mapped);

    if inverted {
        for v in mapped.iter_mut() {
            *v = max - *v;
        }
        (min, max) = min_max(&mapped);
    }

    let range = max - min;
    let pixels: Vec<u8> = mapped
        .iter()
        .map(|v| {
            if range > 0.0 {
                ((v - min) * 255.0 / range).clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| MammoprepError::Decode("pixel buffer size mismatch".to_string()))
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

/// Lists the DICOM files directly inside a directory, sorted by path
///
/// Files with a `.dcm`/`.dicom` extension are accepted as-is; files without
/// an extension are accepted when they carry the DICM magic.
///
/// # Errors
///
/// Returns a decode error when `directory` does not exist.
pub fn find_dicom_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(MammoprepError::Decode(format!(
            "directory {} not found",
            directory.display()
        )));
    }
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            } else if is_dicom_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Returns the single image file of a series directory
///
/// # Errors
///
/// Returns a decode error when the directory holds no DICOM file.
pub fn find_image_file(directory: &Path) -> Result<PathBuf> {
    let files = find_dicom_files(directory)?;
    if files.len() > 1 {
        debug!(
            "{} holds {} DICOM files, using the first",
            directory.display(),
            files.len()
        );
    }
    files.into_iter().next().ok_or_else(|| {
        MammoprepError::Decode(format!("no DICOM file in {}", directory.display()))
    })
}

/// Checks for the 128-byte preamble followed by the "DICM" magic
fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}
