use crate::error::{MammoprepError, Result};
use crate::processing::patch::crop_to_bbox;
use crate::types::BoundingBox;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

/// Sigma of the 5x5 Gaussian used before thresholding
const BLUR_SIGMA: f32 = 1.1;

/// Breast region isolated from a full mammogram
#[derive(Debug, Clone)]
pub struct BreastCrop {
    /// Source image cropped to the tissue bounding box
    pub image: GrayImage,
    /// Binary tissue mask (0 or 255), cropped the same way
    pub mask: GrayImage,
    /// Bounding box of the tissue in source coordinates
    pub bbox: BoundingBox,
}

/// Crops a mammogram to the breast tissue
///
/// The image is blurred, binarized at the Otsu level and the bounding box of
/// the largest external contour is used to crop both image and binary mask.
///
/// # Errors
///
/// Returns a geometry error if no contour is found (blank image).
pub fn crop_to_roi(image: &GrayImage) -> Result<BreastCrop> {
    let blurred = gaussian_blur_f32(image, BLUR_SIGMA);
    let level = otsu_level(&blurred);
    let binary = threshold(&blurred, level, ThresholdType::Binary);

    let contours: Vec<Contour<u32>> = find_contours(&binary);
    let largest = largest_external_contour(&contours).ok_or_else(|| {
        MammoprepError::Geometry("no tissue contour found".to_string())
    })?;
    let bbox = contour_bounding_box(largest).ok_or_else(|| {
        MammoprepError::Geometry("empty tissue contour".to_string())
    })?;

    Ok(BreastCrop {
        image: crop_to_bbox(image, bbox),
        mask: crop_to_bbox(&binary, bbox),
        bbox,
    })
}

/// Returns the outer contour enclosing the largest area
///
/// Ties keep the first contour found.
fn largest_external_contour(contours: &[Contour<u32>]) -> Option<&Contour<u32>> {
    let mut best: Option<(&Contour<u32>, f64)> = None;
    for contour in contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
    {
        let area = polygon_area(contour);
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
}

/// Shoelace area of a closed contour
fn polygon_area(contour: &Contour<u32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    twice_area.abs() / 2.0
}

/// Inclusive axis-aligned bounds of a contour, as a box
fn contour_bounding_box(contour: &Contour<u32>) -> Option<BoundingBox> {
    let first = contour.points.first()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        x_min = x_min.min(p.x);
        y_min = y_min.min(p.y);
        x_max = x_max.max(p.x);
        y_max = y_max.max(p.y);
    }
    Some(BoundingBox::from_bounds(x_min, y_min, x_max + 1, y_max + 1))
}
