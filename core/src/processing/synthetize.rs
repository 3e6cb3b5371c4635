use crate::error::Result;
use crate::processing::breast::{crop_to_roi, BreastCrop};
use crate::processing::clahe::clahe;
use crate::processing::normalize::truncate_normalization;
use image::{GrayImage, Rgb, RgbImage};

/// Clip limits of the second and third channels
pub const CLAHE_CLIP_LIMITS: [f64; 2] = [1.0, 2.0];

/// Builds the 3-channel synthetized rendition of a mammogram
///
/// The image is first cropped to the breast. Channels are, in order:
/// truncate-normalized tissue, CLAHE with clip 1.0, CLAHE with clip 2.0,
/// the last two applied to the normalized image.
///
/// Returns the RGB image together with the breast crop it was built from;
/// callers crop the lesion mask with the same bounding box.
pub fn synthetize(image: &GrayImage) -> Result<(RgbImage, BreastCrop)> {
    let breast = crop_to_roi(image)?;
    let normalized = truncate_normalization(&breast.image, &breast.mask)?;
    let low = clahe(&normalized, CLAHE_CLIP_LIMITS[0]);
    let high = clahe(&normalized, CLAHE_CLIP_LIMITS[1]);
    Ok((merge_channels(&normalized, &low, &high), breast))
}

/// Stacks three equally sized grayscale images into one RGB image
fn merge_channels(r: &GrayImage, g: &GrayImage, b: &GrayImage) -> RgbImage {
    RgbImage::from_fn(r.width(), r.height(), |x, y| {
        Rgb([
            r.get_pixel(x, y).0[0],
            g.get_pixel(x, y).0[0],
            b.get_pixel(x, y).0[0],
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MammoprepError;
    use image::Luma;

    /// Textured bright tissue on a dark background
    fn make_mammogram() -> GrayImage {
        GrayImage::from_fn(96, 80, |x, y| {
            if (16..72).contains(&x) && (8..72).contains(&y) {
                Luma([(120 + (x * 7 + y * 3) % 100) as u8])
            } else {
                Luma([5])
            }
        })
    }

    #[test]
    fn test_synthetize_channels() {
        let image = make_mammogram();
        let (rgb, breast) = synthetize(&image).unwrap();

        assert_eq!(rgb.dimensions(), breast.image.dimensions());
        assert_eq!(rgb.dimensions(), (breast.bbox.width, breast.bbox.height));

        let first: Vec<u8> = rgb.pixels().map(|p| p.0[0]).collect();
        assert_eq!(first.iter().max(), Some(&255));
        assert_eq!(first.iter().min(), Some(&0));
    }

    #[test]
    fn test_synthetize_blank_image() {
        let err = synthetize(&GrayImage::new(40, 40)).unwrap_err();
        assert!(matches!(err, MammoprepError::Geometry(_)));
    }

    #[test]
    fn test_merge_channels() {
        let r = GrayImage::from_pixel(2, 2, Luma([1]));
        let g = GrayImage::from_pixel(2, 2, Luma([2]));
        let b = GrayImage::from_pixel(2, 2, Luma([3]));
        assert_eq!(merge_channels(&r, &g, &b).get_pixel(1, 1), &Rgb([1, 2, 3]));
    }
}
