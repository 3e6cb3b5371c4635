//! Image processing: breast cropping, intensity normalization, CLAHE,
//! lesion patch extraction, random sub-cropping and augmentation

pub mod augment;
pub mod breast;
pub mod clahe;
pub mod normalize;
pub mod patch;
pub mod random_crop;
pub mod synthetize;

pub use augment::{elastic_transform, Augmenter};
pub use breast::{crop_to_roi, BreastCrop};
pub use clahe::{clahe, Clahe};
pub use normalize::{percentile, truncate_normalization};
pub use patch::{crop_to_bbox, extract_patch, patch_bounds};
pub use random_crop::{random_crop, random_crops, sub_crop_size};
pub use synthetize::synthetize;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};

/// Resizes an image to a `size` x `size` square with bilinear filtering
pub fn resize_square<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    if image.dimensions() == (size, size) {
        return image.clone();
    }
    imageops::resize(image, size, size, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    #[test]
    fn test_resize_square() {
        let image = GrayImage::from_pixel(70, 40, Luma([9]));
        let out = resize_square(&image, 128);
        assert_eq!(out.dimensions(), (128, 128));
        assert!(out.pixels().all(|p| p.0[0].abs_diff(9) <= 1));

        let rgb = RgbImage::new(30, 30);
        assert_eq!(resize_square(&rgb, 16).dimensions(), (16, 16));
    }
}
