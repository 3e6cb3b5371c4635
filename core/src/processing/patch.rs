use crate::error::{MammoprepError, Result};
use crate::types::BoundingBox;
use image::{imageops, GrayImage, ImageBuffer, Pixel};

/// Computes the padded bounding box of a mask's positive region
///
/// Bounds are taken over all non-zero mask pixels. The start is extended by
/// `padding` and clamped at 0; the end is extended by `padding` (at least 1,
/// so the last positive pixel stays inside) and clamped at the image size.
///
/// # Errors
///
/// Returns [`MammoprepError::EmptyMask`] if the mask has no positive pixel,
/// or a geometry error if the positive region lies outside the image.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use mammoprep_core::processing::patch_bounds;
///
/// let mut mask = GrayImage::new(20, 10);
/// mask.put_pixel(5, 4, Luma([255]));
///
/// let bbox = patch_bounds(&mask, (20, 10), 2).unwrap();
/// assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (3, 2, 4, 4));
/// ```
pub fn patch_bounds(mask: &GrayImage, image_dims: (u32, u32), padding: u32) -> Result<BoundingBox> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (x_min, y_min, x_max, y_max) = bounds.ok_or(MammoprepError::EmptyMask)?;

    let (width, height) = image_dims;
    let end_pad = padding.max(1);
    let bbox = BoundingBox::from_bounds(
        x_min.saturating_sub(padding),
        y_min.saturating_sub(padding),
        x_max.saturating_add(end_pad).min(width),
        y_max.saturating_add(end_pad).min(height),
    );

    if bbox.is_empty() {
        return Err(MammoprepError::Geometry(format!(
            "mask region {} falls outside a {}x{} image",
            BoundingBox::from_bounds(x_min, y_min, x_max + 1, y_max + 1),
            width,
            height
        )));
    }
    Ok(bbox)
}

/// Extracts the padded lesion patch of an image
///
/// The mask is expected in the image's coordinate frame; see
/// [`patch_bounds`] for how the window is derived.
pub fn extract_patch<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    mask: &GrayImage,
    padding: u32,
) -> Result<(ImageBuffer<P, Vec<P::Subpixel>>, BoundingBox)>
where
    P: Pixel + 'static,
{
    let bbox = patch_bounds(mask, image.dimensions(), padding)?;
    Ok((crop_to_bbox(image, bbox), bbox))
}

/// Copies the region of `image` covered by `bbox`, clamped to the image
pub fn crop_to_bbox<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    bbox: BoundingBox,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();
    let b = bbox.clamp_to(width, height);
    imageops::crop_imm(image, b.x, b.y, b.width, b.height).to_image()
}
