use crate::error::{MammoprepError, Result};
use crate::processing::patch::crop_to_bbox;
use crate::types::BoundingBox;
use image::{ImageBuffer, Pixel};
use rand::Rng;

/// Side of the square sub-crops taken from a patch
///
/// The smaller patch side minus `margin`; patches no larger than the margin
/// use their smaller side as is.
pub fn sub_crop_size(patch_dims: (u32, u32), margin: u32) -> Result<u32> {
    let side = patch_dims.0.min(patch_dims.1);
    if side == 0 {
        return Err(MammoprepError::Geometry("empty patch".to_string()));
    }
    Ok(if side > margin { side - margin } else { side })
}

/// Takes one square crop of side `size` at a uniformly drawn position
///
/// Offsets are drawn inclusively from `[0, height - size]` and
/// `[0, width - size]`.
///
/// # Errors
///
/// Returns a geometry error if `size` is 0 or exceeds a patch side.
pub fn random_crop<P, R>(
    patch: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: u32,
    rng: &mut R,
) -> Result<(ImageBuffer<P, Vec<P::Subpixel>>, BoundingBox)>
where
    P: Pixel + 'static,
    R: Rng + ?Sized,
{
    let (width, height) = patch.dimensions();
    if size == 0 || size > width || size > height {
        return Err(MammoprepError::Geometry(format!(
            "cannot take a {}x{} crop from a {}x{} patch",
            size, size, width, height
        )));
    }

    let top = rng.gen_range(0..=height - size);
    let left = rng.gen_range(0..=width - size);
    let bbox = BoundingBox::new(left, top, size, size);
    Ok((crop_to_bbox(patch, bbox), bbox))
}

/// Takes `count` independent random crops of side `size`
pub fn random_crops<P, R>(
    patch: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: u32,
    count: usize,
    rng: &mut R,
) -> Result<Vec<ImageBuffer<P, Vec<P::Subpixel>>>>
where
    P: Pixel + 'static,
    R: Rng + ?Sized,
{
    (0..count)
        .map(|_| random_crop(patch, size, rng).map(|(crop, _)| crop))
        .collect()
}
